//! Transport-independent request/response shapes.
//!
//! Requests arrive as JSON objects tagged by `op`; responses are tagged by
//! `status`. A [`SessionHandle`] serializes access so two requests racing
//! on the same session never interleave.

use crate::error::KMeansError;
use crate::init::InitMethod;
use crate::point::Point;
use crate::session::{KMeansSession, Phase, Snapshot};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// One client action
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    GenerateDataset {
        #[serde(alias = "num_points")]
        count: usize,
    },
    SelectInitMethod {
        k: usize,
        init_method: InitMethod,
    },
    SubmitCentroid {
        point: Point,
    },
    StartRun {
        k: usize,
        init_method: InitMethod,
        #[serde(default)]
        manual_centroids: Option<Vec<Point>>,
    },
    Step,
    Run {
        #[serde(default)]
        max_iterations: Option<usize>,
    },
    Reset,
    Snapshot,
}

/// Reply to one request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Generated {
        dataset: Vec<Point>,
    },
    Ok {
        centroids: Vec<Point>,
        clusters: Vec<Vec<Point>>,
    },
    Stepping {
        centroids: Vec<Point>,
        clusters: Vec<Vec<Point>>,
        iteration: usize,
    },
    Converged {
        centroids: Vec<Point>,
        clusters: Vec<Vec<Point>>,
        iteration: usize,
        iteration_cap_reached: bool,
    },
    Reset {
        dataset: Vec<Point>,
    },
    Snapshot(Snapshot),
    /// Non-fatal rejection; the session carries on
    Notice {
        message: String,
    },
    Error {
        message: String,
    },
}

impl Response {
    fn progress(snapshot: Snapshot) -> Self {
        if snapshot.phase == Phase::Converged {
            Response::Converged {
                centroids: snapshot.centroids,
                clusters: snapshot.clusters,
                iteration: snapshot.iteration,
                iteration_cap_reached: snapshot.iteration_cap_reached,
            }
        } else {
            Response::Stepping {
                centroids: snapshot.centroids,
                clusters: snapshot.clusters,
                iteration: snapshot.iteration,
            }
        }
    }

    fn rejected(err: KMeansError) -> Self {
        warn!(error = %err, "request rejected");
        if err.is_notice() {
            Response::Notice {
                message: err.to_string(),
            }
        } else {
            Response::Error {
                message: err.to_string(),
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }
}

/// Apply one request to a session
pub fn dispatch(session: &mut KMeansSession, request: Request) -> Response {
    let result = match request {
        Request::GenerateDataset { count } => session
            .generate_dataset(count)
            .map(|s| Response::Generated { dataset: s.dataset }),
        Request::SelectInitMethod { k, init_method } => {
            session.select_init_method(k, init_method).map(Response::Snapshot)
        }
        Request::SubmitCentroid { point } => {
            session.submit_manual_centroid(point).map(Response::Snapshot)
        }
        Request::StartRun {
            k,
            init_method,
            manual_centroids,
        } => session
            .start_run(k, init_method, manual_centroids)
            .map(|s| Response::Ok {
                centroids: s.centroids,
                clusters: s.clusters,
            }),
        Request::Step => session.step().map(Response::progress),
        Request::Run { max_iterations } => session
            .run_to_convergence(max_iterations)
            .map(Response::progress),
        Request::Reset => Ok(Response::Reset {
            dataset: session.reset().dataset,
        }),
        Request::Snapshot => Ok(Response::Snapshot(session.snapshot())),
    };

    result.unwrap_or_else(Response::rejected)
}

/// Shared, lock-guarded session.
///
/// Each request holds the lock for its whole duration, so at most one
/// operation runs against the session at a time.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<KMeansSession>>,
}

impl SessionHandle {
    pub fn new(session: KMeansSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn handle(&self, request: Request) -> Response {
        let mut session = self.inner.lock();
        dispatch(&mut session, request)
    }

    /// Decode one JSON request, apply it and encode the response.
    ///
    /// Malformed input yields an error response rather than a failure.
    pub fn handle_json(&self, line: &str) -> String {
        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request),
            Err(e) => {
                warn!(error = %e, "malformed request");
                Response::Error {
                    message: format!("Malformed request: {}", e),
                }
            }
        };

        serde_json::to_string(&response).unwrap_or_else(|e| {
            format!(
                r#"{{"status":"error","message":"Failed to encode response: {}"}}"#,
                e.to_string().replace('"', "'")
            )
        })
    }

    /// Run a closure with exclusive access to the session
    pub fn with_session<R>(&self, f: impl FnOnce(&mut KMeansSession) -> R) -> R {
        let mut session = self.inner.lock();
        f(&mut session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use serde_json::{json, Value};

    fn handle(seed: u64) -> SessionHandle {
        let session = KMeansSession::new(SessionConfig::default().with_seed(seed)).unwrap();
        SessionHandle::new(session)
    }

    fn call(handle: &SessionHandle, request: Value) -> Value {
        serde_json::from_str(&handle.handle_json(&request.to_string())).unwrap()
    }

    #[test]
    fn test_parse_requests() {
        let request: Request =
            serde_json::from_value(json!({"op": "generate_dataset", "num_points": 100})).unwrap();
        assert_eq!(request, Request::GenerateDataset { count: 100 });

        let request: Request = serde_json::from_value(json!({
            "op": "start_run",
            "k": 2,
            "init_method": "manual",
            "manual_centroids": [[0.1, 0.2], [0.3, 0.4]]
        }))
        .unwrap();
        assert_eq!(
            request,
            Request::StartRun {
                k: 2,
                init_method: InitMethod::Manual,
                manual_centroids: Some(vec![Point::new(0.1, 0.2), Point::new(0.3, 0.4)]),
            }
        );

        let request: Request = serde_json::from_value(json!({"op": "step"})).unwrap();
        assert_eq!(request, Request::Step);
    }

    #[test]
    fn test_generate_response_shape() {
        let handle = handle(1);
        let response = call(&handle, json!({"op": "generate_dataset", "count": 100}));

        assert_eq!(response["dataset"].as_array().unwrap().len(), 100);
        assert_eq!(response["dataset"][0].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_start_and_step_shapes() {
        let handle = handle(2);
        call(&handle, json!({"op": "generate_dataset", "count": 100}));

        let started = call(&handle, json!({"op": "start_run", "k": 3, "init_method": "random"}));
        assert_eq!(started["status"], "ok");
        assert_eq!(started["centroids"].as_array().unwrap().len(), 3);
        assert_eq!(started["clusters"].as_array().unwrap().len(), 3);

        let stepped = call(&handle, json!({"op": "step"}));
        assert!(stepped["status"] == "stepping" || stepped["status"] == "converged");
        assert_eq!(stepped["iteration"], 1);
    }

    #[test]
    fn test_manual_mismatch_is_error_with_count() {
        let handle = handle(3);
        call(&handle, json!({"op": "generate_dataset", "count": 100}));

        let response = call(
            &handle,
            json!({
                "op": "start_run",
                "k": 3,
                "init_method": "manual",
                "manual_centroids": [[0.1, 0.1], [0.9, 0.9]]
            }),
        );
        assert_eq!(response["status"], "error");
        assert!(response["message"].as_str().unwrap().contains('3'));
    }

    #[test]
    fn test_selection_limit_is_a_notice() {
        let handle = handle(4);
        call(&handle, json!({"op": "generate_dataset", "count": 100}));
        call(&handle, json!({"op": "select_init_method", "k": 1, "init_method": "manual"}));

        let first = call(&handle, json!({"op": "submit_centroid", "point": [0.5, 0.5]}));
        assert_eq!(first["status"], "snapshot");
        assert_eq!(first["phase"], "initialized");

        let second = call(&handle, json!({"op": "submit_centroid", "point": [0.4, 0.4]}));
        assert_eq!(second["status"], "notice");
    }

    #[test]
    fn test_malformed_and_non_finite_requests() {
        let handle = handle(5);

        let response: Value = serde_json::from_str(&handle.handle_json("{not json")).unwrap();
        assert_eq!(response["status"], "error");

        let response: Value =
            serde_json::from_str(&handle.handle_json(r#"{"op":"submit_centroid","point":[1e999,0]}"#)).unwrap();
        assert_eq!(response["status"], "error");
    }

    #[test]
    fn test_oversized_dataset_request_is_rejected() {
        let handle = handle(7);
        call(&handle, json!({"op": "generate_dataset", "count": 100}));

        let response: Value = serde_json::from_str(
            &handle.handle_json(r#"{"op":"generate_dataset","count":18446744073709551615}"#),
        )
        .unwrap();
        assert_eq!(response["status"], "error");
        assert!(response["message"].as_str().unwrap().contains("dataset size"));

        assert_eq!(handle.with_session(|s| s.snapshot().dataset.len()), 100);
    }

    #[test]
    fn test_non_finite_manual_centroid_is_rejected() {
        let handle = handle(8);
        call(&handle, json!({"op": "generate_dataset", "count": 100}));
        let before = handle.with_session(|s| s.snapshot());

        let response = handle.handle(Request::StartRun {
            k: 2,
            init_method: InitMethod::Manual,
            manual_centroids: Some(vec![Point::new(0.5, 0.5), Point::new(f64::NAN, 0.5)]),
        });
        assert!(response.is_error());
        assert_eq!(handle.with_session(|s| s.snapshot()), before);

        let response: Value = serde_json::from_str(&handle.handle_json(
            r#"{"op":"start_run","k":2,"init_method":"manual","manual_centroids":[[0.5,0.5],[1e999,0.5]]}"#,
        ))
        .unwrap();
        assert_eq!(response["status"], "error");
        assert_eq!(handle.with_session(|s| s.snapshot()), before);
    }

    #[test]
    fn test_invalid_k_leaves_snapshot_unchanged() {
        let handle = handle(9);
        call(&handle, json!({"op": "generate_dataset", "count": 10}));
        call(&handle, json!({"op": "start_run", "k": 2, "init_method": "random"}));
        let before = handle.with_session(|s| s.snapshot());

        for k in [0, 11] {
            let response = handle.handle(Request::StartRun {
                k,
                init_method: InitMethod::Random,
                manual_centroids: None,
            });
            assert!(response.is_error(), "k = {}", k);
            assert_eq!(handle.with_session(|s| s.snapshot()), before);
        }

        let response = call(&handle, json!({"op": "select_init_method", "k": 0, "init_method": "smart"}));
        assert_eq!(response["status"], "error");
        assert_eq!(handle.with_session(|s| s.snapshot()), before);
    }

    #[test]
    fn test_notice_is_not_an_error() {
        let handle = handle(10);
        call(&handle, json!({"op": "generate_dataset", "count": 100}));
        call(&handle, json!({"op": "select_init_method", "k": 1, "init_method": "manual"}));
        handle.handle(Request::SubmitCentroid {
            point: Point::new(0.5, 0.5),
        });

        let response = handle.handle(Request::SubmitCentroid {
            point: Point::new(0.2, 0.2),
        });
        assert!(matches!(response, Response::Notice { .. }));
        assert!(!response.is_error());
    }

    #[test]
    fn test_reset_shape() {
        let handle = handle(6);
        let response = call(&handle, json!({"op": "reset"}));

        assert_eq!(response["status"], "reset");
        assert_eq!(response["dataset"].as_array().unwrap().len(), 100);
        assert_eq!(handle.with_session(|s| s.phase()), Phase::Empty);
    }
}
