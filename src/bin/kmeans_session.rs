//! Command-line front end for k-means teaching sessions.
//!
//! `repl` reads one JSON request per line on stdin and writes one JSON
//! response per line on stdout, so any UI (or a shell pipe) can drive a
//! session. `run` performs a whole run and prints each iteration.
//!
//! Usage: `kmeans-session [-v] [--seed N] [--points N] repl`
//!        `kmeans-session --seed 42 run --k 4 --init smart`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kmeans_stepper::{Distribution, InitMethod, KMeansSession, Phase, SessionConfig, SessionHandle};
use std::io::{self, BufRead, Write};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Interactive k-means sessions over JSON lines
#[derive(Parser)]
#[command(name = "kmeans-session")]
#[command(version)]
#[command(about = "Step through k-means clustering on synthetic 2D data")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Seed for datasets and centroid seeding (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of points per dataset
    #[arg(long, default_value_t = 100)]
    points: usize,

    /// Largest dataset a generate request may ask for
    #[arg(long, default_value_t = 100_000)]
    max_points: usize,

    /// Default number of clusters
    #[arg(long, default_value_t = 3)]
    k: usize,

    /// Iteration cap before a run is stopped
    #[arg(long, default_value_t = 300)]
    max_iters: usize,

    /// Convergence tolerance on centroid movement
    #[arg(long, default_value_t = 1e-9)]
    tol: f64,

    /// Generate N Gaussian blobs instead of uniform points
    #[arg(long, value_name = "N")]
    blobs: Option<usize>,

    /// Standard deviation of each blob
    #[arg(long, default_value_t = 0.05)]
    spread: f64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve JSON-line requests from stdin
    Repl,
    /// Run k-means to convergence and print every iteration
    Run {
        /// Number of clusters (defaults to --k)
        #[arg(long)]
        k: Option<usize>,

        /// Init method: random, smart, kmeans++
        #[arg(long, default_value = "random")]
        init: InitMethod,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new(self.points)
            .with_max_dataset_size(self.max_points)
            .with_default_k(self.k)
            .with_max_iters(self.max_iters)
            .with_tol(self.tol);

        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(centers) = self.blobs {
            config = config.with_distribution(Distribution::Blobs {
                centers,
                spread: self.spread,
            });
        }

        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays pure JSON
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .init();

    let session = KMeansSession::new(cli.session_config()).context("Invalid session configuration")?;

    match cli.command {
        Commands::Repl => repl(SessionHandle::new(session)),
        Commands::Run { k, init, json } => run(session, k.unwrap_or(cli.k), init, json),
    }
}

fn repl(handle: SessionHandle) -> Result<()> {
    info!("reading requests from stdin");

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = handle.handle_json(&line);
        writeln!(stdout, "{}", response).context("Failed to write response")?;
        stdout.flush()?;
    }

    Ok(())
}

fn run(mut session: KMeansSession, k: usize, init: InitMethod, json: bool) -> Result<()> {
    if init == InitMethod::Manual {
        anyhow::bail!("manual init needs clicked centroids; use the repl subcommand");
    }

    let points = session.config().dataset_size;
    session.generate_dataset(points)?;
    let mut snapshot = session.start_run(k, init, None)?;

    println!("Running k-means with k={} ({} init) on {} points\n", k, init, points);
    print_centroids("Initial centroids", &snapshot.centroids);

    while snapshot.phase != Phase::Converged {
        snapshot = session.step()?;
        println!(
            "  Iteration {}: inertia = {:.6}",
            snapshot.iteration,
            snapshot.inertia.unwrap_or_default()
        );
    }

    if snapshot.iteration_cap_reached {
        println!("\nStopped at the iteration cap ({})", session.config().max_iters);
    } else {
        println!("\nConverged after {} iterations", snapshot.iteration);
    }
    print_centroids("Final centroids", &snapshot.centroids);

    println!("\nCluster distribution:");
    for (i, cluster) in snapshot.clusters.iter().enumerate() {
        println!(
            "  Cluster {}: {} points ({:.1}%)",
            i,
            cluster.len(),
            cluster.len() as f64 / points as f64 * 100.0
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    Ok(())
}

fn print_centroids(title: &str, centroids: &[kmeans_stepper::Point]) {
    println!("{}:", title);
    for (i, c) in centroids.iter().enumerate() {
        println!("  Centroid {}: ({:.4}, {:.4})", i, c.x, c.y);
    }
}
