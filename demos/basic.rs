//! Basic example stepping through a k-means session
//!
//! Run with: cargo run --example basic

use kmeans_stepper::{InitMethod, KMeansSession, Phase, Point, SessionConfig};

fn print_centroids(centroids: &[Point]) {
    for (i, c) in centroids.iter().enumerate() {
        println!("  Centroid {}: ({:.4}, {:.4})", i, c.x, c.y);
    }
}

fn main() {
    println!("=== kmeans-stepper example ===\n");

    let n_points = 100;
    let k = 3;

    let config = SessionConfig::new(n_points).with_seed(42);
    let mut session = KMeansSession::new(config).expect("default configuration is valid");

    println!("Generating {} points in the unit square...", n_points);
    session.generate_dataset(n_points).expect("dataset size is within bounds");

    // Farthest-first seeding
    let snapshot = session
        .start_run(k, InitMethod::Smart, None)
        .expect("k is within the dataset size");
    println!("\nInitial centroids ({} init):", snapshot.init_method);
    print_centroids(&snapshot.centroids);

    println!("\nStepping:");
    let mut snapshot = snapshot;
    while snapshot.phase != Phase::Converged {
        snapshot = session.step().expect("a run is active");
        let sizes: Vec<usize> = snapshot.clusters.iter().map(Vec::len).collect();
        println!(
            "  Iteration {}: inertia = {:.6}, cluster sizes = {:?}",
            snapshot.iteration,
            snapshot.inertia.unwrap_or_default(),
            sizes
        );
    }

    println!("\nConverged after {} iterations", snapshot.iteration);
    print_centroids(&snapshot.centroids);

    // Manual selection: the k-th pick starts the run
    println!("\nManual selection with k=2:");
    session
        .select_init_method(2, InitMethod::Manual)
        .expect("k is within the dataset size");
    session
        .submit_manual_centroid(Point::new(0.25, 0.5))
        .expect("selection is open");
    let snapshot = session
        .submit_manual_centroid(Point::new(0.75, 0.5))
        .expect("selection has room");
    println!("  Phase after second pick: {:?}", snapshot.phase);

    let snapshot = session.run_to_convergence(None).expect("a run is active");
    println!("  Converged after {} iterations", snapshot.iteration);
    print_centroids(&snapshot.centroids);

    println!("\n=== Example complete ===");
}
