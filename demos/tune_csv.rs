//! Grey Wolf tuning example
//!
//! Tunes a decision tree on a CSV file, or on generated data when no file is given.
//!
//! ```text
//! cargo run --example tune_csv -- heart.csv target
//! RUST_LOG=greywolf=debug cargo run --example tune_csv
//! ```

use greywolf::optimizer::{seeded_source, UniformSource};
use greywolf::prelude::*;
use polars::prelude::*;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "greywolf=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut session = TuningSession::new();
    let target = match args.as_slice() {
        [path, target, ..] => {
            session.load_csv(path)?;
            target.clone()
        }
        [path] => {
            session.load_csv(path)?;
            "target".to_string()
        }
        [] => {
            session.load_dataframe(sample_frame()?)?;
            "target".to_string()
        }
    };

    let dataset = session.select_target(&target)?;
    println!(
        "Dataset: {} samples, {} features, classes {:?}\n",
        dataset.n_samples(),
        dataset.n_features(),
        dataset.class_labels()
    );

    println!("Running grey wolf optimization (15 wolves, 20 iterations)...\n");
    let report = session.run(15, 20)?;

    println!("Optimization complete!");
    println!("Best parameters: {}", report.best_params);
    println!("Best CV accuracy: {:.4}", report.best_fitness);
    println!("Test accuracy:    {:.4}", report.test_accuracy);
    println!("Fitness history:  {:?}", report.fitness_history);
    println!("Confusion matrix (rows actual, columns predicted):");
    println!("{}", report.confusion_matrix);

    // Predict at the column means, as a form would pre-fill them
    let defaults = session.prediction_defaults()?;
    let row: Vec<f64> = defaults.iter().map(|(_, mean)| *mean).collect();
    let prediction = session.predict(&row)?;
    println!("\nPrediction at feature means: {}", prediction.label);

    Ok(())
}

fn sample_frame() -> PolarsResult<DataFrame> {
    let n = 200;
    let mut rng = seeded_source(Some(42));
    let mut noise = move || rng.uniform() - 0.5;
    let x1: Vec<f64> = (0..n).map(|i| (i as f64 / 20.0).cos() + noise()).collect();
    let x2: Vec<f64> = (0..n).map(|i| (i as f64 / 20.0).sin() + noise()).collect();
    let y: Vec<i64> = x1
        .iter()
        .zip(x2.iter())
        .map(|(a, b)| if *a + *b > 1.0 { 1 } else { 0 })
        .collect();

    df!("x1" => &x1, "x2" => &x2, "target" => &y)
}
