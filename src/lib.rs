//! Greywolf - Grey Wolf Optimizer tuning for decision-tree classifiers
//!
//! A swarm of candidate hyperparameter vectors is scored by cross-validated
//! accuracy and pulled toward its three best members until the iteration
//! budget runs out. The best configuration is then trained on the training
//! split and evaluated on held-out rows.
//!
//! # Modules
//!
//! - [`optimizer`] - Solution codec, population, update engine, fitness and run driver
//! - [`training`] - Decision tree, cross-validation and classification metrics
//! - [`utils`] - CSV loading, label encoding and stratified splitting
//! - [`session`] - Session state for an interactive front end: run, report, predict
//!
//! # Example
//!
//! ```no_run
//! use greywolf::prelude::*;
//!
//! # fn main() -> greywolf::Result<()> {
//! let mut session = TuningSession::new();
//! session.load_csv("heart.csv")?;
//! session.select_target("target")?;
//! let report = session.run(15, 30)?;
//! println!("{} -> test accuracy {:.3}", report.best_params, report.test_accuracy);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Search
pub mod optimizer;

// Model and scoring
pub mod training;

// Data ingestion
pub mod utils;

// Presentation boundary
pub mod session;

pub use error::{GreyWolfError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{GreyWolfError, Result};

    // Optimization
    pub use crate::optimizer::{
        decode, encode, optimize_tree, CrossValidatedAccuracy, Fitness, GreyWolfOptimizer,
        GwoConfig, OptimizationResult, Position, SearchBounds, TreeParams,
    };

    // Training
    pub use crate::training::{
        accuracy_score, cross_val_accuracy, ClassificationMetrics, Criterion, CrossValidator,
        DecisionTree,
    };

    // Data
    pub use crate::utils::{DataLoader, Dataset};

    // Session
    pub use crate::session::{Prediction, TuningConfig, TuningReport, TuningSession};
}
