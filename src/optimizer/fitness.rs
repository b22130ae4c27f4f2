//! Fitness of a wolf position: cross-validated accuracy of the tree it decodes to

use super::codec::{decode, Position};
use crate::error::{GreyWolfError, Result};
use crate::training::cross_val_accuracy;
use ndarray::{Array1, Array2};
use tracing::debug;

/// Scores a candidate position; higher is better
pub trait Fitness: Sync {
    fn evaluate(&self, position: &Position) -> Result<f64>;
}

impl<T: Fitness + ?Sized> Fitness for &T {
    fn evaluate(&self, position: &Position) -> Result<f64> {
        (**self).evaluate(position)
    }
}

/// Mean stratified k-fold accuracy over a fixed, read-only dataset
#[derive(Debug, Clone, Copy)]
pub struct CrossValidatedAccuracy<'a> {
    features: &'a Array2<f64>,
    labels: &'a Array1<f64>,
    n_folds: usize,
    seed: u64,
}

impl<'a> CrossValidatedAccuracy<'a> {
    /// Five folds, tree seed 42
    pub fn new(features: &'a Array2<f64>, labels: &'a Array1<f64>) -> Self {
        Self {
            features,
            labels,
            n_folds: 5,
            seed: 42,
        }
    }

    pub fn with_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Fitness for CrossValidatedAccuracy<'_> {
    fn evaluate(&self, position: &Position) -> Result<f64> {
        let params = decode(position);
        let results = cross_val_accuracy(&params, self.seed, self.features, self.labels, self.n_folds)
            .map_err(|e| match e {
                // Unusable data is the caller's problem, not this configuration's
                GreyWolfError::InputError(_) => e,
                other => GreyWolfError::EvaluationError(format!("{}: {}", params, other)),
            })?;

        debug!(%params, cv_mean = results.mean_score, cv_std = results.std_score, "Evaluated wolf");
        Ok(results.mean_score)
    }
}
