//! Classification scoring

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Fraction of predictions equal to the true label
pub fn accuracy_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Confusion matrix with rows = actual, columns = predicted, in `labels` order.
///
/// Pairs whose label is not listed are ignored.
pub fn confusion_matrix(y_true: &Array1<f64>, y_pred: &Array1<f64>, labels: &[f64]) -> Array2<usize> {
    let position = |v: f64| labels.iter().position(|&l| l == v);
    let mut matrix = Array2::zeros((labels.len(), labels.len()));

    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        if let (Some(r), Some(c)) = (position(t), position(p)) {
            matrix[[r, c]] += 1;
        }
    }

    matrix
}

/// Held-out evaluation of a trained classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    /// Accuracy on the evaluated rows
    pub accuracy: f64,
    /// Confusion matrix over `labels`
    pub confusion_matrix: Array2<usize>,
    /// Label order of the matrix axes
    pub labels: Vec<f64>,
    /// Number of evaluated rows
    pub n_samples: usize,
}

impl ClassificationMetrics {
    /// Compute accuracy and confusion matrix in one pass over the labels
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>, labels: &[f64]) -> Self {
        Self {
            accuracy: accuracy_score(y_true, y_pred),
            confusion_matrix: confusion_matrix(y_true, y_pred, labels),
            labels: labels.to_vec(),
            n_samples: y_true.len(),
        }
    }
}
