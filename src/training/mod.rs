//! Model training module
//!
//! The classifier, cross-validation and scoring collaborators used by the
//! optimizer:
//! - CART decision tree classifier (gini / entropy)
//! - Stratified and plain K-fold splitting
//! - Accuracy and confusion matrix

pub mod cross_validation;
pub mod decision_tree;
pub mod metrics;

pub use cross_validation::{cross_val_accuracy, CrossValidator, CVResults, CVSplit, CVStrategy};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use metrics::{accuracy_score, confusion_matrix, ClassificationMetrics};
