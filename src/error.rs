//! Error types for the greywolf tuner

use thiserror::Error;

/// Result type alias for greywolf operations
pub type Result<T> = std::result::Result<T, GreyWolfError>;

/// Main error type for the tuner
#[derive(Error, Debug)]
pub enum GreyWolfError {
    /// Unusable dataset or target selection, reported before any optimization starts
    #[error("Input error: {0}")]
    InputError(String),

    /// A decoded configuration could not be fitted or cross-validated
    #[error("Evaluation error: {0}")]
    EvaluationError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    /// Prediction requested before any model was trained
    #[error("Model not fitted: run an optimization before predicting")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

impl From<polars::error::PolarsError> for GreyWolfError {
    fn from(err: polars::error::PolarsError) -> Self {
        GreyWolfError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for GreyWolfError {
    fn from(err: serde_json::Error) -> Self {
        GreyWolfError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for GreyWolfError {
    fn from(err: ndarray::ShapeError) -> Self {
        GreyWolfError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
