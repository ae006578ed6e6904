//! Error types for drug model files and repositories

use thiserror::Error;

/// Errors that can occur when loading drug models
#[derive(Debug, Error)]
pub enum ModelError {
    /// Failed to parse JSON
    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The same covariate id is defined twice in one model
    #[error("Covariate '{covariate}' is defined more than once in model {model_id}")]
    DuplicateCovariate { model_id: String, covariate: String },

    /// An age covariate must be numeric
    #[error("Age covariate '{covariate}' of model {model_id} must be of type int or double")]
    NonNumericAge { model_id: String, covariate: String },

    /// The standard value does not match the declared data type
    #[error("Standard value of covariate '{covariate}' in model {model_id} does not match its data type")]
    InvalidStandardValue { model_id: String, covariate: String },

    /// Error reading model files
    #[error("Repository error: {0}")]
    RepositoryError(String),
}
