//! Error handling for the career advisor engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CareerAdvisorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Content generation error: {0}")]
    Generation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CareerAdvisorError>;

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for CareerAdvisorError {
    fn from(err: anyhow::Error) -> Self {
        CareerAdvisorError::Storage(err.to_string())
    }
}
