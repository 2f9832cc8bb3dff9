//! Resource graph error types

use thiserror::Error;

/// Errors raised while declaring or planning resources
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource already exists: {0}")]
    ResourceAlreadyExists(String),

    #[error("Unknown resource: {0}")]
    UnknownNode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
