//! # AppError
//!
//! The closed set of failures a board operation can report. Every variant
//! maps onto one wire-level message in [`crate::envelope`].

use thiserror::Error;

/// The primary error type for all kb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// No verified caller identity. Checked before anything else.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Required payload fields missing or of the wrong type, in schema order.
    #[error("{} is requirement!", .0.join(","))]
    Validation(Vec<String>),

    /// Anything the document store reported, including failed cascade reads.
    #[error("store failure: {0}")]
    Store(anyhow::Error),
}

impl AppError {
    pub fn store(msg: impl Into<String>) -> Self {
        AppError::Store(anyhow::anyhow!(msg.into()))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Store(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Store(err.into())
    }
}

/// A specialized Result type for board logic.
pub type Result<T> = std::result::Result<T, AppError>;
