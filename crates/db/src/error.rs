//! Error types for document store operations.

use thiserror::Error;

/// Every failure a store operation can surface.
///
/// Controllers never recover from these; they are forwarded unmodified to the
/// centralized HTTP error handler.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached or the handshake failed.
    #[error("connection error: {0}")]
    Connection(String),
    /// The configured endpoint names no known backend.
    #[error("invalid store endpoint: {0}")]
    InvalidEndpoint(String),
    /// A document could not be converted to or from its stored form.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The backend rejected or failed an operation.
    #[error("backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<bson::error::Error> for StoreError {
    fn from(err: bson::error::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}
