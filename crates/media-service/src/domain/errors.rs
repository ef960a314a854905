use thiserror::Error;

/// Media record store failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Object store failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlobError {
    /// The blob is already gone.
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Object store unavailable: {0}")]
    Unavailable(String),
}
