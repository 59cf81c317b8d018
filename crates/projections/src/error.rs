use thiserror::Error;

/// Errors that can occur while building a read-side view.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The underlying store read failed.
    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
