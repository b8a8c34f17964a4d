//! Error types for the store layer.

/// Errors returned by store collaborators.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or failed to execute the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The operation did not complete within its time budget.
    #[error("store operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// No record with the given id exists.
    #[error("record {0} not found")]
    NotFound(String),

    /// A record with the given id already exists.
    #[error("record {0} already exists")]
    Duplicate(String),

    /// A seed file could not be read or parsed.
    #[error("invalid seed data: {0}")]
    Seed(String),
}
