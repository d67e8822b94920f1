use thiserror::Error;

/// Failures surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Could not obtain a pooled connection.
    #[error("connection error: {0}")]
    Connection(#[from] diesel::r2d2::PoolError),
    /// The storage engine rejected a statement.
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    /// A referenced row does not exist.
    #[error("not found")]
    NotFound,
    /// The requested change contradicts current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Stored data failed domain validation.
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("migration error: {0}")]
    Migration(String),
}

/// Convenient alias for repository results.
pub type RepositoryResult<T> = Result<T, RepositoryError>;
