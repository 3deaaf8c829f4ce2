//! Error types for the data layer.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A PostgreSQL operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A PostgreSQL migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The backing store could not serve the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A write would violate a uniqueness rule.
    #[error("Store conflict: {0}")]
    Conflict(String),
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
