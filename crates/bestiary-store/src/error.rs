use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An error originating from the underlying SQLite database.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A referenced row does not exist. Distinct from a generic failure so
    /// callers can tell a bad id apart from a transient storage problem.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: Uuid },

    /// The link or connection being created already exists. Non-fatal:
    /// callers may treat it as already-satisfied.
    #[error("link already exists: {0}")]
    LinkExists(String),

    /// A domain constraint was violated before touching storage
    /// (e.g. a specificity created with zero connections).
    #[error("constraint violated: {0}")]
    Constraint(String),
}

impl StoreError {
    pub fn not_found(resource: &'static str, id: Uuid) -> Self {
        Self::NotFound { resource, id }
    }
}
