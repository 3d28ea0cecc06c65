use thiserror::Error;

/// Errors from repository operations (used by trait definitions in liftlog-core).
///
/// A repository error is fatal for the step that triggered it: the engine
/// propagates it unchanged and leaves the in-memory registry exactly as it
/// was before the call.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}
