//! Shared error types for the services crate.

use thiserror::Error;

use storage::StorageError;

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available")]
    Unavailable,
    #[error("session not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}
