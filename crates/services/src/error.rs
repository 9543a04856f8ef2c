//! Shared error types for the services crate.
//!
//! Unparseable stored values never show up here; they fall back to defaults.
//! Only backend failures of the store are reported.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `SessionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `NavigationGuard` and `PageLoader`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NavigationError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CountdownController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CountdownError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping quiz services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
