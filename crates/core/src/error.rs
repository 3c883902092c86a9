//! Unified error types for pagecheck.
//!
//! One enum covers the recoverable failure classes the pipeline cares
//! about: fetch transport failures, extraction failures, and cache
//! persistence failures. Configuration errors live in
//! [`crate::config::ConfigError`] because they are fatal before a run
//! starts, never during one.

use tokio_rusqlite::rusqlite;

/// Unified error type for fetch, extraction, and persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an empty URL list).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// URL failed canonicalization.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Network-level fetch failure.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Fetch exceeded its configured timeout.
    #[error("fetch timeout: {0}")]
    FetchTimeout(String),

    /// Response body exceeded the configured byte limit.
    #[error("fetch too large: {0}")]
    FetchTooLarge(String),

    /// Non-success HTTP status.
    #[error("HTTP error: status {status}")]
    HttpStatus { status: u16 },

    /// Content extraction failed.
    #[error("extract failed: {0}")]
    ExtractFailed(String),

    /// Cache database operation failed.
    #[error("cache error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Stored record could not be decoded.
    #[error("cache error: corrupt record: {0}")]
    CorruptRecord(String),

    /// Migration failed to apply.
    #[error("cache error: migration failed: {0}")]
    MigrationFailed(String),

    /// Report or input file I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bug-level failure (a worker task died).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
