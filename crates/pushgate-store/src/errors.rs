//! Error types for the token registry.

use pushgate_core::{ArgumentError, TokenList};
use thiserror::Error;

/// Errors returned by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// `SQLite` error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// No entry for the IP in any environment partition of the list.
    #[error("no {list} list entry for {ip}")]
    NotFound {
        /// List that was searched.
        list: TokenList,
        /// IP that was looked up.
        ip: String,
    },

    /// Key or value failed validation before reaching storage.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ArgumentError),
}

impl RegistryError {
    /// Whether this is the normal negative result rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience type alias for registry results.
pub type Result<T> = std::result::Result<T, RegistryError>;
