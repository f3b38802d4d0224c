use crate::core::models::query::{Query, QueryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid query '{query_id}': {message}")]
    Invalid { query_id: String, message: String },
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Defines how a query is obtained from whatever source backs it.
///
/// Implementors resolve a query identifier to a fully populated [`Query`]. The
/// pipeline treats any failure as fatal: when loading fails, neither scoring nor
/// persistence is attempted.
pub trait QueryLoader {
    /// Loads the query identified by `query_id`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the query cannot be read or is malformed.
    fn load(&self, query_id: &str) -> Result<Query, LoadError>;
}
