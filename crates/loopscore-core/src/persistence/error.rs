use thiserror::Error;

/// Failure to write results or status rows.
///
/// Store-level errors are always wrapped with a description of what was being
/// written; the original error stays reachable through `source()`.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{context}: {source}")]
    Csv {
        context: String,
        #[source]
        source: csv::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: no rows were affected")]
    NoRowsAffected { context: String },

    #[error("The result store has already been released")]
    Unavailable,

    #[error("Sink calls out of order: {0}")]
    OutOfOrder(&'static str),

    #[error("Invalid stored value: {0}")]
    InvalidData(String),
}

impl PersistenceError {
    pub(crate) fn store(context: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Store {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn csv(context: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            context: context.into(),
            source,
        }
    }
}
