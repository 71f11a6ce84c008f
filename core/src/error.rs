use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WeightDbError>;

#[derive(Debug, Error)]
pub enum WeightDbError {
    /// The store path does not name a usable weight database.
    #[error("weight database '{}' is not usable: {reason}", path.display())]
    Configuration { path: PathBuf, reason: String },

    #[error("query on table '{table}' failed: {source}")]
    Query {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// A row was read but one of its values had an unexpected type.
    #[error("row {row} of table '{table}' could not be decoded: {source}")]
    Decode {
        table: &'static str,
        row: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("snapshot metadata error: {0}")]
    Meta(#[from] serde_json::Error),
}

impl WeightDbError {
    pub(crate) fn configuration(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Configuration { path: path.into(), reason: reason.into() }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}
