use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can abort a pipeline stage.
///
/// Per-record anomalies (missing description, text with no surviving tokens)
/// never surface here; they are absorbed by the stage that meets them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("input file '{}' not found", path.display())]
    InputNotFound { path: PathBuf },

    #[error("failed to read '{}': {source}", path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{}' is not a valid document: {source}", path.display())]
    InputMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{}' has no '{key}' key", path.display())]
    MissingKey { path: PathBuf, key: &'static str },

    #[error("failed to write '{}': {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid stopword file '{}': {reason}", path.display())]
    Stopwords { path: PathBuf, reason: String },
}
