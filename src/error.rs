use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the drug store and its ingestion pipeline.
///
/// Lookup misses are never errors: they come back as `Ok(None)` or an empty
/// `Vec`. A single malformed source record is skipped and counted by the
/// parser, so it does not appear here either.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Source XML not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Store already exists at {path} (recreate it explicitly to rebuild)")]
    StoreExists { path: PathBuf },

    #[error("Store not found: {path}")]
    StoreNotFound { path: PathBuf },

    #[error("Store at {path} has no completion marker - it was never fully ingested")]
    IncompleteStore { path: PathBuf },

    #[error("Ingestion interrupted")]
    Interrupted,

    #[error("Ingestion into {path} did not complete: {source}")]
    IncompleteIngestion {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("XML error at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn incomplete(path: impl Into<PathBuf>, source: Error) -> Self {
        Self::IncompleteIngestion {
            path: path.into(),
            source: Box::new(source),
        }
    }
}
