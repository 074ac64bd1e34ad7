//! @ai:module:intent Error types for the allergen benchmark library
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result
//! @ai:module:stateless true

use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Unified error type for dataset, store and export operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse dataset file {}: {source}", path.display())]
    DatasetParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid dataset item {id}: {message}")]
    InvalidItem { id: String, message: String },

    #[error("Malformed record at {}:{line}: {source}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Export of {report} failed: {message}")]
    Export { report: String, message: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// @ai:intent Attach a path to an IO error
    /// @ai:effects pure
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileAccess {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
