//! Store-specific error type wrapping IO and JSON errors.

use std::path::PathBuf;

use watering_domain::error::{StateLoadError, StateSaveError};

/// Errors originating from the JSON state file.
#[derive(Debug, thiserror::Error)]
pub enum JsonStoreError {
    /// Reading, writing or renaming the file failed.
    #[error("state file IO failed for {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file content is not a valid state map.
    #[error("state file {path} is not valid JSON state")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl JsonStoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<JsonStoreError> for StateLoadError {
    fn from(err: JsonStoreError) -> Self {
        Self::new(err)
    }
}

impl From<JsonStoreError> for StateSaveError {
    fn from(err: JsonStoreError) -> Self {
        Self::new(err)
    }
}
