//! Reporting adapter error types.

use std::path::PathBuf;

use watering_domain::error::ReportError;

/// Errors from the CSV statistics sink.
#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    /// The configured timestamp format is not a valid strftime pattern.
    #[error("invalid timestamp format {0:?}")]
    InvalidTimestampFormat(String),

    /// Appending to the statistics file failed.
    #[error("failed to append to {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<CsvError> for ReportError {
    fn from(err: CsvError) -> Self {
        Self::new(err)
    }
}
