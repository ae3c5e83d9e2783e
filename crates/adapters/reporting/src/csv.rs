//! CSV statistics sink.
//!
//! Each run appends a single line:
//!
//! ```text
//! 2026-06-01 08:00:00,"Basil",900,500,"Yes",420,"Tomato",100,500,,
//! ```
//!
//! The timestamp is the run's start in the machine's local time zone unless
//! the reporter was built [`with_utc`](CsvReporter::with_utc). It is followed
//! by five fields per pot, pots sorted by id:
//! quoted description, reading, cutoff, `"Yes"` when watered, and the
//! second reading. The last two are empty for pots that were not watered.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;
use chrono::format::{Item, StrftimeItems};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use watering_app::ports::Reporter;
use watering_domain::error::ReportError;
use watering_domain::outcome::{PotOutcome, RunOutcome};

use crate::error::CsvError;

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Appends one CSV line per run to a file, creating it when missing.
#[derive(Debug, Clone)]
pub struct CsvReporter {
    path: PathBuf,
    timestamp_format: String,
    utc: bool,
}

impl CsvReporter {
    /// # Errors
    ///
    /// Returns [`CsvError::InvalidTimestampFormat`] if `timestamp_format`
    /// contains an unknown or incomplete strftime specifier.
    pub fn new(
        path: impl Into<PathBuf>,
        timestamp_format: impl Into<String>,
    ) -> Result<Self, CsvError> {
        let timestamp_format = timestamp_format.into();
        if StrftimeItems::new(&timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(CsvError::InvalidTimestampFormat(timestamp_format));
        }
        Ok(Self {
            path: path.into(),
            timestamp_format,
            utc: false,
        })
    }

    /// Write timestamps in UTC instead of local time.
    #[must_use]
    pub fn with_utc(mut self) -> Self {
        self.utc = true;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The line written for `outcome`, without the trailing newline.
    #[must_use]
    pub fn format_line(&self, outcome: &RunOutcome) -> String {
        let mut line = if self.utc {
            outcome.timestamp.format(&self.timestamp_format).to_string()
        } else {
            outcome
                .timestamp
                .with_timezone(&Local)
                .format(&self.timestamp_format)
                .to_string()
        };
        line.push(',');

        let fields: Vec<String> = outcome.sorted_by_id().into_iter().map(pot_fields).collect();
        line.push_str(&fields.join(","));
        line
    }

    async fn append(&self, line: &str) -> Result<(), CsvError> {
        let io = |source| CsvError::Io {
            path: self.path.clone(),
            source,
        };
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io)?;
        file.write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(io)?;
        file.flush().await.map_err(io)
    }
}

fn pot_fields(pot: &PotOutcome) -> String {
    let mut fields = format!(
        "{},{},{},",
        quote(&pot.description),
        pot.sensor_reading,
        pot.cutoff
    );
    if pot.watered {
        fields.push_str("\"Yes\",");
        if let Some(second) = pot.second_reading {
            let _ = write!(fields, "{second}");
        }
    } else {
        fields.push(',');
    }
    fields
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

impl Reporter for CsvReporter {
    async fn report(&self, outcome: &RunOutcome) -> Result<(), ReportError> {
        let line = self.format_line(outcome);
        debug!(path = %self.path.display(), pots = outcome.pots.len(), "appending run statistics");
        Ok(self.append(&line).await?)
    }
}
