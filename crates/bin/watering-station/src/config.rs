//! Configuration loading: TOML pot definitions with environment overrides.
//!
//! ```toml
//! [general]
//! pots = "tomato basil"
//! stats_file = "~/watering_stats.csv"
//!
//! [tomato]
//! description = "Cherry tomato"
//! SensorDryLevel = 500
//! ADCChannel = 0
//! RelayBCMPin = 17
//!
//! [basil]
//! ADCChannel = "1"
//! RelayBCMPin = "27"
//! ```
//!
//! Pot sections are read in the order `pots` lists them. Integer keys also
//! accept strings holding an integer. Every pot is validated before the
//! configuration is returned, so a bad file never reaches the hardware.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use watering_adapter_hardware::HardwareSettings;
use watering_adapter_reporting::csv::DEFAULT_TIMESTAMP_FORMAT;
use watering_app::watering_engine::DEFAULT_SETTLE_DELAY;
use watering_domain::error::ValidationError;
use watering_domain::pot::{PotConfig, PotConfigBuilder, RESERVED_ID};
use watering_domain::roster::PotRoster;

/// Config file read when `--config-file` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "~/.watering_station.toml";

pub const DEFAULT_STATE_FILE: &str = "watering_station.state.json";

/// Fully validated runtime configuration.
#[derive(Debug)]
pub struct StationConfig {
    /// Pots in declaration order.
    pub roster: PotRoster,
    pub state_file: PathBuf,
    /// CSV statistics file; `None` disables the sink.
    pub stats_file: Option<PathBuf>,
    pub timestamp_format: String,
    /// Filter directive (`RUST_LOG` syntax).
    pub log_filter: Option<String>,
    pub hardware: HardwareSettings,
    pub settle_delay: Duration,
}

/// `[general]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneralSection {
    pots: Option<PotList>,
    state_file: Option<PathBuf>,
    stats_file: Option<PathBuf>,
    timestamp_format: Option<String>,
    log_filter: Option<String>,
    settle_delay_secs: Option<u64>,
    #[serde(flatten)]
    hardware: HardwareSettings,
}

/// `pots` is either `"a b c"` or `["a", "b", "c"]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PotList {
    Words(String),
    List(Vec<String>),
}

impl PotList {
    fn into_ids(self) -> Vec<String> {
        match self {
            Self::Words(words) => words.split_whitespace().map(str::to_string).collect(),
            Self::List(ids) => ids,
        }
    }
}

impl StationConfig {
    /// Read and validate the file at `path`, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is missing, unreadable, not
    /// valid TOML, or describes an invalid set of pots.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse and validate configuration text.
    ///
    /// # Errors
    ///
    /// See [`StationConfig::load`].
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut document: toml::Table = content.parse()?;

        let general: GeneralSection = match document.remove(RESERVED_ID) {
            Some(section) => section.try_into()?,
            None => return Err(ConfigError::MissingPots),
        };
        let ids = general
            .pots
            .ok_or(ConfigError::MissingPots)?
            .into_ids();
        if ids.is_empty() {
            return Err(ConfigError::NoPots);
        }

        let mut roster = PotRoster::new();
        for id in ids {
            let pot = parse_pot(&id, document.get(&id))?;
            roster
                .try_push(pot)
                .map_err(|source| ConfigError::InvalidPot { pot: id, source })?;
        }

        Ok(Self {
            roster,
            state_file: expand_home(
                &general
                    .state_file
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
            ),
            stats_file: general.stats_file.as_deref().map(expand_home),
            timestamp_format: general
                .timestamp_format
                .unwrap_or_else(|| DEFAULT_TIMESTAMP_FORMAT.to_string()),
            log_filter: general.log_filter,
            hardware: general.hardware,
            settle_delay: general
                .settle_delay_secs
                .map_or(DEFAULT_SETTLE_DELAY, Duration::from_secs),
        })
    }

    /// Apply `WATERING_STATE_FILE`, `WATERING_LOG` and `RUST_LOG` as
    /// returned by `lookup`. `RUST_LOG` wins over `WATERING_LOG`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("WATERING_STATE_FILE") {
            self.state_file = expand_home(Path::new(&val));
        }
        if let Some(val) = lookup("WATERING_LOG") {
            self.log_filter = Some(val);
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.log_filter = Some(val);
        }
    }
}

fn parse_pot(id: &str, section: Option<&toml::Value>) -> Result<PotConfig, ConfigError> {
    let invalid = |source: ValidationError| ConfigError::InvalidPot {
        pot: id.to_string(),
        source,
    };
    let malformed = |key: &str| ConfigError::Malformed {
        pot: id.to_string(),
        key: key.to_string(),
    };

    let mut builder = PotConfig::builder(id);
    let table = match section {
        None => return builder.build().map_err(invalid),
        Some(toml::Value::Table(table)) => table,
        Some(_) => return Err(malformed(id)),
    };

    if let Some(value) = table.get("description") {
        let description = value.as_str().ok_or_else(|| malformed("description"))?;
        builder = builder.description(description);
    }

    let setters: [(&str, fn(PotConfigBuilder, i64) -> PotConfigBuilder); 5] = [
        ("SensorDryLevel", PotConfigBuilder::sensor_dry_level),
        ("MaxDryPeriod", PotConfigBuilder::max_dry_hours),
        ("WateringDuration", PotConfigBuilder::watering_duration),
        ("ADCChannel", PotConfigBuilder::adc_channel),
        ("RelayBCMPin", PotConfigBuilder::relay_pin),
    ];
    for (key, set) in setters {
        if let Some(value) = table.get(key) {
            let number = integer(value).ok_or_else(|| malformed(key))?;
            builder = set(builder, number);
        }
    }

    builder.build().map_err(invalid)
}

fn integer(value: &toml::Value) -> Option<i64> {
    match value {
        toml::Value::Integer(number) => Some(*number),
        toml::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Replace a leading `~` with `$HOME`.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Configuration errors. All of them abort the run before any hardware is
/// touched.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file {0} does not exist")]
    NotFound(PathBuf),

    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),

    #[error("missing [general] section or its `pots` key")]
    MissingPots,

    #[error("no pots listed in [general]")]
    NoPots,

    #[error("malformed value for {key} in pot {pot:?}")]
    Malformed { pot: String, key: String },

    #[error("invalid configuration for pot {pot:?}")]
    InvalidPot {
        pot: String,
        #[source]
        source: ValidationError,
    },
}
