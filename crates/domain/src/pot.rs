//! Pot: one irrigation target with its own moisture sensor and relay.

use std::borrow::Borrow;
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Name of the global configuration section. Never a valid pot id.
pub const RESERVED_ID: &str = "general";

/// Value used for required hardware assignments that were not provided.
/// Always fails the range check.
pub const UNASSIGNED: i64 = -1;

pub const DEFAULT_SENSOR_DRY_LEVEL: i64 = 100_000;
pub const DEFAULT_MAX_DRY_HOURS: i64 = 6;
pub const DEFAULT_WATERING_DURATION: i64 = 10;

pub const SENSOR_DRY_LEVEL_RANGE: RangeInclusive<i64> = 1..=1_000_000;
pub const MAX_DRY_HOURS_RANGE: RangeInclusive<i64> = 1..=48;
pub const WATERING_DURATION_RANGE: RangeInclusive<i64> = 1..=15;
pub const ADC_CHANNEL_RANGE: RangeInclusive<i64> = 0..=3;
pub const RELAY_PIN_RANGE: RangeInclusive<i64> = 0..=50;

/// Identifier of a pot, unique within a configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PotId(String);

impl PotId {
    /// Validate and wrap a pot identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyId`] for an empty string and
    /// [`ValidationError::ReservedId`] for [`RESERVED_ID`].
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if id == RESERVED_ID {
            return Err(ValidationError::ReservedId(id));
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PotId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PotId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PotId> for String {
    fn from(id: PotId) -> Self {
        id.0
    }
}

/// Validated, immutable per-pot parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PotConfig {
    pub id: PotId,
    pub description: String,
    /// Readings at or above this value count as dry.
    pub sensor_dry_level: u32,
    /// Reserved for an escalation policy; validated but not acted upon.
    pub max_dry_hours: u32,
    /// Seconds the relay is held open per watering.
    pub watering_duration: u32,
    pub adc_channel: u8,
    /// BCM pin number of the watering relay.
    pub relay_pin: u8,
}

impl PotConfig {
    /// Create a builder for the pot named `id`.
    #[must_use]
    pub fn builder(id: impl Into<String>) -> PotConfigBuilder {
        PotConfigBuilder {
            id: id.into(),
            ..PotConfigBuilder::default()
        }
    }

    /// How long the relay stays open for one watering.
    #[must_use]
    pub fn watering_hold(&self) -> Duration {
        Duration::from_secs(u64::from(self.watering_duration))
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] for the first parameter outside
    /// its allowed range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        bounded::<u32>(
            "SensorDryLevel",
            i64::from(self.sensor_dry_level),
            SENSOR_DRY_LEVEL_RANGE,
        )?;
        bounded::<u32>(
            "MaxDryPeriod",
            i64::from(self.max_dry_hours),
            MAX_DRY_HOURS_RANGE,
        )?;
        bounded::<u32>(
            "WateringDuration",
            i64::from(self.watering_duration),
            WATERING_DURATION_RANGE,
        )?;
        bounded::<u8>("ADCChannel", i64::from(self.adc_channel), ADC_CHANNEL_RANGE)?;
        bounded::<u8>("RelayBCMPin", i64::from(self.relay_pin), RELAY_PIN_RANGE)?;
        Ok(())
    }
}

/// Step-by-step builder for [`PotConfig`].
///
/// Takes raw integers so that out-of-range configuration input is reported
/// with the offending value instead of being truncated.
#[derive(Debug, Default)]
pub struct PotConfigBuilder {
    id: String,
    description: Option<String>,
    sensor_dry_level: Option<i64>,
    max_dry_hours: Option<i64>,
    watering_duration: Option<i64>,
    adc_channel: Option<i64>,
    relay_pin: Option<i64>,
}

impl PotConfigBuilder {
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn sensor_dry_level(mut self, level: i64) -> Self {
        self.sensor_dry_level = Some(level);
        self
    }

    #[must_use]
    pub fn max_dry_hours(mut self, hours: i64) -> Self {
        self.max_dry_hours = Some(hours);
        self
    }

    #[must_use]
    pub fn watering_duration(mut self, seconds: i64) -> Self {
        self.watering_duration = Some(seconds);
        self
    }

    #[must_use]
    pub fn adc_channel(mut self, channel: i64) -> Self {
        self.adc_channel = Some(channel);
        self
    }

    #[must_use]
    pub fn relay_pin(mut self, pin: i64) -> Self {
        self.relay_pin = Some(pin);
        self
    }

    /// Apply defaults, validate, and return a [`PotConfig`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an invalid id or the first parameter
    /// outside its range. Parameters are checked in configuration order:
    /// dry level, dry period, watering duration, ADC channel, relay pin.
    pub fn build(self) -> Result<PotConfig, ValidationError> {
        let id = PotId::new(self.id)?;
        let sensor_dry_level = bounded(
            "SensorDryLevel",
            self.sensor_dry_level.unwrap_or(DEFAULT_SENSOR_DRY_LEVEL),
            SENSOR_DRY_LEVEL_RANGE,
        )?;
        let max_dry_hours = bounded(
            "MaxDryPeriod",
            self.max_dry_hours.unwrap_or(DEFAULT_MAX_DRY_HOURS),
            MAX_DRY_HOURS_RANGE,
        )?;
        let watering_duration = bounded(
            "WateringDuration",
            self.watering_duration.unwrap_or(DEFAULT_WATERING_DURATION),
            WATERING_DURATION_RANGE,
        )?;
        let adc_channel = bounded(
            "ADCChannel",
            self.adc_channel.unwrap_or(UNASSIGNED),
            ADC_CHANNEL_RANGE,
        )?;
        let relay_pin = bounded(
            "RelayBCMPin",
            self.relay_pin.unwrap_or(UNASSIGNED),
            RELAY_PIN_RANGE,
        )?;

        Ok(PotConfig {
            description: self
                .description
                .unwrap_or_else(|| id.as_str().to_string()),
            id,
            sensor_dry_level,
            max_dry_hours,
            watering_duration,
            adc_channel,
            relay_pin,
        })
    }
}

fn bounded<T: TryFrom<i64>>(
    field: &'static str,
    value: i64,
    range: RangeInclusive<i64>,
) -> Result<T, ValidationError> {
    let out_of_range = || ValidationError::OutOfRange {
        field,
        value,
        min: *range.start(),
        max: *range.end(),
    };
    if !range.contains(&value) {
        return Err(out_of_range());
    }
    T::try_from(value).map_err(|_| out_of_range())
}
