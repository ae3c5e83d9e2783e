//! Error types shared across the workspace.
//!
//! Each failure class of a run has its own type so callers can apply a
//! different policy to each: validation errors are fatal at load time,
//! hardware errors are scoped to one pot, state and reporting errors are
//! handled at the run boundary. Adapters keep their own error enums and
//! convert into these via `From`.

/// Boxed error used as the `source` of errors raised behind a port.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A pot definition or roster violates a domain invariant.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The pot identifier is empty.
    #[error("pot id must not be empty")]
    EmptyId,

    /// The pot identifier collides with a reserved section name.
    #[error("pot id {0:?} is reserved")]
    ReservedId(String),

    /// A numeric parameter is outside its allowed range.
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        /// Configuration key of the parameter (e.g. `WateringDuration`).
        field: &'static str,
        /// The rejected value.
        value: i64,
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value.
        max: i64,
    },

    /// The same pot id was declared twice.
    #[error("pot {0:?} is declared more than once")]
    DuplicatePot(String),

    /// The ADC channel is already assigned to another pot.
    #[error("ADC channel {channel} is already assigned to pot {owner:?}")]
    DuplicateAdcChannel {
        /// The contested channel.
        channel: u8,
        /// The pot that claimed the channel first.
        owner: String,
    },

    /// The relay pin is already assigned to another pot.
    #[error("relay pin {pin} is already assigned to pot {owner:?}")]
    DuplicateRelayPin {
        /// The contested BCM pin.
        pin: u8,
        /// The pot that claimed the pin first.
        owner: String,
    },
}

/// Sensor or actuator access failed. Scoped to a single pot.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Reading the moisture sensor failed.
    #[error("failed to read moisture sensor on ADC channel {channel}")]
    Sensor {
        channel: u8,
        #[source]
        source: BoxError,
    },

    /// Driving the watering relay failed.
    #[error("failed to drive watering relay on pin {pin}")]
    Actuator {
        pin: u8,
        #[source]
        source: BoxError,
    },
}

impl HardwareError {
    /// Wrap a sensor-side failure.
    pub fn sensor(channel: u8, source: impl Into<BoxError>) -> Self {
        Self::Sensor {
            channel,
            source: source.into(),
        }
    }

    /// Wrap a relay-side failure.
    pub fn actuator(pin: u8, source: impl Into<BoxError>) -> Self {
        Self::Actuator {
            pin,
            source: source.into(),
        }
    }
}

/// The persisted pot state exists but could not be read or decoded.
#[derive(Debug, thiserror::Error)]
#[error("failed to load pot state")]
pub struct StateLoadError {
    #[source]
    source: BoxError,
}

impl StateLoadError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// The pot state could not be written to durable storage.
#[derive(Debug, thiserror::Error)]
#[error("failed to save pot state")]
pub struct StateSaveError {
    #[source]
    source: BoxError,
}

impl StateSaveError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// A reporting sink rejected a run outcome.
#[derive(Debug, thiserror::Error)]
#[error("failed to report run outcome")]
pub struct ReportError {
    #[source]
    source: BoxError,
}

impl ReportError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}
