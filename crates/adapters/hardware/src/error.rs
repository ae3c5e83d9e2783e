//! Hardware adapter error types.

use std::num::ParseIntError;
use std::path::PathBuf;

/// Errors from the Linux sysfs / IIO backend.
#[derive(Debug, thiserror::Error)]
pub enum SysfsError {
    /// Reading or writing a sysfs attribute failed.
    #[error("sysfs access to {path} failed")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The IIO channel returned something that is not an integer sample.
    #[error("invalid ADC sample {value:?} in {path}")]
    InvalidSample {
        path: PathBuf,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// A fault injected into the simulated backend.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SimulatedFault {
    #[error("simulated sensor fault on ADC channel {0}")]
    Sensor(u8),

    #[error("simulated relay fault on pin {0}")]
    Relay(u8),
}
