//! Hardware port: moisture sensors and watering relays.
//!
//! Implementations live in adapter crates (real GPIO/ADC access or a
//! simulated stub). The engine only ever talks to this trait.

use std::future::Future;
use std::sync::Arc;

use watering_domain::error::HardwareError;
use watering_domain::pot::PotConfig;

/// Physical access to a pot's sensor and relay.
pub trait Hardware: Send + Sync {
    /// Read the raw moisture value on the pot's ADC channel.
    /// Higher values mean drier soil.
    fn read_sensor(
        &self,
        pot: &PotConfig,
    ) -> impl Future<Output = Result<u32, HardwareError>> + Send;

    /// Open the pot's relay for its watering duration, then close it.
    ///
    /// Implementations must leave the relay closed on every exit path,
    /// including when the returned future is dropped mid-hold.
    fn water_pot(&self, pot: &PotConfig) -> impl Future<Output = Result<(), HardwareError>> + Send;
}

impl<T: Hardware> Hardware for Arc<T> {
    fn read_sensor(
        &self,
        pot: &PotConfig,
    ) -> impl Future<Output = Result<u32, HardwareError>> + Send {
        (**self).read_sensor(pot)
    }

    fn water_pot(&self, pot: &PotConfig) -> impl Future<Output = Result<(), HardwareError>> + Send {
        (**self).water_pot(pot)
    }
}
