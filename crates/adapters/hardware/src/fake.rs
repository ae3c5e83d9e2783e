//! Simulated hardware for dry runs and tests.
//!
//! | ADC channel | Reading |
//! |-------------|---------|
//! | 2 | 50 000 |
//! | any other | 100 |
//!
//! Readings can be overridden per channel, either as a fixed value or as a
//! sequence whose last value repeats. Relay writes go through the same
//! [`RelayGuard`] as real hardware and are recorded for inspection.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};

use tracing::info;
use watering_app::ports::Hardware;
use watering_domain::error::HardwareError;
use watering_domain::pot::PotConfig;

use crate::error::SimulatedFault;
use crate::relay::{Level, OPEN, RelayDriver, RelayGuard};

/// Reading returned for channels without an explicit value.
pub const DEFAULT_READING: u32 = 100;

/// One level change on a simulated relay line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayEvent {
    pub pin: u8,
    pub level: Level,
}

/// Simulated GPIO lines that record every write.
#[derive(Debug, Default)]
pub struct FakeGpio {
    events: Mutex<Vec<RelayEvent>>,
    failing_pins: HashSet<u8>,
}

impl RelayDriver for FakeGpio {
    type Error = SimulatedFault;

    fn prepare(&self, pin: u8) -> Result<(), SimulatedFault> {
        if self.failing_pins.contains(&pin) {
            return Err(SimulatedFault::Relay(pin));
        }
        Ok(())
    }

    fn write(&self, pin: u8, level: Level) -> Result<(), SimulatedFault> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RelayEvent { pin, level });
        Ok(())
    }
}

/// Deterministic stand-in for the sensor ADC and relay board.
#[derive(Debug)]
pub struct FakeHardware {
    readings: Mutex<HashMap<u8, VecDeque<u32>>>,
    failing_channels: HashSet<u8>,
    gpio: FakeGpio,
    hold: bool,
}

impl Default for FakeHardware {
    fn default() -> Self {
        let mut readings = HashMap::new();
        readings.insert(2, VecDeque::from([50_000]));
        Self {
            readings: Mutex::new(readings),
            failing_channels: HashSet::new(),
            gpio: FakeGpio::default(),
            hold: false,
        }
    }
}

impl FakeHardware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Always return `reading` on `channel`.
    #[must_use]
    pub fn with_reading(self, channel: u8, reading: u32) -> Self {
        self.with_sequence(channel, [reading])
    }

    /// Return `readings` on `channel` one by one, repeating the last one.
    #[must_use]
    pub fn with_sequence(self, channel: u8, readings: impl IntoIterator<Item = u32>) -> Self {
        self.readings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(channel, readings.into_iter().collect());
        self
    }

    /// Make every read on `channel` fail.
    #[must_use]
    pub fn with_failing_sensor(mut self, channel: u8) -> Self {
        self.failing_channels.insert(channel);
        self
    }

    /// Make every watering on `pin` fail before the relay opens.
    #[must_use]
    pub fn with_failing_relay(mut self, pin: u8) -> Self {
        self.gpio.failing_pins.insert(pin);
        self
    }

    /// Hold relays open for the pot's real watering duration.
    #[must_use]
    pub fn holding(mut self, hold: bool) -> Self {
        self.hold = hold;
        self
    }

    /// Every relay level change so far, oldest first.
    #[must_use]
    pub fn relay_events(&self) -> Vec<RelayEvent> {
        self.gpio
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Last level written to `pin`, if any.
    #[must_use]
    pub fn relay_level(&self, pin: u8) -> Option<Level> {
        self.relay_events()
            .iter()
            .rev()
            .find(|event| event.pin == pin)
            .map(|event| event.level)
    }

    /// How many times the relay on `pin` was opened.
    #[must_use]
    pub fn watering_count(&self, pin: u8) -> usize {
        self.relay_events()
            .iter()
            .filter(|event| event.pin == pin && event.level == OPEN)
            .count()
    }

    fn next_reading(&self, channel: u8) -> u32 {
        let mut readings = self.readings.lock().unwrap_or_else(PoisonError::into_inner);
        match readings.get_mut(&channel) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(DEFAULT_READING),
            Some(queue) => queue.front().copied().unwrap_or(DEFAULT_READING),
            None => DEFAULT_READING,
        }
    }
}

impl Hardware for FakeHardware {
    async fn read_sensor(&self, pot: &PotConfig) -> Result<u32, HardwareError> {
        if self.failing_channels.contains(&pot.adc_channel) {
            return Err(HardwareError::sensor(
                pot.adc_channel,
                SimulatedFault::Sensor(pot.adc_channel),
            ));
        }
        let reading = self.next_reading(pot.adc_channel);
        info!(pot = %pot.id, channel = pot.adc_channel, reading, "simulated sensor reading");
        Ok(reading)
    }

    async fn water_pot(&self, pot: &PotConfig) -> Result<(), HardwareError> {
        let pin = pot.relay_pin;
        info!(pot = %pot.id, pin, seconds = pot.watering_duration, "simulated watering");

        let guard =
            RelayGuard::open(&self.gpio, pin).map_err(|err| HardwareError::actuator(pin, err))?;
        if self.hold {
            tokio::time::sleep(pot.watering_hold()).await;
        }
        guard
            .close()
            .map_err(|err| HardwareError::actuator(pin, err))
    }
}
