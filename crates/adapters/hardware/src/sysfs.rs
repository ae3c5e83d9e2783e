//! Linux backend: moisture sensors through the IIO subsystem and relays
//! through the sysfs GPIO interface.
//!
//! An ADS1015/ADS1115 bound to the kernel `ti-ads1015` driver exposes each
//! single-ended input as `<iio device>/in_voltage<N>_raw`. Relay lines are
//! exported under `<gpio root>/gpio<pin>` and driven through `value`.
//!
//! Raw counts depend on the programmable gain, which the driver exposes as
//! `in_voltage<N>_scale` in millivolts per count. The driver's default is
//! ±2.048 V full scale; dry levels calibrated at ±4.096 V (gain 1) on an
//! ADS1115 need [`ADS1115_GAIN_ONE_SCALE`] written before each read, which
//! [`SysfsHardware::with_scale`] does.

use std::path::{Path, PathBuf};

use tracing::debug;
use watering_app::ports::Hardware;
use watering_domain::error::HardwareError;
use watering_domain::pot::PotConfig;

use crate::error::SysfsError;
use crate::relay::{Level, RelayDriver, RelayGuard};

/// `in_voltage<N>_scale` of an ADS1115 at ±4.096 V full scale.
pub const ADS1115_GAIN_ONE_SCALE: &str = "0.125000";

/// Relay access through `/sys/class/gpio`.
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    root: PathBuf,
}

impl SysfsGpio {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn line(&self, pin: u8) -> PathBuf {
        self.root.join(format!("gpio{pin}"))
    }
}

impl RelayDriver for SysfsGpio {
    type Error = SysfsError;

    fn prepare(&self, pin: u8) -> Result<(), SysfsError> {
        let line = self.line(pin);
        if !line.exists() {
            debug!(pin, "exporting GPIO line");
            write_attr(&self.root.join("export"), &pin.to_string())?;
        }
        // "high" switches to output and sets the level in one step, so the
        // active-low relay never glitches open while being configured.
        write_attr(&line.join("direction"), "high")
    }

    fn write(&self, pin: u8, level: Level) -> Result<(), SysfsError> {
        write_attr(&self.line(pin).join("value"), level.as_sysfs())
    }
}

fn write_attr(path: &Path, value: &str) -> Result<(), SysfsError> {
    std::fs::write(path, value).map_err(|source| SysfsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Real hardware: IIO ADC for sensors, sysfs GPIO for relays.
#[derive(Debug, Clone)]
pub struct SysfsHardware {
    iio_device: PathBuf,
    gpio: SysfsGpio,
    scale: Option<String>,
}

impl SysfsHardware {
    pub fn new(iio_device: impl Into<PathBuf>, gpio_root: impl Into<PathBuf>) -> Self {
        Self {
            iio_device: iio_device.into(),
            gpio: SysfsGpio::new(gpio_root),
            scale: None,
        }
    }

    /// Program `scale` into a channel's `in_voltage<N>_scale` before every
    /// read of that channel. `None` keeps whatever the driver has set.
    #[must_use]
    pub fn with_scale(mut self, scale: Option<String>) -> Self {
        self.scale = scale;
        self
    }

    fn channel_path(&self, channel: u8) -> PathBuf {
        self.iio_device.join(format!("in_voltage{channel}_raw"))
    }

    fn scale_path(&self, channel: u8) -> PathBuf {
        self.iio_device.join(format!("in_voltage{channel}_scale"))
    }

    async fn read_channel(&self, channel: u8) -> Result<u32, SysfsError> {
        if let Some(scale) = &self.scale {
            let path = self.scale_path(channel);
            debug!(channel, scale = %scale, "setting ADC scale");
            tokio::fs::write(&path, scale)
                .await
                .map_err(|source| SysfsError::Io { path, source })?;
        }

        let path = self.channel_path(channel);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| SysfsError::Io {
                path: path.clone(),
                source,
            })?;
        parse_sample(path, raw.trim())
    }
}

/// Single-ended conversions can dip slightly below zero; those clamp to 0.
fn parse_sample(path: PathBuf, raw: &str) -> Result<u32, SysfsError> {
    let value: i64 = raw.parse().map_err(|source| SysfsError::InvalidSample {
        path,
        value: raw.to_string(),
        source,
    })?;
    Ok(u32::try_from(value.max(0)).unwrap_or(u32::MAX))
}

impl Hardware for SysfsHardware {
    async fn read_sensor(&self, pot: &PotConfig) -> Result<u32, HardwareError> {
        debug!(pot = %pot.id, channel = pot.adc_channel, "reading moisture sensor");
        let reading = self
            .read_channel(pot.adc_channel)
            .await
            .map_err(|err| HardwareError::sensor(pot.adc_channel, err))?;
        debug!(pot = %pot.id, reading, "sensor reading");
        Ok(reading)
    }

    async fn water_pot(&self, pot: &PotConfig) -> Result<(), HardwareError> {
        let pin = pot.relay_pin;
        debug!(pot = %pot.id, pin, seconds = pot.watering_duration, "opening relay");

        let guard =
            RelayGuard::open(&self.gpio, pin).map_err(|err| HardwareError::actuator(pin, err))?;
        tokio::time::sleep(pot.watering_hold()).await;
        guard
            .close()
            .map_err(|err| HardwareError::actuator(pin, err))?;

        debug!(pot = %pot.id, pin, "relay closed");
        Ok(())
    }
}
