//! # watering-adapter-hardware
//!
//! Hardware adapters implementing [`watering_app::ports::Hardware`].
//!
//! ## Backends
//! - [`SysfsHardware`]: Linux IIO ADC for the moisture sensors and sysfs
//!   GPIO for the active-low relay board
//! - [`FakeHardware`]: deterministic readings and recorded relay writes,
//!   for dry runs (`--fake-hardware`) and tests
//!
//! Both drive relays through [`relay::RelayGuard`], which closes the valve
//! on every exit path.
//!
//! ## Dependency rule
//! Depends on `watering-app` (for the port trait) and `watering-domain`.

pub mod error;
pub mod fake;
pub mod relay;
pub mod sysfs;

use std::path::PathBuf;

use serde::Deserialize;
use watering_app::ports::Hardware;
use watering_domain::error::HardwareError;
use watering_domain::pot::PotConfig;

pub use error::{SimulatedFault, SysfsError};
pub use fake::FakeHardware;
pub use sysfs::SysfsHardware;

/// Which backend to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HardwareMode {
    #[default]
    Real,
    Fake,
}

/// Locations of the kernel interfaces used by [`SysfsHardware`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HardwareSettings {
    /// IIO device directory of the ADC.
    pub iio_device: PathBuf,
    /// Root of the sysfs GPIO class.
    pub gpio_root: PathBuf,
    /// Value written to `in_voltage<N>_scale` before each read, such as
    /// [`sysfs::ADS1115_GAIN_ONE_SCALE`]. Unset keeps the driver's gain.
    pub adc_scale: Option<String>,
}

impl Default for HardwareSettings {
    fn default() -> Self {
        Self {
            iio_device: PathBuf::from("/sys/bus/iio/devices/iio:device0"),
            gpio_root: PathBuf::from("/sys/class/gpio"),
            adc_scale: None,
        }
    }
}

/// The hardware backend selected for this process.
#[derive(Debug)]
pub enum HardwareBackend {
    Sysfs(SysfsHardware),
    Fake(FakeHardware),
}

impl HardwareBackend {
    /// Build the backend for `mode`. Settings only apply to real hardware.
    #[must_use]
    pub fn from_settings(mode: HardwareMode, settings: &HardwareSettings) -> Self {
        match mode {
            HardwareMode::Real => Self::Sysfs(
                SysfsHardware::new(settings.iio_device.clone(), settings.gpio_root.clone())
                    .with_scale(settings.adc_scale.clone()),
            ),
            HardwareMode::Fake => Self::Fake(FakeHardware::new().holding(true)),
        }
    }

    #[must_use]
    pub fn mode(&self) -> HardwareMode {
        match self {
            Self::Sysfs(_) => HardwareMode::Real,
            Self::Fake(_) => HardwareMode::Fake,
        }
    }
}

impl Hardware for HardwareBackend {
    async fn read_sensor(&self, pot: &PotConfig) -> Result<u32, HardwareError> {
        match self {
            Self::Sysfs(hw) => hw.read_sensor(pot).await,
            Self::Fake(hw) => hw.read_sensor(pot).await,
        }
    }

    async fn water_pot(&self, pot: &PotConfig) -> Result<(), HardwareError> {
        match self {
            Self::Sysfs(hw) => hw.water_pot(pot).await,
            Self::Fake(hw) => hw.water_pot(pot).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let settings = HardwareSettings::default();
        assert_eq!(
            settings.iio_device,
            PathBuf::from("/sys/bus/iio/devices/iio:device0")
        );
        assert_eq!(settings.gpio_root, PathBuf::from("/sys/class/gpio"));
        assert!(settings.adc_scale.is_none());
    }

    #[test]
    fn should_deserialize_partial_settings() {
        let settings: HardwareSettings = toml::from_str(r#"gpio_root = "/tmp/gpio""#).unwrap();
        assert_eq!(settings.gpio_root, PathBuf::from("/tmp/gpio"));
        assert_eq!(
            settings.iio_device,
            HardwareSettings::default().iio_device
        );
    }

    #[test]
    fn should_deserialize_adc_scale() {
        let settings: HardwareSettings = toml::from_str(r#"adc_scale = "0.125000""#).unwrap();
        assert_eq!(settings.adc_scale.as_deref(), Some(sysfs::ADS1115_GAIN_ONE_SCALE));
    }

    #[tokio::test]
    async fn should_apply_configured_scale_on_real_backend() {
        let iio = std::env::temp_dir().join(format!(
            "watering_backend_scale_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&iio);
        std::fs::create_dir_all(&iio).unwrap();
        std::fs::write(iio.join("in_voltage1_raw"), "640\n").unwrap();
        let settings = HardwareSettings {
            iio_device: iio.clone(),
            adc_scale: Some("0.125000".to_string()),
            ..HardwareSettings::default()
        };
        let backend = HardwareBackend::from_settings(HardwareMode::Real, &settings);
        let pot = PotConfig::builder("basil")
            .adc_channel(1)
            .relay_pin(17)
            .build()
            .unwrap();

        assert_eq!(backend.read_sensor(&pot).await.unwrap(), 640);
        assert_eq!(
            std::fs::read_to_string(iio.join("in_voltage1_scale")).unwrap(),
            "0.125000"
        );
    }

    #[test]
    fn should_build_backend_for_mode() {
        let settings = HardwareSettings::default();
        assert_eq!(
            HardwareBackend::from_settings(HardwareMode::Real, &settings).mode(),
            HardwareMode::Real
        );
        assert_eq!(
            HardwareBackend::from_settings(HardwareMode::Fake, &settings).mode(),
            HardwareMode::Fake
        );
    }

    #[tokio::test]
    async fn should_delegate_to_fake_backend() {
        let backend =
            HardwareBackend::from_settings(HardwareMode::Fake, &HardwareSettings::default());
        let pot = PotConfig::builder("basil")
            .adc_channel(2)
            .relay_pin(17)
            .build()
            .unwrap();

        assert_eq!(backend.read_sensor(&pot).await.unwrap(), 50_000);
    }
}
