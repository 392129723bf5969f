//! Application settings
//!
//! Settings are read once at startup from a JSON file. Every field has a
//! default, so an empty object (or no file at all) yields a working DDS setup
//! on `/dev/spidev0.0`.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

pub const DEFAULT_DEVICE: &str = "/dev/spidev0.0";

/// The device profile selects what is streamed and the frame width.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// A single 5 byte DDS control word frame.
    #[default]
    Dds,
    /// The ten 4 byte ADF4158 register words.
    Adf4158,
    /// Alternating `0xF0` and `0xCC` fill patterns for bus inspection.
    Pattern,
}

/// ADF4158 register set to program.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Adf4158Preset {
    /// 5.75 GHz continuous triangular ramp.
    #[default]
    #[serde(rename = "5800")]
    Ramp5800,
    /// 915 MHz continuous triangular ramp.
    #[serde(rename = "915")]
    Ramp915,
    /// 5.8 GHz single sawtooth burst.
    #[serde(rename = "single-5800")]
    Single5800,
}

impl Adf4158Preset {
    pub fn registers(self) -> Result<adf4158::Registers, Error> {
        Ok(match self {
            Self::Ramp5800 => adf4158::Registers::preset_5800(),
            Self::Ramp915 => adf4158::Registers::preset_915(),
            Self::Single5800 => adf4158::Registers::single_ramp_5800()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub profile: Profile,
    /// `spidev` character device.
    pub device: heapless::String<64>,
    /// SPI clock in Hz.
    pub max_speed_hz: u32,
    /// SPI mode (clock polarity and phase), 0 to 3.
    pub mode: u8,
    /// Frequency tuning value in DDS steps.
    pub frequency: u32,
    /// Phase offset in DDS steps.
    pub phase: u32,
    /// Frequency in Hz. Takes precedence over `frequency` when set.
    pub frequency_hz: Option<f64>,
    /// DDS reference clock in Hz, used to convert `frequency_hz`.
    pub sysclk_hz: f64,
    pub adf4158: Adf4158Preset,
    /// Number of times a failed stream is re-armed before giving up.
    pub restarts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile: Profile::Dds,
            // An empty path fails validation.
            device: heapless::String::try_from(DEFAULT_DEVICE)
                .unwrap_or_default(),
            // 250 MHz core clock divided by 2
            max_speed_hz: 125_000_000,
            mode: 0,
            frequency: 0,
            phase: 0,
            frequency_hz: None,
            sysclk_hz: 125e6,
            adf4158: Adf4158Preset::default(),
            restarts: 0,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document.
    ///
    /// Missing fields take their defaults.
    pub fn from_json(json: &[u8]) -> Result<Self, Error> {
        let (settings, _len): (Self, _) = serde_json_core::from_slice(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let json = std::fs::read(path)?;
        log::debug!("Loaded {} bytes from {}", json.len(), path.display());
        Self::from_json(&json)
    }

    /// Override the `spidev` device path.
    pub fn set_device(&mut self, device: &str) -> Result<(), Error> {
        let mut path = heapless::String::new();
        path.push_str(device).map_err(|_| {
            Error::Configuration(format!("Device path too long: {device}"))
        })?;
        self.device = path;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.mode > 3 {
            return Err(Error::Configuration(format!(
                "SPI mode {} not in [0, 3]",
                self.mode
            )));
        }
        if self.max_speed_hz == 0 {
            return Err(Error::Configuration("SPI clock of 0 Hz".into()));
        }
        if self.device.is_empty() {
            return Err(Error::Configuration("Empty device path".into()));
        }
        if !(self.sysclk_hz > 0.0 && self.sysclk_hz.is_finite()) {
            return Err(Error::Configuration(format!(
                "Reference clock of {} Hz",
                self.sysclk_hz
            )));
        }
        Ok(())
    }

    /// Serialize the settings for display.
    pub fn to_json(&self) -> Result<heapless::String<512>, Error> {
        serde_json_core::to_string(self).map_err(|e| {
            Error::Configuration(format!("Serializing settings: {e:?}"))
        })
    }
}
