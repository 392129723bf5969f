//! DDS tuning control word encoder
//!
//! # Layout
//! The control word is 32 bits wide. The frequency tuning value occupies the
//! upper 24 bits, the phase offset the lower 8 bits:
//!
//! ```text
//!  31                              8 7          0
//! +---------------------------------+------------+
//! |        frequency (u24)          | phase (u8) |
//! +---------------------------------+------------+
//! ```
//!
//! On the wire the word is sent most significant byte first, left-padded with
//! zero bytes to the transfer width of the device profile. See [WireFrame].
#![cfg_attr(not(test), no_std)]

use arbitrary_int::{u24, Number};
use bitbybit::bitfield;
use num_traits::float::FloatCore;

mod binary;
pub use binary::*;
mod frame;
pub use frame::*;

/// Errors raised while validating a tuning request.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    /// A request parameter is outside of the representable range.
    #[error("Invalid parameter `{name}`: {value} not in [0, {max}]")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        max: u32,
    },
    /// The reference clock is not a positive, finite frequency.
    #[error("Invalid reference clock {0} Hz")]
    InvalidClock(f64),
}

impl Error {
    fn invalid(name: &'static str, value: impl Into<f64>, max: u32) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
            max,
        }
    }
}

#[bitfield(u32, default = 0)]
#[derive(Debug, PartialEq, Eq)]
pub struct ControlWord {
    #[bits(8..=31, rw)]
    frequency: u24,
    #[bits(0..=7, rw)]
    phase: u8,
}

impl core::fmt::Display for ControlWord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:#010x} {}",
            self.raw_value(),
            to_binary_string(self.raw_value())
        )
    }
}

/// A validated frequency and phase pair in device units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TuningRequest {
    frequency: u24,
    phase: u8,
}

impl TuningRequest {
    /// Largest frequency tuning value in device steps.
    pub const FREQUENCY_MAX: u32 = (1 << 24) - 1;
    /// Largest phase offset value in device units.
    pub const PHASE_MAX: u32 = u8::MAX as u32;

    /// Validate a request.
    ///
    /// # Args
    /// * `frequency` - Frequency tuning value in device steps.
    /// * `phase` - Phase offset in device units.
    ///
    /// Returns [Error::InvalidParameter] if either value does not fit its field.
    pub fn new(frequency: u32, phase: u32) -> Result<Self, Error> {
        if frequency > Self::FREQUENCY_MAX {
            return Err(Error::invalid(
                "frequency",
                frequency,
                Self::FREQUENCY_MAX,
            ));
        }
        if phase > Self::PHASE_MAX {
            return Err(Error::invalid("phase", phase, Self::PHASE_MAX));
        }
        Ok(Self {
            frequency: u24::new(frequency),
            phase: phase as u8,
        })
    }

    /// Construct a request, clamping both values into their fields.
    pub fn saturating(frequency: u32, phase: u32) -> Self {
        Self {
            frequency: u24::new(frequency.min(Self::FREQUENCY_MAX)),
            phase: phase.min(Self::PHASE_MAX) as u8,
        }
    }

    pub fn frequency(&self) -> u24 {
        self.frequency
    }

    pub fn phase(&self) -> u8 {
        self.phase
    }

    /// Pack the request into its control word.
    pub fn encode(&self) -> ControlWord {
        ControlWord::new_with_raw_value(0)
            .with_frequency(self.frequency)
            .with_phase(self.phase)
    }
}

/// Encode a frequency and phase into a control word.
///
/// Out-of-range values are rejected, never clamped. Use
/// [TuningRequest::saturating] for explicit clamping.
pub fn encode_control_word(
    frequency: u32,
    phase: u32,
) -> Result<ControlWord, Error> {
    Ok(TuningRequest::new(frequency, phase)?.encode())
}

/// Convert a frequency in Hertz into the 24 bit frequency tuning value.
///
/// The result is `round(frequency / sysclk * 2^24)`. Unlike a free-running
/// accumulator this does not alias into Nyquist: values outside the field are
/// rejected. Negative (including `-0.0`) or NaN frequencies are rejected as
/// well, and so is a reference clock that is not positive and finite.
pub fn frequency_to_steps(frequency: f64, sysclk: f64) -> Result<u24, Error> {
    if !(sysclk > 0.0 && sysclk.is_finite()) {
        return Err(Error::InvalidClock(sysclk));
    }
    if !(frequency >= 0.0) || frequency.is_sign_negative() {
        return Err(Error::invalid(
            "frequency_hz",
            frequency,
            TuningRequest::FREQUENCY_MAX,
        ));
    }
    let lsb = sysclk.recip() * (1u32 << 24) as f64;
    let steps = FloatCore::round(frequency * lsb);
    if !steps.is_finite() || steps > TuningRequest::FREQUENCY_MAX as f64 {
        return Err(Error::invalid(
            "frequency_hz",
            frequency,
            TuningRequest::FREQUENCY_MAX,
        ));
    }
    Ok(u24::new(steps as u32))
}

/// Convert a 24 bit frequency tuning value back into Hertz.
pub fn steps_to_frequency(steps: u24, sysclk: f64) -> f64 {
    steps.value() as f64 * sysclk / (1u32 << 24) as f64
}
