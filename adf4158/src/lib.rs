//! ADF4158 direct-modulation FMCW synthesizer register set
//!
//! The ADF4158 is programmed with 32 bit words, MSB first, each latched by LE
//! (the SPI chip select). The three LSBs of every word select the register.
//! A full configuration is ten words written R7 first and R0 last, R0 being
//! the double-buffered frequency register. [Registers::words] returns them in
//! that order so they can be streamed like any other control word sequence.
//!
//! Datasheet: <https://www.analog.com/media/en/technical-documentation/data-sheets/ADF4158.pdf>
#![cfg_attr(not(test), no_std)]

use arbitrary_int::{u12, u13, u20, u4, Number};
use bitbybit::{bitenum, bitfield};
use num_enum::IntoPrimitive;
use num_traits::float::FloatCore;

/// Number of words in a full register write sequence.
pub const WORD_COUNT: usize = 10;

/// Fractional modulus.
const MOD: u32 = 1 << 25;

/// Ramp clock dividers used when deriving the ramp step count.
const CLK1: u32 = 1;
const CLK2: u32 = 2;

/// Charge pump current LSB in mA.
const CP_LSB: f64 = 0.3125;

/// Prescaler 8/9 is required above this RF frequency.
const PRESCALER_89_MIN: f64 = 3e9;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

fn invalid(name: &'static str, value: impl Into<f64>) -> Error {
    Error::InvalidParameter {
        name,
        value: value.into(),
    }
}

/// MUXOUT pin function (R0 DB30..DB27).
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoPrimitive)]
#[repr(u8)]
pub enum Muxout {
    ThreeState = 0,
    DVdd = 1,
    DGnd = 2,
    RDivider = 3,
    NDivider = 4,
    DigitalLock = 6,
    SerialData = 7,
    ClkDivider = 10,
    FastLock = 12,
    RDivider2 = 13,
    NDivider2 = 14,
    Readback = 15,
}

/// Ramp waveform (R3 DB11..DB10).
#[bitenum(u2, exhaustive = true)]
#[derive(Debug, PartialEq)]
pub enum RampMode {
    ContinuousSawtooth = 0,
    ContinuousTriangular = 1,
    SingleSawtooth = 2,
    SingleBurst = 3,
}

#[bitfield(u32)]
#[derive(Debug, PartialEq, Eq)]
pub struct R0 {
    #[bits(3..=14, rw)]
    frac_msb: u12,
    #[bits(15..=26, rw)]
    int: u12,
    #[bits(27..=30, rw)]
    muxout: u4,
    #[bit(31, rw)]
    ramp_on: bool,
}

#[bitfield(u32)]
#[derive(Debug, PartialEq, Eq)]
pub struct R1 {
    #[bits(15..=27, rw)]
    frac_lsb: u13,
}

#[bitfield(u32)]
#[derive(Debug, PartialEq, Eq)]
pub struct R2 {
    #[bit(22, rw)]
    prescaler_89: bool,
    #[bits(24..=27, rw)]
    cp_current: u4,
}

#[bitfield(u32)]
#[derive(Debug, PartialEq, Eq)]
pub struct R3 {
    #[bits(10..=11, rw)]
    ramp_mode: RampMode,
}

#[bitfield(u32)]
#[derive(Debug, PartialEq, Eq)]
pub struct R4 {
    #[bits(7..=18, rw)]
    clk2: u12,
}

#[bitfield(u32)]
#[derive(Debug, PartialEq, Eq)]
pub struct R5 {
    /// Two's complement deviation word.
    #[bits(3..=18, rw)]
    deviation: u16,
    #[bits(19..=22, rw)]
    deviation_offset: u4,
}

#[bitfield(u32)]
#[derive(Debug, PartialEq, Eq)]
pub struct R6 {
    #[bits(3..=22, rw)]
    steps: u20,
}

/// Optional ramp attribute updates. `None` leaves a field unchanged.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RampAttributes {
    /// CLK2 divider, 0..=4095
    pub clk2: Option<u16>,
    /// Deviation word, -32768..=32767
    pub deviation: Option<i32>,
    /// Deviation offset, 0..=9
    pub deviation_offset: Option<u8>,
    /// Ramp steps, 0..=2^20 - 1
    pub steps: Option<u32>,
}

/// Phase frequency detector frequency.
///
/// `f_pfd = ref_in * (1 + D) / (R * (1 + T))`
///
/// # Args
/// * `ref_in` - Reference input frequency in Hz.
/// * `doubler` - Reference doubler `D`.
/// * `r_counter` - Reference counter `R`, 1..=32.
/// * `divide_by_2` - Reference divide-by-2 `T`.
pub fn pfd_frequency(
    ref_in: f64,
    doubler: bool,
    r_counter: u8,
    divide_by_2: bool,
) -> Result<f64, Error> {
    if !(1..=32).contains(&r_counter) {
        return Err(invalid("r_counter", r_counter));
    }
    Ok(ref_in * (1 + doubler as u8) as f64
        / (r_counter as f64 * (1 + divide_by_2 as u8) as f64))
}

/// The full ADF4158 register set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registers {
    r7: u32,
    r6a: R6,
    r6b: u32,
    r5a: R5,
    r5b: u32,
    r4: R4,
    r3: R3,
    r2: R2,
    r1: R1,
    r0: R0,
}

impl Default for Registers {
    fn default() -> Self {
        Self::preset_5800()
    }
}

impl Registers {
    /// 5.75 GHz continuous triangular ramp.
    pub fn preset_5800() -> Self {
        Self::from_words([
            0x0000_0007,
            0x0002_7106,
            0x0080_0006,
            0x0002_0c55,
            0x0080_0005,
            0x0018_0104,
            0x0000_0443,
            0x0040_800a,
            0x0000_0001,
            0x811f_8000,
        ])
    }

    /// 915 MHz band ramp.
    pub fn preset_915() -> Self {
        Self::from_words([
            0x0000_0007,
            0x0000_9c46,
            0x0081_4006,
            0x0001_3a65,
            0x0080_0005,
            0x0018_0404,
            0x0000_0443,
            0x0000_800a,
            0x0333_0001,
            0x802d_5998,
        ])
    }

    /// Single sawtooth at 5.75 GHz, minimum charge pump current.
    pub fn single_ramp_5800() -> Result<Self, Error> {
        let mut regs = Self::preset_5800();
        regs.set_ramp(true);
        regs.set_ramp_mode(RampMode::SingleSawtooth);
        regs.set_pump_current(CP_LSB)?;
        regs.set_center_frequency(5.75e9, 10e6)?;
        regs.set_ramp_attributes(RampAttributes {
            clk2: Some(1000),
            deviation: Some(16800),
            deviation_offset: Some(0),
            steps: Some(20000),
        })?;
        regs.set_muxout(Muxout::ThreeState);
        Ok(regs)
    }

    /// Words in write order, R7 first.
    pub fn from_words(words: [u32; WORD_COUNT]) -> Self {
        let [r7, r6a, r6b, r5a, r5b, r4, r3, r2, r1, r0] = words;
        Self {
            r7,
            r6a: R6::new_with_raw_value(r6a),
            r6b,
            r5a: R5::new_with_raw_value(r5a),
            r5b,
            r4: R4::new_with_raw_value(r4),
            r3: R3::new_with_raw_value(r3),
            r2: R2::new_with_raw_value(r2),
            r1: R1::new_with_raw_value(r1),
            r0: R0::new_with_raw_value(r0),
        }
    }

    /// Words in write order, R7 first and R0 last.
    pub fn words(&self) -> [u32; WORD_COUNT] {
        [
            self.r7,
            self.r6a.raw_value(),
            self.r6b,
            self.r5a.raw_value(),
            self.r5b,
            self.r4.raw_value(),
            self.r3.raw_value(),
            self.r2.raw_value(),
            self.r1.raw_value(),
            self.r0.raw_value(),
        ]
    }

    pub fn set_ramp(&mut self, enable: bool) {
        self.r0 = self.r0.with_ramp_on(enable);
    }

    pub fn set_muxout(&mut self, mux: Muxout) {
        self.r0 = self.r0.with_muxout(u4::new(mux.into()));
    }

    pub fn set_ramp_mode(&mut self, mode: RampMode) {
        self.r3 = self.r3.with_ramp_mode(mode);
    }

    /// Validate and apply ramp attributes.
    ///
    /// Either all given attributes are applied or none.
    pub fn set_ramp_attributes(
        &mut self,
        attrs: RampAttributes,
    ) -> Result<(), Error> {
        let clk2 = attrs
            .clk2
            .map(|v| {
                if v <= u12::MAX.value() {
                    Ok(u12::new(v))
                } else {
                    Err(invalid("clk2", v))
                }
            })
            .transpose()?;
        let deviation = attrs
            .deviation
            .map(|v| {
                i16::try_from(v)
                    .map(|d| d as u16)
                    .map_err(|_| invalid("deviation", v))
            })
            .transpose()?;
        let offset = attrs
            .deviation_offset
            .map(|v| {
                if v <= 9 {
                    Ok(u4::new(v))
                } else {
                    Err(invalid("deviation_offset", v))
                }
            })
            .transpose()?;
        let steps = attrs
            .steps
            .map(|v| {
                if v <= u20::MAX.value() {
                    Ok(u20::new(v))
                } else {
                    Err(invalid("steps", v))
                }
            })
            .transpose()?;

        if let Some(clk2) = clk2 {
            self.r4 = self.r4.with_clk2(clk2);
        }
        if let Some(deviation) = deviation {
            self.r5a = self.r5a.with_deviation(deviation);
        }
        if let Some(offset) = offset {
            self.r5a = self.r5a.with_deviation_offset(offset);
        }
        if let Some(steps) = steps {
            self.r6a = self.r6a.with_steps(steps);
        }
        Ok(())
    }

    /// Set the charge pump current.
    ///
    /// # Args
    /// * `current` - Current in mA, a multiple of 0.3125 mA in [0.3125, 5.0].
    pub fn set_pump_current(&mut self, current: f64) -> Result<(), Error> {
        let lsbs = current / CP_LSB;
        if FloatCore::fract(lsbs) != 0.0 || !(1.0..=16.0).contains(&lsbs) {
            return Err(invalid("pump_current", current));
        }
        self.r2 = self.r2.with_cp_current(u4::new(lsbs as u8 - 1));
        Ok(())
    }

    /// Set the ramp center (start) frequency.
    ///
    /// `RF_out = f_pfd * (INT + FRAC / 2^25)`
    pub fn set_center_frequency(
        &mut self,
        frequency: f64,
        f_pfd: f64,
    ) -> Result<(), Error> {
        let int = FloatCore::floor(frequency / f_pfd);
        if !int.is_finite() || !(0.0..=u12::MAX.value() as f64).contains(&int)
        {
            return Err(invalid("frequency", frequency));
        }
        let frac = (((frequency % f_pfd) / f_pfd * MOD as f64) as u32)
            .min(MOD - 1);
        log::debug!("ADF4158 {frequency} Hz: INT {int} FRAC {frac}");

        self.r0 = self
            .r0
            .with_int(u12::new(int as u16))
            .with_frac_msb(u12::new((frac >> 13) as u16));
        self.r1 = self.r1.with_frac_lsb(u13::new((frac & 0x1fff) as u16));
        self.r2 = self.r2.with_prescaler_89(frequency > PRESCALER_89_MIN);
        Ok(())
    }

    /// Derive ramp deviation and step count for a sweep.
    ///
    /// # Args
    /// * `center` - Center frequency in Hz.
    /// * `bandwidth` - Sweep bandwidth in Hz.
    /// * `tm` - Modulation time in s.
    /// * `f_pfd` - PFD frequency in Hz.
    pub fn set_modulation_interval(
        &mut self,
        center: f64,
        bandwidth: f64,
        tm: f64,
        f_pfd: f64,
    ) -> Result<(), Error> {
        let f_res = f_pfd / MOD as f64;
        let steps = FloatCore::floor(tm * f_pfd / (CLK1 * CLK2) as f64);
        if !(1.0..=u20::MAX.value() as f64).contains(&steps) {
            return Err(invalid("modulation_time", tm));
        }
        let mut deviation =
            FloatCore::round(bandwidth / steps / f_res) as i64;
        let mut offset = 0u8;
        while deviation > i16::MAX as i64 {
            deviation >>= 1;
            offset += 1;
        }
        let deviation = i32::try_from(deviation)
            .map_err(|_| invalid("bandwidth", bandwidth))?;

        let mut next = *self;
        next.set_center_frequency(center, f_pfd)?;
        next.set_ramp_attributes(RampAttributes {
            clk2: None,
            deviation: Some(deviation),
            deviation_offset: Some(offset),
            steps: Some(steps as u32),
        })?;
        *self = next;
        Ok(())
    }
}
