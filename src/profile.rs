//! Frame sequences for the supported device profiles.
use ctrlword::{
    frequency_to_steps, DdsFrame, TuningRequest, WireFrame, DDS_FRAME_LEN,
    WORD_BYTES,
};
use dds_stream::Frames;

use crate::{settings::Settings, Error};

/// Capacity of every frame sequence.
pub const MAX_FRAMES: usize = 16;

pub type DdsFrames = Frames<DDS_FRAME_LEN, MAX_FRAMES>;
pub type RegisterFrames = Frames<WORD_BYTES, MAX_FRAMES>;

/// Bus inspection fill patterns.
pub const PATTERNS: [DdsFrame; 2] = [
    WireFrame::from_bytes([0xf0; DDS_FRAME_LEN]),
    WireFrame::from_bytes([0xcc; DDS_FRAME_LEN]),
];

/// Resolve a tuning request in device units.
///
/// # Args
/// * `frequency_hz` - Frequency in Hz. Overrides `frequency` if given.
/// * `frequency` - Frequency tuning value in DDS steps.
/// * `phase` - Phase offset in DDS steps.
/// * `sysclk` - DDS reference clock in Hz.
pub fn tuning_request(
    frequency_hz: Option<f64>,
    frequency: u32,
    phase: u32,
    sysclk: f64,
) -> Result<TuningRequest, Error> {
    let frequency = match frequency_hz {
        Some(hz) => {
            let steps = frequency_to_steps(hz, sysclk)?.value();
            log::debug!("{hz} Hz at {sysclk} Hz SYSCLK: {steps} steps");
            steps
        }
        None => frequency,
    };
    Ok(TuningRequest::new(frequency, phase)?)
}

/// The tuning request described by the settings.
pub fn settings_request(settings: &Settings) -> Result<TuningRequest, Error> {
    tuning_request(
        settings.frequency_hz,
        settings.frequency,
        settings.phase,
        settings.sysclk_hz,
    )
}

/// A single control word frame for the request.
pub fn dds_frames<const L: usize>(
    request: &TuningRequest,
) -> Frames<L, MAX_FRAMES> {
    let mut frames = Frames::new();
    // Capacity is nonzero.
    frames.push(WireFrame::from(request.encode())).ok();
    frames
}

pub fn pattern_frames() -> DdsFrames {
    PATTERNS.iter().copied().collect()
}

/// The register words, in programming order, one frame each.
pub fn register_frames(registers: &adf4158::Registers) -> RegisterFrames {
    registers
        .words()
        .iter()
        .map(|&word| WireFrame::from_word(word))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dds_scenario() {
        let request = tuning_request(None, 1_000_000, 0, 125e6).unwrap();
        let frames = dds_frames::<DDS_FRAME_LEN>(&request);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), &[0x00, 0x0f, 0x42, 0x40, 0x00]);
    }

    #[test]
    fn hertz_overrides_steps() {
        let request =
            tuning_request(Some(1e6), 42, 7, f64::from(1u32 << 24) * 1e6)
                .unwrap();
        assert_eq!(request.frequency().value(), 1);
        assert_eq!(request.phase(), 7);
    }

    #[test]
    fn rejected_before_framing() {
        assert!(matches!(
            tuning_request(None, 1 << 24, 0, 125e6),
            Err(Error::Encoding(_))
        ));
        assert!(matches!(
            tuning_request(None, 0, 256, 125e6),
            Err(Error::Encoding(_))
        ));
        assert!(matches!(
            tuning_request(Some(-1.0), 0, 0, 125e6),
            Err(Error::Encoding(_))
        ));
        // Small negative inputs round to -0.0 steps.
        assert!(matches!(
            tuning_request(Some(-1e-3), 0, 0, 125e6),
            Err(Error::Encoding(_))
        ));
    }

    #[test]
    fn patterns_are_not_words() {
        let frames = pattern_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_bytes(), &[0xf0; 5]);
        assert_eq!(frames[1].as_bytes(), &[0xcc; 5]);
        assert!(frames.iter().all(|f| f.word().is_none()));
    }

    #[test]
    fn registers_in_order() {
        let registers = adf4158::Registers::default();
        let frames = register_frames(&registers);
        assert_eq!(frames.len(), adf4158::WORD_COUNT);
        for (frame, word) in frames.iter().zip(registers.words()) {
            assert_eq!(frame.word(), Some(word));
        }
        // R7 goes first, R0 last.
        assert_eq!(frames[0].word().map(|w| w & 7), Some(7));
        assert_eq!(frames[9].word().map(|w| w & 7), Some(0));
    }
}
