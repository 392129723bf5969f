//! Human readable dumps for the operator log.
use std::fmt::Write;

use ctrlword::{to_binary_string, ControlWord, TuningRequest, WireFrame};

use crate::settings::Settings;

/// Describe one frame: its bytes and, if it carries one, the control word in
/// hex and binary.
pub fn describe_frame<const L: usize>(frame: &WireFrame<L>) -> String {
    let mut line = String::new();
    for byte in frame.as_bytes() {
        write!(line, "{byte:02x} ").ok();
    }
    match frame.word() {
        Some(word) => {
            write!(line, "| {word:#010x} {}", to_binary_string(word)).ok()
        }
        None => write!(line, "| pattern").ok(),
    };
    line
}

pub fn log_settings(settings: &Settings) {
    match settings.to_json() {
        Ok(json) => log::info!("Settings: {json}"),
        Err(e) => log::warn!("{e}"),
    }
}

pub fn log_request(request: &TuningRequest, sysclk: f64) {
    let word: ControlWord = request.encode();
    log::info!(
        "Tuning {} steps ({:.3} Hz), phase {}: {word}",
        request.frequency(),
        ctrlword::steps_to_frequency(request.frequency(), sysclk),
        request.phase(),
    );
}

pub fn log_frames<const L: usize>(frames: &[WireFrame<L>]) {
    log::info!("{} frames of {L} bytes", frames.len());
    for (i, frame) in frames.iter().enumerate() {
        log::info!("[{i}] {}", describe_frame(frame));
    }
}
