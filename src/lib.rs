//! Host application support for streaming synthesizer control words over
//! Linux `spidev`.
//!
//! # Design
//! The binary wires together:
//! * [settings]: JSON settings with defaults for every field,
//! * [profile]: the frame sequence for the selected device profile,
//! * [transport]: an `embedded-hal` [SpiDevice](embedded_hal::spi::SpiDevice)
//!   over `spidev`,
//! * [console]: the operator command line on stdin,
//! * [supervisor]: the restart policy around the streaming loop,
//! * [diagnostics]: human readable dumps of settings and frames.
//!
//! Everything that can fail before the first bus write (settings, encoding,
//! register computation, bus setup) is reported as an [Error] and the
//! streaming loop is never entered.
pub mod console;
pub mod diagnostics;
pub mod profile;
pub mod settings;
pub mod supervisor;
pub mod transport;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration: {0}")]
    Configuration(String),
    #[error("Settings: {0:?}")]
    Settings(serde_json_core::de::Error),
    #[error(transparent)]
    Encoding(#[from] ctrlword::Error),
    #[error(transparent)]
    Register(#[from] adf4158::Error),
    #[error(transparent)]
    Stream(#[from] dds_stream::Error),
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json_core::de::Error> for Error {
    fn from(value: serde_json_core::de::Error) -> Self {
        Self::Settings(value)
    }
}
