//! `spidev` bus transport
//!
//! # Design
//! [SpidevBus] adapts a Linux `spidev` character device to the
//! `embedded-hal` [SpiDevice] trait so the streamer stays platform agnostic.
//! All write operations of one transaction are submitted as a single
//! `SPI_IOC_MESSAGE`, keeping chip select asserted for the whole transaction.
//!
//! The bus is write only. Reads, transfers and delays are rejected.
use std::io;

use embedded_hal::spi::{self, ErrorType, Operation, SpiDevice};
use spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};

use crate::{settings::Settings, Error};

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("spidev: {0}")]
    Io(#[from] io::Error),
    #[error("Unsupported operation")]
    Unsupported,
}

impl spi::Error for BusError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

/// A configured `spidev` device.
pub struct SpidevBus {
    spi: Spidev,
}

/// Map an SPI mode number to `spidev` flags.
pub fn mode_flags(mode: u8) -> Result<SpiModeFlags, Error> {
    Ok(match mode {
        0 => SpiModeFlags::SPI_MODE_0,
        1 => SpiModeFlags::SPI_MODE_1,
        2 => SpiModeFlags::SPI_MODE_2,
        3 => SpiModeFlags::SPI_MODE_3,
        m => {
            return Err(Error::Configuration(format!(
                "SPI mode {m} not in [0, 3]"
            )))
        }
    })
}

impl SpidevBus {
    /// Open and configure the device.
    ///
    /// The bus runs 8 bit words, most significant bit first, with an active
    /// low chip select.
    pub fn open(settings: &Settings) -> Result<Self, Error> {
        let device = settings.device.as_str();
        let mut spi = Spidev::open(device).map_err(|e| {
            Error::Configuration(format!("Opening {device}: {e}"))
        })?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(settings.max_speed_hz)
            .lsb_first(false)
            .mode(mode_flags(settings.mode)?)
            .build();
        spi.configure(&options).map_err(|e| {
            Error::Configuration(format!("Configuring {device}: {e}"))
        })?;
        log::info!(
            "{device}: {} Hz, mode {}, MSB first, CS active low",
            settings.max_speed_hz,
            settings.mode
        );
        Ok(Self { spi })
    }
}

impl ErrorType for SpidevBus {
    type Error = BusError;
}

impl SpiDevice<u8> for SpidevBus {
    fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), BusError> {
        // Frame writes take the allocation free path.
        if let [Operation::Write(data)] = operations {
            return Ok(self.spi.transfer(&mut SpidevTransfer::write(data))?);
        }

        let mut transfers = Vec::with_capacity(operations.len());
        for op in operations.iter() {
            match op {
                Operation::Write(data) => {
                    transfers.push(SpidevTransfer::write(data))
                }
                _ => return Err(BusError::Unsupported),
            }
        }
        Ok(self.spi.transfer_multiple(&mut transfers)?)
    }
}
