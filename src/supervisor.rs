//! Restart policy around the streaming loop.
use dds_stream::{State, Streamer, Summary};
use embedded_hal::spi::SpiDevice;

use crate::Error;

/// Run the streamer to completion.
///
/// A stop ends supervision successfully. A transport failure re-arms the
/// streamer while the restart budget lasts and is returned once it is spent.
/// A failure while a stop is pending is returned without restart.
///
/// # Args
/// * `streamer` - An armed streamer.
/// * `restarts` - Number of re-arms allowed after transport failures.
pub fn supervise<B: SpiDevice<u8>, const L: usize, const N: usize>(
    streamer: &mut Streamer<'_, B, L, N>,
    restarts: u32,
) -> Result<Summary, Error> {
    let mut remaining = restarts;
    loop {
        match streamer.run() {
            Ok(summary) => return Ok(summary),
            Err(e) if streamer.stop_requested() => {
                log::warn!("{e} with stop pending, not restarting");
                return Err(e.into());
            }
            Err(e) if remaining > 0 && streamer.state() == State::Failed => {
                remaining -= 1;
                log::warn!("Restarting after {e}, {remaining} restarts left");
                streamer.rearm();
            }
            Err(e) => return Err(e.into()),
        }
    }
}
