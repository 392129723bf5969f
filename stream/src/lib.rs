//! Continuous DDS control word streaming
//!
//! # Design
//! A [Streamer] owns an SPI transport and a sequence of [WireFrame]s. Once
//! started it writes the sequence to the bus over and over, one frame per
//! `write()` (and thus per chip select assertion), without any delay beyond
//! what the bus imposes. This forms the continuous carrier the DDS expects.
//!
//! A cycle is one full pass over the sequence. Cycles are never torn: the
//! [StopSignal] and the [FrameSlot] holding a replacement sequence are only
//! looked at between cycles. A stop therefore takes effect within one cycle and
//! a frequency change never interleaves old and new frames.
//!
//! ```text
//! Idle --run()--> Streaming --stop--> Stopped --rearm()--> Idle
//!                           \-write error--> Failed --rearm()--> Idle
//! ```
//!
//! Transport errors are not retried. The session ends in `Failed` and the
//! error is returned to the caller, who owns the restart policy.
#![cfg_attr(not(test), no_std)]

use core::sync::atomic::{AtomicBool, Ordering};

use ctrlword::WireFrame;
use embedded_hal::spi;

mod streamer;
pub use streamer::*;

/// A sequence of at most `N` frames of `L` bytes each.
pub type Frames<const L: usize, const N: usize> = heapless::Vec<WireFrame<L>, N>;

/// Streaming session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Streaming,
    Stopped,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("SPI transport: {0}")]
    Transport(spi::ErrorKind),
    #[error("Configuration: {0}")]
    Configuration(&'static str),
    #[error("Not armed (state {0:?})")]
    NotArmed(State),
}

impl<E: spi::Error> From<E> for Error {
    fn from(value: E) -> Self {
        Self::Transport(value.kind())
    }
}

/// Cancellation request shared between the streaming loop and its controller.
#[derive(Debug, Default)]
pub struct StopSignal(AtomicBool);

impl StopSignal {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Request the streaming loop to stop at the next cycle boundary.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Hand-over point for a replacement frame sequence.
///
/// Producers publish with [FrameSlot::offer]. The streamer takes the pending
/// sequence at its next cycle boundary. An offer that has not been taken yet is
/// superseded by a newer one.
pub struct FrameSlot<const L: usize, const N: usize> {
    pending: spin::Mutex<Option<Frames<L, N>>>,
}

impl<const L: usize, const N: usize> Default for FrameSlot<L, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const L: usize, const N: usize> FrameSlot<L, N> {
    pub const fn new() -> Self {
        Self {
            pending: spin::Mutex::new(None),
        }
    }

    /// Publish a replacement sequence.
    pub fn offer(&self, frames: Frames<L, N>) -> Result<(), Error> {
        if frames.is_empty() {
            return Err(Error::Configuration("Empty frame sequence"));
        }
        if self.pending.lock().replace(frames).is_some() {
            log::debug!("Superseded pending frame sequence");
        }
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    pub(crate) fn take(&self) -> Option<Frames<L, N>> {
        self.pending.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_supersedes() {
        let slot = FrameSlot::<4, 2>::new();
        assert!(!slot.is_pending());
        let a = Frames::from_slice(&[WireFrame::from_word(1)]).unwrap();
        let b = Frames::from_slice(&[WireFrame::from_word(2)]).unwrap();
        slot.offer(a).unwrap();
        slot.offer(b.clone()).unwrap();
        assert!(slot.is_pending());
        assert_eq!(slot.take(), Some(b));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn slot_rejects_empty() {
        let slot = FrameSlot::<4, 2>::new();
        assert_eq!(
            slot.offer(Frames::new()),
            Err(Error::Configuration("Empty frame sequence"))
        );
        assert!(!slot.is_pending());
    }

    #[test]
    fn stop_signal() {
        let stop = StopSignal::new();
        assert!(!stop.is_stopped());
        stop.stop();
        assert!(stop.is_stopped());
        stop.clear();
        assert!(!stop.is_stopped());
    }

    #[test]
    fn transport_error_kind() {
        assert_eq!(
            Error::from(spi::ErrorKind::ModeFault),
            Error::Transport(spi::ErrorKind::ModeFault)
        );
    }
}
