use embedded_hal::spi::SpiDevice;

use super::{Error, FrameSlot, Frames, State, StopSignal};
use ctrlword::WireFrame;

/// Counters of a streaming session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Completed passes over the frame sequence.
    pub cycles: u64,
    /// Frames accepted by the transport.
    pub frames: u64,
    /// Replacement sequences swapped in.
    pub swaps: u64,
}

/// The continuous frame streamer.
pub struct Streamer<'a, B, const L: usize, const N: usize> {
    bus: B,
    frames: Frames<L, N>,
    stop: &'a StopSignal,
    slot: &'a FrameSlot<L, N>,
    state: State,
    summary: Summary,
}

impl<'a, B: SpiDevice<u8>, const L: usize, const N: usize>
    Streamer<'a, B, L, N>
{
    /// Construct a new streamer in the `Idle` state.
    ///
    /// # Args
    /// * `bus` - The configured transport. The streamer only ever writes.
    /// * `frames` - The initial frame sequence. Must not be empty.
    /// * `stop` - Cancellation signal, checked once per cycle.
    /// * `slot` - Source of replacement sequences, checked once per cycle.
    pub fn new(
        bus: B,
        frames: Frames<L, N>,
        stop: &'a StopSignal,
        slot: &'a FrameSlot<L, N>,
    ) -> Result<Self, Error> {
        if frames.is_empty() {
            return Err(Error::Configuration("Empty frame sequence"));
        }
        Ok(Self {
            bus,
            frames,
            stop,
            slot,
            state: State::Idle,
            summary: Summary::default(),
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// The sequence currently being streamed.
    pub fn frames(&self) -> &[WireFrame<L>] {
        &self.frames
    }

    /// Stream until stopped or the transport fails.
    ///
    /// Returns the session summary after a stop. A transport error ends the
    /// session in `Failed` and is returned without retry.
    pub fn run(&mut self) -> Result<Summary, Error> {
        if self.state != State::Idle {
            return Err(Error::NotArmed(self.state));
        }
        self.state = State::Streaming;
        log::info!(
            "Streaming {} frames of {} bytes",
            self.frames.len(),
            L
        );

        loop {
            if self.stop.is_stopped() {
                self.state = State::Stopped;
                log::info!("Streaming stopped: {:?}", self.summary);
                return Ok(self.summary);
            }

            if let Err(e) = self.cycle() {
                self.state = State::Failed;
                log::error!("Streaming failed: {e} ({:?})", self.summary);
                return Err(e);
            }
        }
    }

    fn cycle(&mut self) -> Result<(), Error> {
        if let Some(frames) = self.slot.take() {
            self.frames = frames;
            self.summary.swaps += 1;
            log::info!("Swapped in {} frames", self.frames.len());
        }

        for frame in self.frames.iter() {
            self.bus.write(frame.as_ref())?;
            self.summary.frames += 1;
        }
        self.summary.cycles += 1;
        Ok(())
    }

    /// Whether a stop has been requested and not yet cleared by [Self::rearm].
    pub fn stop_requested(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Return a stopped or failed streamer to `Idle`.
    ///
    /// The shared stop signal is cleared only after a `Stopped` session. A stop
    /// requested during a session that then failed stays pending, so the next
    /// [Self::run] ends immediately.
    pub fn rearm(&mut self) {
        match self.state {
            State::Stopped => self.stop.clear(),
            State::Failed => {}
            State::Idle | State::Streaming => return,
        }
        self.state = State::Idle;
        log::info!("Streamer re-armed");
    }

    /// Give the transport back for teardown.
    pub fn release(self) -> B {
        self.bus
    }
}
