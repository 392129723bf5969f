use ctrlword::{encode_control_word, DdsFrame, WireFrame};
use dds_stream::{Error, FrameSlot, Frames, State, StopSignal, Streamer};
use embedded_hal::spi::{ErrorKind, ErrorType, Operation, SpiDevice};

use std::sync::atomic::{AtomicU64, Ordering};
use std::vec::Vec;

/// Records every write and calls `hook` with the number of writes so far.
struct Recorder<F> {
    writes: Vec<Vec<u8>>,
    fail_at: Option<usize>,
    hook: F,
}

impl<F: FnMut(usize)> Recorder<F> {
    fn new(hook: F) -> Self {
        Self {
            writes: Vec::new(),
            fail_at: None,
            hook,
        }
    }
}

impl<F> ErrorType for Recorder<F> {
    type Error = ErrorKind;
}

impl<F: FnMut(usize)> SpiDevice<u8> for Recorder<F> {
    fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), ErrorKind> {
        for op in operations.iter() {
            match op {
                Operation::Write(data) => {
                    if self.fail_at == Some(self.writes.len()) {
                        return Err(ErrorKind::Other);
                    }
                    self.writes.push(data.to_vec());
                    (self.hook)(self.writes.len());
                }
                _ => return Err(ErrorKind::Other),
            }
        }
        Ok(())
    }
}

fn frames(words: &[u32]) -> Frames<5, 4> {
    words.iter().map(|&w| DdsFrame::from_word(w)).collect()
}

#[test]
fn scenario_bytes_on_the_wire() {
    let stop = StopSignal::new();
    let slot = FrameSlot::new();
    let word = encode_control_word(1_000_000, 0).unwrap();
    let seq = Frames::<5, 4>::from_slice(&[word.into()]).unwrap();
    let bus = Recorder::new(|n| {
        if n == 2 {
            stop.stop()
        }
    });
    let mut streamer = Streamer::new(bus, seq, &stop, &slot).unwrap();
    streamer.run().unwrap();
    let bus = streamer.release();
    assert_eq!(bus.writes, vec![vec![0x00, 0x0f, 0x42, 0x40, 0x00]; 2]);
}

#[test]
fn order_preserved_over_cycles() {
    const K: usize = 7;
    let stop = StopSignal::new();
    let slot = FrameSlot::new();
    let seq = frames(&[0x11, 0x22, 0x33]);
    let bus = Recorder::new(|n| {
        if n == 3 * K {
            stop.stop()
        }
    });
    let mut streamer = Streamer::new(bus, seq.clone(), &stop, &slot).unwrap();
    let summary = streamer.run().unwrap();
    assert_eq!(summary.cycles, K as u64);
    assert_eq!(summary.frames, 3 * K as u64);
    assert_eq!(streamer.state(), State::Stopped);

    let bus = streamer.release();
    assert_eq!(bus.writes.len(), 3 * K);
    for (cycle, chunk) in bus.writes.chunks(3).enumerate() {
        for (have, want) in chunk.iter().zip(seq.iter()) {
            assert_eq!(have.as_slice(), &want.as_bytes()[..], "cycle {cycle}");
        }
    }
}

#[test]
fn stop_honored_within_one_cycle() {
    for stop_at in 1..=12 {
        let stop = StopSignal::new();
        let slot = FrameSlot::new();
        let seq = frames(&[1, 2, 3, 4]);
        let bus = Recorder::new(|n| {
            if n == stop_at {
                stop.stop()
            }
        });
        let mut streamer = Streamer::new(bus, seq, &stop, &slot).unwrap();
        streamer.run().unwrap();
        let sent = streamer.release().writes.len();
        // Only the remainder of the current cycle follows the stop.
        assert!(sent >= stop_at);
        assert!(sent - stop_at < 4);
        assert_eq!(sent % 4, 0);
    }
}

#[test]
fn stop_before_start_sends_nothing() {
    let stop = StopSignal::new();
    let slot = FrameSlot::new();
    stop.stop();
    let mut streamer =
        Streamer::new(Recorder::new(|_| {}), frames(&[1]), &stop, &slot)
            .unwrap();
    assert_eq!(streamer.state(), State::Idle);
    let summary = streamer.run().unwrap();
    assert_eq!(summary.frames, 0);
    assert_eq!(streamer.state(), State::Stopped);
}

#[test]
fn transport_failure_is_fatal() {
    let stop = StopSignal::new();
    let slot = FrameSlot::new();
    let mut bus = Recorder::new(|_| {});
    bus.fail_at = Some(5);
    let mut streamer =
        Streamer::new(bus, frames(&[1, 2, 3]), &stop, &slot).unwrap();
    assert_eq!(streamer.run(), Err(Error::Transport(ErrorKind::Other)));
    assert_eq!(streamer.state(), State::Failed);
    assert_eq!(streamer.summary().frames, 5);
    assert_eq!(streamer.summary().cycles, 1);

    // No implicit restart.
    assert_eq!(streamer.run(), Err(Error::NotArmed(State::Failed)));

    streamer.rearm();
    assert_eq!(streamer.state(), State::Idle);
    assert_eq!(streamer.run(), Err(Error::Transport(ErrorKind::Other)));
    assert_eq!(streamer.release().writes.len(), 5);
}

#[test]
fn rearm_after_stop() {
    let stop = StopSignal::new();
    let slot = FrameSlot::new();
    stop.stop();
    let mut streamer =
        Streamer::new(Recorder::new(|_| {}), frames(&[1]), &stop, &slot)
            .unwrap();
    streamer.run().unwrap();
    assert_eq!(streamer.run(), Err(Error::NotArmed(State::Stopped)));
    streamer.rearm();
    assert!(!stop.is_stopped());
    assert_eq!(streamer.state(), State::Idle);
}

#[test]
fn stop_and_failure_in_one_cycle() {
    let stop = StopSignal::new();
    let slot = FrameSlot::new();
    let mut bus = Recorder::new(|n| {
        if n == 1 {
            stop.stop()
        }
    });
    bus.fail_at = Some(1);
    let mut streamer =
        Streamer::new(bus, frames(&[1, 2, 3]), &stop, &slot).unwrap();
    assert_eq!(streamer.run(), Err(Error::Transport(ErrorKind::Other)));
    assert!(streamer.stop_requested());

    // The pending stop survives the re-arm and ends the next session at once.
    streamer.rearm();
    assert_eq!(streamer.state(), State::Idle);
    assert!(stop.is_stopped());
    let summary = streamer.run().unwrap();
    assert_eq!(summary.frames, 1);
    assert_eq!(streamer.state(), State::Stopped);
    assert_eq!(streamer.release().writes.len(), 1);
}

#[test]
fn empty_sequence_rejected() {
    let stop = StopSignal::new();
    let slot = FrameSlot::new();
    let res = Streamer::<_, 5, 4>::new(
        Recorder::new(|_| {}),
        Frames::new(),
        &stop,
        &slot,
    );
    assert!(matches!(res, Err(Error::Configuration(_))));
}

#[test]
fn swap_at_cycle_boundary() {
    let stop = StopSignal::new();
    let slot = FrameSlot::new();
    let old = frames(&[0xa1, 0xa2, 0xa3]);
    let new = frames(&[0xb1, 0xb2]);
    let bus = Recorder::new(|n| {
        // Offer mid-cycle, stop after the first cycle of the new sequence.
        if n == 2 {
            slot.offer(new.clone()).unwrap();
        }
        if n == 5 {
            stop.stop();
        }
    });
    let mut streamer = Streamer::new(bus, old, &stop, &slot).unwrap();
    let summary = streamer.run().unwrap();
    assert_eq!(summary.swaps, 1);
    assert_eq!(summary.cycles, 2);
    assert_eq!(streamer.frames(), new.as_slice());

    let words: Vec<u32> = streamer
        .release()
        .writes
        .iter()
        .map(|w| u32::from_be_bytes([w[1], w[2], w[3], w[4]]))
        .collect();
    assert_eq!(words, [0xa1, 0xa2, 0xa3, 0xb1, 0xb2]);
}

/// Counts writes without storing them.
struct Counter<'a>(&'a AtomicU64);

impl ErrorType for Counter<'_> {
    type Error = ErrorKind;
}

impl SpiDevice<u8> for Counter<'_> {
    fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), ErrorKind> {
        self.0.fetch_add(operations.len() as u64, Ordering::Relaxed);
        Ok(())
    }
}

#[test]
fn stop_from_other_thread() {
    let stop = StopSignal::new();
    let slot = FrameSlot::<4, 2>::new();
    let count = AtomicU64::new(0);
    let seq = Frames::from_slice(&[
        WireFrame::from_bytes([0xf0; 4]),
        WireFrame::from_bytes([0xcc; 4]),
    ])
    .unwrap();

    let summary = std::thread::scope(|s| {
        let handle = s.spawn(|| {
            let mut streamer =
                Streamer::new(Counter(&count), seq, &stop, &slot).unwrap();
            streamer.run()
        });
        while count.load(Ordering::Relaxed) < 1000 {
            std::thread::yield_now();
        }
        stop.stop();
        handle.join().unwrap()
    })
    .unwrap();

    assert_eq!(summary.frames, count.load(Ordering::Relaxed));
    assert_eq!(summary.frames, 2 * summary.cycles);
}
