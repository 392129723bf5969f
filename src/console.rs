//! Operator console
//!
//! # Design
//! The console reads line based commands while the streamer runs on another
//! thread. It never touches the bus. New tunings are encoded here and offered
//! to the streamer through a [FrameSlot], which swaps them in at the next cycle
//! boundary. Requests that fail validation are reported and leave the stream
//! untouched.
//!
//! Commands:
//! * `tune <frequency> <phase>` - frequency and phase in DDS steps
//! * `hz <frequency>` - frequency in Hz, phase unchanged
//! * `show` - print the current tuning
//! * `stop` - stop streaming at the next cycle boundary
//! * `help`
use std::io::{self, BufRead, Write};

use ctrlword::TuningRequest;
use dds_stream::{FrameSlot, StopSignal};

use crate::profile::{dds_frames, tuning_request, MAX_FRAMES};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Tune { frequency: u32, phase: u32 },
    Hz(f64),
    Show,
    Stop,
    Help,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Unknown command `{0}`, try `help`")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

const TUNE_USAGE: &str = "tune <frequency> <phase>";
const HZ_USAGE: &str = "hz <frequency>";

impl Command {
    /// Parse one console line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let mut args = line.split_whitespace();
        let Some(cmd) = args.next() else {
            return Ok(None);
        };
        let cmd = match cmd {
            "tune" => {
                let mut arg = || -> Result<u32, ParseError> {
                    args.next()
                        .and_then(|a| a.parse().ok())
                        .ok_or(ParseError::Usage(TUNE_USAGE))
                };
                Self::Tune {
                    frequency: arg()?,
                    phase: arg()?,
                }
            }
            "hz" => Self::Hz(
                args.next()
                    .and_then(|a| a.parse().ok())
                    .ok_or(ParseError::Usage(HZ_USAGE))?,
            ),
            "show" => Self::Show,
            "stop" => Self::Stop,
            "help" => Self::Help,
            other => return Err(ParseError::Unknown(other.into())),
        };
        if args.next().is_some() {
            return Err(match cmd {
                Self::Tune { .. } => ParseError::Usage(TUNE_USAGE),
                Self::Hz(_) => ParseError::Usage(HZ_USAGE),
                _ => ParseError::Usage("show | stop | help"),
            });
        }
        Ok(Some(cmd))
    }
}

/// Console state for a stream of `L` byte frames.
pub struct Console<'a, const L: usize> {
    stop: &'a StopSignal,
    /// `None` if the profile streams fixed frames.
    slot: Option<&'a FrameSlot<L, MAX_FRAMES>>,
    sysclk: f64,
    current: Option<TuningRequest>,
}

impl<'a, const L: usize> Console<'a, L> {
    /// # Args
    /// * `stop` - The streamer's stop signal.
    /// * `slot` - The streamer's frame slot if the profile can be retuned.
    /// * `sysclk` - DDS reference clock in Hz.
    /// * `current` - The tuning being streamed.
    pub fn new(
        stop: &'a StopSignal,
        slot: Option<&'a FrameSlot<L, MAX_FRAMES>>,
        sysclk: f64,
        current: Option<TuningRequest>,
    ) -> Self {
        Self {
            stop,
            slot,
            sysclk,
            current,
        }
    }

    pub fn current(&self) -> Option<TuningRequest> {
        self.current
    }

    /// Process commands until `stop` or end of input.
    ///
    /// End of input leaves the stream running.
    pub fn run(
        &mut self,
        input: impl BufRead,
        mut output: impl Write,
    ) -> io::Result<()> {
        for line in input.lines() {
            match Command::parse(&line?) {
                Ok(Some(Command::Stop)) => {
                    self.execute(Command::Stop, &mut output)?;
                    return Ok(());
                }
                Ok(Some(cmd)) => self.execute(cmd, &mut output)?,
                Ok(None) => {}
                Err(e) => writeln!(output, "{e}")?,
            }
        }
        log::info!("Console input closed, streaming continues");
        Ok(())
    }

    pub fn execute(
        &mut self,
        cmd: Command,
        output: &mut impl Write,
    ) -> io::Result<()> {
        match cmd {
            Command::Tune { frequency, phase } => self.retune(
                tuning_request(None, frequency, phase, self.sysclk),
                output,
            ),
            Command::Hz(hz) => {
                let phase = self.current.map_or(0, |r| r.phase().into());
                self.retune(
                    tuning_request(Some(hz), 0, phase, self.sysclk),
                    output,
                )
            }
            Command::Show => match &self.current {
                Some(request) => writeln!(
                    output,
                    "frequency {} ({:.3} Hz), phase {}, word {}",
                    request.frequency(),
                    ctrlword::steps_to_frequency(
                        request.frequency(),
                        self.sysclk
                    ),
                    request.phase(),
                    request.encode(),
                ),
                None => writeln!(output, "Streaming fixed frames"),
            },
            Command::Stop => {
                self.stop.stop();
                log::info!("Stop requested");
                writeln!(output, "Stopping")
            }
            Command::Help => {
                writeln!(output, "{TUNE_USAGE} | {HZ_USAGE} | show | stop")
            }
        }
    }

    fn retune(
        &mut self,
        request: Result<TuningRequest, crate::Error>,
        output: &mut impl Write,
    ) -> io::Result<()> {
        let Some(slot) = self.slot else {
            return writeln!(output, "This profile cannot be retuned");
        };
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                log::warn!("Rejected tuning: {e}");
                return writeln!(output, "Rejected: {e}");
            }
        };
        if let Err(e) = slot.offer(dds_frames::<L>(&request)) {
            log::warn!("Rejected tuning: {e}");
            return writeln!(output, "Rejected: {e}");
        }
        self.current = Some(request);
        crate::diagnostics::log_request(&request, self.sysclk);
        writeln!(output, "Tuned: {}", request.encode())
    }
}
