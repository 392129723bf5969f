//! Stream DDS control words or synthesizer registers over `spidev`.
//!
//! The selected frame sequence is written to the bus continuously until the
//! operator enters `stop` on the console or the transport fails beyond the
//! restart budget. Invalid settings and bus setup failures are reported
//! before the first write.
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ctrlword::{TuningRequest, DDS_FRAME_LEN, WORD_BYTES};
use dds_stream::{FrameSlot, Frames, StopSignal, Streamer};
use tracing_subscriber::EnvFilter;

use siggen::{
    console::Console,
    diagnostics,
    profile::{self, MAX_FRAMES},
    settings::{Profile, Settings},
    supervisor::supervise,
    transport::SpidevBus,
    Error,
};

static STOP: StopSignal = StopSignal::new();
static DDS_SLOT: FrameSlot<DDS_FRAME_LEN, MAX_FRAMES> = FrameSlot::new();
static REGISTER_SLOT: FrameSlot<WORD_BYTES, MAX_FRAMES> = FrameSlot::new();

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// JSON settings file. Defaults apply to absent fields.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// `spidev` device, overriding the settings.
    #[arg(short, long)]
    device: Option<String>,

    /// Log settings and frames, then exit without opening the bus.
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes
    /// precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let mut settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(device) = &cli.device {
        settings.set_device(device)?;
    }
    diagnostics::log_settings(&settings);

    match settings.profile {
        Profile::Dds => {
            let request = profile::settings_request(&settings)?;
            diagnostics::log_request(&request, settings.sysclk_hz);
            let frames = profile::dds_frames(&request);
            stream(cli, &settings, frames, &DDS_SLOT, Some(request))
        }
        Profile::Pattern => {
            let frames = profile::pattern_frames();
            stream(cli, &settings, frames, &DDS_SLOT, None)
        }
        Profile::Adf4158 => {
            let registers = settings.adf4158.registers()?;
            let frames = profile::register_frames(&registers);
            stream(cli, &settings, frames, &REGISTER_SLOT, None)
        }
    }
}

/// Stream `frames` until stopped.
///
/// # Args
/// * `slot` - Where the streamer takes replacement sequences from.
/// * `request` - The tuning being streamed. The console can only retune if
///   this is set.
fn stream<const L: usize>(
    cli: &Cli,
    settings: &Settings,
    frames: Frames<L, MAX_FRAMES>,
    slot: &'static FrameSlot<L, MAX_FRAMES>,
    request: Option<TuningRequest>,
) -> Result<(), Error> {
    diagnostics::log_frames(&frames);
    if cli.dry_run {
        log::info!("Dry run, not opening {}", settings.device);
        return Ok(());
    }

    let bus = SpidevBus::open(settings)?;
    let mut streamer = Streamer::new(bus, frames, &STOP, slot)?;

    // The console blocks on stdin and is not joined.
    let tunable = request.map(|_| slot);
    let sysclk = settings.sysclk_hz;
    std::thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            let mut console = Console::new(&STOP, tunable, sysclk, request);
            let stdin = std::io::stdin().lock();
            if let Err(e) = console.run(stdin, std::io::stdout()) {
                log::warn!("Console: {e}");
            }
        })?;

    let summary = supervise(&mut streamer, settings.restarts)?;
    log::info!(
        "Sent {} frames in {} cycles ({} retunes)",
        summary.frames,
        summary.cycles,
        summary.swaps
    );
    Ok(())
}
