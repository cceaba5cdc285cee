use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use beat_detection::analysis::bands::{FrequencyBand, FrequencyBandMapper};
use beat_detection::config::{DetectionMode, DetectorConfig};
use beat_detection::engine::{
    BeatDetection, FrameSource, StubTimeSource, TickOutcome, WavFrameSource,
};
use beat_detection::events::BeatEvent;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "beat_cli",
    about = "Offline harness for the spectral beat detector"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the detector over a WAV file and print the events
    Detect {
        #[arg(long)]
        input: PathBuf,
        /// JSON configuration file (defaults are used when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the configured detection mode
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Print one summary report instead of one JSON line per event
        #[arg(long)]
        summary: bool,
    },
    /// Print the frequency band layout for a sample rate
    Bands {
        #[arg(long, default_value_t = 44_100)]
        sample_rate: u32,
        #[arg(long, default_value_t = 1024)]
        num_samples: usize,
        #[arg(long, default_value_t = 60.0)]
        min_frequency: f32,
        #[arg(long, default_value_t = 3)]
        divisions: usize,
    },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum ModeArg {
    Energy,
    Frequency,
    Both,
}

impl From<ModeArg> for DetectionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Energy => DetectionMode::Energy,
            ModeArg::Frequency => DetectionMode::Frequency,
            ModeArg::Both => DetectionMode::Both,
        }
    }
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect {
            input,
            config,
            mode,
            summary,
        } => run_detect(&input, config, mode, summary),
        Commands::Bands {
            sample_rate,
            num_samples,
            min_frequency,
            divisions,
        } => run_bands(sample_rate, num_samples, min_frequency, divisions),
    }
}

fn run_detect(
    input: &Path,
    config_path: Option<PathBuf>,
    mode: Option<ModeArg>,
    summary: bool,
) -> Result<ExitCode> {
    let mut config = config_path
        .map(DetectorConfig::load_from_file)
        .unwrap_or_default();
    if let Some(mode) = mode {
        config.mode = mode.into();
    }

    let source = WavFrameSource::open(input, config.num_samples)
        .with_context(|| format!("opening {}", input.display()))?;
    let sample_rate = source.sample_rate();
    let duration_sec = source.duration_sec();
    let time_source = StubTimeSource::for_frames(config.num_samples, sample_rate);

    let mut detection =
        BeatDetection::new(config.clone(), Some(Box::new(source)), Box::new(time_source));
    if let Some(err) = detection.startup_error() {
        bail!("detector failed to start: {err}");
    }

    let events = Rc::new(RefCell::new(Vec::<BeatEvent>::new()));
    let sink = Rc::clone(&events);
    detection.subscribe(move |event: &BeatEvent| {
        if summary {
            sink.borrow_mut().push(event.clone());
        } else {
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(err) => eprintln!("Error: failed to encode event: {err}"),
            }
        }
    });

    let mut ticks = 0usize;
    loop {
        match detection.update() {
            TickOutcome::Processed { .. } => ticks += 1,
            TickOutcome::SourceInactive => break,
            TickOutcome::Disabled => bail!("detector disabled during run"),
            TickOutcome::Rejected => bail!("frame source produced an unusable frame"),
        }
    }

    tracing::info!(
        "[beat_cli] Processed {} ticks ({:.2}s) from {}",
        ticks,
        duration_sec,
        input.display()
    );

    if summary {
        let events = events.borrow();
        let mut counts = BTreeMap::new();
        for event in events.iter() {
            *counts.entry(event.event_type.to_string()).or_insert(0usize) += 1;
        }

        let report = DetectReport {
            input: input.display().to_string(),
            sample_rate,
            num_samples: config.num_samples,
            mode: config.mode,
            duration_sec,
            ticks,
            event_count: events.len(),
            counts,
            stats: detection.stats(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(ExitCode::from(0))
}

fn run_bands(
    sample_rate: u32,
    num_samples: usize,
    min_frequency: f32,
    divisions: usize,
) -> Result<ExitCode> {
    let mut config = DetectorConfig {
        num_samples,
        min_frequency_hz: min_frequency,
        ..DetectorConfig::default()
    };
    config.frequency.octave_divisions = divisions;
    config
        .validate(sample_rate)
        .context("invalid band layout parameters")?;

    let mapper = FrequencyBandMapper::new(
        sample_rate,
        num_samples,
        min_frequency,
        &config.frequency,
    );
    let report = BandsReport {
        sample_rate,
        num_samples,
        octaves: mapper.octaves(),
        octave_divisions: mapper.octave_divisions(),
        total_bands: mapper.total_bands(),
        bands: mapper.bands(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

#[derive(Serialize)]
struct DetectReport {
    input: String,
    sample_rate: u32,
    num_samples: usize,
    mode: DetectionMode,
    duration_sec: f64,
    ticks: usize,
    event_count: usize,
    counts: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<beat_detection::analysis::DetectorStats>,
}

#[derive(Serialize)]
struct BandsReport<'a> {
    sample_rate: u32,
    num_samples: usize,
    octaves: usize,
    octave_divisions: usize,
    total_bands: usize,
    bands: &'a [FrequencyBand],
}
