//! Air hockey runner CLI
//!
//! Runs the control loop against a replayed or simulated detection stream
//! and drives the paddle gantry over serial.

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{ArgAction, Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "puck_runner")]
#[command(about = "Air hockey robot controller", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Run a control session
    Run {
        /// Runner config JSON (control, link, table)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Table calibration JSON (warp_matrix.json)
        #[arg(long, conflicts_with_all = ["width", "height"])]
        table: Option<PathBuf>,

        /// Table width in px (with --height)
        #[arg(long, requires = "height")]
        width: Option<f32>,

        /// Table height in px (with --width)
        #[arg(long, requires = "width")]
        height: Option<f32>,

        /// Recorded detections, one JSON object per line ("-" for stdin)
        #[arg(long, conflicts_with = "simulate")]
        replay: Option<PathBuf>,

        /// Use the synthetic puck instead of recorded detections
        #[arg(long)]
        simulate: bool,

        /// Serial port (overrides the config file)
        #[arg(long)]
        port: Option<String>,

        /// Print command frames instead of sending them
        #[arg(long)]
        dry_run: bool,

        /// Stop after this many frames
        #[arg(long)]
        frames: Option<u64>,

        /// Seed for --simulate
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Serial self-test with TX wired to RX
    Loopback {
        #[arg(long)]
        port: String,

        /// Number of frames to send
        #[arg(long, default_value = "5")]
        count: usize,
    },

    /// Print the wire frame for a table target
    Encode {
        #[arg(long)]
        x: f32,

        #[arg(long)]
        y: f32,

        #[arg(long)]
        width: f32,

        #[arg(long)]
        height: f32,
    },

    /// Print the effective configuration as JSON
    Config {
        /// Preset: standard, defensive, attacking (default: PUCK_PROFILE)
        #[arg(long)]
        profile: Option<String>,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            table,
            width,
            height,
            replay,
            simulate,
            port,
            dry_run,
            frames,
            seed,
        } => {
            let mut cfg = match config {
                Some(path) => puck_runner::RunnerConfig::load(&path)
                    .with_context(|| format!("Failed to load config: {}", path.display()))?,
                None => puck_runner::RunnerConfig::from_env_or_default(),
            };
            if let Some(port) = port {
                cfg.link.port = port;
            }

            let table = resolve_table(table.as_deref(), width.zip(height), cfg.table)?;
            let source = match (replay, simulate) {
                (_, true) => Source::Simulated(seed),
                (Some(path), false) => Source::Replay(path),
                (None, false) => anyhow::bail!("No detection source: pass --replay FILE or --simulate"),
            };

            run(cfg, table, source, dry_run, frames)?;
        }

        Commands::Loopback { port, count } => {
            let link = puck_runner::LinkConfig {
                port,
                timeout_ms: 1000,
                ..puck_runner::LinkConfig::default()
            };
            loopback(link, count)?;
        }

        Commands::Encode { x, y, width, height } => {
            let table = puck_core::Table::new(width, height).context("Invalid table size")?;
            let scale = puck_core::ControlConfig::from_env_or_default().controller;
            let cmd = puck_core::CommandEncoder::new(scale).encode(puck_core::Vec2::new(x, y), &table);
            println!("{}", cmd);
            println!("   x={} y={} ({} bytes with CRLF)", cmd.x, cmd.y, cmd.to_bytes().len());
        }

        Commands::Config { profile } => {
            let control = match profile {
                Some(name) => puck_core::ControlConfig::profile(&name),
                None => puck_core::ControlConfig::from_env_or_default(),
            };
            let cfg = puck_runner::RunnerConfig {
                control,
                ..puck_runner::RunnerConfig::default()
            };
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
enum Source {
    Replay(PathBuf),
    Simulated(u64),
}

#[cfg(feature = "cli")]
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Table from --width/--height, then --table, then the config file
#[cfg(feature = "cli")]
fn resolve_table(
    calibration: Option<&Path>,
    size: Option<(f32, f32)>,
    from_config: Option<puck_core::Table>,
) -> Result<puck_core::Table> {
    if let Some((width, height)) = size {
        return puck_core::Table::new(width, height).context("Invalid table size");
    }
    if let Some(path) = calibration {
        return puck_runner::load_table(path)
            .with_context(|| format!("Failed to load table calibration: {}", path.display()));
    }
    match from_config {
        Some(table) => Ok(table),
        None => anyhow::bail!("No table bounds: pass --table FILE, --width/--height, or set \"table\" in the config"),
    }
}

#[cfg(feature = "cli")]
fn run(
    cfg: puck_runner::RunnerConfig,
    table: puck_core::Table,
    source: Source,
    dry_run: bool,
    frames: Option<u64>,
) -> Result<()> {
    use puck_core::{CommandSink, Detector};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let mut controller =
        puck_core::Controller::new(cfg.control.clone(), table).context("Invalid control configuration")?;

    let mut detector: Box<dyn Detector> = match source {
        Source::Simulated(seed) => {
            let sim = puck_runner::SimulationConfig {
                seed,
                frame_rate: f64::from(cfg.control.prediction.frame_rate),
                ..puck_runner::SimulationConfig::default()
            };
            Box::new(puck_runner::SimulatedDetector::new(table, sim)?)
        }
        Source::Replay(path) if path.as_os_str() == "-" => Box::new(puck_runner::JsonLinesDetector::stdin()),
        Source::Replay(path) => Box::new(
            puck_runner::JsonLinesDetector::from_path(&path)
                .with_context(|| format!("Failed to open replay: {}", path.display()))?,
        ),
    };

    let mut sink: Box<dyn CommandSink> = if dry_run {
        Box::new(puck_runner::WriterSink::new(std::io::stdout()))
    } else {
        Box::new(puck_runner::SerialLink::open_lazy(cfg.link.clone()))
    };

    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .context("Failed to install Ctrl-C handler")?;

    let stats = puck_core::run_session(detector.as_mut(), sink.as_mut(), &mut controller, &stop, frames)
        .context("Detection source failed")?;

    println!("\nSession finished");
    println!("   Frames:             {}", stats.frames);
    println!("   Frames with puck:   {}", stats.frames_with_puck);
    println!("   Commands sent:      {}", stats.commands_sent);
    println!("   Transport failures: {}", stats.transport_failures);
    for mode in [
        puck_core::Mode::Predict,
        puck_core::Mode::Hit,
        puck_core::Mode::AggressivePosition,
        puck_core::Mode::AggressiveStrike,
        puck_core::Mode::AggressiveFollow,
    ] {
        println!("   {:<18}  {}", mode.name(), stats.frames_in(mode));
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn loopback(link: puck_runner::LinkConfig, count: usize) -> Result<()> {
    println!("Testing serial loopback on {} at {} baud", link.port, link.baud_rate);
    println!("TX and RX must be wired together");

    let port = link.port.clone();
    let mut serial =
        puck_runner::SerialLink::open(link).with_context(|| format!("Failed to open {}", port))?;
    let scale = puck_core::ControlConfig::from_env_or_default().controller;
    let results = serial.loopback(count, &scale)?;

    let mut failures = 0;
    for r in &results {
        match (&r.received, &r.error) {
            _ if r.passed() => println!("   {} -> echoed [OK]", r.sent),
            (Some(got), _) => {
                failures += 1;
                println!("   {} -> {} [MISMATCH]", r.sent, got);
            }
            (None, err) => {
                failures += 1;
                println!("   {} -> {} [FAIL]", r.sent, err.as_deref().unwrap_or("no echo"));
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("Loopback failed on {} of {} frames", failures, results.len());
    }
    println!("Loopback passed ({} frames)", results.len());
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("puck_runner CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
