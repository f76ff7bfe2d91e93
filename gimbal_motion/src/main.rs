//! # Gimbal Motion
//!
//! Brings up the rig hardware, spawns the two stepper workers and feeds
//! them target positions in one of three modes:
//!
//! - **park** (default): calibrate at `(0,0)` and hold until SIGINT/SIGTERM
//! - **circle** (`--circle`): calibrate, trace one circle, shut down
//! - **feed** (`--feed`): read `x y` lines from stdin; the first line is the
//!   calibration, every later line an absolute target

use clap::Parser;
use gimbal_common::config::{LogLevel, RigConfig, load_rig_config};
use gimbal_common::consts::DEFAULT_CONFIG_PATH;
use gimbal_common::hal::types::Px;
use gimbal_hal::HalCore;
use gimbal_motion::sync::{WaitOutcome, sleep_interruptible};
use gimbal_motion::{MotionContext, MotionError, PositionCommander, Rig, install_termination_handler};
use std::io::BufRead;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Upper bound for the shutdown flush.
const SHUTDOWN_BUDGET: Duration = Duration::from_secs(5);

/// Park/feed loop polling interval.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Gimbal Motion: two-axis stepper control
#[derive(Parser, Debug)]
#[command(name = "gimbal_motion")]
#[command(version)]
#[command(about = "Point a two-axis stepper gimbal at target pixel positions")]
struct Args {
    /// Path to the rig configuration TOML.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Use the simulation driver (no hardware access).
    #[arg(long, conflicts_with = "driver")]
    simulate: bool,

    /// Override `hardware.driver` from the configuration.
    #[arg(long, value_name = "NAME")]
    driver: Option<String>,

    /// Trace one circle and exit.
    #[arg(long, conflicts_with = "feed")]
    circle: bool,

    /// Circle radius [px] (default: `circle.radius_px`).
    #[arg(long, value_name = "R")]
    radius: Option<Px>,

    /// Points on the circle (default: `circle.points`).
    #[arg(long, value_name = "N")]
    points: Option<u8>,

    /// Pause after each circle point [µs] (default: `circle.delay_us`).
    #[arg(long, value_name = "D")]
    delay_us: Option<u64>,

    /// Read `x y` targets from stdin.
    #[arg(long)]
    feed: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let config = load_config(&args);
    setup_tracing(&args, config.as_ref().map(|c| c.shared.log_level).ok());

    info!("Gimbal Motion v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.and_then(|config| run(&args, config)) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Gimbal Motion shutdown complete");
}

fn load_config(args: &Args) -> Result<RigConfig, Box<dyn std::error::Error>> {
    let mut config = load_rig_config(&args.config)
        .map_err(|e| format!("{}: {e}", args.config.display()))?;
    if args.simulate {
        config.hardware.driver = "simulation".to_string();
    } else if let Some(driver) = &args.driver {
        config.hardware.driver = driver.clone();
    }
    Ok(config)
}

fn run(args: &Args, config: RigConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Config OK: service='{}', driver='{}', frequency={}Hz",
        config.shared.service_name, config.hardware.driver, config.motion.frequency_hz
    );

    // Hardware bring-up: any missing channel or line is fatal.
    let mut hal = HalCore::new(config.clone())?;
    hal.init()?;

    let mut rig = Rig::init(&config, hal)?;
    let ctx = Arc::clone(rig.context());
    install_termination_handler(&ctx)?;
    let feed = if args.feed {
        Some(spawn_stdin_reader()?)
    } else {
        None
    };
    rig.spawn()?;

    let commander = rig.commander();
    let produced = if args.circle {
        run_circle(args, &config, &commander)
    } else if let Some(targets) = &feed {
        run_feed(&ctx, &commander, targets)
    } else {
        run_park(&ctx, &commander)
    };
    match produced {
        Ok(()) => {}
        Err(e) if e.is_cancelled() => info!("Producer stopped by termination request"),
        Err(e) => {
            error!("Producer failed: {e}");
            ctx.request_termination();
        }
    }
    info!(
        "{} position pairs sent, {} cancelled",
        commander.stats().pairs(),
        commander.stats().cancelled()
    );

    // The producer is the first external participant, if any are configured.
    if config.motion.external_participants > 0 {
        ctx.mark_exited();
    }

    let max_iterations = (SHUTDOWN_BUDGET.as_micros()
        / config.motion.flush_interval().as_micros().max(1)) as usize;
    let flush = ctx.flush_with_limit(max_iterations);
    let joined = match &flush {
        Ok(_) => rig.join(),
        Err(e) => {
            error!("Workers did not exit: {e}");
            Ok(Vec::new())
        }
    };
    flush?;
    joined?;
    rig.close()?;
    Ok(())
}

fn run_circle(args: &Args, config: &RigConfig, commander: &PositionCommander) -> Result<(), MotionError> {
    let radius = args.radius.unwrap_or(config.circle.radius_px);
    let points = args.points.unwrap_or(config.circle.points);
    let delay = Duration::from_micros(args.delay_us.unwrap_or(config.circle.delay_us as u64));

    commander.set_absolute_position(0, 0)?;
    let sent = commander.trace_circle(radius, points, delay)?;
    info!("Circle complete ({sent} points)");
    Ok(())
}

fn run_park(ctx: &MotionContext, commander: &PositionCommander) -> Result<(), MotionError> {
    commander.set_absolute_position(0, 0)?;
    info!("Calibrated at (0, 0); waiting for termination");
    wait_for_termination(ctx);
    Ok(())
}

/// Forward parsed stdin lines; the sender is dropped at end of input.
fn spawn_stdin_reader() -> std::io::Result<Receiver<(Px, Px)>> {
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("stdin-feed".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match parse_target(&line) {
                    Some(target) => {
                        if tx.send(target).is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => warn!("Ignoring malformed target line '{line}'"),
                }
            }
        })?;
    Ok(rx)
}

fn run_feed(
    ctx: &MotionContext,
    commander: &PositionCommander,
    targets: &Receiver<(Px, Px)>,
) -> Result<(), MotionError> {
    info!("Reading 'x y' targets from stdin (first line calibrates)");
    loop {
        if ctx.termination_requested() {
            return Ok(());
        }
        match targets.recv_timeout(POLL_INTERVAL) {
            Ok((x, y)) => commander.set_absolute_position(x, y)?,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!("End of input");
                return Ok(());
            }
        }
    }
}

fn wait_for_termination(ctx: &MotionContext) {
    let chunk = ctx.motion().wait_chunk();
    while let WaitOutcome::Completed = sleep_interruptible(POLL_INTERVAL, chunk, ctx.termination()) {}
}

/// Parse `"x y"` (whitespace or comma separated).
fn parse_target(line: &str) -> Option<(Px, Px)> {
    let mut parts = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty());
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    parts.next().is_none().then_some((x, y))
}

fn setup_tracing(args: &Args, config_level: Option<LogLevel>) {
    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        let level = config_level.unwrap_or_default();
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive()))
    };

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
