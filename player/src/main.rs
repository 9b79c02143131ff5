use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use dualplay_core::PlayerConfig;
use log::{info, warn};

mod app;
mod commands;

use app::{App, SimOptions};
use commands::{TimedCommand, status_line};

/// Play local media and hosted videos through one player session, against headless engines
#[derive(Parser, Debug)]
#[command(name = "dualplay", version, about)]
struct Args {
    /// Media files, stream URLs or hosted video links, played in order
    media: Vec<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Hosted backend API key, overrides config and environment
    #[arg(long)]
    api_key: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    x: Option<i32>,

    #[arg(long, allow_hyphen_values = true)]
    y: Option<i32>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Run a command at an elapsed time, e.g. `--at 2000:pause` or `--at 4000:"seek 1000"`
    #[arg(long = "at", value_name = "MS:COMMAND")]
    commands: Vec<TimedCommand>,

    /// Clock resolution of the event loop
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,

    /// Length of every simulated media
    #[arg(long, default_value_t = SimOptions::default().duration_ms)]
    duration_ms: u64,

    /// Time the simulated hosting service takes to initialize
    #[arg(long, default_value_t = SimOptions::default().handshake_delay_ms)]
    handshake_delay_ms: u64,

    /// Give up after this much elapsed time
    #[arg(long, default_value_t = 600_000)]
    timeout_ms: u64,
}

fn load_config(args: &Args) -> Result<PlayerConfig> {
    let mut config = match &args.config {
        Some(path) => PlayerConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => PlayerConfig::default(),
    };
    config.apply_env();

    if let Some(key) = &args.api_key {
        config.hosted.api_key = key.clone();
    }
    if let Some(x) = args.x {
        config.geometry.x = x;
    }
    if let Some(y) = args.y {
        config.geometry.y = y;
    }
    if let Some(width) = args.width {
        config.geometry.width = width;
    }
    if let Some(height) = args.height {
        config.geometry.height = height;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.media.is_empty() {
        bail!("No media given, pass at least one file or URL");
    }

    let config = load_config(&args)?;
    if config.hosted.api_key.is_empty() {
        warn!("No API key configured, hosted videos will fail to initialize");
    }

    let options = SimOptions {
        duration_ms: args.duration_ms,
        handshake_delay_ms: args.handshake_delay_ms,
    };
    let tick_ms = args.tick_ms.max(1);
    let mut app = App::new(&config, options, args.media, args.commands);

    let mut interval = tokio::time::interval(Duration::from_millis(tick_ms));
    app.start();

    while !app.should_quit {
        tokio::select! {
            _ = interval.tick() => app.tick(tick_ms),
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }

        if app.elapsed_ms() >= args.timeout_ms {
            warn!("Timed out after {} ms", app.elapsed_ms());
            break;
        }
    }

    info!("{}", status_line(app.session()));
    Ok(())
}
