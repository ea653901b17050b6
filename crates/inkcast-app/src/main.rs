//! inkcast command line entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use inkcast_app::{AppResult, GestureScript, run_annotate, run_receive};
use inkcast_core::{Camera, Projection, SyncConfig};
use kurbo::Size;

#[derive(Debug, Parser)]
#[command(name = "inkcast", version, about = "Share annotation strokes between two viewers")]
struct Cli {
    /// JSON file overriding the default sync settings
    #[arg(long, global = true, env = "INKCAST_CONFIG")]
    config: Option<PathBuf>,

    /// Relay WebSocket endpoint
    #[arg(long, global = true, env = "INKCAST_URL", default_value = "ws://localhost:3030/ws")]
    url: String,

    /// Channel shared by both participants
    #[arg(long, global = true, default_value = "default")]
    room: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a gesture script as the annotating participant
    Annotate {
        /// Path to the gesture script (JSON)
        script: PathBuf,
    },
    /// Reconstruct incoming marks and log every dot
    Receive {
        #[arg(long, default_value_t = 1080.0)]
        width: f64,
        #[arg(long, default_value_t = 1920.0)]
        height: f64,
        /// Vertical field of view in degrees
        #[arg(long, default_value_t = 60.0, conflicts_with = "half_height")]
        fov: f64,
        /// Use an orthographic camera with this half height
        #[arg(long)]
        half_height: Option<f64>,
        /// Stop after this many seconds (runs until interrupted by default)
        #[arg(long)]
        seconds: Option<u64>,
    },
}

fn run(cli: Cli) -> AppResult<()> {
    let config = match &cli.config {
        Some(path) => SyncConfig::load(path)?,
        None => SyncConfig::default(),
    };
    log::debug!("Sync settings: {:?}", config);

    match cli.command {
        Command::Annotate { script } => {
            let script = GestureScript::load(&script)?;
            run_annotate(&cli.url, &cli.room, &script, &config)
        }
        Command::Receive {
            width,
            height,
            fov,
            half_height,
            seconds,
        } => {
            let projection = match half_height {
                Some(half_height) => Projection::Orthographic { half_height },
                None => Projection::Perspective { fov_y_degrees: fov },
            };
            let camera = Camera::new(Size::new(width, height), projection);
            run_receive(&cli.url, &cli.room, camera, &config, seconds.map(Duration::from_secs))
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
