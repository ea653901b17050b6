//! inkcast application shell.
//!
//! Drives the core sessions from a tick loop: `annotate` replays a scripted
//! gesture as the annotating participant, `receive` reconstructs incoming
//! marks and logs every dot.

pub mod script;

use std::thread;
use std::time::{Duration, Instant};

use inkcast_core::{
    Camera, ConnectionState, Dot, Outcome, ReceiverSession, ReconstructionEngine, RelayTransport,
    SenderSession, SyncConfig, TransportEvent, TransportPort, UiRegions,
};
use thiserror::Error;

pub use script::{GestureScript, ScriptStep};

/// Frame interval of the tick loop.
pub const TICK: Duration = Duration::from_millis(16);

/// How long to wait for the relay to confirm the room join.
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("script error: {0}")]
    Script(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] inkcast_core::ConfigError),
    #[error(transparent)]
    Transport(#[from] inkcast_core::TransportError),
    #[error(transparent)]
    Palette(#[from] inkcast_core::PaletteError),
    #[error("relay error: {0}")]
    Relay(String),
    #[error("timed out waiting to join room {0}")]
    JoinTimeout(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Replay a script through a sender session, one step per tick.
///
/// `pace` is called between steps; tests pass a no-op.
pub fn play_script<T: TransportPort>(
    session: &mut SenderSession<T>,
    script: &GestureScript,
    mut pace: impl FnMut(Duration),
) -> AppResult<()> {
    for step in &script.steps {
        match *step {
            ScriptStep::Pointer(event) => session.process_input(event),
            ScriptStep::Clear => session.request_clear(),
            ScriptStep::Color { index } => {
                let color = session.select_color(index)?;
                log::info!("Selected color {} {:?}", index, color);
            }
            ScriptStep::Wait { ms } => pace(Duration::from_millis(ms)),
        }
        session.tick();
        pace(TICK);
    }
    Ok(())
}

/// Connect to the relay and wait until the room is joined.
fn join_relay(url: &str, room: &str) -> AppResult<RelayTransport> {
    let mut relay = RelayTransport::new(room);
    relay.connect(url)?;

    let started = Instant::now();
    while !relay.is_available() {
        for event in relay.poll_events() {
            match event {
                TransportEvent::Error { message } => return Err(AppError::Relay(message)),
                TransportEvent::Disconnected => {
                    return Err(AppError::Relay("connection closed before join".to_string()));
                }
                other => log::debug!("Relay event: {:?}", other),
            }
        }
        if started.elapsed() > JOIN_TIMEOUT {
            return Err(AppError::JoinTimeout(room.to_string()));
        }
        thread::sleep(TICK);
    }
    log::info!("Joined room {}", room);
    Ok(relay)
}

/// Annotate: replay `script` to everyone in `room`.
pub fn run_annotate(url: &str, room: &str, script: &GestureScript, config: &SyncConfig) -> AppResult<()> {
    let relay = join_relay(url, room)?;
    let camera = script.camera();
    let ui = UiRegions::new(script.ui_regions.clone());
    let mut session = SenderSession::new(config, relay, camera, Box::new(ui));

    play_script(&mut session, script, thread::sleep)?;

    // Give the relay thread a moment to drain the outgoing queue
    thread::sleep(Duration::from_millis(250));
    let publisher = session.publisher();
    log::info!(
        "Script finished: {} messages sent, {} dropped",
        publisher.sent(),
        publisher.dropped()
    );
    session.publisher_mut().transport_mut().disconnect();
    Ok(())
}

/// Receive: reconstruct marks from `room` until `duration` elapses (or forever).
pub fn run_receive(
    url: &str,
    room: &str,
    camera: Camera,
    config: &SyncConfig,
    duration: Option<Duration>,
) -> AppResult<()> {
    let relay = join_relay(url, room)?;
    let mut session = ReceiverSession::new(config, relay, camera);
    let started = Instant::now();

    loop {
        session.tick_with(report);
        if session.transport().state() == ConnectionState::Disconnected {
            return Err(AppError::Relay("connection to relay lost".to_string()));
        }
        if duration.is_some_and(|d| started.elapsed() >= d) {
            break;
        }
        thread::sleep(TICK);
    }

    log::info!(
        "Receiver stopping with {} dots on screen",
        session.engine().scene().dot_count()
    );
    session.transport_mut().disconnect();
    Ok(())
}

/// Dots created by the message that produced `outcome`.
///
/// Only meaningful right after that message was applied.
fn fresh_dots(engine: &ReconstructionEngine, outcome: Outcome) -> &[Dot] {
    match (outcome, engine.current_anchor()) {
        (Outcome::Drawn { dots, .. }, Some(anchor)) => &anchor.dots()[anchor.len().saturating_sub(dots)..],
        _ => &[],
    }
}

fn report(engine: &ReconstructionEngine, outcome: Outcome) {
    match outcome {
        Outcome::Drawn { skipped, .. } => {
            if let Some(anchor) = engine.current_anchor() {
                for dot in fresh_dots(engine, outcome) {
                    log::info!("{} at {:?}", dot.name(), anchor.world_position(dot));
                }
            }
            if skipped > 0 {
                log::warn!("{} points skipped", skipped);
            }
        }
        Outcome::Cleared => log::info!("Marks cleared"),
        Outcome::Stale => log::info!("Ignored stroke from a cleared session"),
        Outcome::Ignored => {}
    }
}
