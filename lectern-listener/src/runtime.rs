//! Single-threaded driver loop
//!
//! Drives a [`ListenerController`] from three sources on one task: the frame
//! interval (clock ticks and engine events), the state-poll interval
//! (session fetches) and user commands. Session fetches run on a spawned task
//! and report back through a channel; a new fetch is never started while one
//! is still in flight.

use crate::config::ListenerConfig;
use crate::connector::SessionClient;
use crate::controller::ListenerController;
use crate::engine::AudioEngine;
use crate::error::Result;
use lectern_common::PlaybackSession;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// User input understood by the runtime
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Play/pause button
    Toggle,
    /// Drag the seek bar to a position and release it there
    Seek(f64),
    /// Log the current view
    Status,
    Quit,
}

impl Command {
    /// Parse a console line such as `p`, `seek 1:10`, `status` or `q`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let word = parts.next()?;
        let command = match word {
            "p" | "play" | "pause" | "toggle" => Command::Toggle,
            "s" | "seek" => Command::Seek(parse_position(parts.next()?)?),
            "status" | "st" => Command::Status,
            "q" | "quit" | "exit" => Command::Quit,
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(command)
    }
}

/// Parse `SS`, `M:SS` or `H:MM:SS` (fractional seconds allowed) to seconds.
pub fn parse_position(text: &str) -> Option<f64> {
    let mut total = 0.0;
    let fields: Vec<&str> = text.split(':').collect();
    if fields.len() > 3 {
        return None;
    }
    for field in &fields {
        let value: f64 = field.parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        total = total * 60.0 + value;
    }
    Some(total)
}

/// Run the listener until `shutdown` resolves or a `Quit` command arrives.
///
/// The controller is torn down before returning.
pub async fn run<E, S>(
    controller: &mut ListenerController<E>,
    client: Arc<SessionClient>,
    config: &ListenerConfig,
    mut commands: mpsc::UnboundedReceiver<Command>,
    shutdown: S,
) -> Result<()>
where
    E: AudioEngine,
    S: Future<Output = ()>,
{
    let mut frames = time::interval(config.frame_interval());
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut polls = time::interval(config.poll_interval());
    polls.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let (state_tx, mut state_rx) = mpsc::channel::<Result<PlaybackSession>>(1);
    let mut fetch_in_flight = false;
    let mut last_frame = Instant::now();

    controller.mount();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            _ = frames.tick() => {
                let now = Instant::now();
                controller.engine_mut().advance(now - last_frame);
                last_frame = now;
                controller.pump_engine_events();
                controller.step_frame();
            }
            _ = polls.tick() => {
                if fetch_in_flight {
                    debug!("Previous state fetch still running, skipping cycle");
                    continue;
                }
                fetch_in_flight = true;
                let client = Arc::clone(&client);
                let tx = state_tx.clone();
                tokio::spawn(async move {
                    let result = client.fetch_session().await;
                    let _ = tx.send(result).await;
                });
            }
            Some(result) = state_rx.recv() => {
                fetch_in_flight = false;
                match result {
                    Ok(session) => {
                        if let Err(e) = controller.apply_session(&session) {
                            warn!("Skipping reconciliation: {}", e);
                        }
                    }
                    Err(e) => warn!("Session state fetch failed, will retry next interval: {}", e),
                }
            }
            Some(command) = commands.recv() => {
                if command == Command::Quit {
                    info!("Quit requested");
                    break;
                }
                apply_command(controller, command);
            }
        }
    }

    controller.teardown();
    Ok(())
}

fn apply_command<E: AudioEngine>(controller: &mut ListenerController<E>, command: Command) {
    match command {
        Command::Toggle => controller.toggle_playback(),
        Command::Seek(position) => {
            controller.drag_change(position);
            controller.drag_commit(position);
        }
        Command::Status => {
            let view = controller.view();
            let (position, duration) = view
                .marks
                .as_ref()
                .map(|m| (m.start.label.clone(), m.end.label.clone()))
                .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
            info!(
                state = ?view.engine_state,
                playing = view.playing,
                slider_head = view.slider_head,
                "{} / {}",
                position,
                duration
            );
        }
        Command::Quit => {}
    }
}
