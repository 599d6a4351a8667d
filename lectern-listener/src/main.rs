//! Lecture listener (lectern-listener) - Main entry point
//!
//! Plays a lecture recording in step with a room's playback-coordination
//! service. Console commands: `p` (play/pause), `seek <time>`, `status`, `q`.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lectern_common::transcript::{Transcript, TranscriptCursor};
use lectern_listener::config::ListenerConfig;
use lectern_listener::connector::{self, SessionClient, SessionConnector};
use lectern_listener::engine::{decoder, AudioEngine, DeviceEngine, HeadlessEngine};
use lectern_listener::runtime::{self, Command};
use lectern_listener::{ListenerController, ListenerOptions};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for lectern-listener
#[derive(Parser, Debug)]
#[command(name = "lectern-listener")]
#[command(about = "Listen to a lecture recording in sync with the room")]
#[command(version)]
struct Args {
    /// Lecture audio file (path or file:// URI)
    source: String,

    /// Coordination service base URL (overrides the config file)
    #[arg(short, long, env = "LECTERN_SERVICE_URL")]
    service_url: Option<String>,

    /// Configuration file (default: platform config directory)
    #[arg(short, long, env = "LECTERN_CONFIG")]
    config: Option<PathBuf>,

    /// Track position without an audio device
    #[arg(long)]
    headless: bool,

    /// Word-timed transcript to follow along with
    #[arg(short, long)]
    transcript: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        ListenerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = args.service_url.clone() {
        config.service_url = url;
        config.validate().context("Invalid --service-url")?;
    }

    let level = config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("lectern_listener={level},lectern_common={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting lecture listener for {}", args.source);
    info!("Coordination service: {}", config.service_url);

    let on_change = position_observer(args.transcript.as_deref())?;
    let options = ListenerOptions::new(args.source.clone())
        .on_change(on_change)
        .drift_tolerance(config.drift_tolerance_secs);

    if args.headless {
        let engine = headless_engine(&args.source);
        listen(engine, options, config).await
    } else {
        let engine = DeviceEngine::new(config.audio_device.clone());
        listen(engine, options, config).await
    }
}

async fn listen<E: AudioEngine>(
    engine: E,
    options: ListenerOptions,
    config: ListenerConfig,
) -> Result<()> {
    let client = Arc::new(SessionClient::new(&config).context("Failed to create HTTP client")?);

    let (connector, outbound) = SessionConnector::channel();
    let dispatcher = tokio::spawn(connector::dispatch(Arc::clone(&client), outbound));

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || read_commands(command_tx));

    let mut controller = ListenerController::new(options, engine, connector);
    runtime::run(&mut controller, client, &config, command_rx, shutdown_signal())
        .await
        .context("Listener runtime failed")?;

    // Dropping the controller drops the last connector and ends dispatch
    drop(controller);
    if let Err(e) = dispatcher.await {
        warn!("Notification dispatcher ended abnormally: {}", e);
    }

    info!("Listener shutdown complete");
    Ok(())
}

/// Headless engine sized from the file's metadata; an unreadable file
/// yields an engine whose load fails.
fn headless_engine(source: &str) -> HeadlessEngine {
    let path = Path::new(source.strip_prefix("file://").unwrap_or(source));
    match decoder::probe_duration(path) {
        Ok(duration) => HeadlessEngine::new(duration).with_autoload(),
        Err(e) => HeadlessEngine::failing(e.to_string()).with_autoload(),
    }
}

/// Log position changes, and transcript words when a transcript is given.
fn position_observer(transcript: Option<&Path>) -> Result<impl FnMut(f64)> {
    let mut cursor = match transcript {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read transcript {}", path.display()))?;
            let transcript = Transcript::from_json(&json)
                .with_context(|| format!("Invalid transcript {}", path.display()))?;
            info!("Loaded transcript with {} words", transcript.len());
            Some(TranscriptCursor::new(transcript))
        }
        None => None,
    };

    let mut last = None;
    Ok(move |position: f64| {
        if last != Some(position) {
            debug!("Position {:.0}s", position);
            last = Some(position);
        }
        if let Some(word) = cursor.as_mut().and_then(|c| c.advance(position)) {
            info!(at = word.start, "{}", word.word);
        }
    })
}

/// Forward console lines as commands.
///
/// Runs on a plain thread: a blocking stdin read must not hold up runtime
/// shutdown.
fn read_commands(tx: mpsc::UnboundedSender<Command>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read console input: {}", e);
                break;
            }
        };
        match Command::parse(&line) {
            Some(command) => {
                if tx.send(command).is_err() {
                    break;
                }
            }
            None if line.trim().is_empty() => {}
            None => warn!("Unknown command: {}", line.trim()),
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
