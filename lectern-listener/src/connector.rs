//! Session connector
//!
//! Outbound traffic to the playback-coordination service. Playback code only
//! ever touches [`SessionConnector`], which enqueues a [`Notification`] and
//! returns immediately. A dispatch task drains the queue and sends each
//! notification concurrently; failures are logged and dropped. There is no
//! retry and no ordering guarantee between overlapping notifications, since
//! the next reconciliation pass corrects any resulting inconsistency.

use crate::config::ListenerConfig;
use crate::error::{Error, Result};
use lectern_common::session::{paths, PauseRequest, ShiftSliderRequest};
use lectern_common::PlaybackSession;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A one-shot message for the coordination service
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    /// Establish the session
    Connect,
    /// Local playback started
    Play,
    /// Local playback paused at a position (seconds)
    Pause { at: f64 },
    /// Seek gesture committed at a position (seconds); implies playing
    SeekCommit { at: f64 },
}

/// Non-blocking handle for sending notifications
#[derive(Debug, Clone)]
pub struct SessionConnector {
    tx: mpsc::UnboundedSender<Notification>,
}

impl SessionConnector {
    /// Create a connector and the queue it feeds.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn connect(&self) {
        self.submit(Notification::Connect);
    }

    pub fn notify_play(&self) {
        self.submit(Notification::Play);
    }

    pub fn notify_pause(&self, at: f64) {
        self.submit(Notification::Pause { at });
    }

    pub fn notify_seek_commit(&self, at: f64) {
        self.submit(Notification::SeekCommit { at });
    }

    fn submit(&self, notification: Notification) {
        debug!(?notification, "Queueing notification");
        if self.tx.send(notification).is_err() {
            warn!(?notification, "Notification queue closed, dropping");
        }
    }
}

/// HTTP client for the coordination service
#[derive(Debug, Clone)]
pub struct SessionClient {
    http: reqwest::Client,
    base_url: String,
    state_path: String,
}

impl SessionClient {
    pub fn new(config: &ListenerConfig) -> Result<Self> {
        Self::with_timeout(&config.service_url, &config.state_path, config.request_timeout())
    }

    pub fn with_timeout(base_url: &str, state_path: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("lectern-listener/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            state_path: state_path.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one notification, returning the response body.
    pub async fn send(&self, notification: Notification) -> Result<String> {
        let (path, request) = match notification {
            Notification::Connect => (
                paths::CONNECT,
                self.http
                    .post(self.url(paths::CONNECT))
                    .json(&serde_json::json!({})),
            ),
            Notification::Play => (paths::PLAY, self.http.get(self.url(paths::PLAY))),
            Notification::Pause { at } => (
                paths::PAUSE,
                self.http
                    .post(self.url(paths::PAUSE))
                    .json(&PauseRequest { playback_time: at }),
            ),
            Notification::SeekCommit { at } => (
                paths::SHIFT_SLIDER,
                self.http
                    .post(self.url(paths::SHIFT_SLIDER))
                    .json(&ShiftSliderRequest::committed_at(at)),
            ),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    /// Fetch and validate the current session state.
    pub async fn fetch_session(&self) -> Result<PlaybackSession> {
        let response = self.http.get(self.url(&self.state_path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                path: self.state_path.clone(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await?;
        Ok(PlaybackSession::from_slice(&body)?)
    }
}

/// Drain the notification queue until every connector is dropped.
///
/// Each notification is sent on its own task so a slow request never holds
/// up later ones.
pub async fn dispatch(client: Arc<SessionClient>, mut rx: mpsc::UnboundedReceiver<Notification>) {
    while let Some(notification) = rx.recv().await {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            match client.send(notification).await {
                Ok(body) if notification == Notification::Connect => {
                    info!("Connected to coordination service: {}", body.trim());
                }
                Ok(_) => debug!(?notification, "Notification delivered"),
                Err(e) => warn!(?notification, "Notification failed: {}", e),
            }
        });
    }
    debug!("Notification queue closed");
}
