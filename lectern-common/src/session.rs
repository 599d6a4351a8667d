//! Wire types for the playback-coordination service
//!
//! The coordination service owns the authoritative `PlaybackSession` for a
//! lecture room. Listeners mirror it locally and report their own actions
//! through small JSON notifications.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Endpoint paths exposed by the coordination service
pub mod paths {
    /// Establish the session (POST, empty object body)
    pub const CONNECT: &str = "/connect";
    /// "Now playing" trigger (GET, no body)
    pub const PLAY: &str = "/play";
    /// Paused at a position (POST, `PauseRequest`)
    pub const PAUSE: &str = "/pause";
    /// Seek committed (POST, `ShiftSliderRequest`)
    pub const SHIFT_SLIDER: &str = "/shiftSlider";
    /// Default location of the session state document (GET)
    pub const APP_STATE: &str = "/data/appState.json";
}

/// Collective playback state of a lecture room.
///
/// All three fields are required; a document missing any of them fails to
/// deserialize and the whole cycle is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSession {
    /// Whether the room is currently playing
    pub playing: bool,
    /// Authoritative playback position in seconds
    pub current_time: f64,
    /// Room-wide indicator position in seconds (e.g. the presenter's position)
    pub slider_head: f64,
}

impl PlaybackSession {
    /// Decode and validate a session document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let session: PlaybackSession = serde_json::from_slice(bytes)?;
        session.validate()?;
        Ok(session)
    }

    /// Reject sessions carrying positions that cannot be applied.
    ///
    /// Validation is all-or-nothing so that a bad document never gets
    /// partially reconciled.
    pub fn validate(&self) -> Result<()> {
        check_position("currentTime", self.current_time)?;
        check_position("sliderHead", self.slider_head)?;
        Ok(())
    }
}

fn check_position(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::InvalidSession(format!("{} is not finite", field)));
    }
    if value < 0.0 {
        return Err(Error::InvalidSession(format!(
            "{} is negative: {}",
            field, value
        )));
    }
    Ok(())
}

/// Body of `POST /pause`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseRequest {
    pub playback_time: f64,
}

/// Body of `POST /shiftSlider`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSliderRequest {
    pub playback_time: f64,
    /// Committing a seek always implies playback
    pub playback_state: bool,
}

impl ShiftSliderRequest {
    pub fn committed_at(playback_time: f64) -> Self {
        Self {
            playback_time,
            playback_state: true,
        }
    }
}
