//! Remote state reconciliation
//!
//! Applies an authoritative [`PlaybackSession`] to local playback. Each rule
//! is evaluated independently, in order:
//!
//! 1. The displayed "playing" flag mirrors `session.playing`. The engine is
//!    not started or stopped by this rule, so the flag can read "playing"
//!    while local audio is paused.
//! 2. If the local position leads the session by more than the tolerance,
//!    the engine is seeked to the session position. A local position behind
//!    the session is never corrected.
//! 3. The cached room slider head follows `session.sliderHead`.
//!
//! Nothing applied here is reported back to the coordination service.

use crate::clock::sample_position;
use crate::engine::AudioEngine;
use lectern_common::PlaybackSession;
use tracing::{debug, info};

/// Locally mirrored parts of the session
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionMirror {
    /// Displayed playing flag
    pub playing: bool,
    /// Room-wide indicator position
    pub slider_head: f64,
}

/// What a reconciliation pass changed
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reconciliation {
    pub playing_changed: bool,
    /// Position the engine was force-seeked to
    pub drift_corrected: Option<f64>,
    /// New slider head, if it moved
    pub slider_head_changed: Option<f64>,
}

impl Reconciliation {
    /// True when the engine itself was mutated.
    pub fn engine_mutated(&self) -> bool {
        self.drift_corrected.is_some()
    }

    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Reconcile `session` into `mirror` and `engine`.
pub fn reconcile<E: AudioEngine>(
    session: &PlaybackSession,
    engine: &mut E,
    mirror: &mut SessionMirror,
    drift_tolerance: f64,
) -> Reconciliation {
    let mut outcome = Reconciliation {
        playing_changed: mirror_playing_flag(session, mirror),
        ..Default::default()
    };

    if let Some(local) = sample_position(engine) {
        let lead = local - session.current_time;
        if lead > drift_tolerance {
            info!(
                "Local position {:.0}s leads session {:.1}s by {:.1}s, resyncing",
                local, session.current_time, lead
            );
            engine.seek(session.current_time);
            outcome.drift_corrected = Some(session.current_time);
        }
    }

    if session.slider_head != mirror.slider_head {
        debug!(
            "Slider head moved {:.1}s -> {:.1}s",
            mirror.slider_head, session.slider_head
        );
        mirror.slider_head = session.slider_head;
        outcome.slider_head_changed = Some(session.slider_head);
    }

    outcome
}

/// Rule 1: remote is authoritative for the displayed flag only.
fn mirror_playing_flag(session: &PlaybackSession, mirror: &mut SessionMirror) -> bool {
    let changed = mirror.playing != session.playing;
    mirror.playing = session.playing;
    changed
}
