//! Engine without an audio device
//!
//! Tracks position from elapsed time instead of a sound card. Used when the
//! listener runs with `--headless` and as a deterministic engine in tests.

use super::{AudioEngine, EngineEvent, EngineState};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// Counts of engine mutations, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineCounters {
    pub seeks: usize,
    pub plays: usize,
    pub pauses: usize,
}

/// Time-driven engine.
pub struct HeadlessEngine {
    /// What loading yields: the track duration or a failure reason
    track: Result<f64, String>,
    autoload: bool,
    state: EngineState,
    position: f64,
    playing: bool,
    volume: f32,
    events: VecDeque<EngineEvent>,
    counters: EngineCounters,
}

impl HeadlessEngine {
    /// Engine whose loads produce a track of `duration` seconds.
    ///
    /// Loading stays in progress until [`complete_load`](Self::complete_load)
    /// is called, unless [`with_autoload`](Self::with_autoload) is set.
    pub fn new(duration: f64) -> Self {
        Self::with_track(Ok(duration))
    }

    /// Engine whose loads always fail with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::with_track(Err(reason.into()))
    }

    fn with_track(track: Result<f64, String>) -> Self {
        Self {
            track,
            autoload: false,
            state: EngineState::Unloaded,
            position: 0.0,
            playing: false,
            volume: 1.0,
            events: VecDeque::new(),
            counters: EngineCounters::default(),
        }
    }

    /// Finish loading on the next [`poll_events`](AudioEngine::poll_events).
    pub fn with_autoload(mut self) -> Self {
        self.autoload = true;
        self
    }

    /// Resolve an in-progress load.
    pub fn complete_load(&mut self) {
        if self.state != EngineState::Loading {
            return;
        }
        match &self.track {
            Ok(duration) => {
                debug!("Headless track loaded ({:.1}s)", duration);
                self.state = EngineState::Loaded;
                self.events.push_back(EngineEvent::Loaded {
                    duration: *duration,
                });
            }
            Err(reason) => {
                debug!("Headless load failed: {}", reason);
                self.state = EngineState::Unloaded;
                self.events.push_back(EngineEvent::LoadFailed {
                    reason: reason.clone(),
                });
            }
        }
    }

    pub fn counters(&self) -> EngineCounters {
        self.counters
    }

    fn track_duration(&self) -> f64 {
        self.track.as_ref().copied().unwrap_or(0.0)
    }
}

impl AudioEngine for HeadlessEngine {
    fn load(&mut self, source: &str) {
        debug!("Headless engine loading {}", source);
        self.state = EngineState::Loading;
        self.position = 0.0;
        self.playing = false;
    }

    fn state(&self) -> EngineState {
        self.state
    }

    fn position(&self) -> f64 {
        if self.is_loaded() {
            self.position
        } else {
            0.0
        }
    }

    fn duration(&self) -> Option<f64> {
        self.is_loaded().then(|| self.track_duration())
    }

    fn seek(&mut self, seconds: f64) {
        if !self.is_loaded() {
            return;
        }
        self.position = seconds.clamp(0.0, self.track_duration());
        self.counters.seeks += 1;
    }

    fn play(&mut self) {
        if !self.is_loaded() {
            return;
        }
        self.playing = true;
        self.counters.plays += 1;
    }

    fn pause(&mut self) {
        if !self.is_loaded() {
            return;
        }
        self.playing = false;
        self.counters.pauses += 1;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        if self.autoload {
            self.complete_load();
        }
        self.events.drain(..).collect()
    }

    fn advance(&mut self, elapsed: Duration) {
        if !self.is_loaded() || !self.playing {
            return;
        }
        self.position += elapsed.as_secs_f64();
        if self.position >= self.track_duration() {
            self.position = 0.0;
            self.playing = false;
            self.events.push_back(EngineEvent::Ended);
        }
    }

    fn unload(&mut self) {
        self.state = EngineState::Unloaded;
        self.playing = false;
        self.position = 0.0;
        self.events.clear();
    }
}
