//! Audio engine adapter
//!
//! Wraps a decodable-audio-file player behind [`AudioEngine`]. Load state
//! transitions are driven only by the engine itself; callers observe them
//! through [`AudioEngine::state`] and the events drained by
//! [`AudioEngine::poll_events`].
//!
//! Every control operation is a no-op until the engine reports
//! [`EngineState::Loaded`].

pub mod decoder;
pub mod device;
pub mod headless;
pub mod output;
pub mod resampler;

use std::time::Duration;

pub use device::DeviceEngine;
pub use headless::HeadlessEngine;

/// Volume applied when a track finishes loading (fraction of maximum)
pub const DEFAULT_VOLUME: f32 = 0.5;

/// Load state of the current track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Nothing loaded, or the last load failed
    Unloaded,
    /// Decode in progress
    Loading,
    /// Ready for playback control
    Loaded,
}

/// Completion events emitted by an engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Track decoded; emitted once per loaded track
    Loaded { duration: f64 },
    /// Natural end of the track; position is back at zero and playback stopped
    Ended,
    /// Source could not be decoded; the engine stays unloaded
    LoadFailed { reason: String },
}

/// Player abstraction used by the listener controller.
pub trait AudioEngine {
    /// Begin loading `source` (a file path or `file://` URI).
    fn load(&mut self, source: &str);

    fn state(&self) -> EngineState;

    /// Current position in seconds; zero when not loaded.
    fn position(&self) -> f64;

    /// Track duration in seconds, known once loaded.
    fn duration(&self) -> Option<f64>;

    /// Reposition playback. Targets are clamped to the track.
    fn seek(&mut self, seconds: f64);

    fn play(&mut self);

    fn pause(&mut self);

    fn is_playing(&self) -> bool;

    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;

    /// Drain pending completion events in the order they occurred.
    fn poll_events(&mut self) -> Vec<EngineEvent>;

    /// Let wall-clock time pass. Engines rendering audio on their own
    /// device clock ignore this.
    fn advance(&mut self, _elapsed: Duration) {}

    /// Stop playback and release the underlying resource.
    fn unload(&mut self);

    fn is_loaded(&self) -> bool {
        self.state() == EngineState::Loaded
    }
}

/// Strip a `file://` scheme from a source URI.
pub(crate) fn source_path(source: &str) -> &str {
    source.strip_prefix("file://").unwrap_or(source)
}
