//! Listener controller
//!
//! Owns everything a single lecture listener mutates: the audio engine, the
//! playback clock, the seek gesture and the mirrored session state. All
//! methods run on one thread; the runtime (or a test) drives them.
//!
//! Ordering guarantees:
//! - A drag's first change cancels the clock before the provisional value is
//!   published, and a commit reschedules the clock only after the engine has
//!   been seeked, so no clock frame can publish a provisional value.
//! - Teardown stops the clock before releasing the engine.

use crate::clock::{sample_position, ClockWatch, FrameClock, FrameToken};
use crate::connector::SessionConnector;
use crate::engine::{AudioEngine, EngineEvent, EngineState, DEFAULT_VOLUME};
use crate::error::Result;
use crate::reconcile::{self, Reconciliation, SessionMirror};
use crate::seek::{DragChange, SeekInteraction};
use lectern_common::time_format::DisplayMarks;
use lectern_common::PlaybackSession;
use tracing::{debug, error, info};

/// Seek-bar maximum shown before the real duration is known
pub const DURATION_PLACEHOLDER: f64 = 100.0;

/// Default lead over the session tolerated before a forced seek (seconds)
pub const DEFAULT_DRIFT_TOLERANCE: f64 = 5.0;

/// Position observer supplied by the embedding application
pub type PositionCallback = Box<dyn FnMut(f64)>;

/// Construction options: the collaborator-facing API
pub struct ListenerOptions {
    /// Audio source (file path or `file://` URI)
    pub source: String,
    /// Receives every published position, clock frames and drag changes alike
    pub on_change: Option<PositionCallback>,
    pub drift_tolerance: f64,
}

impl ListenerOptions {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            on_change: None,
            drift_tolerance: DEFAULT_DRIFT_TOLERANCE,
        }
    }

    pub fn on_change(mut self, callback: impl FnMut(f64) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn drift_tolerance(mut self, seconds: f64) -> Self {
        self.drift_tolerance = seconds;
        self
    }
}

/// Snapshot of everything a UI renders
#[derive(Debug, Clone, PartialEq)]
pub struct ListenerView {
    /// Seek-bar value in seconds
    pub value: f64,
    /// Displayed playing flag
    pub playing: bool,
    pub slider_head: f64,
    /// Seek-bar maximum
    pub max: f64,
    /// `None` until the track has loaded
    pub marks: Option<DisplayMarks>,
    pub engine_state: EngineState,
    pub dragging: bool,
}

impl ListenerView {
    /// Play button and seek bar accept input only once loaded.
    pub fn controls_enabled(&self) -> bool {
        self.engine_state == EngineState::Loaded
    }

    pub fn is_loading(&self) -> bool {
        self.engine_state == EngineState::Loading
    }
}

/// Playback synchronization controller for one lecture
pub struct ListenerController<E: AudioEngine> {
    source: String,
    engine: E,
    connector: SessionConnector,
    clock: FrameClock,
    seek: SeekInteraction,
    on_change: Option<PositionCallback>,
    mirror: SessionMirror,
    drift_tolerance: f64,
    value: f64,
    duration: Option<f64>,
    marks: Option<DisplayMarks>,
    mounted: bool,
}

impl<E: AudioEngine> ListenerController<E> {
    pub fn new(options: ListenerOptions, engine: E, connector: SessionConnector) -> Self {
        Self {
            source: options.source,
            engine,
            connector,
            clock: FrameClock::new(),
            seek: SeekInteraction::new(),
            on_change: options.on_change,
            mirror: SessionMirror::default(),
            drift_tolerance: options.drift_tolerance,
            value: 0.0,
            duration: None,
            marks: None,
            mounted: false,
        }
    }

    /// Start loading the source, start the clock and connect to the session.
    ///
    /// The connect request is fire-and-forget; playback never waits on it.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        info!("Mounting listener for {}", self.source);
        self.mounted = true;
        self.engine.load(&self.source);
        self.clock.schedule();
        self.connector.connect();
    }

    /// Stop the clock, then release the engine.
    pub fn teardown(&mut self) {
        if !self.mounted {
            return;
        }
        self.clock.cancel();
        self.engine.pause();
        self.engine.unload();
        self.mounted = false;
        info!("Listener for {} torn down", self.source);
    }

    /// The frame currently awaiting its tick, if the clock is running.
    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.clock.pending()
    }

    /// Observer of the clock that stays valid while the controller is
    /// mutably borrowed.
    pub fn clock_watch(&self) -> ClockWatch {
        self.clock.watch()
    }

    /// Handle one clock frame.
    ///
    /// Stale tokens (cancelled or superseded) are ignored. A fired frame
    /// always schedules its successor.
    pub fn on_frame(&mut self, token: FrameToken) {
        if !self.clock.fire(token) {
            return;
        }
        if !self.seek.is_dragging() {
            if let Some(position) = sample_position(&self.engine) {
                self.publish(position);
            }
        }
        self.clock.schedule();
    }

    /// Fire the pending frame, if any. Returns whether a frame ran.
    pub fn step_frame(&mut self) -> bool {
        match self.clock.pending() {
            Some(token) => {
                self.on_frame(token);
                true
            }
            None => false,
        }
    }

    /// Apply the engine's completion events.
    pub fn pump_engine_events(&mut self) -> Vec<EngineEvent> {
        let events = self.engine.poll_events();
        for event in &events {
            match event {
                EngineEvent::Loaded { duration } => {
                    info!("Lecture audio loaded ({:.1}s)", duration);
                    self.duration = Some(*duration);
                    self.set_marks(0.0);
                    self.engine.set_volume(DEFAULT_VOLUME);
                }
                EngineEvent::Ended => {
                    info!("Lecture audio finished");
                    self.mirror.playing = false;
                    // A drag in progress keeps its provisional value until commit
                    if !self.seek.is_dragging() {
                        self.value = 0.0;
                    }
                }
                EngineEvent::LoadFailed { reason } => {
                    error!("Cannot play {}: {}", self.source, reason);
                }
            }
        }
        events
    }

    /// Play/pause button.
    pub fn toggle_playback(&mut self) {
        if !self.engine.is_loaded() {
            debug!("Ignoring play/pause before load");
            return;
        }
        let time = self.engine.position().floor();
        if self.mirror.playing {
            self.engine.pause();
            self.mirror.playing = false;
            self.connector.notify_pause(time);
        } else {
            self.engine.play();
            self.mirror.playing = true;
            self.connector.notify_play();
        }
        self.set_marks(time);
    }

    /// Seek-bar movement during a drag.
    pub fn drag_change(&mut self, value: f64) {
        if !self.engine.is_loaded() {
            debug!("Ignoring seek drag before load");
            return;
        }
        if self.seek.change(value) == DragChange::Started {
            debug!("Seek drag started, pausing clock");
            self.clock.cancel();
        }
        self.publish(value);
    }

    /// Seek-bar release.
    ///
    /// Seeks to a non-zero value and starts playback if paused. Exactly one
    /// notification is sent per commit.
    pub fn drag_commit(&mut self, value: f64) {
        if !self.engine.is_loaded() {
            debug!("Ignoring seek commit before load");
            return;
        }
        let commit = self.seek.commit(value);
        if let Some(target) = commit.seek_to {
            let target = self.clamp_to_track(target);
            debug!("Seek committed at {:.1}s", target);
            self.engine.seek(target);
            if !self.mirror.playing {
                self.engine.play();
                self.mirror.playing = true;
            }
        }
        self.clock.schedule();
        self.connector.notify_seek_commit(commit.value);
    }

    /// Reconcile an authoritative session into local state.
    ///
    /// Invalid sessions are rejected whole and leave local state untouched.
    pub fn apply_session(&mut self, session: &PlaybackSession) -> Result<Reconciliation> {
        session.validate()?;
        let outcome = reconcile::reconcile(
            session,
            &mut self.engine,
            &mut self.mirror,
            self.drift_tolerance,
        );
        if !outcome.is_noop() {
            debug!(?outcome, "Session reconciled");
        }
        Ok(outcome)
    }

    pub fn view(&self) -> ListenerView {
        ListenerView {
            value: self.value,
            playing: self.mirror.playing,
            slider_head: self.mirror.slider_head,
            max: self.duration.unwrap_or(DURATION_PLACEHOLDER),
            marks: self.marks.clone(),
            engine_state: self.engine.state(),
            dragging: self.seek.is_dragging(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Update the seek-bar value, the collaborator and the marks.
    fn publish(&mut self, position: f64) {
        self.value = position;
        if let Some(on_change) = self.on_change.as_mut() {
            on_change(position);
        }
        self.set_marks(position);
    }

    fn set_marks(&mut self, position: f64) {
        if let Some(duration) = self.duration {
            self.marks = Some(DisplayMarks::new(position, duration));
        }
    }

    fn clamp_to_track(&self, seconds: f64) -> f64 {
        match self.duration {
            Some(duration) => seconds.clamp(0.0, duration),
            None => seconds.max(0.0),
        }
    }
}

impl<E: AudioEngine> Drop for ListenerController<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}
