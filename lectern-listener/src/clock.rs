//! Local playback clock
//!
//! A self-rescheduling per-frame sampler. Each fired frame schedules the
//! next one, so the chain only stops when [`FrameClock::cancel`] is called.
//! Frames are identified by [`FrameToken`]s; firing a token that is no longer
//! the pending one does nothing, which makes cancellation race-free and lets
//! tests single-step the clock.

use crate::engine::AudioEngine;
use std::cell::Cell;
use std::rc::Rc;

/// Handle of one scheduled frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

/// Frame scheduling chain with explicit cancellation
#[derive(Debug, Default)]
pub struct FrameClock {
    next_id: u64,
    pending: Rc<Cell<Option<FrameToken>>>,
}

/// Read-only view of a [`FrameClock`]'s pending frame
#[derive(Debug, Clone)]
pub struct ClockWatch(Rc<Cell<Option<FrameToken>>>);

impl ClockWatch {
    pub fn pending(&self) -> Option<FrameToken> {
        self.0.get()
    }

    pub fn is_running(&self) -> bool {
        self.0.get().is_some()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the next frame, superseding any pending request.
    pub fn schedule(&mut self) -> FrameToken {
        let token = FrameToken(self.next_id);
        self.next_id += 1;
        self.pending.set(Some(token));
        token
    }

    /// Stop the chain. Tokens handed out earlier become stale.
    pub fn cancel(&mut self) {
        self.pending.set(None);
    }

    pub fn pending(&self) -> Option<FrameToken> {
        self.pending.get()
    }

    pub fn is_running(&self) -> bool {
        self.pending.get().is_some()
    }

    pub fn watch(&self) -> ClockWatch {
        ClockWatch(Rc::clone(&self.pending))
    }

    /// Consume `token` if it is the pending frame.
    ///
    /// Returns `false` for stale or cancelled tokens; the caller must then
    /// skip the frame entirely.
    pub fn fire(&mut self, token: FrameToken) -> bool {
        if self.pending.get() == Some(token) {
            self.pending.set(None);
            true
        } else {
            false
        }
    }
}

/// Read the engine position for display, in whole seconds.
///
/// `None` unless the engine is loaded.
pub fn sample_position<E: AudioEngine>(engine: &E) -> Option<f64> {
    engine.is_loaded().then(|| engine.position().floor())
}
