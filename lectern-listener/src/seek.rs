//! Seek interaction state
//!
//! Tracks a seek-bar drag gesture: `idle -> dragging -> idle`. Only the
//! transitions live here; the controller applies their side effects.

/// Provisional state of an in-progress drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    /// Position under the pointer, not yet applied to the engine
    pub provisional_value: f64,
}

/// Result of a drag-change event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragChange {
    /// First change of a gesture; the clock must be cancelled
    Started,
    /// Further movement within the same gesture
    Moved,
}

/// What a commit asks the controller to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekCommit {
    /// Committed value as released by the user
    pub value: f64,
    /// Engine seek target; `None` for a zero or non-finite value
    pub seek_to: Option<f64>,
}

/// Drag gesture tracker
#[derive(Debug, Default)]
pub struct SeekInteraction {
    drag: Option<DragState>,
}

impl SeekInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag_state(&self) -> Option<DragState> {
        self.drag
    }

    /// Record pointer movement to `value`.
    pub fn change(&mut self, value: f64) -> DragChange {
        match self.drag.as_mut() {
            Some(drag) => {
                drag.provisional_value = value;
                DragChange::Moved
            }
            None => {
                self.drag = Some(DragState {
                    provisional_value: value,
                });
                DragChange::Started
            }
        }
    }

    /// End the gesture at `value`.
    ///
    /// A commit without a preceding change (a click on the bar) is still a
    /// commit.
    pub fn commit(&mut self, value: f64) -> SeekCommit {
        self.drag = None;
        let seek_to = (value.is_finite() && value != 0.0).then_some(value);
        SeekCommit { value, seek_to }
    }
}
