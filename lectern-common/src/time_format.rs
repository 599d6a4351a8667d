//! Seek-bar time labels
//!
//! Formats playback positions as `H:MM:SS` or `M:SS`. The hour field only
//! appears from one hour upward; minutes are zero-padded only when an hour
//! field precedes them. Seconds are always two digits.

use serde::Serialize;

const SECS_PER_HOUR: u64 = 3600;
const SECS_PER_MINUTE: u64 = 60;

/// Format a playback position in seconds as a seek-bar label.
///
/// Fractional seconds are truncated. Negative or non-finite input is treated
/// as zero.
///
/// # Examples
///
/// ```
/// use lectern_common::time_format::format_time;
///
/// assert_eq!(format_time(0.0), "0:00");
/// assert_eq!(format_time(65.0), "1:05");
/// assert_eq!(format_time(3661.0), "1:01:01");
/// ```
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    let hours = total / SECS_PER_HOUR;
    let minutes = (total % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let secs = total % SECS_PER_MINUTE;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        // Bare minutes, so zero renders as "0:SS" rather than "00:SS"
        format!("{}:{:02}", minutes, secs)
    }
}

/// A labelled point on the seek bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mark {
    /// Position on the seek bar in seconds
    pub value: f64,
    pub label: String,
}

/// Two-point seek-bar labelling: the current position shown at the start of
/// the bar and the track duration shown at the end.
///
/// Derived on every position change and never stored anywhere else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayMarks {
    pub start: Mark,
    pub end: Mark,
}

impl DisplayMarks {
    /// Build marks for `position` on a track of `duration` seconds.
    pub fn new(position: f64, duration: f64) -> Self {
        Self {
            start: Mark {
                value: 0.0,
                label: format_time(position),
            },
            end: Mark {
                value: duration,
                label: format_time(duration),
            },
        }
    }

    /// Labels as `(position_label, duration_label)`.
    pub fn labels(&self) -> (&str, &str) {
        (&self.start.label, &self.end.label)
    }
}
