//! # Lectern Common Library
//!
//! Shared code for Lectern components including:
//! - Session wire types exchanged with the playback-coordination service
//! - Time display formatting
//! - Configuration file discovery
//! - Lecture transcript timing

pub mod config;
pub mod error;
pub mod session;
pub mod time_format;
pub mod transcript;

pub use error::{Error, Result};
pub use session::PlaybackSession;
pub use time_format::format_time;
