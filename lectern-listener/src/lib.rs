//! # Lectern Listener Library (lectern-listener)
//!
//! Plays a lecture recording locally while keeping it in step with the room
//! state held by a playback-coordination service.
//!
//! **Architecture:** a single-threaded [`controller::ListenerController`]
//! owns the audio engine (symphonia + rubato + cpal), a per-frame playback
//! clock, the seek gesture and the mirrored session. Local actions are
//! reported through a fire-and-forget [`connector::SessionConnector`]; remote
//! state is pulled on an interval and applied by [`reconcile`].

pub mod clock;
pub mod config;
pub mod connector;
pub mod controller;
pub mod engine;
pub mod error;
pub mod reconcile;
pub mod runtime;
pub mod seek;

pub use controller::{ListenerController, ListenerOptions, ListenerView};
pub use error::{Error, Result};
