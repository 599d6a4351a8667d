//! Test helper modules for lectern-listener integration tests
//!
//! - FakeService: in-process coordination service recording every request
//! - Fixtures: controllers on the headless engine and generated audio files

#![allow(dead_code, unused_imports)]

pub mod fake_service;
pub mod fixtures;

pub use fake_service::{FakeService, RecordedRequest};
pub use fixtures::{drain_notifications, loaded_controller, mounted_controller, write_sine_wav};
