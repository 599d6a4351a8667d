//! Controller and audio fixtures

use lectern_listener::connector::{Notification, SessionConnector};
use lectern_listener::engine::HeadlessEngine;
use lectern_listener::{ListenerController, ListenerOptions};
use std::path::Path;
use tokio::sync::mpsc::UnboundedReceiver;

/// Mounted controller whose engine is still loading a `duration`-second track.
pub fn mounted_controller(
    duration: f64,
    options: ListenerOptions,
) -> (ListenerController<HeadlessEngine>, UnboundedReceiver<Notification>) {
    let (connector, rx) = SessionConnector::channel();
    let mut controller = ListenerController::new(options, HeadlessEngine::new(duration), connector);
    controller.mount();
    (controller, rx)
}

/// Mounted and loaded controller; the connect notification is already drained.
pub fn loaded_controller(
    duration: f64,
) -> (ListenerController<HeadlessEngine>, UnboundedReceiver<Notification>) {
    let (mut controller, mut rx) = mounted_controller(duration, ListenerOptions::new("lecture.mp3"));
    controller.engine_mut().complete_load();
    controller.pump_engine_events();
    drain_notifications(&mut rx);
    (controller, rx)
}

pub fn drain_notifications(rx: &mut UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        out.push(notification);
    }
    out
}

/// Write a mono 16-bit sine tone of `seconds` at `sample_rate`.
pub fn write_sine_wav(path: &Path, seconds: f64, sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let frames = (seconds * sample_rate as f64) as usize;
    for i in 0..frames {
        let t = i as f64 / sample_rate as f64;
        let sample = (t * 440.0 * std::f64::consts::TAU).sin() * 0.25;
        writer.write_sample((sample * i16::MAX as f64) as i16).unwrap();
    }
    writer.finalize().unwrap();
}
