//! Integration tests for file decoding and the headless fallback
//!
//! Audio fixtures are generated with hound into a temporary directory.

mod helpers;

use helpers::write_sine_wav;
use lectern_listener::engine::decoder::{
    decode_file, decode_file_at_rate, probe_duration, DecoderStream, OUTPUT_CHANNELS,
};
use lectern_listener::engine::{AudioEngine, EngineEvent, HeadlessEngine};
use tempfile::TempDir;

#[test]
fn test_probe_duration_of_wav() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lecture.wav");
    write_sine_wav(&path, 2.5, 22_050);

    let duration = probe_duration(&path).unwrap();
    assert!((duration - 2.5).abs() < 0.01, "duration {}", duration);
}

#[test]
fn test_decode_mono_wav_to_stereo() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lecture.wav");
    write_sine_wav(&path, 1.5, 22_050);

    let audio = decode_file(&path).unwrap();
    assert_eq!(audio.sample_rate, 22_050);
    assert_eq!(audio.samples.len(), audio.frames() * OUTPUT_CHANNELS as usize);
    assert_eq!(audio.frames(), 33_075);
    assert!((audio.duration_secs() - 1.5).abs() < 0.01);

    // Mono is duplicated into both channels
    let frame = &audio.samples[200..202];
    assert_eq!(frame[0], frame[1]);
    assert!(audio.samples.iter().any(|s| s.abs() > 0.1));
}

#[test]
fn test_decode_to_device_rate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lecture.wav");
    write_sine_wav(&path, 1.5, 22_050);

    let audio = decode_file_at_rate(&path, 44_100).unwrap();
    assert_eq!(audio.sample_rate, 44_100);
    assert_eq!(audio.samples.len() % OUTPUT_CHANNELS as usize, 0);
    assert!(
        (audio.duration_secs() - 1.5).abs() < 0.05,
        "duration {}",
        audio.duration_secs()
    );
}

#[test]
fn test_decoder_stream_yields_packets() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lecture.wav");
    write_sine_wav(&path, 2.0, 8_000);

    let mut stream = DecoderStream::open(&path).unwrap();
    assert_eq!(stream.sample_rate(), 8_000);
    assert_eq!(stream.n_frames(), Some(16_000));

    let mut packet = Vec::new();
    let mut packets = 0;
    let mut frames = 0;
    while stream.next_packet(&mut packet).unwrap() {
        packets += 1;
        frames += packet.len() / OUTPUT_CHANNELS as usize;
        packet.clear();
    }
    assert!(packets > 1, "whole file came back as one packet");
    assert_eq!(frames, 16_000);
    assert!(!stream.next_packet(&mut packet).unwrap());
}

#[test]
fn test_decode_rejects_non_audio() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.mp3");
    std::fs::write(&path, b"these are lecture notes, not audio").unwrap();

    assert!(decode_file(&path).is_err());
    assert!(decode_file_at_rate(&path, 44_100).is_err());
    assert!(probe_duration(&path).is_err());
}

#[test]
fn test_probed_duration_drives_headless_engine() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lecture.wav");
    write_sine_wav(&path, 3.0, 8_000);

    let duration = probe_duration(&path).unwrap();
    let mut engine = HeadlessEngine::new(duration).with_autoload();
    engine.load(path.to_str().unwrap());

    match engine.poll_events().as_slice() {
        [EngineEvent::Loaded { duration: loaded }] => assert!((loaded - 3.0).abs() < 0.01),
        other => panic!("unexpected events {:?}", other),
    }
}
