//! Integration tests for the listener controller
//!
//! Drives a controller over the headless engine frame by frame:
//! - Drag gestures and commits
//! - Track lifecycle (load, play, end)
//! - Session reconciliation through the controller

mod helpers;

use helpers::{drain_notifications, loaded_controller, mounted_controller};
use lectern_common::PlaybackSession;
use lectern_listener::connector::Notification;
use lectern_listener::connector::SessionConnector;
use lectern_listener::engine::{AudioEngine, EngineEvent, EngineState, HeadlessEngine};
use lectern_listener::{ListenerController, ListenerOptions};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

fn session(playing: bool, current_time: f64, slider_head: f64) -> PlaybackSession {
    PlaybackSession {
        playing,
        current_time,
        slider_head,
    }
}

#[test]
fn test_clock_frames_never_overwrite_drag_value() {
    let (mut controller, _rx) = loaded_controller(600.0);
    controller.toggle_playback();
    controller.engine_mut().advance(Duration::from_secs(30));
    controller.step_frame();
    assert_eq!(controller.view().value, 30.0);

    controller.drag_change(100.0);
    for step in 0..50 {
        controller.engine_mut().advance(Duration::from_millis(250));
        controller.pump_engine_events();
        assert!(!controller.step_frame(), "clock ran during drag");
        if step == 20 {
            controller.drag_change(120.0);
        }
    }
    controller.drag_change(150.0);
    for _ in 0..10 {
        controller.engine_mut().advance(Duration::from_secs(1));
        controller.step_frame();
    }

    let view = controller.view();
    assert!(view.dragging);
    assert_eq!(view.value, 150.0);
    assert_eq!(view.marks.unwrap().labels(), ("2:30", "10:00"));
}

#[test]
fn test_drag_positions_reach_collaborator_but_clock_does_not() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let (connector, _rx) = SessionConnector::channel();
    let mut controller = ListenerController::new(
        ListenerOptions::new("lecture.mp3").on_change(move |p| sink.borrow_mut().push(p)),
        HeadlessEngine::new(300.0).with_autoload(),
        connector,
    );
    controller.mount();
    controller.pump_engine_events();
    controller.toggle_playback();

    controller.drag_change(10.0);
    controller.engine_mut().advance(Duration::from_secs(2));
    controller.step_frame();
    controller.drag_change(20.0);
    controller.drag_commit(20.0);
    controller.engine_mut().advance(Duration::from_secs(3));
    controller.step_frame();

    assert_eq!(*seen.borrow(), vec![10.0, 20.0, 23.0]);
}

#[test]
fn test_one_notification_per_commit() {
    let (mut controller, mut rx) = loaded_controller(600.0);

    for i in 0..25 {
        controller.drag_change(10.0 + i as f64);
    }
    controller.drag_commit(34.0);

    assert_eq!(
        drain_notifications(&mut rx),
        vec![Notification::SeekCommit { at: 34.0 }]
    );
    assert_eq!(controller.engine().position(), 34.0);
    assert!(controller.engine().is_playing());
    assert!(controller.view().playing);
    assert!(!controller.view().dragging);

    // A commit with no preceding change still notifies once
    controller.drag_commit(40.0);
    assert_eq!(
        drain_notifications(&mut rx),
        vec![Notification::SeekCommit { at: 40.0 }]
    );
}

#[test]
fn test_commit_resumes_clock_after_seek() {
    let (mut controller, _rx) = loaded_controller(600.0);
    controller.drag_change(200.0);
    assert_eq!(controller.pending_frame(), None);

    controller.drag_commit(200.0);
    assert!(controller.pending_frame().is_some());
    controller.engine_mut().advance(Duration::from_millis(1500));
    controller.step_frame();
    assert_eq!(controller.view().value, 201.0);
}

#[test]
fn test_commit_past_end_is_clamped() {
    let (mut controller, mut rx) = loaded_controller(120.0);
    controller.drag_change(500.0);
    controller.drag_commit(500.0);

    assert_eq!(controller.engine().position(), 120.0);
    assert_eq!(
        drain_notifications(&mut rx),
        vec![Notification::SeekCommit { at: 500.0 }]
    );
}

#[test]
fn test_lecture_lifecycle() {
    let (mut controller, mut rx) = mounted_controller(125.0, ListenerOptions::new("lecture.mp3"));
    assert_eq!(drain_notifications(&mut rx), vec![Notification::Connect]);

    let view = controller.view();
    assert!(view.is_loading());
    assert_eq!(view.max, 100.0);
    assert_eq!(view.marks, None);

    controller.engine_mut().complete_load();
    assert_eq!(
        controller.pump_engine_events(),
        vec![EngineEvent::Loaded { duration: 125.0 }]
    );
    assert!(controller.pump_engine_events().is_empty());

    let view = controller.view();
    assert!(view.controls_enabled());
    assert_eq!(view.max, 125.0);
    assert_eq!(view.marks.unwrap().labels(), ("0:00", "2:05"));
    assert_eq!(controller.engine().volume(), 0.5);

    controller.toggle_playback();
    assert_eq!(drain_notifications(&mut rx), vec![Notification::Play]);
    for _ in 0..70 {
        controller.engine_mut().advance(Duration::from_secs(1));
        controller.step_frame();
    }
    let view = controller.view();
    assert_eq!(view.value, 70.0);
    assert_eq!(view.marks.unwrap().labels(), ("1:10", "2:05"));

    controller.engine_mut().advance(Duration::from_secs(60));
    assert_eq!(controller.pump_engine_events(), vec![EngineEvent::Ended]);
    let view = controller.view();
    assert!(!view.playing);
    assert_eq!(view.value, 0.0);
    assert_eq!(controller.engine().position(), 0.0);
    assert!(!controller.engine().is_playing());

    controller.step_frame();
    assert_eq!(controller.view().marks.unwrap().labels(), ("0:00", "2:05"));
    assert!(drain_notifications(&mut rx).is_empty());
}

#[test]
fn test_failed_load_keeps_controls_disabled() {
    let (connector, mut rx) = SessionConnector::channel();
    let mut controller = ListenerController::new(
        ListenerOptions::new("missing.mp3"),
        HeadlessEngine::failing("file not found").with_autoload(),
        connector,
    );
    controller.mount();

    let events = controller.pump_engine_events();
    assert!(matches!(events.as_slice(), [EngineEvent::LoadFailed { .. }]));
    let view = controller.view();
    assert_eq!(view.engine_state, EngineState::Unloaded);
    assert!(!view.controls_enabled());
    assert_eq!(view.max, 100.0);

    controller.toggle_playback();
    controller.drag_commit(10.0);
    assert_eq!(drain_notifications(&mut rx), vec![Notification::Connect]);

    // The clock keeps running and publishes nothing
    assert!(controller.step_frame());
    assert_eq!(controller.view().value, 0.0);
}

#[test]
fn test_drift_boundary_through_controller() {
    let (mut controller, _rx) = loaded_controller(600.0);
    controller.engine_mut().seek(105.0);
    let seeks = controller.engine().counters().seeks;

    let outcome = controller.apply_session(&session(false, 100.0, 0.0)).unwrap();
    assert_eq!(outcome.drift_corrected, None);
    assert_eq!(controller.engine().counters().seeks, seeks);

    // Sub-second progress does not count towards the lead
    controller.engine_mut().seek(105.9);
    let outcome = controller.apply_session(&session(false, 100.0, 0.0)).unwrap();
    assert_eq!(outcome.drift_corrected, None);

    let outcome = controller.apply_session(&session(false, 99.5, 0.0)).unwrap();
    assert_eq!(outcome.drift_corrected, Some(99.5));
    assert_eq!(controller.engine().position(), 99.5);
}

#[test]
fn test_local_lag_is_never_corrected() {
    let (mut controller, _rx) = loaded_controller(600.0);
    controller.engine_mut().seek(10.0);
    let seeks = controller.engine().counters().seeks;

    let outcome = controller.apply_session(&session(false, 300.0, 0.0)).unwrap();
    assert_eq!(outcome.drift_corrected, None);
    assert_eq!(controller.engine().position(), 10.0);
    assert_eq!(controller.engine().counters().seeks, seeks);
}

#[test]
fn test_repeated_session_is_noop() {
    let (mut controller, _rx) = loaded_controller(600.0);
    controller.engine_mut().seek(100.0);
    let state = session(true, 40.0, 12.5);

    let first = controller.apply_session(&state).unwrap();
    assert!(first.playing_changed);
    assert_eq!(first.drift_corrected, Some(40.0));
    assert_eq!(first.slider_head_changed, Some(12.5));
    let counters = controller.engine().counters();

    let second = controller.apply_session(&state).unwrap();
    assert!(second.is_noop());
    assert_eq!(controller.engine().counters(), counters);
    assert_eq!(controller.engine().position(), 40.0);

    let view = controller.view();
    assert!(view.playing);
    assert_eq!(view.slider_head, 12.5);
}

#[test]
fn test_session_pause_leaves_engine_playing() {
    let (mut controller, mut rx) = loaded_controller(600.0);
    controller.toggle_playback();
    drain_notifications(&mut rx);

    controller.apply_session(&session(false, 0.0, 0.0)).unwrap();
    assert!(!controller.view().playing);
    assert!(controller.engine().is_playing());

    // Reconciliation never talks back to the service
    assert!(drain_notifications(&mut rx).is_empty());
}

#[test]
fn test_session_before_load_only_mirrors() {
    let (mut controller, _rx) = mounted_controller(600.0, ListenerOptions::new("lecture.mp3"));
    let outcome = controller.apply_session(&session(true, 250.0, 7.0)).unwrap();

    assert!(!outcome.engine_mutated());
    assert_eq!(controller.engine().counters().seeks, 0);
    assert_eq!(controller.engine().counters().plays, 0);
    let view = controller.view();
    assert!(view.playing);
    assert_eq!(view.slider_head, 7.0);
}

#[test]
fn test_dropping_controller_stops_clock() {
    let (mut controller, _rx) = loaded_controller(600.0);
    controller.toggle_playback();
    controller.teardown();

    assert!(!controller.is_mounted());
    assert_eq!(controller.pending_frame(), None);
    assert!(!controller.engine().is_playing());
    assert!(!controller.step_frame());
}
