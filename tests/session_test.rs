//! Tests for the capture session state machine
//!
//! Drives a [`SessionController`] against an in-memory scene without any
//! camera, completing captures by hand.

use crabpano::capture::PatchTexture;
use crabpano::config::ViewConfig;
use crabpano::grid::plan_grid_with;
use crabpano::scene::MemoryScene;
use crabpano::session::{CaptureOutcome, SessionController, SessionPhase};
use crabpano::{CaptureSlot, PanoramaConfig, PanoramaError, ViewPose};

fn texture() -> PatchTexture {
    PatchTexture {
        width: 4,
        height: 4,
        rgba: vec![128; 64],
        encoded_bytes: 0,
    }
}

fn controller_with(config: PanoramaConfig) -> SessionController<MemoryScene> {
    SessionController::new(config, MemoryScene::new()).unwrap()
}

fn look_at(slot: &CaptureSlot) -> ViewPose {
    ViewPose::looking_at(
        slot.azimuth_deg as f32,
        slot.elevation_deg as f32,
        &ViewConfig::default(),
    )
}

/// Capture the first slot by hand, then every following slot by looking at it.
fn run_to_completion(c: &mut SessionController<MemoryScene>) {
    let ticket = c.request_capture().unwrap();
    c.complete_capture(ticket, Ok(texture())).unwrap();
    while let Some(next) = c.state().next_slot().copied() {
        let ticket = c.tick(&look_at(&next)).expect("aligned view should capture");
        assert_eq!(ticket.slot, next);
        c.complete_capture(ticket, Ok(texture())).unwrap();
    }
}

#[test]
fn test_full_session_reaches_complete() {
    let mut c = controller_with(PanoramaConfig::default());
    let rx = c.subscribe();
    run_to_completion(&mut c);

    assert_eq!(c.phase(), SessionPhase::Complete);
    assert_eq!(c.state().captured_count(), 48);
    assert_eq!(c.scene().len(), 48);
    assert!(c.preview_pose().is_none());

    let status = rx.borrow().clone();
    assert_eq!(status.phase, SessionPhase::Complete);
    assert_eq!(status.progress(), 1.0);
    assert!(status.instruction_text.contains("complete"));
}

#[test]
fn test_queue_invariant_holds_at_every_step() {
    let mut c = controller_with(PanoramaConfig::default());
    let total = c.state().total_slots();
    let ticket = c.request_capture().unwrap();
    c.complete_capture(ticket, Ok(texture())).unwrap();

    while let Some(next) = c.state().next_slot().copied() {
        assert_eq!(c.state().captured_count() + c.state().queue().len(), total);
        assert_eq!(c.pending_slots().count(), c.state().queue().len());
        let ticket = c.tick(&look_at(&next)).unwrap();
        c.complete_capture(ticket, Ok(texture())).unwrap();
    }
    assert_eq!(c.state().captured_count(), total);
}

#[test]
fn test_complete_session_refuses_capture() {
    let mut c = controller_with(PanoramaConfig::default());
    run_to_completion(&mut c);
    assert!(c.request_capture().is_none());
    assert!(c.tick(&look_at(&CaptureSlot::new(0.0, 0.0))).is_none());
}

#[test]
fn test_tick_only_fires_once_per_alignment() {
    let mut c = controller_with(PanoramaConfig::default());
    let ticket = c.request_capture().unwrap();
    c.complete_capture(ticket, Ok(texture())).unwrap();

    let next = *c.state().next_slot().unwrap();
    let view = look_at(&next);
    let ticket = c.tick(&view).unwrap();
    for _ in 0..10 {
        assert!(c.tick(&view).is_none());
    }
    c.complete_capture(ticket, Ok(texture())).unwrap();
    assert_eq!(c.state().captured_count(), 2);
    // Slot is filled, the queue moved on
    assert_ne!(c.state().next_slot(), Some(&next));
}

#[test]
fn test_completing_a_ticket_twice_is_stale() {
    let mut c = controller_with(PanoramaConfig::default());
    let ticket = c.request_capture().unwrap();
    c.complete_capture(ticket, Ok(texture())).unwrap();
    let again = c.complete_capture(ticket, Ok(texture())).unwrap();
    assert_eq!(again, CaptureOutcome::Stale);
    assert_eq!(c.state().captured_count(), 1);
}

#[test]
fn test_timeout_leaves_slot_queued() {
    let mut c = controller_with(PanoramaConfig::default());
    let ticket = c.request_capture().unwrap();
    let outcome = c
        .complete_capture(ticket, Err(PanoramaError::CaptureTimeout { timeout_ms: 3000 }))
        .unwrap();
    assert!(matches!(outcome, CaptureOutcome::Skipped(PanoramaError::CaptureTimeout { .. })));
    assert_eq!(c.phase(), SessionPhase::AwaitingFirstCapture);
    assert_eq!(c.state().next_slot(), Some(&ticket.slot));

    // Next success clears the retry notice
    let ticket = c.request_capture().unwrap();
    c.complete_capture(ticket, Ok(texture())).unwrap();
    assert!(c.status().instruction_text.contains("1/48"));
}

#[test]
fn test_permission_denied_surfaces_as_instruction() {
    let mut c = controller_with(PanoramaConfig::default());
    let ticket = c.request_capture().unwrap();
    c.complete_capture(ticket, Err(PanoramaError::PermissionDenied("blocked".to_string())))
        .unwrap();
    assert!(c.status().instruction_text.contains("Camera access was denied"));
}

#[test]
fn test_reset_replans_identical_queue() {
    let config = PanoramaConfig::default();
    let planned = plan_grid_with(&config.grid).unwrap().to_vec();
    let mut c = controller_with(config);

    let ticket = c.request_capture().unwrap();
    c.complete_capture(ticket, Ok(texture())).unwrap();
    c.request_reset().unwrap();

    assert_eq!(c.state().queue().to_vec(), planned);
    assert_eq!(c.phase(), SessionPhase::AwaitingFirstCapture);
    assert!(c.scene().is_empty());
    assert_eq!(c.scene().stats(), (1, 1));
    assert_eq!(c.status().generation, 1);
}

#[test]
fn test_capture_in_flight_during_reset_is_dropped() {
    let mut c = controller_with(PanoramaConfig::default());
    let ticket = c.request_capture().unwrap();
    c.request_reset().unwrap();
    assert!(!c.is_capturing());

    let outcome = c.complete_capture(ticket, Ok(texture())).unwrap();
    assert_eq!(outcome, CaptureOutcome::Stale);
    assert!(c.scene().is_empty());
    assert!(c.request_capture().is_some());
}

#[test]
fn test_status_reports_capturing() {
    let mut c = controller_with(PanoramaConfig::default());
    let rx = c.subscribe();
    let ticket = c.request_capture().unwrap();
    assert!(rx.borrow().capturing);
    c.complete_capture(ticket, Ok(texture())).unwrap();
    let status = rx.borrow().clone();
    assert!(!status.capturing);
    assert_eq!(status.captured_count, 1);
    assert_eq!(status.phase, SessionPhase::AutoCapturing);
}
