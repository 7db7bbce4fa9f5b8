use crate::assert_invariant;
use crate::errors::PanoramaError;
use crate::grid::CaptureQueue;
use crate::invariant_ppt::{
    CAPTURED_COUNT_MATCHES_PATCHES, CAPTURED_PLUS_QUEUED_IS_TOTAL, COMPLETE_MEANS_EMPTY_QUEUE,
};
use crate::placement::CapturedPatch;
use crate::types::{CaptureSlot, SlotKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    AwaitingFirstCapture,
    AutoCapturing,
    Complete,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::AwaitingFirstCapture => "awaiting_first_capture",
            SessionPhase::AutoCapturing => "auto_capturing",
            SessionPhase::Complete => "complete",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Queue, committed patches and phase of one capture session.
#[derive(Debug)]
pub struct SessionState {
    queue: CaptureQueue,
    patches: Vec<CapturedPatch>,
    filled: HashSet<SlotKey>,
    captured_count: usize,
    phase: SessionPhase,
}

impl SessionState {
    pub fn new(queue: CaptureQueue) -> Self {
        let phase = if queue.is_empty() {
            SessionPhase::Complete
        } else {
            SessionPhase::AwaitingFirstCapture
        };
        let state = Self {
            queue,
            patches: Vec::new(),
            filled: HashSet::new(),
            captured_count: 0,
            phase,
        };
        state.check_invariants();
        state
    }

    pub fn queue(&self) -> &CaptureQueue {
        &self.queue
    }

    pub fn patches(&self) -> &[CapturedPatch] {
        &self.patches
    }

    pub fn captured_count(&self) -> usize {
        self.captured_count
    }

    pub fn total_slots(&self) -> usize {
        self.queue.total_slots()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn next_slot(&self) -> Option<&CaptureSlot> {
        self.queue.front()
    }

    pub fn is_filled(&self, slot: &CaptureSlot) -> bool {
        self.filled.contains(&slot.key())
    }

    /// Whether `slot` may be committed now: not yet filled and at the front
    /// of the queue.
    pub fn check_capturable(&self, slot: &CaptureSlot) -> Result<(), PanoramaError> {
        if self.is_filled(slot) {
            return Err(PanoramaError::DuplicateCapture {
                azimuth_deg: slot.azimuth_deg,
                elevation_deg: slot.elevation_deg,
            });
        }
        match self.queue.front() {
            Some(front) if front.key() == slot.key() => Ok(()),
            _ => Err(PanoramaError::SlotNotNext {
                azimuth_deg: slot.azimuth_deg,
                elevation_deg: slot.elevation_deg,
            }),
        }
    }

    /// Record a committed patch and advance the queue.
    pub fn record_patch(&mut self, patch: CapturedPatch) -> Result<(), PanoramaError> {
        self.check_capturable(&patch.slot)?;

        self.queue.dequeue();
        self.filled.insert(patch.slot.key());
        self.patches.push(patch);
        self.captured_count += 1;
        self.phase = if self.queue.is_empty() {
            SessionPhase::Complete
        } else {
            SessionPhase::AutoCapturing
        };

        self.check_invariants();
        Ok(())
    }

    /// Replace the plan and drop every patch, handing them back so the
    /// caller can remove them from the scene.
    pub fn reset(&mut self, queue: CaptureQueue) -> Vec<CapturedPatch> {
        let removed = std::mem::take(&mut self.patches);
        *self = Self::new(queue);
        removed
    }

    fn check_invariants(&self) {
        assert_invariant!(
            self.captured_count == self.patches.len(),
            CAPTURED_COUNT_MATCHES_PATCHES,
            "session::state"
        );
        assert_invariant!(
            self.captured_count + self.queue.len() == self.queue.total_slots(),
            CAPTURED_PLUS_QUEUED_IS_TOTAL,
            "session::state"
        );
        assert_invariant!(
            self.phase != SessionPhase::Complete || self.queue.is_empty(),
            COMPLETE_MEANS_EMPTY_QUEUE,
            "session::state"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PatchTexture;
    use crate::invariant_ppt::{clear_invariant_log, contract_test};
    use crate::placement::{place_on_sphere, PatchGeometry, PatchId};

    fn patch_for(slot: CaptureSlot) -> CapturedPatch {
        CapturedPatch {
            id: PatchId::new(),
            slot,
            texture: PatchTexture {
                width: 1,
                height: 1,
                rgba: vec![0; 4],
                encoded_bytes: 0,
            },
            pose: place_on_sphere(&slot, 10.0, 0.1),
            geometry: PatchGeometry {
                width: 1.0,
                height: 1.0,
            },
            captured_at: chrono::Utc::now(),
        }
    }

    fn two_slot_state() -> SessionState {
        SessionState::new(CaptureQueue::new(vec![
            CaptureSlot::new(0.0, 0.0),
            CaptureSlot::new(90.0, 0.0),
        ]))
    }

    #[test]
    fn test_phases_advance() {
        let mut state = two_slot_state();
        assert_eq!(state.phase(), SessionPhase::AwaitingFirstCapture);

        state.record_patch(patch_for(CaptureSlot::new(0.0, 0.0))).unwrap();
        assert_eq!(state.phase(), SessionPhase::AutoCapturing);
        assert_eq!(state.captured_count(), 1);

        state.record_patch(patch_for(CaptureSlot::new(90.0, 0.0))).unwrap();
        assert_eq!(state.phase(), SessionPhase::Complete);
        assert!(state.next_slot().is_none());
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut state = two_slot_state();
        state.record_patch(patch_for(CaptureSlot::new(0.0, 0.0))).unwrap();
        let err = state
            .record_patch(patch_for(CaptureSlot::new(0.0, 0.0)))
            .unwrap_err();
        assert!(matches!(err, PanoramaError::DuplicateCapture { .. }));
        assert_eq!(state.captured_count(), 1);
    }

    #[test]
    fn test_out_of_order_is_rejected() {
        let mut state = two_slot_state();
        let err = state
            .record_patch(patch_for(CaptureSlot::new(90.0, 0.0)))
            .unwrap_err();
        assert!(matches!(err, PanoramaError::SlotNotNext { .. }));
        assert_eq!(state.queue().len(), 2);
    }

    #[test]
    fn test_empty_plan_is_complete() {
        let state = SessionState::new(CaptureQueue::new(Vec::new()));
        assert_eq!(state.phase(), SessionPhase::Complete);
    }

    #[test]
    fn test_reset_returns_patches() {
        let mut state = two_slot_state();
        state.record_patch(patch_for(CaptureSlot::new(0.0, 0.0))).unwrap();
        let removed = state.reset(CaptureQueue::new(vec![CaptureSlot::new(0.0, 0.0)]));
        assert_eq!(removed.len(), 1);
        assert_eq!(state.captured_count(), 0);
        assert_eq!(state.total_slots(), 1);
        assert_eq!(state.phase(), SessionPhase::AwaitingFirstCapture);
        assert!(!state.is_filled(&CaptureSlot::new(0.0, 0.0)));
    }

    #[test]
    fn contract_session_state_invariants() {
        clear_invariant_log();
        let mut state = two_slot_state();
        state.record_patch(patch_for(CaptureSlot::new(0.0, 0.0))).unwrap();
        contract_test(
            "session state",
            &[
                CAPTURED_COUNT_MATCHES_PATCHES,
                CAPTURED_PLUS_QUEUED_IS_TOTAL,
                COMPLETE_MEANS_EMPTY_QUEUE,
            ],
        );
    }
}
