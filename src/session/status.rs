use super::state::SessionPhase;
use crate::types::CaptureSlot;
use serde::{Deserialize, Serialize};

/// Snapshot pushed to the UI after every state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    pub captured_count: usize,
    pub total_slots: usize,
    pub instruction_text: String,
    pub next_slot: Option<CaptureSlot>,
    /// A frame grab is in flight
    pub capturing: bool,
    /// Bumped on every reset
    pub generation: u64,
}

impl SessionStatus {
    pub fn progress(&self) -> f32 {
        if self.total_slots == 0 {
            1.0
        } else {
            self.captured_count as f32 / self.total_slots as f32
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Default instructions for a phase.
pub fn instruction_for(
    phase: SessionPhase,
    captured: usize,
    total: usize,
    capturing: bool,
) -> String {
    if capturing {
        return "Hold still, capturing...".to_string();
    }
    match phase {
        SessionPhase::AwaitingFirstCapture => {
            "Point the camera at the first target and tap capture.".to_string()
        }
        SessionPhase::AutoCapturing => format!(
            "Move the camera until the target is centred ({}/{} captured).",
            captured, total
        ),
        SessionPhase::Complete => format!(
            "All {} captures complete. Look around to explore your panorama.",
            total
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(captured: usize, total: usize) -> SessionStatus {
        SessionStatus {
            phase: SessionPhase::AutoCapturing,
            captured_count: captured,
            total_slots: total,
            instruction_text: String::new(),
            next_slot: Some(CaptureSlot::new(30.0, 0.0)),
            capturing: false,
            generation: 0,
        }
    }

    #[test]
    fn test_progress() {
        assert_eq!(status(12, 48).progress(), 0.25);
        assert_eq!(status(0, 0).progress(), 1.0);
    }

    #[test]
    fn test_json_shape() {
        let json = status(1, 48).to_json().unwrap();
        assert!(json.contains("\"phase\":\"AutoCapturing\""));
        assert!(json.contains("\"captured_count\":1"));
        assert!(json.contains("\"azimuth_deg\":30.0"));
    }

    #[test]
    fn test_instruction_text() {
        assert!(instruction_for(SessionPhase::AutoCapturing, 3, 48, false).contains("3/48"));
        assert!(instruction_for(SessionPhase::Complete, 48, 48, false).contains("48"));
        assert_eq!(
            instruction_for(SessionPhase::AutoCapturing, 3, 48, true),
            "Hold still, capturing..."
        );
    }
}
