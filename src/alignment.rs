//! Alignment detection
//!
//! A slot is aligned when its direction projects into a small window at the
//! centre of the viewport. Being merely visible is not enough.

use crate::orientation::ViewPose;
use crate::scene::ViewportProjector;
use crate::types::CaptureSlot;
use glam::Vec2;

/// Offset of a slot from the viewport centre, in NDC.
///
/// Returns `None` when the slot is behind the camera.
pub fn viewport_offset<P: ViewportProjector + ?Sized>(
    projector: &P,
    view: &ViewPose,
    slot: &CaptureSlot,
) -> Option<Vec2> {
    projector.project_to_viewport(slot.direction(), view)
}

/// Centred window test. The boundary is inclusive: an offset of exactly
/// `tolerance_fraction` on either axis still counts as aligned.
pub fn within_tolerance(offset: Vec2, tolerance_fraction: f32) -> bool {
    offset.x.abs() <= tolerance_fraction && offset.y.abs() <= tolerance_fraction
}

/// Whether `view` is centred on `target` closely enough to capture.
///
/// Pure predicate; acting on it (once per alignment) is up to the caller.
pub fn is_aligned<P: ViewportProjector + ?Sized>(
    projector: &P,
    view: &ViewPose,
    target: &CaptureSlot,
    tolerance_fraction: f32,
) -> bool {
    match viewport_offset(projector, view, target) {
        Some(offset) => within_tolerance(offset, tolerance_fraction),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::scene::PerspectiveProjector;

    fn view(yaw: f32, pitch: f32) -> ViewPose {
        ViewPose::looking_at(yaw, pitch, &ViewConfig::default())
    }

    #[test]
    fn test_centred_slot_is_aligned() {
        let slot = CaptureSlot::new(57.0, 30.0);
        assert!(is_aligned(&PerspectiveProjector, &view(57.0, 30.0), &slot, 0.05));
    }

    #[test]
    fn test_visible_but_off_centre_is_not_aligned() {
        let slot = CaptureSlot::new(20.0, 0.0);
        let pose = view(0.0, 0.0);
        let offset = viewport_offset(&PerspectiveProjector, &pose, &slot).unwrap();
        // Inside the viewport, outside the window
        assert!(offset.x.abs() < 1.0);
        assert!(!is_aligned(&PerspectiveProjector, &pose, &slot, 0.05));
    }

    #[test]
    fn test_slot_behind_is_not_aligned() {
        let slot = CaptureSlot::new(180.0, 0.0);
        assert!(!is_aligned(&PerspectiveProjector, &view(0.0, 0.0), &slot, 1.0));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        assert!(within_tolerance(Vec2::new(0.05, 0.0), 0.05));
        assert!(within_tolerance(Vec2::new(-0.05, 0.05), 0.05));
        assert!(!within_tolerance(Vec2::new(0.050001, 0.0), 0.05));
        assert!(!within_tolerance(Vec2::new(0.0, -0.06), 0.05));
    }

    #[test]
    fn test_pole_slot_aligns_when_looking_up() {
        let slot = CaptureSlot::new(90.0, 90.0);
        assert!(is_aligned(&PerspectiveProjector, &view(90.0, 90.0), &slot, 0.05));
        assert!(is_aligned(&PerspectiveProjector, &view(0.0, 90.0), &slot, 0.05));
    }
}
