//! Placement of flat patches on the inside of the reference sphere
//!
//! Angles come in as degrees and are converted to radians once. Positions
//! are built from sines and cosines only, so the poles (where azimuth
//! degenerates) need no special case and never divide by zero.

use crate::capture::PatchTexture;
use crate::errors::PanoramaError;
use crate::orientation::yaw_pitch_rotation;
use crate::scene::{SceneHandles, SceneSink};
use crate::session::SessionState;
use crate::types::CaptureSlot;
use chrono::{DateTime, Utc};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a patch sits and which way it faces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpherePose {
    pub position: Vec3,
    /// Unit normal of the visible face, pointing at the sphere centre
    pub facing: Vec3,
    /// Rotation taking the patch's local frame (+Z normal) to world space
    pub rotation: Quat,
}

/// Size of a flat patch on the sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatchGeometry {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatchId(pub Uuid);

impl PatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A committed capture. Never mutated; removed only by a session reset.
#[derive(Debug, Clone)]
pub struct CapturedPatch {
    pub id: PatchId,
    pub slot: CaptureSlot,
    pub texture: PatchTexture,
    pub pose: SpherePose,
    pub geometry: PatchGeometry,
    pub captured_at: DateTime<Utc>,
}

/// Pose of a patch for `slot`, sitting at `radius - offset` from the centre.
pub fn place_on_sphere(slot: &CaptureSlot, radius: f32, offset: f32) -> SpherePose {
    let direction = slot.direction();
    let rotation = yaw_pitch_rotation(slot.azimuth_deg as f32, slot.elevation_deg as f32);
    SpherePose {
        position: direction * (radius - offset),
        facing: -direction,
        rotation,
    }
}

/// Patch size that spans the camera's field of view at `distance`.
///
/// The planner spaces slots by the same horizontal field of view, so the
/// patch width and the azimuth step always agree.
pub fn patch_geometry(hfov_deg: f64, vfov_deg: f64, distance: f32) -> PatchGeometry {
    let half_w = (hfov_deg.to_radians() / 2.0).tan() as f32;
    let half_h = (vfov_deg.to_radians() / 2.0).tan() as f32;
    PatchGeometry {
        width: 2.0 * distance * half_w,
        height: 2.0 * distance * half_h,
    }
}

/// Commit a capture for `slot`: add the patch to the scene and record it in
/// the session.
///
/// Capturing a slot twice is a bookkeeping defect and fails with
/// [`PanoramaError::DuplicateCapture`].
pub fn commit_capture<S: SceneSink>(
    state: &mut SessionState,
    handles: &mut SceneHandles<S>,
    geometry: PatchGeometry,
    slot: CaptureSlot,
    texture: PatchTexture,
) -> Result<CapturedPatch, PanoramaError> {
    state.check_capturable(&slot)?;

    let patch = CapturedPatch {
        id: PatchId::new(),
        slot,
        texture,
        pose: place_on_sphere(&slot, handles.radius, handles.patch_offset),
        geometry,
        captured_at: Utc::now(),
    };

    handles.sink.add_patch(&patch)?;
    state.record_patch(patch.clone())?;

    log::debug!(
        "Committed patch {} at {} ({} of {})",
        patch.id,
        slot,
        state.captured_count(),
        state.total_slots()
    );
    Ok(patch)
}
