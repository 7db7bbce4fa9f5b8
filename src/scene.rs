//! Scene-side collaborators
//!
//! The renderer is reached only through [`SceneSink`]: it places textured
//! rectangles at a pose, removes them, and projects world points into the
//! viewport. [`MemoryScene`] is an in-process sink for headless use.

use crate::errors::PanoramaError;
use crate::orientation::ViewPose;
use crate::placement::{CapturedPatch, PatchId};
use glam::{Vec2, Vec3, Vec4};
use std::collections::HashMap;

/// Projects world points into normalized device coordinates.
pub trait ViewportProjector {
    /// NDC of `world_point` as seen from `view`, `None` when behind the camera.
    fn project_to_viewport(&self, world_point: Vec3, view: &ViewPose) -> Option<Vec2> {
        perspective_project(world_point, view)
    }
}

/// Plain perspective projection with the view's own matrices
#[derive(Debug, Clone, Copy, Default)]
pub struct PerspectiveProjector;

impl ViewportProjector for PerspectiveProjector {}

pub fn perspective_project(world_point: Vec3, view: &ViewPose) -> Option<Vec2> {
    let clip = view.view_projection() * Vec4::new(world_point.x, world_point.y, world_point.z, 1.0);
    if clip.w <= 0.0 {
        return None;
    }
    Some(Vec2::new(clip.x / clip.w, clip.y / clip.w))
}

/// The renderer surface the session needs.
pub trait SceneSink: ViewportProjector {
    fn add_patch(&mut self, patch: &CapturedPatch) -> Result<(), PanoramaError>;

    fn remove_patch(&mut self, id: PatchId);
}

/// Scene handles owned by the session controller and lent to placement.
#[derive(Debug)]
pub struct SceneHandles<S: SceneSink> {
    pub sink: S,
    /// Radius of the reference sphere
    pub radius: f32,
    /// Inward offset of every patch
    pub patch_offset: f32,
}

impl<S: SceneSink> SceneHandles<S> {
    pub fn new(sink: S, radius: f32, patch_offset: f32) -> Self {
        Self {
            sink,
            radius,
            patch_offset,
        }
    }

    pub fn placement_radius(&self) -> f32 {
        self.radius - self.patch_offset
    }
}

/// Scene that keeps patches in memory.
#[derive(Debug, Default)]
pub struct MemoryScene {
    patches: HashMap<PatchId, CapturedPatch>,
    added: u64,
    removed: u64,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn get(&self, id: &PatchId) -> Option<&CapturedPatch> {
        self.patches.get(id)
    }

    pub fn patches(&self) -> impl Iterator<Item = &CapturedPatch> {
        self.patches.values()
    }

    /// Lifetime add/remove counters, for diagnostics
    pub fn stats(&self) -> (u64, u64) {
        (self.added, self.removed)
    }
}

impl ViewportProjector for MemoryScene {}

impl SceneSink for MemoryScene {
    fn add_patch(&mut self, patch: &CapturedPatch) -> Result<(), PanoramaError> {
        self.patches.insert(patch.id, patch.clone());
        self.added += 1;
        Ok(())
    }

    fn remove_patch(&mut self, id: PatchId) {
        if self.patches.remove(&id).is_some() {
            self.removed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;

    #[test]
    fn test_centre_projects_to_origin() {
        let view = ViewPose::looking_at(0.0, 0.0, &ViewConfig::default());
        let ndc = perspective_project(Vec3::new(0.0, 0.0, -10.0), &view).unwrap();
        assert!(ndc.length() < 1e-6);
    }

    #[test]
    fn test_behind_camera_is_none() {
        let view = ViewPose::looking_at(0.0, 0.0, &ViewConfig::default());
        assert!(perspective_project(Vec3::new(0.0, 0.0, 10.0), &view).is_none());
    }

    #[test]
    fn test_offset_point_lands_on_right_side() {
        let view = ViewPose::looking_at(0.0, 0.0, &ViewConfig::default());
        let ndc = perspective_project(Vec3::new(1.0, 0.5, -10.0), &view).unwrap();
        assert!(ndc.x > 0.0);
        assert!(ndc.y > 0.0);
    }

    #[test]
    fn test_placement_radius() {
        let handles = SceneHandles::new(MemoryScene::new(), 500.0, 1.0);
        assert_eq!(handles.placement_radius(), 499.0);
    }
}
