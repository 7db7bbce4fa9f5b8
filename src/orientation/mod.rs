//! View orientation sources
//!
//! The viewer camera sits at the sphere centre. Its orientation comes either
//! from device orientation sensors or from pointer drags, chosen once when a
//! session starts.

pub mod device;
pub mod drag;

pub use device::{DeviceOrientationReading, DeviceOrientationSource};
pub use drag::DragOrbitSource;

use crate::config::ViewConfig;
use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Orientation and projection of the viewer camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewPose {
    /// Rotation taking camera space (looking down -Z, +Y up) to world space
    pub rotation: Quat,
    pub vfov_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl ViewPose {
    pub fn new(rotation: Quat, view: &ViewConfig) -> Self {
        Self {
            rotation: rotation.normalize(),
            vfov_deg: view.vfov_deg,
            aspect: view.aspect,
            near: view.near,
            far: view.far,
        }
    }

    /// Camera looking at the given azimuth/elevation, with no roll.
    ///
    /// Uses the same angle convention as capture slots, so a pose built from
    /// a slot's angles is centred on that slot.
    pub fn looking_at(yaw_deg: f32, pitch_deg: f32, view: &ViewConfig) -> Self {
        Self::new(yaw_pitch_rotation(yaw_deg, pitch_deg), view)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// World to camera transform
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation.inverse())
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.vfov_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }
}

/// Rotation for a camera or patch facing outward at (yaw, pitch) degrees.
pub fn yaw_pitch_rotation(yaw_deg: f32, pitch_deg: f32) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        -yaw_deg.to_radians(),
        pitch_deg.to_radians(),
        0.0,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrientationKind {
    DeviceOrientation,
    DragOrbit,
}

/// Input events forwarded by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrientationInput {
    Device(DeviceOrientationReading),
    /// Screen rotation angle in degrees (0, 90, 180, 270)
    ScreenOrientation(f32),
    /// Pointer drag in pixels since the previous event
    Drag { dx: f32, dy: f32 },
    /// Viewport aspect ratio change
    Resize { aspect: f32 },
}

/// Source of the current view orientation.
///
/// Sources ignore inputs they do not understand.
pub trait OrientationSource: Send {
    fn kind(&self) -> OrientationKind;

    fn current_view(&self) -> ViewPose;

    fn handle_input(&mut self, input: &OrientationInput);
}

/// What the host platform can provide
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// Device orientation events are available and permitted
    pub device_orientation: bool,
}

/// Pick the orientation source once, at session start.
pub fn select_orientation_source(
    capabilities: PlatformCapabilities,
    view: &ViewConfig,
) -> Box<dyn OrientationSource> {
    if capabilities.device_orientation {
        log::info!("Using device orientation for view control");
        Box::new(DeviceOrientationSource::new(view.clone()))
    } else {
        log::info!("Device orientation unavailable, using drag controls");
        Box::new(DragOrbitSource::new(view.clone()))
    }
}
