use super::{yaw_pitch_rotation, OrientationInput, OrientationKind, OrientationSource, ViewPose};
use crate::config::ViewConfig;

/// View orientation driven by pointer drags, orbiting in place at the centre.
///
/// Dragging moves the scene with the pointer: dragging right turns the view
/// left. Pitch is clamped to straight up / straight down.
#[derive(Debug, Clone)]
pub struct DragOrbitSource {
    view: ViewConfig,
    yaw_deg: f32,
    pitch_deg: f32,
}

impl DragOrbitSource {
    pub fn new(view: ViewConfig) -> Self {
        Self {
            view,
            yaw_deg: 0.0,
            pitch_deg: 0.0,
        }
    }

    pub fn yaw_deg(&self) -> f32 {
        self.yaw_deg
    }

    pub fn pitch_deg(&self) -> f32 {
        self.pitch_deg
    }

    /// Jump straight to an orientation, e.g. to restore a saved view.
    pub fn set_orientation(&mut self, yaw_deg: f32, pitch_deg: f32) {
        self.yaw_deg = yaw_deg.rem_euclid(360.0);
        self.pitch_deg = pitch_deg.clamp(-90.0, 90.0);
    }

    fn drag(&mut self, dx: f32, dy: f32) {
        let k = self.view.drag_degrees_per_pixel;
        self.set_orientation(self.yaw_deg - dx * k, self.pitch_deg + dy * k);
    }
}

impl OrientationSource for DragOrbitSource {
    fn kind(&self) -> OrientationKind {
        OrientationKind::DragOrbit
    }

    fn current_view(&self) -> ViewPose {
        ViewPose::new(yaw_pitch_rotation(self.yaw_deg, self.pitch_deg), &self.view)
    }

    fn handle_input(&mut self, input: &OrientationInput) {
        match input {
            OrientationInput::Drag { dx, dy } => self.drag(*dx, *dy),
            OrientationInput::Resize { aspect } => self.view.aspect = *aspect,
            OrientationInput::Device(_) | OrientationInput::ScreenOrientation(_) => {}
        }
    }
}
