use super::{OrientationInput, OrientationKind, OrientationSource, ViewPose};
use crate::config::ViewConfig;
use glam::{EulerRot, Quat};
use std::f32::consts::FRAC_PI_2;

/// A `deviceorientation` event: alpha around Z, beta around X, gamma around Y,
/// all in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceOrientationReading {
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
}

/// View orientation driven by device orientation sensors.
///
/// The first reading sets the heading reference, so the view starts facing
/// azimuth 0 whatever compass direction the device points at.
#[derive(Debug, Clone)]
pub struct DeviceOrientationSource {
    view: ViewConfig,
    reading: Option<DeviceOrientationReading>,
    screen_angle_deg: f32,
    heading_offset_deg: Option<f32>,
}

impl DeviceOrientationSource {
    pub fn new(view: ViewConfig) -> Self {
        Self {
            view,
            reading: None,
            screen_angle_deg: 0.0,
            heading_offset_deg: None,
        }
    }

    /// Drop the heading reference; the next reading becomes azimuth 0 again.
    pub fn recalibrate(&mut self) {
        self.heading_offset_deg = None;
    }

    fn device_rotation(&self, reading: &DeviceOrientationReading) -> Quat {
        let alpha = reading.alpha - self.heading_offset_deg.unwrap_or(0.0);
        // Device frame: screen faces +Z. The camera looks out of the back of
        // the device, hence the -90° turn about X.
        let device = Quat::from_euler(
            EulerRot::YXZ,
            alpha.to_radians(),
            reading.beta.to_radians(),
            -reading.gamma.to_radians(),
        );
        let camera = device * Quat::from_rotation_x(-FRAC_PI_2);
        camera * Quat::from_rotation_z(-self.screen_angle_deg.to_radians())
    }
}

impl OrientationSource for DeviceOrientationSource {
    fn kind(&self) -> OrientationKind {
        OrientationKind::DeviceOrientation
    }

    fn current_view(&self) -> ViewPose {
        let rotation = match &self.reading {
            Some(reading) => self.device_rotation(reading),
            None => Quat::IDENTITY,
        };
        ViewPose::new(rotation, &self.view)
    }

    fn handle_input(&mut self, input: &OrientationInput) {
        match input {
            OrientationInput::Device(reading) => {
                if self.heading_offset_deg.is_none() {
                    log::debug!("Heading reference set to alpha {:.1}°", reading.alpha);
                    self.heading_offset_deg = Some(reading.alpha);
                }
                self.reading = Some(*reading);
            }
            OrientationInput::ScreenOrientation(angle) => self.screen_angle_deg = *angle,
            OrientationInput::Resize { aspect } => self.view.aspect = *aspect,
            OrientationInput::Drag { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn reading(alpha: f32, beta: f32, gamma: f32) -> OrientationInput {
        OrientationInput::Device(DeviceOrientationReading { alpha, beta, gamma })
    }

    #[test]
    fn test_no_reading_faces_forward() {
        let source = DeviceOrientationSource::new(ViewConfig::default());
        assert!((source.current_view().forward() - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_upright_device_looks_at_horizon() {
        let mut source = DeviceOrientationSource::new(ViewConfig::default());
        source.handle_input(&reading(0.0, 90.0, 0.0));
        let forward = source.current_view().forward();
        assert!((forward - Vec3::NEG_Z).length() < 1e-5, "{:?}", forward);
    }

    #[test]
    fn test_flat_device_looks_down() {
        let mut source = DeviceOrientationSource::new(ViewConfig::default());
        source.handle_input(&reading(0.0, 0.0, 0.0));
        let forward = source.current_view().forward();
        assert!((forward - Vec3::NEG_Y).length() < 1e-5, "{:?}", forward);
    }

    #[test]
    fn test_first_reading_sets_heading() {
        let mut source = DeviceOrientationSource::new(ViewConfig::default());
        source.handle_input(&reading(137.0, 90.0, 0.0));
        assert!((source.current_view().forward() - Vec3::NEG_Z).length() < 1e-5);

        // Turning the device left (alpha grows) turns the view toward -X
        source.handle_input(&reading(227.0, 90.0, 0.0));
        let forward = source.current_view().forward();
        assert!((forward - Vec3::NEG_X).length() < 1e-5, "{:?}", forward);
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut source = DeviceOrientationSource::new(ViewConfig::default());
        source.handle_input(&OrientationInput::Resize { aspect: 0.5 });
        assert_eq!(source.current_view().aspect, 0.5);
    }
}
