use chrono::{DateTime, Utc};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One target direction on the sphere that needs a capture.
///
/// Azimuth is in `[0, 360)`, elevation in `[-90, 90]`, both in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureSlot {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

/// Hashable identity of a slot, used to detect duplicate captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey(u64, u64);

impl CaptureSlot {
    pub fn new(azimuth_deg: f64, elevation_deg: f64) -> Self {
        Self {
            azimuth_deg,
            elevation_deg,
        }
    }

    pub fn key(&self) -> SlotKey {
        // +0.0 and -0.0 name the same direction
        let norm = |v: f64| if v == 0.0 { 0.0f64 } else { v };
        SlotKey(
            norm(self.azimuth_deg).to_bits(),
            norm(self.elevation_deg).to_bits(),
        )
    }

    /// Unit vector pointing from the sphere centre toward this slot.
    ///
    /// Y is up, azimuth 0 looks down -Z and increases toward +X.
    pub fn direction(&self) -> Vec3 {
        direction_from_angles(self.azimuth_deg, self.elevation_deg)
    }

    /// Great-circle distance to another slot, in degrees.
    pub fn angular_distance_deg(&self, other: &CaptureSlot) -> f64 {
        angular_distance_deg(
            self.azimuth_deg,
            self.elevation_deg,
            other.azimuth_deg,
            other.elevation_deg,
        )
    }
}

impl std::fmt::Display for CaptureSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(az {:.1}°, el {:.1}°)",
            self.azimuth_deg, self.elevation_deg
        )
    }
}

pub fn direction_from_angles(azimuth_deg: f64, elevation_deg: f64) -> Vec3 {
    let (sin_az, cos_az) = azimuth_deg.to_radians().sin_cos();
    let (sin_el, cos_el) = elevation_deg.to_radians().sin_cos();
    Vec3::new(
        (cos_el * sin_az) as f32,
        sin_el as f32,
        (-cos_el * cos_az) as f32,
    )
}

pub fn angular_distance_deg(az_a: f64, el_a: f64, az_b: f64, el_b: f64) -> f64 {
    let (sin_a, cos_a) = el_a.to_radians().sin_cos();
    let (sin_b, cos_b) = el_b.to_radians().sin_cos();
    let d_az = (az_a - az_b).to_radians().cos();
    (sin_a * sin_b + cos_a * cos_b * d_az)
        .clamp(-1.0, 1.0)
        .acos()
        .to_degrees()
}

/// Raw still frame handed over by a frame source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Pixel layout, `"rgb8"` or `"rgba8"`
    pub format: String,
    pub timestamp: DateTime<Utc>,
}

impl ImageFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            format: "rgb8".to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn expected_rgb_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_key_ignores_sign_of_zero() {
        let a = CaptureSlot::new(0.0, 0.0);
        let b = CaptureSlot::new(-0.0, -0.0);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_direction_axes() {
        let forward = CaptureSlot::new(0.0, 0.0).direction();
        assert!((forward - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);

        let right = CaptureSlot::new(90.0, 0.0).direction();
        assert!((right - Vec3::X).length() < 1e-6);

        let up = CaptureSlot::new(123.0, 90.0).direction();
        assert!((up - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_angular_distance() {
        let a = CaptureSlot::new(0.0, 0.0);
        let b = CaptureSlot::new(90.0, 0.0);
        assert!((a.angular_distance_deg(&b) - 90.0).abs() < 1e-9);

        let pole = CaptureSlot::new(45.0, 90.0);
        let other_pole = CaptureSlot::new(200.0, 90.0);
        assert!(pole.angular_distance_deg(&other_pole) < 1e-6);
    }

    #[test]
    fn test_frame_sizes() {
        let frame = ImageFrame::new(vec![0; 12], 2, 2);
        assert_eq!(frame.expected_rgb_len(), 12);
        assert_eq!(frame.size_bytes(), 12);
        assert_eq!(frame.format, "rgb8");
    }
}
