use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PanoramaError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Frame unavailable: {0}")]
    FrameUnavailable(String),

    #[error("Frame capture timed out after {timeout_ms}ms")]
    CaptureTimeout { timeout_ms: u64 },

    #[error("Permission denied error: {0}")]
    PermissionDenied(String),

    #[error("Texture decode error: {0}")]
    TextureDecode(String),

    #[error("Slot at azimuth {azimuth_deg}° elevation {elevation_deg}° was already captured")]
    DuplicateCapture { azimuth_deg: f64, elevation_deg: f64 },

    #[error("Slot at azimuth {azimuth_deg}° elevation {elevation_deg}° is not next in the queue")]
    SlotNotNext { azimuth_deg: f64, elevation_deg: f64 },

    #[error("Session is closed")]
    SessionClosed,
}

impl PanoramaError {
    /// Failures that come from the camera side and are retried on a later tick.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PanoramaError::FrameUnavailable(_)
                | PanoramaError::CaptureTimeout { .. }
                | PanoramaError::PermissionDenied(_)
                | PanoramaError::TextureDecode(_)
        )
    }

    /// Message suitable for the instructions line of a capture UI.
    pub fn instruction_text(&self) -> String {
        match self {
            PanoramaError::PermissionDenied(_) => {
                "Camera access was denied. Allow camera access to continue capturing.".to_string()
            }
            PanoramaError::FrameUnavailable(_) | PanoramaError::CaptureTimeout { .. } => {
                "Camera is not responding. Hold still, retrying...".to_string()
            }
            PanoramaError::TextureDecode(_) => {
                "Captured image could not be processed. Retrying...".to_string()
            }
            other => format!("Capture stopped: {}", other),
        }
    }
}

impl From<std::io::Error> for PanoramaError {
    fn from(e: std::io::Error) -> Self {
        PanoramaError::Configuration(format!("IO error: {}", e))
    }
}

impl From<image::ImageError> for PanoramaError {
    fn from(e: image::ImageError) -> Self {
        PanoramaError::TextureDecode(e.to_string())
    }
}
