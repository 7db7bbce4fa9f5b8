//! Configuration management for crabpano
//!
//! Provides configuration loading, saving, and validation for the capture
//! grid, sphere placement, view projection, alignment tolerance and frame
//! capture settings.

use crate::errors::PanoramaError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanoramaConfig {
    pub grid: GridConfig,
    pub sphere: SphereConfig,
    pub view: ViewConfig,
    pub alignment: AlignmentConfig,
    pub capture: CaptureConfig,
}

/// How the azimuth step of each elevation band is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AzimuthSpacing {
    /// Use the fixed per-band increments of the elevation band table; the
    /// camera field of view is validated but does not change the plan
    BandTable,
    /// Derive the step from the horizontal field of view and overlap factor
    FieldOfView,
}

/// Capture grid configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Horizontal field of view of the capturing camera (degrees)
    pub hfov_deg: f64,
    /// Vertical field of view of the capturing camera (degrees)
    pub vfov_deg: f64,
    /// Fraction of a patch width between neighbouring slots (0.0-1.0]
    pub overlap_factor: f64,
    pub azimuth_spacing: AzimuthSpacing,
}

/// Reference sphere the patches are placed inside
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereConfig {
    /// Radius of the reference sphere
    pub radius: f32,
    /// Inward offset so patches sit just inside the sphere surface
    pub patch_offset: f32,
}

/// Viewer camera used to project slots into the viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub vfov_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Drag sensitivity in degrees per pixel
    pub drag_degrees_per_pixel: f32,
}

/// Auto-capture alignment settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Half-width of the centred tolerance window in NDC (0.0-1.0]
    pub tolerance_fraction: f32,
}

/// Frame grab and texture preparation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Upper bound on a single frame grab in milliseconds
    pub frame_timeout_ms: u64,
    /// JPEG quality used for the encode step (1-100)
    pub jpeg_quality: u8,
    /// Largest texture edge handed to the renderer
    pub max_texture_dimension: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            hfov_deg: 60.0,
            vfov_deg: 60.0,
            overlap_factor: 0.95,
            azimuth_spacing: AzimuthSpacing::BandTable,
        }
    }
}

impl Default for SphereConfig {
    fn default() -> Self {
        Self {
            radius: 500.0,
            patch_offset: 1.0,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            vfov_deg: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            drag_degrees_per_pixel: 0.2,
        }
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            tolerance_fraction: 0.05,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_timeout_ms: 3000,
            jpeg_quality: 85,
            max_texture_dimension: 2048,
        }
    }
}

impl Default for PanoramaConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            sphere: SphereConfig::default(),
            view: ViewConfig::default(),
            alignment: AlignmentConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

impl GridConfig {
    /// Check the camera field of view and overlap before any slot is planned
    pub fn validate(&self) -> Result<(), PanoramaError> {
        validate_fov("hfov_deg", self.hfov_deg)?;
        validate_fov("vfov_deg", self.vfov_deg)?;
        if !self.overlap_factor.is_finite()
            || self.overlap_factor <= 0.0
            || self.overlap_factor > 1.0
        {
            return Err(PanoramaError::Configuration(format!(
                "overlap_factor must be in (0.0, 1.0], got {}",
                self.overlap_factor
            )));
        }
        Ok(())
    }
}

fn validate_fov(name: &str, value: f64) -> Result<(), PanoramaError> {
    if !value.is_finite() || value <= 0.0 || value >= 180.0 {
        return Err(PanoramaError::Configuration(format!(
            "{} must be in (0, 180) degrees, got {}",
            name, value
        )));
    }
    Ok(())
}

impl PanoramaConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PanoramaError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            PanoramaError::Configuration(format!("Failed to read config file: {}", e))
        })?;

        let config: PanoramaConfig = toml::from_str(&contents).map_err(|e| {
            PanoramaError::Configuration(format!("Failed to parse config file: {}", e))
        })?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PanoramaError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PanoramaError::Configuration(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            PanoramaError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            PanoramaError::Configuration(format!("Failed to write config file: {}", e))
        })?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("crabpano.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), PanoramaError> {
        self.grid.validate()?;

        if !(self.sphere.radius.is_finite() && self.sphere.radius > 0.0) {
            return Err(PanoramaError::Configuration(
                "Sphere radius must be positive".to_string(),
            ));
        }
        if !(0.0..self.sphere.radius).contains(&self.sphere.patch_offset) {
            return Err(PanoramaError::Configuration(
                "Patch offset must be in [0, radius)".to_string(),
            ));
        }

        if !(self.view.vfov_deg > 0.0 && self.view.vfov_deg < 180.0) {
            return Err(PanoramaError::Configuration(
                "View vfov_deg must be in (0, 180)".to_string(),
            ));
        }
        if !(self.view.aspect > 0.0) {
            return Err(PanoramaError::Configuration(
                "View aspect must be positive".to_string(),
            ));
        }
        if !(self.view.near > 0.0 && self.view.far > self.view.near) {
            return Err(PanoramaError::Configuration(
                "View clip planes must satisfy 0 < near < far".to_string(),
            ));
        }

        let tol = self.alignment.tolerance_fraction;
        if !(tol > 0.0 && tol <= 1.0) {
            return Err(PanoramaError::Configuration(
                "Alignment tolerance must be in (0.0, 1.0]".to_string(),
            ));
        }

        if self.capture.frame_timeout_ms == 0 {
            return Err(PanoramaError::Configuration(
                "Frame timeout must be at least 1ms".to_string(),
            ));
        }
        if self.capture.jpeg_quality == 0 || self.capture.jpeg_quality > 100 {
            return Err(PanoramaError::Configuration(
                "JPEG quality must be between 1 and 100".to_string(),
            ));
        }
        if self.capture.max_texture_dimension == 0 {
            return Err(PanoramaError::Configuration(
                "Max texture dimension must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
