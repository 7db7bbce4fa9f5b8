//! CrabPano: guided 360° panorama capture
//!
//! Plans a grid of capture targets over the sphere, watches the view
//! orientation, and captures a camera frame whenever the view is centred on
//! the next target. Each capture is placed as a flat textured patch on the
//! inside of a reference sphere, building the panorama incrementally.
//!
//! The renderer and the live camera stream stay outside this crate; they are
//! reached through [`scene::SceneSink`] and [`capture::FrameSource`].
//!
//! # Usage
//! ```rust,ignore
//! use crabpano::{MemoryScene, PanoramaConfig, PanoramaSession, PlatformCapabilities};
//! use crabpano::testing::SyntheticFrameSource;
//!
//! let mut session = PanoramaSession::new(
//!     PanoramaConfig::load_or_default(),
//!     MemoryScene::new(),
//!     SyntheticFrameSource::new(640, 480),
//!     PlatformCapabilities::default(),
//! )?;
//! session.request_capture();
//! loop {
//!     let report = session.tick()?;
//!     // render, forward input events...
//! }
//! ```
pub mod alignment;
pub mod capture;
pub mod config;
pub mod errors;
pub mod grid;
pub mod invariant_ppt;
pub mod orientation;
pub mod placement;
pub mod scene;
pub mod session;
pub mod types;

// Testing utilities - synthetic frames and scripted sources
pub mod testing;

// Re-exports for convenience
pub use capture::{FrameSource, PatchTexture};
pub use config::PanoramaConfig;
pub use errors::PanoramaError;
pub use grid::{plan_grid, CaptureQueue};
pub use orientation::{OrientationInput, PlatformCapabilities, ViewPose};
pub use placement::{CapturedPatch, PatchId};
pub use scene::{MemoryScene, SceneSink};
pub use session::{PanoramaSession, SessionController, SessionPhase, SessionStatus};
pub use types::{CaptureSlot, ImageFrame};

/// Initialize logging for the capture session
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabpano=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
