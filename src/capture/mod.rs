//! Frame acquisition
//!
//! The live camera stream is managed outside this crate. A [`FrameSource`]
//! hands over one still frame on request; [`grab_patch_texture`] bounds the
//! grab with a timeout and turns the frame into a renderer texture.

pub mod sources;
pub mod texture;

pub use sources::{FramePublisher, LatestFrameSource};
pub use texture::{prepare_texture, PatchTexture};

use crate::config::CaptureConfig;
use crate::errors::PanoramaError;
use crate::types::ImageFrame;
use std::future::Future;
use std::time::Duration;

/// Source of still frames from the live camera feed.
pub trait FrameSource: Send + Sync + 'static {
    /// Grab the current frame, failing with `FrameUnavailable` when the
    /// camera has nothing to give.
    fn grab_frame(&self) -> impl Future<Output = Result<ImageFrame, PanoramaError>> + Send;

    /// Release the underlying camera stream.
    fn release(&self) {}
}

/// Grab a frame, giving up after `timeout`.
pub async fn grab_with_timeout<F: FrameSource>(
    source: &F,
    timeout: Duration,
) -> Result<ImageFrame, PanoramaError> {
    match tokio::time::timeout(timeout, source.grab_frame()).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!("Frame grab timed out after {}ms", timeout.as_millis());
            Err(PanoramaError::CaptureTimeout {
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }
}

/// Full capture round trip: grab a frame, then encode and decode it into a
/// texture on a blocking thread.
pub async fn grab_patch_texture<F: FrameSource>(
    source: &F,
    config: &CaptureConfig,
) -> Result<PatchTexture, PanoramaError> {
    let frame = grab_with_timeout(source, Duration::from_millis(config.frame_timeout_ms)).await?;
    log::debug!(
        "Grabbed frame {}x{} ({} bytes)",
        frame.width,
        frame.height,
        frame.size_bytes()
    );

    let quality = config.jpeg_quality;
    let max_dimension = config.max_texture_dimension;
    tokio::task::spawn_blocking(move || prepare_texture(&frame, quality, max_dimension))
        .await
        .map_err(|e| PanoramaError::TextureDecode(format!("Task join error: {}", e)))?
}
