use super::FrameSource;
use crate::errors::PanoramaError;
use crate::types::ImageFrame;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Frame source fed by an externally managed live stream.
///
/// The stream owner publishes every decoded frame through the paired
/// [`FramePublisher`]; a grab returns whatever frame is newest.
#[derive(Debug)]
pub struct LatestFrameSource {
    rx: watch::Receiver<Option<ImageFrame>>,
    released: AtomicBool,
}

/// Publishing half held by the live stream.
#[derive(Debug)]
pub struct FramePublisher {
    tx: watch::Sender<Option<ImageFrame>>,
}

impl FramePublisher {
    /// Publish a new frame. Returns `false` once the source was dropped.
    pub fn publish(&self, frame: ImageFrame) -> bool {
        self.tx.send(Some(frame)).is_ok()
    }

    /// Signal the stream has stopped, e.g. the camera was unplugged.
    pub fn clear(&self) {
        let _ = self.tx.send(None);
    }
}

impl LatestFrameSource {
    pub fn channel() -> (FramePublisher, LatestFrameSource) {
        let (tx, rx) = watch::channel(None);
        (
            FramePublisher { tx },
            LatestFrameSource {
                rx,
                released: AtomicBool::new(false),
            },
        )
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl FrameSource for LatestFrameSource {
    fn grab_frame(&self) -> impl Future<Output = Result<ImageFrame, PanoramaError>> + Send {
        let result = if self.is_released() {
            Err(PanoramaError::FrameUnavailable(
                "camera stream was released".to_string(),
            ))
        } else {
            self.rx.borrow().clone().ok_or_else(|| {
                PanoramaError::FrameUnavailable("no frame received from camera yet".to_string())
            })
        };
        async move { result }
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            log::info!("Released camera frame source");
        }
    }
}
