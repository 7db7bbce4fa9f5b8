//! Synthetic frames and frame sources
//!
//! Lets the capture pipeline run end to end in tests and demos with no
//! camera attached.

use crate::capture::FrameSource;
use crate::errors::PanoramaError;
use crate::types::ImageFrame;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Create an RGB gradient frame whose content changes with `frame_number`
pub fn synthetic_video_frame(frame_number: u64, width: u32, height: u32) -> ImageFrame {
    let mut data = vec![0u8; width as usize * height as usize * 3];

    let base = (frame_number % 256) as u8;
    for y in 0..height {
        for x in 0..width {
            let idx = (y as usize * width as usize + x as usize) * 3;
            data[idx] = base.wrapping_add((x % 256) as u8);
            data[idx + 1] = base.wrapping_add((y % 256) as u8);
            data[idx + 2] = base.wrapping_add(((x + y) % 256) as u8);
        }
    }

    ImageFrame::new(data, width, height)
}

/// Always-available source producing a fresh gradient frame on every grab
#[derive(Debug)]
pub struct SyntheticFrameSource {
    width: u32,
    height: u32,
    grabs: AtomicU64,
}

impl SyntheticFrameSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            grabs: AtomicU64::new(0),
        }
    }

    pub fn grab_count(&self) -> u64 {
        self.grabs.load(Ordering::Relaxed)
    }
}

impl FrameSource for SyntheticFrameSource {
    fn grab_frame(&self) -> impl Future<Output = Result<ImageFrame, PanoramaError>> + Send {
        let n = self.grabs.fetch_add(1, Ordering::Relaxed);
        let frame = synthetic_video_frame(n, self.width, self.height);
        async move { Ok(frame) }
    }
}

/// Source that replays a fixed script of results, then falls back to
/// synthetic frames. A hanging source never resolves.
#[derive(Debug)]
pub struct ScriptedFrameSource {
    script: Mutex<VecDeque<Result<ImageFrame, PanoramaError>>>,
    hang: bool,
    grabs: AtomicU64,
    released: AtomicU64,
}

impl ScriptedFrameSource {
    pub fn new(script: Vec<Result<ImageFrame, PanoramaError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            hang: false,
            grabs: AtomicU64::new(0),
            released: AtomicU64::new(0),
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn grab_count(&self) -> u64 {
        self.grabs.load(Ordering::Relaxed)
    }

    pub fn release_count(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    fn next_result(&self, n: u64) -> Result<ImageFrame, PanoramaError> {
        let scripted = match self.script.lock() {
            Ok(mut script) => script.pop_front(),
            Err(_) => Some(Err(PanoramaError::FrameUnavailable(
                "script lock poisoned".to_string(),
            ))),
        };
        scripted.unwrap_or_else(|| Ok(synthetic_video_frame(n, 16, 12)))
    }
}

impl FrameSource for ScriptedFrameSource {
    fn grab_frame(&self) -> impl Future<Output = Result<ImageFrame, PanoramaError>> + Send {
        let n = self.grabs.fetch_add(1, Ordering::Relaxed);
        let hang = self.hang;
        let result = if hang { None } else { Some(self.next_result(n)) };
        async move {
            match result {
                Some(result) => result,
                None => std::future::pending().await,
            }
        }
    }

    fn release(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }
}
