//! Testing utilities for crabpano
//!
//! Synthetic frames and scripted frame sources for offline testing of the
//! capture pipeline without a camera.

pub mod synthetic_data;

pub use synthetic_data::{synthetic_video_frame, ScriptedFrameSource, SyntheticFrameSource};
