//! Capture session
//!
//! [`SessionState`] holds the queue and the committed patches,
//! [`SessionController`] runs the phase machine on top of it, and
//! [`PanoramaSession`] wires the controller to a frame source and an
//! orientation source.

pub mod controller;
pub mod driver;
pub mod state;
pub mod status;

pub use controller::{CaptureOutcome, CaptureTicket, SessionController};
pub use driver::{PanoramaSession, TickReport};
pub use state::{SessionPhase, SessionState};
pub use status::{instruction_for, SessionStatus};
