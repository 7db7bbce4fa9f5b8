use super::state::{SessionPhase, SessionState};
use super::status::{instruction_for, SessionStatus};
use crate::alignment::is_aligned;
use crate::capture::PatchTexture;
use crate::config::PanoramaConfig;
use crate::errors::PanoramaError;
use crate::grid::plan_grid_with;
use crate::orientation::ViewPose;
use crate::placement::{
    commit_capture, patch_geometry, place_on_sphere, PatchGeometry, PatchId, SpherePose,
};
use crate::scene::{SceneHandles, SceneSink};
use crate::types::CaptureSlot;
use tokio::sync::watch;

/// Permission to run one frame grab for `slot`.
///
/// Carries the session generation it was issued in; a ticket from before a
/// reset is stale and its result is dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureTicket {
    pub slot: CaptureSlot,
    id: u64,
    generation: u64,
}

impl CaptureTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to a finished capture.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Committed { id: PatchId, slot: CaptureSlot },
    /// Camera trouble; the slot stays queued and is retried on a later tick
    Skipped(PanoramaError),
    /// Result of a capture issued before the last reset
    Stale,
}

/// Drives the `AwaitingFirstCapture → AutoCapturing → Complete` state machine.
///
/// Single-threaded: every method is called from the render/event loop.
/// At most one capture is in flight; requests while one is pending are
/// no-ops.
pub struct SessionController<S: SceneSink> {
    config: PanoramaConfig,
    state: SessionState,
    handles: SceneHandles<S>,
    geometry: PatchGeometry,
    generation: u64,
    next_ticket: u64,
    in_flight: Option<CaptureTicket>,
    notice: Option<String>,
    closed: bool,
    status_tx: watch::Sender<SessionStatus>,
}

impl<S: SceneSink> SessionController<S> {
    pub fn new(config: PanoramaConfig, sink: S) -> Result<Self, PanoramaError> {
        config.validate()?;
        let queue = plan_grid_with(&config.grid)?;

        let handles = SceneHandles::new(sink, config.sphere.radius, config.sphere.patch_offset);
        let geometry = patch_geometry(
            config.grid.hfov_deg,
            config.grid.vfov_deg,
            handles.placement_radius(),
        );
        let state = SessionState::new(queue);

        let initial = SessionStatus {
            phase: state.phase(),
            captured_count: 0,
            total_slots: state.total_slots(),
            instruction_text: instruction_for(state.phase(), 0, state.total_slots(), false),
            next_slot: state.next_slot().copied(),
            capturing: false,
            generation: 0,
        };
        let (status_tx, _) = watch::channel(initial);

        log::info!(
            "Capture session started with {} slots (patch {:.1}x{:.1})",
            state.total_slots(),
            geometry.width,
            geometry.height
        );

        Ok(Self {
            config,
            state,
            handles,
            geometry,
            generation: 0,
            next_ticket: 0,
            in_flight: None,
            notice: None,
            closed: false,
            status_tx,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        let phase = self.state.phase();
        let captured = self.state.captured_count();
        let total = self.state.total_slots();
        let capturing = self.in_flight.is_some();
        let instruction_text = match (&self.notice, capturing) {
            (Some(notice), false) => notice.clone(),
            _ => instruction_for(phase, captured, total, capturing),
        };
        SessionStatus {
            phase,
            captured_count: captured,
            total_slots: total,
            instruction_text,
            next_slot: self.state.next_slot().copied(),
            capturing,
            generation: self.generation,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &PanoramaConfig {
        &self.config
    }

    pub fn scene(&self) -> &S {
        &self.handles.sink
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn is_capturing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn patch_geometry(&self) -> PatchGeometry {
        self.geometry
    }

    /// Slots still waiting for a capture, front first
    pub fn pending_slots(&self) -> impl Iterator<Item = &CaptureSlot> {
        self.state.queue().iter()
    }

    /// Pose and size of the next patch, for drawing the live preview exactly
    /// where the capture will land.
    pub fn preview_pose(&self) -> Option<(SpherePose, PatchGeometry)> {
        self.state.next_slot().map(|slot| {
            (
                place_on_sphere(slot, self.handles.radius, self.handles.patch_offset),
                self.geometry,
            )
        })
    }

    /// Per-frame check. Issues a ticket when auto-capturing, idle, and the
    /// view is centred on the next slot.
    pub fn tick(&mut self, view: &ViewPose) -> Option<CaptureTicket> {
        if self.closed || self.in_flight.is_some() {
            return None;
        }
        if self.state.phase() != SessionPhase::AutoCapturing {
            return None;
        }

        let target = *self.state.next_slot()?;
        if !is_aligned(
            &self.handles.sink,
            view,
            &target,
            self.config.alignment.tolerance_fraction,
        ) {
            return None;
        }

        log::debug!("View aligned with {}, starting auto capture", target);
        Some(self.begin_capture(target))
    }

    /// Manual capture of the next slot. A no-op while a capture is in flight
    /// or once the session is complete.
    pub fn request_capture(&mut self) -> Option<CaptureTicket> {
        if self.closed || self.in_flight.is_some() {
            return None;
        }
        let target = *self.state.next_slot()?;
        log::debug!("Manual capture requested for {}", target);
        Some(self.begin_capture(target))
    }

    fn begin_capture(&mut self, slot: CaptureSlot) -> CaptureTicket {
        let ticket = CaptureTicket {
            slot,
            id: self.next_ticket,
            generation: self.generation,
        };
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        self.publish();
        ticket
    }

    /// Finish the capture a ticket was issued for.
    ///
    /// Camera-side failures are reported as [`CaptureOutcome::Skipped`] and
    /// leave the slot queued. Bookkeeping defects such as a duplicate
    /// capture come back as errors.
    pub fn complete_capture(
        &mut self,
        ticket: CaptureTicket,
        result: Result<PatchTexture, PanoramaError>,
    ) -> Result<CaptureOutcome, PanoramaError> {
        let current = self
            .in_flight
            .map(|t| t.id == ticket.id && t.generation == ticket.generation)
            .unwrap_or(false);
        if self.closed || ticket.generation != self.generation || !current {
            log::warn!(
                "Dropping stale capture for {} (generation {}, current {})",
                ticket.slot,
                ticket.generation,
                self.generation
            );
            return Ok(CaptureOutcome::Stale);
        }
        self.in_flight = None;

        let texture = match result {
            Ok(texture) => texture,
            Err(e) if e.is_recoverable() => {
                log::warn!("Capture for {} skipped: {}", ticket.slot, e);
                self.notice = Some(e.instruction_text());
                self.publish();
                return Ok(CaptureOutcome::Skipped(e));
            }
            Err(e) => {
                log::error!("Capture for {} failed: {}", ticket.slot, e);
                self.publish();
                return Err(e);
            }
        };

        let committed = commit_capture(
            &mut self.state,
            &mut self.handles,
            self.geometry,
            ticket.slot,
            texture,
        );
        let patch = match committed {
            Ok(patch) => patch,
            Err(e) => {
                self.publish();
                return Err(e);
            }
        };

        self.notice = None;
        if self.state.phase() == SessionPhase::Complete {
            log::info!(
                "Capture session complete: {} patches placed",
                self.state.captured_count()
            );
        }
        self.publish();
        Ok(CaptureOutcome::Committed {
            id: patch.id,
            slot: patch.slot,
        })
    }

    /// Drop every patch, re-plan with the same configuration and return to
    /// `AwaitingFirstCapture`. Any capture in flight becomes stale.
    pub fn request_reset(&mut self) -> Result<(), PanoramaError> {
        if self.closed {
            return Err(PanoramaError::SessionClosed);
        }
        let queue = plan_grid_with(&self.config.grid)?;
        self.clear_scene_with(queue);
        log::info!(
            "Capture session reset (generation {}, {} slots)",
            self.generation,
            self.state.total_slots()
        );
        self.publish();
        Ok(())
    }

    /// Tear the session down: removes all patches and refuses further
    /// commands. Idempotent.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.clear_scene_with(crate::grid::CaptureQueue::new(Vec::new()));
        self.closed = true;
        self.notice = Some("Capture session closed.".to_string());
        log::info!("Capture session closed");
        self.publish();
    }

    fn clear_scene_with(&mut self, queue: crate::grid::CaptureQueue) {
        self.generation += 1;
        self.in_flight = None;
        self.notice = None;
        for patch in self.state.reset(queue) {
            self.handles.sink.remove_patch(patch.id);
        }
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.status());
    }
}

impl<S: SceneSink + std::fmt::Debug> std::fmt::Debug for SessionController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("phase", &self.state.phase())
            .field("captured", &self.state.captured_count())
            .field("total", &self.state.total_slots())
            .field("generation", &self.generation)
            .field("in_flight", &self.in_flight)
            .field("closed", &self.closed)
            .finish()
    }
}
