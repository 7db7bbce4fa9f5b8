use super::controller::{CaptureOutcome, CaptureTicket, SessionController};
use super::status::SessionStatus;
use crate::capture::{grab_patch_texture, FrameSource, PatchTexture};
use crate::config::PanoramaConfig;
use crate::errors::PanoramaError;
use crate::orientation::{
    select_orientation_source, OrientationInput, OrientationSource, PlatformCapabilities, ViewPose,
};
use crate::scene::SceneSink;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

type GrabResult = (CaptureTicket, Result<PatchTexture, PanoramaError>);

/// What one frame tick did.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickReport {
    /// Captures that finished since the previous tick
    pub outcomes: Vec<CaptureOutcome>,
    /// Capture started by this tick, if the view was aligned
    pub started: Option<CaptureTicket>,
}

/// A capture session wired to a frame source and an orientation source.
///
/// Frame grabs run as tokio tasks; their results come back over a channel
/// and are applied on the next [`tick`](Self::tick), so all session state is
/// touched from the caller's loop only. Must be used inside a tokio runtime.
pub struct PanoramaSession<F: FrameSource, S: SceneSink> {
    controller: SessionController<S>,
    orientation: Box<dyn OrientationSource>,
    source: Arc<F>,
    results_tx: mpsc::UnboundedSender<GrabResult>,
    results_rx: mpsc::UnboundedReceiver<GrabResult>,
    grab_task: Option<JoinHandle<()>>,
    shut_down: bool,
}

impl<F: FrameSource, S: SceneSink> PanoramaSession<F, S> {
    pub fn new(
        config: PanoramaConfig,
        sink: S,
        source: F,
        capabilities: PlatformCapabilities,
    ) -> Result<Self, PanoramaError> {
        let orientation = select_orientation_source(capabilities, &config.view);
        Self::with_orientation(config, sink, source, orientation)
    }

    pub fn with_orientation(
        config: PanoramaConfig,
        sink: S,
        source: F,
        orientation: Box<dyn OrientationSource>,
    ) -> Result<Self, PanoramaError> {
        let controller = SessionController::new(config, sink)?;
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Ok(Self {
            controller,
            orientation,
            source: Arc::new(source),
            results_tx,
            results_rx,
            grab_task: None,
            shut_down: false,
        })
    }

    pub fn controller(&self) -> &SessionController<S> {
        &self.controller
    }

    pub fn orientation(&self) -> &dyn OrientationSource {
        self.orientation.as_ref()
    }

    pub fn source(&self) -> &F {
        &self.source
    }

    pub fn view(&self) -> ViewPose {
        self.orientation.current_view()
    }

    pub fn status(&self) -> SessionStatus {
        self.controller.status()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.controller.subscribe()
    }

    pub fn handle_input(&mut self, input: &OrientationInput) {
        self.orientation.handle_input(input);
    }

    /// Apply finished captures, then check alignment and start an automatic
    /// capture when the view is on target.
    pub fn tick(&mut self) -> Result<TickReport, PanoramaError> {
        let mut report = TickReport::default();
        while let Ok((ticket, result)) = self.results_rx.try_recv() {
            report
                .outcomes
                .push(self.controller.complete_capture(ticket, result)?);
        }

        let view = self.orientation.current_view();
        if let Some(ticket) = self.controller.tick(&view) {
            self.spawn_grab(ticket);
            report.started = Some(ticket);
        }
        Ok(report)
    }

    /// Manual capture of the next slot. `None` when nothing was started.
    pub fn request_capture(&mut self) -> Option<CaptureTicket> {
        let ticket = self.controller.request_capture()?;
        self.spawn_grab(ticket);
        Some(ticket)
    }

    /// Wait for the capture in flight to finish and apply it. Returns
    /// `None` when nothing is in flight.
    pub async fn wait_for_capture(&mut self) -> Result<Option<CaptureOutcome>, PanoramaError> {
        while self.controller.is_capturing() {
            let Some((ticket, result)) = self.results_rx.recv().await else {
                break;
            };
            match self.controller.complete_capture(ticket, result)? {
                CaptureOutcome::Stale => continue,
                outcome => return Ok(Some(outcome)),
            }
        }
        Ok(None)
    }

    pub fn request_reset(&mut self) -> Result<(), PanoramaError> {
        self.abort_grab();
        self.controller.request_reset()
    }

    /// Stop any grab in flight, clear the scene and release the camera.
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.abort_grab();
        self.controller.shutdown();
        self.source.release();
        log::info!("Panorama session shut down, camera released");
    }

    fn spawn_grab(&mut self, ticket: CaptureTicket) {
        let source = Arc::clone(&self.source);
        let config = self.controller.config().capture.clone();
        let tx = self.results_tx.clone();
        self.grab_task = Some(tokio::spawn(async move {
            let result = grab_patch_texture(source.as_ref(), &config).await;
            if tx.send((ticket, result)).is_err() {
                log::debug!("Session gone before capture of {} finished", ticket.slot);
            }
        }));
    }

    fn abort_grab(&mut self) {
        if let Some(task) = self.grab_task.take() {
            task.abort();
        }
    }
}

impl<F: FrameSource, S: SceneSink> Drop for PanoramaSession<F, S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryScene;
    use crate::session::SessionPhase;
    use crate::testing::SyntheticFrameSource;

    #[tokio::test]
    async fn test_manual_capture_round_trip() {
        let mut session = PanoramaSession::new(
            PanoramaConfig::default(),
            MemoryScene::new(),
            SyntheticFrameSource::new(16, 12),
            PlatformCapabilities::default(),
        )
        .unwrap();

        assert!(session.request_capture().is_some());
        assert!(session.request_capture().is_none());
        let outcome = session.wait_for_capture().await.unwrap();
        assert!(matches!(outcome, Some(CaptureOutcome::Committed { .. })));
        assert_eq!(session.status().phase, SessionPhase::AutoCapturing);
        assert_eq!(session.controller().scene().len(), 1);
        assert_eq!(session.wait_for_capture().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let mut session = PanoramaSession::new(
            PanoramaConfig::default(),
            MemoryScene::new(),
            SyntheticFrameSource::new(16, 12),
            PlatformCapabilities::default(),
        )
        .unwrap();
        session.shutdown();
        session.shutdown();
        assert!(session.controller().is_closed());
        assert!(session.request_capture().is_none());
    }
}
