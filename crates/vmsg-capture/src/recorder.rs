//! Capture controller and its event loop.
//!
//! The native recording callbacks (finished/error) and the UI gestures
//! (hold-to-record start, release stop, retake) are all folded into one
//! [`CaptureEvent`] type applied by [`CaptureController::apply`], so
//! every state transition lives in a single match. The controller is
//! synchronous and deterministic; [`CaptureLoop`] supplies the 100 ms
//! ticker and the hardware channel around it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use vmsg_models::{RecordingSession, RecordingStatus, TICK_INTERVAL_MS};

use crate::error::{CaptureError, CaptureResult};
use crate::permissions::PermissionState;

/// Events reported by the camera hardware collaborator.
#[derive(Debug, Clone)]
pub enum HardwareEvent {
    /// Recording finished and was written to the given path
    Finished(PathBuf),
    /// Device-level failure, independent of any stop call
    Error(String),
}

/// Camera hardware collaborator.
///
/// `start_recording` is asynchronous and callback-driven: completion
/// and failure arrive later as [`HardwareEvent`]s on the given channel,
/// possibly well after `stop_recording` was called.
pub trait CameraApi: Send + Sync {
    /// Whether the device and format have been selected and the camera
    /// reported ready.
    fn is_ready(&self) -> bool;

    /// Begin recording; events are delivered on `events`.
    fn start_recording(&self, events: mpsc::UnboundedSender<HardwareEvent>) -> CaptureResult<()>;

    /// Request the hardware to finish the current recording.
    fn stop_recording(&self);
}

/// Why a stop was issued. Auto-stop must behave identically to a user
/// stop; the reason exists for logging and teardown handling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    User,
    AutoStop,
    Teardown,
}

/// All inputs to the capture state machine.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// User began the hold-to-record gesture
    Start,
    /// One elapsed-time tick
    Tick { delta_ms: u64 },
    /// Stop requested (user release, auto-stop, or teardown)
    Stop(StopReason),
    /// Callback from the camera hardware
    Hardware(HardwareEvent),
}

/// Side effects the driver must carry out after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEffect {
    /// Ask the hardware to start recording
    StartHardware,
    /// Ask the hardware to finish the recording
    StopHardware,
    /// A raw source asset is available; seeds the edit session
    SourceReady(PathBuf),
    /// Transient hardware failure: session reverted to idle
    RevertedToIdle { message: String },
}

/// The `idle -> recording -> stopped -> idle` capture state machine.
#[derive(Debug)]
pub struct CaptureController {
    session: RecordingSession,
    permissions: PermissionState,
    camera_ready: bool,
}

impl CaptureController {
    pub fn new() -> Self {
        Self {
            session: RecordingSession::new(),
            permissions: PermissionState::default(),
            camera_ready: false,
        }
    }

    #[cfg(test)]
    fn with_session(session: RecordingSession) -> Self {
        Self {
            session,
            permissions: PermissionState::default(),
            camera_ready: false,
        }
    }

    /// Update the permission snapshot (from the coordinator).
    pub fn set_permissions(&mut self, permissions: PermissionState) {
        self.permissions = permissions;
    }

    /// Record whether the camera hardware has reported ready.
    pub fn set_camera_ready(&mut self, ready: bool) {
        self.camera_ready = ready;
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    /// Discard the session for a retake.
    pub fn retake(&mut self) {
        debug!("Retake: discarding recording session");
        self.session.reset();
    }

    /// Apply one event, returning the effects the driver must run.
    ///
    /// Only `Start` can fail; every other event is absorbed (possibly
    /// as a no-op) so stale ticks and late hardware callbacks are
    /// harmless.
    pub fn apply(&mut self, event: CaptureEvent) -> CaptureResult<Vec<CaptureEffect>> {
        match event {
            CaptureEvent::Start => self.handle_start(),
            CaptureEvent::Tick { delta_ms } => Ok(self.handle_tick(delta_ms)),
            CaptureEvent::Stop(reason) => Ok(self.handle_stop(reason)),
            CaptureEvent::Hardware(hw) => Ok(self.handle_hardware(hw)),
        }
    }

    fn handle_start(&mut self) -> CaptureResult<Vec<CaptureEffect>> {
        if !self.permissions.all_granted() {
            return Err(CaptureError::PermissionMissing);
        }
        if !self.camera_ready {
            return Err(CaptureError::CameraNotReady);
        }
        if !self.session.begin() {
            return Err(CaptureError::AlreadyRecording);
        }
        info!(max_ms = self.session.max_duration_ms, "Recording started");
        Ok(vec![CaptureEffect::StartHardware])
    }

    fn handle_tick(&mut self, delta_ms: u64) -> Vec<CaptureEffect> {
        if self.session.tick(delta_ms) {
            info!(elapsed_ms = self.session.elapsed_ms, "Max duration reached, auto-stopping");
            return vec![CaptureEffect::StopHardware];
        }
        Vec::new()
    }

    fn handle_stop(&mut self, reason: StopReason) -> Vec<CaptureEffect> {
        // Idempotent: stopping outside `Recording` is a no-op
        if !self.session.stop() {
            return Vec::new();
        }
        info!(?reason, elapsed_ms = self.session.elapsed_ms, "Recording stopped");
        vec![CaptureEffect::StopHardware]
    }

    fn handle_hardware(&mut self, event: HardwareEvent) -> Vec<CaptureEffect> {
        match event {
            HardwareEvent::Finished(path) => {
                if self.session.status == RecordingStatus::Idle {
                    // Late callback after an error revert or retake
                    warn!(path = %path.display(), "Dropping hardware result for discarded session");
                    return Vec::new();
                }
                // The hardware may finish on its own; fold that into a stop
                self.session.stop();
                info!(path = %path.display(), "Source asset ready");
                vec![CaptureEffect::SourceReady(path)]
            }
            HardwareEvent::Error(message) => {
                warn!(%message, "Hardware error, reverting to idle");
                self.session.reset();
                vec![CaptureEffect::RevertedToIdle { message }]
            }
        }
    }
}

impl Default for CaptureController {
    fn default() -> Self {
        Self::new()
    }
}

/// Commands from the capture screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCommand {
    Start,
    Stop,
    Retake,
    /// Screen teardown: cancel the ticker, stop any in-flight recording
    Teardown,
}

/// Outputs consumed by the pipeline and the capture screen.
#[derive(Debug, Clone)]
pub enum CaptureOutput {
    /// Elapsed time while recording, for the progress indicator
    Elapsed { elapsed_ms: u64 },
    /// A raw source asset was produced
    SourceReady(PathBuf),
    /// Start was rejected or the hardware failed; transient notice
    Failed(String),
}

/// Async driver: owns the ticker and the hardware event channel.
pub struct CaptureLoop {
    camera: Arc<dyn CameraApi>,
    controller: CaptureController,
    hw_tx: mpsc::UnboundedSender<HardwareEvent>,
    hw_rx: mpsc::UnboundedReceiver<HardwareEvent>,
}

impl CaptureLoop {
    pub fn new(camera: Arc<dyn CameraApi>, permissions: PermissionState) -> Self {
        let (hw_tx, hw_rx) = mpsc::unbounded_channel();
        let mut controller = CaptureController::new();
        controller.set_permissions(permissions);
        controller.set_camera_ready(camera.is_ready());
        Self { camera, controller, hw_tx, hw_rx }
    }

    /// Run until teardown. The ticker fires every 100 ms; ticks outside
    /// `Recording` are absorbed by the session.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<CaptureCommand>,
        outputs: mpsc::UnboundedSender<CaptureOutput>,
    ) {
        let mut ticker = tokio::time::interval(Duration::from_millis(TICK_INTERVAL_MS));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = commands.recv() => {
                    let cmd = cmd.unwrap_or(CaptureCommand::Teardown);
                    match cmd {
                        CaptureCommand::Start => {
                            match self.controller.apply(CaptureEvent::Start) {
                                Ok(effects) => self.run_effects(effects, &outputs),
                                Err(e) => {
                                    let _ = outputs.send(CaptureOutput::Failed(e.to_string()));
                                }
                            }
                        }
                        CaptureCommand::Stop => {
                            let effects = self
                                .controller
                                .apply(CaptureEvent::Stop(StopReason::User))
                                .unwrap_or_default();
                            self.run_effects(effects, &outputs);
                        }
                        CaptureCommand::Retake => self.controller.retake(),
                        CaptureCommand::Teardown => {
                            if self.controller.session().is_recording() {
                                let effects = self
                                    .controller
                                    .apply(CaptureEvent::Stop(StopReason::Teardown))
                                    .unwrap_or_default();
                                self.run_effects(effects, &outputs);
                            }
                            debug!("Capture loop torn down");
                            break;
                        }
                    }
                }
                _ = ticker.tick() => {
                    let effects = self
                        .controller
                        .apply(CaptureEvent::Tick { delta_ms: TICK_INTERVAL_MS })
                        .unwrap_or_default();
                    self.run_effects(effects, &outputs);
                    if self.controller.session().is_recording() {
                        let _ = outputs.send(CaptureOutput::Elapsed {
                            elapsed_ms: self.controller.session().elapsed_ms,
                        });
                    }
                }
                Some(hw) = self.hw_rx.recv() => {
                    let effects = self
                        .controller
                        .apply(CaptureEvent::Hardware(hw))
                        .unwrap_or_default();
                    self.run_effects(effects, &outputs);
                }
            }
        }
    }

    fn run_effects(
        &mut self,
        effects: Vec<CaptureEffect>,
        outputs: &mpsc::UnboundedSender<CaptureOutput>,
    ) {
        for effect in effects {
            match effect {
                CaptureEffect::StartHardware => {
                    if let Err(e) = self.camera.start_recording(self.hw_tx.clone()) {
                        // Fold the synchronous failure into the same path
                        // as an async hardware error
                        let effects = self
                            .controller
                            .apply(CaptureEvent::Hardware(HardwareEvent::Error(e.to_string())))
                            .unwrap_or_default();
                        self.run_effects(effects, outputs);
                    }
                }
                CaptureEffect::StopHardware => self.camera.stop_recording(),
                CaptureEffect::SourceReady(path) => {
                    let _ = outputs.send(CaptureOutput::SourceReady(path));
                }
                CaptureEffect::RevertedToIdle { message } => {
                    let _ = outputs.send(CaptureOutput::Failed(message));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn ready_controller() -> CaptureController {
        let mut controller = CaptureController::new();
        controller.set_permissions(PermissionState { camera: true, microphone: true });
        controller.set_camera_ready(true);
        controller
    }

    #[test]
    fn test_start_rejected_without_permissions() {
        let mut controller = CaptureController::new();
        controller.set_camera_ready(true);
        assert!(matches!(
            controller.apply(CaptureEvent::Start),
            Err(CaptureError::PermissionMissing)
        ));
        assert_eq!(controller.session().status, RecordingStatus::Idle);
    }

    #[test]
    fn test_start_rejected_without_camera_ready() {
        let mut controller = CaptureController::new();
        controller.set_permissions(PermissionState { camera: true, microphone: true });
        assert!(matches!(
            controller.apply(CaptureEvent::Start),
            Err(CaptureError::CameraNotReady)
        ));
    }

    #[test]
    fn test_start_records_and_emits_hardware_start() {
        let mut controller = ready_controller();
        let effects = controller.apply(CaptureEvent::Start).unwrap();
        assert_eq!(effects, vec![CaptureEffect::StartHardware]);
        assert!(controller.session().is_recording());
    }

    #[test]
    fn test_auto_stop_matches_user_stop() {
        let mut auto = CaptureController::with_session(RecordingSession::with_max_duration(200));
        auto.set_permissions(PermissionState { camera: true, microphone: true });
        auto.set_camera_ready(true);
        auto.apply(CaptureEvent::Start).unwrap();
        assert!(auto.apply(CaptureEvent::Tick { delta_ms: 100 }).unwrap().is_empty());
        let auto_effects = auto.apply(CaptureEvent::Tick { delta_ms: 100 }).unwrap();

        let mut user = ready_controller();
        user.apply(CaptureEvent::Start).unwrap();
        let user_effects = user.apply(CaptureEvent::Stop(StopReason::User)).unwrap();

        assert_eq!(auto_effects, user_effects);
        assert_eq!(auto.session().status, RecordingStatus::Stopped);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut controller = ready_controller();
        assert!(controller.apply(CaptureEvent::Stop(StopReason::User)).unwrap().is_empty());

        controller.apply(CaptureEvent::Start).unwrap();
        assert_eq!(
            controller.apply(CaptureEvent::Stop(StopReason::User)).unwrap(),
            vec![CaptureEffect::StopHardware]
        );
        assert!(controller.apply(CaptureEvent::Stop(StopReason::User)).unwrap().is_empty());
    }

    #[test]
    fn test_hardware_finish_yields_source() {
        let mut controller = ready_controller();
        controller.apply(CaptureEvent::Start).unwrap();
        controller.apply(CaptureEvent::Stop(StopReason::User)).unwrap();

        let effects = controller
            .apply(CaptureEvent::Hardware(HardwareEvent::Finished("/tmp/raw.mp4".into())))
            .unwrap();
        assert_eq!(effects, vec![CaptureEffect::SourceReady("/tmp/raw.mp4".into())]);
    }

    #[test]
    fn test_hardware_error_reverts_to_idle() {
        let mut controller = ready_controller();
        controller.apply(CaptureEvent::Start).unwrap();

        let effects = controller
            .apply(CaptureEvent::Hardware(HardwareEvent::Error("device lost".into())))
            .unwrap();
        assert_eq!(
            effects,
            vec![CaptureEffect::RevertedToIdle { message: "device lost".into() }]
        );
        assert_eq!(controller.session().status, RecordingStatus::Idle);

        // Retry is allowed immediately
        assert!(controller.apply(CaptureEvent::Start).is_ok());
    }

    #[test]
    fn test_late_finish_after_error_is_dropped() {
        let mut controller = ready_controller();
        controller.apply(CaptureEvent::Start).unwrap();
        controller
            .apply(CaptureEvent::Hardware(HardwareEvent::Error("oops".into())))
            .unwrap();

        let effects = controller
            .apply(CaptureEvent::Hardware(HardwareEvent::Finished("/tmp/stale.mp4".into())))
            .unwrap();
        assert!(effects.is_empty());
    }

    /// Camera double: records calls and replays the finished callback
    /// on stop, like the real device does.
    struct FakeCamera {
        events: Mutex<Option<mpsc::UnboundedSender<HardwareEvent>>>,
        output: PathBuf,
    }

    impl FakeCamera {
        fn new(output: impl Into<PathBuf>) -> Self {
            Self { events: Mutex::new(None), output: output.into() }
        }
    }

    impl CameraApi for FakeCamera {
        fn is_ready(&self) -> bool {
            true
        }

        fn start_recording(&self, events: mpsc::UnboundedSender<HardwareEvent>) -> CaptureResult<()> {
            *self.events.lock().unwrap() = Some(events);
            Ok(())
        }

        fn stop_recording(&self) {
            if let Some(events) = self.events.lock().unwrap().take() {
                let _ = events.send(HardwareEvent::Finished(self.output.clone()));
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_auto_stops_and_yields_source() {
        let camera = Arc::new(FakeCamera::new("/tmp/clip.mp4"));
        let permissions = PermissionState { camera: true, microphone: true };
        let capture = CaptureLoop::new(camera, permissions);

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(capture.run(cmd_rx, out_tx));

        cmd_tx.send(CaptureCommand::Start).unwrap();

        // Paused clock: the ticker advances virtually until auto-stop
        let mut source = None;
        while let Some(output) = out_rx.recv().await {
            match output {
                CaptureOutput::SourceReady(path) => {
                    source = Some(path);
                    break;
                }
                CaptureOutput::Elapsed { elapsed_ms } => {
                    assert!(elapsed_ms <= vmsg_models::MAX_RECORDING_MS);
                }
                CaptureOutput::Failed(message) => panic!("unexpected failure: {message}"),
            }
        }
        assert_eq!(source, Some(PathBuf::from("/tmp/clip.mp4")));

        cmd_tx.send(CaptureCommand::Teardown).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreground_resync_leaves_recording_running() {
        use crate::permissions::{GrantStatus, MockPermissionsApi, PermissionCoordinator};

        let camera = Arc::new(FakeCamera::new("/tmp/clip.mp4"));
        let permissions = PermissionState { camera: true, microphone: true };
        let capture = CaptureLoop::new(camera, permissions);

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(capture.run(cmd_rx, out_tx));

        cmd_tx.send(CaptureCommand::Start).unwrap();
        match out_rx.recv().await.unwrap() {
            CaptureOutput::Elapsed { .. } => {}
            other => panic!("expected recording to be running: {other:?}"),
        }

        // The OS revoked grants while backgrounded; the foreground
        // resync observes the new state without prompting and without
        // touching the capture loop.
        let mut api = MockPermissionsApi::new();
        api.expect_status().returning(|_| GrantStatus::Denied);
        let coordinator = PermissionCoordinator::new(Arc::new(api));
        let state = coordinator.resync().await;
        assert!(!state.all_granted());

        // The in-flight recording keeps ticking
        for _ in 0..3 {
            match out_rx.recv().await.unwrap() {
                CaptureOutput::Elapsed { .. } => {}
                other => panic!("recording was interrupted by resync: {other:?}"),
            }
        }

        cmd_tx.send(CaptureCommand::Teardown).unwrap();
        handle.await.unwrap();
    }
}
