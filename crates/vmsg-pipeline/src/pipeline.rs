//! End-to-end pipeline orchestration.
//!
//! [`MessagePipeline`] wires the capture, edit, export, and upload
//! stages together for the host UI: it gates capture on permissions,
//! runs the export ladder on confirmation, and hands the final asset
//! to the upload gate. Export failure degrades to sending the original
//! recording rather than blocking the send.

use std::sync::Arc;

use tracing::{debug, info, warn};

use vmsg_capture::{PermissionCoordinator, PermissionState};
use vmsg_media::{probe_video, ExportOutcome, TranscodeEngine, VideoInfo};

use crate::config::PipelineConfig;
use crate::edit::EditSession;
use crate::error::{PipelineError, PipelineResult};
use crate::gate::{SendReceipt, UploadGate};
use crate::notice::{Notice, NoticeSink};

/// Owns the stage collaborators for one compose flow.
pub struct MessagePipeline {
    permissions: Arc<PermissionCoordinator>,
    engine: TranscodeEngine,
    gate: Arc<UploadGate>,
    notices: NoticeSink,
    config: PipelineConfig,
}

impl MessagePipeline {
    pub fn new(
        permissions: Arc<PermissionCoordinator>,
        engine: TranscodeEngine,
        gate: Arc<UploadGate>,
        notices: NoticeSink,
        config: PipelineConfig,
    ) -> Self {
        Self { permissions, engine, gate, notices, config }
    }

    /// Build with a feature-detected encoder; the configured scratch
    /// directory and per-attempt timeout are handed to the engine.
    pub fn with_detected_encoder(
        permissions: Arc<PermissionCoordinator>,
        gate: Arc<UploadGate>,
        notices: NoticeSink,
        config: PipelineConfig,
    ) -> Self {
        let engine = TranscodeEngine::detect(config.scratch_dir.clone(), config.encode_timeout_secs);
        Self::new(permissions, engine, gate, notices, config)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Probe the recorded source and give the edit session its
    /// authoritative duration.
    ///
    /// Best-effort: without ffprobe, or on a probe failure, the
    /// player's status report remains the duration source.
    pub async fn attach_source_info(&self, session: &mut EditSession) -> Option<VideoInfo> {
        match probe_video(session.source()).await {
            Ok(info) => {
                debug!(
                    duration_ms = info.duration_ms(),
                    width = info.width,
                    height = info.height,
                    "Probed recorded source"
                );
                session.attach_duration(info.duration_ms());
                Some(info)
            }
            Err(e) => {
                warn!(error = %e, "Probe unavailable, deferring duration to the player");
                None
            }
        }
    }

    /// Check and request capture permissions before showing the camera.
    ///
    /// Returns the state either way; a missing grant publishes the
    /// persistent open-settings notice and fails so the host does not
    /// open the capture screen.
    pub async fn prepare_capture(&self) -> PipelineResult<PermissionState> {
        let state = self.permissions.ensure(true).await;
        if !state.all_granted() {
            let err = PipelineError::PermissionDenied;
            self.notices.publish_error(&err);
            return Err(err);
        }
        Ok(state)
    }

    /// Re-observe permissions when the host returns to foreground.
    ///
    /// Observe-only: the OS may have revoked grants while backgrounded,
    /// but an in-flight recording must not be interrupted by a prompt.
    pub async fn on_foreground(&self) -> PermissionState {
        self.permissions.resync().await
    }

    /// Export the edited session and send it.
    ///
    /// A degraded export (edits could not be applied) still sends the
    /// original recording and tells the user; an upload failure keeps
    /// the session intact so the same submission can be retried.
    pub async fn confirm_and_send(
        &self,
        session: &EditSession,
        title: &str,
    ) -> PipelineResult<SendReceipt> {
        let request = session
            .export_request()
            .ok_or_else(|| PipelineError::playback("Clip duration not yet known"))?;

        let outcome = match self.engine.export(&request).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let err = PipelineError::from(err);
                self.notices.publish_error(&err);
                return Err(err);
            }
        };

        if outcome.is_degraded() {
            warn!("Edits could not be applied, sending the original recording");
            self.notices
                .publish(Notice::warning("Couldn't apply edits, sending the original video"));
        }

        let duration_ms = match &outcome {
            // Trimmed output is shorter than the session's duration
            ExportOutcome::Encoded { .. } if request.is_trimmed() => {
                Some(request.trim_end_ms - request.trim_start_ms)
            }
            _ => Some(request.duration_ms),
        };

        match self.gate.submit(title, outcome.asset_path(), duration_ms).await {
            Ok(receipt) => {
                info!(url = %receipt.remote_url, "Message pipeline complete");
                Ok(receipt)
            }
            Err(err) => {
                self.notices.publish_error(&err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::{NamedTempFile, TempDir};

    use vmsg_capture::{Capability, GrantStatus, PermissionsApi};
    use vmsg_media::{EncoderBackend, MediaResult};
    use vmsg_models::{CropAspect, TranscodeJob};
    use vmsg_storage::{MediaStore, StorageResult};

    use crate::gate::{HostNavigator, MockAuthProvider};
    use crate::notice::{NoticeKind, Remediation};

    struct RecordingStore(Mutex<Vec<String>>);

    #[async_trait]
    impl MediaStore for RecordingStore {
        async fn upload_file(
            &self,
            path: &Path,
            key: &str,
            _content_type: &str,
        ) -> StorageResult<String> {
            self.0.lock().unwrap().push(path.display().to_string());
            Ok(format!("https://cdn.example.com/{key}"))
        }
    }

    struct OkBackend;

    #[async_trait]
    impl EncoderBackend for OkBackend {
        async fn encode(&self, job: &TranscodeJob) -> MediaResult<()> {
            std::fs::write(&job.output, b"encoded").unwrap();
            Ok(())
        }
    }

    struct CountingNavigator(AtomicUsize);

    impl HostNavigator for CountingNavigator {
        fn advance(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct StaticPermissions(GrantStatus);

    #[async_trait]
    impl PermissionsApi for StaticPermissions {
        async fn status(&self, _capability: Capability) -> GrantStatus {
            self.0
        }

        async fn request(&self, _capability: Capability) -> GrantStatus {
            self.0
        }
    }

    fn permissions(granted: bool) -> Arc<PermissionCoordinator> {
        let status = if granted { GrantStatus::Granted } else { GrantStatus::Denied };
        Arc::new(PermissionCoordinator::new(Arc::new(StaticPermissions(status))))
    }

    struct Harness {
        pipeline: MessagePipeline,
        store: Arc<RecordingStore>,
        navigator: Arc<CountingNavigator>,
        notices: tokio::sync::mpsc::UnboundedReceiver<Notice>,
        _scratch: TempDir,
    }

    fn harness(backend: Option<Arc<dyn EncoderBackend>>, granted: bool) -> Harness {
        let scratch = TempDir::new().unwrap();
        let store = Arc::new(RecordingStore(Mutex::new(Vec::new())));
        let navigator = Arc::new(CountingNavigator(AtomicUsize::new(0)));
        let mut auth = MockAuthProvider::new();
        auth.expect_current_user().returning(|| Some("user-1".into()));

        let gate = Arc::new(UploadGate::new(
            Arc::clone(&store) as Arc<dyn MediaStore>,
            Arc::new(auth),
            Arc::clone(&navigator) as Arc<dyn HostNavigator>,
        ));
        let (sink, rx) = NoticeSink::channel();
        let pipeline = MessagePipeline::new(
            permissions(granted),
            TranscodeEngine::new(backend, scratch.path()),
            gate,
            sink,
            PipelineConfig::default(),
        );
        Harness { pipeline, store, navigator, notices: rx, _scratch: scratch }
    }

    fn session_for(asset: &Path, duration_ms: u64) -> EditSession {
        let mut session = EditSession::new(asset);
        session.attach_duration(duration_ms);
        session
    }

    #[tokio::test]
    async fn test_prepare_capture_blocks_without_grants() {
        let mut harness = harness(None, false);

        let err = harness.pipeline.prepare_capture().await.unwrap_err();
        assert!(matches!(err, PipelineError::PermissionDenied));

        let notice = harness.notices.recv().await.unwrap();
        assert!(!notice.dismissible);
        assert_eq!(notice.remediation, Some(Remediation::OpenSettings));
    }

    #[tokio::test]
    async fn test_prepare_capture_passes_with_grants() {
        let harness = harness(None, true);
        let state = harness.pipeline.prepare_capture().await.unwrap();
        assert!(state.all_granted());
    }

    #[tokio::test]
    async fn test_untouched_recording_uploads_source_directly() {
        let asset = NamedTempFile::new().unwrap();
        std::fs::write(asset.path(), b"video").unwrap();
        let harness = harness(Some(Arc::new(OkBackend)), true);

        let session = session_for(asset.path(), 10_000);
        let receipt = harness
            .pipeline
            .confirm_and_send(&session, "Hi Grandma")
            .await
            .unwrap();

        assert_eq!(receipt.request.duration_seconds, Some(10));
        let uploads = harness.store.0.lock().unwrap().clone();
        assert_eq!(uploads, vec![asset.path().display().to_string()]);
        assert_eq!(harness.navigator.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_edited_recording_uploads_encoded_output() {
        let asset = NamedTempFile::new().unwrap();
        std::fs::write(asset.path(), b"video").unwrap();
        let harness = harness(Some(Arc::new(OkBackend)), true);

        let mut session = session_for(asset.path(), 10_000);
        session.set_trim_start(2_000);
        session.set_trim_end(7_000);
        session.crop_aspect = CropAspect::Square;

        let receipt = harness
            .pipeline
            .confirm_and_send(&session, "Hi Grandma")
            .await
            .unwrap();

        // Trimmed window, not the full clip
        assert_eq!(receipt.request.duration_seconds, Some(5));
        let uploads = harness.store.0.lock().unwrap().clone();
        assert_eq!(uploads.len(), 1);
        assert_ne!(uploads[0], asset.path().display().to_string());
    }

    #[tokio::test]
    async fn test_degraded_export_still_sends_with_notice() {
        let asset = NamedTempFile::new().unwrap();
        std::fs::write(asset.path(), b"video").unwrap();
        // No encoder available, but the session carries edits
        let mut harness = harness(None, true);

        let mut session = session_for(asset.path(), 10_000);
        session.crop_aspect = CropAspect::Square;

        harness
            .pipeline
            .confirm_and_send(&session, "Hi Grandma")
            .await
            .unwrap();

        let notice = harness.notices.recv().await.unwrap();
        assert_eq!(notice.kind, NoticeKind::Warning);
        assert!(notice.message.contains("original"));

        let uploads = harness.store.0.lock().unwrap().clone();
        assert_eq!(uploads, vec![asset.path().display().to_string()]);
    }

    #[tokio::test]
    async fn test_gate_rejection_publishes_notice_and_preserves_session() {
        let asset = NamedTempFile::new().unwrap();
        std::fs::write(asset.path(), b"video").unwrap();
        let mut harness = harness(Some(Arc::new(OkBackend)), true);

        let session = session_for(asset.path(), 10_000);
        // Blank title trips the gate before any upload
        let err = harness
            .pipeline
            .confirm_and_send(&session, "")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));

        let notice = harness.notices.recv().await.unwrap();
        assert_eq!(notice.message, "Add a title before sending");
        assert_eq!(harness.navigator.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_probe_failure_defers_duration_to_player() {
        let harness = harness(None, true);
        let mut session = EditSession::new("/nonexistent/raw.mp4");

        let info = harness.pipeline.attach_source_info(&mut session).await;
        assert!(info.is_none());
        assert!(
            session.duration_ms().is_none(),
            "a failed probe must not invent a duration"
        );
    }

    #[tokio::test]
    async fn test_detected_encoder_pipeline_carries_config() {
        let scratch = TempDir::new().unwrap();
        let store = Arc::new(RecordingStore(Mutex::new(Vec::new())));
        let mut auth = MockAuthProvider::new();
        auth.expect_current_user().returning(|| Some("user-1".into()));
        let gate = Arc::new(UploadGate::new(
            Arc::clone(&store) as Arc<dyn MediaStore>,
            Arc::new(auth),
            Arc::new(CountingNavigator(AtomicUsize::new(0))) as Arc<dyn HostNavigator>,
        ));
        let (sink, _rx) = NoticeSink::channel();

        let config = PipelineConfig {
            scratch_dir: scratch.path().to_path_buf(),
            encode_timeout_secs: 45,
            ..PipelineConfig::default()
        };
        let pipeline =
            MessagePipeline::with_detected_encoder(permissions(true), gate, sink, config);

        assert_eq!(pipeline.config().encode_timeout_secs, 45);
        assert_eq!(pipeline.config().scratch_dir, scratch.path());
    }

    #[tokio::test]
    async fn test_unloaded_session_cannot_be_sent() {
        let harness = harness(None, true);
        let session = EditSession::new("/tmp/raw.mp4");

        let err = harness
            .pipeline
            .confirm_and_send(&session, "Hi")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Playback(_)));
    }
}
