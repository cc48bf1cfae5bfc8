//! Upload gate: validation, auth, dispatch, navigation.
//!
//! Submission runs a fixed check order so the user always sees the
//! most actionable failure first: title, then authentication, then
//! asset readability. Only a submission that passes every check
//! touches the network, and only a confirmed upload advances the host
//! navigation.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use vmsg_models::{MessageDirection, UploadRequest};
use vmsg_storage::{message_asset_key, MediaStore};

use crate::error::{PipelineError, PipelineResult, ValidationError};

/// Host identity collaborator.
#[cfg_attr(test, mockall::automock)]
pub trait AuthProvider: Send + Sync {
    /// Currently signed-in user id, if any.
    fn current_user(&self) -> Option<String>;
}

/// Host navigation collaborator.
#[cfg_attr(test, mockall::automock)]
pub trait HostNavigator: Send + Sync {
    /// Move past the compose screen after a confirmed send.
    fn advance(&self);
}

/// Receipt for a completed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Remote URL of the stored asset
    pub remote_url: String,
    pub request: UploadRequest,
}

/// Validates and dispatches one message submission at a time.
pub struct UploadGate {
    store: Arc<dyn MediaStore>,
    auth: Arc<dyn AuthProvider>,
    navigator: Arc<dyn HostNavigator>,
    busy: AtomicBool,
    last_remote: Mutex<Option<String>>,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl UploadGate {
    pub fn new(
        store: Arc<dyn MediaStore>,
        auth: Arc<dyn AuthProvider>,
        navigator: Arc<dyn HostNavigator>,
    ) -> Self {
        Self {
            store,
            auth,
            navigator,
            busy: AtomicBool::new(false),
            last_remote: Mutex::new(None),
        }
    }

    /// Whether a submission is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Remote URL of the last confirmed upload, if any.
    pub fn last_remote_url(&self) -> Option<String> {
        self.last_remote.lock().ok().and_then(|g| g.clone())
    }

    /// Validate and send one message asset.
    ///
    /// Checks run in order; the first failure is returned and nothing
    /// is uploaded. Repeated confirmation taps while a submission is
    /// in flight get [`PipelineError::UploadBusy`].
    pub async fn submit(
        &self,
        title: &str,
        asset: &Path,
        duration_ms: Option<u64>,
    ) -> PipelineResult<SendReceipt> {
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }

        let Some(user_id) = self.auth.current_user() else {
            return Err(PipelineError::Unauthenticated);
        };

        let file_size_bytes = match tokio::fs::metadata(asset).await {
            Ok(meta) if meta.is_file() => Some(meta.len()),
            _ => {
                warn!(asset = %asset.display(), "Submission rejected, asset unreadable");
                return Err(ValidationError::AssetUnreadable.into());
            }
        };

        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PipelineError::UploadBusy)?;
        let _guard = BusyGuard(&self.busy);

        let key = message_asset_key();
        let request = UploadRequest {
            title: title.trim().to_string(),
            asset_uri: asset.to_path_buf(),
            duration_seconds: duration_ms.map(|ms| (ms + 500) / 1000),
            file_size_bytes,
            direction: MessageDirection::Sent,
        };

        info!(user_id = %user_id, key = %key, "Dispatching message upload");
        let remote_url = self.store.upload_file(asset, &key, "video/mp4").await?;

        if let Ok(mut last) = self.last_remote.lock() {
            *last = Some(remote_url.clone());
        }
        self.navigator.advance();
        info!(url = %remote_url, "Message sent");

        Ok(SendReceipt { remote_url, request })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tempfile::NamedTempFile;
    use vmsg_storage::{StorageError, StorageResult};

    /// In-memory store recording every dispatched upload.
    struct FakeStore {
        uploads: Mutex<Vec<(String, String)>>,
        fail: bool,
        block: Option<tokio::sync::Notify>,
    }

    impl FakeStore {
        fn new() -> Arc<Self> {
            Arc::new(Self { uploads: Mutex::new(Vec::new()), fail: false, block: None })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { uploads: Mutex::new(Vec::new()), fail: true, block: None })
        }

        fn blocking() -> Arc<Self> {
            Arc::new(Self {
                uploads: Mutex::new(Vec::new()),
                fail: false,
                block: Some(tokio::sync::Notify::new()),
            })
        }

        fn uploads(&self) -> Vec<(String, String)> {
            self.uploads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MediaStore for FakeStore {
        async fn upload_file(
            &self,
            _path: &Path,
            key: &str,
            content_type: &str,
        ) -> StorageResult<String> {
            if let Some(block) = &self.block {
                block.notified().await;
            }
            if self.fail {
                return Err(StorageError::upload_failed("connection reset"));
            }
            self.uploads
                .lock()
                .unwrap()
                .push((key.to_string(), content_type.to_string()));
            Ok(format!("https://cdn.example.com/{key}"))
        }
    }

    fn signed_in() -> Arc<dyn AuthProvider> {
        let mut auth = MockAuthProvider::new();
        auth.expect_current_user().returning(|| Some("user-1".into()));
        Arc::new(auth)
    }

    /// Navigator counting advances; the gate must call it exactly once
    /// per confirmed send and never on failure.
    struct CountingNavigator(AtomicUsize);

    impl HostNavigator for CountingNavigator {
        fn advance(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn gate_with(
        store: Arc<dyn MediaStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> (UploadGate, Arc<CountingNavigator>) {
        let navigator = Arc::new(CountingNavigator(AtomicUsize::new(0)));
        (
            UploadGate::new(store, auth, Arc::clone(&navigator) as Arc<dyn HostNavigator>),
            navigator,
        )
    }

    #[tokio::test]
    async fn test_blank_title_rejected_before_any_dispatch() {
        let store = FakeStore::new();
        let (gate, navigator) = gate_with(Arc::clone(&store) as Arc<dyn MediaStore>, signed_in());

        let err = gate.submit("   ", Path::new("/tmp/a.mp4"), None).await.unwrap_err();
        assert_eq!(err.to_string(), "Add a title before sending");
        assert!(store.uploads().is_empty());
        assert_eq!(navigator.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_signed_out_user_rejected_after_title_check() {
        let store = FakeStore::new();
        let mut auth = MockAuthProvider::new();
        auth.expect_current_user().returning(|| None);
        let (gate, _) = gate_with(Arc::clone(&store) as Arc<dyn MediaStore>, Arc::new(auth));

        // Title check comes first even when auth would also fail
        let err = gate.submit("", Path::new("/tmp/a.mp4"), None).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(ValidationError::EmptyTitle)));

        let err = gate.submit("Hi Grandma", Path::new("/tmp/a.mp4"), None).await.unwrap_err();
        assert!(matches!(err, PipelineError::Unauthenticated));
        assert!(store.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_missing_asset_rejected() {
        let (gate, navigator) = gate_with(FakeStore::new(), signed_in());

        let err = gate
            .submit("Hi", Path::new("/nonexistent/raw.mp4"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(ValidationError::AssetUnreadable)));
        assert_eq!(navigator.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_submission_uploads_and_advances_once() {
        let asset = NamedTempFile::new().unwrap();
        std::fs::write(asset.path(), b"video").unwrap();

        let store = FakeStore::new();
        let (gate, navigator) = gate_with(Arc::clone(&store) as Arc<dyn MediaStore>, signed_in());

        let receipt = gate
            .submit("  Hi Grandma  ", asset.path(), Some(12_400))
            .await
            .unwrap();

        assert_eq!(receipt.request.title, "Hi Grandma");
        assert_eq!(receipt.request.duration_seconds, Some(12));
        assert_eq!(receipt.request.file_size_bytes, Some(5));
        assert_eq!(receipt.request.direction, MessageDirection::Sent);
        assert!(receipt.remote_url.starts_with("https://cdn.example.com/messages/"));

        let uploads = store.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].1, "video/mp4");
        assert_eq!(navigator.0.load(Ordering::SeqCst), 1);
        assert_eq!(gate.last_remote_url(), Some(receipt.remote_url));
    }

    #[tokio::test]
    async fn test_second_tap_rejected_while_upload_in_flight() {
        let asset = NamedTempFile::new().unwrap();
        std::fs::write(asset.path(), b"video").unwrap();

        let store = FakeStore::blocking();
        let (gate, _) = gate_with(Arc::clone(&store) as Arc<dyn MediaStore>, signed_in());
        let gate = Arc::new(gate);

        let first = {
            let gate = Arc::clone(&gate);
            let path = asset.path().to_path_buf();
            tokio::spawn(async move { gate.submit("Hi", &path, None).await })
        };

        while !gate.is_busy() {
            tokio::task::yield_now().await;
        }

        let second = gate.submit("Hi", asset.path(), None).await;
        assert!(matches!(second, Err(PipelineError::UploadBusy)));

        store.block.as_ref().unwrap().notify_one();
        first.await.unwrap().unwrap();
        assert!(!gate.is_busy(), "busy flag released after completion");
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_and_does_not_advance() {
        let asset = NamedTempFile::new().unwrap();
        std::fs::write(asset.path(), b"video").unwrap();

        let (gate, navigator) = gate_with(FakeStore::failing(), signed_in());

        let err = gate.submit("Hi", asset.path(), None).await.unwrap_err();
        assert!(matches!(err, PipelineError::Upload(_)));
        assert!(err.is_retryable());
        assert_eq!(navigator.0.load(Ordering::SeqCst), 0);
        assert!(gate.last_remote_url().is_none());
        assert!(!gate.is_busy(), "busy flag released after failure");
    }
}
