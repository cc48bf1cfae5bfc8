//! Permission coordination for camera and microphone.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Hardware capabilities the capture flow depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Camera,
    Microphone,
}

/// OS-level grant status for a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantStatus {
    Granted,
    Denied,
    Undetermined,
}

/// OS permission API collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionsApi: Send + Sync {
    /// Read the current grant status without prompting.
    async fn status(&self, capability: Capability) -> GrantStatus;

    /// Actively request the capability from the user.
    async fn request(&self, capability: Capability) -> GrantStatus;
}

/// Snapshot of both grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionState {
    pub camera: bool,
    pub microphone: bool,
}

impl PermissionState {
    /// Both capabilities granted; precondition for the capture flow.
    pub fn all_granted(&self) -> bool {
        self.camera && self.microphone
    }
}

/// Gates hardware access behind camera and microphone grants.
///
/// Publishes every observed state over a watch channel so the UI can
/// keep a persistent notice (with an open-settings remediation) visible
/// while either capability is missing. Failure is not retried
/// automatically; the host re-runs [`PermissionCoordinator::resync`]
/// on foreground because the OS may have changed grants while the app
/// was backgrounded.
pub struct PermissionCoordinator {
    api: Arc<dyn PermissionsApi>,
    state_tx: watch::Sender<PermissionState>,
}

impl PermissionCoordinator {
    pub fn new(api: Arc<dyn PermissionsApi>) -> Self {
        let (state_tx, _) = watch::channel(PermissionState::default());
        Self { api, state_tx }
    }

    /// Read both grants, requesting missing ones when
    /// `request_if_missing` is set.
    pub async fn ensure(&self, request_if_missing: bool) -> PermissionState {
        let camera = self.check(Capability::Camera, request_if_missing).await;
        let microphone = self.check(Capability::Microphone, request_if_missing).await;

        let state = PermissionState { camera, microphone };
        if !state.all_granted() {
            warn!(
                camera = state.camera,
                microphone = state.microphone,
                "Capture permissions incomplete"
            );
        } else {
            debug!("Camera and microphone granted");
        }

        // Ok to ignore: no receiver just means nobody is showing the notice yet
        let _ = self.state_tx.send(state);
        state
    }

    /// Observe-only recheck, run when the host returns to foreground.
    pub async fn resync(&self) -> PermissionState {
        info!("Resyncing permission state on foreground");
        self.ensure(false).await
    }

    /// Subscribe to permission state changes.
    pub fn subscribe(&self) -> watch::Receiver<PermissionState> {
        self.state_tx.subscribe()
    }

    /// Last published state.
    pub fn current(&self) -> PermissionState {
        *self.state_tx.borrow()
    }

    async fn check(&self, capability: Capability, request_if_missing: bool) -> bool {
        match self.api.status(capability).await {
            GrantStatus::Granted => true,
            status => {
                if request_if_missing {
                    debug!(?capability, ?status, "Requesting missing capability");
                    self.api.request(capability).await == GrantStatus::Granted
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_ensure_requests_missing_capability() {
        let mut api = MockPermissionsApi::new();
        api.expect_status()
            .with(eq(Capability::Camera))
            .returning(|_| GrantStatus::Undetermined);
        api.expect_request()
            .with(eq(Capability::Camera))
            .times(1)
            .returning(|_| GrantStatus::Granted);
        api.expect_status()
            .with(eq(Capability::Microphone))
            .returning(|_| GrantStatus::Granted);

        let coordinator = PermissionCoordinator::new(Arc::new(api));
        let state = coordinator.ensure(true).await;
        assert!(state.all_granted());
    }

    #[tokio::test]
    async fn test_resync_never_prompts() {
        let mut api = MockPermissionsApi::new();
        api.expect_status().returning(|_| GrantStatus::Denied);
        // No expect_request: a request call would panic the mock
        let coordinator = PermissionCoordinator::new(Arc::new(api));

        let state = coordinator.resync().await;
        assert!(!state.camera);
        assert!(!state.microphone);
    }

    #[tokio::test]
    async fn test_state_published_to_subscribers() {
        let mut api = MockPermissionsApi::new();
        api.expect_status()
            .with(eq(Capability::Camera))
            .returning(|_| GrantStatus::Granted);
        api.expect_status()
            .with(eq(Capability::Microphone))
            .returning(|_| GrantStatus::Denied);

        let coordinator = PermissionCoordinator::new(Arc::new(api));
        let rx = coordinator.subscribe();
        coordinator.ensure(false).await;

        let state = *rx.borrow();
        assert!(state.camera);
        assert!(!state.microphone);
        assert!(!state.all_granted());
    }

    #[tokio::test]
    async fn test_denied_request_leaves_capability_missing() {
        let mut api = MockPermissionsApi::new();
        api.expect_status().returning(|_| GrantStatus::Undetermined);
        api.expect_request().returning(|_| GrantStatus::Denied);

        let coordinator = PermissionCoordinator::new(Arc::new(api));
        let state = coordinator.ensure(true).await;
        assert!(!state.all_granted());
    }
}
