//! Focused-capture chrome guard.
//!
//! While recording, the host hides its surrounding chrome (tab bars,
//! nav controls) so nothing can interrupt the take. The guard is RAII:
//! chrome is restored on drop, including early returns and panics in
//! the capture flow.

use std::sync::Arc;

use tracing::debug;

/// Host chrome collaborator.
#[cfg_attr(test, mockall::automock)]
pub trait HostChrome: Send + Sync {
    /// Hide surrounding chrome for distraction-free capture.
    fn enter_focused_capture(&self);

    /// Restore the regular chrome.
    fn exit_focused_capture(&self);
}

/// Keeps the host in focused-capture mode for its lifetime.
pub struct FocusGuard {
    chrome: Arc<dyn HostChrome>,
}

impl FocusGuard {
    pub fn enter(chrome: Arc<dyn HostChrome>) -> Self {
        debug!("Entering focused capture");
        chrome.enter_focused_capture();
        Self { chrome }
    }
}

impl Drop for FocusGuard {
    fn drop(&mut self) {
        debug!("Exiting focused capture");
        self.chrome.exit_focused_capture();
    }
}
