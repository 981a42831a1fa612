use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The persistent "enable audio alerts" switch. Shared between the shell and
/// every session it starts; flipping it takes effect on the next frame.
#[derive(Debug, Clone, Default)]
pub struct AlertToggle(Arc<AtomicBool>);

impl AlertToggle {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Signals from the shell into one running session.
#[derive(Debug, Clone)]
pub struct SessionControls {
    stop: CancellationToken,
    alerts: AlertToggle,
}

impl SessionControls {
    pub fn new(alerts: AlertToggle) -> Self {
        Self {
            stop: CancellationToken::new(),
            alerts,
        }
    }

    /// Ask the session to stop. Observed at the top of the next iteration;
    /// a detection pass already in flight runs to completion.
    pub fn request_stop(&self) {
        self.stop.cancel();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }

    pub fn alerts(&self) -> &AlertToggle {
        &self.alerts
    }

    pub fn alerts_enabled(&self) -> bool {
        self.alerts.is_enabled()
    }
}
