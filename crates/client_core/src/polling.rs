use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use tokio::{sync::Mutex, task::JoinHandle};

/// Callback invoked on every poll tick.
pub type RefreshFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

struct PollingState {
    interval: Duration,
    enabled: bool,
    hidden: bool,
    task: Option<JoinHandle<()>>,
}

/// Periodic refresh driver. Owns at most one tick task at a time; hiding
/// the frontend disarms the timer without forgetting the user's enabled
/// preference, and unhiding rearms with the same interval iff the
/// preference still holds.
pub struct PollingController {
    inner: Mutex<PollingState>,
}

impl PollingController {
    pub fn new(interval: Duration) -> Self {
        Self {
            inner: Mutex::new(PollingState {
                interval,
                enabled: false,
                hidden: false,
                task: None,
            }),
        }
    }

    /// Enables periodic refresh. Idempotent: a second `start` while a tick
    /// task is live keeps the existing timer.
    pub async fn start(&self, refresh: RefreshFn) {
        let mut state = self.inner.lock().await;
        state.enabled = true;
        Self::arm(&mut state, refresh);
    }

    /// Disables periodic refresh and cancels any scheduled tick. Idempotent.
    pub async fn stop(&self) {
        let mut state = self.inner.lock().await;
        state.enabled = false;
        Self::disarm(&mut state);
    }

    /// Suspends ticking while the frontend is hidden. The enabled
    /// preference is preserved for `resume`.
    pub async fn pause(&self) {
        let mut state = self.inner.lock().await;
        state.hidden = true;
        Self::disarm(&mut state);
    }

    /// Rearms the timer after the frontend becomes visible again, but only
    /// if the user preference is still enabled.
    pub async fn resume(&self, refresh: RefreshFn) {
        let mut state = self.inner.lock().await;
        state.hidden = false;
        if state.enabled {
            Self::arm(&mut state, refresh);
        }
    }

    pub async fn is_enabled(&self) -> bool {
        self.inner.lock().await.enabled
    }

    pub async fn is_active(&self) -> bool {
        let state = self.inner.lock().await;
        state.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn arm(state: &mut PollingState, refresh: RefreshFn) {
        if state.hidden {
            return;
        }
        if state.task.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }
        let interval = state.interval;
        state.task = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                refresh().await;
            }
        }));
    }

    fn disarm(state: &mut PollingState) {
        if let Some(task) = state.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/polling_tests.rs"]
mod tests;
