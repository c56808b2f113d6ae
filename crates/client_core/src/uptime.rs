use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{sync::Mutex, task::JoinHandle};

pub const TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Session-scoped storage for the uptime anchor. The epoch is written once
/// per session and only read thereafter; implementations must not persist
/// it beyond the frontend session's lifetime.
pub trait SessionStore: Send + Sync {
    fn load_epoch(&self) -> Option<i64>;
    fn store_epoch(&self, epoch_ms: i64);
}

/// Default store: the process itself is the session.
#[derive(Default)]
pub struct InMemorySessionStore {
    epoch_ms: std::sync::Mutex<Option<i64>>,
}

impl SessionStore for InMemorySessionStore {
    fn load_epoch(&self) -> Option<i64> {
        self.epoch_ms.lock().ok().and_then(|guard| *guard)
    }

    fn store_epoch(&self, epoch_ms: i64) {
        if let Ok(mut guard) = self.epoch_ms.lock() {
            *guard = Some(epoch_ms);
        }
    }
}

struct UptimeState {
    epoch_ms: Option<i64>,
    task: Option<JoinHandle<()>>,
}

/// Monotonic session-elapsed display anchored to a persisted start epoch.
pub struct UptimeTracker {
    store: Arc<dyn SessionStore>,
    inner: Mutex<UptimeState>,
}

impl UptimeTracker {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            inner: Mutex::new(UptimeState {
                epoch_ms: None,
                task: None,
            }),
        }
    }

    /// Starts the once-per-second tick. The first activation in a session
    /// captures and stores the anchor epoch; re-activation reuses the
    /// stored value and never resets it. Idempotent while running.
    pub async fn start<F>(&self, on_tick: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let mut state = self.inner.lock().await;
        if state.task.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let epoch_ms = match self.store.load_epoch() {
            Some(epoch) => epoch,
            None => {
                let now = Utc::now().timestamp_millis();
                self.store.store_epoch(now);
                now
            }
        };
        state.epoch_ms = Some(epoch_ms);

        state.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK_INTERVAL);
            loop {
                ticker.tick().await;
                let elapsed_ms = (Utc::now().timestamp_millis() - epoch_ms).max(0) as u64;
                on_tick(format_elapsed(elapsed_ms));
            }
        }));
    }

    /// Cancels the tick task. Idempotent; the anchor epoch is untouched.
    pub async fn stop(&self) {
        let mut state = self.inner.lock().await;
        if let Some(task) = state.task.take() {
            task.abort();
        }
    }

    pub async fn is_running(&self) -> bool {
        let state = self.inner.lock().await;
        state.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Elapsed time since the session anchor, if the tracker was started.
    pub async fn elapsed_display(&self) -> Option<String> {
        let state = self.inner.lock().await;
        state.epoch_ms.map(|epoch_ms| {
            let elapsed_ms = (Utc::now().timestamp_millis() - epoch_ms).max(0) as u64;
            format_elapsed(elapsed_ms)
        })
    }
}

/// `HH:MM:SS`, zero-padded. Hours keep counting past 24; there is no day
/// roll-over.
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let total_secs = elapsed_ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
#[path = "tests/uptime_tests.rs"]
mod tests;
