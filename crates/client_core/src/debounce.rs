use std::{
    collections::HashMap,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{sync::Mutex, task::JoinHandle};

struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Coalesces rapid repeated triggers into a single delayed action per key.
/// At most one timer is live per key; a superseding `schedule` aborts the
/// prior timer before arming a new one.
pub struct DebounceScheduler {
    timers: Arc<Mutex<HashMap<String, PendingTimer>>>,
    next_generation: AtomicU64,
}

impl DebounceScheduler {
    pub fn new() -> Self {
        Self {
            timers: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Arms `action` to run after `delay`, cancelling any timer previously
    /// registered under `key`. Only the most recent action per key executes,
    /// with the delay measured from this call.
    pub async fn schedule<F, Fut>(&self, key: impl Into<String>, delay: Duration, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let key = key.into();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        // Hold the registry lock across spawn+insert so the timer task can
        // never observe the map before its own entry exists.
        let mut guard = self.timers.lock().await;
        let timers = Arc::clone(&self.timers);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action().await;
            let mut guard = timers.lock().await;
            if guard
                .get(&task_key)
                .is_some_and(|timer| timer.generation == generation)
            {
                guard.remove(&task_key);
            }
        });

        if let Some(previous) = guard.insert(key, PendingTimer { generation, handle }) {
            previous.handle.abort();
        }
    }

    /// Cancels the timer for `key`, if any. Safe to call again afterwards.
    pub async fn cancel(&self, key: &str) {
        if let Some(timer) = self.timers.lock().await.remove(key) {
            timer.handle.abort();
        }
    }

    /// Cancels every pending timer. After this returns no scheduled action
    /// will fire, making teardown free of late side effects.
    pub async fn cancel_all(&self) {
        let mut guard = self.timers.lock().await;
        for (_, timer) in guard.drain() {
            timer.handle.abort();
        }
    }

    pub async fn pending(&self) -> usize {
        self.timers.lock().await.len()
    }
}

impl Default for DebounceScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/debounce_tests.rs"]
mod tests;
