use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::Utc;
use futures::FutureExt;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{info, warn};

use shared::{
    domain::{Method, OperationMode, Severity, StrengthScore},
    error::{GatewayError, ValidationError},
    protocol::{GeneratedKey, ProcessOutcome, ProcessRequest, StatsReply},
};

pub mod capabilities;
pub mod debounce;
pub mod gateway;
pub mod notifications;
pub mod polling;
pub mod strength;
pub mod uptime;

pub use gateway::{HttpGateway, MissingGateway, ProcessorGateway};
pub use notifications::{Notification, NotificationQueue};
pub use uptime::{InMemorySessionStore, SessionStore};

use capabilities::{Clipboard, Exporter, MissingClipboard, MissingExporter};
use debounce::DebounceScheduler;
use polling::{PollingController, RefreshFn};
use uptime::UptimeTracker;

pub const MAX_INPUT_CHARS: usize = 10_000;
pub const DEBOUNCE_KEY_CHAR_COUNT: &str = "character-count";
pub const DEBOUNCE_KEY_STRENGTH: &str = "password-strength";

const CHAR_COUNT_DEBOUNCE: Duration = Duration::from_millis(100);
const STRENGTH_DEBOUNCE: Duration = Duration::from_millis(200);
const STATS_REFRESH_INTERVAL: Duration = Duration::from_secs(10);
const NOTIFICATION_TTL: Duration = Duration::from_millis(4000);
/// Placeholder secret the service expects for methods that do not take one.
const DEFAULT_SECRET: &str = "defaultpass";

/// Tuning knobs fixed at construction time.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub stats_refresh_interval: Duration,
    pub notification_ttl: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            stats_refresh_interval: STATS_REFRESH_INTERVAL,
            notification_ttl: NOTIFICATION_TTL,
        }
    }
}

/// Everything a frontend needs to render, emitted in creation order.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    ProcessingChanged(bool),
    ResultReady(ProcessOutcome),
    ResultCleared,
    Notification(Notification),
    NotificationDismissed(u64),
    StatsUpdated(StatsReply),
    StatsFailed(String),
    KeyGenerated {
        key: String,
        length: u32,
        strength: String,
    },
    CharacterCount {
        count: usize,
        limit: usize,
    },
    StrengthEvaluated(StrengthScore),
    UptimeTick(String),
}

/// Resolution of a `submit` call. `Busy` and `Rejected` never reach the
/// network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStatus {
    Completed,
    Failed,
    Busy,
    Rejected(ValidationError),
}

struct ControllerState {
    mode: OperationMode,
    method: Method,
    processing: bool,
    result: Option<ProcessOutcome>,
}

/// Orchestration engine for the text-processing frontend: owns the mode and
/// single-flight processing state, the notification queue, and every timer
/// (debounce, polling, uptime, auto-dismiss), so `shutdown` can release them
/// all. All side effects reach the frontend through the event channel.
pub struct EncrypterClient {
    gateway: Arc<dyn ProcessorGateway>,
    clipboard: Arc<dyn Clipboard>,
    exporter: Arc<dyn Exporter>,
    notification_ttl: Duration,
    inner: Mutex<ControllerState>,
    notifications: Mutex<NotificationQueue>,
    dismiss_tasks: Mutex<HashMap<u64, JoinHandle<()>>>,
    debounce: DebounceScheduler,
    polling: PollingController,
    uptime: UptimeTracker,
    events: broadcast::Sender<ClientEvent>,
}

impl EncrypterClient {
    pub fn new(gateway: Arc<dyn ProcessorGateway>) -> Arc<Self> {
        Self::new_with_options(gateway, ClientOptions::default())
    }

    pub fn new_with_options(gateway: Arc<dyn ProcessorGateway>, options: ClientOptions) -> Arc<Self> {
        Self::new_with_dependencies(
            gateway,
            options,
            Arc::new(MissingClipboard),
            Arc::new(MissingExporter),
            Arc::new(InMemorySessionStore::default()),
        )
    }

    pub fn new_with_dependencies(
        gateway: Arc<dyn ProcessorGateway>,
        options: ClientOptions,
        clipboard: Arc<dyn Clipboard>,
        exporter: Arc<dyn Exporter>,
        session_store: Arc<dyn SessionStore>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            gateway,
            clipboard,
            exporter,
            notification_ttl: options.notification_ttl,
            inner: Mutex::new(ControllerState {
                mode: OperationMode::Encrypt,
                method: Method::Caesar,
                processing: false,
                result: None,
            }),
            notifications: Mutex::new(NotificationQueue::new()),
            dismiss_tasks: Mutex::new(HashMap::new()),
            debounce: DebounceScheduler::new(),
            polling: PollingController::new(options.stats_refresh_interval),
            uptime: UptimeTracker::new(session_store),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn mode(&self) -> OperationMode {
        self.inner.lock().await.mode
    }

    pub async fn method(&self) -> Method {
        self.inner.lock().await.method
    }

    pub async fn is_processing(&self) -> bool {
        self.inner.lock().await.processing
    }

    pub async fn current_result(&self) -> Option<ProcessOutcome> {
        self.inner.lock().await.result.clone()
    }

    /// Runs the frontend's activation sequence: uptime ticker, initial
    /// statistics load, and auto-refresh on.
    pub async fn start_session(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.uptime
            .start(move |display| {
                if let Some(client) = weak.upgrade() {
                    let _ = client.events.send(ClientEvent::UptimeTick(display));
                }
            })
            .await;
        self.set_auto_refresh(true).await;
        self.refresh_stats().await;
    }

    /// Selects the transformation direction. Rejected while a request is in
    /// flight; an actual switch drops the displayed result and any visible
    /// notifications so no stale output survives the change.
    pub async fn set_mode(&self, mode: OperationMode) -> bool {
        {
            let mut state = self.inner.lock().await;
            if state.processing {
                info!(requested = %mode, "mode switch rejected while a request is in flight");
                return false;
            }
            if state.mode == mode {
                return true;
            }
            state.mode = mode;
            state.result = None;
        }
        let _ = self.events.send(ClientEvent::ResultCleared);
        self.clear_notifications().await;
        true
    }

    /// Selects the transformation algorithm, with the same guard and
    /// stale-result clearing as `set_mode`.
    pub async fn set_method(&self, method: Method) -> bool {
        {
            let mut state = self.inner.lock().await;
            if state.processing {
                info!(requested = %method, "method switch rejected while a request is in flight");
                return false;
            }
            if state.method == method {
                return true;
            }
            state.method = method;
            state.result = None;
        }
        let _ = self.events.send(ClientEvent::ResultCleared);
        self.clear_notifications().await;
        true
    }

    /// Dispatches one transformation request. Only accepted from Idle: a
    /// call while a request is in flight is a no-op, and local validation
    /// failures never reach the network. Retry is always user-initiated.
    pub async fn submit(self: &Arc<Self>, text: &str, secret: &str) -> SubmitStatus {
        let trimmed = text.trim().to_string();

        let validated = {
            let mut state = self.inner.lock().await;
            if state.processing {
                info!("submit ignored: a request is already in flight");
                return SubmitStatus::Busy;
            }
            match validate_input(&trimmed, state.method, secret) {
                Ok(()) => {
                    state.processing = true;
                    Ok((state.mode, state.method))
                }
                Err(err) => Err(err),
            }
        };

        let (mode, method) = match validated {
            Ok(selection) => selection,
            Err(err) => {
                warn!(error = %err, "submit rejected by local validation");
                self.notify(err.to_string(), Severity::Error).await;
                return SubmitStatus::Rejected(err);
            }
        };
        let _ = self.events.send(ClientEvent::ProcessingChanged(true));

        let request = ProcessRequest {
            text: trimmed,
            method,
            password: if secret.is_empty() {
                DEFAULT_SECRET.to_string()
            } else {
                secret.to_string()
            },
            action: mode,
        };

        match self.gateway.process(request).await {
            Ok(outcome) => {
                {
                    let mut state = self.inner.lock().await;
                    state.result = Some(outcome.clone());
                    state.processing = false;
                }
                let _ = self.events.send(ClientEvent::ResultReady(outcome.clone()));
                let _ = self.events.send(ClientEvent::ProcessingChanged(false));
                info!(
                    method = %outcome.method,
                    action = %outcome.action,
                    input_length = outcome.input_length,
                    output_length = outcome.output_length,
                    "processing completed"
                );
                self.notify(
                    format!(
                        "{} completed: {} -> {} chars via {}",
                        outcome.action, outcome.input_length, outcome.output_length, outcome.method
                    ),
                    Severity::Success,
                )
                .await;
                self.spawn_stats_refresh();
                SubmitStatus::Completed
            }
            Err(err) => {
                {
                    let mut state = self.inner.lock().await;
                    state.processing = false;
                }
                let _ = self.events.send(ClientEvent::ProcessingChanged(false));
                warn!(error = %err, "processing request failed");
                let message = match &err {
                    GatewayError::Transport(_) => {
                        "Network error. Please check your connection.".to_string()
                    }
                    GatewayError::Application(message) => message.clone(),
                };
                self.notify(message, Severity::Error).await;
                SubmitStatus::Failed
            }
        }
    }

    /// Asks the service for a fresh secret and surfaces it to the frontend.
    pub async fn generate_key(
        self: &Arc<Self>,
        length: u32,
        symbols: bool,
    ) -> Result<GeneratedKey, GatewayError> {
        match self.gateway.generate_key(length, symbols).await {
            Ok(key) => {
                let _ = self.events.send(ClientEvent::KeyGenerated {
                    key: key.key.clone(),
                    length: key.length,
                    strength: key.strength.clone(),
                });
                self.notify(
                    format!(
                        "Generated {} key ({} chars)",
                        key.strength.to_lowercase(),
                        key.length
                    ),
                    Severity::Success,
                )
                .await;
                Ok(key)
            }
            Err(err) => {
                warn!(error = %err, "key generation failed");
                self.notify("Failed to generate key. Please try again.", Severity::Error)
                    .await;
                Err(err)
            }
        }
    }

    /// Fetches the aggregate statistics once. Failures are reported on the
    /// event channel only; the polling loop keeps going either way.
    pub async fn refresh_stats(&self) {
        match self.gateway.stats().await {
            Ok(reply) => {
                let _ = self.events.send(ClientEvent::StatsUpdated(reply));
            }
            Err(err) => {
                warn!(error = %err, "statistics refresh failed");
                let _ = self.events.send(ClientEvent::StatsFailed(err.to_string()));
            }
        }
    }

    pub async fn clear_history(self: &Arc<Self>) -> Result<(), GatewayError> {
        match self.gateway.clear_history().await {
            Ok(message) => {
                info!(message = %message, "operation history cleared");
                self.notify("History cleared", Severity::Success).await;
                self.spawn_stats_refresh();
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "clear history failed");
                self.notify("Failed to clear history", Severity::Error).await;
                Err(err)
            }
        }
    }

    /// Debounced reaction to input edits: emits the character count after a
    /// quiet period, warning when the limit is exceeded.
    pub async fn input_changed(self: &Arc<Self>, text: String) {
        let weak = Arc::downgrade(self);
        self.debounce
            .schedule(DEBOUNCE_KEY_CHAR_COUNT, CHAR_COUNT_DEBOUNCE, move || async move {
                let Some(client) = weak.upgrade() else {
                    return;
                };
                let count = text.chars().count();
                let _ = client.events.send(ClientEvent::CharacterCount {
                    count,
                    limit: MAX_INPUT_CHARS,
                });
                if count > MAX_INPUT_CHARS {
                    client
                        .notify(
                            format!("Text too long! Maximum {MAX_INPUT_CHARS} characters allowed."),
                            Severity::Error,
                        )
                        .await;
                }
            })
            .await;
    }

    /// Debounced reaction to secret edits: emits the strength score after a
    /// quiet period.
    pub async fn secret_changed(self: &Arc<Self>, secret: String) {
        let weak = Arc::downgrade(self);
        self.debounce
            .schedule(DEBOUNCE_KEY_STRENGTH, STRENGTH_DEBOUNCE, move || async move {
                let Some(client) = weak.upgrade() else {
                    return;
                };
                let score = strength::score(&secret);
                let _ = client.events.send(ClientEvent::StrengthEvaluated(score));
            })
            .await;
    }

    pub async fn set_auto_refresh(self: &Arc<Self>, enabled: bool) {
        if enabled {
            self.polling.start(self.stats_refresh_fn()).await;
        } else {
            self.polling.stop().await;
        }
    }

    /// Mirrors the frontend's visibility: hidden pauses polling without
    /// touching the auto-refresh preference, visible resumes it.
    pub async fn set_visibility(self: &Arc<Self>, hidden: bool) {
        if hidden {
            self.polling.pause().await;
        } else {
            self.polling.resume(self.stats_refresh_fn()).await;
        }
    }

    /// Copies the displayed result through the clipboard capability,
    /// degrading to an error notification when none is available.
    pub async fn copy_result(self: &Arc<Self>) -> bool {
        let result = { self.inner.lock().await.result.clone() };
        let Some(outcome) = result else {
            self.notify("No result to copy", Severity::Error).await;
            return false;
        };
        match self.clipboard.copy(&outcome.result) {
            Ok(()) => {
                self.notify("Result copied to clipboard", Severity::Success)
                    .await;
                true
            }
            Err(err) => {
                warn!(error = %err, "clipboard copy failed");
                self.notify("Unable to copy to clipboard", Severity::Error)
                    .await;
                false
            }
        }
    }

    /// Fetches the statistics and hands them to the export capability as a
    /// timestamped JSON document.
    pub async fn export_stats(self: &Arc<Self>) -> Result<(), GatewayError> {
        let reply = match self.gateway.stats().await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "statistics export fetch failed");
                self.notify("Failed to export statistics", Severity::Error)
                    .await;
                return Err(err);
            }
        };

        let contents = match serde_json::to_string_pretty(&reply) {
            Ok(contents) => contents,
            Err(err) => {
                let err = GatewayError::Application(format!("failed to encode statistics: {err}"));
                self.notify("Failed to export statistics", Severity::Error)
                    .await;
                return Err(err);
            }
        };

        let filename = format!(
            "encryption-stats-{}.json",
            Utc::now().format("%Y-%m-%dT%H-%M-%S")
        );
        match self.exporter.save(&filename, &contents) {
            Ok(()) => {
                self.notify(
                    format!("Statistics exported as {filename}"),
                    Severity::Success,
                )
                .await;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "statistics export failed");
                self.notify("Failed to export statistics", Severity::Error)
                    .await;
                Err(GatewayError::Application(err.to_string()))
            }
        }
    }

    /// Dismisses every visible notification and cancels their expiry timers.
    /// Allowed at any time, including while a request is in flight.
    pub async fn clear_notifications(&self) {
        let ids = self.notifications.lock().await.clear();
        {
            let mut tasks = self.dismiss_tasks.lock().await;
            for id in &ids {
                if let Some(handle) = tasks.remove(id) {
                    handle.abort();
                }
            }
        }
        for id in ids {
            let _ = self.events.send(ClientEvent::NotificationDismissed(id));
        }
    }

    /// Releases every scheduled task owned by the controller: polling,
    /// debounce timers, the uptime ticker, and notification expiry.
    /// Idempotent.
    pub async fn shutdown(&self) {
        self.polling.stop().await;
        self.debounce.cancel_all().await;
        self.uptime.stop().await;
        let mut tasks = self.dismiss_tasks.lock().await;
        for (_, handle) in tasks.drain() {
            handle.abort();
        }
    }

    async fn notify(self: &Arc<Self>, text: impl Into<String>, severity: Severity) {
        let (notification, evicted) =
            self.notifications
                .lock()
                .await
                .push(text, severity, self.notification_ttl);
        if let Some(evicted) = evicted {
            if let Some(handle) = self.dismiss_tasks.lock().await.remove(&evicted.id) {
                handle.abort();
            }
            let _ = self
                .events
                .send(ClientEvent::NotificationDismissed(evicted.id));
        }
        self.spawn_dismiss(notification.id, notification.ttl).await;
        let _ = self.events.send(ClientEvent::Notification(notification));
    }

    async fn spawn_dismiss(self: &Arc<Self>, id: u64, ttl: Duration) {
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let Some(client) = weak.upgrade() else {
                return;
            };
            let dismissed = client.notifications.lock().await.dismiss(id);
            client.dismiss_tasks.lock().await.remove(&id);
            if dismissed {
                let _ = client.events.send(ClientEvent::NotificationDismissed(id));
            }
        });
        self.dismiss_tasks.lock().await.insert(id, handle);
    }

    fn spawn_stats_refresh(self: &Arc<Self>) {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            client.refresh_stats().await;
        });
    }

    fn stats_refresh_fn(self: &Arc<Self>) -> RefreshFn {
        let weak = Arc::downgrade(self);
        Arc::new(move || {
            let weak = weak.clone();
            async move {
                if let Some(client) = weak.upgrade() {
                    client.refresh_stats().await;
                }
            }
            .boxed()
        })
    }
}

fn validate_input(trimmed: &str, method: Method, secret: &str) -> Result<(), ValidationError> {
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    let length = trimmed.chars().count();
    if length > MAX_INPUT_CHARS {
        return Err(ValidationError::InputTooLong {
            length,
            limit: MAX_INPUT_CHARS,
        });
    }
    if method.requires_secret() && secret.trim().is_empty() {
        return Err(ValidationError::MissingSecret(method));
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
