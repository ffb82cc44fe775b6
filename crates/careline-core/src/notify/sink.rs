use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// Display time when the caller does not pick one. Errors stay up
    /// longest so the user has time to read them.
    pub fn default_duration_ms(&self) -> u64 {
        match self {
            Severity::Success => 4000,
            Severity::Info => 5000,
            Severity::Warning => 6000,
            Severity::Error => 8000,
        }
    }
}

/// One user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NotificationEvent {
    pub title: String,
    pub description: Option<String>,
    pub severity: Severity,
    pub duration_ms: u64,
}

impl NotificationEvent {
    pub fn new(severity: Severity, title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            title: title.into(),
            description,
            severity,
            duration_ms: severity.default_duration_ms(),
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToastId(pub u64);

/// Display surface for notifications.
pub trait NotificationSink: Send + Sync {
    fn show(&self, event: NotificationEvent) -> ToastId;
    fn dismiss(&self, id: ToastId);
}

/// Handle to a displayed notification.
pub struct ToastHandle {
    id: ToastId,
    sink: Arc<dyn NotificationSink>,
}

impl ToastHandle {
    pub(crate) fn new(id: ToastId, sink: Arc<dyn NotificationSink>) -> Self {
        Self { id, sink }
    }

    pub fn id(&self) -> ToastId {
        self.id
    }

    pub fn dismiss(self) {
        self.sink.dismiss(self.id);
    }
}

struct StackEntry {
    id: ToastId,
    event: NotificationEvent,
    shown_at: Instant,
    dismissed: bool,
}

impl StackEntry {
    fn is_visible(&self, now: Instant) -> bool {
        !self.dismissed
            && now.duration_since(self.shown_at) < Duration::from_millis(self.event.duration_ms)
    }
}

/// Number of past notifications kept by [`ToastStack::history`].
pub const HISTORY_LIMIT: usize = 200;

#[derive(Default)]
struct StackInner {
    live: Vec<StackEntry>,
    history: VecDeque<NotificationEvent>,
}

/// In-memory toast stack: most recent on top, each entry with its own
/// dismiss timer. Expired and dismissed entries are dropped whenever a new
/// notification is shown; the last [`HISTORY_LIMIT`] events stay available
/// for inspection.
#[derive(Default)]
pub struct ToastStack {
    next_id: AtomicU64,
    inner: Mutex<StackInner>,
}

impl ToastStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications still on screen, most recent first.
    pub fn visible(&self) -> Vec<NotificationEvent> {
        self.visible_at(Instant::now())
    }

    fn visible_at(&self, now: Instant) -> Vec<NotificationEvent> {
        let inner = self.inner.lock();
        inner
            .live
            .iter()
            .rev()
            .filter(|e| e.is_visible(now))
            .map(|e| e.event.clone())
            .collect()
    }

    /// Recently shown notifications, oldest first.
    pub fn history(&self) -> Vec<NotificationEvent> {
        self.inner.lock().history.iter().cloned().collect()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.inner
            .lock()
            .history
            .iter()
            .filter(|e| e.severity == severity)
            .count()
    }

    /// Drop entries that are no longer visible.
    pub fn prune(&self) {
        Self::prune_at(&mut self.inner.lock(), Instant::now());
    }

    fn prune_at(inner: &mut StackInner, now: Instant) {
        inner.live.retain(|e| e.is_visible(now));
    }
}

impl NotificationSink for ToastStack {
    fn show(&self, event: NotificationEvent) -> ToastId {
        let id = ToastId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let now = Instant::now();

        let mut inner = self.inner.lock();
        Self::prune_at(&mut inner, now);
        if inner.history.len() == HISTORY_LIMIT {
            inner.history.pop_front();
        }
        inner.history.push_back(event.clone());
        inner.live.push(StackEntry {
            id,
            event,
            shown_at: now,
            dismissed: false,
        });
        id
    }

    fn dismiss(&self, id: ToastId) {
        if let Some(entry) = self.inner.lock().live.iter_mut().find(|e| e.id == id) {
            entry.dismissed = true;
        }
    }
}

/// Sink that writes notifications to the log, for terminal front ends.
#[derive(Default)]
pub struct TracingSink {
    next_id: AtomicU64,
}

impl NotificationSink for TracingSink {
    fn show(&self, event: NotificationEvent) -> ToastId {
        let id = ToastId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let description = event.description.as_deref().unwrap_or("");
        match event.severity {
            Severity::Error => error!(toast = id.0, title = %event.title, "{}", description),
            Severity::Warning => warn!(toast = id.0, title = %event.title, "{}", description),
            Severity::Info | Severity::Success => {
                info!(toast = id.0, title = %event.title, "{}", description)
            }
        }
        id
    }

    fn dismiss(&self, id: ToastId) {
        debug!(toast = id.0, "Notification dismissed");
    }
}
