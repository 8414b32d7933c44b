//! Local notification store.
//!
//! Holds everything the CLI renders: received notifications (most recent
//! first) with read/unread tracking, a short activity log, and the current
//! connection lifecycle state. Nothing here is persisted; a fresh process
//! starts empty and only sees events delivered from now on.

use std::collections::VecDeque;

use serde_json::Value;
use uuid::Uuid;

use kakehashi_server::domain::EventKind;
use kakehashi_server::infrastructure::dto::websocket::EventEnvelope;

/// Most activity-log entries kept before the oldest are evicted.
const ACTIVITY_LOG_CAP: usize = 10;

/// Connection lifecycle as the store tracks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Disconnected,
    Connecting,
    /// Handshake acknowledged, subscriptions not yet re-established
    Connected,
    /// Subscribe messages sent, waiting for acks
    Reconciling,
    /// All subscriptions acknowledged; deliveries flowing
    Live,
    /// Reconnection exhausted; no further attempts
    Offline,
}

impl StoreState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconciling => "reconciling",
            Self::Live => "live",
            Self::Offline => "offline",
        }
    }
}

/// One received notification.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Local identifier, assigned on receipt
    pub id: Uuid,
    pub kind: EventKind,
    /// Human-readable one-liner derived from the kind and payload
    pub message: String,
    pub data: Value,
    /// Server-assigned emission time (Unix millis)
    pub timestamp: i64,
    pub read: bool,
}

/// In-memory notification store with unread tracking.
///
/// The activity log is a separate, capped history of received events: it
/// keeps notification-shaped records (so the CLI can render it like the
/// list) and only events land in it; connection-state churn never evicts
/// an event entry.
#[derive(Debug, Default)]
pub struct NotificationStore {
    notifications: Vec<Notification>,
    log: VecDeque<Notification>,
    state: Option<StoreState>,
    /// Display name echoed back in the handshake ack, when connected
    display_name: Option<String>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one delivered event.
    ///
    /// Returns `false` when the event is a duplicate of one already stored
    /// (the same kind, payload and timestamp), in which case nothing changes.
    /// Duplicates are expected: an event can reach a connection through more
    /// than one channel, and applying it twice must not double-count unread.
    pub fn apply_event(&mut self, envelope: &EventEnvelope) -> bool {
        let fingerprint = envelope.payload.to_string();
        let duplicate = self.notifications.iter().any(|n| {
            n.kind == envelope.r#type
                && n.timestamp == envelope.timestamp
                && n.data.to_string() == fingerprint
        });
        if duplicate {
            tracing::debug!("duplicate delivery of '{}' ignored", envelope.r#type);
            return false;
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            kind: envelope.r#type,
            message: describe(envelope.r#type, &envelope.payload),
            data: envelope.payload.clone(),
            timestamp: envelope.timestamp,
            read: false,
        };

        // The log keeps its own record of the event as received
        if self.log.len() == ACTIVITY_LOG_CAP {
            self.log.pop_front();
        }
        self.log.push_back(notification.clone());

        // Most recent first
        self.notifications.insert(0, notification);
        true
    }

    /// Mark one notification read. Unknown ids are a silent no-op.
    pub fn mark_read(&mut self, id: Uuid) {
        if let Some(n) = self.notifications.iter_mut().find(|n| n.id == id) {
            n.read = true;
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.notifications {
            n.read = true;
        }
    }

    /// Drop all notifications. The activity log is left untouched.
    pub fn clear(&mut self) {
        self.notifications.clear();
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    /// Activity log entries, oldest first.
    pub fn activity(&self) -> impl Iterator<Item = &Notification> {
        self.log.iter()
    }

    pub fn state(&self) -> Option<StoreState> {
        self.state
    }

    pub fn set_state(&mut self, state: StoreState) {
        if self.state != Some(state) {
            tracing::info!("connection state: {}", state.as_str());
            self.state = Some(state);
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn set_display_name(&mut self, name: String) {
        self.display_name = Some(name);
    }
}

/// Render a notification kind and payload as a one-line message.
fn describe(kind: EventKind, payload: &Value) -> String {
    let id = |key: &str| -> String {
        payload
            .get(key)
            .and_then(Value::as_u64)
            .map(|id| format!(" #{id}"))
            .unwrap_or_default()
    };

    match kind {
        EventKind::Registration => "A new student registered".to_string(),
        EventKind::EntryCreated => format!("A learning entry{} was submitted", id("entry_id")),
        EventKind::EntryStatusChanged => {
            format!("Your learning entry{} changed status", id("entry_id"))
        }
        EventKind::CommentAdded => format!("New comment on your entry{}", id("entry_id")),
        EventKind::TaskAssigned => format!("A task{} was assigned to you", id("task_id")),
        EventKind::TaskUpdated => format!("A task{} you follow was updated", id("task_id")),
        EventKind::TaskCompleted => format!("A student completed a task{}", id("task_id")),
        EventKind::DoubtCreated => format!("A new doubt{} was posted", id("doubt_id")),
        EventKind::DoubtAnswered => format!("Your doubt{} received an answer", id("doubt_id")),
        EventKind::DoubtResolved => format!("Your doubt{} was marked resolved", id("doubt_id")),
        EventKind::DoubtStatusChanged => format!("Your doubt{} changed status", id("doubt_id")),
        EventKind::QuizQuestionCreated => {
            format!("A new quiz question{} is available", id("question_id"))
        }
        EventKind::QuizQuestionUpdated => {
            format!("A quiz question{} was updated", id("question_id"))
        }
        EventKind::QuizQuestionDeleted => {
            format!("A quiz question{} was removed", id("question_id"))
        }
        EventKind::QuizAnswerSubmitted => "A student submitted a quiz answer".to_string(),
        EventKind::ScheduleCreated => format!("A session{} was scheduled", id("schedule_id")),
        EventKind::ScheduleUpdated => {
            format!("A scheduled session{} was updated", id("schedule_id"))
        }
        EventKind::ScheduleCancelled => {
            format!("A scheduled session{} was cancelled", id("schedule_id"))
        }
        EventKind::TaskQuestionAdded => {
            format!("A student asked a question{} on a task", id("question_id"))
        }
        EventKind::TaskQuestionAnswered => {
            format!("Your task question{} received an answer", id("question_id"))
        }
    }
}
