//! Session state store.
//!
//! `SessionStore` owns the single long-lived [`SessionContext`] aggregate.
//! UI layers are read-only observers: they take consistent snapshots and
//! subscribe to change notifications, while all mutation goes through the
//! typed methods here. State lives for the process lifetime; there is no
//! persistence across restarts.

use tokio::sync::{RwLock, watch};

use super::message::{HistoryEntry, Message, history_window};
use super::syllabus::SyllabusData;

/// The session aggregate shared by all orchestration components.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    /// Whether the backend has at least one indexed document.
    pub indexed: bool,
    /// Subject extracted from the last parsed syllabus.
    pub subject: String,
    /// Parsed syllabus, replaced wholesale on each successful upload.
    pub syllabus_data: Option<SyllabusData>,
    /// Currently selected unit name.
    pub unit: String,
    /// Currently selected topic.
    pub topic: String,
    /// Selected answer length; `None` until the user picks one.
    pub marks: Option<u32>,
    /// Free-text syllabus context used by standard-mode questions.
    pub syllabus_text: String,
    /// Full message log, append-only except on reset.
    pub messages: Vec<Message>,
}

/// Observable owner of the [`SessionContext`].
///
/// Readers never observe a half-updated context: every mutation holds the
/// write lock for the whole field group it touches, and `snapshot()` clones
/// under the read lock. A version counter on a watch channel provides the
/// subscribe/notify contract.
pub struct SessionStore {
    state: RwLock<SessionContext>,
    version: watch::Sender<u64>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            state: RwLock::new(SessionContext::default()),
            version,
        }
    }

    /// Returns a consistent copy of the current context.
    pub async fn snapshot(&self) -> SessionContext {
        self.state.read().await.clone()
    }

    /// Subscribes to change notifications.
    ///
    /// The receiver yields a monotonically increasing version; observers
    /// re-read via [`snapshot`](Self::snapshot) when it changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Appends a message to the log.
    pub async fn append_message(&self, message: Message) {
        self.state.write().await.messages.push(message);
        self.notify();
    }

    /// Marks the backend as having (or no longer having) indexed content.
    pub async fn set_indexed(&self, indexed: bool) {
        self.state.write().await.indexed = indexed;
        self.notify();
    }

    /// Installs a freshly parsed syllabus, replacing any previous one.
    ///
    /// Subject, outline text and the parse itself update as one group; a
    /// stale unit/topic selection from the previous syllabus is dropped.
    pub async fn apply_syllabus(&self, syllabus: SyllabusData) {
        let mut state = self.state.write().await;
        state.subject = syllabus.subject.clone();
        state.syllabus_text = syllabus.render_outline();
        state.syllabus_data = Some(syllabus);
        state.unit.clear();
        state.topic.clear();
        drop(state);
        self.notify();
    }

    /// Replaces the free-text syllabus context (standard-mode paste box).
    pub async fn set_syllabus_text(&self, text: impl Into<String>) {
        self.state.write().await.syllabus_text = text.into();
        self.notify();
    }

    /// Sets the subject directly, for contextual questions without a parsed
    /// syllabus.
    pub async fn select_subject(&self, subject: impl Into<String>) {
        self.state.write().await.subject = subject.into();
        self.notify();
    }

    /// Selects a unit. A topic that does not belong to the newly selected
    /// unit is deselected.
    pub async fn select_unit(&self, unit: impl Into<String>) {
        let unit = unit.into();
        let mut state = self.state.write().await;
        let keeps_topic = state
            .syllabus_data
            .as_ref()
            .and_then(|syllabus| syllabus.unit(&unit))
            .is_some_and(|u| u.topics.contains(&state.topic));
        if !keeps_topic {
            state.topic.clear();
        }
        state.unit = unit;
        drop(state);
        self.notify();
    }

    /// Selects a topic.
    pub async fn select_topic(&self, topic: impl Into<String>) {
        self.state.write().await.topic = topic.into();
        self.notify();
    }

    /// Selects the answer length.
    pub async fn select_marks(&self, marks: u32) {
        self.state.write().await.marks = Some(marks);
        self.notify();
    }

    /// Clears all syllabus-related fields.
    ///
    /// The message log and the indexed flag are left untouched.
    pub async fn clear_syllabus(&self) {
        let mut state = self.state.write().await;
        state.subject.clear();
        state.syllabus_data = None;
        state.unit.clear();
        state.topic.clear();
        state.syllabus_text.clear();
        drop(state);
        self.notify();
    }

    /// Resets the session: indexed flag, syllabus fields and message log all
    /// return to their initial empty state. Mirrors the backend-wide reset.
    pub async fn reset_all(&self) {
        let mut state = self.state.write().await;
        state.indexed = false;
        state.subject.clear();
        state.syllabus_data = None;
        state.unit.clear();
        state.topic.clear();
        state.syllabus_text.clear();
        state.messages.clear();
        drop(state);
        self.notify();
    }

    /// The trimmed history window to accompany a backend question.
    pub async fn history_window(&self, window: usize) -> Vec<HistoryEntry> {
        let state = self.state.read().await;
        history_window(&state.messages, window)
    }

    fn notify(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}
