//! Conversation message types.
//!
//! This module contains types for representing messages in the session log,
//! including roles, answer sources, and the trimmed history window sent to
//! the backend.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the role of a message in a conversation.
///
/// The set is closed: any other role is rejected when a message log is
/// reconstructed from serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the answering backend.
    Assistant,
}

impl MessageRole {
    /// Wire representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A passage of the indexed document that grounded an answer.
///
/// Produced only by backend responses; never constructed client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Page of the uploaded document the passage came from.
    pub page: i64,
    /// The passage text.
    pub text: String,
}

/// A single entry in the session message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier (UUID format).
    pub id: String,
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
    /// Source passages returned with an answer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    /// Set when this message reports a failed or soft-errored turn.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
    /// Timestamp when the message was created (ISO 8601 format).
    pub timestamp: String,
}

impl Message {
    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content.into(), Vec::new(), false)
    }

    /// Creates an assistant message carrying an answer.
    ///
    /// `error` is the backend's soft-error flag ("no relevant context
    /// found" and the like); the answer text is still displayed.
    pub fn assistant(content: impl Into<String>, sources: Vec<Source>, error: bool) -> Self {
        Self::new(MessageRole::Assistant, content.into(), sources, error)
    }

    /// Creates the synthetic assistant message that resolves a failed turn.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, reason.into(), Vec::new(), true)
    }

    fn new(role: MessageRole, content: String, sources: Vec<Source>, error: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            sources,
            error,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// One entry of the conversational history window sent to the backend.
///
/// Only role and trimmed content travel on the wire; ids, sources and error
/// flags stay local.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub content: String,
}

/// Builds the history window for a backend call: non-empty trimmed contents,
/// most recent `window` entries.
///
/// The full log is retained for display regardless of this truncation.
pub fn history_window(messages: &[Message], window: usize) -> Vec<HistoryEntry> {
    let entries: Vec<HistoryEntry> = messages
        .iter()
        .filter(|msg| !msg.content.trim().is_empty())
        .map(|msg| HistoryEntry {
            role: msg.role,
            content: msg.content.trim().to_string(),
        })
        .collect();

    let skip = entries.len().saturating_sub(window);
    entries.into_iter().skip(skip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_serialize_lowercase() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, r#""assistant""#);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result: Result<MessageRole, _> = serde_json::from_str(r#""system""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_messages_get_unique_ids() {
        let a = Message::user("first");
        let b = Message::user("second");
        assert_ne!(a.id, b.id);
        assert!(!a.timestamp.is_empty());
    }

    #[test]
    fn test_failure_message_is_flagged() {
        let msg = Message::failure("backend unreachable");
        assert_eq!(msg.role, MessageRole::Assistant);
        assert!(msg.error);
        assert!(msg.sources.is_empty());
    }

    #[test]
    fn test_history_window_trims_to_most_recent() {
        let messages: Vec<Message> = (0..25)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("question {i}"))
                } else {
                    Message::assistant(format!("answer {i}"), Vec::new(), false)
                }
            })
            .collect();

        let window = history_window(&messages, 10);
        assert_eq!(window.len(), 10);
        assert_eq!(window[0].content, "question 15".to_string());
        assert_eq!(window[9].content, "answer 24".to_string());
    }

    #[test]
    fn test_history_window_drops_blank_content() {
        let messages = vec![
            Message::user("   "),
            Message::user("  real question  "),
            Message::assistant("", Vec::new(), false),
        ];
        let window = history_window(&messages, 10);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].content, "real question");
    }

    #[test]
    fn test_history_window_shorter_than_limit() {
        let messages = vec![Message::user("only one")];
        assert_eq!(history_window(&messages, 10).len(), 1);
    }
}
