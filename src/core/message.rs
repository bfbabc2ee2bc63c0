//! # Message Store
//!
//! The ordered conversation of one widget instance. Insertion order is
//! display order, newest last. Messages are never removed one by one; the
//! whole store is cleared when the widget is destroyed.

use std::fmt;

use chrono::Utc;
use serde::Serialize;

use crate::transport::{ChatResponse, Citation, HistoryItem, Role};

/// How many history entries a request carries. The backend trims further.
pub const HISTORY_LIMIT: usize = 10;

/// Prepended to the reason of a failed exchange.
pub const FAILURE_PREFIX: &str = "Failed to fetch reply. ";

/// Shown when a failure carries no message of its own.
const UNKNOWN_ERROR: &str = "Unknown error";

/// Client-generated message identifier: a millisecond timestamp in hex plus
/// a random suffix. Unique within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MessageId(String);

impl MessageId {
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        MessageId(format!("{:x}-{}", millis, uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    /// True from creation until content arrives or the exchange ends.
    pub pending: bool,
    /// True if the exchange failed; `content` then holds the reason.
    pub error: bool,
    /// Citations, attached only on successful completion.
    pub sources: Option<Vec<Citation>>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), false)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into(), false)
    }

    /// An empty assistant message waiting for its first delta.
    pub fn placeholder() -> Self {
        Self::new(Role::Assistant, String::new(), true)
    }

    fn new(role: Role, content: String, pending: bool) -> Self {
        Self {
            id: MessageId::generate(),
            role,
            content,
            pending,
            error: false,
            sources: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns a reference to it.
    pub fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    fn get_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| &m.id == id)
    }

    /// Appends streamed text. The first non-empty fragment clears `pending`.
    ///
    /// Returns false if no message has this id.
    pub fn append(&mut self, id: &MessageId, text: &str) -> bool {
        match self.get_mut(id) {
            Some(message) => {
                if !text.is_empty() {
                    message.pending = false;
                }
                message.content.push_str(text);
                true
            }
            None => false,
        }
    }

    /// Finalizes a message with the server's canonical payload.
    ///
    /// A non-empty `response` replaces the streamed text; an empty one keeps it.
    pub fn settle(&mut self, id: &MessageId, payload: ChatResponse) -> bool {
        match self.get_mut(id) {
            Some(message) => {
                message.pending = false;
                if !payload.response.is_empty() {
                    message.content = payload.response;
                }
                message.sources = payload.sources;
                true
            }
            None => false,
        }
    }

    /// Marks a message as failed and replaces its content with the reason.
    pub fn fail(&mut self, id: &MessageId, reason: &str) -> bool {
        match self.get_mut(id) {
            Some(message) => {
                let reason = if reason.is_empty() { UNKNOWN_ERROR } else { reason };
                message.pending = false;
                message.error = true;
                message.content = format!("{FAILURE_PREFIX}{reason}");
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn pending_count(&self) -> usize {
        self.messages.iter().filter(|m| m.pending).count()
    }

    /// The most recent `limit` messages with non-empty content, oldest first,
    /// as `{role, content}` pairs.
    pub fn history_window(&self, limit: usize) -> Vec<HistoryItem> {
        let qualifying: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| !m.content.is_empty())
            .collect();
        let start = qualifying.len().saturating_sub(limit);
        qualifying[start..]
            .iter()
            .map(|m| HistoryItem {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }
}
