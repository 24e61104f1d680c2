//! Message Types
//!
//! Conversation messages and the signals the session core emits toward
//! whatever surface is rendering it.
//!
//! # Design Philosophy
//!
//! The session core owns all conversation state. Surfaces are pure renderers:
//! they feed user intent into [`crate::session::ConversationSession`] and
//! react to the [`SessionEvent`]s it emits. Messages are immutable once
//! appended; history is an append-only ordered sequence.

use serde::{Deserialize, Serialize};

/// Message identifier
///
/// Time-ordered and unique: a millisecond timestamp combined with an atomic
/// counter, so two messages created in the same millisecond still get
/// distinct, ordered ids. Both parts are zero-padded to fixed width so the
/// derived lexicographic `Ord` matches creation order across the counter's
/// whole range.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::time::{SystemTime, UNIX_EPOCH};

        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let count = COUNTER.fetch_add(1, Ordering::SeqCst);
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(format_id(timestamp, count))
    }
}

/// Fixed-width id rendering: 13 timestamp digits, 20 counter digits
fn format_id(timestamp_ms: u128, count: u64) -> String {
    format!("msg_{timestamp_ms:013}_{count:020}")
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    /// User input
    User,
    /// AI assistant (Cortex)
    Assistant,
}

/// A message in the conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,
    /// Who sent this message
    pub role: MessageRole,
    /// Message content
    pub content: String,
    /// When the message was created (Unix timestamp ms)
    pub created_at: u64,
}

impl Message {
    /// Create a new message
    pub fn new(role: MessageRole, content: String) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content,
            created_at: now_ms(),
        }
    }
}

/// Signals from the session core to the rendering surface
///
/// Surfaces drain these from [`crate::session::ConversationSession::poll`]
/// and update their display accordingly. They carry no business logic.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// History changed; the view should scroll to the newest message
    ScrollToLatest,
    /// The pending flag flipped (disable/enable input, show typing indicator)
    PendingChanged {
        /// Whether a query is now in flight
        pending: bool,
    },
    /// The actively voiced message changed
    SpeechChanged {
        /// Message currently being voiced, or `None` when the voice is idle
        active: Option<MessageId>,
    },
}

/// Get current timestamp in milliseconds
pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
