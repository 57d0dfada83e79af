//! Chat message domain types.

use chrono::{DateTime, Utc};

use playdeck_core::{ChatMessageId, UserId};

/// Display format for message timestamps.
pub const CHAT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A message in the shared chat room.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: ChatMessageId,
    /// Author account, `None` once the author has been deleted.
    pub user_id: Option<UserId>,
    /// Author name at the time the message was sent.
    pub author_name: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Timestamp formatted for display.
    #[must_use]
    pub fn display_time(&self) -> String {
        self.sent_at.format(CHAT_TIME_FORMAT).to_string()
    }
}
