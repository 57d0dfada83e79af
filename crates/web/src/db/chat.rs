//! Chat message repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use playdeck_core::{ChatMessageId, UserId};

use super::RepositoryError;
use crate::models::ChatMessage;

#[derive(Debug, sqlx::FromRow)]
struct ChatMessageRow {
    id: ChatMessageId,
    user_id: Option<UserId>,
    author_name: String,
    body: String,
    sent_at: DateTime<Utc>,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            author_name: row.author_name,
            body: row.body,
            sent_at: row.sent_at,
        }
    }
}

/// Repository for the shared chat room.
pub struct ChatRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ChatRepository<'a> {
    /// Create a new chat repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a message.
    ///
    /// `user_id` is `None` only for imported messages whose author no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, body))]
    pub async fn add_message(
        &self,
        user_id: Option<UserId>,
        author_name: &str,
        body: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<ChatMessage, RepositoryError> {
        let row = sqlx::query_as::<_, ChatMessageRow>(
            r"
            INSERT INTO chat_message (user_id, author_name, body, sent_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, user_id, author_name, body, sent_at
            ",
        )
        .bind(user_id)
        .bind(author_name)
        .bind(body)
        .bind(sent_at)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Store a message unless one with the same author, time and body exists.
    ///
    /// Returns `None` when the message was already stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, body))]
    pub async fn add_message_once(
        &self,
        user_id: Option<UserId>,
        author_name: &str,
        body: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<ChatMessage>, RepositoryError> {
        let row = sqlx::query_as::<_, ChatMessageRow>(
            r"
            INSERT INTO chat_message (user_id, author_name, body, sent_at)
            SELECT ?1, ?2, ?3, ?4
            WHERE NOT EXISTS (
                SELECT 1 FROM chat_message
                WHERE author_name = ?2 AND body = ?3 AND sent_at = ?4
            )
            RETURNING id, user_id, author_name, body, sent_at
            ",
        )
        .bind(user_id)
        .bind(author_name)
        .bind(body)
        .bind(sent_at)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ChatMessage::from))
    }

    /// Every message, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_messages(&self) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r"
            SELECT id, user_id, author_name, body, sent_at
            FROM chat_message
            ORDER BY sent_at, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }
}
