//! Favourite songs repository.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use playdeck_core::{FavouriteId, UserId};

use super::RepositoryError;
use crate::models::Favourite;

#[derive(Debug, sqlx::FromRow)]
struct FavouriteRow {
    id: FavouriteId,
    user_id: UserId,
    song: String,
    created_at: DateTime<Utc>,
}

impl From<FavouriteRow> for Favourite {
    fn from(row: FavouriteRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            song: row.song,
            created_at: row.created_at,
        }
    }
}

/// Repository for favourite songs.
pub struct FavouriteRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FavouriteRepository<'a> {
    /// Create a new favourite repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Mark a song as favourite for a user.
    ///
    /// Adding a song the user already has is a no-op.
    ///
    /// # Returns
    ///
    /// Returns `true` if a new row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails (including an unknown user).
    #[instrument(skip(self))]
    pub async fn add(&self, user_id: UserId, song: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("INSERT OR IGNORE INTO favourite (user_id, song) VALUES (?, ?)")
            .bind(user_id)
            .bind(song)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All favourites of a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Favourite>, RepositoryError> {
        let rows = sqlx::query_as::<_, FavouriteRow>(
            "SELECT id, user_id, song, created_at FROM favourite WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Favourite::from).collect())
    }

    /// Song names a user has favourited.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn songs_for_user(&self, user_id: UserId) -> Result<HashSet<String>, RepositoryError> {
        let songs = sqlx::query_scalar::<_, String>("SELECT song FROM favourite WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;
        Ok(songs.into_iter().collect())
    }

    /// Remove a favourite, only if it belongs to `user_id`.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: UserId, id: FavouriteId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM favourite WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use playdeck_core::{Email, UserRole};

    use super::*;
    use crate::db::UserRepository;
    use crate::db::test_support::migrated_pool;

    async fn user(pool: &SqlitePool, name: &str) -> UserId {
        let email = Email::parse(&format!("{name}@example.com")).unwrap();
        UserRepository::new(pool)
            .create(name, &email, "h", UserRole::User)
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let (_dir, pool) = migrated_pool().await;
        let ana = user(&pool, "ana").await;
        let repo = FavouriteRepository::new(&pool);

        assert!(repo.add(ana, "Blinding Lights").await.unwrap());
        assert!(!repo.add(ana, "Blinding Lights").await.unwrap());

        let favourites = repo.list_for_user(ana).await.unwrap();
        assert_eq!(favourites.len(), 1);
        assert_eq!(favourites[0].song, "Blinding Lights");

        let songs = repo.songs_for_user(ana).await.unwrap();
        assert!(songs.contains("Blinding Lights"));
    }

    #[tokio::test]
    async fn test_remove_is_scoped_to_owner() {
        let (_dir, pool) = migrated_pool().await;
        let ana = user(&pool, "ana").await;
        let rui = user(&pool, "rui").await;
        let repo = FavouriteRepository::new(&pool);

        repo.add(ana, "Song").await.unwrap();
        let id = repo.list_for_user(ana).await.unwrap()[0].id;

        assert!(!repo.remove(rui, id).await.unwrap());
        assert_eq!(repo.list_for_user(ana).await.unwrap().len(), 1);

        assert!(repo.remove(ana, id).await.unwrap());
        assert!(repo.list_for_user(ana).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_user_cascades() {
        let (_dir, pool) = migrated_pool().await;
        let ana = user(&pool, "ana").await;
        let repo = FavouriteRepository::new(&pool);
        repo.add(ana, "Song").await.unwrap();

        UserRepository::new(&pool).delete(ana).await.unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favourite")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
