//! User repository for database operations.
//!
//! Queries are built at runtime with `query_as` and mapped through
//! `FromRow` row types, then validated into domain types.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use playdeck_core::{Email, UserId, UserRole};

use super::{RepositoryError, conflict_on_unique};
use crate::models::User;

/// Raw `user` row before validation.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
}

/// `user` row including the password hash, only used for login.
#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = row.role.parse::<UserRole>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            role,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, name, email, role, created_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, password_hash), fields(email = %email))]
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO user (name, email, password_hash, role) VALUES (?, ?, ?, ?) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email.as_str())
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        row.try_into()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// Get a user and their password hash by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM user WHERE email = ?"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Get the first user (lowest id) with the given display name.
    ///
    /// Names are not unique; legacy CSV data links records by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE name = ? ORDER BY id LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    /// List every user ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM user ORDER BY id"))
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    /// Number of accounts with the admin role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_admins(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user WHERE role = ?")
            .bind(UserRole::Admin.as_str())
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Change a user's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this id.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn set_role(&self, id: UserId, role: UserRole) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE user SET role = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Revoke the admin role unless the user is the last admin.
    ///
    /// The check and the update are one statement, so concurrent demotions
    /// can never leave the database without an admin.
    ///
    /// # Returns
    ///
    /// `Unchanged` if the user does not exist or is not an admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn demote(&self, id: UserId) -> Result<AdminChange, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE user SET role = 'user'
            WHERE id = ? AND role = 'admin'
              AND (SELECT COUNT(*) FROM user WHERE role = 'admin') > 1
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(AdminChange::Applied);
        }
        self.classify_refusal(id).await
    }

    /// Delete a user unless they are the last admin.
    ///
    /// Their favourites are removed by the foreign key cascade. Their chat
    /// messages are kept with the author name they were sent under.
    ///
    /// # Returns
    ///
    /// `Unchanged` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: UserId) -> Result<AdminChange, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM user
            WHERE id = ?
              AND (role <> 'admin' OR (SELECT COUNT(*) FROM user WHERE role = 'admin') > 1)
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(AdminChange::Applied);
        }
        self.classify_refusal(id).await
    }

    /// Explain why a guarded change touched no row.
    async fn classify_refusal(&self, id: UserId) -> Result<AdminChange, RepositoryError> {
        Ok(match self.get_by_id(id).await? {
            Some(user) if user.is_admin() => AdminChange::LastAdmin,
            _ => AdminChange::Unchanged,
        })
    }
}

/// Outcome of a change guarded by the "at least one admin" rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminChange {
    /// The row was updated or deleted.
    Applied,
    /// Nothing to do: the user is missing or the change does not apply.
    Unchanged,
    /// Refused because the user is the only admin.
    LastAdmin,
}
