//! User domain types.

use chrono::{DateTime, Utc};

use playdeck_core::{Email, UserId, UserRole};

/// A dashboard account (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name, shown in chat and the admin panel.
    pub name: String,
    /// Login e-mail address, unique across accounts.
    pub email: Email,
    /// Permission level.
    pub role: UserRole,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether this account can use the admin panel.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
