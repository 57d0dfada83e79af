//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! playdeck-cli user create -n "Admin" -e admin@example.com -p secret -r admin
//! playdeck-cli user list
//! ```

use playdeck_core::UserRole;
use playdeck_web::db::UserRepository;
use playdeck_web::models::User;
use playdeck_web::services::auth::AuthService;
use sqlx::SqlitePool;

use super::CliError;

/// Create a new user.
///
/// # Returns
///
/// The created user.
pub async fn create(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<User, CliError> {
    let role: UserRole = role
        .parse()
        .map_err(|_| CliError::InvalidRole(role.to_owned()))?;

    tracing::info!("Creating user: {} ({})", email, role);

    let user = AuthService::new(pool)
        .register(name, email, password, role)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );

    Ok(user)
}

/// Print every user, one per line.
pub async fn list(pool: &SqlitePool) -> Result<(), CliError> {
    let users = UserRepository::new(pool).list_all().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{:<6} {:<8} {:<24} EMAIL", "ID", "ROLE", "NAME");
        for user in &users {
            println!(
                "{:<6} {:<8} {:<24} {}",
                user.id.to_string(),
                user.role.to_string(),
                user.name,
                user.email
            );
        }
        println!("{} user(s)", users.len());
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::test_support::migrated_pool;

    #[tokio::test]
    async fn test_create_admin() {
        let (_dir, pool) = migrated_pool().await;

        let user = create(&pool, "Root", "root@example.com", "pw", "admin")
            .await
            .unwrap();
        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_role() {
        let (_dir, pool) = migrated_pool().await;

        let err = create(&pool, "Root", "root@example.com", "pw", "owner")
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidRole(_)));
    }
}
