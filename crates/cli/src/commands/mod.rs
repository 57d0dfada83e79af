//! CLI subcommands.

pub mod import;
pub mod migrate;
pub mod user;

use playdeck_web::config::{ConfigError, WebConfig};
use playdeck_web::db::{self, RepositoryError};
use playdeck_web::services::auth::AuthError;
use sqlx::SqlitePool;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migrations failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// User creation failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: user, admin")]
    InvalidRole(String),

    /// A legacy CSV file could not be read.
    #[error("Failed to read {path}: {message}")]
    Csv { path: String, message: String },
}

/// Open the database configured for the web server.
pub async fn connect() -> Result<SqlitePool, CliError> {
    let config = WebConfig::from_env()?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&config.database_url).await?)
}

#[cfg(test)]
pub(crate) mod test_support {
    use secrecy::SecretString;
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    use playdeck_web::db;

    /// A migrated database in a fresh temporary directory.
    pub async fn migrated_pool() -> (TempDir, SqlitePool) {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("cli.db").display());
        let pool = db::create_pool(&SecretString::from(url))
            .await
            .expect("pool");
        db::run_migrations(&pool).await.expect("migrations");
        (dir, pool)
    }
}
