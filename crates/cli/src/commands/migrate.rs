//! Database migration command.
//!
//! ```bash
//! playdeck-cli migrate
//! ```
//!
//! Migrations live in `crates/web/migrations/` and are embedded in the web
//! crate, so the CLI and the server always agree on the schema.

use sqlx::SqlitePool;

use playdeck_web::db;

use super::CliError;

/// Apply any pending migrations.
pub async fn run(pool: &SqlitePool) -> Result<(), CliError> {
    tracing::info!("Running migrations...");
    db::run_migrations(pool).await?;
    tracing::info!("Migrations complete!");
    Ok(())
}
