//! Legacy CSV import.
//!
//! Loads the flat files the dashboard used before it had a database:
//!
//! - `users.csv` with `id,nome,email,password,role` (plaintext passwords)
//! - `favourites.csv` with `id,user,song`, where `user` is the user's name
//! - `chat.csv` with `id,user,time,message`
//!
//! Users are imported first so favourites and messages can be linked to
//! them by name. Missing files are skipped. The import can be re-run: users
//! whose e-mail already exists, favourites already saved, and messages with
//! the same author, time and body as a stored one are skipped.

use std::fmt;
use std::io;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;

use playdeck_core::UserRole;
use playdeck_web::db::{ChatRepository, FavouriteRepository, UserRepository};
use playdeck_web::models::chat::CHAT_TIME_FORMAT;
use playdeck_web::services::auth::{AuthError, AuthService};

use super::CliError;

const USERS_FILE: &str = "users.csv";
const FAVOURITES_FILE: &str = "favourites.csv";
const CHAT_FILE: &str = "chat.csv";

#[derive(Debug, Deserialize)]
struct LegacyUser {
    nome: String,
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    role: String,
}

#[derive(Debug, Deserialize)]
struct LegacyFavourite {
    user: String,
    song: String,
}

#[derive(Debug, Deserialize)]
struct LegacyMessage {
    user: String,
    time: String,
    message: String,
}

/// Imported and skipped row counts for one file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub imported: usize,
    pub skipped: usize,
}

/// Outcome of a full import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub users: Tally,
    pub favourites: Tally,
    pub messages: Tally,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Import complete")?;
        writeln!(
            f,
            "  users:      {} imported, {} skipped",
            self.users.imported, self.users.skipped
        )?;
        writeln!(
            f,
            "  favourites: {} imported, {} skipped",
            self.favourites.imported, self.favourites.skipped
        )?;
        write!(
            f,
            "  chat:       {} imported, {} skipped",
            self.messages.imported, self.messages.skipped
        )
    }
}

/// Import every legacy file found in `dir`.
pub async fn run(pool: &SqlitePool, dir: &Path) -> Result<ImportSummary, CliError> {
    let mut summary = ImportSummary::default();

    if let Some(rows) = read_rows::<LegacyUser>(&dir.join(USERS_FILE)).await? {
        summary.users = import_users(pool, rows).await?;
    }
    if let Some(rows) = read_rows::<LegacyFavourite>(&dir.join(FAVOURITES_FILE)).await? {
        summary.favourites = import_favourites(pool, rows).await?;
    }
    if let Some(rows) = read_rows::<LegacyMessage>(&dir.join(CHAT_FILE)).await? {
        summary.messages = import_messages(pool, rows).await?;
    }

    Ok(summary)
}

/// Read a CSV file into rows, or `None` when the file does not exist.
///
/// Rows that fail to deserialize are logged and dropped.
async fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>, CliError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "File not found, skipping");
            return Ok(None);
        }
        Err(e) => {
            return Err(CliError::Csv {
                path: path.display().to_string(),
                message: e.to_string(),
            });
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<T>().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => {
                // Header is line 1
                tracing::warn!(path = %path.display(), line = index + 2, "Skipping malformed row: {e}");
            }
        }
    }

    Ok(Some(rows))
}

async fn import_users(pool: &SqlitePool, rows: Vec<LegacyUser>) -> Result<Tally, CliError> {
    let auth = AuthService::new(pool);
    let mut tally = Tally::default();

    for row in rows {
        let role = row.role.parse::<UserRole>().unwrap_or_default();

        match auth
            .register(&row.nome, &row.email, &row.password, role)
            .await
        {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, email = %user.email, "Imported user");
                tally.imported += 1;
            }
            Err(AuthError::UserAlreadyExists) => {
                tracing::info!(email = %row.email, "User already exists, skipping");
                tally.skipped += 1;
            }
            Err(e) if e.is_invalid_input() => {
                tracing::warn!(email = %row.email, "Skipping invalid user: {e}");
                tally.skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(tally)
}

async fn import_favourites(
    pool: &SqlitePool,
    rows: Vec<LegacyFavourite>,
) -> Result<Tally, CliError> {
    let users = UserRepository::new(pool);
    let favourites = FavouriteRepository::new(pool);
    let mut tally = Tally::default();

    for row in rows {
        let song = row.song.trim();
        let Some(user) = users.get_by_name(&row.user).await? else {
            tracing::warn!(user = %row.user, song, "Unknown user, skipping favourite");
            tally.skipped += 1;
            continue;
        };

        if !song.is_empty() && favourites.add(user.id, song).await? {
            tally.imported += 1;
        } else {
            tally.skipped += 1;
        }
    }

    Ok(tally)
}

/// Messages from names with no account are kept, unlinked.
async fn import_messages(pool: &SqlitePool, rows: Vec<LegacyMessage>) -> Result<Tally, CliError> {
    let users = UserRepository::new(pool);
    let chat = ChatRepository::new(pool);
    let mut tally = Tally::default();

    for row in rows {
        let body = row.message.trim();
        let sent_at = match NaiveDateTime::parse_from_str(&row.time, CHAT_TIME_FORMAT) {
            Ok(time) => time.and_utc(),
            Err(e) => {
                tracing::warn!(time = %row.time, "Skipping message with bad timestamp: {e}");
                tally.skipped += 1;
                continue;
            }
        };
        if body.is_empty() {
            tally.skipped += 1;
            continue;
        }

        let user_id = users.get_by_name(&row.user).await?.map(|u| u.id);
        if chat
            .add_message_once(user_id, &row.user, body, sent_at)
            .await?
            .is_some()
        {
            tally.imported += 1;
        } else {
            tracing::debug!(user = %row.user, %sent_at, "Message already imported, skipping");
            tally.skipped += 1;
        }
    }

    Ok(tally)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use playdeck_core::Email;

    use super::*;
    use crate::commands::test_support::migrated_pool;

    fn write_legacy_files(dir: &Path) {
        fs::write(
            dir.join(USERS_FILE),
            "id,nome,email,password,role\n\
             1,Ana,ana@example.com,secret,admin\n\
             2,Rui,rui@example.com,hunter2,user\n\
             3,Bad,not-an-email,pw,user\n",
        )
        .unwrap();
        fs::write(
            dir.join(FAVOURITES_FILE),
            "id,user,song\n\
             1,Ana,Blinding Lights\n\
             2,Ana,Blinding Lights\n\
             3,Ghost,Levitating\n",
        )
        .unwrap();
        fs::write(
            dir.join(CHAT_FILE),
            "id,user,time,message\n\
             1,Rui,2024-03-01 10:00:00,Hello there\n\
             2,Ghost,2024-03-01 10:05:00,Anyone here?\n\
             3,Rui,yesterday,Broken time\n",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_import_counts() {
        let (dir, pool) = migrated_pool().await;
        write_legacy_files(dir.path());

        let summary = run(&pool, dir.path()).await.unwrap();

        assert_eq!(summary.users, Tally { imported: 2, skipped: 1 });
        assert_eq!(summary.favourites, Tally { imported: 1, skipped: 2 });
        assert_eq!(summary.messages, Tally { imported: 2, skipped: 1 });
    }

    #[tokio::test]
    async fn test_imported_passwords_are_hashed() {
        let (dir, pool) = migrated_pool().await;
        write_legacy_files(dir.path());
        run(&pool, dir.path()).await.unwrap();

        let (user, hash) = UserRepository::new(&pool)
            .get_by_email(&Email::parse("ana@example.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(user.is_admin());
        assert_ne!(hash, "secret");

        let logged_in = AuthService::new(&pool)
            .login("ana@example.com", "secret")
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_messages_keep_time_and_author() {
        let (dir, pool) = migrated_pool().await;
        write_legacy_files(dir.path());
        run(&pool, dir.path()).await.unwrap();

        let messages = ChatRepository::new(&pool).list_messages().await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].display_time(), "2024-03-01 10:00:00");
        assert!(messages[0].user_id.is_some());
        assert_eq!(messages[1].author_name, "Ghost");
        assert!(messages[1].user_id.is_none());
    }

    #[tokio::test]
    async fn test_rerun_skips_existing_rows() {
        let (dir, pool) = migrated_pool().await;
        write_legacy_files(dir.path());
        run(&pool, dir.path()).await.unwrap();

        let again = run(&pool, dir.path()).await.unwrap();
        assert_eq!(again.users, Tally { imported: 0, skipped: 3 });
        assert_eq!(again.favourites.imported, 0);
        assert_eq!(again.messages, Tally { imported: 0, skipped: 3 });

        let messages = ChatRepository::new(&pool).list_messages().await.unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_files_are_skipped() {
        let (dir, pool) = migrated_pool().await;

        let summary = run(&pool, dir.path()).await.unwrap();
        assert_eq!(summary, ImportSummary::default());
    }
}
