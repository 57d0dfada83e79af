//! Integration tests for Playdeck.
//!
//! Each [`TestContext`] serves the full application on an ephemeral port with
//! its own temporary `SQLite` database and dataset file, so tests run in
//! parallel without any external services:
//!
//! ```bash
//! cargo test -p playdeck-integration-tests
//! ```
//!
//! Clients keep cookies between requests and never follow redirects, so
//! tests can assert on `Location` headers.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode, redirect};
use secrecy::SecretString;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use playdeck_core::UserRole;
use playdeck_web::config::{DatasetConfig, WebConfig};
use playdeck_web::models::User;
use playdeck_web::services::auth::AuthService;
use playdeck_web::state::AppState;
use playdeck_web::{app, db, middleware};

/// Listening dataset used by every test context.
///
/// "Quiet Song" has no album, genre or duration; energy values must never
/// reach the page.
pub const DATASET_CSV: &str = "\
track_name,artist,album,year,play_count,duration_ms,genre,energy,danceability
Blinding Lights,The Weeknd,After Hours,2020,3000000,200040,synthpop,0.73,0.51
Save Your Tears,The Weeknd,After Hours,2020,1500000,215627,synthpop,0.68,0.68
Levitating,Dua Lipa,Future Nostalgia,2020,2000000,203064,disco-pop,0.82,0.70
Bohemian Rhapsody,Queen,A Night at the Opera,1975,2500000,354320,rock,0.40,0.39
Quiet Song,Nobody,,2001,10,,,0.10,0.20
";

/// A running application with its own database and dataset.
pub struct TestContext {
    pub base_url: String,
    pub pool: SqlitePool,
    dir: TempDir,
    server: JoinHandle<()>,
}

impl TestContext {
    /// Start the application with the standard dataset.
    pub async fn new() -> Self {
        Self::start(Some(DATASET_CSV)).await
    }

    /// Start the application without a dataset file.
    pub async fn without_dataset() -> Self {
        Self::start(None).await
    }

    async fn start(dataset: Option<&str>) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let dataset_path = dir.path().join("spotify.csv");
        if let Some(csv) = dataset {
            std::fs::write(&dataset_path, csv).expect("Failed to write dataset");
        }

        let database_url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("playdeck.db").display()
        );

        let config = WebConfig {
            database_url: SecretString::from(database_url),
            host: Ipv4Addr::LOCALHOST.into(),
            port: 0,
            base_url: "http://localhost".to_string(),
            dataset: DatasetConfig {
                path: dataset_path,
                cache_ttl: Duration::from_secs(60),
            },
            static_dir: Path::new(env!("CARGO_MANIFEST_DIR")).join("../web/static"),
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };

        let pool = db::create_pool(&config.database_url)
            .await
            .expect("Failed to create pool");
        db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let session_store = middleware::create_session_store(&pool)
            .await
            .expect("Failed to create session store");

        let router = app(AppState::new(config, pool.clone()), session_store);

        let listener = tokio::net::TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let server = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            base_url: format!("http://{addr}"),
            pool,
            dir,
            server,
        }
    }

    /// Directory holding the database and dataset.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A fresh, signed-out client.
    #[must_use]
    pub fn client() -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Insert a user directly through the auth service.
    pub async fn create_user(&self, name: &str, email: &str, password: &str, role: UserRole) -> User {
        AuthService::new(&self.pool)
            .register(name, email, password, role)
            .await
            .expect("Failed to create user")
    }

    /// Create a user and return a client signed in as them.
    pub async fn signed_in(&self, name: &str, email: &str, role: UserRole) -> (User, Client) {
        let user = self.create_user(name, email, "password123", role).await;
        let client = self.login(email, "password123").await;
        (user, client)
    }

    /// Log in through the form and return the signed-in client.
    pub async fn login(&self, email: &str, password: &str) -> Client {
        let client = Self::client();
        let resp = client
            .post(self.url("/login"))
            .form(&[("email", email), ("password", password)])
            .send()
            .await
            .expect("Failed to log in");
        assert_eq!(location(&resp), Some("/dashboard"), "login failed for {email}");
        client
    }

    /// GET `path` and return status and body.
    pub async fn get(&self, client: &Client, path: &str) -> (StatusCode, String) {
        let resp = client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed");
        let status = resp.status();
        (status, resp.text().await.expect("Failed to read body"))
    }

    /// POST a form to `path`.
    pub async fn post(&self, client: &Client, path: &str, form: &[(&str, &str)]) -> Response {
        client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("Request failed")
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// The `Location` header of a redirect, if any.
#[must_use]
pub fn location(resp: &Response) -> Option<&str> {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
