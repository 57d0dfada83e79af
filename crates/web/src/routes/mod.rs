//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET       /, /home                 - Landing page
//! GET       /health                  - Liveness check
//! GET       /health/ready            - Readiness check (database)
//!
//! # Auth
//! GET|POST  /login                   - Login form / action
//! GET|POST  /register                - Registration form / action
//! GET|POST  /logout                  - Clear the session
//!
//! # Signed-in users
//! GET       /dashboard               - Stats, charts and the track table
//! GET       /favourites              - Favourite songs, enriched from the dataset
//! POST      /favourites/add          - Add a song
//! POST      /favourites/remove/{id}  - Remove one of your favourites
//! GET       /chat                    - Shared chat room
//! POST      /chat/send               - Post a message
//!
//! # Admins
//! GET       /admin                   - User list and create form
//! POST      /admin/create            - Create a user
//! POST      /admin/promote/{id}      - Grant admin
//! POST      /admin/demote/{id}       - Revoke admin
//! POST      /admin/delete/{id}       - Delete a user
//! ```

pub mod admin;
pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod favourites;
pub mod health;
pub mod home;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", get(auth::logout).post(auth::logout))
}

/// Create the favourites routes router.
pub fn favourite_routes() -> Router<AppState> {
    Router::new()
        .route("/favourites", get(favourites::index))
        .route("/favourites/add", post(favourites::add))
        .route("/favourites/remove/{id}", post(favourites::remove))
}

/// Create the chat routes router.
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", get(chat::index))
        .route("/chat/send", post(chat::send))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::index))
        .route("/admin/create", post(admin::create))
        .route("/admin/promote/{id}", post(admin::promote))
        .route("/admin/demote/{id}", post(admin::demote))
        .route("/admin/delete/{id}", post(admin::delete))
}

/// Create all routes for the web app.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::landing))
        .route("/home", get(home::landing))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/dashboard", get(dashboard::show))
        .merge(auth_routes())
        .merge(favourite_routes())
        .merge(chat_routes())
        .merge(admin_routes())
}
