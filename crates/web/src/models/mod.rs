//! Domain models for Playdeck.
//!
//! These types represent validated domain objects separate from database row types.

pub mod chat;
pub mod favourite;
pub mod session;
pub mod user;

pub use chat::ChatMessage;
pub use favourite::Favourite;
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
