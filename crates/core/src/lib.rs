//! Playdeck Core - Shared types library.
//!
//! This crate provides common types used across all Playdeck components:
//! - `web` - The listening dashboard (pages, chat, favourites, admin panel)
//! - `cli` - Command-line tools for migrations, user management and CSV import
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and user roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
