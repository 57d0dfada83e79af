//! Business logic services.
//!
//! Services sit between route handlers and repositories. They own the rules
//! that are not simple queries: password hashing, dataset aggregation and
//! chart building.

pub mod auth;
pub mod charts;
pub mod dataset;
