//! Reusable page components.

pub mod track_table;

pub use track_table::TrackTable;
