//! Interactive track table for the dashboard.
//!
//! The server renders every filtered row; sorting and per-column text filters
//! run in the browser (`static/js/track-table.js`).

use std::collections::HashSet;

use askama::Template;

use crate::services::dataset::Track;

/// Column definition for the track table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    /// Unique key for the column, used as a `data-` attribute.
    pub key: &'static str,
    /// Display label for the column header.
    pub label: &'static str,
    /// Whether the header sorts the table on click.
    pub sortable: bool,
    /// Whether the header offers a text filter dropdown.
    pub filterable: bool,
}

impl TableColumn {
    /// Create a sortable, filterable column.
    #[must_use]
    pub const fn sortable(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: true,
            filterable: true,
        }
    }

    /// Create a column with neither sorting nor filtering.
    #[must_use]
    pub const fn plain(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: false,
            filterable: false,
        }
    }

    /// Remove the text filter dropdown.
    #[must_use]
    pub const fn without_filter(mut self) -> Self {
        self.filterable = false;
        self
    }
}

/// Column layout, in display order.
#[must_use]
pub fn track_columns() -> Vec<TableColumn> {
    vec![
        TableColumn::plain("favourite", "Favourite"),
        TableColumn::sortable("track", "Track"),
        TableColumn::sortable("artist", "Artist"),
        TableColumn::sortable("album", "Album"),
        TableColumn::sortable("year", "Year"),
        TableColumn::sortable("plays", "Plays").without_filter(),
        TableColumn::sortable("genre", "Genre"),
        TableColumn::sortable("duration", "Duration (min)").without_filter(),
    ]
}

/// One rendered row. Energy and danceability are never shown.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRow {
    pub track_name: String,
    pub artist: String,
    pub album: String,
    pub year: i64,
    pub plays: i64,
    pub genre: String,
    pub duration_min: String,
    /// Already in the signed-in user's favourites.
    pub is_favourite: bool,
}

impl TrackRow {
    fn new(track: &Track, favourites: &HashSet<String>) -> Self {
        Self {
            track_name: track.track_name.clone(),
            artist: track.artist.clone(),
            album: track.album.clone().unwrap_or_default(),
            year: track.year,
            plays: track.play_count,
            genre: track.genre.clone().unwrap_or_default(),
            duration_min: track
                .duration_minutes()
                .map(|m| format!("{m:.2}"))
                .unwrap_or_default(),
            is_favourite: favourites.contains(&track.track_name),
        }
    }
}

/// The dashboard table, rendered as its own template.
#[derive(Debug, Template)]
#[template(path = "components/track_table.html")]
pub struct TrackTable {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<TrackRow>,
}

impl TrackTable {
    /// Build the table for `tracks`, marking songs in `favourites`.
    #[must_use]
    pub fn build(tracks: &[&Track], favourites: &HashSet<String>) -> Self {
        Self {
            columns: track_columns(),
            rows: tracks
                .iter()
                .map(|t| TrackRow::new(t, favourites))
                .collect(),
        }
    }
}
