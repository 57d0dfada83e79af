//! Dashboard route handler.
//!
//! The track table and the artist chart are filtered independently: the
//! `table_*` parameters drive the table, the stats panel and the genre chart,
//! the `graph_*` parameters drive the artist chart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use crate::components::TrackTable;
use crate::db::FavouriteRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::services::charts::{artist_bar_chart, genre_pie_chart};
use crate::services::dataset::{
    TOP_GENRES, TrackFilter, format_compact, summarize, top_artists, top_artists_limit,
    top_genres,
};
use crate::state::AppState;

/// Dashboard query parameters, kept as raw strings so they can be echoed back.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub table_min_plays: Option<String>,
    pub table_min_year: Option<String>,
    pub table_max_year: Option<String>,
    pub graph_min_plays: Option<String>,
    pub graph_min_year: Option<String>,
    pub graph_max_year: Option<String>,
    pub graph_top_artists: Option<String>,
}

impl DashboardQuery {
    fn table_filter(&self) -> TrackFilter {
        TrackFilter::from_raw(
            self.table_min_plays.as_deref(),
            self.table_min_year.as_deref(),
            self.table_max_year.as_deref(),
        )
    }

    fn graph_filter(&self) -> TrackFilter {
        TrackFilter::from_raw(
            self.graph_min_plays.as_deref(),
            self.graph_min_year.as_deref(),
            self.graph_max_year.as_deref(),
        )
    }
}

/// A genre line in the stats panel.
pub struct GenreStat {
    pub name: String,
    pub plays: String,
}

/// Headline numbers, already formatted.
pub struct StatsView {
    pub total_plays: String,
    pub total_minutes: String,
    pub tracks: usize,
    pub artists: usize,
    pub albums: usize,
    pub top_genres: Vec<GenreStat>,
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub current_user: Option<CurrentUser>,
    pub stats: StatsView,
    /// Rendered track table component.
    pub table: String,
    /// Rendered artist bar chart.
    pub artist_chart: String,
    /// Rendered genre pie chart, absent without genre data.
    pub genre_chart: Option<String>,
    pub table_min_plays: String,
    pub table_min_year: String,
    pub table_max_year: String,
    pub graph_min_plays: String,
    pub graph_min_year: String,
    pub graph_max_year: String,
    pub graph_top_artists: String,
}

/// Display the dashboard.
///
/// Returns 503 when the dataset file is missing.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
#[allow(clippy::cast_precision_loss)]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, AppError> {
    let catalog = state.catalog().await?;
    let favourites = FavouriteRepository::new(state.pool())
        .songs_for_user(user.id)
        .await?;

    let table_rows = catalog.filtered(&query.table_filter());
    let graph_rows = catalog.filtered(&query.graph_filter());

    let summary = summarize(&table_rows);
    let genres = top_genres(&table_rows, TOP_GENRES);
    let top_n = top_artists_limit(query.graph_top_artists.as_deref());

    let stats = StatsView {
        total_plays: format_compact(summary.total_plays as f64, false),
        total_minutes: format_compact(summary.total_minutes, true),
        tracks: summary.tracks,
        artists: summary.artists,
        albums: summary.albums,
        top_genres: genres
            .iter()
            .map(|g| GenreStat {
                name: g.name.clone(),
                plays: format_compact(g.plays as f64, false),
            })
            .collect(),
    };

    let genre_chart = genre_pie_chart(&genres).map(|figure| figure.render());
    let artist_chart = artist_bar_chart(&top_artists(&graph_rows, top_n), top_n).render();
    let table = TrackTable::build(&table_rows, &favourites).render()?;

    Ok(DashboardTemplate {
        current_user: Some(user),
        stats,
        table,
        artist_chart,
        genre_chart,
        table_min_plays: query.table_min_plays.unwrap_or_default(),
        table_min_year: query.table_min_year.unwrap_or_default(),
        table_max_year: query.table_max_year.unwrap_or_default(),
        graph_min_plays: query.graph_min_plays.unwrap_or_default(),
        graph_min_year: query.graph_min_year.unwrap_or_default(),
        graph_max_year: query.graph_max_year.unwrap_or_default(),
        graph_top_artists: query
            .graph_top_artists
            .unwrap_or_else(|| top_n.to_string()),
    })
}
