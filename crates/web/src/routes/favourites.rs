//! Favourites route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use playdeck_core::FavouriteId;

use crate::db::FavouriteRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, Favourite};
use crate::services::dataset::{Catalog, DatasetError, Track, TrackFilter};
use crate::state::AppState;

const NOT_AVAILABLE: &str = "N/A";

/// Favourites filter parameters.
#[derive(Debug, Default, Deserialize)]
pub struct FavouritesQuery {
    pub min_plays: Option<String>,
    pub min_year: Option<String>,
    pub max_year: Option<String>,
}

/// Add-favourite form data.
#[derive(Debug, Deserialize)]
pub struct AddFavouriteForm {
    #[serde(default)]
    pub song: String,
}

/// A favourite with details looked up in the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavouriteView {
    pub id: FavouriteId,
    pub song: String,
    pub artist: String,
    pub album: String,
    pub year: String,
    pub plays: String,
    pub duration_min: String,
    pub genre: String,
}

impl FavouriteView {
    fn matched(favourite: &Favourite, track: &Track) -> Self {
        Self {
            id: favourite.id,
            song: favourite.song.clone(),
            artist: track.artist.clone(),
            album: text_or_na(track.album.as_deref()),
            year: track.year.to_string(),
            plays: track.play_count.to_string(),
            duration_min: track
                .duration_minutes()
                .map_or_else(|| NOT_AVAILABLE.to_string(), |m| format!("{m:.2}")),
            genre: text_or_na(track.genre.as_deref()),
        }
    }

    fn unmatched(favourite: &Favourite) -> Self {
        Self {
            id: favourite.id,
            song: favourite.song.clone(),
            artist: NOT_AVAILABLE.to_string(),
            album: NOT_AVAILABLE.to_string(),
            year: NOT_AVAILABLE.to_string(),
            plays: NOT_AVAILABLE.to_string(),
            duration_min: NOT_AVAILABLE.to_string(),
            genre: NOT_AVAILABLE.to_string(),
        }
    }
}

fn text_or_na(value: Option<&str>) -> String {
    value.unwrap_or(NOT_AVAILABLE).to_string()
}

/// Enrich favourites from the catalogue and apply `filter` to the matched ones.
///
/// Songs missing from the catalogue (or every song, without a catalogue) are
/// always kept with "N/A" details.
fn enrich(
    favourites: &[Favourite],
    catalog: Option<&Catalog>,
    filter: &TrackFilter,
) -> Vec<FavouriteView> {
    favourites
        .iter()
        .filter_map(|favourite| {
            match catalog.and_then(|c| c.find_by_name(&favourite.song)) {
                Some(track) if filter.matches(track) => {
                    Some(FavouriteView::matched(favourite, track))
                }
                Some(_) => None,
                None => Some(FavouriteView::unmatched(favourite)),
            }
        })
        .collect()
}

/// Favourites page template.
#[derive(Template, WebTemplate)]
#[template(path = "favourites.html")]
pub struct FavouritesTemplate {
    pub current_user: Option<CurrentUser>,
    pub favourites: Vec<FavouriteView>,
    pub dataset_available: bool,
    pub min_plays: String,
    pub min_year: String,
    pub max_year: String,
}

/// Display the current user's favourites.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<FavouritesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let favourites = FavouriteRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    let catalog = match state.catalog().await {
        Ok(catalog) => Some(catalog),
        Err(DatasetError::Missing(path)) => {
            tracing::warn!(path = %path.display(), "Dataset missing, favourites shown without details");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let filter = TrackFilter::from_raw(
        query.min_plays.as_deref(),
        query.min_year.as_deref(),
        query.max_year.as_deref(),
    );

    Ok(FavouritesTemplate {
        current_user: Some(user),
        favourites: enrich(&favourites, catalog.as_deref(), &filter),
        dataset_available: catalog.is_some(),
        min_plays: query.min_plays.unwrap_or_default(),
        min_year: query.min_year.unwrap_or_default(),
        max_year: query.max_year.unwrap_or_default(),
    })
}

/// Add a song to the current user's favourites.
///
/// A blank song sends the user back to the dashboard.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddFavouriteForm>,
) -> Result<Redirect, AppError> {
    let song = form.song.trim();
    if song.is_empty() {
        return Ok(Redirect::to("/dashboard"));
    }

    FavouriteRepository::new(state.pool())
        .add(user.id, song)
        .await?;

    Ok(Redirect::to("/favourites"))
}

/// Remove one of the current user's favourites.
///
/// Ids owned by someone else are ignored.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<FavouriteId>,
) -> Result<Redirect, AppError> {
    let removed = FavouriteRepository::new(state.pool())
        .remove(user.id, id)
        .await?;

    if !removed {
        tracing::debug!(favourite_id = %id, "Favourite not removed (missing or not owned)");
    }

    Ok(Redirect::to("/favourites"))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use playdeck_core::UserId;

    use super::*;

    fn favourite(id: i64, song: &str) -> Favourite {
        Favourite {
            id: FavouriteId::new(id),
            user_id: UserId::new(1),
            song: song.to_string(),
            created_at: Utc::now(),
        }
    }

    fn catalog() -> Catalog {
        let csv = "\
track_name,artist,album,year,play_count,duration_ms,genre
Old Song,Band,,1999,10,90000,
New Song,Band,Debut,2022,500,210000,indie
";
        Catalog::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_enrich_fills_details_and_na() {
        let favourites = vec![favourite(1, "New Song"), favourite(2, "Old Song")];
        let views = enrich(&favourites, Some(&catalog()), &TrackFilter::default());

        assert_eq!(views[0].album, "Debut");
        assert_eq!(views[0].duration_min, "3.50");
        assert_eq!(views[0].plays, "500");
        assert_eq!(views[1].album, "N/A");
        assert_eq!(views[1].genre, "N/A");
    }

    #[test]
    fn test_filters_apply_only_to_matched_songs() {
        let favourites = vec![
            favourite(1, "New Song"),
            favourite(2, "Old Song"),
            favourite(3, "Unknown Song"),
        ];
        let filter = TrackFilter {
            min_plays: None,
            min_year: Some(2000),
            max_year: None,
        };
        let songs: Vec<_> = enrich(&favourites, Some(&catalog()), &filter)
            .into_iter()
            .map(|v| v.song)
            .collect();
        assert_eq!(songs, vec!["New Song", "Unknown Song"]);
    }

    #[test]
    fn test_without_catalog_everything_is_na() {
        let favourites = vec![favourite(1, "New Song")];
        let filter = TrackFilter {
            min_plays: Some(1_000_000),
            min_year: None,
            max_year: None,
        };
        let views = enrich(&favourites, None, &filter);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].artist, "N/A");
    }
}
