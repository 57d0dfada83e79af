//! Favourite songs.

use chrono::{DateTime, Utc};

use playdeck_core::{FavouriteId, UserId};

/// A song a user has marked as favourite.
///
/// `song` holds the track name as it appears in the dataset.
#[derive(Debug, Clone)]
pub struct Favourite {
    pub id: FavouriteId,
    pub user_id: UserId,
    pub song: String,
    pub created_at: DateTime<Utc>,
}
