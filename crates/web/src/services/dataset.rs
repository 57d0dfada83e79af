//! Listening dataset: CSV loading, filtering and aggregation.
//!
//! The dataset is a CSV file with one row per track. Required columns are
//! `track_name`, `artist`, `year` and `play_count`; `album`, `duration_ms`,
//! `genre`, `energy` and `danceability` may be absent or empty. Extra columns
//! are ignored.
//!
//! Parsed catalogues are kept in a [`CatalogCache`] (`moka`, TTL from config)
//! so the file is not re-read on every request.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Number of genres shown in the stats panel and the genre chart.
pub const TOP_GENRES: usize = 5;

/// Default number of artists in the artist chart.
pub const DEFAULT_TOP_ARTISTS: usize = 10;

/// Largest accepted artist chart size.
pub const MAX_TOP_ARTISTS: usize = 50;

/// Errors loading the dataset.
#[derive(Debug, Clone, Error)]
pub enum DatasetError {
    /// The CSV file does not exist.
    #[error("dataset not found: {}", .0.display())]
    Missing(PathBuf),

    /// The file exists but could not be read.
    #[error("failed to read dataset {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    /// A row could not be parsed.
    #[error("malformed dataset row at line {line}: {message}")]
    Parse { line: u64, message: String },
}

/// One row of the listening dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Track {
    pub track_name: String,
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
    pub year: i64,
    pub play_count: i64,
    #[serde(default)]
    pub duration_ms: Option<i64>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub danceability: Option<f64>,
}

impl Track {
    /// Duration in minutes rounded to two decimals.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_minutes(&self) -> Option<f64> {
        self.duration_ms
            .map(|ms| (ms as f64 / 60_000.0 * 100.0).round() / 100.0)
    }
}

/// The parsed dataset.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tracks: Vec<Track>,
}

impl Catalog {
    /// Parse CSV data with a header row.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::Parse` with the line number of the first malformed row.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let tracks = reader
            .deserialize::<Track>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DatasetError::Parse {
                line: e.position().map_or(0, csv::Position::line),
                message: e.to_string(),
            })?;

        Ok(Self { tracks })
    }

    /// Read and parse the CSV file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::Missing` if the file does not exist,
    /// `DatasetError::Read` for other I/O failures and
    /// `DatasetError::Parse` for malformed rows.
    pub async fn load(path: &Path) -> Result<Self, DatasetError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DatasetError::Missing(path.to_path_buf())
            } else {
                DatasetError::Read {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            }
        })?;

        let catalog = Self::from_reader(bytes.as_slice())?;
        info!(path = %path.display(), tracks = catalog.len(), "Dataset loaded");
        Ok(catalog)
    }

    /// All tracks in file order.
    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// First track whose name matches exactly.
    #[must_use]
    pub fn find_by_name(&self, track_name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.track_name == track_name)
    }

    /// Tracks that pass `filter`, in file order.
    #[must_use]
    pub fn filtered(&self, filter: &TrackFilter) -> Vec<&Track> {
        self.tracks.iter().filter(|t| filter.matches(t)).collect()
    }
}

// =============================================================================
// Filtering
// =============================================================================

/// Play-count and year bounds, all inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackFilter {
    pub min_plays: Option<i64>,
    pub min_year: Option<i64>,
    pub max_year: Option<i64>,
}

impl TrackFilter {
    /// Build a filter from raw query-string values.
    ///
    /// Blank or non-numeric values are ignored.
    #[must_use]
    pub fn from_raw(
        min_plays: Option<&str>,
        min_year: Option<&str>,
        max_year: Option<&str>,
    ) -> Self {
        Self {
            min_plays: parse_bound(min_plays),
            min_year: parse_bound(min_year),
            max_year: parse_bound(max_year),
        }
    }

    /// Whether `track` passes every bound that is set.
    #[must_use]
    pub fn matches(&self, track: &Track) -> bool {
        self.min_plays.is_none_or(|min| track.play_count >= min)
            && self.min_year.is_none_or(|min| track.year >= min)
            && self.max_year.is_none_or(|max| track.year <= max)
    }
}

fn parse_bound(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Artist chart size from a raw query value, clamped to `1..=50`.
#[must_use]
pub fn top_artists_limit(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map_or(DEFAULT_TOP_ARTISTS, |n| {
            usize::try_from(n.max(1)).map_or(MAX_TOP_ARTISTS, |n| n.min(MAX_TOP_ARTISTS))
        })
}

// =============================================================================
// Aggregation
// =============================================================================

/// Headline numbers for a slice of tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_plays: i64,
    /// Σ(`duration_ms` × `play_count`) in minutes; tracks without a duration count as zero.
    pub total_minutes: f64,
    pub tracks: usize,
    pub artists: usize,
    pub albums: usize,
}

/// A name with its summed play count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranked {
    pub name: String,
    pub plays: i64,
}

/// Compute the headline numbers.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(tracks: &[&Track]) -> Summary {
    let total_plays = tracks.iter().map(|t| t.play_count).sum();
    let total_ms: i64 = tracks
        .iter()
        .map(|t| t.duration_ms.unwrap_or(0).saturating_mul(t.play_count))
        .sum();
    let artists: HashSet<&str> = tracks.iter().map(|t| t.artist.as_str()).collect();
    let albums: HashSet<&str> = tracks.iter().filter_map(|t| t.album.as_deref()).collect();

    Summary {
        total_plays,
        total_minutes: total_ms as f64 / 60_000.0,
        tracks: tracks.len(),
        artists: artists.len(),
        albums: albums.len(),
    }
}

/// Genres with the most plays. Tracks without a genre are skipped.
#[must_use]
pub fn top_genres(tracks: &[&Track], n: usize) -> Vec<Ranked> {
    rank_by_plays(tracks.iter().filter_map(|t| Some((t.genre.as_deref()?, t.play_count))), n)
}

/// Artists with the most plays.
#[must_use]
pub fn top_artists(tracks: &[&Track], n: usize) -> Vec<Ranked> {
    rank_by_plays(tracks.iter().map(|t| (t.artist.as_str(), t.play_count)), n)
}

/// Sum plays per name and keep the `n` largest (plays descending, then name ascending).
fn rank_by_plays<'a>(entries: impl Iterator<Item = (&'a str, i64)>, n: usize) -> Vec<Ranked> {
    let mut totals: HashMap<&str, i64> = HashMap::new();
    for (name, plays) in entries {
        *totals.entry(name).or_default() += plays;
    }

    let mut ranked: Vec<Ranked> = totals
        .into_iter()
        .map(|(name, plays)| Ranked {
            name: name.to_string(),
            plays,
        })
        .collect();
    ranked.sort_by(|a, b| b.plays.cmp(&a.plays).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(n);
    ranked
}

/// Abbreviate a number for the stats cards: `1M`, `25K`, `999` or `12.50`.
///
/// Thousands and millions are truncated, not rounded.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_compact(value: f64, decimal: bool) -> String {
    if value >= 1_000_000.0 {
        format!("{}M", (value / 1_000_000.0).trunc() as i64)
    } else if value >= 1_000.0 {
        format!("{}K", (value / 1_000.0).trunc() as i64)
    } else if decimal {
        format!("{value:.2}")
    } else {
        format!("{}", value.trunc() as i64)
    }
}

// =============================================================================
// Cache
// =============================================================================

/// Parsed catalogues keyed by file path.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<PathBuf, Arc<Catalog>>,
}

impl CatalogCache {
    /// Create a cache whose entries expire `ttl` after loading.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(4)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// Get the catalogue for `path`, loading it on a miss.
    ///
    /// Failed loads are not cached, so a dataset added later is picked up
    /// on the next request.
    ///
    /// # Errors
    ///
    /// Returns the `DatasetError` from [`Catalog::load`].
    pub async fn get(&self, path: &Path) -> Result<Arc<Catalog>, DatasetError> {
        if let Some(catalog) = self.cache.get(path).await {
            debug!("Cache hit for dataset");
            return Ok(catalog);
        }

        self.cache
            .try_get_with(path.to_path_buf(), async {
                Catalog::load(path).await.map(Arc::new)
            })
            .await
            .map_err(|e| (*e).clone())
    }

    /// Drop every cached catalogue.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
track_name,artist,album,year,play_count,duration_ms,genre,energy,danceability
Song A,Artist 1,Album X,2019,100,180000,pop,0.8,0.7
Song B,Artist 2,Album Y,2021,300,240000,rock,0.5,0.4
Song C,Artist 1,Album X,2022,50,,pop,,
Song D,Artist 3,,2015,300,120000,,0.1,0.2
";

    fn catalog() -> Catalog {
        Catalog::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_parses_optional_columns() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 4);

        let c = &catalog.tracks()[2];
        assert_eq!(c.duration_ms, None);
        assert_eq!(c.energy, None);
        assert_eq!(c.genre.as_deref(), Some("pop"));

        let d = &catalog.tracks()[3];
        assert_eq!(d.album, None);
        assert_eq!(d.genre, None);
    }

    #[test]
    fn test_missing_optional_columns_are_allowed() {
        let csv = "track_name,artist,year,play_count,extra\nX,Y,2000,1,ignored\n";
        let catalog = Catalog::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.tracks()[0].album, None);
        assert_eq!(catalog.tracks()[0].duration_ms, None);
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let csv = "track_name,artist,year,play_count\nX,Y,2000,1\nZ,W,not-a-year,2\n";
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::Parse { line: 3, .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = Catalog::load(Path::new("/nonexistent/spotify.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::Missing(_)));
    }

    #[test]
    fn test_filter_from_raw_ignores_invalid_values() {
        let filter = TrackFilter::from_raw(Some("abc"), Some(" 2019 "), Some(""));
        assert_eq!(
            filter,
            TrackFilter {
                min_plays: None,
                min_year: Some(2019),
                max_year: None,
            }
        );
    }

    #[test]
    fn test_filter_bounds_are_inclusive() {
        let catalog = catalog();
        let filter = TrackFilter {
            min_plays: Some(100),
            min_year: Some(2019),
            max_year: Some(2021),
        };
        let names: Vec<_> = catalog
            .filtered(&filter)
            .iter()
            .map(|t| t.track_name.as_str())
            .collect();
        assert_eq!(names, vec!["Song A", "Song B"]);
    }

    #[test]
    fn test_summarize() {
        let catalog = catalog();
        let all = catalog.filtered(&TrackFilter::default());
        let summary = summarize(&all);

        assert_eq!(summary.total_plays, 750);
        // (180000*100 + 240000*300 + 120000*300) / 60000
        assert!((summary.total_minutes - 2100.0).abs() < f64::EPSILON);
        assert_eq!(summary.tracks, 4);
        assert_eq!(summary.artists, 3);
        assert_eq!(summary.albums, 2);
    }

    #[test]
    fn test_top_artists_ties_break_by_name() {
        let catalog = catalog();
        let all = catalog.filtered(&TrackFilter::default());
        let top = top_artists(&all, 2);
        assert_eq!(
            top,
            vec![
                Ranked {
                    name: "Artist 2".to_string(),
                    plays: 300
                },
                Ranked {
                    name: "Artist 3".to_string(),
                    plays: 300
                },
            ]
        );
    }

    #[test]
    fn test_top_genres_skip_missing() {
        let catalog = catalog();
        let all = catalog.filtered(&TrackFilter::default());
        let genres = top_genres(&all, TOP_GENRES);
        let names: Vec<_> = genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["rock", "pop"]);
        assert_eq!(genres[1].plays, 150);
    }

    #[test]
    fn test_top_artists_limit() {
        assert_eq!(top_artists_limit(None), 10);
        assert_eq!(top_artists_limit(Some("abc")), 10);
        assert_eq!(top_artists_limit(Some("0")), 1);
        assert_eq!(top_artists_limit(Some("-4")), 1);
        assert_eq!(top_artists_limit(Some("25")), 25);
        assert_eq!(top_artists_limit(Some("500")), 50);
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(2_500_000.0, false), "2M");
        assert_eq!(format_compact(1_999.0, false), "1K");
        assert_eq!(format_compact(999.0, false), "999");
        assert_eq!(format_compact(12.5, true), "12.50");
        assert_eq!(format_compact(0.0, false), "0");
    }

    #[test]
    fn test_duration_minutes() {
        let catalog = catalog();
        assert_eq!(catalog.tracks()[0].duration_minutes(), Some(3.0));
        assert_eq!(catalog.tracks()[2].duration_minutes(), None);
    }

    #[test]
    fn test_find_by_name_returns_first_match() {
        let csv = "track_name,artist,year,play_count\nDup,First,2000,1\nDup,Second,2001,2\n";
        let catalog = Catalog::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.find_by_name("Dup").unwrap().artist, "First");
        assert!(catalog.find_by_name("Nope").is_none());
    }

    #[tokio::test]
    async fn test_cache_reuses_catalog_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spotify.csv");

        let cache = CatalogCache::new(Duration::from_secs(60));
        assert!(matches!(
            cache.get(&path).await,
            Err(DatasetError::Missing(_))
        ));

        std::fs::write(&path, SAMPLE).unwrap();
        let first = cache.get(&path).await.unwrap();
        assert_eq!(first.len(), 4);

        std::fs::write(&path, "track_name,artist,year,play_count\nX,Y,2000,1\n").unwrap();
        let cached = cache.get(&path).await.unwrap();
        assert!(Arc::ptr_eq(&first, &cached));

        cache.invalidate_all();
        cache.cache.run_pending_tasks().await;
        assert_eq!(cache.get(&path).await.unwrap().len(), 1);
    }
}
