//! Import an artist's Spotify top tracks into the local catalog

use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::{ArtistTable, TrackTable};
use crate::error::ApiError;
use crate::models::{Artist, Genre, NewArtist, NewTrack, Track, Validate, MAX_BIO_LENGTH};
use crate::plugins::spotify::{Catalog, CatalogError, ExternalArtist, NormalizedTrack};

/// Reason recorded for tracks whose Spotify id is already stored
pub const ALREADY_PRESENT: &str = "already present";

/// Local artist the import was attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedArtist {
    pub id: i64,
    pub name: String,
    pub spotify_id: Option<String>,
}

impl From<&Artist> for SyncedArtist {
    fn from(artist: &Artist) -> Self {
        Self {
            id: artist.id,
            name: artist.name.clone(),
            spotify_id: artist.spotify_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTrack {
    pub title: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub total: usize,
    pub saved: usize,
    pub skipped: usize,
}

/// Result of importing one track
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    Saved(Track),
    Skipped(SkippedTrack),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub artist: SyncedArtist,
    pub saved_tracks: Vec<Track>,
    pub skipped_tracks: Vec<SkippedTrack>,
    pub summary: SyncSummary,
}

impl SyncReport {
    fn new(artist: SyncedArtist) -> Self {
        Self {
            artist,
            saved_tracks: Vec::new(),
            skipped_tracks: Vec::new(),
            summary: SyncSummary::default(),
        }
    }

    fn record(mut self, outcome: ItemOutcome) -> Self {
        self.summary.total += 1;
        match outcome {
            ItemOutcome::Saved(track) => {
                self.summary.saved += 1;
                self.saved_tracks.push(track);
            }
            ItemOutcome::Skipped(skipped) => {
                self.summary.skipped += 1;
                self.skipped_tracks.push(skipped);
            }
        }
        self
    }
}

/// Biography generated for imported artists
pub fn generated_bio(name: &str, genres: &[String]) -> String {
    let bio = format!("Artist: {}. Genres: {}", name, genres.join(", "));
    bio.chars().take(MAX_BIO_LENGTH).collect()
}

pub struct SyncOrchestrator<'a> {
    pool: &'a SqlitePool,
    catalog: &'a dyn Catalog,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(pool: &'a SqlitePool, catalog: &'a dyn Catalog) -> Self {
        Self { pool, catalog }
    }

    /// Resolve the artist, then save each top track not already imported.
    ///
    /// Only catalog failures and artist resolution abort the run. A track that
    /// fails to save is reported as skipped and the loop moves on.
    pub async fn import_top_tracks(&self, artist_name: &str) -> Result<SyncReport, ApiError> {
        let external = self
            .catalog
            .search_artist(artist_name)
            .await?
            .ok_or_else(|| CatalogError::ArtistNotFound(artist_name.to_string()))?;

        let artist = self.resolve_artist(&external).await?;
        let tracks = self.catalog.top_tracks_for(&external).await?;

        tracing::info!(
            "Importing {} top tracks for {} (artist {})",
            tracks.len(),
            artist.name,
            artist.id
        );

        let mut report = SyncReport::new(SyncedArtist::from(&artist));
        for track in tracks {
            let outcome = self.import_track(artist.id, track).await;
            report = report.record(outcome);
        }

        tracing::info!(
            "Import for {} finished: {} saved, {} skipped",
            artist.name,
            report.summary.saved,
            report.summary.skipped
        );

        Ok(report)
    }

    async fn resolve_artist(&self, external: &ExternalArtist) -> Result<Artist, ApiError> {
        if let Some(artist) = ArtistTable::get_by_spotify_id(self.pool, &external.id).await? {
            return Ok(artist);
        }

        let new_artist = NewArtist {
            name: external.name.clone(),
            bio: Some(generated_bio(&external.name, &external.genres)),
            genres: external.genres.clone(),
            spotify_id: Some(external.id.clone()),
            image_url: external.image_url.clone(),
        }
        .normalized();
        new_artist.validate()?;

        let artist = ArtistTable::insert(self.pool, &new_artist).await?;
        tracing::info!("Created artist {} from Spotify id {}", artist.name, external.id);
        Ok(artist)
    }

    async fn import_track(&self, artist_id: i64, track: NormalizedTrack) -> ItemOutcome {
        let skipped = |title: String, reason: String| {
            tracing::warn!("Skipped '{}': {}", title, reason);
            ItemOutcome::Skipped(SkippedTrack { title, reason })
        };

        match TrackTable::get_by_spotify_id(self.pool, &track.spotify_id).await {
            Ok(Some(_)) => return skipped(track.title, ALREADY_PRESENT.to_string()),
            Ok(None) => {}
            Err(e) => return skipped(track.title, ApiError::from(e).to_string()),
        }

        let title = track.title.clone();
        let draft = NewTrack {
            title: track.title,
            artist: Some(artist_id),
            duration: Some(track.duration),
            album: Some(track.album),
            release_year: track.release_year,
            genre: Some(Genre::Other.as_str().to_string()),
            spotify_id: Some(track.spotify_id),
        }
        .into_draft();

        let draft = match draft {
            Ok(draft) => draft,
            Err(errors) => return skipped(title, errors.to_string()),
        };

        match TrackTable::insert(self.pool, &draft).await {
            Ok(saved) => ItemOutcome::Saved(saved),
            Err(e) => skipped(title, ApiError::from(e).to_string()),
        }
    }
}
