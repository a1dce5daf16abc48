//! Artist search and top-tracks lookups

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::token::{SpotifyTokenExchange, SystemClock, TokenProvider};
use super::CatalogError;
use crate::config::SpotifySettings;

/// Artist as returned by a Spotify search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalArtist {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    /// First image, the largest one Spotify lists
    pub image_url: Option<String>,
}

/// Top track mapped to the catalog's own shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTrack {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Whole seconds
    pub duration: i64,
    pub release_year: Option<i32>,
    pub spotify_id: String,
    pub preview_url: Option<String>,
    pub popularity: u32,
}

/// Read access to an external music catalog
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Best match for `name`, `None` when the search is empty
    async fn search_artist(&self, name: &str) -> Result<Option<ExternalArtist>, CatalogError>;

    /// Top tracks of an already resolved artist, in catalog order
    async fn top_tracks_for(
        &self,
        artist: &ExternalArtist,
    ) -> Result<Vec<NormalizedTrack>, CatalogError>;

    /// Resolve `name` and fetch its top tracks
    async fn artist_top_tracks(&self, name: &str) -> Result<Vec<NormalizedTrack>, CatalogError> {
        let artist = self
            .search_artist(name)
            .await?
            .ok_or_else(|| CatalogError::ArtistNotFound(name.to_string()))?;

        self.top_tracks_for(&artist).await
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    artists: Paging<ArtistObject>,
}

#[derive(Debug, Deserialize)]
struct Paging<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    id: String,
    name: String,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    images: Vec<ImageObject>,
}

#[derive(Debug, Deserialize)]
struct ImageObject {
    url: String,
}

#[derive(Debug, Deserialize)]
struct TopTracksResponse {
    #[serde(default)]
    tracks: Vec<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    id: String,
    name: String,
    duration_ms: i64,
    #[serde(default)]
    preview_url: Option<String>,
    #[serde(default)]
    popularity: u32,
    album: AlbumObject,
}

#[derive(Debug, Deserialize)]
struct AlbumObject {
    name: String,
    #[serde(default)]
    release_date: Option<String>,
}

impl From<ArtistObject> for ExternalArtist {
    fn from(artist: ArtistObject) -> Self {
        Self {
            id: artist.id,
            name: artist.name,
            genres: artist.genres,
            image_url: artist.images.into_iter().next().map(|i| i.url),
        }
    }
}

impl TrackObject {
    fn normalize(self, artist_name: &str) -> NormalizedTrack {
        NormalizedTrack {
            title: self.name,
            artist: artist_name.to_string(),
            album: self.album.name,
            duration: self.duration_ms.div_euclid(1000),
            release_year: self.album.release_date.as_deref().and_then(release_year),
            spotify_id: self.id,
            preview_url: self.preview_url,
            popularity: self.popularity,
        }
    }
}

/// Year of a release date given as `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
fn release_year(date: &str) -> Option<i32> {
    date.get(..4)?.parse().ok()
}

/// Spotify Web API client
pub struct SpotifyClient {
    client: Client,
    tokens: TokenProvider,
    api_url: String,
    market: String,
}

impl SpotifyClient {
    /// Build a client whose requests, token exchange included, share one timeout
    pub fn new(settings: &SpotifySettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let exchange = SpotifyTokenExchange::new(
            client.clone(),
            &settings.accounts_url,
            settings.client_id.clone(),
            settings.client_secret.clone(),
        );

        Ok(Self {
            client,
            tokens: TokenProvider::new(Arc::new(exchange), Arc::new(SystemClock)),
            api_url: settings.api_url.clone(),
            market: settings.market.clone(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let token = self.tokens.access_token().await?;

        let resp = self
            .client
            .get(format!("{}{}", self.api_url, path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| CatalogError::Query(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Query(format!("{} returned {}", path, status)));
        }

        resp.json::<T>()
            .await
            .map_err(|e| CatalogError::Query(e.to_string()))
    }
}

#[async_trait]
impl Catalog for SpotifyClient {
    async fn search_artist(&self, name: &str) -> Result<Option<ExternalArtist>, CatalogError> {
        let resp: SearchResponse = self
            .get("/search", &[("q", name), ("type", "artist"), ("limit", "1")])
            .await?;

        Ok(resp.artists.items.into_iter().next().map(ExternalArtist::from))
    }

    async fn top_tracks_for(
        &self,
        artist: &ExternalArtist,
    ) -> Result<Vec<NormalizedTrack>, CatalogError> {
        let path = format!("/artists/{}/top-tracks", artist.id);
        let resp: TopTracksResponse = self.get(&path, &[("market", self.market.as_str())]).await?;

        tracing::debug!("Fetched {} top tracks for {}", resp.tracks.len(), artist.name);

        Ok(resp
            .tracks
            .into_iter()
            .map(|track| track.normalize(&artist.name))
            .collect())
    }
}
