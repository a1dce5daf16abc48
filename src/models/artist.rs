//! Artist model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{max_chars, require_text, Validate, ValidationErrors};

/// Longest accepted biography
pub const MAX_BIO_LENGTH: usize = 500;

/// An artist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    /// Database ID
    pub id: i64,
    /// Unique artist name
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Spotify identifier, set for imported artists
    #[serde(default)]
    pub spotify_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Artist {
    /// Short reference embedded in track listings
    pub fn to_ref(&self) -> ArtistRef {
        ArtistRef {
            id: self.id,
            name: self.name.clone(),
            genres: self.genres.clone(),
        }
    }
}

/// Reference to an artist (used when populating tracks)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: i64,
    pub name: String,
    pub genres: Vec<String>,
}

/// Payload for creating an artist
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArtist {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub spotify_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewArtist {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.spotify_id = self.spotify_id.filter(|id| !id.trim().is_empty());
        self
    }
}

impl Validate for NewArtist {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", &self.name);
        if let Some(bio) = &self.bio {
            max_chars(&mut errors, "bio", bio, MAX_BIO_LENGTH);
        }
        errors.into_result()
    }
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub genres: Option<Vec<String>>,
    pub spotify_id: Option<String>,
    pub image_url: Option<String>,
}

impl ArtistUpdate {
    /// Merge onto the stored record, producing the full record to validate and save
    pub fn merge(self, current: &Artist) -> NewArtist {
        NewArtist {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            bio: self.bio.or_else(|| current.bio.clone()),
            genres: self.genres.unwrap_or_else(|| current.genres.clone()),
            spotify_id: self.spotify_id.or_else(|| current.spotify_id.clone()),
            image_url: self.image_url.or_else(|| current.image_url.clone()),
        }
        .normalized()
    }
}
