//! Track model

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{require_text, Validate, ValidationErrors};
use super::{ArtistRef, Genre};

/// Album name used when none is given
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Earliest accepted release year
pub const MIN_RELEASE_YEAR: i32 = 1900;

/// A catalog track
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Database ID
    pub id: i64,
    pub title: String,
    /// Owning artist ID
    #[serde(rename = "artist")]
    pub artist_id: i64,
    /// Duration in seconds
    pub duration: i64,
    pub album: String,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub genre: Genre,
    /// Spotify identifier, the dedup key for imports
    #[serde(default)]
    pub spotify_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Track with its artist populated for API responses
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackView {
    pub id: i64,
    pub title: String,
    /// `None` when the artist has since been deleted
    pub artist: Option<ArtistRef>,
    pub duration: i64,
    pub album: String,
    pub release_year: Option<i32>,
    pub genre: Genre,
    pub spotify_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TrackView {
    pub fn new(track: Track, artist: Option<ArtistRef>) -> Self {
        Self {
            id: track.id,
            title: track.title,
            artist,
            duration: track.duration,
            album: track.album,
            release_year: track.release_year,
            genre: track.genre,
            spotify_id: track.spotify_id,
            created_at: track.created_at,
        }
    }
}

/// Payload for creating a track
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrack {
    #[serde(default)]
    pub title: String,
    /// Owning artist ID
    #[serde(default)]
    pub artist: Option<i64>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub spotify_id: Option<String>,
}

/// A validated track ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDraft {
    pub title: String,
    pub artist_id: i64,
    pub duration: i64,
    pub album: String,
    pub release_year: Option<i32>,
    pub genre: Genre,
    pub spotify_id: Option<String>,
}

impl NewTrack {
    /// Validate and fill in defaults
    pub fn into_draft(self) -> Result<TrackDraft, ValidationErrors> {
        self.validate()?;

        let album = self
            .album
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| UNKNOWN_ALBUM.to_string());

        let genre = self
            .genre
            .as_deref()
            .and_then(Genre::from_label)
            .unwrap_or_default();

        Ok(TrackDraft {
            title: self.title.trim().to_string(),
            artist_id: self.artist.unwrap_or_default(),
            duration: self.duration.unwrap_or_default(),
            album,
            release_year: self.release_year,
            genre,
            spotify_id: self.spotify_id.filter(|id| !id.trim().is_empty()),
        })
    }
}

impl Validate for NewTrack {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        require_text(&mut errors, "title", &self.title);

        if self.artist.is_none() {
            errors.add("artist", "artist is required");
        }

        match self.duration {
            None => errors.add("duration", "duration is required"),
            Some(d) if d < 0 => errors.add("duration", "duration must not be negative"),
            Some(_) => {}
        }

        if let Some(year) = self.release_year {
            let current = Utc::now().year();
            if !(MIN_RELEASE_YEAR..=current).contains(&year) {
                errors.add(
                    "releaseYear",
                    format!(
                        "releaseYear must be between {} and {}",
                        MIN_RELEASE_YEAR, current
                    ),
                );
            }
        }

        if let Some(genre) = self.genre.as_deref() {
            if Genre::from_label(genre).is_none() {
                errors.add("genre", format!("'{}' is not a supported genre", genre));
            }
        }

        errors.into_result()
    }
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackUpdate {
    pub title: Option<String>,
    pub artist: Option<i64>,
    pub duration: Option<i64>,
    pub album: Option<String>,
    pub release_year: Option<i32>,
    pub genre: Option<String>,
    pub spotify_id: Option<String>,
}

impl TrackUpdate {
    pub fn merge(self, current: &Track) -> NewTrack {
        NewTrack {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            artist: Some(self.artist.unwrap_or(current.artist_id)),
            duration: Some(self.duration.unwrap_or(current.duration)),
            album: Some(self.album.unwrap_or_else(|| current.album.clone())),
            release_year: self.release_year.or(current.release_year),
            genre: Some(self.genre.unwrap_or_else(|| current.genre.to_string())),
            spotify_id: self.spotify_id.or_else(|| current.spotify_id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_track() -> NewTrack {
        NewTrack {
            title: " Bohemian Rhapsody ".to_string(),
            artist: Some(1),
            duration: Some(354),
            ..Default::default()
        }
    }

    #[test]
    fn test_draft_defaults() {
        let draft = new_track().into_draft().unwrap();
        assert_eq!(draft.title, "Bohemian Rhapsody");
        assert_eq!(draft.album, UNKNOWN_ALBUM);
        assert_eq!(draft.genre, Genre::Other);
        assert!(draft.spotify_id.is_none());
    }

    #[test]
    fn test_required_fields() {
        let errors = NewTrack::default().validate().unwrap_err();
        let fields: Vec<_> = errors.fields().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "artist", "duration"]);
    }

    #[test]
    fn test_release_year_bounds() {
        let mut track = new_track();
        track.release_year = Some(1899);
        assert!(track.validate().is_err());

        track.release_year = Some(1975);
        assert!(track.validate().is_ok());

        track.release_year = Some(Utc::now().year() + 1);
        assert!(track.validate().is_err());
    }

    #[test]
    fn test_unknown_genre_rejected() {
        let mut track = new_track();
        track.genre = Some("Polka".to_string());
        let errors = track.validate().unwrap_err();
        assert_eq!(errors.fields()[0].field, "genre");

        track.genre = Some("Hip-Hop".to_string());
        assert_eq!(track.into_draft().unwrap().genre, Genre::HipHop);
    }

    #[test]
    fn test_view_serializes_populated_artist() {
        let track = Track {
            id: 3,
            title: "Somebody to Love".to_string(),
            artist_id: 1,
            duration: 296,
            album: "A Day at the Races".to_string(),
            release_year: Some(1976),
            genre: Genre::Rock,
            spotify_id: None,
            created_at: Utc::now(),
        };
        let artist = ArtistRef {
            id: 1,
            name: "Queen".to_string(),
            genres: vec!["rock".to_string()],
        };

        let json = serde_json::to_value(TrackView::new(track, Some(artist))).unwrap();
        assert_eq!(json["artist"]["name"], "Queen");
        assert_eq!(json["releaseYear"], 1976);
        assert_eq!(json["genre"], "Rock");
    }
}
