//! Playlist model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{max_chars, require_text, Validate, ValidationErrors};
use super::TrackView;

/// Longest accepted playlist description
pub const MAX_DESCRIPTION_LENGTH: usize = 300;

/// A playlist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    /// Database ID
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Owner user ID, fixed at creation
    #[serde(rename = "owner")]
    pub owner_id: i64,
    /// Track IDs in playback order
    #[serde(default)]
    pub tracks: Vec<i64>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl Playlist {
    pub fn contains_track(&self, track_id: i64) -> bool {
        self.tracks.contains(&track_id)
    }

    /// Append a track, returns false when it is already present
    pub fn add_track(&mut self, track_id: i64) -> bool {
        if self.contains_track(track_id) {
            return false;
        }
        self.tracks.push(track_id);
        true
    }

    /// Remove every occurrence of a track, returns false when it was absent
    pub fn remove_track(&mut self, track_id: i64) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|id| *id != track_id);
        self.tracks.len() != before
    }
}

/// Playlist with its tracks populated for API responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub owner: i64,
    pub tracks: Vec<TrackView>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl PlaylistView {
    pub fn new(playlist: Playlist, tracks: Vec<TrackView>) -> Self {
        Self {
            id: playlist.id,
            name: playlist.name,
            description: playlist.description,
            owner: playlist.owner_id,
            tracks,
            is_public: playlist.is_public,
            created_at: playlist.created_at,
        }
    }
}

/// Payload for creating a playlist; the owner comes from the caller's token
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlaylist {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub tracks: Vec<i64>,
}

impl NewPlaylist {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }
}

impl Validate for NewPlaylist {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", &self.name);
        if let Some(description) = &self.description {
            max_chars(&mut errors, "description", description, MAX_DESCRIPTION_LENGTH);
        }
        errors.into_result()
    }
}

/// Partial update; the owner cannot be changed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub tracks: Option<Vec<i64>>,
}

impl PlaylistUpdate {
    pub fn merge(self, current: &Playlist) -> NewPlaylist {
        NewPlaylist {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            description: self.description.or_else(|| current.description.clone()),
            is_public: Some(self.is_public.unwrap_or(current.is_public)),
            tracks: self.tracks.unwrap_or_else(|| current.tracks.clone()),
        }
        .normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist() -> Playlist {
        Playlist {
            id: 1,
            name: "Road trip".to_string(),
            description: None,
            owner_id: 42,
            tracks: vec![3, 1],
            is_public: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_track_keeps_order_and_rejects_duplicates() {
        let mut p = playlist();
        assert!(p.add_track(2));
        assert!(!p.add_track(3));
        assert_eq!(p.tracks, vec![3, 1, 2]);
    }

    #[test]
    fn test_remove_track() {
        let mut p = playlist();
        assert!(p.remove_track(3));
        assert!(!p.remove_track(3));
        assert_eq!(p.tracks, vec![1]);
    }

    #[test]
    fn test_merge_preserves_visibility() {
        let merged = PlaylistUpdate {
            name: Some(" Late night ".to_string()),
            ..Default::default()
        }
        .merge(&playlist());

        assert_eq!(merged.name, "Late night");
        assert_eq!(merged.is_public, Some(true));
        assert_eq!(merged.tracks, vec![3, 1]);
    }

    #[test]
    fn test_description_limit() {
        let p = NewPlaylist {
            name: "Long".to_string(),
            description: Some("d".repeat(MAX_DESCRIPTION_LENGTH + 1)),
            ..Default::default()
        };
        assert_eq!(p.validate().unwrap_err().fields()[0].field, "description");
    }
}
