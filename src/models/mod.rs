//! Data models for the music catalog
//!
//! Stored records, their API views, and the typed payloads used to create or
//! update them.

mod artist;
mod enums;
mod playlist;
mod track;
mod user;
pub mod validation;

pub use artist::{Artist, ArtistRef, ArtistUpdate, NewArtist, MAX_BIO_LENGTH};
pub use enums::Genre;
pub use playlist::{NewPlaylist, Playlist, PlaylistUpdate, PlaylistView};
pub use track::{NewTrack, Track, TrackDraft, TrackUpdate, TrackView};
pub use user::{normalize_email, NewUser, User};
pub use validation::{Validate, ValidationErrors};
