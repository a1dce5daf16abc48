//! Spotify Web API integration
//!
//! Client-credentials tokens are cached by [`token::TokenProvider`]; catalog lookups
//! go through the [`Catalog`] trait so the import flow can run against a fake.

mod catalog;
mod token;

pub use catalog::{Catalog, ExternalArtist, NormalizedTrack, SpotifyClient};

use thiserror::Error;

/// Failures talking to Spotify
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Client-credentials exchange failed
    #[error("could not obtain a Spotify access token: {0}")]
    AuthExchange(String),

    /// Search or top-tracks request failed
    #[error("Spotify request failed: {0}")]
    Query(String),

    /// Search returned no artist for the given name
    #[error("artist '{0}' not found on Spotify")]
    ArtistNotFound(String),
}
