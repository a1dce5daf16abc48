//! Configuration module
//!
//! Holds the layered service settings and the derived per-component views.

mod settings;

pub use settings::{JwtSettings, Settings, SpotifySettings};
