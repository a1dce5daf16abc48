//! Service settings
//!
//! Settings are layered: built-in defaults, then an optional `settings.toml`
//! (or the file passed with `--config`), then environment variables such as
//! `JWT_SECRET` or `SPOTIFY_CLIENT_ID`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top-level service settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite connection url
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Secret used to sign issued tokens
    #[serde(default)]
    pub jwt_secret: String,

    /// Lifetime of issued tokens, e.g. `30d`, `12h` or `3600`
    #[serde(default = "default_jwt_expire")]
    pub jwt_expire: String,

    #[serde(default)]
    pub spotify_client_id: String,

    #[serde(default)]
    pub spotify_client_secret: String,

    #[serde(default = "default_spotify_accounts_url")]
    pub spotify_accounts_url: String,

    #[serde(default = "default_spotify_api_url")]
    pub spotify_api_url: String,

    /// Market used for top-track listings
    #[serde(default = "default_spotify_market")]
    pub spotify_market: String,

    /// Timeout applied to every Spotify request
    #[serde(default = "default_spotify_timeout_secs")]
    pub spotify_timeout_secs: u64,
}

/// Token signing settings handed to the auth layer
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub ttl: Duration,
}

/// Spotify client settings
#[derive(Debug, Clone)]
pub struct SpotifySettings {
    pub client_id: String,
    pub client_secret: String,
    pub accounts_url: String,
    pub api_url: String,
    pub market: String,
    pub timeout: Duration,
}

impl Settings {
    /// Load settings from an optional file and the environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let builder = ::config::Config::builder();

        let builder = match file {
            Some(path) => builder.add_source(::config::File::from(path).required(true)),
            None => builder.add_source(::config::File::with_name("settings").required(false)),
        };

        let settings: Settings = builder
            .add_source(::config::Environment::default().try_parsing(true))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Failed to parse settings")?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET must be set");
        }
        parse_duration(&self.jwt_expire).context("Invalid JWT_EXPIRE")?;
        Ok(())
    }

    pub fn jwt(&self) -> Result<JwtSettings> {
        Ok(JwtSettings {
            secret: self.jwt_secret.clone(),
            ttl: parse_duration(&self.jwt_expire)?,
        })
    }

    pub fn spotify(&self) -> SpotifySettings {
        SpotifySettings {
            client_id: self.spotify_client_id.clone(),
            client_secret: self.spotify_client_secret.clone(),
            accounts_url: self.spotify_accounts_url.trim_end_matches('/').to_string(),
            api_url: self.spotify_api_url.trim_end_matches('/').to_string(),
            market: self.spotify_market.clone(),
            timeout: Duration::from_secs(self.spotify_timeout_secs),
        }
    }
}

/// Parse a lifetime such as `30d`, `12h`, `15m`, `45s` or bare seconds
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("empty duration");
    }

    let (digits, unit) = match raw.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => raw.split_at(idx),
        None => (raw, "s"),
    };

    let value: u64 = digits
        .parse()
        .with_context(|| format!("invalid duration '{}'", raw))?;

    let scale: u64 = match unit.trim() {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        other => bail!("unknown duration unit '{}'", other),
    };

    let Some(secs) = value.checked_mul(scale) else {
        bail!("duration '{}' is too large", raw);
    };

    Ok(Duration::from_secs(secs))
}

// Default value functions for serde

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_database_url() -> String {
    "sqlite:music-catalog.db".to_string()
}

fn default_jwt_expire() -> String {
    "30d".to_string()
}

fn default_spotify_accounts_url() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_spotify_api_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_spotify_market() -> String {
    "US".to_string()
}

fn default_spotify_timeout_secs() -> u64 {
    10
}
