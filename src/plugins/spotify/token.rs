//! Client-credentials access tokens

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

use super::CatalogError;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Body of a successful token response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Performs one client-credentials exchange
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self) -> Result<TokenGrant, CatalogError>;
}

/// Exchange against the Spotify accounts service
pub struct SpotifyTokenExchange {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl SpotifyTokenExchange {
    pub fn new(client: Client, accounts_url: &str, client_id: String, client_secret: String) -> Self {
        Self {
            client,
            token_url: format!("{}/api/token", accounts_url),
            client_id,
            client_secret,
        }
    }
}

#[async_trait]
impl TokenExchange for SpotifyTokenExchange {
    async fn exchange(&self) -> Result<TokenGrant, CatalogError> {
        let resp = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| CatalogError::AuthExchange(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::AuthExchange(format!(
                "accounts service returned {}",
                status
            )));
        }

        resp.json::<TokenGrant>()
            .await
            .map_err(|e| CatalogError::AuthExchange(e.to_string()))
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Hands out access tokens, exchanging only when the cached one has expired
pub struct TokenProvider {
    exchange: Arc<dyn TokenExchange>,
    clock: Arc<dyn Clock>,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(exchange: Arc<dyn TokenExchange>, clock: Arc<dyn Clock>) -> Self {
        Self {
            exchange,
            clock,
            cache: RwLock::new(None),
        }
    }

    /// Current token, refreshed through the exchange when missing or expired
    pub async fn access_token(&self) -> Result<String, CatalogError> {
        if let Some(token) = self.cached() {
            return Ok(token);
        }

        // Lock is released before the await; concurrent refreshes may both exchange
        let grant = self.exchange.exchange().await?;
        let expires_at = chrono::Duration::try_seconds(grant.expires_in)
            .and_then(|ttl| self.clock.now().checked_add_signed(ttl))
            .ok_or_else(|| {
                CatalogError::AuthExchange(format!("invalid expires_in {}", grant.expires_in))
            })?;

        *self.cache.write() = Some(CachedToken {
            token: grant.access_token.clone(),
            expires_at,
        });
        tracing::debug!("Refreshed Spotify access token, expires at {}", expires_at);

        Ok(grant.access_token)
    }

    fn cached(&self) -> Option<String> {
        let now = self.clock.now();
        self.cache
            .read()
            .as_ref()
            .filter(|cached| now < cached.expires_at)
            .map(|cached| cached.token.clone())
    }
}
