//! REST API routes for the music catalog

pub mod artist;
pub mod auth;
pub mod playlist;
pub mod track;

use actix_web::{get, web, HttpResponse, Responder};
use std::sync::Arc;

use crate::config::JwtSettings;
use crate::db::DbEngine;
use crate::error::ApiError;
use crate::plugins::spotify::Catalog;

pub use auth::AuthUser;

/// Shared application state handed to every handler
pub struct AppState {
    pub db: DbEngine,
    pub jwt: JwtSettings,
    pub catalog: Arc<dyn Catalog>,
}

/// Configure all API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Auth routes
            .service(web::scope("/auth").configure(auth::configure))
            // Track routes
            .service(web::scope("/tracks").configure(track::configure))
            // Artist routes, Spotify import included
            .service(web::scope("/artists").configure(artist::configure))
            // Playlist routes
            .service(web::scope("/playlists").configure(playlist::configure)),
    )
    .service(index);
}

/// Malformed JSON bodies and query strings answer with the error envelope
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

/// GET /
#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Music Catalog API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth",
            "tracks": "/api/tracks",
            "artists": "/api/artists",
            "playlists": "/api/playlists",
        }
    }))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for handler tests

    use super::*;
    use crate::core::SyncOrchestrator;
    use crate::models::NewUser;
    use crate::plugins::spotify::{CatalogError, ExternalArtist, NormalizedTrack};
    use crate::utils::auth::{create_jwt, hash_password};
    use actix_web::App;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Catalog that knows exactly one artist
    pub struct StubCatalog {
        pub artist: ExternalArtist,
        pub tracks: Vec<NormalizedTrack>,
    }

    #[async_trait]
    impl Catalog for StubCatalog {
        async fn search_artist(&self, name: &str) -> Result<Option<ExternalArtist>, CatalogError> {
            Ok(Some(self.artist.clone()).filter(|a| a.name.eq_ignore_ascii_case(name)))
        }

        async fn top_tracks_for(
            &self,
            _artist: &ExternalArtist,
        ) -> Result<Vec<NormalizedTrack>, CatalogError> {
            Ok(self.tracks.clone())
        }
    }

    pub fn stub_catalog() -> StubCatalog {
        StubCatalog {
            artist: ExternalArtist {
                id: "1dfeR4HaWDbWqFHLkxsg1d".to_string(),
                name: "Queen".to_string(),
                genres: vec!["classic rock".to_string()],
                image_url: None,
            },
            tracks: ["Bohemian Rhapsody", "Somebody to Love", "Killer Queen"]
                .iter()
                .enumerate()
                .map(|(i, title)| NormalizedTrack {
                    title: title.to_string(),
                    artist: "Queen".to_string(),
                    album: "Greatest Hits".to_string(),
                    duration: 300,
                    release_year: Some(1981),
                    spotify_id: format!("t{}", i),
                    preview_url: None,
                    popularity: 70,
                })
                .collect(),
        }
    }

    pub async fn state() -> web::Data<AppState> {
        web::Data::new(AppState {
            db: DbEngine::in_memory().await.unwrap(),
            jwt: JwtSettings {
                secret: "test-secret".to_string(),
                ttl: Duration::from_secs(3600),
            },
            catalog: Arc::new(stub_catalog()),
        })
    }

    pub fn app(
        state: web::Data<AppState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(state)
            .app_data(json_config())
            .app_data(query_config())
            .configure(configure)
    }

    /// Store a user and return it with a valid bearer header value
    pub async fn user(state: &AppState, name: &str) -> (i64, String) {
        let new_user = NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password: "secret1".to_string(),
        };
        let user = crate::db::UserTable::insert(state.db.pool(), &new_user, &hash_password("secret1"))
            .await
            .unwrap();
        let token = create_jwt(user.id, &state.jwt.secret, state.jwt.ttl).unwrap();
        (user.id, format!("Bearer {}", token))
    }

    /// Import the stub catalog's tracks directly
    pub async fn seed_tracks(state: &AppState) -> Vec<i64> {
        let report = SyncOrchestrator::new(state.db.pool(), state.catalog.as_ref())
            .import_top_tracks("Queen")
            .await
            .unwrap();
        report.saved_tracks.iter().map(|t| t.id).collect()
    }
}
