//! Artist API routes, including the Spotify top-tracks import

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;

use super::track::populate;
use super::{AppState, AuthUser};
use crate::core::{authorize, Action, Resource, Subject, SyncOrchestrator};
use crate::db::{ArtistTable, TrackTable};
use crate::error::ApiError;
use crate::models::{ArtistUpdate, NewArtist, Validate};

#[derive(Debug, Deserialize)]
pub struct ArtistNameQuery {
    #[serde(rename = "artistName", default)]
    pub artist_name: Option<String>,
}

impl ArtistNameQuery {
    fn required(self) -> Result<String, ApiError> {
        self.artist_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ApiError::BadRequest("artistName query parameter is required".to_string()))
    }
}

/// GET /artists
#[get("")]
pub async fn list_artists(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let artists = ArtistTable::all(state.db.pool()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": artists.len(),
        "data": artists,
    })))
}

/// GET /artists/spotify/top-tracks?artistName=
#[get("/spotify/top-tracks")]
pub async fn spotify_top_tracks(
    state: web::Data<AppState>,
    query: web::Query<ArtistNameQuery>,
) -> Result<HttpResponse, ApiError> {
    let name = query.into_inner().required()?;
    let tracks = state.catalog.artist_top_tracks(&name).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": tracks.len(),
        "data": tracks,
    })))
}

/// POST /artists/spotify/add/top-tracks?artistName=
#[post("/spotify/add/top-tracks")]
pub async fn import_top_tracks(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    query: web::Query<ArtistNameQuery>,
) -> Result<HttpResponse, ApiError> {
    authorize(Subject::from(&user), Resource::Artist, Action::Create).ensure()?;
    let name = query.into_inner().required()?;

    let report = SyncOrchestrator::new(state.db.pool(), state.catalog.as_ref())
        .import_top_tracks(&name)
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": format!("{} tracks imported", report.summary.saved),
        "data": report,
    })))
}

/// GET /artists/{id}
#[get("/{id}")]
pub async fn get_artist(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let id = path.into_inner();
    let artist = ArtistTable::get_by_id(pool, id)
        .await?
        .ok_or(ApiError::NotFound("artist"))?;

    let tracks = populate(pool, TrackTable::by_artist(pool, id).await?).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {
            "artist": artist,
            "tracks": tracks,
        },
    })))
}

/// POST /artists
#[post("")]
pub async fn create_artist(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<NewArtist>,
) -> Result<HttpResponse, ApiError> {
    authorize(Subject::from(&user), Resource::Artist, Action::Create).ensure()?;

    let new_artist = body.into_inner().normalized();
    new_artist.validate()?;

    let artist = ArtistTable::insert(state.db.pool(), &new_artist).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "data": artist,
    })))
}

/// PUT /artists/{id}
#[put("/{id}")]
pub async fn update_artist(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<i64>,
    body: web::Json<ArtistUpdate>,
) -> Result<HttpResponse, ApiError> {
    authorize(Subject::from(&user), Resource::Artist, Action::Update).ensure()?;

    let pool = state.db.pool();
    let id = path.into_inner();
    let current = ArtistTable::get_by_id(pool, id)
        .await?
        .ok_or(ApiError::NotFound("artist"))?;

    let merged = body.into_inner().merge(&current);
    merged.validate()?;

    let artist = ArtistTable::update(pool, id, &merged)
        .await?
        .ok_or(ApiError::NotFound("artist"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": artist,
    })))
}

/// DELETE /artists/{id}
#[delete("/{id}")]
pub async fn delete_artist(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    authorize(Subject::from(&user), Resource::Artist, Action::Delete).ensure()?;

    let id = path.into_inner();
    if !ArtistTable::delete(state.db.pool(), id).await? {
        return Err(ApiError::NotFound("artist"));
    }
    tracing::info!("User {} deleted artist {}", user.id, id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {},
    })))
}

/// Spotify routes are registered ahead of `/{id}` so they are never parsed as ids
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(spotify_top_tracks)
        .service(import_top_tracks)
        .service(list_artists)
        .service(create_artist)
        .service(get_artist)
        .service(update_artist)
        .service(delete_artist);
}
