//! Playlist API routes; every route requires a signed-in caller

use actix_web::{delete, get, post, put, web, HttpResponse};
use sqlx::SqlitePool;
use std::collections::HashSet;

use super::track::populate;
use super::{AppState, AuthUser};
use crate::core::{authorize, Action, Resource, Subject};
use crate::db::{PlaylistTable, TrackTable};
use crate::error::ApiError;
use crate::models::{
    NewPlaylist, Playlist, PlaylistUpdate, PlaylistView, User, Validate, ValidationErrors,
};

/// Populate tracks in playlist order, dropping ids that no longer resolve
async fn view(pool: &SqlitePool, playlist: Playlist) -> Result<PlaylistView, ApiError> {
    let mut found = TrackTable::get_many(pool, &playlist.tracks).await?;
    let tracks = playlist
        .tracks
        .iter()
        .filter_map(|id| found.remove(id))
        .collect();

    let tracks = populate(pool, tracks).await?;
    Ok(PlaylistView::new(playlist, tracks))
}

/// Drop repeated track ids, keeping the first occurrence
fn dedup_tracks(ids: &mut Vec<i64>) {
    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(*id));
}

async fn ensure_tracks_exist(pool: &SqlitePool, ids: &[i64]) -> Result<(), ApiError> {
    let found = TrackTable::get_many(pool, ids).await?;
    match ids.iter().find(|id| !found.contains_key(*id)) {
        Some(missing) => Err(ValidationErrors::single(
            "tracks",
            format!("track {} does not exist", missing),
        )
        .into()),
        None => Ok(()),
    }
}

/// Load a playlist and check the caller may perform `action` on it
async fn load(
    pool: &SqlitePool,
    user: &User,
    id: i64,
    action: Action,
) -> Result<Playlist, ApiError> {
    let playlist = PlaylistTable::get_by_id(pool, id)
        .await?
        .ok_or(ApiError::NotFound("playlist"))?;

    authorize(Subject::from(user), Resource::Playlist(&playlist), action).ensure()?;
    Ok(playlist)
}

/// GET /playlists
#[get("")]
pub async fn list_playlists(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let mut data = Vec::new();
    for playlist in PlaylistTable::by_owner(pool, user.id).await? {
        data.push(view(pool, playlist).await?);
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": data.len(),
        "data": data,
    })))
}

/// GET /playlists/{id}
#[get("/{id}")]
pub async fn get_playlist(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let playlist = load(pool, &user, path.into_inner(), Action::Read).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": view(pool, playlist).await?,
    })))
}

/// POST /playlists
#[post("")]
pub async fn create_playlist(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<NewPlaylist>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let mut new_playlist = body.into_inner().normalized();
    new_playlist.validate()?;

    dedup_tracks(&mut new_playlist.tracks);
    ensure_tracks_exist(pool, &new_playlist.tracks).await?;

    let playlist = PlaylistTable::insert(pool, user.id, &new_playlist).await?;
    tracing::info!("User {} created playlist {} ({})", user.id, playlist.name, playlist.id);

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "data": playlist,
    })))
}

/// PUT /playlists/{id}
#[put("/{id}")]
pub async fn update_playlist(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<i64>,
    body: web::Json<PlaylistUpdate>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let mut playlist = load(pool, &user, path.into_inner(), Action::Update).await?;

    let mut merged = body.into_inner().merge(&playlist);
    merged.validate()?;
    dedup_tracks(&mut merged.tracks);
    ensure_tracks_exist(pool, &merged.tracks).await?;

    playlist.name = merged.name;
    playlist.description = merged.description;
    playlist.is_public = merged.is_public.unwrap_or(playlist.is_public);
    playlist.tracks = merged.tracks;
    PlaylistTable::update(pool, &playlist).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": playlist,
    })))
}

/// DELETE /playlists/{id}
#[delete("/{id}")]
pub async fn delete_playlist(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let playlist = load(pool, &user, path.into_inner(), Action::Delete).await?;
    PlaylistTable::delete(pool, playlist.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {},
    })))
}

/// PUT /playlists/{id}/tracks/{track_id}
#[put("/{id}/tracks/{track_id}")]
pub async fn add_track(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let (id, track_id) = path.into_inner();
    let mut playlist = load(pool, &user, id, Action::AddTrack).await?;

    if !TrackTable::exists(pool, track_id).await? {
        return Err(ApiError::NotFound("track"));
    }
    if !playlist.add_track(track_id) {
        return Err(ApiError::BadRequest(
            "track is already in this playlist".to_string(),
        ));
    }
    PlaylistTable::update_tracks(pool, playlist.id, &playlist.tracks).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": playlist,
    })))
}

/// DELETE /playlists/{id}/tracks/{track_id}
#[delete("/{id}/tracks/{track_id}")]
pub async fn remove_track(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let (id, track_id) = path.into_inner();
    let mut playlist = load(pool, &user, id, Action::RemoveTrack).await?;

    if playlist.remove_track(track_id) {
        PlaylistTable::update_tracks(pool, playlist.id, &playlist.tracks).await?;
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": playlist,
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_playlists)
        .service(create_playlist)
        .service(get_playlist)
        .service(update_playlist)
        .service(delete_playlist)
        .service(add_track)
        .service(remove_track);
}
