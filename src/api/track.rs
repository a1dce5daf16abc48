//! Track API routes

use actix_web::{delete, get, post, put, web, HttpResponse};
use sqlx::SqlitePool;

use super::{AppState, AuthUser};
use crate::core::{authorize, Action, Resource, Subject};
use crate::db::{ArtistTable, TrackTable};
use crate::error::ApiError;
use crate::models::{NewTrack, Track, TrackDraft, TrackUpdate, TrackView, ValidationErrors};
use crate::utils::pagination::PageQuery;

/// Attach `{id, name, genres}` of each track's artist, `None` for deleted artists
pub(crate) async fn populate(pool: &SqlitePool, tracks: Vec<Track>) -> Result<Vec<TrackView>, ApiError> {
    let mut artist_ids: Vec<i64> = tracks.iter().map(|t| t.artist_id).collect();
    artist_ids.sort_unstable();
    artist_ids.dedup();

    let artists = ArtistTable::get_many(pool, &artist_ids).await?;

    Ok(tracks
        .into_iter()
        .map(|track| {
            let artist = artists.get(&track.artist_id).map(|a| a.to_ref());
            TrackView::new(track, artist)
        })
        .collect())
}

async fn ensure_artist(pool: &SqlitePool, draft: &TrackDraft) -> Result<(), ApiError> {
    if ArtistTable::exists(pool, draft.artist_id).await? {
        Ok(())
    } else {
        Err(ValidationErrors::single("artist", "artist does not exist").into())
    }
}

/// GET /tracks
#[get("")]
pub async fn list_tracks(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let page = query.into_inner().resolve();

    let total = TrackTable::count(pool).await?;
    let tracks = TrackTable::page(pool, page.offset(), page.limit as i64).await?;
    let data = populate(pool, tracks).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": data.len(),
        "pagination": page.info(total),
        "data": data,
    })))
}

/// GET /tracks/{id}
#[get("/{id}")]
pub async fn get_track(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let pool = state.db.pool();
    let track = TrackTable::get_by_id(pool, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("track"))?;

    let data = populate(pool, vec![track]).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": data.into_iter().next(),
    })))
}

/// POST /tracks
#[post("")]
pub async fn create_track(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<NewTrack>,
) -> Result<HttpResponse, ApiError> {
    authorize(Subject::from(&user), Resource::Track, Action::Create).ensure()?;

    let pool = state.db.pool();
    let draft = body.into_inner().into_draft()?;
    ensure_artist(pool, &draft).await?;

    let track = TrackTable::insert(pool, &draft).await?;
    tracing::info!("User {} created track {} ({})", user.id, track.title, track.id);

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "data": track,
    })))
}

/// PUT /tracks/{id}
#[put("/{id}")]
pub async fn update_track(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<i64>,
    body: web::Json<TrackUpdate>,
) -> Result<HttpResponse, ApiError> {
    authorize(Subject::from(&user), Resource::Track, Action::Update).ensure()?;

    let pool = state.db.pool();
    let id = path.into_inner();
    let current = TrackTable::get_by_id(pool, id)
        .await?
        .ok_or(ApiError::NotFound("track"))?;

    let draft = body.into_inner().merge(&current).into_draft()?;
    if draft.artist_id != current.artist_id {
        ensure_artist(pool, &draft).await?;
    }

    let track = TrackTable::update(pool, id, &draft)
        .await?
        .ok_or(ApiError::NotFound("track"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": track,
    })))
}

/// DELETE /tracks/{id}
#[delete("/{id}")]
pub async fn delete_track(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    authorize(Subject::from(&user), Resource::Track, Action::Delete).ensure()?;

    let pool = state.db.pool();
    let id = path.into_inner();
    let pruned = TrackTable::delete(pool, id)
        .await?
        .ok_or(ApiError::NotFound("track"))?;
    tracing::info!("User {} deleted track {}, pruned from {} playlists", user.id, id, pruned);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {},
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_tracks)
        .service(create_track)
        .service(get_track)
        .service(update_track)
        .service(delete_track);
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{app, seed_tracks, state, user};
    use crate::db::{ArtistTable, TrackTable};
    use crate::models::{Genre, NewArtist, TrackDraft};
    use actix_web::test;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_pagination() {
        let state = state().await;
        let artist = ArtistTable::insert(
            state.db.pool(),
            &NewArtist {
                name: "Queen".to_string(),
                genres: vec!["rock".to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap();
        for i in 0..25 {
            TrackTable::insert(
                state.db.pool(),
                &TrackDraft {
                    title: format!("Track {}", i),
                    artist_id: artist.id,
                    duration: 180,
                    album: "Live at Wembley".to_string(),
                    release_year: Some(1986),
                    genre: Genre::Rock,
                    spotify_id: None,
                },
            )
            .await
            .unwrap();
        }

        let app = test::init_service(app(state)).await;
        let req = test::TestRequest::get()
            .uri("/api/tracks?page=2&limit=10")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["count"], 10);
        assert_eq!(body["pagination"], json!({ "page": 2, "limit": 10, "total": 25, "pages": 3 }));
        assert_eq!(body["data"][0]["title"], "Track 10");
        assert_eq!(
            body["data"][0]["artist"],
            json!({ "id": artist.id, "name": "Queen", "genres": ["rock"] })
        );

        let req = test::TestRequest::get().uri("/api/tracks?limit=500").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["pagination"]["limit"], 100);
        assert_eq!(body["count"], 25);
    }

    #[actix_web::test]
    async fn test_create_requires_auth_and_valid_body() {
        let state = state().await;
        let (_, bearer) = user(&state, "brian").await;
        let artist = ArtistTable::insert(
            state.db.pool(),
            &NewArtist {
                name: "Queen".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let app = test::init_service(app(state)).await;

        let payload = json!({ "title": "Spread Your Wings", "artist": artist.id, "duration": 275, "genre": "Rock" });

        let req = test::TestRequest::post()
            .uri("/api/tracks")
            .set_json(&payload)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);

        let req = test::TestRequest::post()
            .uri("/api/tracks")
            .insert_header(("Authorization", bearer.as_str()))
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["album"], "Unknown Album");
        assert_eq!(body["data"]["artist"], artist.id);

        let req = test::TestRequest::post()
            .uri("/api/tracks")
            .insert_header(("Authorization", bearer.as_str()))
            .set_json(json!({ "title": "Orphan", "artist": 999, "duration": 10 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::post()
            .uri("/api/tracks")
            .insert_header(("Authorization", bearer.as_str()))
            .set_json(json!({ "title": "Bad Genre", "artist": artist.id, "duration": 10, "genre": "Polka" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }

    #[actix_web::test]
    async fn test_update_and_delete() {
        let state = state().await;
        let (_, bearer) = user(&state, "roger").await;
        let ids = seed_tracks(&state).await;
        let app = test::init_service(app(state)).await;

        let req = test::TestRequest::put()
            .uri(&format!("/api/tracks/{}", ids[0]))
            .insert_header(("Authorization", bearer.as_str()))
            .set_json(json!({ "genre": "Rock" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["genre"], "Rock");
        assert_eq!(body["data"]["title"], "Bohemian Rhapsody");

        let req = test::TestRequest::delete()
            .uri(&format!("/api/tracks/{}", ids[0]))
            .insert_header(("Authorization", bearer.as_str()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::get()
            .uri(&format!("/api/tracks/{}", ids[0]))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }
}
