//! Playlist table operations

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::db::DbResult;
use crate::models::{NewPlaylist, Playlist};

/// Database row for playlist table
#[derive(Debug, FromRow)]
struct PlaylistRow {
    id: i64,
    name: String,
    description: Option<String>,
    owner_id: i64,
    tracks: String,
    is_public: bool,
    created_at: DateTime<Utc>,
}

impl PlaylistRow {
    fn into_playlist(self) -> Playlist {
        let tracks: Vec<i64> = serde_json::from_str(&self.tracks).unwrap_or_default();

        Playlist {
            id: self.id,
            name: self.name,
            description: self.description,
            owner_id: self.owner_id,
            tracks,
            is_public: self.is_public,
            created_at: self.created_at,
        }
    }
}

/// Playlist table operations
pub struct PlaylistTable;

impl PlaylistTable {
    /// Get all playlists owned by a user
    pub async fn by_owner(pool: &SqlitePool, owner_id: i64) -> DbResult<Vec<Playlist>> {
        let rows: Vec<PlaylistRow> =
            sqlx::query_as("SELECT * FROM playlist WHERE owner_id = ? ORDER BY id")
                .bind(owner_id)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().map(PlaylistRow::into_playlist).collect())
    }

    /// Get playlist by ID
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> DbResult<Option<Playlist>> {
        let row: Option<PlaylistRow> = sqlx::query_as("SELECT * FROM playlist WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(PlaylistRow::into_playlist))
    }

    /// Insert playlist
    pub async fn insert(
        pool: &SqlitePool,
        owner_id: i64,
        playlist: &NewPlaylist,
    ) -> DbResult<Playlist> {
        let tracks = encode_tracks(&playlist.tracks);
        let is_public = playlist.is_public.unwrap_or(true);
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO playlist (name, description, owner_id, tracks, is_public, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(owner_id)
        .bind(&tracks)
        .bind(is_public)
        .bind(created_at)
        .execute(pool)
        .await?;

        Ok(Playlist {
            id: result.last_insert_rowid(),
            name: playlist.name.clone(),
            description: playlist.description.clone(),
            owner_id,
            tracks: playlist.tracks.clone(),
            is_public,
            created_at,
        })
    }

    /// Update name, description, visibility and track order; the owner never changes
    pub async fn update(pool: &SqlitePool, playlist: &Playlist) -> DbResult<()> {
        let tracks = encode_tracks(&playlist.tracks);

        sqlx::query(
            "UPDATE playlist SET name = ?, description = ?, tracks = ?, is_public = ? WHERE id = ?",
        )
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(&tracks)
        .bind(playlist.is_public)
        .bind(playlist.id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Update only the track list
    pub async fn update_tracks(pool: &SqlitePool, id: i64, tracks: &[i64]) -> DbResult<()> {
        sqlx::query("UPDATE playlist SET tracks = ? WHERE id = ?")
            .bind(encode_tracks(tracks))
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Drop a deleted track from every playlist that references it.
    /// Runs on the caller's connection so it shares the track delete's transaction.
    pub async fn prune_track(conn: &mut SqliteConnection, track_id: i64) -> DbResult<u64> {
        let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, tracks FROM playlist")
            .fetch_all(&mut *conn)
            .await?;

        let mut pruned = 0;
        for (id, tracks) in rows {
            let mut ids: Vec<i64> = serde_json::from_str(&tracks).unwrap_or_default();
            let before = ids.len();
            ids.retain(|t| *t != track_id);
            if ids.len() == before {
                continue;
            }

            sqlx::query("UPDATE playlist SET tracks = ? WHERE id = ?")
                .bind(encode_tracks(&ids))
                .bind(id)
                .execute(&mut *conn)
                .await?;
            pruned += 1;
        }

        Ok(pruned)
    }

    /// Delete playlist
    pub async fn delete(pool: &SqlitePool, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM playlist WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn encode_tracks(tracks: &[i64]) -> String {
    serde_json::to_string(tracks).unwrap_or_else(|_| "[]".to_string())
}
