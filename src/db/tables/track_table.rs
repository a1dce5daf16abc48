//! Track table operations

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;

use crate::db::{DbResult, PlaylistTable};
use crate::models::{Genre, Track, TrackDraft};

/// Database row for track table
#[derive(Debug, FromRow)]
struct TrackRow {
    id: i64,
    title: String,
    artist_id: i64,
    duration: i64,
    album: String,
    release_year: Option<i32>,
    genre: String,
    spotify_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TrackRow {
    fn into_track(self) -> Track {
        Track {
            id: self.id,
            title: self.title,
            artist_id: self.artist_id,
            duration: self.duration,
            album: self.album,
            release_year: self.release_year,
            genre: Genre::from_label(&self.genre).unwrap_or_default(),
            spotify_id: self.spotify_id,
            created_at: self.created_at,
        }
    }
}

/// Track table operations
pub struct TrackTable;

impl TrackTable {
    /// Get track count
    pub async fn count(pool: &SqlitePool) -> DbResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM track")
            .fetch_one(pool)
            .await?;

        Ok(row.0)
    }

    /// Get one page of tracks in insertion order
    pub async fn page(pool: &SqlitePool, offset: i64, limit: i64) -> DbResult<Vec<Track>> {
        let rows: Vec<TrackRow> = sqlx::query_as("SELECT * FROM track ORDER BY id LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(TrackRow::into_track).collect())
    }

    /// Get track by ID
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> DbResult<Option<Track>> {
        let row: Option<TrackRow> = sqlx::query_as("SELECT * FROM track WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(TrackRow::into_track))
    }

    /// Get track by Spotify ID
    pub async fn get_by_spotify_id(pool: &SqlitePool, spotify_id: &str) -> DbResult<Option<Track>> {
        let row: Option<TrackRow> = sqlx::query_as("SELECT * FROM track WHERE spotify_id = ?")
            .bind(spotify_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(TrackRow::into_track))
    }

    /// Get all tracks of an artist
    pub async fn by_artist(pool: &SqlitePool, artist_id: i64) -> DbResult<Vec<Track>> {
        let rows: Vec<TrackRow> = sqlx::query_as("SELECT * FROM track WHERE artist_id = ? ORDER BY id")
            .bind(artist_id)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(TrackRow::into_track).collect())
    }

    /// Get the tracks among `ids` that still exist, keyed by ID
    pub async fn get_many(pool: &SqlitePool, ids: &[i64]) -> DbResult<HashMap<i64, Track>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM track WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = builder.build_query_as::<TrackRow>().fetch_all(pool).await?;

        Ok(rows.into_iter().map(|r| (r.id, r.into_track())).collect())
    }

    /// Check if a track exists
    pub async fn exists(pool: &SqlitePool, id: i64) -> DbResult<bool> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM track WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(row.0 > 0)
    }

    /// Insert a validated track
    pub async fn insert(pool: &SqlitePool, track: &TrackDraft) -> DbResult<Track> {
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO track (title, artist_id, duration, album, release_year, genre, spotify_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&track.title)
        .bind(track.artist_id)
        .bind(track.duration)
        .bind(&track.album)
        .bind(track.release_year)
        .bind(track.genre.as_str())
        .bind(&track.spotify_id)
        .bind(created_at)
        .execute(pool)
        .await?;

        Ok(Track {
            id: result.last_insert_rowid(),
            title: track.title.clone(),
            artist_id: track.artist_id,
            duration: track.duration,
            album: track.album.clone(),
            release_year: track.release_year,
            genre: track.genre,
            spotify_id: track.spotify_id.clone(),
            created_at,
        })
    }

    /// Overwrite a track's fields, returns the stored record
    pub async fn update(pool: &SqlitePool, id: i64, track: &TrackDraft) -> DbResult<Option<Track>> {
        let result = sqlx::query(
            "UPDATE track SET title = ?, artist_id = ?, duration = ?, album = ?, release_year = ?, genre = ?, spotify_id = ? WHERE id = ?",
        )
        .bind(&track.title)
        .bind(track.artist_id)
        .bind(track.duration)
        .bind(&track.album)
        .bind(track.release_year)
        .bind(track.genre.as_str())
        .bind(&track.spotify_id)
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::get_by_id(pool, id).await
    }

    /// Delete track
    /// Delete a track and prune it from playlists in one transaction.
    /// `None` when no such track exists, otherwise the number of playlists touched.
    pub async fn delete(pool: &SqlitePool, id: i64) -> DbResult<Option<u64>> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query("DELETE FROM track WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let pruned = PlaylistTable::prune_track(&mut tx, id).await?;
        tx.commit().await?;

        Ok(Some(pruned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbEngine;
    use crate::models::NewPlaylist;

    fn draft(title: &str, spotify_id: Option<&str>) -> TrackDraft {
        TrackDraft {
            title: title.to_string(),
            artist_id: 1,
            duration: 200,
            album: "A Night at the Opera".to_string(),
            release_year: Some(1975),
            genre: Genre::Rock,
            spotify_id: spotify_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_insert_and_dedup_lookup() {
        let db = DbEngine::in_memory().await.unwrap();
        let pool = db.pool();

        let track = TrackTable::insert(pool, &draft("Love of My Life", Some("t1")))
            .await
            .unwrap();
        assert_eq!(track.genre, Genre::Rock);

        let found = TrackTable::get_by_spotify_id(pool, "t1").await.unwrap().unwrap();
        assert_eq!(found.id, track.id);
        assert_eq!(found.title, "Love of My Life");

        let dup = TrackTable::insert(pool, &draft("Love of My Life (live)", Some("t1"))).await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn test_page_ordering() {
        let db = DbEngine::in_memory().await.unwrap();
        let pool = db.pool();

        for i in 0..25 {
            TrackTable::insert(pool, &draft(&format!("Track {}", i), None))
                .await
                .unwrap();
        }

        assert_eq!(TrackTable::count(pool).await.unwrap(), 25);

        let second = TrackTable::page(pool, 10, 10).await.unwrap();
        assert_eq!(second.len(), 10);
        assert_eq!(second[0].title, "Track 10");

        let last = TrackTable::page(pool, 20, 10).await.unwrap();
        assert_eq!(last.len(), 5);
    }

    #[tokio::test]
    async fn test_by_artist_and_delete() {
        let db = DbEngine::in_memory().await.unwrap();
        let pool = db.pool();

        let mut other = draft("Under Pressure", None);
        other.artist_id = 2;

        let a = TrackTable::insert(pool, &draft("Seven Seas of Rhye", None)).await.unwrap();
        TrackTable::insert(pool, &other).await.unwrap();

        let tracks = TrackTable::by_artist(pool, 1).await.unwrap();
        assert_eq!(tracks.len(), 1);

        assert_eq!(TrackTable::delete(pool, a.id).await.unwrap(), Some(0));
        assert!(!TrackTable::exists(pool, a.id).await.unwrap());
        assert_eq!(TrackTable::delete(pool, a.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_prunes_playlists() {
        let db = DbEngine::in_memory().await.unwrap();
        let pool = db.pool();

        let a = TrackTable::insert(pool, &draft("Mustapha", None)).await.unwrap();
        let b = TrackTable::insert(pool, &draft("Jealousy", None)).await.unwrap();
        let playlist = PlaylistTable::insert(
            pool,
            1,
            &NewPlaylist {
                name: "Jazz".to_string(),
                tracks: vec![a.id, b.id],
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(TrackTable::delete(pool, a.id).await.unwrap(), Some(1));

        let stored = PlaylistTable::get_by_id(pool, playlist.id).await.unwrap().unwrap();
        assert_eq!(stored.tracks, vec![b.id]);
    }

    #[tokio::test]
    async fn test_delete_rolls_back_when_prune_fails() {
        let db = DbEngine::in_memory().await.unwrap();
        let pool = db.pool();

        let a = TrackTable::insert(pool, &draft("Bicycle Race", None)).await.unwrap();
        sqlx::query("DROP TABLE playlist").execute(pool).await.unwrap();

        assert!(TrackTable::delete(pool, a.id).await.is_err());
        assert!(TrackTable::exists(pool, a.id).await.unwrap());
    }
}
