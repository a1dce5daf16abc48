//! Artist table operations

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;

use crate::db::DbResult;
use crate::models::{Artist, NewArtist};

/// Database row for artist table
#[derive(Debug, FromRow)]
struct ArtistRow {
    id: i64,
    name: String,
    bio: Option<String>,
    genres: String,
    spotify_id: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl ArtistRow {
    fn into_artist(self) -> Artist {
        let genres: Vec<String> = serde_json::from_str(&self.genres).unwrap_or_default();

        Artist {
            id: self.id,
            name: self.name,
            bio: self.bio,
            genres,
            spotify_id: self.spotify_id,
            image_url: self.image_url,
            created_at: self.created_at,
        }
    }
}

/// Artist table operations
pub struct ArtistTable;

impl ArtistTable {
    /// Get all artists
    pub async fn all(pool: &SqlitePool) -> DbResult<Vec<Artist>> {
        let rows: Vec<ArtistRow> = sqlx::query_as("SELECT * FROM artist ORDER BY id")
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(ArtistRow::into_artist).collect())
    }

    /// Get artist by ID
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> DbResult<Option<Artist>> {
        let row: Option<ArtistRow> = sqlx::query_as("SELECT * FROM artist WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(ArtistRow::into_artist))
    }

    /// Get artist by Spotify ID
    pub async fn get_by_spotify_id(
        pool: &SqlitePool,
        spotify_id: &str,
    ) -> DbResult<Option<Artist>> {
        let row: Option<ArtistRow> = sqlx::query_as("SELECT * FROM artist WHERE spotify_id = ?")
            .bind(spotify_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(ArtistRow::into_artist))
    }

    /// Get the artists among `ids` that still exist, keyed by ID
    pub async fn get_many(pool: &SqlitePool, ids: &[i64]) -> DbResult<HashMap<i64, Artist>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM artist WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = builder.build_query_as::<ArtistRow>().fetch_all(pool).await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.id, r.into_artist()))
            .collect())
    }

    /// Check if an artist exists
    pub async fn exists(pool: &SqlitePool, id: i64) -> DbResult<bool> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM artist WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(row.0 > 0)
    }

    /// Insert an artist
    pub async fn insert(pool: &SqlitePool, artist: &NewArtist) -> DbResult<Artist> {
        let genres = encode_genres(&artist.genres);
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO artist (name, bio, genres, spotify_id, image_url, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&artist.name)
        .bind(&artist.bio)
        .bind(&genres)
        .bind(&artist.spotify_id)
        .bind(&artist.image_url)
        .bind(created_at)
        .execute(pool)
        .await?;

        Ok(Artist {
            id: result.last_insert_rowid(),
            name: artist.name.clone(),
            bio: artist.bio.clone(),
            genres: artist.genres.clone(),
            spotify_id: artist.spotify_id.clone(),
            image_url: artist.image_url.clone(),
            created_at,
        })
    }

    /// Overwrite an artist's fields, returns the stored record
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        artist: &NewArtist,
    ) -> DbResult<Option<Artist>> {
        let genres = encode_genres(&artist.genres);

        let result = sqlx::query(
            "UPDATE artist SET name = ?, bio = ?, genres = ?, spotify_id = ?, image_url = ? WHERE id = ?",
        )
        .bind(&artist.name)
        .bind(&artist.bio)
        .bind(&genres)
        .bind(&artist.spotify_id)
        .bind(&artist.image_url)
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::get_by_id(pool, id).await
    }

    /// Delete artist; tracks are left untouched
    pub async fn delete(pool: &SqlitePool, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM artist WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn encode_genres(genres: &[String]) -> String {
    serde_json::to_string(genres).unwrap_or_else(|_| "[]".to_string())
}
