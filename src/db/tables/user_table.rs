//! User table operations

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::db::DbResult;
use crate::models::{NewUser, User};

/// Database row for user table
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            password: self.password,
            created_at: self.created_at,
        }
    }
}

/// User table operations
pub struct UserTable;

impl UserTable {
    /// Get user by ID
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> DbResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM user WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(UserRow::into_user))
    }

    /// Get user by (already normalized) email
    pub async fn get_by_email(pool: &SqlitePool, email: &str) -> DbResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM user WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(UserRow::into_user))
    }

    /// Insert a user with an already hashed password
    pub async fn insert(
        pool: &SqlitePool,
        user: &NewUser,
        password_hash: &str,
    ) -> DbResult<User> {
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO user (username, email, password, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(password_hash)
        .bind(created_at)
        .execute(pool)
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: user.username.clone(),
            email: user.email.clone(),
            password: password_hash.to_string(),
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbEngine;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: "unused".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = DbEngine::in_memory().await.unwrap();
        let pool = db.pool();

        let user = UserTable::insert(pool, &new_user("roger", "roger@queen.com"), "hash")
            .await
            .unwrap();

        let by_id = UserTable::get_by_id(pool, user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "roger@queen.com");

        let by_email = UserTable::get_by_email(pool, "roger@queen.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.password, "hash");
    }

    #[tokio::test]
    async fn test_email_and_username_are_unique() {
        let db = DbEngine::in_memory().await.unwrap();
        let pool = db.pool();

        UserTable::insert(pool, &new_user("john", "john@queen.com"), "h")
            .await
            .unwrap();

        let dup_email = UserTable::insert(pool, &new_user("deacy", "john@queen.com"), "h").await;
        assert!(dup_email.is_err());

        let dup_name = UserTable::insert(pool, &new_user("john", "other@queen.com"), "h").await;
        assert!(dup_name.is_err());
    }
}
