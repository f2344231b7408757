use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::SocialStore;
use crate::models::{Post, Profile, UserRecord, UserRef};

/// SQLite-backed document store. Users are plain rows; profiles and posts
/// are JSON documents with their lookup keys pulled out into columns.
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub async fn connect(url: &str, max_connections: u32) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::ConfigurationError(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to {}: {}", url, e)))?;

        let db = Self { pool };
        db.initialize().await?;
        info!("Connected to SQLite store at {}", url);
        Ok(db)
    }

    /// Single-connection in-memory store; the connection is never recycled
    /// because the data lives only as long as it does.
    pub async fn new_in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            AppError::DatabaseError(format!("Failed to configure in-memory SQLite: {}", e))
        })?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    /// Create collections and indexes if they do not exist yet
    pub async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BLOB PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                avatar TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create users table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id BLOB PRIMARY KEY,
                user_id BLOB NOT NULL UNIQUE,
                data TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create profiles table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id BLOB PRIMARY KEY,
                user_id BLOB NOT NULL,
                data TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create posts table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at DESC)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create posts index: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_user ON posts(user_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to create posts user index: {}", e))
            })?;

        Ok(())
    }
}

fn millis_to_datetime(ms: i64) -> AppResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| AppError::DatabaseError(format!("Invalid timestamp {}", ms)))
}

fn user_from_row(row: &SqliteRow) -> AppResult<UserRecord> {
    Ok(UserRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        avatar: row.try_get("avatar")?,
        date: millis_to_datetime(row.try_get("created_at")?)?,
    })
}

fn document_from_row<T: serde::de::DeserializeOwned>(row: &SqliteRow) -> AppResult<T> {
    let data: String = row.try_get("data")?;
    serde_json::from_str(&data)
        .map_err(|e| AppError::DatabaseError(format!("Corrupt document: {}", e)))
}

/// Profiles are stored with a bare owner id, never a populated summary.
fn profile_document(profile: &Profile) -> AppResult<String> {
    let mut doc = profile.clone();
    doc.user = UserRef::Id(profile.owner_id());
    Ok(serde_json::to_string(&doc)?)
}

#[async_trait]
impl SocialStore for SqliteDatabase {
    async fn insert_user(&self, user: &UserRecord) -> AppResult<()> {
        let result = sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, avatar, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar)
        .bind(user.date.timestamp_millis())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::Conflict("User already exist".to_string()))
            }
            Err(e) => Err(AppError::DatabaseError(format!(
                "Failed to create user {}: {}",
                user.id, e
            ))),
        }
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, avatar, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to get user {}: {}", id, e)))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, avatar, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to look up user by email: {}", e)))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_users(&self) -> AppResult<Vec<UserRecord>> {
        let rows = sqlx::query(
            "SELECT id, name, email, password_hash, avatar, created_at FROM users ORDER BY created_at, rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list users: {}", e)))?;

        rows.iter().map(user_from_row).collect()
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete user {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_profile_by_user(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let row = sqlx::query("SELECT data FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to get profile of {}: {}", user_id, e))
            })?;

        row.as_ref().map(document_from_row).transpose()
    }

    async fn list_profiles(&self) -> AppResult<Vec<Profile>> {
        let rows = sqlx::query("SELECT data FROM profiles ORDER BY created_at, rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list profiles: {}", e)))?;

        rows.iter().map(document_from_row).collect()
    }

    async fn save_profile(&self, profile: &Profile) -> AppResult<()> {
        let data = profile_document(profile)?;
        let now = Utc::now().timestamp_millis();
        sqlx::query(
            r#"
            INSERT INTO profiles (id, user_id, data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
            "#,
        )
        .bind(profile.id)
        .bind(profile.owner_id())
        .bind(data)
        .bind(profile.date.timestamp_millis())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to save profile {}: {}", profile.id, e))
        })?;
        Ok(())
    }

    async fn delete_profile_by_user(&self, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to delete profile of {}: {}", user_id, e))
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_post(&self, post: &Post) -> AppResult<()> {
        let data = serde_json::to_string(post)?;
        let created = post.date.timestamp_millis();
        sqlx::query(
            "INSERT INTO posts (id, user_id, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(post.id)
        .bind(post.user)
        .bind(data)
        .bind(created)
        .bind(created)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create post {}: {}", post.id, e)))?;
        Ok(())
    }

    async fn find_post(&self, id: Uuid) -> AppResult<Option<Post>> {
        let row = sqlx::query("SELECT data FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get post {}: {}", id, e)))?;

        row.as_ref().map(document_from_row).transpose()
    }

    async fn list_posts(&self) -> AppResult<Vec<Post>> {
        let rows = sqlx::query("SELECT data FROM posts ORDER BY created_at DESC, rowid DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list posts: {}", e)))?;

        rows.iter().map(document_from_row).collect()
    }

    async fn update_post(&self, post: &Post) -> AppResult<()> {
        let data = serde_json::to_string(post)?;
        let result = sqlx::query("UPDATE posts SET data = ?, updated_at = ? WHERE id = ?")
            .bind(data)
            .bind(Utc::now().timestamp_millis())
            .bind(post.id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to update post {}: {}", post.id, e))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete post {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_posts_by_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM posts WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to delete posts of {}: {}", user_id, e))
            })?;
        Ok(result.rows_affected())
    }
}
