//! Durable user token storage

use crate::config::DatabaseConfig;
use crate::{AccountServiceError, Result, User};
use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// SQLite-backed store of one token record per user
#[derive(Debug, Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Open (creating if needed) the database and apply migrations
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

        // Every connection to an in-memory database sees a different database,
        // so the pool must hold on to exactly one.
        let in_memory = config.url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new().max_connections(if in_memory {
            1
        } else {
            config.max_connections.max(1)
        });
        if in_memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;
        let store = Self::new(pool);
        store.migrate().await?;

        info!(url = %config.url, "User store ready");
        Ok(store)
    }

    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert or replace the token record for `user.user_id`
    pub async fn upsert(&self, user: &User) -> Result<()> {
        let now = Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO users (user_id, access_token, refresh_token, token_expires_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                token_expires_at = excluded.token_expires_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.access_token)
        .bind(&user.refresh_token)
        .bind(user.token_expires_at.timestamp())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user.user_id, expires_at = %user.token_expires_at, "Stored user tokens");
        Ok(())
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT user_id, access_token, refresh_token, token_expires_at FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| user_from_row(&row)).transpose()
    }

    /// Like [`UserStore::get`], but a missing record is an error
    pub async fn require(&self, user_id: &str) -> Result<User> {
        self.get(user_id)
            .await?
            .ok_or_else(|| AccountServiceError::UserNotFound { user_id: user_id.to_string() })
    }

    /// The earliest-created user, used by single-user tooling
    pub async fn first(&self) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT user_id, access_token, refresh_token, token_expires_at FROM users ORDER BY created_at, user_id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| user_from_row(&row)).transpose()
    }

    pub async fn list_ids(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT user_id FROM users ORDER BY user_id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(|row| row.try_get::<String, _>("user_id").map_err(Into::into)).collect()
    }
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let expires_at: i64 = row.try_get("token_expires_at")?;
    Ok(User {
        user_id: row.try_get("user_id")?,
        access_token: row.try_get("access_token")?,
        refresh_token: row.try_get("refresh_token")?,
        token_expires_at: timestamp_to_datetime(expires_at),
    })
}

fn timestamp_to_datetime(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
}
