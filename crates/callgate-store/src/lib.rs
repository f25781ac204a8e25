//! SQLite persistence for Callgate.
//!
//! Four small record types: the admin OAuth credential (single row, replaced
//! wholesale), user web sessions, the allow list, and the latest location
//! sample per account. All operations are typed; no raw rows escape this
//! crate.

use callgate_core::{AdminToken, AllowEntry, LocationSample, UserSession};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Handle to the SQLite database. Cheap to clone; all clones share one pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `path` and run migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        Self::from_pool(pool).await
    }

    /// In-memory database, used by tests. Pinned to a single connection so
    /// every query sees the same memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    // --- admin token ---

    /// Replace the stored admin credential. Deletes any existing rows first so
    /// exactly one credential exists afterwards.
    pub async fn replace_admin_token(&self, token: &AdminToken) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM admin_tokens").execute(&mut *tx).await?;
        sqlx::query(
            "INSERT INTO admin_tokens \
             (access_token, expires_in, refresh_token, refresh_token_expires_in, \
              token_type, scope, expires_at, acquired_at, session_token) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&token.access_token)
        .bind(token.expires_in)
        .bind(&token.refresh_token)
        .bind(token.refresh_token_expires_in)
        .bind(&token.token_type)
        .bind(&token.scope)
        .bind(token.expires_at)
        .bind(token.acquired_at)
        .bind(&token.session_token)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Fetch the stored admin credential, if any.
    pub async fn admin_token(&self) -> Result<Option<AdminToken>, StoreError> {
        let row = sqlx::query(
            "SELECT access_token, expires_in, refresh_token, refresh_token_expires_in, \
             token_type, scope, expires_at, acquired_at, session_token \
             FROM admin_tokens LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| AdminToken {
            access_token: r.get("access_token"),
            expires_in: r.get("expires_in"),
            refresh_token: r.get("refresh_token"),
            refresh_token_expires_in: r.get("refresh_token_expires_in"),
            token_type: r.get("token_type"),
            scope: r.get("scope"),
            expires_at: r.get("expires_at"),
            acquired_at: r.get("acquired_at"),
            session_token: r.get("session_token"),
        }))
    }

    // --- user sessions ---

    /// Insert or update the session token for an account.
    pub async fn upsert_user_session(
        &self,
        account_id: &str,
        session_token: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO user_sessions (account_id, session_token) VALUES (?, ?) \
             ON CONFLICT(account_id) DO UPDATE SET session_token = excluded.session_token",
        )
        .bind(account_id)
        .bind(session_token)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Look up a session by its token.
    pub async fn user_session_by_token(
        &self,
        session_token: &str,
    ) -> Result<Option<UserSession>, StoreError> {
        let row = sqlx::query(
            "SELECT account_id, session_token FROM user_sessions WHERE session_token = ?",
        )
        .bind(session_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| UserSession {
            account_id: r.get("account_id"),
            session_token: r.get("session_token"),
        }))
    }

    /// Look up a session by account id.
    pub async fn user_session_by_account(
        &self,
        account_id: &str,
    ) -> Result<Option<UserSession>, StoreError> {
        let row = sqlx::query(
            "SELECT account_id, session_token FROM user_sessions WHERE account_id = ?",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| UserSession {
            account_id: r.get("account_id"),
            session_token: r.get("session_token"),
        }))
    }

    // --- allow list ---

    /// Fetch the allow-list entry for an account.
    pub async fn allow_entry(&self, account_id: &str) -> Result<Option<AllowEntry>, StoreError> {
        let row = sqlx::query("SELECT account_id, allow_caller FROM allow_list WHERE account_id = ?")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| AllowEntry {
            account_id: r.get("account_id"),
            allow_caller: r.get::<i64, _>("allow_caller") != 0,
        }))
    }

    /// Insert or update an allow-list entry.
    pub async fn set_allow_entry(
        &self,
        account_id: &str,
        allow_caller: bool,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO allow_list (account_id, allow_caller) VALUES (?, ?) \
             ON CONFLICT(account_id) DO UPDATE SET allow_caller = excluded.allow_caller",
        )
        .bind(account_id)
        .bind(allow_caller as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // --- location samples ---

    /// Record a location sample, replacing the account's previous one.
    pub async fn record_location_sample(&self, sample: &LocationSample) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO location_samples \
             (account_id, session_token, reported_at, latitude, longitude, last_update) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(account_id) DO UPDATE SET \
               session_token = excluded.session_token, \
               reported_at = excluded.reported_at, \
               latitude = excluded.latitude, \
               longitude = excluded.longitude, \
               last_update = excluded.last_update",
        )
        .bind(&sample.account_id)
        .bind(&sample.session_token)
        .bind(&sample.reported_at)
        .bind(sample.latitude)
        .bind(sample.longitude)
        .bind(sample.last_update)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch the latest location sample for an account.
    pub async fn latest_sample(
        &self,
        account_id: &str,
    ) -> Result<Option<LocationSample>, StoreError> {
        let row = sqlx::query(
            "SELECT account_id, session_token, reported_at, latitude, longitude, last_update \
             FROM location_samples WHERE account_id = ?",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| LocationSample {
            account_id: r.get("account_id"),
            session_token: r.get("session_token"),
            reported_at: r.get("reported_at"),
            latitude: r.get("latitude"),
            longitude: r.get("longitude"),
            last_update: r.get("last_update"),
        }))
    }
}
