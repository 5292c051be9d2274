// ============================
// canary-backend-lib/src/storage/sqlite.rs
// ============================
//! SQLite-backed user and session store.
//!
//! Tables:
//! - `users`: id, username (unique), password_hash, created_at
//! - `sessions`: token_hash (primary key), user_id, username, created_at, expires_at
//!
//! Timestamps are stored as Unix milliseconds. Sessions carry no foreign key
//! to `users`; lookups join on the owner so orphaned rows read as absent.
use async_trait::async_trait;
use canary_common::UserId;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::{fs, path::Path, sync::Arc, time::Duration};
use uuid::Uuid;

use super::{SessionRecord, SessionStore, StoreError, User, UserStore};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS sessions (
        token_hash TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        username TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        expires_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);
    CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
";

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref code, _)
                if code.code == ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict
            },
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// SQLite store. The connection is serialized behind a mutex and every call
/// runs on the blocking thread pool.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::Backend(e.to_string()))?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;

        // WAL mode for concurrent reads + crash safety
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        Self::init(conn)
    }

    /// Private database that disappears with the store
    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("SQLite task failed: {e}")))?
    }
}

fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Backend(format!("Timestamp out of range: {ms}")))
}

fn parse_user_id(raw: &str) -> Result<UserId, StoreError> {
    Uuid::parse_str(raw)
        .map(UserId)
        .map_err(|e| StoreError::Backend(format!("Corrupt user id {raw:?}: {e}")))
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let user = user.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO users (id, username, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    user.id.to_string(),
                    user.username,
                    user.password_hash,
                    to_millis(user.created_at)
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        let username = username.to_string();
        self.with_conn(move |conn| {
            let (id, username, password_hash, created_at): (String, String, String, i64) = conn
                .query_row(
                    "SELECT id, username, password_hash, created_at
                     FROM users WHERE username = ?1",
                    params![username],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )?;

            Ok(User {
                id: parse_user_id(&id)?,
                username,
                password_hash,
                created_at: from_millis(created_at)?,
            })
        })
        .await
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn put(&self, session: &SessionRecord) -> Result<(), StoreError> {
        let session = session.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO sessions (token_hash, user_id, username, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    session.token_hash,
                    session.user_id.to_string(),
                    session.username,
                    to_millis(session.created_at),
                    to_millis(session.expires_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get(&self, token_hash: &str) -> Result<SessionRecord, StoreError> {
        let token_hash = token_hash.to_string();
        self.with_conn(move |conn| {
            let row: Option<(String, String, String, i64, i64)> = conn
                .query_row(
                    "SELECT s.token_hash, s.user_id, s.username, s.created_at, s.expires_at
                     FROM sessions s
                     JOIN users u ON u.id = s.user_id
                     WHERE s.token_hash = ?1",
                    params![token_hash],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                        ))
                    },
                )
                .optional()?;

            let (token_hash, user_id, username, created_at, expires_at) =
                row.ok_or(StoreError::NotFound)?;

            Ok(SessionRecord {
                token_hash,
                user_id: parse_user_id(&user_id)?,
                username,
                created_at: from_millis(created_at)?,
                expires_at: from_millis(expires_at)?,
            })
        })
        .await
    }

    async fn delete(&self, token_hash: &str) -> Result<(), StoreError> {
        let token_hash = token_hash.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM sessions WHERE token_hash = ?1",
                params![token_hash],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let cutoff = to_millis(cutoff);
        self.with_conn(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM sessions WHERE expires_at < ?1",
                params![cutoff],
            )?;
            Ok(deleted as u64)
        })
        .await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}
