use crate::app_dirs::AppDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key under which the best score is stored.
pub const HIGH_SCORE_KEY: &str = "lettoraHighScore";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("high score database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("unable to create state directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistent best score. A missing or unreadable value reads as 0.
pub trait HighScoreStore: Send {
    fn load(&self) -> u32;
    fn save(&mut self, score: u32) -> Result<(), StoreError>;
    fn reset(&mut self) -> Result<(), StoreError>;
}

/// SQLite-backed store living next to the other application state
#[derive(Debug)]
pub struct SqliteHighScoreStore {
    conn: Connection,
}

impl SqliteHighScoreStore {
    /// Open the store at the default application path, creating it if needed.
    pub fn open_default() -> Result<Self, StoreError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("lettora.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        debug!(path = %path.display(), "opening high score store");
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS high_scores (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }

    fn read(&self) -> rusqlite::Result<Option<i64>> {
        self.conn
            .query_row(
                "SELECT value FROM high_scores WHERE key = ?1",
                [HIGH_SCORE_KEY],
                |row| row.get(0),
            )
            .optional()
    }
}

impl HighScoreStore for SqliteHighScoreStore {
    fn load(&self) -> u32 {
        match self.read() {
            Ok(Some(value)) => u32::try_from(value).unwrap_or(0),
            Ok(None) => 0,
            Err(e) => {
                warn!(error = %e, "unable to read high score");
                0
            }
        }
    }

    fn save(&mut self, score: u32) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO high_scores (key, value, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![HIGH_SCORE_KEY, i64::from(score)],
        )?;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM high_scores WHERE key = ?1", [HIGH_SCORE_KEY])?;
        Ok(())
    }
}

/// Process-local store, used by tests and when no state directory is writable.
#[derive(Debug, Clone, Default)]
pub struct MemoryHighScoreStore {
    value: Option<u32>,
}

impl MemoryHighScoreStore {
    pub fn with_score(score: u32) -> Self {
        Self { value: Some(score) }
    }
}

impl HighScoreStore for MemoryHighScoreStore {
    fn load(&self) -> u32 {
        self.value.unwrap_or(0)
    }

    fn save(&mut self, score: u32) -> Result<(), StoreError> {
        self.value = Some(score);
        Ok(())
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        self.value = None;
        Ok(())
    }
}
