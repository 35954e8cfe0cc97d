use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use log::{debug, info};
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::SqlitePool;
use sqlx::{Row, Sqlite, query};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("could not create {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A stored timer. Durations are whole seconds; `alternate_duration` is
/// the optional break phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerDefinition {
    pub id: i64,
    pub name: String,
    pub primary_duration: u64,
    pub alternate_duration: Option<u64>,
}

/// SQLite-backed storage for timer definitions.
pub struct TimerStore {
    pool: SqlitePool,
}

impl TimerStore {
    /// Open the database at `path`, creating the file, its parent
    /// directory and the schema on first use.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                create_dir_all(dir).map_err(|source| StoreError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }

        let db_url: String = format!("sqlite://{}", path.display());
        if !Sqlite::database_exists(&db_url).await.unwrap_or(false) {
            Sqlite::create_database(&db_url).await?;
        }

        let pool: SqlitePool = SqlitePool::connect(&db_url).await?;
        let store = Self { pool };
        store.init_schema().await?;
        info!("timer database at {}", path.display());
        Ok(store)
    }

    // `sqlite::memory:` gives every new connection its own empty database,
    // so the test pool is pinned to a single connection.
    #[cfg(test)]
    pub(crate) async fn open_in_memory() -> Result<Self, StoreError> {
        use sqlx::sqlite::SqlitePoolOptions;

        let pool: SqlitePool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    // Every call fails once the pool is closed.
    #[cfg(test)]
    pub(crate) async fn close(&self) {
        self.pool.close().await;
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        query(
            "CREATE TABLE IF NOT EXISTS timers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                primary_duration INTEGER NOT NULL,
                alternate_duration INTEGER
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn create(
        &self,
        name: &str,
        primary_duration: u64,
        alternate_duration: Option<u64>,
    ) -> Result<TimerDefinition, StoreError> {
        let row = query(
            "INSERT INTO timers (name, primary_duration, alternate_duration)
             VALUES (?, ?, ?) RETURNING id",
        )
        .bind(name)
        .bind(primary_duration as i64)
        .bind(alternate_duration.map(|secs| secs as i64))
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = row.get("id");
        debug!("created timer {id} ({name})");
        Ok(TimerDefinition {
            id,
            name: name.to_string(),
            primary_duration,
            alternate_duration,
        })
    }

    /// All stored timers in creation order.
    pub async fn list(&self) -> Result<Vec<TimerDefinition>, StoreError> {
        let rows = query(
            "SELECT id, name, primary_duration, alternate_duration
             FROM timers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| TimerDefinition {
                id: row.get("id"),
                name: row.get("name"),
                primary_duration: row.get::<i64, _>("primary_duration") as u64,
                alternate_duration: row
                    .get::<Option<i64>, _>("alternate_duration")
                    .map(|secs| secs as u64),
            })
            .collect())
    }

    /// Overwrite both duration columns. An unknown id changes nothing.
    pub async fn update_durations(
        &self,
        id: i64,
        primary_duration: u64,
        alternate_duration: Option<u64>,
    ) -> Result<(), StoreError> {
        query("UPDATE timers SET primary_duration = ?, alternate_duration = ? WHERE id = ?")
            .bind(primary_duration as i64)
            .bind(alternate_duration.map(|secs| secs as i64))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn rename(&self, id: i64, name: &str) -> Result<(), StoreError> {
        query("UPDATE timers SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        query("DELETE FROM timers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        debug!("deleted timer {id}");
        Ok(())
    }
}

/// `<data dir>/timer-tui/timers.db`, next to where other tools keep state.
pub fn default_database_path() -> PathBuf {
    let base: PathBuf = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("timer-tui").join("timers.db")
}
