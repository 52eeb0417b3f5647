/*!
 * Cache storage in a SQLite database.
 *
 * The connection is wrapped in a mutex so one storage can be shared between
 * threads. The schema is versioned so later releases can migrate it.
 */

use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{CacheRecord, CacheStorage};
use crate::errors::CacheError;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQLite-backed cache storage
pub struct SqliteStorage {
    /// Path to the database file
    db_path: PathBuf,
    /// Thread-safe connection
    connection: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open or create the database at `db_path`
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, CacheError> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening cache database at: {:?}", db_path);
        let conn = Connection::open(&db_path)?;
        initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self, CacheError> {
        debug!("Creating in-memory cache database");
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Mutex::new(conn),
        })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn with_connection<F, T>(&self, f: F) -> Result<T, CacheError>
    where
        F: FnOnce(&mut Connection) -> Result<T, CacheError>,
    {
        let mut conn = self
            .connection
            .lock()
            .map_err(|e| CacheError::Database(format!("Failed to acquire database lock: {}", e)))?;
        f(&mut conn)
    }
}

impl CacheStorage for SqliteStorage {
    fn load(&self) -> Result<Vec<CacheRecord>, CacheError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT fingerprint, language, payload, created_at FROM translation_cache ORDER BY id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?;

            let mut records = Vec::new();
            for row in rows {
                let (fingerprint, language, payload, created_at) = row?;
                let created_at = DateTime::parse_from_rfc3339(&created_at)
                    .map_err(|e| CacheError::Database(format!("Invalid timestamp '{}': {}", created_at, e)))?
                    .with_timezone(&Utc);
                records.push(CacheRecord {
                    fingerprint,
                    language,
                    payload: serde_json::from_str(&payload)?,
                    created_at,
                });
            }
            Ok(records)
        })
    }

    fn save(&self, records: &[CacheRecord]) -> Result<(), CacheError> {
        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM translation_cache", [])?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO translation_cache (fingerprint, language, payload, created_at) VALUES (?1, ?2, ?3, ?4)",
                )?;
                for record in records {
                    stmt.execute(params![
                        record.fingerprint,
                        record.language,
                        serde_json::to_string(&record.payload)?,
                        record.created_at.to_rfc3339(),
                    ])?;
                }
            }
            tx.commit()?;
            debug!("Saved {} cache records to {:?}", records.len(), self.db_path);
            Ok(())
        })
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.db_path.display())
    }
}

/// Initialize the database schema
fn initialize_schema(conn: &Connection) -> Result<(), CacheError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing cache schema v{}", SCHEMA_VERSION);
        create_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version > SCHEMA_VERSION {
        return Err(CacheError::Database(format!(
            "Cache schema v{} is newer than supported v{}",
            current_version, SCHEMA_VERSION
        )));
    } else {
        debug!("Cache schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32, CacheError> {
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .unwrap_or(0);

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), CacheError> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

fn create_tables(conn: &Connection) -> Result<(), CacheError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS translation_cache (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            fingerprint TEXT NOT NULL,
            language TEXT NOT NULL,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(fingerprint, language)
        );

        CREATE INDEX IF NOT EXISTS idx_cache_fingerprint ON translation_cache(fingerprint);
        "#,
    )?;
    Ok(())
}
