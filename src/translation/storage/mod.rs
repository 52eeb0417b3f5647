/*!
 * Durable storage for the translation cache.
 *
 * The cache keeps its entries in memory and hands the full record list to a
 * storage backend on save. Backends only round-trip records; expiry and
 * lookup semantics live in the cache.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use log::info;

use crate::app_config::{CacheBackend, CacheConfig};
use crate::errors::CacheError;

pub mod json;
pub mod sqlite;

pub use json::JsonFileStorage;
pub use sqlite::SqliteStorage;

/// One persisted `(fingerprint, language) -> payload` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Content fingerprint (hex)
    pub fingerprint: String,
    /// Target language
    pub language: String,
    /// Cached payload as JSON
    pub payload: Value,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
}

/// A durable medium for cache records
pub trait CacheStorage: Send + Sync {
    /// Read every stored record
    fn load(&self) -> Result<Vec<CacheRecord>, CacheError>;

    /// Replace the stored records with `records`
    fn save(&self, records: &[CacheRecord]) -> Result<(), CacheError>;

    /// Human readable location, for logs
    fn describe(&self) -> String;
}

/// Open the backend selected by the configuration
pub fn open_storage(config: &CacheConfig, path: &Path) -> Result<Box<dyn CacheStorage>, CacheError> {
    match config.backend {
        CacheBackend::Json => Ok(Box::new(JsonFileStorage::new(path))),
        CacheBackend::Sqlite => Ok(Box::new(SqliteStorage::open(path)?)),
    }
}

/// Open the configured backend at its resolved location, creating the
/// parent directory
pub fn open_configured(config: &CacheConfig) -> Result<Box<dyn CacheStorage>, CacheError> {
    let path = config
        .resolved_path()
        .map_err(|e| CacheError::Io(std::io::Error::other(format!("{:#}", e))))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let storage = open_storage(config, &path)?;
    info!("Using translation cache at {}", storage.describe());
    Ok(storage)
}
