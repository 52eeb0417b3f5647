/*!
 * Translation caching functionality.
 *
 * Entries are keyed by `(content fingerprint, target language)` and expire
 * after a fixed time to live. An expired entry is a miss on lookup and is
 * removed on the next cleanup pass. The cache is generic over its payload so
 * the same mechanism serves whole-document translations and single text
 * segments.
 *
 * Cache failures never fail a translation: a storage that cannot be read
 * starts the cache empty, and a failed save leaves memory untouched.
 */

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::fingerprint::Fingerprint;
use super::storage::{open_configured, CacheRecord, CacheStorage};
use crate::app_config::CacheConfig;
use crate::errors::CacheError;

/// Default entry lifetime in days
pub const DEFAULT_TTL_DAYS: i64 = 30;

/// Cache key combining content fingerprint and target language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    fingerprint: Fingerprint,
    language: String,
}

impl CacheKey {
    fn new(fingerprint: &Fingerprint, language: &str) -> Self {
        Self {
            fingerprint: fingerprint.clone(),
            language: language.to_string(),
        }
    }
}

/// A cached payload with its creation time
#[derive(Debug, Clone)]
struct CacheEntry<P> {
    payload: P,
    created_at: DateTime<Utc>,
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Distinct fingerprints cached
    pub total_entries: usize,
    /// Distinct `(fingerprint, language)` pairs cached
    pub total_translations: usize,
    /// Creation time of the oldest entry
    pub oldest_entry: Option<DateTime<Utc>>,
}

/// Translation cache for storing and retrieving translations
pub struct TranslationCache<P> {
    /// Internal cache storage
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry<P>>>>,

    /// Durable backend, if any
    storage: Option<Arc<dyn CacheStorage>>,

    /// Entry lifetime
    ttl: Duration,
}

impl<P> TranslationCache<P>
where
    P: Clone + Serialize + DeserializeOwned,
{
    /// Create a cache that lives only in memory
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            storage: None,
            ttl,
        }
    }

    /// Create a cache backed by `storage` and load its records.
    ///
    /// Unreadable storage is logged and the cache starts empty.
    pub fn load(storage: Arc<dyn CacheStorage>, ttl: Duration) -> Self {
        let cache = Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            storage: Some(storage),
            ttl,
        };
        cache.init();
        cache
    }

    /// Open the configured durable cache.
    ///
    /// A backend that cannot be opened is logged and the cache lives in
    /// memory for this process.
    pub fn open_or_in_memory(config: &CacheConfig) -> Self {
        match open_configured(config) {
            Ok(storage) => Self::load(Arc::from(storage), config.ttl()),
            Err(e) => {
                warn!("Translation cache unavailable, keeping it in memory: {}", e);
                Self::in_memory(config.ttl())
            }
        }
    }

    /// Replace the in-memory entries with the stored ones
    pub fn init(&self) {
        let Some(storage) = &self.storage else {
            return;
        };

        let records = match storage.load() {
            Ok(records) => records,
            Err(e) => {
                warn!("Could not load translation cache from {}: {}", storage.describe(), e);
                Vec::new()
            }
        };

        let mut entries = HashMap::with_capacity(records.len());
        let mut skipped = 0;
        for record in records {
            match serde_json::from_value::<P>(record.payload) {
                Ok(payload) => {
                    entries.insert(
                        CacheKey::new(&Fingerprint::from_hex(record.fingerprint), &record.language),
                        CacheEntry {
                            payload,
                            created_at: record.created_at,
                        },
                    );
                }
                Err(_) => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!("Skipped {} unreadable cache records", skipped);
        }
        debug!("Loaded {} cache entries from {}", entries.len(), storage.describe());
        *self.entries.write() = entries;
    }

    /// Get a payload if present and not older than the time to live
    pub fn get(&self, fingerprint: &Fingerprint, language: &str) -> Option<P> {
        let entries = self.entries.read();
        match entries.get(&CacheKey::new(fingerprint, language)) {
            Some(entry) if !self.is_expired(entry.created_at) => {
                debug!("Cache hit for {} ({})", short(fingerprint), language);
                Some(entry.payload.clone())
            }
            Some(_) => {
                debug!("Cache entry expired for {} ({})", short(fingerprint), language);
                None
            }
            None => {
                debug!("Cache miss for {} ({})", short(fingerprint), language);
                None
            }
        }
    }

    /// Whether a live entry exists
    pub fn has(&self, fingerprint: &Fingerprint, language: &str) -> bool {
        self.get(fingerprint, language).is_some()
    }

    /// Insert or overwrite an entry stamped with the current time
    pub fn set(&self, fingerprint: &Fingerprint, language: &str, payload: P) {
        self.set_at(fingerprint, language, payload, Utc::now());
    }

    /// Insert or overwrite an entry with an explicit creation time
    pub fn set_at(&self, fingerprint: &Fingerprint, language: &str, payload: P, created_at: DateTime<Utc>) {
        self.entries
            .write()
            .insert(CacheKey::new(fingerprint, language), CacheEntry { payload, created_at });
    }

    /// Persist all in-memory entries, replacing the stored ones
    pub fn save(&self) -> Result<(), CacheError> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };

        let records = {
            let entries = self.entries.read();
            let mut records = Vec::with_capacity(entries.len());
            for (key, entry) in entries.iter() {
                records.push(CacheRecord {
                    fingerprint: key.fingerprint.as_str().to_string(),
                    language: key.language.clone(),
                    payload: serde_json::to_value(&entry.payload)?,
                    created_at: entry.created_at,
                });
            }
            records
        };

        storage.save(&records)
    }

    /// Remove expired entries, returning how many were removed
    pub fn cleanup(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        let now = Utc::now();
        let ttl = self.ttl;
        entries.retain(|_, entry| now - entry.created_at <= ttl);
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Removed {} expired cache entries", removed);
        }
        removed
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.write().clear();
        debug!("Translation cache cleared");
    }

    /// Entry counts and age
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let fingerprints: HashSet<&Fingerprint> = entries.keys().map(|key| &key.fingerprint).collect();

        CacheStats {
            total_entries: fingerprints.len(),
            total_translations: entries.len(),
            oldest_entry: entries.values().map(|entry| entry.created_at).min(),
        }
    }

    /// Get the number of `(fingerprint, language)` entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Entry lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, created_at: DateTime<Utc>) -> bool {
        Utc::now() - created_at > self.ttl
    }
}

impl<P> Clone for TranslationCache<P> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            storage: self.storage.clone(),
            ttl: self.ttl,
        }
    }
}

/// First characters of a fingerprint, for logs
fn short(fingerprint: &Fingerprint) -> &str {
    let hex = fingerprint.as_str();
    &hex[..hex.len().min(12)]
}
