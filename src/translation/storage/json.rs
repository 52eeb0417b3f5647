/*!
 * Cache storage in a single JSON document.
 */

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::{CacheRecord, CacheStorage};
use crate::errors::CacheError;

/// Current file format version
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    entries: Vec<CacheRecord>,
}

/// Stores all cache records in one JSON file, replaced atomically on save
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Create a storage backed by the file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStorage for JsonFileStorage {
    fn load(&self) -> Result<Vec<CacheRecord>, CacheError> {
        if !self.path.exists() {
            debug!("No cache file at {:?}", self.path);
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let file: CacheFile = serde_json::from_str(&content)?;
        Ok(file.entries)
    }

    fn save(&self, records: &[CacheRecord]) -> Result<(), CacheError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let file = CacheFile {
            version: FORMAT_VERSION,
            entries: records.to_vec(),
        };

        let temp = NamedTempFile::new_in(&parent)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, &file)?;
            writer.flush()?;
        }
        temp.persist(&self.path).map_err(|e| e.error)?;

        debug!("Saved {} cache records to {:?}", records.len(), self.path);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}
