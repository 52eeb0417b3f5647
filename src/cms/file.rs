use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::debug;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::ContentStore;
use crate::translation::document::Article;

// @module: Directory-backed content store

// @struct: One `<id>.json` file per article
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    // @creates: Store rooted at `root`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create content directory: {:?}", root))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // @returns: Path of the file holding `id`
    // @errors: Ids that could escape the store directory
    pub fn document_path(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\'])
            && !id.starts_with('.');
        if !valid {
            return Err(anyhow!("Invalid document id: {:?}", id));
        }
        Ok(self.root.join(format!("{}.json", id)))
    }

    // @returns: Ids of all stored documents, sorted
    pub fn list_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem() {
                    ids.push(stem.to_string_lossy().to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl ContentStore for DirectoryStore {
    async fn get_document(&self, id: &str) -> Result<Option<Article>> {
        let path = self.document_path(id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to read document: {:?}", path)),
        };

        let article = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse document: {:?}", path))?;
        Ok(Some(article))
    }

    async fn create_document(&self, article: &Article) -> Result<()> {
        let path = self.document_path(&article.id)?;
        let json = serde_json::to_vec_pretty(article)?;

        let mut file = NamedTempFile::new_in(&self.root)?;
        file.write_all(&json)?;
        // persist_noclobber refuses to replace an existing document
        file.persist_noclobber(&path)
            .map_err(|e| anyhow!("Failed to create document {:?}: {}", path, e.error))?;

        debug!("Wrote {:?}", path);
        Ok(())
    }
}
