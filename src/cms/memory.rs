use anyhow::{Result, anyhow};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::ContentStore;
use crate::translation::document::Article;

/// In-memory content store. Clones share the same documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<BTreeMap<String, Article>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `articles`
    pub fn with_documents(articles: impl IntoIterator<Item = Article>) -> Self {
        let store = Self::new();
        for article in articles {
            store.insert(article);
        }
        store
    }

    /// Insert or replace a document
    pub fn insert(&self, article: Article) {
        self.documents.write().insert(article.id.clone(), article);
    }

    /// Snapshot of one document
    pub fn get(&self, id: &str) -> Option<Article> {
        self.documents.read().get(id).cloned()
    }

    /// Ids of all documents, sorted
    pub fn ids(&self) -> Vec<String> {
        self.documents.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_document(&self, id: &str) -> Result<Option<Article>> {
        Ok(self.get(id))
    }

    async fn create_document(&self, article: &Article) -> Result<()> {
        let mut documents = self.documents.write();
        if documents.contains_key(&article.id) {
            return Err(anyhow!("Document {} already exists", article.id));
        }
        documents.insert(article.id.clone(), article.clone());
        Ok(())
    }
}
