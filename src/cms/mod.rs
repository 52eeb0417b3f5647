/*!
 * Content store interface.
 *
 * The engine reads source articles and writes translated ones through the
 * `ContentStore` trait. Stores only need to read and create documents; the
 * status lookup and the batch create-or-skip logic are shared defaults.
 *
 * - `memory`: in-process store, used by tests and dry runs
 * - `file`: one JSON file per article in a directory
 */

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::translation::document::Article;

pub mod file;
pub mod memory;

pub use self::file::DirectoryStore;
pub use self::memory::MemoryStore;

/// Whether a translation exists for one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationStatus {
    /// Target language
    pub language: String,
    /// Whether the derived document exists
    pub exists: bool,
    /// Id the translated document has or would have
    pub derived_id: String,
}

/// Outcome counts of a batch create
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCreateReport {
    pub success_count: usize,
    pub fail_count: usize,
    pub skip_count: usize,
}

/// Source and translation store
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch a document by id
    async fn get_document(&self, id: &str) -> Result<Option<Article>>;

    /// Create a document; fails if the id is taken
    async fn create_document(&self, article: &Article) -> Result<()>;

    /// Id of the translation of `source_id` into `language`
    fn derive_translated_id(&self, source_id: &str, language: &str) -> String {
        format!("{}-{}", source_id, language)
    }

    /// Existence of the derived translation for each language
    async fn translation_status(&self, source_id: &str, languages: &[String]) -> Result<Vec<TranslationStatus>> {
        let mut statuses = Vec::with_capacity(languages.len());
        for language in languages {
            let derived_id = self.derive_translated_id(source_id, language);
            let exists = self.get_document(&derived_id).await?.is_some();
            statuses.push(TranslationStatus {
                language: language.clone(),
                exists,
                derived_id,
            });
        }
        Ok(statuses)
    }

    /// Create every translation whose id is free, skipping the rest.
    ///
    /// A failed create is counted and logged; the remaining documents are
    /// still attempted. With `dry_run` nothing is written.
    async fn batch_create_or_skip(
        &self,
        source: &Article,
        translations: &[Article],
        dry_run: bool,
    ) -> Result<BatchCreateReport> {
        let mut report = BatchCreateReport::default();

        for translation in translations {
            if dry_run {
                info!("[dry run] Would create {} ({})", translation.id, translation.language);
                report.success_count += 1;
                continue;
            }

            match self.get_document(&translation.id).await {
                Ok(Some(_)) => {
                    debug!("Skipping {}: already exists", translation.id);
                    report.skip_count += 1;
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    error!("Could not look up {}: {}", translation.id, e);
                    report.fail_count += 1;
                    continue;
                }
            }

            match self.create_document(translation).await {
                Ok(()) => {
                    info!("Created {} from {}", translation.id, source.id);
                    report.success_count += 1;
                }
                Err(e) => {
                    error!("Failed to create {}: {}", translation.id, e);
                    report.fail_count += 1;
                }
            }
        }

        Ok(report)
    }
}
