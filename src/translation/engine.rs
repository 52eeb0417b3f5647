/*!
 * Article translation engine.
 *
 * Translates one source article into a set of target languages:
 *
 * 1. check the requested languages against the supported set
 * 2. load the source article and check its language and origin
 * 3. validate and sanitize the body
 * 4. estimate the character cost and check it against the quotas
 * 5. skip languages that already have a translation unless forced
 * 6. translate each remaining language, one at a time
 * 7. hand every translated article to the content store in one batch
 * 8. report outcomes, errors and the final quota
 *
 * Steps 1 to 5 abort the run. From step 6 on, a failing language is recorded
 * and the remaining languages still run.
 */

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::cache::TranslationCache;
use super::core::{QuotaState, TranslationClient};
use super::document::{
    count_characters, extract_texts, inject_texts, sanitize, validate_structure, Article, ExtractedText,
    StructuredDocument, ValidationReport,
};
use super::fingerprint::Fingerprint;
use super::prefecture;
use super::slug::{derive_translated_slug, slug_source_text, SlugSources};
use crate::app_config::Config;
use crate::cms::{BatchCreateReport, ContentStore, TranslationStatus};
use crate::errors::{EngineError, ProviderError};
use crate::language_utils;

/// What to translate
#[derive(Debug, Clone, Default)]
pub struct TranslationRequest {
    /// Id of the source article
    pub document_id: String,
    /// Target languages; empty means every supported language
    pub languages: Vec<String>,
    /// Translate even when a translation already exists
    pub force: bool,
    /// Translate without writing to the content store
    pub dry_run: bool,
    /// Give up on the whole run after this long
    pub deadline: Option<Duration>,
}

impl TranslationRequest {
    pub fn new(document_id: impl Into<String>, languages: Vec<String>) -> Self {
        Self {
            document_id: document_id.into(),
            languages,
            ..Default::default()
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Translated fields of an article, as stored in the document cache.
///
/// The body is kept as span texts in extraction order and injected into the
/// current source body on every use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedPayload {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub place_name: Option<String>,
    /// Translated body span texts
    pub body: Vec<String>,
    /// Digest of the source segments the translations were made from
    pub segments: Fingerprint,
}

/// Result of translating one language
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOutcome {
    /// Target language
    pub language: String,
    /// Translated article
    pub document: Article,
    /// Whether the translation came from a cache
    pub used_cache: bool,
    /// Characters sent to the provider for this language
    pub characters: u64,
}

/// Result of a whole run
#[derive(Debug, Clone, Default)]
pub struct TranslationReport {
    /// True iff `errors` is empty
    pub success: bool,
    /// Successful languages, in processing order
    pub results: Vec<TranslationOutcome>,
    /// One message per failed language, or one for an aborted run
    pub errors: Vec<String>,
    /// Characters sent to the provider across all languages
    pub total_characters: u64,
    /// Provider usage after the run, when it could be read
    pub quota: Option<QuotaState>,
    /// Languages skipped because a translation already exists
    pub skipped: Vec<String>,
    /// Store write counts, when anything was handed to the store
    pub persisted: Option<BatchCreateReport>,
}

impl TranslationReport {
    fn failed(error: &EngineError) -> Self {
        Self {
            success: false,
            errors: vec![error.to_string()],
            ..Default::default()
        }
    }
}

/// Read-only facts about a source article
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentStats {
    pub document_id: String,
    pub title: String,
    pub language: String,
    /// Body structure check
    pub validation: ValidationReport,
    /// Characters of one translation (title, tags and body)
    pub character_count: u64,
    /// Translation status of every supported language
    pub translations: Vec<TranslationStatus>,
    /// Characters to translate into every supported language
    pub estimated_characters: u64,
    /// Cost of `estimated_characters`
    pub estimated_cost: f64,
}

/// Progress notifications for one run
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Work on a language started (`index` is 0-based)
    Started { language: String, index: usize, total: usize },
    /// Work on a language finished
    Finished { language: String, success: bool },
}

/// Callback receiving progress events
pub type ProgressCallback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Coordinates the client, caches and content store
pub struct TranslationEngine {
    /// Provider client
    client: TranslationClient,

    /// Source and destination of articles
    store: Arc<dyn ContentStore>,

    /// Engine configuration
    config: Config,

    /// Whole-article translations keyed by content fingerprint
    document_cache: TranslationCache<TranslatedPayload>,

    /// Optional progress listener
    progress: Option<ProgressCallback>,
}

impl TranslationEngine {
    /// Create an engine with an in-memory document cache
    pub fn new(client: TranslationClient, store: Arc<dyn ContentStore>, config: Config) -> Self {
        let document_cache = TranslationCache::in_memory(config.cache.ttl());
        Self {
            client,
            store,
            config,
            document_cache,
            progress: None,
        }
    }

    /// Use a persistent document cache
    pub fn with_document_cache(mut self, cache: TranslationCache<TranslatedPayload>) -> Self {
        self.document_cache = cache;
        self
    }

    /// Report per-language progress to `callback`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn client(&self) -> &TranslationClient {
        &self.client
    }

    pub fn document_cache(&self) -> &TranslationCache<TranslatedPayload> {
        &self.document_cache
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a request and fold any abort into the report
    pub async fn run(&self, request: &TranslationRequest) -> TranslationReport {
        match self.translate(request).await {
            Ok(report) => report,
            Err(e) => {
                error!("Translation of {} aborted: {}", request.document_id, e);
                TranslationReport::failed(&e)
            }
        }
    }

    /// Run a request, honoring its deadline
    pub async fn translate(&self, request: &TranslationRequest) -> Result<TranslationReport, EngineError> {
        match request.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.translate_document(request))
                .await
                .map_err(|_| EngineError::Timeout(deadline))?,
            None => self.translate_document(request).await,
        }
    }

    async fn translate_document(&self, request: &TranslationRequest) -> Result<TranslationReport, EngineError> {
        let languages = self.resolve_languages(&request.languages)?;
        let source = self.load_source(&request.document_id).await?;

        let validation = validate_structure(&source.body, self.config.quota.large_content_threshold);
        if !validation.errors.is_empty() {
            return Err(EngineError::InvalidStructure(validation.errors));
        }
        for warning in &validation.warnings {
            warn!("{}: {}", source.id, warning);
        }
        let body = sanitize(&source.body);

        let per_language = estimate_characters(&source.title, &source.tags, &body);
        let estimated = per_language * languages.len() as u64;
        let preflight_quota = self.check_quotas(estimated).await?;

        let statuses = self
            .store
            .translation_status(&source.id, &languages)
            .await
            .map_err(|e| EngineError::Store(e.to_string()))?;

        let mut work = Vec::new();
        let mut skipped = Vec::new();
        for status in statuses {
            if status.exists && !request.force {
                debug!("{} already exists, skipping {}", status.derived_id, status.language);
                skipped.push(status.language);
            } else {
                work.push(status.language);
            }
        }

        if work.is_empty() {
            info!("Nothing to translate for {}", source.id);
            return Ok(TranslationReport {
                success: true,
                quota: preflight_quota,
                skipped,
                ..Default::default()
            });
        }

        info!(
            "Translating {} into {} language(s), about {} characters each",
            source.id,
            work.len(),
            per_language
        );

        let fingerprint = Fingerprint::of_article(&source);
        let mut results = Vec::new();
        let mut errors = Vec::new();

        for (index, language) in work.iter().enumerate() {
            self.notify(ProgressEvent::Started {
                language: language.clone(),
                index,
                total: work.len(),
            });

            let outcome = self.translate_language(&source, &body, &fingerprint, language).await;
            let success = outcome.is_ok();
            match outcome {
                Ok(outcome) => {
                    info!(
                        "Translated {} into {} ({} characters{})",
                        source.id,
                        language,
                        outcome.characters,
                        if outcome.used_cache { ", cached" } else { "" }
                    );
                    results.push(outcome);
                }
                Err(e) => {
                    error!("Translation of {} into {} failed: {}", source.id, language, e);
                    errors.push(format!("{}: {}", language, e));
                }
            }

            self.notify(ProgressEvent::Finished {
                language: language.clone(),
                success,
            });
        }

        let persisted = self.persist(&source, &results, request.dry_run).await;
        self.save_document_cache();

        let quota = match self.client.get_usage().await {
            Ok(quota) => Some(quota),
            Err(e) => {
                warn!("Quota after translation is unknown: {}", e);
                None
            }
        };

        Ok(TranslationReport {
            success: errors.is_empty(),
            total_characters: results.iter().map(|o| o.characters).sum(),
            results,
            errors,
            quota,
            skipped,
            persisted,
        })
    }

    /// Source article facts and cost estimate, without translating
    pub async fn get_stats(&self, document_id: &str) -> Result<DocumentStats, EngineError> {
        let source = self.load_source(document_id).await?;
        let validation = validate_structure(&source.body, self.config.quota.large_content_threshold);
        let body = sanitize(&source.body);

        let character_count = estimate_characters(&source.title, &source.tags, &body);
        let languages = self.resolve_languages(&[])?;
        let translations = self
            .store
            .translation_status(&source.id, &languages)
            .await
            .map_err(|e| EngineError::Store(e.to_string()))?;

        let estimated_characters = character_count * languages.len() as u64;
        let estimated_cost =
            estimated_characters as f64 * self.config.quota.cost_per_million_characters / 1_000_000.0;

        Ok(DocumentStats {
            document_id: source.id,
            title: source.title,
            language: source.language,
            validation,
            character_count,
            translations,
            estimated_characters,
            estimated_cost,
        })
    }

    /// Normalize, deduplicate and check requested languages
    fn resolve_languages(&self, requested: &[String]) -> Result<Vec<String>, EngineError> {
        let requested: Vec<&String> = if requested.is_empty() {
            self.config.target_languages.iter().collect()
        } else {
            requested.iter().collect()
        };

        let mut languages: Vec<String> = Vec::with_capacity(requested.len());
        for language in requested {
            let normalized = language_utils::normalize_code(language);
            if !self.config.is_supported_target(&normalized) {
                return Err(EngineError::InvalidTargetLanguage(language.clone()));
            }
            if !languages.contains(&normalized) {
                languages.push(normalized);
            }
        }
        Ok(languages)
    }

    async fn load_source(&self, document_id: &str) -> Result<Article, EngineError> {
        let source = self
            .store
            .get_document(document_id)
            .await
            .map_err(|e| EngineError::Store(e.to_string()))?
            .ok_or_else(|| EngineError::DocumentNotFound(document_id.to_string()))?;

        if !language_utils::language_codes_match(&source.language, &self.config.source_language) {
            return Err(EngineError::WrongSourceLanguage {
                id: source.id,
                found: source.language,
                expected: self.config.source_language.clone(),
            });
        }

        if let Some(source_id) = &source.translation_of {
            return Err(EngineError::AlreadyATranslation {
                id: source.id.clone(),
                source_id: source_id.clone(),
            });
        }

        Ok(source)
    }

    /// Check the provider quota and the local monthly ceiling.
    ///
    /// Returns the usage it read, if any. Unknown usage only checks the
    /// estimate against the ceiling.
    async fn check_quotas(&self, estimated: u64) -> Result<Option<QuotaState>, EngineError> {
        let quota_config = &self.config.quota;

        let quota = match self.client.get_usage().await {
            Ok(quota) => Some(quota),
            Err(e) => {
                warn!("Could not read provider usage, skipping quota check: {}", e);
                None
            }
        };

        if let Some(quota) = &quota {
            if !quota.permits(estimated, quota_config.quota_check_percent) {
                return Err(EngineError::QuotaWouldBeExceeded {
                    used: quota.character_count,
                    estimated,
                    allowed: quota.allowance(quota_config.quota_check_percent),
                });
            }
        }

        let projected = quota.map_or(0, |q| q.character_count) + estimated;
        if projected > quota_config.monthly_character_limit {
            return Err(EngineError::MonthlyLimitExceeded {
                projected,
                limit: quota_config.monthly_character_limit,
            });
        }

        Ok(quota)
    }

    async fn translate_language(
        &self,
        source: &Article,
        body: &StructuredDocument,
        fingerprint: &Fingerprint,
        language: &str,
    ) -> Result<TranslationOutcome, ProviderError> {
        let extracted = extract_texts(body);
        let segments = Segments::collect(source, &self.config.source_language, &extracted);
        let segments_digest = Fingerprint::of_segments(&segments.texts);

        match self.document_cache.get(fingerprint, language) {
            Some(payload) if payload.segments == segments_digest => {
                return Ok(TranslationOutcome {
                    language: language.to_string(),
                    document: self.build_article(source, body, &extracted, language, payload),
                    used_cache: true,
                    characters: 0,
                });
            }
            Some(_) => debug!("Cached {} translation of {} has other segments, retranslating", language, source.id),
            None => {}
        }

        let batch = self.client.translate_batch(&segments.texts, language).await?;
        let used_cache = batch.fully_cached();
        let characters = batch.total_character_count;
        let translated = segments.split(batch.translations);

        let sources = SlugSources {
            translated_title: &translated.title,
            translated_slug_text: &translated.slug_text,
            source_slug: &source.slug,
            source_title: &source.title,
            source_id: &source.id,
        };
        let payload = TranslatedPayload {
            slug: derive_translated_slug(&sources, &self.config.source_language, language),
            title: translated.title,
            excerpt: translated.excerpt,
            tags: translated.tags,
            place_name: translated.place_name,
            body: translated.body,
            segments: segments_digest,
        };
        self.document_cache.set(fingerprint, language, payload.clone());

        Ok(TranslationOutcome {
            language: language.to_string(),
            document: self.build_article(source, body, &extracted, language, payload),
            used_cache,
            characters,
        })
    }

    fn build_article(
        &self,
        source: &Article,
        body: &StructuredDocument,
        extracted: &[ExtractedText],
        language: &str,
        payload: TranslatedPayload,
    ) -> Article {
        Article {
            id: self.store.derive_translated_id(&source.id, language),
            language: language.to_string(),
            title: payload.title,
            slug: payload.slug,
            excerpt: payload.excerpt,
            tags: payload.tags,
            place_name: payload.place_name,
            prefecture: prefecture::apply_policy(source.prefecture.as_deref(), self.config.prefecture_policy),
            body: inject_texts(body, extracted, &payload.body),
            translation_of: Some(source.id.clone()),
            published_at: source.published_at,
        }
    }

    async fn persist(&self, source: &Article, results: &[TranslationOutcome], dry_run: bool) -> Option<BatchCreateReport> {
        if results.is_empty() {
            return None;
        }

        let documents: Vec<Article> = results.iter().map(|o| o.document.clone()).collect();
        match self.store.batch_create_or_skip(source, &documents, dry_run).await {
            Ok(report) => {
                if report.fail_count > 0 {
                    warn!("{} translated document(s) could not be stored", report.fail_count);
                }
                info!(
                    "Stored translations of {}: {} created, {} skipped, {} failed",
                    source.id, report.success_count, report.skip_count, report.fail_count
                );
                Some(report)
            }
            Err(e) => {
                error!("Failed to store translations of {}: {}", source.id, e);
                None
            }
        }
    }

    fn save_document_cache(&self) {
        self.document_cache.cleanup();
        if let Err(e) = self.document_cache.save() {
            warn!("Failed to save translation cache: {}", e);
        }
    }

    fn notify(&self, event: ProgressEvent) {
        if let Some(progress) = &self.progress {
            progress(&event);
        }
    }
}

/// Characters of one translation: title, tags and body
fn estimate_characters(title: &str, tags: &[String], body: &StructuredDocument) -> u64 {
    let tag_chars: usize = tags.iter().map(|tag| tag.chars().count()).sum();
    (title.chars().count() + tag_chars + count_characters(body)) as u64
}

/// Texts of one article in batch order: title, slug text, place name, tags,
/// body spans, excerpt
struct Segments {
    texts: Vec<String>,
    has_place_name: bool,
    tag_count: usize,
    body_count: usize,
    has_excerpt: bool,
}

/// Batch translations split back into fields
struct TranslatedSegments {
    title: String,
    slug_text: String,
    place_name: Option<String>,
    tags: Vec<String>,
    body: Vec<String>,
    excerpt: Option<String>,
}

impl Segments {
    fn collect(source: &Article, source_language: &str, extracted: &[ExtractedText]) -> Self {
        let mut texts = vec![source.title.clone(), slug_source_text(&source.slug, source_language)];

        if let Some(place_name) = &source.place_name {
            texts.push(place_name.clone());
        }
        texts.extend(source.tags.iter().cloned());
        texts.extend(extracted.iter().map(|e| e.text.clone()));
        if let Some(excerpt) = &source.excerpt {
            texts.push(excerpt.clone());
        }

        Self {
            texts,
            has_place_name: source.place_name.is_some(),
            tag_count: source.tags.len(),
            body_count: extracted.len(),
            has_excerpt: source.excerpt.is_some(),
        }
    }

    fn split(&self, translations: Vec<String>) -> TranslatedSegments {
        let mut it = translations.into_iter();
        let mut next = || it.next().unwrap_or_default();

        let title = next();
        let slug_text = next();
        let place_name = self.has_place_name.then(&mut next);
        let tags = (0..self.tag_count).map(|_| next()).collect();
        let body = (0..self.body_count).map(|_| next()).collect();
        let excerpt = self.has_excerpt.then(&mut next);

        TranslatedSegments {
            title,
            slug_text,
            place_name,
            tags,
            body,
            excerpt,
        }
    }
}
