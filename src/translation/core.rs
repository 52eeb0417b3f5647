/*!
 * Core translation client implementation.
 *
 * This module contains the `TranslationClient`, the only component that
 * calls the translation provider. It consults the segment cache, splits text
 * into provider-sized chunks, spaces requests through a shared rate limiter
 * and retries transient failures with backoff.
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::cache::TranslationCache;
use super::chunking::split_into_chunks;
use super::fingerprint::Fingerprint;
use super::rate_limit::RateLimiter;
use super::retry::{RetryEvent, RetryPolicy};
use crate::app_config::Config;
use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::TranslationProvider;

/// Result of translating one text
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    /// Translated text
    pub translation: String,
    /// Whether the segment cache answered
    pub used_cache: bool,
    /// Characters sent to the provider
    pub character_count: u64,
}

/// Result of translating several texts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchTranslation {
    /// Translations in input order
    pub translations: Vec<String>,
    /// Cache use per input text
    pub used_cache: Vec<bool>,
    /// Characters sent to the provider for the whole batch
    pub total_character_count: u64,
}

impl BatchTranslation {
    /// Whether every text came from the cache
    pub fn fully_cached(&self) -> bool {
        self.total_character_count == 0
    }
}

/// Provider-reported character usage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuotaState {
    /// Characters used in the current period
    pub character_count: u64,
    /// Characters allowed in the current period
    pub character_limit: u64,
    /// Characters left
    pub remaining: u64,
    /// Share of the limit used, 0 to 100
    pub percent_used: f64,
}

impl QuotaState {
    /// Build a quota view from raw counts
    pub fn new(character_count: u64, character_limit: u64) -> Self {
        let percent_used = if character_limit == 0 {
            100.0
        } else {
            character_count as f64 / character_limit as f64 * 100.0
        };

        Self {
            character_count,
            character_limit,
            remaining: character_limit.saturating_sub(character_count),
            percent_used,
        }
    }

    /// Characters a run may still use while staying within `max_percent`
    /// of the remaining headroom
    pub fn allowance(&self, max_percent: f64) -> u64 {
        (self.remaining as f64 * max_percent.clamp(0.0, 100.0) / 100.0).floor() as u64
    }

    /// Whether `estimated` more characters fit in the allowance
    pub fn permits(&self, estimated: u64, max_percent: f64) -> bool {
        estimated <= self.allowance(max_percent)
    }
}

fn log_retry(event: &RetryEvent<'_>) {
    warn!(
        "Translation attempt {}/{} failed: {}. Retrying in {:?}",
        event.attempt, event.max_attempts, event.error, event.delay
    );
}

/// Rate-limited, retrying client for the translation provider
pub struct TranslationClient {
    /// Downstream provider
    provider: Arc<dyn TranslationProvider>,

    /// Request pacing shared with every client of the same account
    rate_limiter: Arc<RateLimiter>,

    /// Backoff policy for failed requests
    retry_policy: RetryPolicy,

    /// Cache of translated segments keyed by text fingerprint
    cache: TranslationCache<String>,

    /// Logical language to provider code
    language_codes: BTreeMap<String, String>,

    /// Provider code of the source language
    source_code: String,

    /// Provider per-request character limit
    max_chars_per_request: usize,

    /// Characters sent to the provider by this client
    session_characters: AtomicU64,
}

impl TranslationClient {
    /// Create a client from configuration with its own rate limiter and an
    /// in-memory segment cache
    pub fn new(provider: Arc<dyn TranslationProvider>, config: &Config) -> Self {
        Self {
            provider,
            rate_limiter: Arc::new(RateLimiter::new(config.translation.min_request_interval())),
            retry_policy: RetryPolicy::from_config(&config.translation),
            cache: TranslationCache::in_memory(config.cache.ttl()),
            language_codes: config
                .language_codes
                .iter()
                .map(|(language, code)| (language_utils::normalize_code(language), code.clone()))
                .collect(),
            source_code: config.source_provider_code.clone(),
            max_chars_per_request: config.provider.max_chars_per_request,
            session_characters: AtomicU64::new(0),
        }
    }

    /// Share a process-wide rate limiter
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Replace the segment cache
    pub fn with_cache(mut self, cache: TranslationCache<String>) -> Self {
        self.cache = cache;
        self
    }

    /// Segment cache
    pub fn cache(&self) -> &TranslationCache<String> {
        &self.cache
    }

    /// Rate limiter in use
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Characters sent to the provider since the client was created
    pub fn session_characters(&self) -> u64 {
        self.session_characters.load(Ordering::Relaxed)
    }

    /// Provider code for a logical language
    pub fn provider_code(&self, language: &str) -> Option<&str> {
        self.language_codes
            .get(&language_utils::normalize_code(language))
            .map(String::as_str)
    }

    /// Translate one text into `target_language`
    pub async fn translate_one(&self, text: &str, target_language: &str) -> Result<TranslationResult, ProviderError> {
        if text.trim().is_empty() {
            return Ok(TranslationResult {
                translation: String::new(),
                used_cache: false,
                character_count: 0,
            });
        }

        let language = language_utils::normalize_code(target_language);
        let fingerprint = Fingerprint::of_text(text);
        if let Some(translation) = self.cache.get(&fingerprint, &language) {
            return Ok(TranslationResult {
                translation,
                used_cache: true,
                character_count: 0,
            });
        }

        let target_code = self
            .provider_code(&language)
            .ok_or_else(|| ProviderError::UnsupportedLanguage(target_language.to_string()))?;

        let chunks = split_into_chunks(text, self.max_chars_per_request);
        if chunks.len() > 1 {
            debug!("Split {} characters into {} chunks", text.chars().count(), chunks.len());
        }

        let mut translated = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            translated.push(self.request(chunk, target_code).await?);
        }

        let translation = translated.join(" ");
        let character_count = text.chars().count() as u64;
        self.session_characters.fetch_add(character_count, Ordering::Relaxed);
        self.cache.set(&fingerprint, &language, translation.clone());

        Ok(TranslationResult {
            translation,
            used_cache: false,
            character_count,
        })
    }

    /// Translate texts one after another, keeping input order
    pub async fn translate_batch(&self, texts: &[String], target_language: &str) -> Result<BatchTranslation, ProviderError> {
        let mut batch = BatchTranslation {
            translations: Vec::with_capacity(texts.len()),
            used_cache: Vec::with_capacity(texts.len()),
            total_character_count: 0,
        };

        for text in texts {
            let result = self.translate_one(text, target_language).await?;
            batch.translations.push(result.translation);
            batch.used_cache.push(result.used_cache);
            batch.total_character_count += result.character_count;
        }

        Ok(batch)
    }

    /// Current provider usage
    pub async fn get_usage(&self) -> Result<QuotaState, ProviderError> {
        match self.provider.usage().await {
            Ok(usage) => Ok(QuotaState::new(usage.character_count, usage.character_limit)),
            Err(ProviderError::UsageUnavailable(message)) => Err(ProviderError::UsageUnavailable(message)),
            Err(e) => Err(ProviderError::UsageUnavailable(e.to_string())),
        }
    }

    /// Whether `estimated` more characters stay within `max_percent` of the
    /// remaining quota. Unknown usage counts as permitted.
    pub async fn check_quota(&self, estimated: u64, max_percent: f64) -> bool {
        match self.get_usage().await {
            Ok(quota) => quota.permits(estimated, max_percent),
            Err(e) => {
                warn!("Could not check quota, proceeding: {}", e);
                true
            }
        }
    }

    /// One paced, retried provider call
    async fn request(&self, chunk: &str, target_code: &str) -> Result<String, ProviderError> {
        let provider = self.provider.as_ref();
        let limiter = self.rate_limiter.as_ref();
        let source_code = self.source_code.as_str();

        self.retry_policy
            .run(
                move || async move {
                    limiter.acquire().await;
                    provider.translate(chunk, source_code, target_code).await
                },
                &log_retry,
            )
            .await
    }
}
