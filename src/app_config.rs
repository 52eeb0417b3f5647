use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::language_utils;

/// Application configuration module
/// This module handles loading and validating the settings consumed by the
/// translation engine. Nothing here reads the process environment.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language every source article is written in
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Languages articles are translated into
    #[serde(default = "language_utils::default_target_languages")]
    pub target_languages: Vec<String>,

    /// Logical language code -> provider language code
    #[serde(default = "language_utils::default_language_codes")]
    pub language_codes: BTreeMap<String, String>,

    /// Provider code of the source language
    #[serde(default = "default_source_provider_code")]
    pub source_provider_code: String,

    /// Translation provider settings
    #[serde(default)]
    pub provider: DeepLConfig,

    /// Request pacing and retry settings
    #[serde(default)]
    pub translation: TranslationCommonConfig,

    /// Translation cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Quota and cost settings
    #[serde(default)]
    pub quota: QuotaConfig,

    /// How prefectures are represented on translated documents
    #[serde(default)]
    pub prefecture_policy: PrefecturePolicy,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// DeepL service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeepLConfig {
    /// API key for the service
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL
    #[serde(default = "default_deepl_endpoint")]
    pub endpoint: String,

    /// Maximum characters per translate request
    #[serde(default = "default_max_chars_per_request")]
    pub max_chars_per_request: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DeepLConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_deepl_endpoint(),
            max_chars_per_request: default_max_chars_per_request(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Pacing and retry settings applied to every provider call
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Minimum delay in milliseconds between consecutive requests
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,

    /// Maximum number of attempts per chunk
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// First backoff delay in milliseconds, doubled on each retry
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,

    /// Upper bound for a single backoff delay in milliseconds
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Extra multiplier applied when the provider answered "too many requests"
    #[serde(default = "default_rate_limit_backoff_multiplier")]
    pub rate_limit_backoff_multiplier: u32,

    /// Maximum random jitter added to each backoff delay in milliseconds
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            min_request_interval_ms: default_min_request_interval_ms(),
            retry_count: default_retry_count(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            rate_limit_backoff_multiplier: default_rate_limit_backoff_multiplier(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

impl TranslationCommonConfig {
    /// Minimum request interval as a duration
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

/// Storage backend for the persistent cache
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Single JSON document
    #[default]
    Json,
    /// SQLite database
    Sqlite,
}

/// Translation cache configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Whether the document cache is used at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Storage backend
    #[serde(default)]
    pub backend: CacheBackend,

    /// Storage location; defaults to the user's data directory
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Entries older than this are treated as absent
    #[serde(default = "default_cache_ttl_days")]
    pub ttl_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::default(),
            path: None,
            ttl_days: default_cache_ttl_days(),
        }
    }
}

impl CacheConfig {
    /// Entry lifetime
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.ttl_days))
    }

    /// Resolve the storage path, falling back to the user's data directory
    pub fn resolved_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }

        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;

        let filename = match self.backend {
            CacheBackend::Json => DEFAULT_CACHE_JSON_FILENAME,
            CacheBackend::Sqlite => DEFAULT_CACHE_DB_FILENAME,
        };
        Ok(base_dir.join(DEFAULT_DATA_DIRNAME).join(filename))
    }
}

/// Quota and cost settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuotaConfig {
    /// Absolute monthly character ceiling enforced locally
    #[serde(default = "default_monthly_character_limit")]
    pub monthly_character_limit: u64,

    /// Highest share of the provider limit a run may push usage to
    #[serde(default = "default_quota_check_percent")]
    pub quota_check_percent: f64,

    /// Body size in characters above which validation warns
    #[serde(default = "default_large_content_threshold")]
    pub large_content_threshold: usize,

    /// Price per million characters used for cost estimates
    #[serde(default = "default_cost_per_million_characters")]
    pub cost_per_million_characters: f64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            monthly_character_limit: default_monthly_character_limit(),
            quota_check_percent: default_quota_check_percent(),
            large_content_threshold: default_large_content_threshold(),
            cost_per_million_characters: default_cost_per_million_characters(),
        }
    }
}

/// Prefecture representation on translated documents
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrefecturePolicy {
    /// Keep the canonical prefecture code
    #[default]
    Canonical,
    /// Replace the code with its Japanese display name
    Localized,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching filter for the `log` facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

const DEFAULT_DATA_DIRNAME: &str = "tabiyaku";
const DEFAULT_CACHE_JSON_FILENAME: &str = "translation-cache.json";
const DEFAULT_CACHE_DB_FILENAME: &str = "translation-cache.db";

fn default_source_language() -> String {
    language_utils::DEFAULT_SOURCE_LANGUAGE.to_string()
}

fn default_source_provider_code() -> String {
    language_utils::DEFAULT_SOURCE_PROVIDER_CODE.to_string()
}

fn default_deepl_endpoint() -> String {
    "https://api-free.deepl.com".to_string()
}

fn default_max_chars_per_request() -> usize {
    2000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_min_request_interval_ms() -> u64 {
    1000
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_initial_delay_ms() -> u64 {
    1000 // doubled on each retry
}

fn default_retry_max_delay_ms() -> u64 {
    30_000
}

fn default_rate_limit_backoff_multiplier() -> u32 {
    3
}

fn default_jitter_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl_days() -> u32 {
    30
}

fn default_monthly_character_limit() -> u64 {
    500_000
}

fn default_quota_check_percent() -> f64 {
    90.0
}

fn default_large_content_threshold() -> usize {
    50_000
}

fn default_cost_per_million_characters() -> f64 {
    25.0
}

impl Config {
    /// Load a configuration file, falling back to defaults for missing fields
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        language_utils::validate_language_code(&self.source_language)?;

        if self.target_languages.is_empty() {
            return Err(anyhow!("At least one target language is required"));
        }

        for language in &self.target_languages {
            language_utils::validate_language_code(language)?;
            if language_utils::language_codes_match(language, &self.source_language) {
                return Err(anyhow!("Target language {} equals the source language", language));
            }
            if self.provider_code(language).is_none() {
                return Err(anyhow!("No provider language code configured for {}", language));
            }
        }

        if self.provider.max_chars_per_request == 0 {
            return Err(anyhow!("max_chars_per_request must be greater than zero"));
        }

        if self.translation.retry_count == 0 {
            return Err(anyhow!("retry_count must be at least 1"));
        }

        if !(0.0..=100.0).contains(&self.quota.quota_check_percent) {
            return Err(anyhow!(
                "quota_check_percent must be between 0 and 100, got {}",
                self.quota.quota_check_percent
            ));
        }

        Ok(())
    }

    /// Whether a language is in the supported target set
    pub fn is_supported_target(&self, language: &str) -> bool {
        self.target_languages
            .iter()
            .any(|target| language_utils::language_codes_match(target, language))
    }

    /// Provider code for a logical target language
    pub fn provider_code(&self, language: &str) -> Option<&str> {
        self.language_codes
            .get(&language_utils::normalize_code(language))
            .map(String::as_str)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_languages: language_utils::default_target_languages(),
            language_codes: language_utils::default_language_codes(),
            source_provider_code: default_source_provider_code(),
            provider: DeepLConfig::default(),
            translation: TranslationCommonConfig::default(),
            cache: CacheConfig::default(),
            quota: QuotaConfig::default(),
            prefecture_policy: PrefecturePolicy::default(),
            log_level: LogLevel::default(),
        }
    }
}
