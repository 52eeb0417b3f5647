/*!
 * Provider implementations for machine translation services.
 *
 * This module contains client implementations for translation backends:
 * - DeepL: the DeepL REST API
 * - Mock: an in-process provider for tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Character usage reported by a provider for the current billing period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUsage {
    /// Characters used so far
    pub character_count: u64,
    /// Characters allowed in the period
    pub character_limit: u64,
}

/// Common trait for all translation providers
///
/// Implementations translate one piece of text per call. Chunking, pacing
/// and retries are layered on top by the translation client.
#[async_trait]
pub trait TranslationProvider: Send + Sync + Debug {
    /// Translate `text` between two provider language codes
    ///
    /// # Arguments
    /// * `text` - Text to translate, already within the provider's size limit
    /// * `source_code` - Provider code of the source language
    /// * `target_code` - Provider code of the target language
    async fn translate(&self, text: &str, source_code: &str, target_code: &str) -> Result<String, ProviderError>;

    /// Query the character usage of the account
    async fn usage(&self) -> Result<ProviderUsage, ProviderError>;
}

pub mod deepl;
pub mod mock;
