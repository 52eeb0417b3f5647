/*!
 * Article translation.
 *
 * This module contains the core functionality for translating articles
 * with a machine translation provider. It is split into several submodules:
 *
 * - `document`: Article and rich-text document model, text extraction
 * - `fingerprint`: Content hashes used as cache keys
 * - `cache`: Time-limited translation cache
 * - `storage`: Durable cache backends (JSON file, SQLite)
 * - `chunking`: Splitting text to the provider's request size
 * - `rate_limit`: Minimum spacing between provider requests
 * - `retry`: Exponential backoff policy
 * - `core`: The rate-limited, retrying translation client
 * - `slug`, `prefecture`: Metadata of translated articles
 * - `engine`: End-to-end translation of one article
 */

// Re-export main types for easier usage
pub use self::cache::{CacheStats, TranslationCache};
pub use self::core::{BatchTranslation, QuotaState, TranslationClient, TranslationResult};
pub use self::engine::{
    DocumentStats, ProgressCallback, ProgressEvent, TranslatedPayload, TranslationEngine, TranslationOutcome,
    TranslationReport, TranslationRequest,
};
pub use self::fingerprint::{fingerprint, Fingerprint};
pub use self::rate_limit::RateLimiter;
pub use self::retry::{RetryEvent, RetryObserver, RetryPolicy};

// Submodules
pub mod cache;
pub mod chunking;
pub mod core;
pub mod document;
pub mod engine;
pub mod fingerprint;
pub mod prefecture;
pub mod rate_limit;
pub mod retry;
pub mod slug;
pub mod storage;
