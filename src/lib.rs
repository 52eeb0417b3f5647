/*!
 * # tabiyaku - travel article translation engine
 *
 * A Rust library for translating Japanese travel-blog articles into many
 * languages with a machine translation provider.
 *
 * ## Features
 *
 * - Rich-text article bodies: translatable spans are extracted and written
 *   back in place, every other node is preserved
 * - Content-hash keyed translation cache with expiry, stored as JSON or SQLite
 * - Provider client with chunking, request pacing, retries with backoff and
 *   quota checks
 * - Per-language isolation: one failing language never blocks the others
 * - DeepL provider and directory-backed content store
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `translation`: Document model, caches and the translation engine:
 *   - `translation::document`: Rich-text model and text extraction
 *   - `translation::core`: Rate-limited, retrying provider client
 *   - `translation::cache`: Caching of translations
 *   - `translation::engine`: End-to-end article translation
 * - `cms`: Content store interface and implementations
 * - `language_utils`: Language code utilities
 * - `providers`: Translation provider clients:
 *   - `providers::deepl`: DeepL API client
 *   - `providers::mock`: Scriptable provider for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod cms;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use cms::{ContentStore, DirectoryStore, MemoryStore};
pub use errors::{AppError, CacheError, EngineError, ProviderError};
pub use language_utils::{get_language_name, language_codes_match, normalize_code};
pub use translation::{TranslationClient, TranslationEngine, TranslationReport, TranslationRequest};
