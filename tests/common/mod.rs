/*!
 * Common test utilities for the tabiyaku test suite
 */

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tabiyaku::app_config::Config;
use tabiyaku::cms::ContentStore;
use tabiyaku::translation::document::{Article, Block, StructuredDocument};
use tabiyaku::translation::{RetryPolicy, TranslationClient, TranslationEngine};

// Re-export the mock providers module
pub mod mock_providers;

pub use mock_providers::{MockProvider, english_glossary};

/// Route library logs to the test harness once
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Default configuration without request pacing
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.translation.min_request_interval_ms = 0;
    config
}

/// Retry policy with millisecond delays
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        rate_limit_multiplier: 2,
        max_jitter: Duration::from_millis(1),
    }
}

/// Client over `provider` with fast retries
pub fn test_client(provider: &MockProvider, config: &Config) -> TranslationClient {
    TranslationClient::new(Arc::new(provider.clone()), config).with_retry_policy(fast_retry(2))
}

/// Engine over `provider` and `store` with the test configuration
pub fn test_engine<S: ContentStore + 'static>(provider: &MockProvider, store: S) -> TranslationEngine {
    test_engine_with_config(provider, store, test_config())
}

pub fn test_engine_with_config<S: ContentStore + 'static>(
    provider: &MockProvider,
    store: S,
    config: Config,
) -> TranslationEngine {
    init_logger();
    TranslationEngine::new(test_client(provider, &config), Arc::new(store), config)
}

/// Body with two paragraphs around an image, with marks and a link
pub fn sample_body() -> StructuredDocument {
    serde_json::from_value(json!([
        {
            "_type": "block",
            "_key": "b1",
            "style": "h2",
            "markDefs": [],
            "children": [
                { "_type": "span", "_key": "s1", "text": "嵐山の竹林", "marks": ["strong"] }
            ]
        },
        {
            "_type": "image",
            "_key": "b2",
            "asset": { "_type": "reference", "_ref": "image-bamboo-1200x800-jpg" },
            "alt": "竹林"
        },
        {
            "_type": "block",
            "_key": "b3",
            "style": "normal",
            "markDefs": [{ "_key": "l1", "_type": "link", "href": "https://example.com" }],
            "children": [
                { "_type": "span", "_key": "s2", "text": "朝早く行くのがおすすめです。", "marks": [] },
                { "_type": "span", "_key": "s3", "text": " ", "marks": [] },
                { "_type": "span", "_key": "s4", "text": "公式サイト", "marks": ["l1"] }
            ]
        },
        { "_type": "mapEmbed", "_key": "b4", "lat": 35.25, "lng": 135.5 }
    ]))
    .expect("valid sample body")
}

/// Japanese source article
pub fn sample_article(id: &str) -> Article {
    Article {
        id: id.to_string(),
        language: "ja".to_string(),
        title: "嵐山の竹林".to_string(),
        slug: "arashiyama-bamboo-ja".to_string(),
        excerpt: Some("京都の定番スポット".to_string()),
        tags: vec!["京都".to_string(), "自然".to_string()],
        place_name: Some("嵐山".to_string()),
        prefecture: Some("京都府".to_string()),
        body: sample_body(),
        translation_of: None,
        published_at: None,
    }
}

/// Minimal article with one paragraph
pub fn short_article(id: &str, text: &str) -> Article {
    Article {
        id: id.to_string(),
        language: "ja".to_string(),
        title: "題".to_string(),
        slug: format!("{}-ja", id),
        excerpt: None,
        tags: Vec::new(),
        place_name: None,
        prefecture: None,
        body: StructuredDocument::new(vec![Block::paragraph(&[text])]),
        translation_of: None,
        published_at: None,
    }
}

/// Languages as owned strings
pub fn langs(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}
