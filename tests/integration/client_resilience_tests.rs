/*!
 * Tests for request pacing, retries and chunking in the translation client
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use tabiyaku::errors::ProviderError;
use tabiyaku::translation::RateLimiter;

use crate::common::{MockProvider, test_client, test_config};

#[tokio::test]
async fn test_sharedRateLimiter_shouldSpaceRequestsAcrossClients() {
    let provider = MockProvider::working();
    let config = test_config();
    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(50)));
    let first = test_client(&provider, &config).with_rate_limiter(limiter.clone());
    let second = test_client(&provider, &config).with_rate_limiter(limiter);

    let start = Instant::now();
    let (a, b, c) = tokio::join!(
        first.translate_one("一", "en"),
        second.translate_one("二", "en"),
        first.translate_one("三", "fr"),
    );

    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(provider.request_count(), 3);
    assert!(start.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn test_translateBatch_withIntermittentFailures_shouldRetryAndSucceed() {
    let provider = MockProvider::intermittent(3);
    let client = test_client(&provider, &test_config());
    let texts: Vec<String> = ["一", "二", "三", "四", "五"].iter().map(|t| t.to_string()).collect();

    let batch = client.translate_batch(&texts, "de").await.unwrap();

    assert_eq!(batch.translations, vec!["[DE] 一", "[DE] 二", "[DE] 三", "[DE] 四", "[DE] 五"]);
    // requests #3 and #6 fail once each
    assert_eq!(provider.request_count(), 7);
    assert_eq!(batch.total_character_count, 5);
}

#[tokio::test]
async fn test_translateOne_whenProviderKeepsFailing_shouldReturnLastError() {
    let provider = MockProvider::failing();
    let client = test_client(&provider, &test_config());

    let error = client.translate_one("京都", "en").await.unwrap_err();

    assert!(matches!(error, ProviderError::ApiError { status_code: 500, .. }));
    assert_eq!(provider.request_count(), 2);
    assert_eq!(client.session_characters(), 0);
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn test_translateOne_withClientError_shouldNotRetry() {
    let provider = MockProvider::working().failing_for("FR");
    let client = test_client(&provider, &test_config());

    let error = client.translate_one("京都", "fr").await.unwrap_err();

    assert!(!error.is_retryable());
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn test_translateOne_withLongText_shouldRespectRequestLimit() {
    let provider = MockProvider::working().with_custom_response(|req| req.text.clone());
    let mut config = test_config();
    config.provider.max_chars_per_request = 20;
    let client = test_client(&provider, &config);
    let text = "東京は大きい。 ".repeat(4);

    let result = client.translate_one(&text, "en").await.unwrap();

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.text.chars().count() <= 20));
    assert!(requests.iter().all(|r| r.source_code == "JA" && r.target_code == "EN-US"));
    assert_eq!(requests.iter().map(|r| r.text.as_str()).collect::<String>(), text);
    assert_eq!(result.character_count, 32);
}

#[tokio::test]
async fn test_translateOne_acrossLanguages_shouldCacheSeparately() {
    let provider = MockProvider::working();
    let client = test_client(&provider, &test_config());

    let english = client.translate_one("温泉", "en").await.unwrap();
    let korean = client.translate_one("温泉", "ko").await.unwrap();
    let again = client.translate_one("温泉", "EN").await.unwrap();

    assert_eq!(english.translation, "[EN-US] 温泉");
    assert_eq!(korean.translation, "[KO] 温泉");
    assert!(again.used_cache);
    assert_eq!(again.translation, english.translation);
    assert_eq!(provider.request_count(), 2);
}
