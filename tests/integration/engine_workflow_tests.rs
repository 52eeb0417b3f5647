/*!
 * End-to-end tests for the translation engine.
 *
 * Each test drives a full run over an in-memory or directory store with a
 * scripted provider and checks outcomes, store contents and provider traffic.
 */

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use tabiyaku::app_config::{CacheConfig, PrefecturePolicy};
use tabiyaku::cms::{ContentStore, DirectoryStore, MemoryStore};
use tabiyaku::errors::EngineError;
use tabiyaku::translation::document::{Block, Span, StructuredDocument, extract_texts};
use tabiyaku::translation::storage::JsonFileStorage;
use tabiyaku::translation::{ProgressEvent, TranslatedPayload, TranslationCache, TranslationRequest};

use crate::common::{
    english_glossary, langs, sample_article, short_article, test_config, test_engine, test_engine_with_config,
    MockProvider,
};

#[tokio::test]
async fn test_translate_whenOneLanguageFails_shouldKeepOthers() {
    let provider = MockProvider::working().failing_for("FR");
    let store = MemoryStore::with_documents([sample_article("arashiyama")]);
    let engine = test_engine(&provider, store.clone());

    let report = engine
        .translate(&TranslationRequest::new("arashiyama", langs(&["en", "fr"])))
        .await
        .unwrap();

    assert!(!report.success);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].language, "en");
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("fr"));
    assert!(store.get("arashiyama-en").is_some());
    assert!(store.get("arashiyama-fr").is_none());
}

#[tokio::test]
async fn test_translate_whenTranslationExists_shouldSkipLanguage() {
    let provider = MockProvider::working();
    let mut existing = sample_article("arashiyama-en");
    existing.language = "en".into();
    existing.translation_of = Some("arashiyama".into());
    let store = MemoryStore::with_documents([sample_article("arashiyama"), existing]);
    let engine = test_engine(&provider, store);

    let report = engine
        .translate(&TranslationRequest::new("arashiyama", langs(&["en", "de"])))
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(report.skipped, langs(&["en"]));
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].language, "de");
    assert_eq!(provider.requests_for("EN-US"), 0);
    assert!(provider.requests_for("DE") > 0);
}

#[tokio::test]
async fn test_translate_whenEverythingExists_shouldSucceedWithoutWork() {
    let provider = MockProvider::working();
    let store = MemoryStore::with_documents([
        sample_article("arashiyama"),
        short_article("arashiyama-en", "x"),
        short_article("arashiyama-ko", "x"),
    ]);
    let engine = test_engine(&provider, store);

    let report = engine
        .translate(&TranslationRequest::new("arashiyama", langs(&["en", "ko"])))
        .await
        .unwrap();

    assert!(report.success);
    assert!(report.results.is_empty());
    assert!(report.errors.is_empty());
    assert_eq!(report.total_characters, 0);
    assert_eq!(provider.request_count(), 0);
    assert!(report.persisted.is_none());
}

#[tokio::test]
async fn test_translate_withForce_shouldRetranslateExisting() {
    let provider = MockProvider::working();
    let store = MemoryStore::with_documents([sample_article("arashiyama"), short_article("arashiyama-en", "x")]);
    let engine = test_engine(&provider, store);

    let report = engine
        .translate(&TranslationRequest::new("arashiyama", langs(&["en"])).with_force(true))
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(report.results.len(), 1);
    assert!(provider.requests_for("EN-US") > 0);
    // the store keeps the existing document
    assert_eq!(report.persisted.map(|p| p.skip_count), Some(1));
}

#[tokio::test]
async fn test_translate_shouldPreserveDocumentStructure() {
    let provider = MockProvider::working().with_custom_response(english_glossary);
    let source = sample_article("arashiyama");
    let engine = test_engine(&provider, MemoryStore::with_documents([source.clone()]));

    let report = engine
        .translate(&TranslationRequest::new("arashiyama", langs(&["en"])))
        .await
        .unwrap();
    let translated = &report.results[0].document;

    assert_eq!(translated.id, "arashiyama-en");
    assert_eq!(translated.language, "en");
    assert_eq!(translated.translation_of.as_deref(), Some("arashiyama"));
    assert_eq!(translated.title, "Arashiyama Bamboo Grove");
    assert_eq!(translated.slug, "arashiyama-bamboo-grove-en");
    assert_eq!(translated.place_name.as_deref(), Some("Arashiyama"));
    assert_eq!(translated.tags, langs(&["Kyoto", "Nature"]));
    assert_eq!(translated.excerpt.as_deref(), Some("A classic Kyoto spot"));
    assert_eq!(translated.prefecture.as_deref(), Some("kyoto"));

    // Same nodes in the same order, only span texts differ
    let original = &source.body;
    let body = &translated.body;
    assert_eq!(body.len(), original.len());
    assert_eq!(body.blocks[1], original.blocks[1]);
    assert_eq!(body.blocks[3], original.blocks[3]);

    let texts: Vec<String> = extract_texts(body).into_iter().map(|e| e.text).collect();
    assert_eq!(
        texts,
        langs(&["Arashiyama Bamboo Grove", "Going early in the morning is recommended.", "Official site"])
    );

    let (Block::Text(before), Block::Text(after)) = (&original.blocks[2], &body.blocks[2]) else {
        panic!("expected text blocks");
    };
    assert_eq!(before.mark_defs, after.mark_defs);
    let (Span::Text(link_before), Span::Text(link_after)) = (&before.children[2], &after.children[2]) else {
        panic!("expected text spans");
    };
    assert_eq!(link_before.marks, link_after.marks);
    assert_eq!(link_before.key, link_after.key);
    // whitespace-only span is neither translated nor dropped
    assert_eq!(after.children[1], before.children[1]);
}

#[tokio::test]
async fn test_translate_withLocalizedPrefecture_shouldUseJapaneseName() {
    let provider = MockProvider::working();
    let mut config = test_config();
    config.prefecture_policy = PrefecturePolicy::Localized;
    let mut source = sample_article("arashiyama");
    source.prefecture = Some("kyoto".into());
    let engine = test_engine_with_config(&provider, MemoryStore::with_documents([source]), config);

    let report = engine
        .translate(&TranslationRequest::new("arashiyama", langs(&["it"])))
        .await
        .unwrap();

    assert_eq!(report.results[0].document.prefecture.as_deref(), Some("京都府"));
}

#[tokio::test]
async fn test_translate_withUnsupportedLanguage_shouldFailBeforeAnyWork() {
    let provider = MockProvider::working();
    let engine = test_engine(&provider, MemoryStore::with_documents([sample_article("arashiyama")]));

    let error = engine
        .translate(&TranslationRequest::new("arashiyama", langs(&["en", "xx"])))
        .await
        .unwrap_err();

    assert!(matches!(error, EngineError::InvalidTargetLanguage(ref l) if l == "xx"));
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_translate_withSourcePreconditionFailures_shouldAbort() {
    let provider = MockProvider::working();
    let mut english = sample_article("english-post");
    english.language = "en".into();
    let mut derived = sample_article("arashiyama-fr");
    derived.translation_of = Some("arashiyama".into());
    let engine = test_engine(&provider, MemoryStore::with_documents([english, derived]));

    let missing = engine.translate(&TranslationRequest::new("nope", langs(&["en"]))).await;
    assert!(matches!(missing, Err(EngineError::DocumentNotFound(_))));

    let wrong = engine.translate(&TranslationRequest::new("english-post", langs(&["fr"]))).await;
    assert!(matches!(wrong, Err(EngineError::WrongSourceLanguage { .. })));

    let nested = engine.translate(&TranslationRequest::new("arashiyama-fr", langs(&["de"]))).await;
    assert!(matches!(nested, Err(EngineError::AlreadyATranslation { ref source_id, .. }) if source_id == "arashiyama"));

    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_translate_withInvalidStructure_shouldAbortWithoutWrites() {
    let provider = MockProvider::working();
    let mut article = sample_article("broken");
    article.body = serde_json::from_value(json!([
        { "_type": "block", "children": [{ "_type": "span", "text": "本文" }] },
        { "_type": "image" },
        { "text": "no type" }
    ]))
    .unwrap();
    let store = MemoryStore::with_documents([article]);
    let engine = test_engine(&provider, store.clone());

    let report = engine.run(&TranslationRequest::new("broken", langs(&["en"]))).await;

    assert!(!report.success);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("image block has no asset reference"));
    assert!(report.errors[0].contains("block has no type"));
    assert_eq!(provider.request_count(), 0);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_translate_whenQuotaWouldBeExceeded_shouldAbortBeforeProviderCalls() {
    let provider = MockProvider::working().with_usage(499_990, 500_000);
    let engine = test_engine(&provider, MemoryStore::with_documents([sample_article("arashiyama")]));

    let error = engine
        .translate(&TranslationRequest::new("arashiyama", langs(&["en", "fr"])))
        .await
        .unwrap_err();

    match error {
        EngineError::QuotaWouldBeExceeded { used, estimated, allowed } => {
            assert_eq!(used, 499_990);
            assert_eq!(estimated, 68);
            assert_eq!(allowed, 9);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_translate_whenMonthlyCeilingExceeded_shouldAbort() {
    let provider = MockProvider::working().without_usage();
    let mut config = test_config();
    config.quota.monthly_character_limit = 50;
    let engine = test_engine_with_config(&provider, MemoryStore::with_documents([sample_article("arashiyama")]), config);

    let error = engine
        .translate(&TranslationRequest::new("arashiyama", langs(&["en", "fr"])))
        .await
        .unwrap_err();

    assert!(matches!(error, EngineError::MonthlyLimitExceeded { projected: 68, limit: 50 }));
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_translate_whenUsageUnavailable_shouldProceedAndReportUnknownQuota() {
    let provider = MockProvider::working().without_usage();
    let engine = test_engine(&provider, MemoryStore::with_documents([sample_article("arashiyama")]));

    let report = engine
        .translate(&TranslationRequest::new("arashiyama", langs(&["es"])))
        .await
        .unwrap();

    assert!(report.success);
    assert!(report.quota.is_none());
    assert!(report.total_characters > 0);
}

#[tokio::test]
async fn test_translate_shouldReportQuotaAndCharacters() {
    let provider = MockProvider::working().with_usage(1_000, 500_000);
    let engine = test_engine(&provider, MemoryStore::with_documents([short_article("short", "こんにちは")]));

    let report = engine
        .translate(&TranslationRequest::new("short", langs(&["en", "ko"])))
        .await
        .unwrap();

    // title, slug words and body for each language
    assert_eq!(report.total_characters, 2 * (1 + 5 + 5));
    assert_eq!(report.results.iter().map(|r| r.characters).sum::<u64>(), report.total_characters);
    let quota = report.quota.unwrap();
    assert_eq!(quota.character_count, 1_000);
    assert_eq!(quota.remaining, 499_000);
}

#[tokio::test]
async fn test_translate_withDryRun_shouldNotWriteDocuments() {
    let provider = MockProvider::working();
    let store = MemoryStore::with_documents([sample_article("arashiyama")]);
    let engine = test_engine(&provider, store.clone());

    let report = engine
        .translate(&TranslationRequest::new("arashiyama", langs(&["en", "fr"])).with_dry_run(true))
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.persisted.map(|p| p.success_count), Some(2));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_translate_shouldEmitProgressPerLanguage() {
    let provider = MockProvider::working().failing_for("DE");
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let engine = test_engine(&provider, MemoryStore::with_documents([sample_article("arashiyama")]))
        .with_progress(Arc::new(move |event: &ProgressEvent| sink.lock().push(event.clone())));

    engine
        .translate(&TranslationRequest::new("arashiyama", langs(&["en", "de"])))
        .await
        .unwrap();

    assert_eq!(
        *events.lock(),
        vec![
            ProgressEvent::Started { language: "en".into(), index: 0, total: 2 },
            ProgressEvent::Finished { language: "en".into(), success: true },
            ProgressEvent::Started { language: "de".into(), index: 1, total: 2 },
            ProgressEvent::Finished { language: "de".into(), success: false },
        ]
    );
}

#[tokio::test]
async fn test_translate_withPersistentCache_shouldServeLaterRunsFromCache() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("cache.json");
    let ttl = CacheConfig::default().ttl();
    let source = sample_article("arashiyama");

    let first_provider = MockProvider::working();
    let first = test_engine(&first_provider, MemoryStore::with_documents([source.clone()]))
        .with_document_cache(TranslationCache::load(Arc::new(JsonFileStorage::new(&cache_path)), ttl));
    let first_report = first
        .translate(&TranslationRequest::new("arashiyama", langs(&["en"])))
        .await
        .unwrap();
    assert!(!first_report.results[0].used_cache);
    assert!(cache_path.exists());

    let second_provider = MockProvider::working();
    let cache: TranslationCache<TranslatedPayload> =
        TranslationCache::load(Arc::new(JsonFileStorage::new(&cache_path)), ttl);
    assert_eq!(cache.stats().total_translations, 1);
    let second = test_engine(&second_provider, MemoryStore::with_documents([source])).with_document_cache(cache);
    let second_report = second
        .translate(&TranslationRequest::new("arashiyama", langs(&["en"])))
        .await
        .unwrap();

    assert!(second_report.results[0].used_cache);
    assert_eq!(second_report.total_characters, 0);
    assert_eq!(second_provider.request_count(), 0);
    assert_eq!(second_report.results[0].document, first_report.results[0].document);
}

#[tokio::test]
async fn test_translate_afterContentChange_shouldMissCache() {
    let provider = MockProvider::working();
    let store = MemoryStore::with_documents([short_article("post", "一つ目")]);
    let engine = test_engine(&provider, store.clone());
    let request = TranslationRequest::new("post", langs(&["fr"])).with_force(true);

    engine.translate(&request).await.unwrap();
    store.insert(short_article("post", "二つ目"));
    let report = engine.translate(&request).await.unwrap();

    assert!(!report.results[0].used_cache);
    let body = &report.results[0].document.body;
    assert_eq!(extract_texts(body)[0].text, "[FR] 二つ目");
}

#[tokio::test]
async fn test_translate_withDirectoryStore_shouldWriteTranslationFiles() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirectoryStore::open(dir.path()).unwrap();
    store.create_document(&sample_article("arashiyama")).await.unwrap();
    let provider = MockProvider::working();
    let engine = test_engine(&provider, store.clone());

    let report = engine
        .translate(&TranslationRequest::new("arashiyama", langs(&["zh-cn", "pt-br"])))
        .await
        .unwrap();

    assert!(report.success);
    assert!(provider.requests_for("ZH-HANS") > 0);
    assert_eq!(store.list_ids().unwrap(), langs(&["arashiyama", "arashiyama-pt-br", "arashiyama-zh-cn"]));

    let chinese = store.get_document("arashiyama-zh-cn").await.unwrap().unwrap();
    assert_eq!(chinese.translation_of.as_deref(), Some("arashiyama"));
    assert!(chinese.slug.ends_with("-zh-cn"));
    assert_eq!(chinese.language, "zh-cn");
}

#[tokio::test]
async fn test_getStats_shouldReportStatusAndCost() {
    let provider = MockProvider::working();
    let store = MemoryStore::with_documents([sample_article("arashiyama"), short_article("arashiyama-en", "x")]);
    let engine = test_engine(&provider, store);

    let stats = engine.get_stats("arashiyama").await.unwrap();

    assert_eq!(stats.character_count, 34);
    assert_eq!(stats.translations.len(), 19);
    assert!(stats.translations.iter().any(|s| s.language == "en" && s.exists));
    assert_eq!(stats.translations.iter().filter(|s| s.exists).count(), 1);
    assert_eq!(stats.estimated_characters, 34 * 19);
    assert!(stats.estimated_cost > 0.0);
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_translate_withEmptyBody_shouldWarnAndStillTranslateMetadata() {
    let provider = MockProvider::working();
    let mut article = short_article("empty", "x");
    article.body = StructuredDocument::new(vec![Block::image("image-only")]);
    let engine = test_engine(&provider, MemoryStore::with_documents([article]));

    let report = engine
        .translate(&TranslationRequest::new("empty", langs(&["nl"])))
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(report.results[0].document.title, "[NL] 題");
    assert_eq!(report.results[0].document.body.len(), 1);
}
