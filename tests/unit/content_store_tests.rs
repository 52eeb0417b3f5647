/*!
 * Tests for the shared content store behavior over both stores
 */

use tabiyaku::cms::{ContentStore, DirectoryStore, MemoryStore};

use crate::common::{langs, sample_article, short_article};

async fn check_status_and_batch_create(store: &dyn ContentStore) {
    let source = sample_article("kinkakuji");
    store.create_document(&source).await.unwrap();
    store.create_document(&short_article("kinkakuji-en", "x")).await.unwrap();

    let statuses = store.translation_status("kinkakuji", &langs(&["en", "fr"])).await.unwrap();
    assert_eq!(statuses.len(), 2);
    assert!(statuses[0].exists);
    assert_eq!(statuses[1].derived_id, "kinkakuji-fr");
    assert!(!statuses[1].exists);

    let translations = vec![short_article("kinkakuji-en", "y"), short_article("kinkakuji-fr", "z")];
    let dry = store.batch_create_or_skip(&source, &translations, true).await.unwrap();
    assert_eq!(dry.success_count, 2);
    assert!(store.get_document("kinkakuji-fr").await.unwrap().is_none());

    let report = store.batch_create_or_skip(&source, &translations, false).await.unwrap();
    assert_eq!((report.success_count, report.skip_count, report.fail_count), (1, 1, 0));
    let english = store.get_document("kinkakuji-en").await.unwrap().unwrap();
    assert_eq!(english.body, short_article("kinkakuji-en", "x").body);
    assert!(store.get_document("kinkakuji-fr").await.unwrap().is_some());
}

#[tokio::test]
async fn test_memoryStore_shouldSkipExistingTranslations() {
    check_status_and_batch_create(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_directoryStore_shouldSkipExistingTranslations() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirectoryStore::open(dir.path().join("content")).unwrap();
    check_status_and_batch_create(&store).await;
    assert_eq!(store.list_ids().unwrap().len(), 3);
}

#[tokio::test]
async fn test_directoryStore_withUnsafeId_shouldRefuse() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirectoryStore::open(dir.path()).unwrap();

    assert!(store.get_document("../etc/passwd").await.is_err());
    assert!(store.create_document(&short_article("..", "x")).await.is_err());
}

#[test]
fn test_memoryStore_createTwice_shouldFailSecondTime() {
    let store = MemoryStore::new();
    let article = short_article("nara", "鹿");

    let result = tokio_test::block_on(async {
        store.create_document(&article).await?;
        store.create_document(&article).await
    });

    assert!(result.is_err());
    assert_eq!(store.ids(), langs(&["nara"]));
}
