/*!
 * Tests for configuration loading
 */

use std::io::Write;

use tabiyaku::app_config::{CacheBackend, Config, PrefecturePolicy};

#[test]
fn test_fromFile_withPartialConfig_shouldMergeDefaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "target_languages": ["en", "ko"],
            "provider": {{ "max_chars_per_request": 500 }},
            "cache": {{ "backend": "sqlite", "ttl_days": 7 }},
            "quota": {{ "quota_check_percent": 80.0 }},
            "prefecture_policy": "localized"
        }}"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();

    assert!(config.validate().is_ok());
    assert_eq!(config.target_languages, vec!["en", "ko"]);
    assert_eq!(config.provider.max_chars_per_request, 500);
    assert_eq!(config.provider.endpoint, "https://api-free.deepl.com");
    assert_eq!(config.cache.backend, CacheBackend::Sqlite);
    assert_eq!(config.cache.ttl(), chrono::Duration::days(7));
    assert_eq!(config.quota.quota_check_percent, 80.0);
    assert_eq!(config.quota.monthly_character_limit, 500_000);
    assert_eq!(config.prefecture_policy, PrefecturePolicy::Localized);
}

#[test]
fn test_fromFile_withMissingOrBrokenFile_shouldFail() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::from_file(dir.path().join("absent.json")).is_err());

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    let error = Config::from_file(&broken).unwrap_err();
    assert!(error.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_validate_withOutOfRangeValues_shouldFail() {
    let mut config = Config::default();
    config.quota.quota_check_percent = 120.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.provider.max_chars_per_request = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.target_languages.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_resolvedPath_withExplicitPath_shouldUseIt() {
    let mut config = Config::default();
    config.cache.path = Some("/tmp/tabiyaku-cache.json".into());
    assert_eq!(
        config.cache.resolved_path().unwrap(),
        std::path::PathBuf::from("/tmp/tabiyaku-cache.json")
    );
}
