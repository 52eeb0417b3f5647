use anyhow::{Result, anyhow};
use isolang::Language;
use std::collections::BTreeMap;

/// Language utilities for the translation engine
///
/// Logical language codes are lowercase BCP 47 style tags ("en", "zh-tw",
/// "pt-br"). Each supported target maps to a provider-specific code.
/// Source language of all articles
pub const DEFAULT_SOURCE_LANGUAGE: &str = "ja";

/// Supported target languages paired with their provider codes
pub const DEFAULT_TARGET_LANGUAGES: [(&str, &str); 19] = [
    ("en", "EN-US"),
    ("zh-cn", "ZH-HANS"),
    ("zh-tw", "ZH-HANT"),
    ("ko", "KO"),
    ("fr", "FR"),
    ("de", "DE"),
    ("es", "ES"),
    ("it", "IT"),
    ("pt-br", "PT-BR"),
    ("ru", "RU"),
    ("id", "ID"),
    ("nl", "NL"),
    ("pl", "PL"),
    ("tr", "TR"),
    ("sv", "SV"),
    ("da", "DA"),
    ("fi", "FI"),
    ("uk", "UK"),
    ("ar", "AR"),
];

/// Provider code of the source language
pub const DEFAULT_SOURCE_PROVIDER_CODE: &str = "JA";

/// Default logical targets in their canonical order
pub fn default_target_languages() -> Vec<String> {
    DEFAULT_TARGET_LANGUAGES
        .iter()
        .map(|(code, _)| code.to_string())
        .collect()
}

/// Default logical code -> provider code table
pub fn default_language_codes() -> BTreeMap<String, String> {
    DEFAULT_TARGET_LANGUAGES
        .iter()
        .map(|(code, provider)| (code.to_string(), provider.to_string()))
        .collect()
}

/// Lowercase and trim a language tag, using '-' as the subtag separator
pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase().replace('_', "-")
}

/// Primary subtag of a language tag ("zh" for "zh-tw")
pub fn primary_subtag(code: &str) -> String {
    normalize_code(code)
        .split('-')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Validate that the primary subtag is a known ISO 639-1 code
pub fn validate_language_code(code: &str) -> Result<()> {
    let primary = primary_subtag(code);
    if primary.len() == 2 && Language::from_639_1(&primary).is_some() {
        return Ok(());
    }
    Err(anyhow!("Invalid language code: {}", code))
}

/// Get the English name of a language tag
pub fn get_language_name(code: &str) -> Result<String> {
    let primary = primary_subtag(code);
    let language = Language::from_639_1(&primary)
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))?;

    let name = language.to_name().to_string();
    match normalize_code(code).as_str() {
        "zh-cn" => Ok(format!("{} (Simplified)", name)),
        "zh-tw" => Ok(format!("{} (Traditional)", name)),
        "pt-br" => Ok(format!("{} (Brazil)", name)),
        _ => Ok(name),
    }
}

/// Check if two language tags refer to the same language variant
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    normalize_code(code1) == normalize_code(code2)
}
