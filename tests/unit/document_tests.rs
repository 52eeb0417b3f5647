/*!
 * Tests for the structured document model and text helpers
 */

use serde_json::json;
use tabiyaku::translation::document::{
    count_characters, extract_texts, inject_texts, sanitize, validate_structure, Article, Block, Span,
    StructuredDocument,
};
use tabiyaku::translation::{fingerprint, Fingerprint};

use crate::common::{sample_article, sample_body};

#[test]
fn test_sampleBody_shouldSerializeBackToSourceJson() {
    let body = sample_body();
    let value = serde_json::to_value(&body).unwrap();
    let reparsed: StructuredDocument = serde_json::from_value(value.clone()).unwrap();

    assert_eq!(reparsed, body);
    assert_eq!(value[3], json!({ "_type": "mapEmbed", "_key": "b4", "lat": 35.25, "lng": 135.5 }));
    assert_eq!(value[1]["alt"], json!("竹林"));
}

#[test]
fn test_extractTexts_onSampleBody_shouldSkipWhitespaceAndNonText() {
    let extracted = extract_texts(&sample_body());

    let positions: Vec<(usize, usize)> = extracted.iter().map(|e| (e.block_index, e.span_index)).collect();
    assert_eq!(positions, vec![(0, 0), (2, 0), (2, 2)]);
    assert_eq!(count_characters(&sample_body()), 25);
}

#[test]
fn test_injectTexts_shouldOnlyChangeSpanTexts() {
    let body = sample_body();
    let extracted = extract_texts(&body);
    let translations = vec!["Bamboo".to_string(), "Go early.".to_string(), "Website".to_string()];

    let translated = inject_texts(&body, &extracted, &translations);

    assert_eq!(translated.len(), body.len());
    for (before, after) in body.blocks.iter().zip(&translated.blocks) {
        assert_eq!(before.type_tag(), after.type_tag());
    }
    let Block::Text(block) = &translated.blocks[2] else {
        panic!("expected a text block");
    };
    let texts: Vec<&str> = block
        .children
        .iter()
        .map(|span| match span {
            Span::Text(span) => span.text.as_str(),
            Span::Other(_) => "",
        })
        .collect();
    assert_eq!(texts, vec!["Go early.", " ", "Website"]);
    // the source document is untouched
    assert_eq!(extract_texts(&body)[0].text, "嵐山の竹林");
}

#[test]
fn test_injectTexts_withStalePositions_shouldIgnoreThem() {
    let body = StructuredDocument::new(vec![Block::paragraph(&["一"])]);
    let mut extracted = extract_texts(&body);
    extracted.push(tabiyaku::translation::document::ExtractedText {
        block_index: 5,
        span_index: 0,
        text: "ghost".to_string(),
    });

    let result = inject_texts(&body, &extracted, &["one".to_string(), "boo".to_string()]);

    assert_eq!(result.len(), 1);
    assert_eq!(extract_texts(&result)[0].text, "one");
}

#[test]
fn test_codeBlock_shouldPassThroughUntranslated() {
    let body = StructuredDocument::new(vec![
        Block::paragraph(&["地図"]),
        Block::code("let kyoto = 1;", Some("rust")),
    ]);
    let extracted = extract_texts(&body);

    let translated = inject_texts(&body, &extracted, &["Map".to_string()]);

    assert_eq!(extracted.len(), 1);
    assert_eq!(translated.blocks[1], body.blocks[1]);
    assert_eq!(serde_json::to_value(&translated).unwrap()[1]["code"], json!("let kyoto = 1;"));
}

#[test]
fn test_validateAndSanitize_onSampleBody_shouldBeNoOps() {
    let body = sample_body();
    let report = validate_structure(&body, 50_000);

    assert!(report.valid);
    assert!(report.warnings.is_empty());
    assert_eq!(sanitize(&body), body);
}

#[test]
fn test_article_deserialize_withMinimalFields_shouldDefault() {
    let article: Article = serde_json::from_value(json!({
        "id": "fushimi",
        "language": "ja",
        "title": "伏見稲荷"
    }))
    .unwrap();

    assert!(article.body.is_empty());
    assert!(article.tags.is_empty());
    assert!(!article.is_translation());
    assert_eq!(serde_json::to_value(&article).unwrap()["slug"], json!(""));
}

#[test]
fn test_fingerprint_shouldTrackTranslatableContentOnly() {
    let article = sample_article("arashiyama");
    let base = Fingerprint::of_article(&article);

    let mut moved = article.clone();
    moved.id = "other-id".into();
    moved.slug = "other-slug".into();
    moved.prefecture = None;
    assert_eq!(Fingerprint::of_article(&moved), base);

    let mut edited = article.clone();
    edited.tags.push("秋".into());
    assert_ne!(Fingerprint::of_article(&edited), base);

    let padded = fingerprint("  本文\n", "題", None, &[]);
    assert_eq!(padded, fingerprint("本文", "題", None, &[]));
    assert_eq!(padded.as_str().len(), 64);
}
