/*!
 * Reading and writing translatable text in structured documents.
 *
 * Extraction walks text blocks and their spans in order and records the
 * position of every non-blank text span. Injection writes translations back
 * to exactly those positions; every other node is left untouched.
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{Block, Span, StructuredDocument, TEXT_BLOCK_TYPE, TEXT_SPAN_TYPE, TYPE_FIELD};

/// Text found at a `(block_index, span_index)` position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Index of the block in the document
    pub block_index: usize,
    /// Index of the span inside the block
    pub span_index: usize,
    /// Text at that position
    pub text: String,
}

/// Result of a structural check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when there are no errors
    pub valid: bool,
    /// Problems that make the document unsafe to translate
    pub errors: Vec<String>,
    /// Problems worth reporting that do not block translation
    pub warnings: Vec<String>,
}

/// Collect every non-blank text span in document order
pub fn extract_texts(doc: &StructuredDocument) -> Vec<ExtractedText> {
    let mut extracted = Vec::new();

    for (block_index, block) in doc.blocks.iter().enumerate() {
        let Block::Text(text_block) = block else {
            continue;
        };

        for (span_index, span) in text_block.children.iter().enumerate() {
            if let Span::Text(span) = span {
                if !span.text.trim().is_empty() {
                    extracted.push(ExtractedText {
                        block_index,
                        span_index,
                        text: span.text.clone(),
                    });
                }
            }
        }
    }

    extracted
}

/// Return a copy of `doc` with `translations[i]` written at `extracted[i]`'s position.
///
/// Positions without a matching translation keep their original text.
pub fn inject_texts(
    doc: &StructuredDocument,
    extracted: &[ExtractedText],
    translations: &[String],
) -> StructuredDocument {
    let mut result = doc.clone();

    for (entry, translation) in extracted.iter().zip(translations) {
        let Some(Block::Text(block)) = result.blocks.get_mut(entry.block_index) else {
            continue;
        };
        if let Some(Span::Text(span)) = block.children.get_mut(entry.span_index) {
            span.text = translation.clone();
        }
    }

    result
}

/// Total characters across all text spans
pub fn count_characters(doc: &StructuredDocument) -> usize {
    doc.blocks
        .iter()
        .filter_map(|block| match block {
            Block::Text(block) => Some(&block.children),
            _ => None,
        })
        .flatten()
        .map(|span| match span {
            Span::Text(span) => span.text.chars().count(),
            Span::Other(_) => 0,
        })
        .sum()
}

/// Extracted texts joined into plain text, one paragraph per span
pub fn plain_text(doc: &StructuredDocument) -> String {
    extract_texts(doc)
        .into_iter()
        .map(|entry| entry.text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check the structural invariants that extraction and injection rely on
pub fn validate_structure(doc: &StructuredDocument, large_content_threshold: usize) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut text_blocks = 0;

    for (block_index, block) in doc.blocks.iter().enumerate() {
        match block {
            Block::Text(text_block) => {
                text_blocks += 1;
                for (span_index, span) in text_block.children.iter().enumerate() {
                    if let Some(problem) = span_problem(span) {
                        errors.push(format!("Block {} span {}: {}", block_index, span_index, problem));
                    }
                }
            }
            Block::Image(image) => {
                if image.asset.is_none() {
                    errors.push(format!("Block {}: image block has no asset reference", block_index));
                }
            }
            Block::Code(_) => {}
            Block::Other(value) => {
                if let Some(problem) = opaque_block_problem(value) {
                    errors.push(format!("Block {}: {}", block_index, problem));
                }
            }
        }
    }

    if text_blocks == 0 {
        warnings.push("Document has no text blocks".to_string());
    }

    let characters = count_characters(doc);
    if characters > large_content_threshold {
        warnings.push(format!(
            "Document is unusually large ({} characters, threshold {})",
            characters, large_content_threshold
        ));
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Drop malformed blocks and spans so the well-formed remainder can be translated
pub fn sanitize(doc: &StructuredDocument) -> StructuredDocument {
    let blocks = doc
        .blocks
        .iter()
        .filter(|block| match block {
            Block::Other(value) => opaque_block_problem(value).is_none(),
            _ => true,
        })
        .cloned()
        .map(|block| match block {
            Block::Text(mut text_block) => {
                text_block.children.retain(|span| span_problem(span).is_none());
                Block::Text(text_block)
            }
            other => other,
        })
        .collect();

    StructuredDocument::new(blocks)
}

/// Describe why an undecoded block violates the block invariants
fn opaque_block_problem(value: &Value) -> Option<String> {
    match value.get(TYPE_FIELD) {
        None => Some("block has no type".to_string()),
        Some(Value::String(kind)) if kind == TEXT_BLOCK_TYPE => {
            if value.get("children").map(Value::is_array).unwrap_or(false) {
                Some("text block is malformed".to_string())
            } else {
                Some("text block has no span array".to_string())
            }
        }
        Some(Value::String(_)) => None,
        Some(_) => Some("block type is not a string".to_string()),
    }
}

/// Describe why a span violates the span invariants
fn span_problem(span: &Span) -> Option<String> {
    let Span::Other(value) = span else {
        return None;
    };

    match value.get(TYPE_FIELD) {
        None => Some("span has no type".to_string()),
        Some(Value::String(kind)) if kind == TEXT_SPAN_TYPE => {
            Some("text span has no string text".to_string())
        }
        Some(Value::String(_)) => None,
        Some(_) => Some("span type is not a string".to_string()),
    }
}
