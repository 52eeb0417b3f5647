/*!
 * Structured article documents.
 *
 * - `model`: articles and the block/span rich-text model
 * - `text`: extraction, injection, counting, validation and sanitizing of
 *   translatable text
 */

pub mod model;
pub mod text;

pub use model::{
    Article, Block, CodeBlock, ImageBlock, Span, StructuredDocument, TextBlock, TextSpan,
};
pub use text::{
    count_characters, extract_texts, inject_texts, plain_text, sanitize, validate_structure,
    ExtractedText, ValidationReport,
};
