/*!
 * Core document model types for article translation.
 *
 * Article bodies are rich-text documents: an ordered list of blocks, where
 * text blocks hold an ordered list of spans. Known node types are decoded
 * into typed structs; anything else is kept verbatim as an opaque JSON
 * value so unknown node types survive a translation round trip.
 */

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Type tag of text blocks
pub const TEXT_BLOCK_TYPE: &str = "block";

/// Type tag of image blocks
pub const IMAGE_BLOCK_TYPE: &str = "image";

/// Type tag of code blocks
pub const CODE_BLOCK_TYPE: &str = "code";

/// Type tag of translatable spans
pub const TEXT_SPAN_TYPE: &str = "span";

/// Field carrying the type tag of every node
pub const TYPE_FIELD: &str = "_type";

/// A travel-blog article as stored in the content store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Document id
    pub id: String,

    /// Language the article is written in
    pub language: String,

    /// Article title
    pub title: String,

    /// URL slug
    #[serde(default)]
    pub slug: String,

    /// Short summary shown in listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,

    /// Tag list
    #[serde(default)]
    pub tags: Vec<String>,

    /// Name of the place the article is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,

    /// Prefecture code or display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefecture: Option<String>,

    /// Rich-text body
    #[serde(default)]
    pub body: StructuredDocument,

    /// Id of the source article when this article is a translation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_of: Option<String>,

    /// Publication time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl Article {
    /// Whether this article is a translation of another one
    pub fn is_translation(&self) -> bool {
        self.translation_of.is_some()
    }
}

/// Ordered sequence of blocks forming a rich-text body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredDocument {
    /// Blocks in document order
    pub blocks: Vec<Block>,
}

impl StructuredDocument {
    /// Create a document from blocks
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the document has no blocks
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// A top-level node of a structured document.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Paragraph, heading or list item holding spans
    Text(TextBlock),
    /// Embedded image
    Image(ImageBlock),
    /// Code listing
    Code(CodeBlock),
    /// Any other node, kept verbatim
    Other(Value),
}

/// Text block with inline spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Stable node key
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Block style ("normal", "h2", "blockquote", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    /// List type when the block is a list item
    #[serde(rename = "listItem", default, skip_serializing_if = "Option::is_none")]
    pub list_item: Option<String>,

    /// List nesting level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,

    /// Mark definitions referenced by span marks
    #[serde(rename = "markDefs", default, skip_serializing_if = "Option::is_none")]
    pub mark_defs: Option<Vec<Value>>,

    /// Inline children in order
    pub children: Vec<Span>,

    /// Fields this model does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Image block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    /// Stable node key
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Asset reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<Value>,

    /// Fields this model does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Code block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Stable node key
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Source code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Programming language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Fields this model does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An inline child of a text block.
#[derive(Debug, Clone, PartialEq)]
pub enum Span {
    /// Translatable text run
    Text(TextSpan),
    /// Any other inline object, kept verbatim
    Other(Value),
}

/// Translatable text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// Stable node key
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Text content
    pub text: String,

    /// Formatting marks, not interpreted here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<String>>,

    /// Fields this model does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Block {
    /// Create a text block from plain span texts
    pub fn paragraph<S: AsRef<str>>(texts: &[S]) -> Self {
        Block::Text(TextBlock {
            key: None,
            style: Some("normal".to_string()),
            list_item: None,
            level: None,
            mark_defs: Some(Vec::new()),
            children: texts.iter().map(|t| Span::text(t.as_ref())).collect(),
            extra: Map::new(),
        })
    }

    /// Create an image block referencing an asset id
    pub fn image(asset_ref: &str) -> Self {
        Block::Image(ImageBlock {
            key: None,
            asset: Some(serde_json::json!({ "_ref": asset_ref, "_type": "reference" })),
            extra: Map::new(),
        })
    }

    /// Create a code block
    pub fn code(code: &str, language: Option<&str>) -> Self {
        Block::Code(CodeBlock {
            key: None,
            code: Some(code.to_string()),
            language: language.map(str::to_string),
            extra: Map::new(),
        })
    }

    /// Decode a block from raw JSON, keeping it verbatim when it is not a known type
    pub fn from_value(value: Value) -> Self {
        let decoded = match type_tag(&value) {
            Some(TEXT_BLOCK_TYPE) => untagged::<TextBlock>(&value).map(Block::Text),
            Some(IMAGE_BLOCK_TYPE) => untagged::<ImageBlock>(&value).map(Block::Image),
            Some(CODE_BLOCK_TYPE) => untagged::<CodeBlock>(&value).map(Block::Code),
            _ => None,
        };
        decoded.unwrap_or(Block::Other(value))
    }

    /// Type tag of the block, if it has one
    pub fn type_tag(&self) -> Option<&str> {
        match self {
            Block::Text(_) => Some(TEXT_BLOCK_TYPE),
            Block::Image(_) => Some(IMAGE_BLOCK_TYPE),
            Block::Code(_) => Some(CODE_BLOCK_TYPE),
            Block::Other(value) => type_tag(value),
        }
    }
}

impl Span {
    /// Create a plain text span
    pub fn text(text: &str) -> Self {
        Span::Text(TextSpan {
            key: None,
            text: text.to_string(),
            marks: Some(Vec::new()),
            extra: Map::new(),
        })
    }

    /// Decode a span from raw JSON
    pub fn from_value(value: Value) -> Self {
        let decoded = match type_tag(&value) {
            Some(TEXT_SPAN_TYPE) => untagged::<TextSpan>(&value).map(Span::Text),
            _ => None,
        };
        decoded.unwrap_or(Span::Other(value))
    }

    /// Type tag of the span, if it has one
    pub fn type_tag(&self) -> Option<&str> {
        match self {
            Span::Text(_) => Some(TEXT_SPAN_TYPE),
            Span::Other(value) => type_tag(value),
        }
    }
}

/// Read the `_type` tag of a raw node
pub(crate) fn type_tag(value: &Value) -> Option<&str> {
    value.get(TYPE_FIELD).and_then(Value::as_str)
}

/// Decode a tagged node into a typed struct without its tag field
fn untagged<T: DeserializeOwned>(value: &Value) -> Option<T> {
    let mut fields = value.as_object()?.clone();
    fields.remove(TYPE_FIELD);
    serde_json::from_value(Value::Object(fields)).ok()
}

#[derive(Serialize)]
struct Tagged<'a, T> {
    #[serde(rename = "_type")]
    kind: &'a str,
    #[serde(flatten)]
    inner: &'a T,
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Block::Text(block) => Tagged { kind: TEXT_BLOCK_TYPE, inner: block }.serialize(serializer),
            Block::Image(block) => Tagged { kind: IMAGE_BLOCK_TYPE, inner: block }.serialize(serializer),
            Block::Code(block) => Tagged { kind: CODE_BLOCK_TYPE, inner: block }.serialize(serializer),
            Block::Other(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Block::from_value)
    }
}

impl Serialize for Span {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Span::Text(span) => Tagged { kind: TEXT_SPAN_TYPE, inner: span }.serialize(serializer),
            Span::Other(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Span {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Span::from_value)
    }
}
