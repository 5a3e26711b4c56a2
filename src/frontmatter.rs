//! Frontmatter splitting for source documents.
//!
//! Every language variant of a work is a Markdown file that opens with a YAML
//! block between `---` markers:
//!
//! ```text
//! ---
//! title: Курган
//! translator: Vera Rich
//! translation_year: 1971
//! tags: [ballad, history]
//! ---
//!
//! First stanza, line one
//! First stanza, line two
//!
//! Second stanza
//! ```
//!
//! The header is parsed into [`DocumentMeta`], a typed view with explicit
//! optional fields. Identity keys a document may carry (`work_id`,
//! `author_id`, `language`, `content_type`) are deliberately not part of that
//! view: identity comes from the storage path, and the content type from the
//! work descriptor.

use crate::record::DocumentError;
use crate::types::Year;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

/// Marker that opens and closes the metadata block.
pub const DELIMITER: &str = "---";

/// A source document split into typed metadata and body text.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub meta: DocumentMeta,
    /// Body with surrounding whitespace trimmed.
    pub body: String,
}

/// The metadata fields the record builder reads from a document.
///
/// YAML types bare scalars on its own, so `title: 1984` is a number and
/// `tags: [1905]` a list of numbers. Text fields accept any scalar and keep
/// its written form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocumentMeta {
    #[serde(default, deserialize_with = "scalar_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub translator: Option<String>,
    #[serde(default)]
    pub translation_year: Option<Year>,
    /// A list of scalars, or one scalar for a single tag.
    #[serde(default, deserialize_with = "scalar_list")]
    pub tags: Vec<String>,
    /// Free-form annotations, carried into the output unchanged.
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: Vec<serde_json::Value>,
}

/// `tags:` with no value is the same as no tags at all.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_to_string(value)
            .map(Some)
            .ok_or_else(|| D::Error::custom("expected text, found a list or mapping")),
    }
}

fn scalar_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Sequence(items)) => items,
        Some(single) => vec![single],
    };
    items
        .into_iter()
        .map(|item| {
            scalar_to_string(item)
                .ok_or_else(|| D::Error::custom("tags must be plain values"))
        })
        .collect()
}

/// Split raw text into its metadata mapping and trimmed body.
///
/// Fails with [`DocumentError::MalformedDocument`] when the text does not
/// start with `---`, when the block is never closed, or when the block is
/// something other than a key-value mapping. An empty block yields an empty
/// mapping.
pub fn split_frontmatter(raw: &str) -> Result<(serde_yaml::Mapping, String), DocumentError> {
    let text = raw.trim_start_matches('\u{feff}').replace("\r\n", "\n");

    let rest = text.strip_prefix(DELIMITER).ok_or_else(|| {
        DocumentError::MalformedDocument("document must start with `---` frontmatter".into())
    })?;
    let end = rest.find(DELIMITER).ok_or_else(|| {
        DocumentError::MalformedDocument("frontmatter block is never closed".into())
    })?;

    let header = &rest[..end];
    let body = rest[end + DELIMITER.len()..].trim().to_string();

    if header.trim().is_empty() {
        return Ok((serde_yaml::Mapping::new(), body));
    }

    let value: serde_yaml::Value = serde_yaml::from_str(header)
        .map_err(|e| DocumentError::MalformedDocument(format!("invalid frontmatter: {e}")))?;

    match value {
        serde_yaml::Value::Null => Ok((serde_yaml::Mapping::new(), body)),
        serde_yaml::Value::Mapping(map) => Ok((map, body)),
        _ => Err(DocumentError::MalformedDocument(
            "frontmatter must be a key-value block".into(),
        )),
    }
}

/// Split and type a source document.
pub fn parse_document(raw: &str) -> Result<SourceDocument, DocumentError> {
    let (map, body) = split_frontmatter(raw)?;
    let meta: DocumentMeta = serde_yaml::from_value(serde_yaml::Value::Mapping(map))
        .map_err(|e| DocumentError::MalformedDocument(format!("invalid frontmatter: {e}")))?;
    Ok(SourceDocument { meta, body })
}
