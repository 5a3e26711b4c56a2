//! Content record construction.
//!
//! A [`ContentRecord`] is the normalized JSON document published for one
//! language variant of one work. It merges three sources, each owning a
//! fixed set of fields:
//!
//! | Field | Source |
//! |-------|--------|
//! | `author_id`, `work_id`, `language` | storage path ([`Identity`]) |
//! | `content_type`, `structure` | work descriptor `type` |
//! | `title`, `translator`, `translation_year`, `tags`, `notes` | document frontmatter |
//! | `content` | document body, segmented by `content_type` |
//!
//! Nothing crosses those lines: a document claiming a different `work_id`
//! or `content_type` in its frontmatter is not consulted for either.

use crate::frontmatter::{self, SourceDocument};
use crate::segment::{self, ContentUnit};
use crate::types::{ContentType, Identity, Structure, Year};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Per-document failures. The catalog records these and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
    #[error("unreadable document: {0}")]
    Unreadable(String),
}

/// Work-level metadata from `metadata.json`.
///
/// Only `type` and `year_written` are read by the pipeline. Everything else
/// (titles, original language, ...) rides along in `extra` and is published
/// unchanged. `type` and `year_written` are double options so that an
/// explicit `null` is published as `null` rather than dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub year_written: Option<Option<Year>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A key that is present, even as `null`, deserializes to `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl WorkDescriptor {
    /// The declared `type`, treating `null` as absent.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_ref()?.as_deref()
    }

    /// The declared `year_written`, treating `null` as absent.
    pub fn year_written(&self) -> Option<&Year> {
        self.year_written.as_ref()?.as_ref()
    }

    /// Copy of this descriptor with `id` and `author_id` forced to the
    /// directory-derived identity.
    pub fn normalized(&self, author_id: &str, work_id: &str) -> WorkDescriptor {
        WorkDescriptor {
            id: Some(work_id.to_string()),
            author_id: Some(author_id.to_string()),
            ..self.clone()
        }
    }

    /// Resolve the content type, applying `fallback` only when `type` is absent.
    ///
    /// The fallback exists for descriptors written before `type` was
    /// mandatory. A present but unrecognized `type` never falls back.
    pub fn content_type(&self, fallback: Option<ContentType>) -> Result<ContentType, DocumentError> {
        match self.kind() {
            Some(kind) => kind
                .parse()
                .map_err(|_| DocumentError::UnsupportedContentType(kind.to_string())),
            None => fallback.ok_or_else(|| {
                DocumentError::UnsupportedContentType("work descriptor has no `type`".into())
            }),
        }
    }
}

/// The normalized per-language output record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub language: String,
    pub work_id: String,
    pub author_id: String,
    pub title: String,
    pub content_type: ContentType,
    pub structure: Structure,
    pub content: Vec<ContentUnit>,
    pub translator: Option<String>,
    pub translation_year: Option<Year>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: Vec<serde_json::Value>,
}

/// Build a record from an already-parsed document.
pub fn build_record(
    doc: &SourceDocument,
    descriptor: &WorkDescriptor,
    identity: &Identity,
    fallback: Option<ContentType>,
) -> Result<ContentRecord, DocumentError> {
    let content_type = descriptor.content_type(fallback)?;
    let title = doc.meta.title.clone().ok_or_else(|| {
        DocumentError::MalformedDocument("frontmatter is missing required field `title`".into())
    })?;

    Ok(ContentRecord {
        language: identity.language.clone(),
        work_id: identity.work_id.clone(),
        author_id: identity.author_id.clone(),
        title,
        content_type,
        structure: content_type.structure(),
        content: segment::segment(&doc.body, content_type),
        translator: doc.meta.translator.clone(),
        translation_year: doc.meta.translation_year.clone(),
        tags: doc.meta.tags.clone(),
        notes: doc.meta.notes.clone(),
    })
}

/// Parse raw document text and build its record in one step.
pub fn convert_document(
    raw: &str,
    descriptor: &WorkDescriptor,
    identity: &Identity,
    fallback: Option<ContentType>,
) -> Result<ContentRecord, DocumentError> {
    let doc = frontmatter::parse_document(raw)?;
    build_record(&doc, descriptor, identity, fallback)
}
