//! Shared value types used across the pipeline stages.
//!
//! These types appear both in the in-memory model and in the generated JSON,
//! so their serialized spelling is part of the output contract.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of literary work, which selects how a body is segmented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Poem,
    Prose,
}

impl ContentType {
    /// The structure a record of this type always carries.
    pub fn structure(self) -> Structure {
        match self {
            ContentType::Poem => Structure::Stanzas,
            ContentType::Prose => Structure::Paragraphs,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Poem => "poem",
            ContentType::Prose => "prose",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names neither `poem` nor `prose`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownContentType(pub String);

impl FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "poem" => Ok(ContentType::Poem),
            "prose" => Ok(ContentType::Prose),
            other => Err(UnknownContentType(other.to_string())),
        }
    }
}

/// How a record's `content` array is organized. Never chosen independently:
/// always obtained through [`ContentType::structure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    Stanzas,
    Paragraphs,
}

/// A year as authors actually write it: usually a number, sometimes a
/// free-form string such as `"c. 1910"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Year {
    Numeric(i64),
    Text(String),
}

/// The identity triple of a content record.
///
/// Always derived from where a source document is stored
/// (`authors/<author_id>/works/<work_id>/<language>.md`), never from what the
/// document says about itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub author_id: String,
    pub work_id: String,
    pub language: String,
}

impl Identity {
    pub fn new(
        author_id: impl Into<String>,
        work_id: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            author_id: author_id.into(),
            work_id: work_id.into(),
            language: language.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.author_id, self.work_id, self.language)
    }
}
