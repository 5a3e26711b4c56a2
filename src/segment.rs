//! Body segmentation into stanzas and paragraphs.
//!
//! This is the only structural parsing the pipeline does. A body is cut into
//! blocks at blank-line boundaries (two or more consecutive newlines), and
//! each non-empty block becomes one [`ContentUnit`]:
//!
//! ```text
//! Line one          ┐
//! Line two          ┘ stanza 1: ["Line one", "Line two"]
//!
//! Line three        ] stanza 2: ["Line three"]
//! ```
//!
//! Inline Markdown (emphasis, links) is left untouched.
//!
//! ## Numbering
//!
//! Numbers start at 1 and count emitted units only. Blocks that turn out empty
//! after trimming (from runs of three or more newlines, or whitespace-only
//! lines) are dropped without consuming a number, so the numbers of a record
//! are always the contiguous sequence `1..=N`.

use crate::types::ContentType;
use serde::{Deserialize, Serialize};

/// One stanza or paragraph extracted from a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentUnit {
    Stanza { number: u32, lines: Vec<String> },
    Paragraph { number: u32, text: String },
}

impl ContentUnit {
    pub fn number(&self) -> u32 {
        match self {
            ContentUnit::Stanza { number, .. } | ContentUnit::Paragraph { number, .. } => *number,
        }
    }
}

/// Split a body into its raw blank-line-separated blocks.
fn blocks(body: &str) -> impl Iterator<Item = &str> {
    body.split("\n\n")
}

/// Segment `body` into content units according to `content_type`.
pub fn segment(body: &str, content_type: ContentType) -> Vec<ContentUnit> {
    let body = body.replace("\r\n", "\n");
    let mut units = Vec::new();
    let mut next_number = 1u32;

    for block in blocks(&body) {
        let unit = match content_type {
            ContentType::Poem => {
                let lines: Vec<String> = block
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(String::from)
                    .collect();
                if lines.is_empty() {
                    continue;
                }
                ContentUnit::Stanza {
                    number: next_number,
                    lines,
                }
            }
            ContentType::Prose => {
                let text = block.trim();
                if text.is_empty() {
                    continue;
                }
                ContentUnit::Paragraph {
                    number: next_number,
                    text: text.to_string(),
                }
            }
        };
        units.push(unit);
        next_number += 1;
    }

    units
}
