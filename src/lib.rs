//! # lit-catalog
//!
//! Turns author-written Markdown translations of literary works into a
//! normalized JSON tree for a front-end, and checks that tree's integrity.
//!
//! # Pipeline
//!
//! ```text
//! content/authors/<a>/works/<w>/<lang>.md
//!     │  frontmatter   split YAML header from body
//!     │  segment       body → stanzas | paragraphs
//!     │  record        header + descriptor + path identity → ContentRecord
//!     ▼
//! catalog            per-author plans → sorted fold → public/ + metadata/index.json
//!     ▼
//! validate           re-read public/, report every structural violation
//! ```
//!
//! Data flows one way. The validator reads only the generated tree, so a
//! corrupted output is detectable no matter how it was produced.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`frontmatter`] | Splits a document into typed YAML metadata and body |
//! | [`segment`] | Blank-line segmentation into numbered stanzas or paragraphs |
//! | [`record`] | Builds one `ContentRecord` per (work, language); work descriptor model |
//! | [`catalog`] | Walks the source tree, writes the generated tree and the catalog index |
//! | [`validate`] | Structural validation of the generated tree |
//! | [`fingerprint`] | Timestamp-insensitive SHA-256 of a generated tree |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`types`] | Shared value types (`ContentType`, `Structure`, `Year`, `Identity`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Identity From Location
//!
//! A record's `author_id`, `work_id` and `language` always come from where
//! its source file lives. A document copied from another work with stale
//! frontmatter still publishes under its real location.
//!
//! ## Skip, Report, Continue
//!
//! A bad document costs only itself: it is reported, left out of the
//! catalog, and the build carries on. Partial success is the normal outcome
//! and the build exits 0. The validator is the strict gate.
//!
//! ## Regenerate Wholesale
//!
//! Every build deletes and rewrites the output tree. No state carries over
//! except the hand-maintained language registry, so two builds of the same
//! sources are byte-identical apart from the index timestamp.

pub mod catalog;
pub mod config;
pub mod fingerprint;
pub mod frontmatter;
pub mod output;
pub mod record;
pub mod segment;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
