//! Content fingerprint of a generated tree.
//!
//! Regenerating from unchanged sources must produce the same tree, apart
//! from the `last_updated` stamp in the catalog index. The fingerprint makes
//! that checkable at a glance: a SHA-256 over every file's relative path and
//! contents, visited in sorted order, with `last_updated` blanked.
//!
//! Two builds of the same sources print the same fingerprint; any edit to
//! any generated file, including a rename, changes it.

use crate::catalog::{INDEX_FILE, METADATA_DIR};
use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// SHA-256 of the tree under `root`, as a hex string.
pub fn tree_fingerprint(root: &Path) -> io::Result<String> {
    let index_path = Path::new(METADATA_DIR).join(INDEX_FILE);
    let mut hasher = Sha256::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let bytes = std::fs::read(entry.path())?;
        let bytes = if rel == index_path.as_path() {
            without_timestamp(&bytes).unwrap_or(bytes)
        } else {
            bytes
        };

        // Components joined with '/' so the digest is platform independent
        let rel_key: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        hasher.update(rel_key.join("/").as_bytes());
        hasher.update(b"\0");
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

const TIMESTAMP_KEY: &str = "\"last_updated\"";

/// The index bytes with the `last_updated` string value emptied in place.
///
/// Everything else, key order and whitespace included, is left as written.
/// Returns `None` when the key is not followed by a string value.
fn without_timestamp(bytes: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(bytes).ok()?;
    let after_key = text.find(TIMESTAMP_KEY)? + TIMESTAMP_KEY.len();

    let rest = text[after_key..].trim_start();
    let rest = rest.strip_prefix(':')?.trim_start();
    let rest = rest.strip_prefix('"')?;
    let start = text.len() - rest.len();

    let mut escaped = false;
    let len = rest.char_indices().find_map(|(i, c)| match c {
        _ if escaped => {
            escaped = false;
            None
        }
        '\\' => {
            escaped = true;
            None
        }
        '"' => Some(i),
        _ => None,
    })?;

    let mut out = Vec::with_capacity(bytes.len() - len);
    out.extend_from_slice(&bytes[..start]);
    out.extend_from_slice(&bytes[start + len..]);
    Some(out)
}
