//! Shared test utilities.
//!
//! `fixtures/` holds a small project: two authors, three works, six language
//! documents (one of them deliberately broken) and a language registry.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let plan = catalog::plan(&tmp.path().join("content"), None).unwrap();
//! let index = plan.index("1.0", "now");
//!
//! let kurgan = find_work(find_author(&index, "yanka-kupala"), "kurgan");
//! assert_eq!(kurgan.available_languages, vec!["be", "en"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::catalog::{AuthorEntry, CatalogIndex, WorkEntry};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/` to a temp directory and return it.
///
/// The temp directory is a project root: sources under `content/`, output
/// goes to `public/` with the default config.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Index lookups, panicking with a clear message on miss
// =========================================================================

/// Find an author entry by id. Panics if not found.
pub fn find_author<'a>(index: &'a CatalogIndex, id: &str) -> &'a AuthorEntry {
    index
        .authors
        .iter()
        .find(|a| a.id == id)
        .unwrap_or_else(|| panic!("author '{id}' not found. Available: {:?}", author_ids(index)))
}

/// Find a work entry by id within an author. Panics if not found.
pub fn find_work<'a>(author: &'a AuthorEntry, id: &str) -> &'a WorkEntry {
    author.works.iter().find(|w| w.id == id).unwrap_or_else(|| {
        let ids: Vec<&str> = author.works.iter().map(|w| w.id.as_str()).collect();
        panic!("work '{id}' not found under '{}'. Available: {ids:?}", author.id)
    })
}

/// All author ids in index order.
pub fn author_ids(index: &CatalogIndex) -> Vec<&str> {
    index.authors.iter().map(|a| a.id.as_str()).collect()
}
