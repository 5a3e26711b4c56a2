//! Catalog aggregation: source tree → generated tree + index.
//!
//! ## Source layout
//!
//! ```text
//! content/
//! ├── languages.json                   # Language registry (hand-maintained)
//! └── authors/
//!     └── yanka-kupala/
//!         ├── info.json                # Author descriptor
//!         └── works/
//!             └── kurgan/
//!                 ├── metadata.json    # Work descriptor
//!                 ├── be.md            # One document per language
//!                 └── en.md
//! ```
//!
//! ## Generated layout
//!
//! ```text
//! public/
//! ├── metadata/
//! │   ├── index.json                   # CatalogIndex
//! │   └── languages.json               # Registry, copied verbatim
//! └── authors/
//!     └── yanka-kupala/
//!         ├── info.json                # Byte-for-byte copy
//!         └── works/
//!             └── kurgan/
//!                 ├── metadata.json    # Descriptor with id/author_id normalized
//!                 └── content/
//!                     ├── be.json      # ContentRecord
//!                     └── en.json
//! ```
//!
//! ## Two phases
//!
//! [`plan`] reads the source tree and builds everything in memory. Authors
//! are planned in parallel; each author yields an independent
//! [`AuthorOutcome`] and the outcomes are folded in sorted order, so the
//! result never depends on completion order. [`write`] then wipes the output
//! tree and writes the plan sequentially.
//!
//! ## Failure policy
//!
//! A document that fails to convert is reported and left out of
//! `available_languages` and `total_translations`; its siblings carry on. A
//! missing or invalid descriptor skips that author or work subtree and is
//! reported as [`Skipped`]. Only a missing source tree stops the build.

use crate::config::BuildConfig;
use crate::fingerprint;
use crate::record::{self, ContentRecord, DocumentError, WorkDescriptor};
use crate::types::{ContentType, Identity, Year};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

pub const AUTHORS_DIR: &str = "authors";
pub const WORKS_DIR: &str = "works";
pub const CONTENT_DIR: &str = "content";
pub const METADATA_DIR: &str = "metadata";
pub const AUTHOR_INFO_FILE: &str = "info.json";
pub const WORK_METADATA_FILE: &str = "metadata.json";
pub const INDEX_FILE: &str = "index.json";
pub const LANGUAGES_FILE: &str = "languages.json";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Source tree not found: {0}")]
    MissingSourceTree(PathBuf),
    #[error("Output directory {} overlaps the source tree {}", output.display(), source_dir.display())]
    OutputOverlapsSource { output: PathBuf, source_dir: PathBuf },
}

/// Why a descriptor-level subtree was left out of the catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("missing descriptor")]
    MissingDescriptor,
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),
}

/// An author or work directory left out of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// Descriptor path, relative to the source root.
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Result of converting one source document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentReport {
    /// Document path, relative to the source root.
    pub source: PathBuf,
    pub identity: Identity,
    pub result: Result<(), DocumentError>,
}

// ============================================================================
// Catalog index
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogIndex {
    pub version: String,
    pub last_updated: String,
    pub authors: Vec<AuthorEntry>,
    pub statistics: Statistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorEntry {
    pub id: String,
    pub names: BTreeMap<String, String>,
    pub work_count: usize,
    pub works: Vec<WorkEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<Year>,
    pub available_languages: Vec<String>,
    /// Titles of the successfully converted languages, keyed by language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titles: Option<BTreeMap<String, String>>,
    /// Tags of the successfully converted languages that declare any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_authors: usize,
    pub total_works: usize,
    pub total_translations: usize,
    pub languages_with_content: BTreeSet<String>,
}

// ============================================================================
// Plan
// ============================================================================

/// The parts of `info.json` the catalog reads.
#[derive(Debug, Deserialize)]
struct AuthorDescriptor {
    #[serde(default)]
    names: BTreeMap<String, String>,
}

/// One author, ready to be written.
#[derive(Debug, Clone)]
pub struct PlannedAuthor {
    pub entry: AuthorEntry,
    /// Raw `info.json`, published unchanged.
    pub info: Vec<u8>,
    pub works: Vec<PlannedWork>,
}

/// One work, ready to be written.
#[derive(Debug, Clone)]
pub struct PlannedWork {
    pub id: String,
    /// Descriptor with `id`/`author_id` already normalized.
    pub descriptor: WorkDescriptor,
    pub records: Vec<ContentRecord>,
}

/// Everything planned for a single author directory.
#[derive(Debug, Clone, Default)]
pub struct AuthorOutcome {
    pub author: Option<PlannedAuthor>,
    pub documents: Vec<DocumentReport>,
    pub skipped: Vec<Skipped>,
}

/// The whole catalog, in memory, before anything is written.
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    pub authors: Vec<PlannedAuthor>,
    pub documents: Vec<DocumentReport>,
    pub skipped: Vec<Skipped>,
}

impl BuildPlan {
    /// Fold per-author outcomes, in the order given, into one plan.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = AuthorOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(BuildPlan::default(), |mut plan, outcome| {
                plan.authors.extend(outcome.author);
                plan.documents.extend(outcome.documents);
                plan.skipped.extend(outcome.skipped);
                plan
            })
    }

    pub fn statistics(&self) -> Statistics {
        let works = self.authors.iter().flat_map(|a| &a.entry.works);
        Statistics {
            total_authors: self.authors.len(),
            total_works: works.clone().count(),
            total_translations: self.documents.iter().filter(|d| d.result.is_ok()).count(),
            languages_with_content: works
                .flat_map(|w| w.available_languages.iter().cloned())
                .collect(),
        }
    }

    pub fn index(&self, version: &str, last_updated: &str) -> CatalogIndex {
        CatalogIndex {
            version: version.to_string(),
            last_updated: last_updated.to_string(),
            authors: self.authors.iter().map(|a| a.entry.clone()).collect(),
            statistics: self.statistics(),
        }
    }
}

/// Read the source tree into a [`BuildPlan`].
///
/// `source` is the directory containing `authors/`. `fallback` is the content
/// type assumed for work descriptors without `type`.
pub fn plan(source: &Path, fallback: Option<ContentType>) -> Result<BuildPlan, BuildError> {
    let authors_dir = source.join(AUTHORS_DIR);
    if !authors_dir.is_dir() {
        return Err(BuildError::MissingSourceTree(authors_dir));
    }

    let authors = sorted_subdirs(&authors_dir)?;
    let outcomes = authors
        .par_iter()
        .map(|(author_id, dir)| plan_author(source, author_id, dir, fallback))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BuildPlan::from_outcomes(outcomes))
}

fn plan_author(
    source: &Path,
    author_id: &str,
    dir: &Path,
    fallback: Option<ContentType>,
) -> Result<AuthorOutcome, BuildError> {
    let mut outcome = AuthorOutcome::default();
    let info_path = dir.join(AUTHOR_INFO_FILE);

    let (info, descriptor) = match read_author_info(&info_path) {
        Ok(parsed) => parsed,
        Err(reason) => {
            log::warn!("skipping author {author_id}: {reason}");
            outcome.skipped.push(Skipped {
                path: relative(source, &info_path),
                reason,
            });
            return Ok(outcome);
        }
    };

    let works_dir = dir.join(WORKS_DIR);
    let work_dirs = if works_dir.is_dir() {
        sorted_subdirs(&works_dir)?
    } else {
        Vec::new()
    };

    let mut works = Vec::new();
    for (work_id, work_dir) in &work_dirs {
        let metadata_path = work_dir.join(WORK_METADATA_FILE);
        let descriptor = match read_work_descriptor(&metadata_path) {
            Ok(d) => d,
            Err(reason) => {
                log::warn!("skipping work {author_id}/{work_id}: {reason}");
                outcome.skipped.push(Skipped {
                    path: relative(source, &metadata_path),
                    reason,
                });
                continue;
            }
        };
        let (work, documents) = plan_work(source, author_id, work_id, work_dir, descriptor, fallback)?;
        outcome.documents.extend(documents);
        works.push(work);
    }

    let entry = AuthorEntry {
        id: author_id.to_string(),
        names: descriptor.names,
        work_count: works.len(),
        works: works.iter().map(work_entry).collect(),
    };
    outcome.author = Some(PlannedAuthor { entry, info, works });
    Ok(outcome)
}

fn plan_work(
    source: &Path,
    author_id: &str,
    work_id: &str,
    dir: &Path,
    descriptor: WorkDescriptor,
    fallback: Option<ContentType>,
) -> Result<(PlannedWork, Vec<DocumentReport>), BuildError> {
    if descriptor.kind().is_none()
        && let Some(assumed) = fallback
    {
        log::debug!("{author_id}/{work_id}: metadata.json has no `type`, assuming {assumed}");
    }

    let mut records = Vec::new();
    let mut reports = Vec::new();

    for (language, path) in sorted_language_files(dir)? {
        let identity = Identity::new(author_id, work_id, language);
        let result = fs::read_to_string(&path)
            .map_err(|e| DocumentError::Unreadable(e.to_string()))
            .and_then(|raw| record::convert_document(&raw, &descriptor, &identity, fallback));

        let result = match result {
            Ok(record) => {
                records.push(record);
                Ok(())
            }
            Err(e) => {
                log::info!("{identity}: {e}");
                Err(e)
            }
        };
        reports.push(DocumentReport {
            source: relative(source, &path),
            identity,
            result,
        });
    }

    let work = PlannedWork {
        id: work_id.to_string(),
        descriptor: descriptor.normalized(author_id, work_id),
        records,
    };
    Ok((work, reports))
}

/// Catalog entry for a planned work, built from its successful records only.
fn work_entry(work: &PlannedWork) -> WorkEntry {
    let titles: BTreeMap<String, String> = work
        .records
        .iter()
        .map(|r| (r.language.clone(), r.title.clone()))
        .collect();
    let tags: BTreeMap<String, Vec<String>> = work
        .records
        .iter()
        .filter(|r| !r.tags.is_empty())
        .map(|r| (r.language.clone(), r.tags.clone()))
        .collect();

    WorkEntry {
        id: work.id.clone(),
        kind: work.descriptor.kind().map(String::from).or_else(|| {
            work.records
                .first()
                .map(|r| r.content_type.to_string())
        }),
        year: work.descriptor.year_written().cloned(),
        available_languages: work.records.iter().map(|r| r.language.clone()).collect(),
        titles: (!titles.is_empty()).then_some(titles),
        tags: (!tags.is_empty()).then_some(tags),
    }
}

fn read_author_info(path: &Path) -> Result<(Vec<u8>, AuthorDescriptor), SkipReason> {
    let bytes = read_descriptor_bytes(path)?;
    let value = parse_json_object(&bytes)?;
    let descriptor = serde_json::from_value(value)
        .map_err(|e| SkipReason::InvalidDescriptor(e.to_string()))?;
    Ok((bytes, descriptor))
}

fn read_work_descriptor(path: &Path) -> Result<WorkDescriptor, SkipReason> {
    let bytes = read_descriptor_bytes(path)?;
    let value = parse_json_object(&bytes)?;
    serde_json::from_value(value).map_err(|e| SkipReason::InvalidDescriptor(e.to_string()))
}

fn read_descriptor_bytes(path: &Path) -> Result<Vec<u8>, SkipReason> {
    if !path.is_file() {
        return Err(SkipReason::MissingDescriptor);
    }
    fs::read(path).map_err(|e| SkipReason::InvalidDescriptor(e.to_string()))
}

fn parse_json_object(bytes: &[u8]) -> Result<serde_json::Value, SkipReason> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| SkipReason::InvalidDescriptor(e.to_string()))?;
    if !value.is_object() {
        return Err(SkipReason::InvalidDescriptor("expected a JSON object".into()));
    }
    Ok(value)
}

// ============================================================================
// Write
// ============================================================================

/// What happened to the language registry during a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryStatus {
    /// Copied from the configured source file.
    Copied,
    /// No source file; the copy already in the output tree was kept.
    Preserved,
    /// Neither exists.
    Missing,
}

/// Wipe `output` and write the planned tree plus the catalog index.
pub fn write(
    plan: &BuildPlan,
    output: &Path,
    registry: &Path,
    index: &CatalogIndex,
) -> Result<RegistryStatus, BuildError> {
    let published_registry = output.join(METADATA_DIR).join(LANGUAGES_FILE);
    let (registry_bytes, status) = if registry.is_file() {
        (Some(fs::read(registry)?), RegistryStatus::Copied)
    } else if published_registry.is_file() {
        (Some(fs::read(&published_registry)?), RegistryStatus::Preserved)
    } else {
        (None, RegistryStatus::Missing)
    };

    if output.exists() {
        fs::remove_dir_all(output)?;
    }
    fs::create_dir_all(output.join(METADATA_DIR))?;

    for author in &plan.authors {
        let author_dir = output.join(AUTHORS_DIR).join(&author.entry.id);
        fs::create_dir_all(&author_dir)?;
        fs::write(author_dir.join(AUTHOR_INFO_FILE), &author.info)?;

        for work in &author.works {
            let work_dir = author_dir.join(WORKS_DIR).join(&work.id);
            fs::create_dir_all(&work_dir)?;
            write_json(&work_dir.join(WORK_METADATA_FILE), &work.descriptor)?;

            if work.records.is_empty() {
                continue;
            }
            let content_dir = work_dir.join(CONTENT_DIR);
            fs::create_dir_all(&content_dir)?;
            for record in &work.records {
                write_json(&content_dir.join(format!("{}.json", record.language)), record)?;
            }
        }
    }

    write_json(&output.join(METADATA_DIR).join(INDEX_FILE), index)?;

    match &registry_bytes {
        Some(bytes) => fs::write(&published_registry, bytes)?,
        None => log::warn!(
            "no language registry at {}; metadata/{LANGUAGES_FILE} not written",
            registry.display()
        ),
    }

    Ok(status)
}

/// Pretty-printed JSON with a trailing newline.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), BuildError> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}

// ============================================================================
// Build
// ============================================================================

/// Everything a build produced, for display.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub index: CatalogIndex,
    pub documents: Vec<DocumentReport>,
    pub skipped: Vec<Skipped>,
    pub registry: RegistryStatus,
    pub fingerprint: String,
}

impl BuildReport {
    pub fn converted_count(&self) -> usize {
        self.documents.iter().filter(|d| d.result.is_ok()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.documents.len() - self.converted_count()
    }
}

/// Run the full pipeline for a project root: plan, write, fingerprint.
pub fn build(root: &Path, config: &BuildConfig) -> Result<BuildReport, BuildError> {
    let source = config.source_dir(root);
    let output = config.output_dir(root);
    let (resolved_source, resolved_output) = (resolve(&source), resolve(&output));
    if resolved_source.starts_with(&resolved_output) || resolved_output.starts_with(&resolved_source) {
        return Err(BuildError::OutputOverlapsSource { output, source_dir: source });
    }

    let plan = plan(&source, config.compat.fallback_content_type())?;
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let index = plan.index(&config.catalog.schema_version, &timestamp);

    let registry = write(&plan, &output, &config.languages_file(root), &index)?;
    let fingerprint = fingerprint::tree_fingerprint(&output)?;
    log::info!(
        "built {} authors, {} works, {} translations",
        index.statistics.total_authors,
        index.statistics.total_works,
        index.statistics.total_translations
    );

    Ok(BuildReport {
        index,
        documents: plan.documents,
        skipped: plan.skipped,
        registry,
        fingerprint,
    })
}

// ============================================================================
// Directory helpers
// ============================================================================

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(true)
}

/// Absolute form of `path` with symlinks and `..` resolved.
///
/// The longest existing prefix is canonicalized and the remaining
/// components are applied lexically, so paths that do not exist yet resolve
/// too.
fn resolve(path: &Path) -> PathBuf {
    for ancestor in path.ancestors() {
        let Ok(mut resolved) = ancestor.canonicalize() else {
            continue;
        };
        let rest = path.strip_prefix(ancestor).unwrap_or(Path::new(""));
        for component in rest.components() {
            match component {
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(part) => resolved.push(part),
                _ => {}
            }
        }
        return resolved;
    }
    path.to_path_buf()
}

/// Entries of `dir` as paths. Entry errors are kept, not dropped.
fn read_paths(dir: &Path) -> io::Result<impl Iterator<Item = io::Result<PathBuf>>> {
    Ok(fs::read_dir(dir)?.map(|entry| entry.map(|e| e.path())))
}

/// Keep the entries `name` accepts, sorted by the name it gives them.
/// The first entry error aborts the listing.
fn sorted_entries(
    entries: impl IntoIterator<Item = io::Result<PathBuf>>,
    name: impl Fn(&Path) -> Option<String>,
) -> io::Result<Vec<(String, PathBuf)>> {
    let mut kept = Vec::new();
    for entry in entries {
        let path = entry?;
        if let Some(n) = name(&path) {
            kept.push((n, path));
        }
    }
    kept.sort();
    Ok(kept)
}

/// Visible subdirectories of `dir` as `(name, path)`, sorted by name.
fn sorted_subdirs(dir: &Path) -> Result<Vec<(String, PathBuf)>, BuildError> {
    let dirs = sorted_entries(read_paths(dir)?, |p| {
        if !p.is_dir() || is_hidden(p) {
            return None;
        }
        Some(p.file_name()?.to_string_lossy().into_owned())
    })?;
    Ok(dirs)
}

/// `<lang>.md` files directly inside a work directory, sorted by language code.
fn sorted_language_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, BuildError> {
    let files = sorted_entries(read_paths(dir)?, |p| {
        let is_markdown = p
            .extension()
            .map(|e| e.eq_ignore_ascii_case("md"))
            .unwrap_or(false);
        if !p.is_file() || is_hidden(p) || !is_markdown {
            return None;
        }
        Some(p.file_stem()?.to_string_lossy().into_owned())
    })?;
    Ok(files)
}

fn relative(base: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(base).unwrap_or(path).to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn plan_fixtures() -> (TempDir, BuildPlan) {
        let tmp = setup_fixtures();
        let plan = plan(&tmp.path().join("content"), Some(ContentType::Poem)).unwrap();
        (tmp, plan)
    }

    #[test]
    fn missing_source_tree_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let result = plan(tmp.path(), None);
        assert!(matches!(result, Err(BuildError::MissingSourceTree(_))));
    }

    #[test]
    fn authors_works_and_languages_are_sorted() {
        let (_tmp, plan) = plan_fixtures();
        let index = plan.index("1.0", "now");

        assert_eq!(author_ids(&index), vec!["maksim-bahdanovich", "yanka-kupala"]);
        let kupala = find_author(&index, "yanka-kupala");
        let work_ids: Vec<&str> = kupala.works.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(work_ids, vec!["kurgan", "spadchyna"]);
        assert_eq!(
            find_work(kupala, "kurgan").available_languages,
            vec!["be", "en"]
        );
    }

    #[test]
    fn failed_language_is_isolated() {
        let (_tmp, plan) = plan_fixtures();
        let index = plan.index("1.0", "now");
        let kupala = find_author(&index, "yanka-kupala");
        let spadchyna = find_work(kupala, "spadchyna");

        // de.md in the fixture has no frontmatter
        assert_eq!(spadchyna.available_languages, vec!["be", "en"]);
        assert!(!spadchyna.titles.as_ref().unwrap().contains_key("de"));

        let failed: Vec<&DocumentReport> =
            plan.documents.iter().filter(|d| d.result.is_err()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].identity.language, "de");
        assert!(matches!(
            failed[0].result,
            Err(DocumentError::MalformedDocument(_))
        ));
    }

    #[test]
    fn statistics_count_successes_only() {
        let (_tmp, plan) = plan_fixtures();
        let stats = plan.statistics();

        assert_eq!(stats.total_authors, 2);
        assert_eq!(stats.total_works, 3);
        assert_eq!(stats.total_translations, 5);
        assert_eq!(plan.documents.len() - stats.total_translations, 1);
        let languages: Vec<&str> = stats.languages_with_content.iter().map(String::as_str).collect();
        assert_eq!(languages, vec!["be", "en"]);
    }

    #[test]
    fn titles_and_tags_collected_from_records() {
        let (_tmp, plan) = plan_fixtures();
        let index = plan.index("1.0", "now");
        let kurgan = find_work(find_author(&index, "yanka-kupala"), "kurgan");

        let titles = kurgan.titles.as_ref().unwrap();
        assert_eq!(titles["be"], "Курган");
        assert_eq!(titles["en"], "The Barrow");

        let tags = kurgan.tags.as_ref().unwrap();
        assert_eq!(tags["en"], vec!["ballad", "history"]);
        assert!(!tags.contains_key("be"));
    }

    #[test]
    fn author_without_info_is_skipped_and_reported() {
        let tmp = setup_fixtures();
        let content = tmp.path().join("content");
        fs::create_dir_all(content.join("authors/anonymous/works/song")).unwrap();

        let plan = plan(&content, Some(ContentType::Poem)).unwrap();
        assert!(plan.authors.iter().all(|a| a.entry.id != "anonymous"));
        assert!(plan.skipped.contains(&Skipped {
            path: PathBuf::from("authors/anonymous/info.json"),
            reason: SkipReason::MissingDescriptor,
        }));
    }

    #[test]
    fn invalid_work_descriptor_skips_only_that_work() {
        let tmp = setup_fixtures();
        let content = tmp.path().join("content");
        let broken = content.join("authors/yanka-kupala/works/broken");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join("metadata.json"), "{ not json").unwrap();
        fs::write(broken.join("be.md"), "---\ntitle: X\n---\nx").unwrap();

        let plan = plan(&content, Some(ContentType::Poem)).unwrap();
        let index = plan.index("1.0", "now");
        let kupala = find_author(&index, "yanka-kupala");
        assert_eq!(kupala.work_count, 2);
        assert!(kupala.works.iter().all(|w| w.id != "broken"));
        assert!(matches!(
            plan.skipped.last().map(|s| &s.reason),
            Some(SkipReason::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn work_with_no_successful_language_still_listed() {
        let tmp = setup_fixtures();
        let content = tmp.path().join("content");
        let work = content.join("authors/yanka-kupala/works/drafts");
        fs::create_dir_all(&work).unwrap();
        fs::write(work.join("metadata.json"), r#"{"type": "poem"}"#).unwrap();
        fs::write(work.join("be.md"), "no frontmatter here").unwrap();

        let plan = plan(&content, Some(ContentType::Poem)).unwrap();
        let index = plan.index("1.0", "now");
        let drafts = find_work(find_author(&index, "yanka-kupala"), "drafts");
        assert!(drafts.available_languages.is_empty());
        assert!(drafts.titles.is_none());
    }

    #[test]
    fn unsupported_type_fails_every_language() {
        let tmp = setup_fixtures();
        let content = tmp.path().join("content");
        let work = content.join("authors/yanka-kupala/works/play");
        fs::create_dir_all(&work).unwrap();
        fs::write(work.join("metadata.json"), r#"{"type": "drama"}"#).unwrap();
        fs::write(work.join("be.md"), "---\ntitle: A\n---\nx").unwrap();
        fs::write(work.join("en.md"), "---\ntitle: B\n---\nx").unwrap();

        let plan = plan(&content, Some(ContentType::Poem)).unwrap();
        let failures: Vec<&DocumentReport> = plan
            .documents
            .iter()
            .filter(|d| d.identity.work_id == "play")
            .collect();
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|d| matches!(
            d.result,
            Err(DocumentError::UnsupportedContentType(_))
        )));
    }

    #[test]
    fn descriptor_identity_is_normalized() {
        let (_tmp, plan) = plan_fixtures();
        let kupala = plan
            .authors
            .iter()
            .find(|a| a.entry.id == "yanka-kupala")
            .unwrap();
        let kurgan = kupala.works.iter().find(|w| w.id == "kurgan").unwrap();

        // The fixture's metadata.json carries a stale id
        assert_eq!(kurgan.descriptor.id.as_deref(), Some("kurgan"));
        assert_eq!(kurgan.descriptor.author_id.as_deref(), Some("yanka-kupala"));
    }

    #[test]
    fn missing_type_uses_fallback_type_in_entry() {
        let tmp = setup_fixtures();
        let content = tmp.path().join("content");
        let work = content.join("authors/yanka-kupala/works/legacy");
        fs::create_dir_all(&work).unwrap();
        fs::write(work.join("metadata.json"), r#"{"titles": {"be": "Стары"}}"#).unwrap();
        fs::write(work.join("be.md"), "---\ntitle: Стары\n---\na\nb\n\nc").unwrap();

        let index = plan(&content, Some(ContentType::Prose)).unwrap().index("1.0", "now");
        let legacy = find_work(find_author(&index, "yanka-kupala"), "legacy");
        assert_eq!(legacy.kind.as_deref(), Some("prose"));
        assert_eq!(legacy.available_languages, vec!["be"]);

        let strict = plan(&content, None).unwrap().index("1.0", "now");
        let legacy = find_work(find_author(&strict, "yanka-kupala"), "legacy");
        assert!(legacy.available_languages.is_empty());
        assert_eq!(legacy.kind, None);
    }

    #[test]
    fn outcomes_fold_in_given_order() {
        let outcome = |id: &str| AuthorOutcome {
            author: Some(PlannedAuthor {
                entry: AuthorEntry {
                    id: id.to_string(),
                    names: BTreeMap::new(),
                    work_count: 0,
                    works: vec![],
                },
                info: b"{}".to_vec(),
                works: vec![],
            }),
            ..Default::default()
        };
        let plan = BuildPlan::from_outcomes(vec![outcome("a"), outcome("b"), outcome("c")]);
        let ids: Vec<&str> = plan.authors.iter().map(|a| a.entry.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn write_produces_expected_layout() {
        let tmp = setup_fixtures();
        let report = build(tmp.path(), &BuildConfig::default()).unwrap();
        let public = tmp.path().join("public");

        assert!(public.join("authors/yanka-kupala/info.json").is_file());
        assert!(public.join("authors/yanka-kupala/works/kurgan/metadata.json").is_file());
        assert!(public.join("authors/yanka-kupala/works/kurgan/content/be.json").is_file());
        assert!(!public.join("authors/yanka-kupala/works/spadchyna/content/de.json").exists());
        assert!(public.join("metadata/index.json").is_file());
        assert!(public.join("metadata/languages.json").is_file());
        assert_eq!(report.registry, RegistryStatus::Copied);
    }

    #[test]
    fn author_info_is_copied_verbatim() {
        let tmp = setup_fixtures();
        build(tmp.path(), &BuildConfig::default()).unwrap();
        let source = fs::read(tmp.path().join("content/authors/yanka-kupala/info.json")).unwrap();
        let published = fs::read(tmp.path().join("public/authors/yanka-kupala/info.json")).unwrap();
        assert_eq!(source, published);
    }

    #[test]
    fn stale_output_is_removed() {
        let tmp = setup_fixtures();
        let stale = tmp.path().join("public/authors/ghost/info.json");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "{}").unwrap();

        build(tmp.path(), &BuildConfig::default()).unwrap();
        assert!(!stale.exists());
    }

    #[test]
    fn registry_preserved_when_source_copy_absent() {
        let tmp = setup_fixtures();
        build(tmp.path(), &BuildConfig::default()).unwrap();
        let published = tmp.path().join("public/metadata/languages.json");
        let before = fs::read(&published).unwrap();

        fs::remove_file(tmp.path().join("content/languages.json")).unwrap();
        let report = build(tmp.path(), &BuildConfig::default()).unwrap();

        assert_eq!(report.registry, RegistryStatus::Preserved);
        assert_eq!(fs::read(&published).unwrap(), before);
    }

    #[test]
    fn registry_missing_everywhere_is_not_an_error() {
        let tmp = setup_fixtures();
        fs::remove_file(tmp.path().join("content/languages.json")).unwrap();
        let report = build(tmp.path(), &BuildConfig::default()).unwrap();
        assert_eq!(report.registry, RegistryStatus::Missing);
        assert!(!tmp.path().join("public/metadata/languages.json").exists());
    }

    #[test]
    fn output_enclosing_source_is_refused() {
        let tmp = setup_fixtures();
        let mut config = BuildConfig::default();
        config.paths.output = ".".into();
        let result = build(tmp.path(), &config);
        assert!(matches!(result, Err(BuildError::OutputOverlapsSource { .. })));
        assert!(tmp.path().join("content/authors").is_dir());
    }

    #[test]
    fn output_spelled_differently_as_source_is_refused() {
        let tmp = setup_fixtures();
        let project = tmp.path().file_name().unwrap().to_string_lossy().into_owned();
        let mut config = BuildConfig::default();
        config.paths.output = format!("../{project}/content");

        let result = build(tmp.path(), &config);
        assert!(matches!(result, Err(BuildError::OutputOverlapsSource { .. })));
        assert!(tmp.path().join("content/authors/yanka-kupala/works/kurgan/be.md").is_file());
    }

    #[test]
    fn output_nested_inside_source_is_refused() {
        let tmp = setup_fixtures();
        let mut config = BuildConfig::default();
        config.paths.output = "content/authors".into();

        let result = build(tmp.path(), &config);
        assert!(matches!(result, Err(BuildError::OutputOverlapsSource { .. })));
        assert!(tmp.path().join("content/authors/yanka-kupala/info.json").is_file());
    }

    #[test]
    fn resolve_handles_missing_tails_and_parent_steps() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().canonicalize().unwrap();
        assert_eq!(resolve(&tmp.path().join("a/b/../c")), base.join("a/c"));
        assert_eq!(resolve(&tmp.path().join("x/..")), base);
    }

    #[test]
    fn listing_error_is_not_swallowed() {
        let entries = vec![
            Ok(PathBuf::from("a")),
            Err(io::Error::other("unreadable entry")),
            Ok(PathBuf::from("b")),
        ];
        let result = sorted_entries(entries, |p| Some(p.display().to_string()));
        assert!(result.is_err());

        let sorted = sorted_entries(
            vec![Ok(PathBuf::from("b")), Ok(PathBuf::from("a"))],
            |p| Some(p.display().to_string()),
        )
        .unwrap();
        let names: Vec<&str> = sorted.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn index_json_shape() {
        let tmp = setup_fixtures();
        build(tmp.path(), &BuildConfig::default()).unwrap();
        let raw = fs::read_to_string(tmp.path().join("public/metadata/index.json")).unwrap();
        let index: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(index["version"], "1.0");
        assert!(index["last_updated"].is_string());
        assert_eq!(index["statistics"]["total_translations"], 5);
        assert_eq!(
            index["statistics"]["languages_with_content"],
            serde_json::json!(["be", "en"])
        );
        let work = &index["authors"][1]["works"][0];
        assert_eq!(work["id"], "kurgan");
        assert_eq!(work["type"], "poem");
        assert_eq!(work["year"], 1910);
    }
}
