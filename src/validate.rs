//! Structural validation of a generated tree.
//!
//! The validator never looks at sources. It re-reads every JSON file under
//! the output directory and checks it against what its position in the tree
//! says it must be:
//!
//! | Position | Required fields | Identity checks |
//! |----------|-----------------|-----------------|
//! | `authors/<a>/info.json` | `id`, `names`, `biography`, `birth_year` | `id == a` |
//! | `authors/<a>/works/<w>/metadata.json` | `id`, `author_id`, `type`, `titles`, `original_language` | `id == w`, `author_id == a` |
//! | `authors/<a>/works/<w>/content/<l>.json` | `language`, `work_id`, `author_id`, `title`, `content_type`, `structure`, `content` | all three |
//! | `metadata/index.json` | `version`, `last_updated`, `authors`, `statistics` | every indexed author, work and language exists |
//!
//! Any other `*.json` is checked for syntax only. Every violation in the tree
//! is collected; nothing stops at the first failure.

use crate::catalog::{
    AUTHOR_INFO_FILE, AUTHORS_DIR, CONTENT_DIR, INDEX_FILE, METADATA_DIR, WORK_METADATA_FILE,
    WORKS_DIR,
};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Generated tree not found: {0} (run `build` first)")]
    MissingOutputTree(PathBuf),
}

/// What is wrong with one generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    InvalidJson(String),
    MissingField(&'static str),
    IdentityMismatch {
        field: &'static str,
        found: String,
        expected: String,
    },
    WrongShape {
        field: &'static str,
        expected: Shape,
    },
    /// The index points at a file that does not exist.
    DanglingReference(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Object,
    Array,
}

impl Shape {
    fn matches(self, value: &Value) -> bool {
        match self {
            Shape::Object => value.is_object(),
            Shape::Array => value.is_array(),
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::InvalidJson(e) => write!(f, "Invalid JSON: {e}"),
            ViolationKind::MissingField(field) => write!(f, "Missing required field: {field}"),
            ViolationKind::IdentityMismatch {
                field,
                found,
                expected,
            } => write!(f, "{field} mismatch: {found} != {expected}"),
            ViolationKind::WrongShape { field, expected } => match expected {
                Shape::Object => write!(f, "'{field}' must be an object"),
                Shape::Array => write!(f, "'{field}' must be an array"),
            },
            ViolationKind::DanglingReference(target) => {
                write!(f, "Indexed file does not exist: {target}")
            }
        }
    }
}

/// One violation, located by file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralViolation {
    /// File path, relative to the output root.
    pub path: PathBuf,
    pub kind: ViolationKind,
}

impl fmt::Display for StructuralViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub files_checked: usize,
    pub invalid_files: usize,
    pub violations: Vec<StructuralViolation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Where a file sits in the generated tree.
#[derive(Debug, PartialEq, Eq)]
enum Position<'a> {
    AuthorInfo {
        author: &'a str,
    },
    WorkMetadata {
        author: &'a str,
        work: &'a str,
    },
    Content {
        author: &'a str,
        work: &'a str,
        language: &'a str,
    },
    Index,
    Other,
}

fn classify<'a>(parts: &'a [String]) -> Position<'a> {
    let parts: Vec<&'a str> = parts.iter().map(String::as_str).collect();
    match *parts.as_slice() {
        [AUTHORS_DIR, author, AUTHOR_INFO_FILE] => Position::AuthorInfo { author },
        [AUTHORS_DIR, author, WORKS_DIR, work, WORK_METADATA_FILE] => {
            Position::WorkMetadata { author, work }
        }
        [AUTHORS_DIR, author, WORKS_DIR, work, CONTENT_DIR, file] => {
            match file.strip_suffix(".json") {
                Some(language) => Position::Content {
                    author,
                    work,
                    language,
                },
                None => Position::Other,
            }
        }
        [METADATA_DIR, INDEX_FILE] => Position::Index,
        _ => Position::Other,
    }
}

/// Validate every JSON file under `output`.
pub fn validate(output: &Path) -> Result<ValidationReport, ValidateError> {
    if !output.join(AUTHORS_DIR).is_dir() {
        return Err(ValidateError::MissingOutputTree(output.to_path_buf()));
    }

    let mut report = ValidationReport::default();

    for entry in WalkDir::new(output).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        let is_json = entry.file_type().is_file()
            && path.extension().map(|e| e == "json").unwrap_or(false);
        if !is_json {
            continue;
        }

        let rel = path.strip_prefix(output).unwrap_or(path).to_path_buf();
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        report.files_checked += 1;
        let problems = check_file(path, classify(&parts), output);
        if !problems.is_empty() {
            report.invalid_files += 1;
            report
                .violations
                .extend(problems.into_iter().map(|kind| StructuralViolation {
                    path: rel.clone(),
                    kind,
                }));
        }
    }

    Ok(report)
}

fn check_file(path: &Path, position: Position<'_>, output: &Path) -> Vec<ViolationKind> {
    let value: Value = match fs::read(path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| serde_json::from_slice(&bytes).map_err(|e| e.to_string()))
    {
        Ok(v) => v,
        Err(e) => return vec![ViolationKind::InvalidJson(e)],
    };

    if position == Position::Other {
        return Vec::new();
    }

    let Some(data) = value.as_object() else {
        return vec![ViolationKind::InvalidJson("expected a JSON object".into())];
    };

    let mut problems = Vec::new();
    match position {
        Position::AuthorInfo { author } => {
            require(data, &["id", "names", "biography", "birth_year"], &mut problems);
            expect_id(data, "id", author, &mut problems);
            expect_shape(data, "names", Shape::Object, &mut problems);
            expect_shape(data, "biography", Shape::Object, &mut problems);
        }
        Position::WorkMetadata { author, work } => {
            require(
                data,
                &["id", "author_id", "type", "titles", "original_language"],
                &mut problems,
            );
            expect_id(data, "id", work, &mut problems);
            expect_id(data, "author_id", author, &mut problems);
            expect_shape(data, "titles", Shape::Object, &mut problems);
        }
        Position::Content {
            author,
            work,
            language,
        } => {
            require(
                data,
                &[
                    "language",
                    "work_id",
                    "author_id",
                    "title",
                    "content_type",
                    "structure",
                    "content",
                ],
                &mut problems,
            );
            expect_id(data, "work_id", work, &mut problems);
            expect_id(data, "author_id", author, &mut problems);
            expect_id(data, "language", language, &mut problems);
            expect_shape(data, "content", Shape::Array, &mut problems);
        }
        Position::Index => {
            require(
                data,
                &["version", "last_updated", "authors", "statistics"],
                &mut problems,
            );
            expect_shape(data, "authors", Shape::Array, &mut problems);
            check_index_references(data, output, &mut problems);
        }
        Position::Other => {}
    }
    problems
}

fn require(data: &Map<String, Value>, fields: &[&'static str], out: &mut Vec<ViolationKind>) {
    out.extend(
        fields
            .iter()
            .filter(|f| !data.contains_key(**f))
            .map(|f| ViolationKind::MissingField(*f)),
    );
}

/// A present identity field must equal the directory-derived value.
/// Absence is already reported by [`require`].
fn expect_id(
    data: &Map<String, Value>,
    field: &'static str,
    expected: &str,
    out: &mut Vec<ViolationKind>,
) {
    let Some(found) = data.get(field) else {
        return;
    };
    if found.as_str() != Some(expected) {
        let found = match found {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        out.push(ViolationKind::IdentityMismatch {
            field,
            found,
            expected: expected.to_string(),
        });
    }
}

fn expect_shape(
    data: &Map<String, Value>,
    field: &'static str,
    expected: Shape,
    out: &mut Vec<ViolationKind>,
) {
    if let Some(value) = data.get(field)
        && !expected.matches(value)
    {
        out.push(ViolationKind::WrongShape { field, expected });
    }
}

/// Every author, work and language listed in the index must exist on disk.
fn check_index_references(data: &Map<String, Value>, output: &Path, out: &mut Vec<ViolationKind>) {
    let authors = data.get("authors").and_then(Value::as_array);
    for author in authors.into_iter().flatten() {
        let Some(author_id) = author.get("id").and_then(Value::as_str) else {
            continue;
        };
        let author_dir = Path::new(AUTHORS_DIR).join(author_id);
        expect_exists(output, &author_dir.join(AUTHOR_INFO_FILE), out);

        let works = author.get("works").and_then(Value::as_array);
        for work in works.into_iter().flatten() {
            let Some(work_id) = work.get("id").and_then(Value::as_str) else {
                continue;
            };
            let work_dir = author_dir.join(WORKS_DIR).join(work_id);
            expect_exists(output, &work_dir.join(WORK_METADATA_FILE), out);

            let languages = work.get("available_languages").and_then(Value::as_array);
            for language in languages.into_iter().flatten().filter_map(Value::as_str) {
                let file = work_dir.join(CONTENT_DIR).join(format!("{language}.json"));
                expect_exists(output, &file, out);
            }
        }
    }
}

fn expect_exists(output: &Path, rel: &Path, out: &mut Vec<ViolationKind>) {
    if !output.join(rel).is_file() {
        out.push(ViolationKind::DanglingReference(rel.display().to_string()));
    }
}
