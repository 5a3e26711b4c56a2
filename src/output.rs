//! CLI output formatting for build and validate.
//!
//! Each command has a `format_*` function returning lines (pure, no I/O, so
//! tests can assert on exact output) and a `print_*` wrapper writing them to
//! stdout.
//!
//! # Build
//!
//! ```text
//! Documents
//! 001 ✓ authors/maksim-bahdanovich/works/apokryf/be.md
//! 002 ✓ authors/yanka-kupala/works/kurgan/be.md
//! 003 ✗ authors/yanka-kupala/works/spadchyna/de.md
//!     malformed document: document must start with `---` frontmatter
//!
//! Skipped
//!     authors/anonymous/info.json: missing descriptor
//!
//! Catalog
//!     2 authors, 3 works, 5 translations
//!     Languages: be, en
//!     Registry: copied
//!
//! Converted 5 file(s), 1 failed, 1 skipped
//! Fingerprint: 3f1c…
//! ```
//!
//! # Validate
//!
//! ```text
//! Total files checked: 12
//! Invalid files: 1
//!
//! Errors found:
//!   - authors/yanka-kupala/works/kurgan/content/en.json: author_id mismatch: x != yanka-kupala
//!
//! ✗ 1 violation(s)
//! ```

use crate::catalog::{BuildReport, RegistryStatus};
use crate::validate::ValidationReport;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn registry_label(status: RegistryStatus) -> &'static str {
    match status {
        RegistryStatus::Copied => "copied",
        RegistryStatus::Preserved => "preserved from previous build",
        RegistryStatus::Missing => "missing",
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format the outcome of a build: per-document tally, skips, catalog summary.
pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Documents".to_string());
    for (i, doc) in report.documents.iter().enumerate() {
        let source = doc.source.display();
        match &doc.result {
            Ok(()) => lines.push(format!("{} \u{2713} {}", format_index(i + 1), source)),
            Err(e) => {
                lines.push(format!("{} \u{2717} {}", format_index(i + 1), source));
                lines.push(format!("{}{}", indent(1), e));
            }
        }
    }

    if !report.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for skip in &report.skipped {
            lines.push(format!("{}{}: {}", indent(1), skip.path.display(), skip.reason));
        }
    }

    let stats = &report.index.statistics;
    lines.push(String::new());
    lines.push("Catalog".to_string());
    lines.push(format!(
        "{}{} authors, {} works, {} translations",
        indent(1),
        stats.total_authors,
        stats.total_works,
        stats.total_translations
    ));
    if !stats.languages_with_content.is_empty() {
        let languages: Vec<&str> = stats
            .languages_with_content
            .iter()
            .map(String::as_str)
            .collect();
        lines.push(format!("{}Languages: {}", indent(1), languages.join(", ")));
    }
    lines.push(format!(
        "{}Registry: {}",
        indent(1),
        registry_label(report.registry)
    ));

    lines.push(String::new());
    lines.push(format!(
        "Converted {} file(s), {} failed, {} skipped",
        report.converted_count(),
        report.failed_count(),
        report.skipped.len()
    ));
    lines.push(format!("Fingerprint: {}", report.fingerprint));

    lines
}

/// Print build output to stdout.
pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Validate
// ============================================================================

/// Format a validation report: counts, every violation, final verdict.
pub fn format_validation_output(report: &ValidationReport, fingerprint: Option<&str>) -> Vec<String> {
    let mut lines = vec![
        format!("Total files checked: {}", report.files_checked),
        format!("Invalid files: {}", report.invalid_files),
    ];
    if let Some(fp) = fingerprint {
        lines.push(format!("Fingerprint: {}", fp));
    }

    lines.push(String::new());
    if report.is_valid() {
        lines.push("\u{2713} All files are valid!".to_string());
    } else {
        lines.push("Errors found:".to_string());
        for violation in &report.violations {
            lines.push(format!("  - {}", violation));
        }
        lines.push(String::new());
        lines.push(format!("\u{2717} {} violation(s)", report.violations.len()));
    }
    lines
}

/// Print validation output to stdout.
pub fn print_validation_output(report: &ValidationReport, fingerprint: Option<&str>) {
    for line in format_validation_output(report, fingerprint) {
        println!("{}", line);
    }
}
