//! structlint: a structure-aware linter and autocorrector for Swift
//!
//! Rules inspect the declaration tree of a file (kinds, byte ranges, body
//! lengths) rather than its tokens:
//! - `text` maps structure byte offsets onto characters
//! - `structure` holds the tree, its producers and its traversal
//! - `engine` runs an ordered rule set and `correction` applies the fixes

pub mod commands;
pub mod config;
pub mod correction;
pub mod engine;
pub mod logging;
pub mod models;
pub mod reporter;
pub mod rules;
pub mod structure;
pub mod text;

use engine::Linter;
use models::{CorrectionResult, LintResult};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use structure::{sourcekitten, SourceFile, StructureParser};
use walkdir::WalkDir;

const SWIFT_EXTENSION: &str = "swift";

fn source_file(file_path: &str, source: &str, parser: &dyn StructureParser) -> Result<SourceFile, String> {
    let file = SourceFile::parse(Some(PathBuf::from(file_path)), source, parser);
    match file.parse_error() {
        Some(e) => Err(format!("Parse error: {}", e)),
        None => Ok(file),
    }
}

/// Lint source code and return the results
pub fn lint_source(
    file_path: &str,
    source: &str,
    linter: &Linter,
    parser: &dyn StructureParser,
) -> LintResult {
    let file = match source_file(file_path, source, parser) {
        Ok(file) => file,
        Err(e) => return LintResult::with_error(file_path.to_string(), e),
    };

    let mut result = LintResult::new(file_path.to_string());
    result.violations = linter.lint(&file);
    result
}

/// Lint a single file and return the results
pub fn lint_file(file_path: &Path, linter: &Linter, parser: &dyn StructureParser) -> LintResult {
    let path_str = file_path.to_string_lossy().to_string();

    let source = match std::fs::read_to_string(file_path) {
        Ok(s) => s,
        Err(e) => return LintResult::with_error(path_str, format!("Failed to read file: {}", e)),
    };

    lint_source(&path_str, &source, linter, parser)
}

/// Lint a file against a structure tree printed by `sourcekitten structure`
pub fn lint_file_with_structure(file_path: &Path, structure_path: &Path, linter: &Linter) -> LintResult {
    let path_str = file_path.to_string_lossy().to_string();

    let (source, json) = match (
        std::fs::read_to_string(file_path),
        std::fs::read_to_string(structure_path),
    ) {
        (Ok(source), Ok(json)) => (source, json),
        (Err(e), _) | (_, Err(e)) => {
            return LintResult::with_error(path_str, format!("Failed to read file: {}", e))
        }
    };

    let root = match sourcekitten::parse_structure(&json) {
        Ok(root) => root,
        Err(e) => return LintResult::with_error(path_str, format!("Parse error: {}", e)),
    };

    let file = SourceFile::with_structure(Some(file_path.to_path_buf()), source, root);
    let mut result = LintResult::new(path_str);
    result.violations = linter.lint(&file);
    result
}

/// Correct source code in memory
pub fn correct_source(
    file_path: &str,
    source: &str,
    linter: &Linter,
    parser: &dyn StructureParser,
) -> CorrectionResult {
    let file = match source_file(file_path, source, parser) {
        Ok(file) => file,
        Err(e) => return CorrectionResult::with_error(file_path.to_string(), e),
    };

    let outcome = linter.correct(&file);
    CorrectionResult {
        file_path: file_path.to_string(),
        corrected_contents: outcome.is_changed().then_some(outcome.contents),
        applied: outcome.applied,
        dropped: outcome.dropped,
        error: None,
    }
}

/// Correct a single file, writing it back when anything changed
pub fn correct_file(file_path: &Path, linter: &Linter, parser: &dyn StructureParser) -> CorrectionResult {
    let path_str = file_path.to_string_lossy().to_string();

    let source = match std::fs::read_to_string(file_path) {
        Ok(s) => s,
        Err(e) => return CorrectionResult::with_error(path_str, format!("Failed to read file: {}", e)),
    };

    let result = correct_source(&path_str, &source, linter, parser);
    if let Some(contents) = &result.corrected_contents {
        if let Err(e) = std::fs::write(file_path, contents) {
            return CorrectionResult::with_error(path_str, format!("Failed to write file: {}", e));
        }
        log::info!("{}: applied {} correction(s)", path_str, result.applied.len());
    }
    result
}

fn is_swift_file(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == SWIFT_EXTENSION)
}

/// Collect Swift files from paths
pub fn collect_swift_files(paths: &[String], exclude_patterns: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        let p = Path::new(path);
        if p.is_file() {
            if is_swift_file(p) {
                files.push(p.to_path_buf());
            }
        } else if p.is_dir() {
            for entry in WalkDir::new(p)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !should_exclude(e.path(), exclude_patterns))
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if path.is_file() && is_swift_file(path) {
                    files.push(path.to_path_buf());
                }
            }
        } else {
            log::warn!("{}: no such file or directory", path);
        }
    }

    files
}

fn should_exclude(path: &Path, patterns: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    patterns.iter().any(|pattern| {
        if pattern.contains('/') {
            path.ends_with(pattern)
        } else {
            name == pattern.as_str()
        }
    })
}

/// Lint multiple files in parallel
pub fn lint_files_parallel(
    files: &[PathBuf],
    linter: &Linter,
    parser: &dyn StructureParser,
) -> Vec<LintResult> {
    files
        .par_iter()
        .map(|file| lint_file(file, linter, parser))
        .collect()
}

/// Correct multiple files in parallel
pub fn correct_files_parallel(
    files: &[PathBuf],
    linter: &Linter,
    parser: &dyn StructureParser,
) -> Vec<CorrectionResult> {
    files
        .par_iter()
        .map(|file| correct_file(file, linter, parser))
        .collect()
}
