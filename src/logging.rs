//! Run log for structlint
//!
//! Appends one JSON object per run (violations found, corrections applied)
//! to a JSON Lines file for later analysis.

use crate::models::{CorrectionResult, LintResult, Severity};
use crate::text::StringView;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const MAX_SOURCE_LINE: usize = 200;

/// A single log entry representing one run
#[derive(Debug, Serialize, Deserialize)]
pub struct RunLogEntry {
    /// Unix timestamp of when the run happened
    pub timestamp: i64,
    /// ISO 8601 formatted date string
    pub datetime: String,
    /// `lint` or `autocorrect`
    pub command: String,
    pub files_scanned: usize,
    pub total_violations: usize,
    pub error_count: usize,
    pub warning_count: usize,
    /// Files that could not be read or parsed
    pub failed_files: usize,
    pub violations: Vec<ViolationLogEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corrections: Vec<CorrectionLogEntry>,
    /// Rules active for this run
    pub enabled_rules: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViolationLogEntry {
    pub rule_id: String,
    pub file_path: String,
    pub line: usize,
    pub character: usize,
    pub severity: Severity,
    pub message: String,
    /// Source line content (truncated if too long)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_line: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CorrectionLogEntry {
    pub rule_id: String,
    pub file_path: String,
    pub line: usize,
    pub character: usize,
    pub replacement: String,
}

impl RunLogEntry {
    fn empty(command: &str, files_scanned: usize, enabled_rules: Vec<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            timestamp: now.timestamp(),
            datetime: now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            command: command.to_string(),
            files_scanned,
            total_violations: 0,
            error_count: 0,
            warning_count: 0,
            failed_files: 0,
            violations: Vec::new(),
            corrections: Vec::new(),
            enabled_rules,
        }
    }

    /// Create a new log entry from lint results
    pub fn from_lint_results(results: &[LintResult], enabled_rules: Vec<String>) -> Self {
        let mut entry = Self::empty("lint", results.len(), enabled_rules);

        for result in results {
            if result.error.is_some() {
                entry.failed_files += 1;
            }
            for v in &result.violations {
                match v.severity {
                    Severity::Error => entry.error_count += 1,
                    Severity::Warning => entry.warning_count += 1,
                }

                entry.violations.push(ViolationLogEntry {
                    rule_id: v.rule_id.clone(),
                    file_path: result.file_path.clone(),
                    line: v.location.line,
                    character: v.location.character,
                    severity: v.severity,
                    message: v.message.clone(),
                    source_line: read_source_line(&result.file_path, v.location.line)
                        .map(|line| truncate_source_line(&line, MAX_SOURCE_LINE)),
                });
            }
        }

        entry.total_violations = entry.violations.len();
        entry
    }

    /// Create a new log entry from correction results
    pub fn from_correction_results(results: &[CorrectionResult], enabled_rules: Vec<String>) -> Self {
        let mut entry = Self::empty("autocorrect", results.len(), enabled_rules);

        for result in results {
            if result.error.is_some() {
                entry.failed_files += 1;
            }
            entry
                .corrections
                .extend(result.applied.iter().map(|c| CorrectionLogEntry {
                    rule_id: c.rule_id.clone(),
                    file_path: result.file_path.clone(),
                    line: c.location.line,
                    character: c.location.character,
                    replacement: c.replacement.clone(),
                }));
        }

        entry
    }
}

/// Logger that appends run entries to a file
pub struct RunLogger {
    writer: BufWriter<File>,
    log_path: PathBuf,
}

impl RunLogger {
    /// Open `log_path` for appending, creating it and its parent directories
    /// if needed
    pub fn new(log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(log_path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            log_path: log_path.to_path_buf(),
        })
    }

    pub fn log(&mut self, entry: &RunLogEntry) -> std::io::Result<()> {
        let json = serde_json::to_string(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{}", json)?;
        self.writer.flush()
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

/// Read a specific line from a file
fn read_source_line(file_path: &str, line_num: usize) -> Option<String> {
    let view = StringView::new(std::fs::read_to_string(file_path).ok()?);
    view.line(line_num)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Truncate source line if too long
fn truncate_source_line(line: &str, max_chars: usize) -> String {
    match line.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &line[..cut]),
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Correction, Location, StyleViolation};
    use crate::text::CharRange;
    use tempfile::TempDir;

    fn location(line: usize, character: usize) -> Location {
        Location {
            file: Some("Foo.swift".to_string()),
            line,
            character,
            offset: 0,
        }
    }

    #[test]
    fn test_lint_log_entry_creation() {
        let result = LintResult {
            file_path: "Foo.swift".to_string(),
            violations: vec![StyleViolation {
                rule_id: "discouraged_struct_runtime_let".to_string(),
                rule_name: "Discouraged Struct Runtime Let".to_string(),
                severity: Severity::Error,
                message: "Test message".to_string(),
                location: location(2, 5),
            }],
            error: None,
        };
        let broken = LintResult::with_error("Bar.swift".to_string(), "parse error".to_string());

        let entry = RunLogEntry::from_lint_results(&[result, broken], vec![]);

        assert_eq!(entry.command, "lint");
        assert_eq!(entry.files_scanned, 2);
        assert_eq!(entry.failed_files, 1);
        assert_eq!(entry.total_violations, 1);
        assert_eq!(entry.error_count, 1);
        assert_eq!(entry.warning_count, 0);
        assert_eq!(entry.violations[0].line, 2);
        // The file does not exist on disk
        assert!(entry.violations[0].source_line.is_none());
    }

    #[test]
    fn test_correction_log_entry_creation() {
        let result = CorrectionResult {
            file_path: "Foo.swift".to_string(),
            applied: vec![Correction {
                rule_id: "discouraged_struct_runtime_let".to_string(),
                rule_index: 0,
                range: CharRange::new(17, 3),
                replacement: "var".to_string(),
                location: location(2, 5),
            }],
            ..Default::default()
        };

        let entry = RunLogEntry::from_correction_results(&[result], vec!["discouraged_struct_runtime_let".to_string()]);
        assert_eq!(entry.command, "autocorrect");
        assert_eq!(entry.corrections.len(), 1);
        assert_eq!(entry.corrections[0].replacement, "var");
        assert_eq!(entry.enabled_rules.len(), 1);
    }

    #[test]
    fn test_logger_creation_and_write() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("logs").join("structlint.jsonl");

        let mut logger = RunLogger::new(&log_path).unwrap();
        assert_eq!(logger.log_path(), log_path.as_path());

        logger.log(&RunLogEntry::from_lint_results(&[], vec![])).unwrap();
        logger.log(&RunLogEntry::from_correction_results(&[], vec![])).unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: RunLogEntry = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.command, "autocorrect");
        assert!(parsed.datetime.ends_with('Z'));
    }

    #[test]
    fn test_source_line_is_read_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Foo.swift");
        std::fs::write(&path, "struct Foo {\n    let bar: Int\n}").unwrap();
        let path = path.to_string_lossy().to_string();

        assert_eq!(read_source_line(&path, 2), Some("let bar: Int".to_string()));
        assert_eq!(read_source_line(&path, 9), None);
    }

    #[test]
    fn test_truncate_source_line() {
        assert_eq!(truncate_source_line("short line", 100), "short line");

        let long = "é".repeat(250);
        let truncated = truncate_source_line(&long, 200);
        assert_eq!(truncated.chars().count(), 203); // 200 chars + "..."
        assert!(truncated.ends_with("..."));
    }
}
