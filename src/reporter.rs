//! Output formatting for lint and correction results

use crate::models::{CorrectionResult, LintResult, Severity, StyleViolation};
use colored::*;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}' (expected text or json)", other)),
        }
    }
}

/// Violation counts over a whole run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub files: usize,
    pub failed_files: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl Summary {
    pub fn from_results(results: &[LintResult]) -> Self {
        let mut summary = Summary {
            files: results.len(),
            ..Default::default()
        };
        for result in results {
            if result.error.is_some() {
                summary.failed_files += 1;
            }
            for v in &result.violations {
                match v.severity {
                    Severity::Error => summary.errors += 1,
                    Severity::Warning => summary.warnings += 1,
                }
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.errors + self.warnings
    }
}

/// `path:line:col: warning: Name Violation: message (rule_id)`
pub fn format_violation(v: &StyleViolation) -> String {
    format!(
        "{}: {}: {} Violation: {} ({})",
        v.location, v.severity, v.rule_name, v.message, v.rule_id
    )
}

fn colorize_violation(v: &StyleViolation) -> String {
    let severity = match v.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
    };
    format!(
        "{}: {}: {} Violation: {} ({})",
        v.location.to_string().bold(),
        severity,
        v.rule_name,
        v.message,
        v.rule_id.cyan()
    )
}

pub fn print_text(results: &[LintResult]) {
    for result in results {
        if let Some(error) = &result.error {
            eprintln!("{}: {}", result.file_path.red(), error);
            continue;
        }
        for v in &result.violations {
            if colored::control::SHOULD_COLORIZE.should_colorize() {
                println!("{}", colorize_violation(v));
            } else {
                println!("{}", format_violation(v));
            }
        }
    }
}

#[derive(Serialize)]
struct JsonViolation<'a> {
    file: &'a str,
    line: usize,
    character: usize,
    severity: Severity,
    rule_id: &'a str,
    rule_name: &'a str,
    reason: &'a str,
}

pub fn render_json(results: &[LintResult]) -> serde_json::Result<String> {
    let violations: Vec<JsonViolation> = results
        .iter()
        .flat_map(|result| {
            result.violations.iter().map(move |v| JsonViolation {
                file: &result.file_path,
                line: v.location.line,
                character: v.location.character,
                severity: v.severity,
                rule_id: &v.rule_id,
                rule_name: &v.rule_name,
                reason: &v.message,
            })
        })
        .collect();
    serde_json::to_string_pretty(&violations)
}

pub fn print_json(results: &[LintResult]) {
    match render_json(results) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("{}: failed to render JSON: {}", "error".red().bold(), e),
    }
}

/// One line per applied correction
pub fn print_corrections(results: &[CorrectionResult]) {
    for result in results {
        if let Some(error) = &result.error {
            eprintln!("{}: {}", result.file_path.red(), error);
            continue;
        }
        for c in &result.applied {
            println!("{} Corrected {}", c.location.to_string().bold(), c.rule_id.cyan());
        }
        for c in &result.dropped {
            println!(
                "{} {} {}",
                c.location.to_string().dimmed(),
                "Skipped".yellow(),
                c.rule_id.cyan()
            );
        }
    }
}
