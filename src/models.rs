//! Core data models for structlint

use crate::text::{CharRange, StringView};
use serde::{Deserialize, Serialize};

/// Severity level of a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A position in a file, in characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: Option<String>,
    /// 1-based line
    pub line: usize,
    /// 1-based column, counted in characters
    pub character: usize,
    /// 0-based character offset from the start of the file
    pub offset: usize,
}

impl Location {
    /// Locate a character offset; `None` if it lies past the end of `view`
    pub fn from_char_offset(file: Option<String>, view: &StringView, offset: usize) -> Option<Self> {
        let (line, character) = view.line_and_character(offset)?;
        Some(Self {
            file,
            line,
            character,
            offset,
        })
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file.as_deref().unwrap_or("<memory>"),
            self.line,
            self.character
        )
    }
}

/// A violation detected by a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleViolation {
    pub rule_id: String,
    pub rule_name: String,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
}

/// A textual replacement proposed by a correctable rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub rule_id: String,
    /// Position of the rule in the active rule set; lower wins ties
    pub rule_index: usize,
    /// Range in the original text
    pub range: CharRange,
    pub replacement: String,
    pub location: Location,
}

/// Result of linting a single file
#[derive(Debug, Default, Serialize)]
pub struct LintResult {
    pub file_path: String,
    pub violations: Vec<StyleViolation>,
    pub error: Option<String>,
}

impl LintResult {
    pub fn new(file_path: String) -> Self {
        Self {
            file_path,
            violations: Vec::new(),
            error: None,
        }
    }

    pub fn with_error(file_path: String, error: String) -> Self {
        Self {
            file_path,
            violations: Vec::new(),
            error: Some(error),
        }
    }
}

/// Result of correcting a single file
#[derive(Debug, Default, Serialize)]
pub struct CorrectionResult {
    pub file_path: String,
    /// Corrections applied to the text, in document order
    pub applied: Vec<Correction>,
    /// Corrections that collided with an applied one
    pub dropped: Vec<Correction>,
    /// The rewritten text, when anything was applied
    #[serde(skip)]
    pub corrected_contents: Option<String>,
    pub error: Option<String>,
}

impl CorrectionResult {
    pub fn with_error(file_path: String, error: String) -> Self {
        Self {
            file_path,
            error: Some(error),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_char_offset() {
        let view = StringView::new("struct Foo {\n    let bar: Int\n}");
        let location = Location::from_char_offset(Some("Foo.swift".to_string()), &view, 17).unwrap();
        assert_eq!(location.line, 2);
        assert_eq!(location.character, 5);
        assert_eq!(location.to_string(), "Foo.swift:2:5");

        assert!(Location::from_char_offset(None, &view, 100).is_none());
    }

    #[test]
    fn test_severity_serialization() {
        assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), "\"error\"");
        let parsed: Severity = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(parsed, Severity::Warning);
        assert_eq!(Severity::Warning.to_string(), "warning");
    }
}
