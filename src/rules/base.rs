//! Base traits for all rules
//!
//! Every rule detects; some rules can also correct what they detect. The
//! correction capability is a separate trait reached through
//! [`Rule::as_correctable`], so a rule set stays a flat list of
//! `Box<dyn Rule>`.

use crate::models::Severity;
use crate::structure::{DeclarationKind, SourceFile, StructureNode};
use crate::text::ByteRange;
use serde::Serialize;

/// Rule category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Idiomatic,
    Lint,
    Metrics,
    Performance,
    Style,
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RuleKind::Idiomatic => "idiomatic",
            RuleKind::Lint => "lint",
            RuleKind::Metrics => "metrics",
            RuleKind::Performance => "performance",
            RuleKind::Style => "style",
        };
        f.write_str(name)
    }
}

/// Static metadata describing a rule.
///
/// Triggering examples mark every expected violation with `↓` placed right
/// before the violating text. Corrections pair an input with its expected
/// rewrite.
#[derive(Debug, Serialize)]
pub struct RuleDescription {
    pub identifier: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: RuleKind,
    /// Opt-in rules only run when the configuration names them
    pub opt_in: bool,
    pub non_triggering_examples: &'static [&'static str],
    pub triggering_examples: &'static [&'static str],
    pub corrections: &'static [(&'static str, &'static str)],
}

/// Base trait that all rules must implement
pub trait Rule: Send + Sync {
    fn description(&self) -> &'static RuleDescription;

    /// The unique identifier for this rule (e.g., "discouraged_struct_runtime_let")
    fn rule_id(&self) -> &'static str {
        self.description().identifier
    }

    /// Severity reported for this rule's violations
    fn severity(&self) -> Severity;

    fn set_severity(&mut self, severity: Severity);

    /// Byte ranges of the violations found at `node`.
    ///
    /// Must be pure, and must return nothing when the node lacks an attribute
    /// the rule needs.
    fn detect(
        &self,
        file: &SourceFile,
        kind: DeclarationKind,
        node: &StructureNode,
        parent: Option<&StructureNode>,
    ) -> Vec<ByteRange>;

    /// Message reported for a detected range
    fn message(&self, _file: &SourceFile, _range: ByteRange) -> String {
        self.description().description.to_string()
    }

    /// The correction capability, for rules that have one
    fn as_correctable(&self) -> Option<&dyn CorrectableRule> {
        None
    }
}

/// Correction capability of a rule.
///
/// Both methods are only ever called with ranges derived from the rule's own
/// `detect` output: `correction_range` with a detected range, `replacement`
/// with what `correction_range` returned.
pub trait CorrectableRule: Send + Sync {
    /// The part of a detected range that gets rewritten. Defaults to the whole
    /// detected range; rules that report a wide range but edit a single token
    /// narrow it here. A range reaching outside `detected` is skipped.
    fn correction_range(&self, _file: &SourceFile, detected: ByteRange) -> Option<ByteRange> {
        Some(detected)
    }

    /// Replacement text for a correction range
    fn replacement(&self, file: &SourceFile, range: ByteRange) -> Option<String>;
}
