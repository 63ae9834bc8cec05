//! Running a rule set over one file
//!
//! Each rule walks the shared, immutable structure tree on its own; rules
//! run in parallel and their results are concatenated in rule order, each
//! rule's own results in traversal order.

use crate::commands::DisableCommands;
use crate::correction::{Applied, CorrectionApplier};
use crate::models::{Correction, Location, StyleViolation};
use crate::rules::base::{CorrectableRule, Rule};
use crate::structure::{traverse_with_parent_depth_first, SourceFile, StructureNode};
use crate::text::ByteRange;
use rayon::prelude::*;

/// Result of correcting one file in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionOutcome {
    pub contents: String,
    pub applied: Vec<Correction>,
    pub dropped: Vec<Correction>,
}

impl CorrectionOutcome {
    pub fn is_changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

impl From<Applied> for CorrectionOutcome {
    fn from(applied: Applied) -> Self {
        Self {
            contents: applied.contents,
            applied: applied.applied,
            dropped: applied.dropped,
        }
    }
}

/// An ordered rule set
pub struct Linter {
    rules: Vec<Box<dyn Rule>>,
}

impl Linter {
    /// Rule order decides merge order and which correction wins a tie
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Violations of every rule, rule order first, then traversal order
    pub fn lint(&self, file: &SourceFile) -> Vec<StyleViolation> {
        let Some(root) = file.structure() else {
            return vec![];
        };
        let commands = DisableCommands::parse(file.contents());

        let per_rule: Vec<Vec<StyleViolation>> = self
            .rules
            .par_iter()
            .map(|rule| violations(file, root, rule.as_ref(), &commands))
            .collect();
        per_rule.into_iter().flatten().collect()
    }

    /// Corrections of every correctable rule, in the same order as `lint`
    pub fn corrections(&self, file: &SourceFile) -> Vec<Correction> {
        let Some(root) = file.structure() else {
            return vec![];
        };
        let commands = DisableCommands::parse(file.contents());

        let per_rule: Vec<Vec<Correction>> = self
            .rules
            .par_iter()
            .enumerate()
            .map(|(rule_index, rule)| match rule.as_correctable() {
                Some(correctable) => corrections(
                    file,
                    root,
                    rule.as_ref(),
                    correctable,
                    rule_index,
                    &commands,
                ),
                None => vec![],
            })
            .collect();
        per_rule.into_iter().flatten().collect()
    }

    /// Compute and apply every correction for `file`
    pub fn correct(&self, file: &SourceFile) -> CorrectionOutcome {
        CorrectionApplier::apply(file.view(), self.corrections(file)).into()
    }
}

fn detect(file: &SourceFile, root: &StructureNode, rule: &dyn Rule) -> Vec<ByteRange> {
    traverse_with_parent_depth_first(root, |parent, node| match node.kind() {
        Some(kind) => rule.detect(file, kind, node, parent),
        None => vec![],
    })
}

fn file_label(file: &SourceFile) -> Option<String> {
    file.path().map(|p| p.to_string_lossy().to_string())
}

/// Location of the first character of a byte range, or `None` (logged) when
/// the range does not map onto the text
fn locate(file: &SourceFile, rule: &dyn Rule, range: ByteRange) -> Option<Location> {
    let chars = match file.view().byte_range_to_char_range(range) {
        Ok(chars) => chars,
        Err(e) => {
            log::warn!("{}: skipping {} result: {}", file.display_path(), rule.rule_id(), e);
            return None;
        }
    };
    Location::from_char_offset(file_label(file), file.view(), chars.location)
}

fn violations(
    file: &SourceFile,
    root: &StructureNode,
    rule: &dyn Rule,
    commands: &DisableCommands,
) -> Vec<StyleViolation> {
    let description = rule.description();
    detect(file, root, rule)
        .into_iter()
        .filter_map(|range| {
            let location = locate(file, rule, range)?;
            if commands.is_disabled(location.line, description.identifier) {
                return None;
            }
            Some(StyleViolation {
                rule_id: description.identifier.to_string(),
                rule_name: description.name.to_string(),
                severity: rule.severity(),
                message: rule.message(file, range),
                location,
            })
        })
        .collect()
}

fn corrections(
    file: &SourceFile,
    root: &StructureNode,
    rule: &dyn Rule,
    correctable: &dyn CorrectableRule,
    rule_index: usize,
    commands: &DisableCommands,
) -> Vec<Correction> {
    detect(file, root, rule)
        .into_iter()
        .filter_map(|detected| {
            locate(file, rule, detected)?;
            let bytes = correctable.correction_range(file, detected)?;
            if !detected.contains(&bytes) {
                log::warn!(
                    "{}: {} correction range escapes its violation, skipping",
                    file.display_path(),
                    rule.rule_id()
                );
                return None;
            }
            let replacement = correctable.replacement(file, bytes)?;
            let range = match file.view().byte_range_to_char_range(bytes) {
                Ok(range) => range,
                Err(e) => {
                    log::warn!("{}: skipping {} correction: {}", file.display_path(), rule.rule_id(), e);
                    return None;
                }
            };
            let location = Location::from_char_offset(file_label(file), file.view(), range.location)?;
            if commands.is_disabled(location.line, rule.rule_id()) {
                return None;
            }
            Some(Correction {
                rule_id: rule.rule_id().to_string(),
                rule_index,
                range,
                replacement,
                location,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use crate::rules::base::{RuleDescription, RuleKind};
    use crate::rules::discouraged_struct_runtime_let::DiscouragedStructRuntimeLetRule;
    use crate::structure::scanner::DeclarationScanner;
    use crate::structure::{DeclarationKind, ParseError, StructureParser};
    use crate::text::CharRange;

    static STRUCT_NAME_DESCRIPTION: RuleDescription = RuleDescription {
        identifier: "struct_name",
        name: "Struct Name",
        description: "Rewrites every struct declaration keyword.",
        kind: RuleKind::Style,
        opt_in: false,
        non_triggering_examples: &[],
        triggering_examples: &[],
        corrections: &[],
    };

    /// Reports every struct and rewrites its whole text
    struct StructNameRule;

    impl Rule for StructNameRule {
        fn description(&self) -> &'static RuleDescription {
            &STRUCT_NAME_DESCRIPTION
        }

        fn severity(&self) -> Severity {
            Severity::Error
        }

        fn set_severity(&mut self, _severity: Severity) {}

        fn detect(
            &self,
            _file: &SourceFile,
            kind: DeclarationKind,
            node: &StructureNode,
            _parent: Option<&StructureNode>,
        ) -> Vec<ByteRange> {
            match (kind, node.byte_range()) {
                (DeclarationKind::Struct, Some(range)) => vec![range],
                _ => vec![],
            }
        }

        fn as_correctable(&self) -> Option<&dyn CorrectableRule> {
            Some(self)
        }
    }

    impl CorrectableRule for StructNameRule {
        fn replacement(&self, _file: &SourceFile, _range: ByteRange) -> Option<String> {
            Some("struct Replaced {}".to_string())
        }
    }

    fn file(code: &str) -> SourceFile {
        SourceFile::parse(None, code, &DeclarationScanner::new())
    }

    fn runtime_let_linter() -> Linter {
        Linter::new(vec![Box::new(DiscouragedStructRuntimeLetRule::new())])
    }

    #[test]
    fn test_lint_reports_declaration_start() {
        let violations = runtime_let_linter().lint(&file("struct Foo {\n    let bar: Int\n}"));
        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.rule_id, "discouraged_struct_runtime_let");
        assert_eq!(v.rule_name, "Discouraged Struct Runtime Let");
        assert_eq!(v.severity, Severity::Warning);
        assert_eq!((v.location.line, v.location.character), (2, 5));
        assert_eq!(v.location.offset, 17);
    }

    #[test]
    fn test_locations_are_in_characters() {
        let violations = runtime_let_linter().lint(&file("// café 🦀\nstruct Foo {\n    let bar: Int\n}"));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location.offset, 27);
        assert_eq!((violations[0].location.line, violations[0].location.character), (3, 5));
    }

    #[test]
    fn test_correct_round_trip() {
        let linter = runtime_let_linter();
        let outcome = linter.correct(&file("struct Foo {\n    let bar: Int\n}"));
        assert!(outcome.is_changed());
        assert_eq!(outcome.contents, "struct Foo {\n    var bar: Int\n}");
        assert_eq!(outcome.applied[0].range, CharRange::new(17, 3));

        let again = linter.correct(&file(&outcome.contents));
        assert!(!again.is_changed());
        assert_eq!(again.contents, outcome.contents);
    }

    #[test]
    fn test_file_without_structure_yields_nothing() {
        struct Failing;
        impl StructureParser for Failing {
            fn parse(&self, _source: &str) -> Result<StructureNode, ParseError> {
                Err(ParseError::Unbalanced {
                    delimiter: '{',
                    offset: 0,
                })
            }
        }

        let linter = runtime_let_linter();
        let file = SourceFile::parse(None, "struct Foo {\n    let bar: Int\n}", &Failing);
        assert!(linter.lint(&file).is_empty());
        assert!(linter.corrections(&file).is_empty());
        assert_eq!(linter.correct(&file).contents, file.contents());
    }

    #[test]
    fn test_results_merge_in_rule_order() {
        let code = "struct A {\n    let a: Int\n}\nstruct B {\n    let b: Int\n}";
        let linter = Linter::new(vec![
            Box::new(DiscouragedStructRuntimeLetRule::new()),
            Box::new(StructNameRule),
        ]);
        let ids: Vec<_> = linter
            .lint(&file(code))
            .into_iter()
            .map(|v| (v.rule_id, v.location.line))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("discouraged_struct_runtime_let".to_string(), 2),
                ("discouraged_struct_runtime_let".to_string(), 5),
                ("struct_name".to_string(), 1),
                ("struct_name".to_string(), 4),
            ]
        );
    }

    #[test]
    fn test_conflicting_corrections_first_rule_wins() {
        let code = "struct Foo {\n    let bar: Int\n}";
        let linter = Linter::new(vec![
            Box::new(StructNameRule),
            Box::new(DiscouragedStructRuntimeLetRule::new()),
        ]);
        let outcome = linter.correct(&file(code));
        assert_eq!(outcome.contents, "struct Replaced {}");
        assert_eq!(outcome.applied.len(), 1);
        assert_eq!(outcome.dropped.len(), 1);
        assert_eq!(outcome.dropped[0].rule_id, "discouraged_struct_runtime_let");
    }

    #[test]
    fn test_disable_commands_filter_results() {
        let code = "struct Foo {\n    let bar: Int // structlint:disable:this discouraged_struct_runtime_let\n    let baz: Int\n}";
        let linter = runtime_let_linter();
        let file = file(code);

        let lines: Vec<_> = linter.lint(&file).iter().map(|v| v.location.line).collect();
        assert_eq!(lines, vec![3]);

        let outcome = linter.correct(&file);
        assert_eq!(outcome.applied.len(), 1);
        assert!(outcome.contents.contains("let bar: Int"));
        assert!(outcome.contents.contains("var baz: Int"));
    }

    #[test]
    fn test_invalid_ranges_are_skipped() {
        // A hand-built tree whose struct range points inside 'é'
        let code = "é struct";
        let root = StructureNode::root(vec![StructureNode::new(
            Some(DeclarationKind::Struct),
            Some(ByteRange::new(1, 2)),
        )]);
        let file = SourceFile::with_structure(None, code, root);
        let linter = Linter::new(vec![Box::new(StructNameRule)]);
        assert!(linter.lint(&file).is_empty());
        assert!(linter.corrections(&file).is_empty());
    }

    #[test]
    fn test_correction_outside_violation_is_skipped() {
        /// Reports every struct but tries to rewrite the whole file
        struct Escaping;

        impl Rule for Escaping {
            fn description(&self) -> &'static RuleDescription {
                &STRUCT_NAME_DESCRIPTION
            }

            fn severity(&self) -> Severity {
                Severity::Warning
            }

            fn set_severity(&mut self, _severity: Severity) {}

            fn detect(
                &self,
                file: &SourceFile,
                kind: DeclarationKind,
                node: &StructureNode,
                parent: Option<&StructureNode>,
            ) -> Vec<ByteRange> {
                StructNameRule.detect(file, kind, node, parent)
            }

            fn as_correctable(&self) -> Option<&dyn CorrectableRule> {
                Some(self)
            }
        }

        impl CorrectableRule for Escaping {
            fn correction_range(&self, file: &SourceFile, _detected: ByteRange) -> Option<ByteRange> {
                Some(ByteRange::new(0, file.contents().len()))
            }

            fn replacement(&self, _file: &SourceFile, _range: ByteRange) -> Option<String> {
                Some(String::new())
            }
        }

        let file = file("// header\nstruct Foo {}\n");
        let linter = Linter::new(vec![Box::new(Escaping)]);
        assert_eq!(linter.lint(&file).len(), 1);
        assert!(linter.corrections(&file).is_empty());
    }

    #[test]
    fn test_overflowing_detection_is_skipped() {
        /// Reports a range whose end does not fit in a usize
        struct Overflowing;

        impl Rule for Overflowing {
            fn description(&self) -> &'static RuleDescription {
                &STRUCT_NAME_DESCRIPTION
            }

            fn severity(&self) -> Severity {
                Severity::Warning
            }

            fn set_severity(&mut self, _severity: Severity) {}

            fn detect(
                &self,
                _file: &SourceFile,
                kind: DeclarationKind,
                _node: &StructureNode,
                _parent: Option<&StructureNode>,
            ) -> Vec<ByteRange> {
                match kind {
                    DeclarationKind::Struct => vec![ByteRange::new(1, usize::MAX)],
                    _ => vec![],
                }
            }

            fn as_correctable(&self) -> Option<&dyn CorrectableRule> {
                Some(self)
            }
        }

        impl CorrectableRule for Overflowing {
            fn replacement(&self, _file: &SourceFile, _range: ByteRange) -> Option<String> {
                Some(String::new())
            }
        }

        let file = file("struct Foo {}");
        let linter = Linter::new(vec![Box::new(Overflowing)]);
        assert!(linter.lint(&file).is_empty());
        assert!(linter.corrections(&file).is_empty());
        assert!(!linter.correct(&file).is_changed());
    }

    #[test]
    fn test_lint_is_deterministic() {
        let code = "struct A {\n    let a: Int\n    let b: Int\n}\nstruct B {\n    let c: Int\n}";
        let linter = Linter::new(vec![
            Box::new(StructNameRule),
            Box::new(DiscouragedStructRuntimeLetRule::new()),
        ]);
        let file = file(code);
        let first = linter.lint(&file);
        for _ in 0..10 {
            assert_eq!(linter.lint(&file), first);
        }
    }
}
