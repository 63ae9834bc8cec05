//! discouraged_struct_runtime_let
//!
//! A stored `let` in a struct with no initializer gets its value at runtime,
//! per instance. Such properties should be `var`, or have a compile-time
//! value.
//!
//! Detection reports the whole declaration; correction rewrites only the
//! `let` keyword to `var`.

use crate::models::Severity;
use crate::rules::base::{CorrectableRule, Rule, RuleDescription, RuleKind};
use crate::structure::{DeclarationKind, SourceFile, StructureNode};
use crate::text::ByteRange;
use once_cell::sync::Lazy;
use regex::Regex;

static INTRODUCER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(let|var)\b").unwrap());

pub static DESCRIPTION: RuleDescription = RuleDescription {
    identifier: "discouraged_struct_runtime_let",
    name: "Discouraged Struct Runtime Let",
    description: "Struct `let` property values should be known at compile time, and constant for all copies.",
    kind: RuleKind::Idiomatic,
    opt_in: true,
    non_triggering_examples: &[
        "struct Foo {\n    let bar: Int = 5\n}",
        "struct Foo {\n    var bar: Int\n}",
        "struct Foo { let bar: Int = 5 }",
        "class Foo {\n    let bar: Int\n}",
        "struct Foo {\n    private(set) var bar: Int\n}",
        "struct Foo {\n    func run() {\n        let bar: Int\n    }\n}",
    ],
    triggering_examples: &[
        "struct Foo {\n    ↓let baz: Int\n}",
        "struct Foo {\n    ↓let bar: Int\n    var baz: String\n    ↓let qux: [String]\n}",
        "class Outer {\n    struct Inner {\n        ↓let value: Int\n    }\n}",
        "struct Foo {\n    @Clamped ↓let bar: Double\n}",
        "struct Foo {\n    ↓let bar: Int?\n    ↓let baz: Int\n}",
        "struct Foo {\n    ↓let bar: Int?\n    let baz: Int = 5\n}",
        "struct Foo {\n    ↓let bar: String?\n    var baz: Int { 1 }\n}",
    ],
    corrections: &[
        ("struct Foo {\n    let bar: Int\n}", "struct Foo {\n    var bar: Int\n}"),
        (
            "struct Foo {\n    let bar: Int\n    let baz: Int = 1\n    let qux: String\n}",
            "struct Foo {\n    var bar: Int\n    let baz: Int = 1\n    var qux: String\n}",
        ),
        (
            "struct Foo {\n    let bar: Int?\n    let baz: Int\n}",
            "struct Foo {\n    var bar: Int?\n    var baz: Int\n}",
        ),
    ],
};

pub struct DiscouragedStructRuntimeLetRule {
    severity: Severity,
}

impl DiscouragedStructRuntimeLetRule {
    pub fn new() -> Self {
        Self {
            severity: Severity::Warning,
        }
    }

    /// Byte offset of the `let` introducer within `text`, if the declaration
    /// is introduced by `let` at all
    fn let_keyword_offset(text: &str) -> Option<usize> {
        INTRODUCER_REGEX
            .find(text)
            .filter(|m| m.as_str() == "let")
            .map(|m| m.start())
    }
}

impl Default for DiscouragedStructRuntimeLetRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for DiscouragedStructRuntimeLetRule {
    fn description(&self) -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn set_severity(&mut self, severity: Severity) {
        self.severity = severity;
    }

    fn detect(
        &self,
        file: &SourceFile,
        kind: DeclarationKind,
        node: &StructureNode,
        parent: Option<&StructureNode>,
    ) -> Vec<ByteRange> {
        let in_value_type = parent
            .and_then(StructureNode::kind)
            .map_or(false, DeclarationKind::is_value_type);
        if kind != DeclarationKind::VarInstance
            || !in_value_type
            || node.setter_accessibility().is_some()
            || node.body_length().is_some()
        {
            return vec![];
        }

        let Some(range) = node.byte_range() else {
            return vec![];
        };
        let text = match file.view().substring_with_byte_range(range) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("{}: skipping declaration at byte {}: {}", file.display_path(), range.location, e);
                return vec![];
            }
        };

        // Not every producer reports initializers structurally; the
        // declaration text settles it.
        if Self::let_keyword_offset(text).is_none() || text.contains('=') {
            return vec![];
        }

        vec![range]
    }

    fn as_correctable(&self) -> Option<&dyn CorrectableRule> {
        Some(self)
    }
}

impl CorrectableRule for DiscouragedStructRuntimeLetRule {
    fn correction_range(&self, file: &SourceFile, detected: ByteRange) -> Option<ByteRange> {
        let text = file.view().substring_with_byte_range(detected).ok()?;
        let offset = Self::let_keyword_offset(text)?;
        Some(ByteRange::new(detected.location + offset, "let".len()))
    }

    fn replacement(&self, file: &SourceFile, range: ByteRange) -> Option<String> {
        let keyword = file.view().substring_with_byte_range(range).ok()?;
        (keyword == "let").then(|| "var".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::scanner::DeclarationScanner;
    use crate::structure::traverse_with_parent_depth_first;

    fn detect(code: &str) -> Vec<String> {
        let file = SourceFile::parse(None, code, &DeclarationScanner::new());
        let rule = DiscouragedStructRuntimeLetRule::new();
        let root = file.structure().unwrap();

        traverse_with_parent_depth_first(root, |parent, node| match node.kind() {
            Some(kind) => rule.detect(&file, kind, node, parent),
            None => vec![],
        })
        .into_iter()
        .map(|range| file.view().substring_with_byte_range(range).unwrap().to_string())
        .collect()
    }

    #[test]
    fn test_uninitialized_struct_let() {
        let detected = detect("struct Foo {\n    let bar: Int\n}");
        assert_eq!(detected, vec!["let bar: Int"]);
    }

    #[test]
    fn test_optional_let_is_its_own_declaration() {
        let detected = detect("struct Foo {\n    let bar: Int?\n    let baz: Int = 5\n    let qux: Int?\n}");
        assert_eq!(detected, vec!["let bar: Int?", "let qux: Int?"]);
    }

    #[test]
    fn test_initialized_let_allowed() {
        assert!(detect("struct Foo { let bar: Int = 5 }").is_empty());
    }

    #[test]
    fn test_var_allowed() {
        assert!(detect("struct Foo { var bar: Int }").is_empty());
    }

    #[test]
    fn test_class_let_allowed() {
        assert!(detect("class Foo { let bar: Int }").is_empty());
    }

    #[test]
    fn test_setter_accessibility_allowed() {
        assert!(detect("struct Foo { private(set) var bar: Int }").is_empty());
    }

    #[test]
    fn test_structural_signals_take_precedence() {
        let code = "struct Foo {\n    let bar: Int\n}";
        let declaration = StructureNode::new(Some(DeclarationKind::VarInstance), Some(ByteRange::new(17, 12)));
        let parent = StructureNode::new(Some(DeclarationKind::Struct), Some(ByteRange::new(0, 31)));
        let file = SourceFile::with_structure(None, code, StructureNode::root(vec![]));
        let rule = DiscouragedStructRuntimeLetRule::new();

        assert_eq!(
            rule.detect(&file, DeclarationKind::VarInstance, &declaration, Some(&parent)),
            vec![ByteRange::new(17, 12)]
        );

        let with_body = declaration.clone().with_body_length(3);
        assert!(rule
            .detect(&file, DeclarationKind::VarInstance, &with_body, Some(&parent))
            .is_empty());

        let with_setter = declaration.clone().with_setter_accessibility("source.lang.swift.accessibility.private");
        assert!(rule
            .detect(&file, DeclarationKind::VarInstance, &with_setter, Some(&parent))
            .is_empty());
    }

    #[test]
    fn test_missing_range_or_parent_is_silent() {
        let file = SourceFile::with_structure(None, "let bar: Int", StructureNode::root(vec![]));
        let rule = DiscouragedStructRuntimeLetRule::new();
        let parent = StructureNode::new(Some(DeclarationKind::Struct), None);

        let synthetic = StructureNode::new(Some(DeclarationKind::VarInstance), None);
        assert!(rule
            .detect(&file, DeclarationKind::VarInstance, &synthetic, Some(&parent))
            .is_empty());

        let orphan = StructureNode::new(Some(DeclarationKind::VarInstance), Some(ByteRange::new(0, 12)));
        assert!(rule.detect(&file, DeclarationKind::VarInstance, &orphan, None).is_empty());
    }

    #[test]
    fn test_invalid_range_is_skipped() {
        let file = SourceFile::with_structure(None, "é", StructureNode::root(vec![]));
        let rule = DiscouragedStructRuntimeLetRule::new();
        let parent = StructureNode::new(Some(DeclarationKind::Struct), None);
        let node = StructureNode::new(Some(DeclarationKind::VarInstance), Some(ByteRange::new(1, 1)));
        assert!(rule
            .detect(&file, DeclarationKind::VarInstance, &node, Some(&parent))
            .is_empty());
    }

    #[test]
    fn test_correction_narrows_to_keyword() {
        let code = "struct Foo {\n    @Clamped let bar: Double\n}";
        let file = SourceFile::parse(None, code, &DeclarationScanner::new());
        let rule = DiscouragedStructRuntimeLetRule::new();
        let detected = ByteRange::new(17, 24);
        assert_eq!(
            file.view().substring_with_byte_range(detected),
            Ok("@Clamped let bar: Double")
        );

        let range = rule.correction_range(&file, detected).unwrap();
        assert_eq!(range, ByteRange::new(26, 3));
        assert_eq!(rule.replacement(&file, range), Some("var".to_string()));
        assert_eq!(rule.replacement(&file, ByteRange::new(30, 3)), None);
    }

    #[test]
    fn test_keyword_must_be_a_whole_word() {
        assert_eq!(DiscouragedStructRuntimeLetRule::let_keyword_offset("var letter: Int"), None);
        assert_eq!(DiscouragedStructRuntimeLetRule::let_keyword_offset("lazy let x"), Some(5));
    }
}
