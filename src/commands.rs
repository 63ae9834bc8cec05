//! Inline disable commands
//!
//! Source comments that silence rules:
//! - `// structlint:disable <rules>` - silence from the next line on
//! - `// structlint:enable <rules>` - undo a `disable` from the next line on
//! - `// structlint:disable:next <rules>` - silence the next line only
//! - `// structlint:disable:this <rules>` - silence the command's own line
//! - `// structlint:disable:previous <rules>` - silence the line before
//!
//! Rules are separated by spaces or commas; `all` names every rule. Only
//! real `//` comments count: text inside string literals or block comments
//! is ignored.

use crate::structure::scanner::line_comments;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static COMMAND_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"//\s*structlint:(disable|enable)(?::(next|this|previous))?[ \t]+([A-Za-z0-9_, \t]+)")
        .unwrap()
});

/// The rules a command applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSelection {
    All,
    Rules(HashSet<String>),
}

impl RuleSelection {
    fn parse(list: &str) -> Option<Self> {
        let rules: HashSet<String> = list
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if rules.is_empty() {
            None
        } else if rules.contains("all") {
            Some(RuleSelection::All)
        } else {
            Some(RuleSelection::Rules(rules))
        }
    }

    pub fn matches(&self, rule_id: &str) -> bool {
        match self {
            RuleSelection::All => true,
            RuleSelection::Rules(rules) => rules.contains(rule_id),
        }
    }
}

/// A `disable`/`enable` that changes state for every following line
#[derive(Debug, Clone)]
struct RegionCommand {
    line: usize,
    disable: bool,
    rules: RuleSelection,
}

/// Parsed disable commands for a file
#[derive(Debug, Default)]
pub struct DisableCommands {
    /// Region commands in source order
    regions: Vec<RegionCommand>,
    /// Single lines silenced by `next`/`this`/`previous`: line -> selections
    lines: HashMap<usize, Vec<RuleSelection>>,
}

impl DisableCommands {
    /// Parse disable commands from the comments of `source`. Text that does
    /// not lex has no commands.
    pub fn parse(source: &str) -> Self {
        let mut commands = DisableCommands::default();
        let comments = match line_comments(source) {
            Ok(comments) => comments,
            Err(e) => {
                log::debug!("no disable commands read: {}", e);
                return commands;
            }
        };

        let mut line_number = 1;
        let mut scanned = 0;
        for comment in comments {
            line_number += source[scanned..comment.location].matches('\n').count();
            scanned = comment.location;

            let text = &source[comment.location..comment.end()];
            let Some(caps) = COMMAND_REGEX.captures(text) else {
                continue;
            };
            let Some(rules) = caps.get(3).and_then(|m| RuleSelection::parse(m.as_str())) else {
                continue;
            };
            let disable = &caps[1] == "disable";

            let target = match caps.get(2).map(|m| m.as_str()) {
                None => {
                    commands.regions.push(RegionCommand {
                        line: line_number,
                        disable,
                        rules,
                    });
                    continue;
                }
                Some("next") => line_number + 1,
                Some("previous") if line_number > 1 => line_number - 1,
                Some("previous") => continue,
                Some(_) => line_number,
            };
            commands.lines.entry(target).or_default().push(rules);
        }

        commands
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.lines.is_empty()
    }

    /// Check if a rule is disabled at a given 1-based line
    pub fn is_disabled(&self, line: usize, rule_id: &str) -> bool {
        if let Some(selections) = self.lines.get(&line) {
            if selections.iter().any(|s| s.matches(rule_id)) {
                return true;
            }
        }

        let mut disabled = false;
        for region in self.regions.iter().take_while(|r| r.line < line) {
            if region.rules.matches(rule_id) {
                disabled = region.disable;
            }
        }
        disabled
    }
}
