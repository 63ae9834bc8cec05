//! Rules for structlint

pub mod base;

// Rule implementations
pub mod discouraged_struct_runtime_let;

use base::{Rule, RuleDescription};

/// Builds a fresh rule instance with its default configuration
pub type RuleFactory = fn() -> Box<dyn Rule>;

/// The rules available to a run, in registration order.
///
/// Registration order is the evaluation and merge order of the rules a
/// configuration selects from the registry.
#[derive(Default)]
pub struct RuleRegistry {
    factories: Vec<RuleFactory>,
}

impl RuleRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every rule shipped in this crate
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::new();
        registry.register(|| -> Box<dyn Rule> {
            Box::new(discouraged_struct_runtime_let::DiscouragedStructRuntimeLetRule::new())
        });
        registry
    }

    pub fn register(&mut self, factory: RuleFactory) {
        self.factories.push(factory);
    }

    /// Instantiate every registered rule
    pub fn all_rules(&self) -> Vec<Box<dyn Rule>> {
        self.factories.iter().map(|factory| factory()).collect()
    }

    pub fn descriptions(&self) -> Vec<&'static RuleDescription> {
        self.all_rules().iter().map(|rule| rule.description()).collect()
    }

    /// Get all registered rule IDs
    pub fn all_rule_ids(&self) -> Vec<String> {
        self.descriptions()
            .iter()
            .map(|description| description.identifier.to_string())
            .collect()
    }
}
