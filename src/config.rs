//! Configuration loading for structlint
//!
//! Loads configuration from a `.structlint.toml` file, found by walking up
//! from the working directory or given explicitly.

use crate::models::Severity;
use crate::rules::base::Rule;
use crate::rules::RuleRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".structlint.toml";

/// Directories never worth scanning
const DEFAULT_EXCLUDES: &[&str] = &[".build", ".git", ".swiftpm", "Carthage", "DerivedData", "Pods"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct Configuration {
    /// Rules that never run
    #[serde(default)]
    pub disabled_rules: Vec<String>,

    /// Opt-in rules to run in addition to the default ones
    #[serde(default)]
    pub opt_in_rules: Vec<String>,

    /// When non-empty, exactly these rules run
    #[serde(default)]
    pub only_rules: Vec<String>,

    /// Paths to exclude from linting
    #[serde(default)]
    pub excluded: Vec<String>,

    /// Run every rule, opt-in ones included
    #[serde(default)]
    pub enable_all_rules: bool,

    /// Rule-specific configuration
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,
}

/// Rule-specific configuration
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct RuleConfig {
    pub severity: Option<Severity>,
}

/// Command line settings that take precedence over the file
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub enable: Vec<String>,
    pub disable: Vec<String>,
    pub exclude: Vec<String>,
    pub enable_all_rules: bool,
}

/// Find `.structlint.toml` starting from a path and walking up
pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
    let mut current = if start_path.is_file() {
        start_path.parent()?
    } else {
        start_path
    };

    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }

        current = current.parent()?;
    }
}

pub fn parse_config(content: &str, path: &Path) -> Result<Configuration, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load configuration.
///
/// An explicit path must exist. Without one, the nearest `.structlint.toml`
/// above the working directory is used, and its absence is not an error.
pub fn load_config(path: Option<&Path>) -> Result<Option<Configuration>, ConfigError> {
    let config_path = match path {
        Some(p) if p.exists() => p.to_path_buf(),
        Some(p) => return Err(ConfigError::NotFound(p.to_path_buf())),
        None => {
            let Some(found) = std::env::current_dir().ok().as_deref().and_then(find_config_file) else {
                return Ok(None);
            };
            found
        }
    };

    log::debug!("loading configuration from {}", config_path.display());
    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
        path: config_path.clone(),
        source,
    })?;
    parse_config(&content, &config_path).map(Some)
}

/// Merge command line arguments with config file settings
/// CLI arguments take precedence
pub fn merge_config(config: Option<Configuration>, cli: &CliOverrides) -> Configuration {
    let mut merged = config.unwrap_or_default();

    for rule in &cli.enable {
        merged.disabled_rules.retain(|r| r != rule);
        if !merged.opt_in_rules.contains(rule) {
            merged.opt_in_rules.push(rule.clone());
        }
        if !merged.only_rules.is_empty() && !merged.only_rules.contains(rule) {
            merged.only_rules.push(rule.clone());
        }
    }

    for rule in &cli.disable {
        merged.opt_in_rules.retain(|r| r != rule);
        merged.only_rules.retain(|r| r != rule);
        if !merged.disabled_rules.contains(rule) {
            merged.disabled_rules.push(rule.clone());
        }
    }

    merged.enable_all_rules |= cli.enable_all_rules;

    // Add CLI exclude patterns
    merged.excluded.extend(cli.exclude.iter().cloned());

    // Add default excludes
    for default in DEFAULT_EXCLUDES {
        if !merged.excluded.iter().any(|e| e == default) {
            merged.excluded.push(default.to_string());
        }
    }

    merged
}

impl Configuration {
    fn is_selected(&self, rule: &dyn Rule) -> bool {
        let id = rule.rule_id();
        let named = |list: &[String]| list.iter().any(|r| r == id);

        if named(&self.disabled_rules) {
            return false;
        }
        if !self.only_rules.is_empty() {
            return named(&self.only_rules);
        }
        self.enable_all_rules || !rule.description().opt_in || named(&self.opt_in_rules)
    }

    /// Instantiate the configured rule set, in registry order
    pub fn resolve_rules(&self, registry: &RuleRegistry) -> Vec<Box<dyn Rule>> {
        let known = registry.all_rule_ids();
        let lists = [&self.disabled_rules, &self.opt_in_rules, &self.only_rules];
        for id in lists.iter().flat_map(|list| list.iter()).chain(self.rules.keys()) {
            if !known.contains(id) {
                log::warn!(
                    "unknown rule '{}' in configuration (known rules: {})",
                    id,
                    known.join(", ")
                );
            }
        }

        registry
            .all_rules()
            .into_iter()
            .filter(|rule| self.is_selected(rule.as_ref()))
            .map(|mut rule| {
                if let Some(severity) = self.rules.get(rule.rule_id()).and_then(|c| c.severity) {
                    rule.set_severity(severity);
                }
                rule
            })
            .collect()
    }
}
