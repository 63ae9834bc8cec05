//! structlint CLI

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use structlint::config::{self, CliOverrides, Configuration};
use structlint::engine::Linter;
use structlint::logging::{RunLogEntry, RunLogger};
use structlint::reporter::{self, OutputFormat, Summary};
use structlint::rules::RuleRegistry;
use structlint::structure::scanner::DeclarationScanner;
use structlint::{
    collect_swift_files, correct_files_parallel, lint_file_with_structure, lint_files_parallel,
};

#[derive(Parser, Debug)]
#[command(name = "structlint")]
#[command(version, about = "A structure-aware linter and autocorrector for Swift declarations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print lint violations
    Lint {
        /// Files or directories to lint
        #[arg(default_value = ".")]
        paths: Vec<String>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        output_format: OutputFormat,

        /// Use the structure printed by `sourcekitten structure` for a single file
        #[arg(long)]
        structure: Option<PathBuf>,

        #[command(flatten)]
        rules: RuleArgs,
    },

    /// Automatically correct violations, rewriting files in place
    Autocorrect {
        /// Files or directories to correct
        #[arg(default_value = ".")]
        paths: Vec<String>,

        #[command(flatten)]
        rules: RuleArgs,
    },

    /// List available rules and whether they are enabled
    Rules {
        #[command(flatten)]
        rules: RuleArgs,
    },

    /// Print the version
    Version,
}

#[derive(Args, Debug)]
struct RuleArgs {
    /// Configuration file (defaults to the nearest .structlint.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ignore configuration files
    #[arg(long, conflicts_with = "config")]
    no_config: bool,

    /// Enable specific rules (comma-separated)
    #[arg(long, value_delimiter = ',')]
    enable: Vec<String>,

    /// Disable specific rules (comma-separated)
    #[arg(long, value_delimiter = ',')]
    disable: Vec<String>,

    /// Exclude paths matching patterns
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Run every rule, opt-in rules included
    #[arg(long)]
    enable_all_rules: bool,

    /// Append a JSON Lines record of this run to a file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl RuleArgs {
    fn configuration(&self) -> Result<Configuration> {
        let file_config = if self.no_config {
            None
        } else {
            config::load_config(self.config.as_deref())?
        };

        let overrides = CliOverrides {
            enable: self.enable.clone(),
            disable: self.disable.clone(),
            exclude: self.exclude.clone(),
            enable_all_rules: self.enable_all_rules,
        };
        let merged = config::merge_config(file_config, &overrides);

        if self.verbose {
            eprintln!("Exclude patterns: {:?}", merged.excluded);
        }
        Ok(merged)
    }

    fn linter(&self, configuration: &Configuration, registry: &RuleRegistry) -> Linter {
        let linter = Linter::new(configuration.resolve_rules(registry));
        if self.verbose {
            eprintln!("Active rules: {}", rule_ids(&linter).join(", "));
        }
        linter
    }

    fn run_logger(&self) -> Result<Option<RunLogger>> {
        self.log_file
            .as_deref()
            .map(|path| {
                RunLogger::new(path)
                    .with_context(|| format!("failed to open log file {}", path.display()))
            })
            .transpose()
    }
}

fn rule_ids(linter: &Linter) -> Vec<String> {
    linter.rules().iter().map(|r| r.rule_id().to_string()).collect()
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default())
        .format_timestamp(None)
        .try_init()
        .ok();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::from(1)
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    let registry = RuleRegistry::with_builtin_rules();

    match command {
        Commands::Lint {
            paths,
            output_format,
            structure,
            rules,
        } => {
            let configuration = rules.configuration()?;
            let linter = rules.linter(&configuration, &registry);
            let mut logger = rules.run_logger()?;

            let results = match &structure {
                Some(structure) => {
                    if paths.len() != 1 || !Path::new(&paths[0]).is_file() {
                        bail!("--structure requires exactly one source file");
                    }
                    vec![lint_file_with_structure(Path::new(&paths[0]), structure, &linter)]
                }
                None => {
                    let files = collect_swift_files(&paths, &configuration.excluded);
                    if rules.verbose {
                        eprintln!("Found {} Swift files", files.len());
                    }
                    if files.is_empty() {
                        eprintln!("No Swift files found");
                        return Ok(ExitCode::SUCCESS);
                    }
                    lint_files_parallel(&files, &linter, &DeclarationScanner::new())
                }
            };

            match output_format {
                OutputFormat::Json => reporter::print_json(&results),
                OutputFormat::Text => reporter::print_text(&results),
            }

            if let Some(logger) = logger.as_mut() {
                let entry = RunLogEntry::from_lint_results(&results, rule_ids(&linter));
                logger
                    .log(&entry)
                    .with_context(|| format!("failed to write {}", logger.log_path().display()))?;
            }

            let summary = Summary::from_results(&results);
            eprintln!(
                "Done linting! Found {} violation(s), {} serious in {} file(s).",
                summary.total(),
                summary.errors,
                summary.files
            );

            Ok(if summary.errors > 0 {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            })
        }

        Commands::Autocorrect { paths, rules } => {
            let configuration = rules.configuration()?;
            let linter = rules.linter(&configuration, &registry);
            let mut logger = rules.run_logger()?;

            let files = collect_swift_files(&paths, &configuration.excluded);
            if files.is_empty() {
                eprintln!("No Swift files found");
                return Ok(ExitCode::SUCCESS);
            }

            let results = correct_files_parallel(&files, &linter, &DeclarationScanner::new());
            reporter::print_corrections(&results);

            if let Some(logger) = logger.as_mut() {
                let entry = RunLogEntry::from_correction_results(&results, rule_ids(&linter));
                logger
                    .log(&entry)
                    .with_context(|| format!("failed to write {}", logger.log_path().display()))?;
            }

            let corrected = results.iter().filter(|r| r.corrected_contents.is_some()).count();
            eprintln!(
                "Done correcting {} file(s)! {} file(s) changed.",
                results.len(),
                corrected
            );
            Ok(ExitCode::SUCCESS)
        }

        Commands::Rules { rules } => {
            let configuration = rules.configuration()?;
            let enabled = rule_ids(&Linter::new(configuration.resolve_rules(&registry)));

            for rule in registry.all_rules() {
                let description = rule.description();
                let is_enabled = enabled.iter().any(|id| id == description.identifier);
                println!(
                    "{} {} [{}{}{}]",
                    description.identifier.cyan().bold(),
                    description.name,
                    description.kind,
                    if description.opt_in { ", opt-in" } else { "" },
                    if rule.as_correctable().is_some() { ", correctable" } else { "" },
                );
                println!(
                    "    {}: {}",
                    if is_enabled { "enabled".green() } else { "disabled".dimmed() },
                    description.description
                );
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}
