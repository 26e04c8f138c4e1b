//! Tracelink CLI - issue-to-commit link recovery.
//!
//! Loads studied issues from a JSON export and studied commits from a git
//! repository (or a JSON export), runs the configured recovery strategy,
//! and writes the recovered link map as JSON.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use tracelink_rs::core::config::TracelinkConfig;
use tracelink_rs::core::pipeline::{LinkInputs, LinkPipeline, PairScore, StageReport};
use tracelink_rs::io::diff::DiffDiagnostics;
use tracelink_rs::io::sources::{
    CommentSource, CommitSource, DiffSource, GitCommitSource, IssueSource, JsonIssueSource,
};
use tracelink_rs::{Commit, IssueLinkMap};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Issue-to-commit traceability link recovery
#[derive(Parser)]
#[command(name = "tracelink")]
#[command(version = VERSION)]
#[command(about = "Recover issue-to-commit links from weak evidence")]
#[command(long_about = "
Recover traceability links between issue-tracker tickets and version
control commits. Keyword references in commit messages provide the
observed labels; time proximity, file overlap, word association and text
similarity provide the weak evidence; a positive-unlabeled correction
turns the biased labels into calibrated link decisions.

Common Usage:

  # Recover links with the PU classifier
  tracelink link --issues issues.json --repo ./project

  # High-confidence heuristic agreement only
  tracelink link --issues issues.json --repo ./project --strategy heuristics

  # Text similarity against changed documentation files
  tracelink link --issues issues.json --repo ./project --strategy nsd

  # Print the default configuration
  tracelink print-default-config > tracelink.yml

  # Check a configuration file
  tracelink validate-config tracelink.yml
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Recover links between studied issues and commits
    Link(Box<LinkArgs>),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Validate a tracelink configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),
}

/// Which recovery path a `link` run takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Candidate features plus the configured classifier (default)
    Classify,
    /// Heuristic agreement chain, keyword and loner links merged
    Heuristics,
    /// Text similarity between issues and masked commit messages
    Similarity,
    /// Text similarity between issues and changed non-source documents
    Nsd,
    /// Text similarity between issues and changed-file doc comments
    Comments,
}

#[derive(Args)]
struct LinkArgs {
    /// Configuration file (YAML); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON export of the studied issues
    #[arg(long)]
    issues: PathBuf,

    /// Git repository holding the studied commits
    #[arg(long, conflicts_with = "commits")]
    repo: Option<PathBuf>,

    /// JSON export of the studied commits (alternative to --repo)
    #[arg(long)]
    commits: Option<PathBuf>,

    /// Newline-separated commit hashes restricting the studied set
    #[arg(long, requires = "repo")]
    hashes: Option<PathBuf>,

    /// Recovery strategy
    #[arg(long, value_enum, default_value = "classify")]
    strategy: Strategy,

    /// Write output JSON to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Include the per-candidate score table in the output
    #[arg(long)]
    scores: bool,
}

#[derive(Args)]
struct ValidateConfigArgs {
    /// Configuration file to check
    config: PathBuf,
}

/// JSON shape written by a `link` run.
#[derive(Serialize)]
struct LinkReport {
    strategy: String,
    issues_studied: usize,
    commits_studied: usize,
    links: IssueLinkMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    correction: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stages: Vec<StageReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    scores: Vec<PairScore>,
    #[serde(skip_serializing_if = "DiffDiagnostics::is_empty")]
    diagnostics: DiffDiagnostics,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Link(args) => link_command(*args),
        Commands::PrintDefaultConfig => print_default_config(),
        Commands::ValidateConfig(args) => validate_config(args),
    }
}

fn link_command(args: LinkArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => TracelinkConfig::from_yaml_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => TracelinkConfig::default(),
    };
    let pipeline = LinkPipeline::new(config)?;

    let issues = JsonIssueSource::new(&args.issues)
        .load_issues()
        .context("loading issue export")?;
    let git_source = open_git_source(&args)?;
    let commits = match &git_source {
        Some(source) => source.load_commits().context("loading commit records")?,
        None => load_commit_export(&args)?,
    };
    let inputs = LinkInputs { issues, commits };
    let issues_studied = inputs.issues.len();
    let commits_studied = inputs.commits.len();

    let report = match args.strategy {
        Strategy::Classify => {
            let outcome = pipeline.run(inputs)?;
            LinkReport {
                strategy: "classify".to_string(),
                issues_studied,
                commits_studied,
                links: outcome.links,
                correction: outcome.correction,
                stages: Vec::new(),
                scores: if args.scores { outcome.scores } else { Vec::new() },
                diagnostics: outcome.diagnostics,
            }
        }
        Strategy::Heuristics => {
            let (links, stages) = pipeline.heuristic_links(&inputs)?;
            LinkReport {
                strategy: "heuristics".to_string(),
                issues_studied,
                commits_studied,
                links,
                correction: None,
                stages,
                scores: Vec::new(),
                diagnostics: DiffDiagnostics::default(),
            }
        }
        Strategy::Similarity => {
            let links = pipeline.similarity_links(&inputs)?;
            LinkReport {
                strategy: "similarity".to_string(),
                issues_studied,
                commits_studied,
                links,
                correction: None,
                stages: Vec::new(),
                scores: Vec::new(),
                diagnostics: DiffDiagnostics::default(),
            }
        }
        Strategy::Nsd => {
            let source = git_source
                .as_ref()
                .map(|source| source as &dyn DiffSource)
                .ok_or_else(|| anyhow::anyhow!("--strategy nsd requires --repo for diff access"))?;
            let (links, diagnostics) = pipeline.nsd_links(&inputs, source)?;
            LinkReport {
                strategy: "nsd".to_string(),
                issues_studied,
                commits_studied,
                links,
                correction: None,
                stages: Vec::new(),
                scores: Vec::new(),
                diagnostics,
            }
        }
        Strategy::Comments => {
            let source = git_source
                .as_ref()
                .map(|source| source as &dyn CommentSource)
                .ok_or_else(|| {
                    anyhow::anyhow!("--strategy comments requires --repo for tree access")
                })?;
            let links = pipeline.comment_links(&inputs, source)?;
            LinkReport {
                strategy: "comments".to_string(),
                issues_studied,
                commits_studied,
                links,
                correction: None,
                stages: Vec::new(),
                scores: Vec::new(),
                diagnostics: DiffDiagnostics::default(),
            }
        }
    };

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("writing report to {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn open_git_source(args: &LinkArgs) -> anyhow::Result<Option<GitCommitSource>> {
    let Some(repo) = &args.repo else {
        return Ok(None);
    };
    let hashes = match &args.hashes {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading hash list {}", path.display()))?;
            Some(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect(),
            )
        }
        None => None,
    };
    let source = GitCommitSource::open(repo, hashes)
        .with_context(|| format!("opening repository {}", repo.display()))?;
    Ok(Some(source))
}

fn load_commit_export(args: &LinkArgs) -> anyhow::Result<Vec<Commit>> {
    if let Some(path) = &args.commits {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading commit export {}", path.display()))?;
        return serde_json::from_str(&content).context("parsing commit export");
    }
    anyhow::bail!("either --repo or --commits is required");
}

fn print_default_config() -> anyhow::Result<()> {
    print!("{}", TracelinkConfig::default().to_yaml()?);
    Ok(())
}

fn validate_config(args: ValidateConfigArgs) -> anyhow::Result<()> {
    let config = TracelinkConfig::from_yaml_file(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;
    config.validate()?;
    println!("{}: configuration is valid", args.config.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_every_strategy_parses() {
        for (flag, expected) in [
            ("classify", Strategy::Classify),
            ("heuristics", Strategy::Heuristics),
            ("similarity", Strategy::Similarity),
            ("nsd", Strategy::Nsd),
            ("comments", Strategy::Comments),
        ] {
            let cli = Cli::try_parse_from([
                "tracelink", "link", "--issues", "i.json", "--repo", "./r", "--strategy", flag,
            ])
            .unwrap();
            match cli.command {
                Commands::Link(args) => assert_eq!(args.strategy, expected),
                _ => panic!("expected a link command"),
            }
        }
    }

    #[test]
    fn test_report_carries_diagnostics() {
        let mut diagnostics = DiffDiagnostics::default();
        diagnostics.record("c1", "docs/renamed.txt");
        let report = LinkReport {
            strategy: "nsd".to_string(),
            issues_studied: 1,
            commits_studied: 1,
            links: IssueLinkMap::new(),
            correction: None,
            stages: Vec::new(),
            scores: Vec::new(),
            diagnostics,
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();
        assert_eq!(json["diagnostics"][0]["commit"], "c1");
        assert_eq!(json["diagnostics"][0]["file"], "docs/renamed.txt");
    }

    #[test]
    fn test_empty_diagnostics_are_omitted() {
        let report = LinkReport {
            strategy: "classify".to_string(),
            issues_studied: 0,
            commits_studied: 0,
            links: IssueLinkMap::new(),
            correction: None,
            stages: Vec::new(),
            scores: Vec::new(),
            diagnostics: DiffDiagnostics::default(),
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();
        assert!(json.get("diagnostics").is_none());
    }
}
