//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Packlint - graph-aware validation and formatting for content packs.
#[derive(Debug, Parser)]
#[command(name = "packlint")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides .packlint.yml discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Content root (overrides current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate content items
    Validate(ValidateArgs),

    /// Format content items in place
    Format(FormatArgs),

    /// Prepare a content item for a marketplace
    Prepare(PrepareArgs),

    /// List the validation rules
    ListRules(ListRulesArgs),

    /// Print the JSON schema of .packlint.yml
    ConfigSchema,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `validate` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ValidateArgs {
    /// Validate every item under the content root
    #[arg(short, long, conflicts_with_all = ["input", "use_git"])]
    pub all: bool,

    /// Validate these files or directories
    #[arg(short, long, num_args = 1.., conflicts_with = "use_git")]
    pub input: Vec<PathBuf>,

    /// Validate the files changed relative to the base ref (default)
    #[arg(short = 'g', long)]
    pub use_git: bool,

    /// Base ref for --use-git (overrides git.base_ref)
    #[arg(long, value_name = "REF")]
    pub prev_ver: Option<String>,

    /// Apply the fixes of auto-fixable rules
    #[arg(long)]
    pub fix: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Also write JSON results to this file
    #[arg(long, value_name = "PATH")]
    pub json_file: Option<PathBuf>,

    /// Skip these codes (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub ignore: Vec<String>,

    /// Run only these codes (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Query the docker registry for the latest image tags
    #[arg(long)]
    pub check_docker: bool,
}

/// Arguments for the `format` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct FormatArgs {
    /// Files or directories to format
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Write the result here instead of in place (single input only)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Raise fromversion to at least this version
    #[arg(long, value_name = "VERSION")]
    pub from_version: Option<String>,

    /// Skip validating the formatted files
    #[arg(long)]
    pub no_validate: bool,

    /// Answer yes to every prompt
    #[arg(short = 'y', long)]
    pub assume_yes: bool,

    /// Bump docker images to their latest tag
    #[arg(long)]
    pub update_docker: bool,
}

/// Arguments for the `prepare` command.
#[derive(Debug, Clone, clap::Args)]
pub struct PrepareArgs {
    /// Content item to prepare
    #[arg(short, long)]
    pub input: PathBuf,

    /// Target marketplace (xsoar, marketplacev2, xpanse, xsoar_saas, xsoar_on_prem)
    #[arg(short, long)]
    pub marketplace: String,

    /// Write the result here instead of in place
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `list-rules` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListRulesArgs {
    /// Print the catalog as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
