// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes. Each rule source is a subcommand sharing the
// same set of options; the subcommand picks the export preset.
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rule-harvester",
    version = "0.1.0",
    about = "A CLI tool to export detection rules from GitHub rule repositories to CSV",
    long_about = "rule-harvester walks a detection-rule repository through the GitHub \
                  contents API, extracts a fixed set of fields from every rule file, \
                  and writes the flattened result to a dated CSV export."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export Elastic detection rules (TOML) from elastic/detection-rules
    ///
    /// Example: rule-harvester elastic --out-dir ./exports
    Elastic {
        #[command(flatten)]
        options: ExportOptions,
    },

    /// Export Sigma rules (YAML) from SigmaHQ/sigma
    ///
    /// Example: rule-harvester sigma --token ghp_xxx
    Sigma {
        #[command(flatten)]
        options: ExportOptions,
    },
}

// Options shared by every source subcommand
#[derive(Args, Debug)]
pub struct ExportOptions {
    /// Override the contents API URL the walk starts from
    /// (e.g. to export a fork or a single subtree)
    #[arg(long)]
    pub repo_url: Option<String>,

    /// GitHub API token; falls back to the GITHUB_TOKEN environment variable
    #[arg(long)]
    pub token: Option<String>,

    /// Directory the CSV export is written to
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}
