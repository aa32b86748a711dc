// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Build the export preset for the chosen rule source
// 3. Walk the remote tree, collect records and diagnostics
// 4. Write the dated CSV and print a summary
// 5. Exit with proper code (0 = run completed, 2 = error)
//
// Per-file failures are diagnostics, not errors: the run finishes (and exits
// zero) even when individual files could not be fetched or parsed.
// =============================================================================

mod cli;
mod config;
mod export;
mod extract;
mod github;
mod walker;

use std::path::Path;

use anyhow::Result;
use chrono::Local;
use clap::Parser;

use cli::{Cli, Commands, ExportOptions};
use config::ExportConfig;
use github::GithubClient;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let (config, options) = match cli.command {
        Commands::Elastic { options } => (ExportConfig::elastic(), options),
        Commands::Sigma { options } => (ExportConfig::sigma(), options),
    };

    handle_export(config, options).await
}

// Runs one full export
//
// Parameters:
//   config: the source preset (possibly with an overridden root URL)
//   options: CLI options (token, output directory)
async fn handle_export(mut config: ExportConfig, options: ExportOptions) -> Result<i32> {
    if let Some(url) = options.repo_url {
        config.root_url = url;
    }

    // The URL is validated here so a typo fails fast instead of surfacing
    // as a listing diagnostic on an empty run
    let (owner, repo) = github::parse_repo_slug(&config.root_url)?;
    println!("🔍 Exporting rules from {}/{}", owner, repo);

    let token = options
        .token
        .or_else(|| std::env::var("GITHUB_TOKEN").ok());
    if token.is_none() {
        println!("⚠️  No GitHub token provided - unauthenticated requests are heavily rate-limited");
    }

    let client = GithubClient::new(token)?;
    let outcome = walker::collect_rules(&client, &config).await;

    for diagnostic in &outcome.diagnostics {
        eprintln!("   Warning: {}", diagnostic);
    }

    print_summary(&outcome, &config, &options.out_dir)?;

    Ok(0)
}

// Writes the CSV (when there is anything to write) and prints the run summary
fn print_summary(
    outcome: &walker::WalkOutcome,
    config: &ExportConfig,
    out_dir: &Path,
) -> Result<()> {
    println!();
    println!("📊 Summary:");
    println!("   📄 Rules extracted: {}", outcome.records.len());
    println!("   ⚠️  Diagnostics: {}", outcome.diagnostics.len());

    let today = Local::now().date_naive();
    match export::write_csv(config, &outcome.records, out_dir, today)? {
        Some(path) => println!("✅ CSV file '{}' created successfully", path.display()),
        None => println!("⚠️  No rule files were found - nothing written"),
    }

    Ok(())
}
