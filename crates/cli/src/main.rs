//! cspguard CLI - offline nonce injection, policy filtering and checks.
//!
//! # Usage
//!
//! ```bash
//! # Add a nonce to every script tag of a page
//! cspguard inject page.html --nonce abc123
//!
//! # Print the filtered CSP headers for a policy file
//! cspguard filter policies.yaml --settings settings.yaml
//!
//! # Test a host against blocklist patterns
//! cspguard check-host ads.example.com --pattern 'ads.*' --pattern '*.tracker.net'
//!
//! # Ask the request gate about a URI
//! cspguard check-request '/rest/V1/carts' --settings settings.yaml
//! ```
//!
//! Without `--settings`, feature flags are read from the `CSPGUARD_*`
//! environment variables (a `.env` file is honored).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cspguard")]
#[command(author, version, about = "cspguard CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a nonce to the script tags of an HTML file
    Inject {
        /// HTML file to rewrite
        file: PathBuf,

        /// Nonce value (random when omitted)
        #[arg(long)]
        nonce: Option<String>,

        /// Only rewrite the first script tag
        #[arg(long)]
        first_only: bool,
    },
    /// Filter a YAML policy file and print the CSP headers
    Filter {
        /// YAML file with policy records
        policy_file: PathBuf,

        /// YAML settings file
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Keep 'unsafe-inline' and 'unsafe-eval'
        #[arg(long)]
        keep_unsafe: bool,
    },
    /// Check a host against wildcard blocklist patterns
    CheckHost {
        host: String,

        /// Wildcard pattern (repeatable)
        #[arg(short, long = "pattern", required = true)]
        patterns: Vec<String>,
    },
    /// Check whether the request gate excludes a URI
    CheckRequest {
        /// Request URI, optionally with a query string
        uri: String,

        /// YAML settings file
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

#[tokio::main]
#[allow(clippy::print_stdout)]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => print!("{output}"),
        Err(e) => {
            tracing::error!("Command failed: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<String, commands::CliError> {
    let output = match cli.command {
        Commands::Inject {
            file,
            nonce,
            first_only,
        } => commands::inject::run(&file, nonce, first_only).await?,
        Commands::Filter {
            policy_file,
            settings,
            keep_unsafe,
        } => commands::filter::run(&policy_file, settings.as_deref(), keep_unsafe)?,
        Commands::CheckHost { host, patterns } => {
            format!("{}\n", commands::check::host(&host, &patterns))
        }
        Commands::CheckRequest { uri, settings } => {
            format!("{}\n", commands::check::request(&uri, settings.as_deref())?)
        }
    };
    Ok(output)
}
