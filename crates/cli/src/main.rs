//! Vaporwise CLI - Offline tools for the recommendation storefront.
//!
//! # Usage
//!
//! ```bash
//! # Rank the catalog against a preferences file
//! vw-cli score --preferences prefs.yaml --limit 3
//!
//! # Check the storefront fixtures before deploying
//! vw-cli fixtures check --dir crates/storefront/fixtures
//!
//! # Validate a quiz document exported from the API
//! vw-cli quiz validate quiz.json
//! ```
//!
//! # Commands
//!
//! - `score` - Run the legacy weighted-sum scorer
//! - `fixtures check` - Load and validate the fixture directory
//! - `quiz validate` - Check a quiz JSON document's schema

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vw-cli")]
#[command(author, version, about = "Vaporwise CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score the catalog against a preferences file
    Score {
        /// YAML file with experience, usage, portability, budget and priorities
        #[arg(short, long)]
        preferences: PathBuf,

        /// Catalog YAML (defaults to catalog.yaml in the fixtures directory)
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// How many matches to print
        #[arg(short, long, default_value_t = 4)]
        limit: usize,
    },
    /// Inspect fixture files
    Fixtures {
        #[command(subcommand)]
        action: FixturesAction,
    },
    /// Inspect quiz documents
    Quiz {
        #[command(subcommand)]
        action: QuizAction,
    },
}

#[derive(Subcommand)]
enum FixturesAction {
    /// Load every fixture file and report problems
    Check {
        /// Fixtures directory (defaults to `STOREFRONT_FIXTURES_DIR`)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum QuizAction {
    /// Validate a quiz JSON document
    Validate {
        /// Path to the quiz JSON
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Score {
            preferences,
            catalog,
            limit,
        } => {
            let catalog = catalog.unwrap_or_else(|| commands::fixtures_dir().join("catalog.yaml"));
            commands::score::run(&preferences, &catalog, limit).await?;
        }
        Commands::Fixtures { action } => match action {
            FixturesAction::Check { dir } => {
                let dir = dir.unwrap_or_else(commands::fixtures_dir);
                commands::fixtures::check(&dir)?;
            }
        },
        Commands::Quiz { action } => match action {
            QuizAction::Validate { file } => commands::quiz::validate(&file).await?,
        },
    }
    Ok(())
}
