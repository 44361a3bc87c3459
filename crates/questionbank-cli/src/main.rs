//! questionbank CLI: edit program blocks and inspect question banks.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(
    name = "questionbank",
    version,
    about = "Program block editor and question bank inspector"
)]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,

    #[command(subcommand)]
    command: Commands,
}

/// File locations, overriding the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Question catalog TOML file
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Program TOML file (or directory, for `validate`)
    #[arg(long, global = true)]
    program: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the question bank of one block, or of every block
    Bank {
        /// Block id (all blocks if omitted)
        #[arg(long)]
        block: Option<u64>,

        /// Output format: text, json, markdown
        #[arg(long)]
        format: Option<String>,
    },

    /// Add a question to a block
    Add {
        /// Block id
        #[arg(long)]
        block: u64,

        /// Question id
        #[arg(long)]
        question: u64,
    },

    /// Remove a question from a block
    Remove {
        /// Block id
        #[arg(long)]
        block: u64,

        /// Question id
        #[arg(long)]
        question: u64,
    },

    /// Append an empty top-level block
    AddBlock {
        /// Block name (defaults to "Block <id>")
        #[arg(long, default_value = "")]
        name: String,
    },

    /// Delete a block
    RemoveBlock {
        /// Block id
        #[arg(long)]
        block: u64,
    },

    /// Create a block repeated under an enumerator question
    Repeat {
        /// Enumerator question id
        #[arg(long)]
        enumerator: u64,
    },

    /// Check the catalog and program(s) for broken invariants
    Validate,

    /// Write a report of every block's bank
    Report {
        /// Output file (defaults to <reports_dir>/bank-<program id>.json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, markdown
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Create a starter config, catalog and program
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("questionbank=info")),
        )
        .init();

    let cli = Cli::parse();
    let paths = cli.paths;

    let result = match cli.command {
        Commands::Bank { block, format } => commands::bank::execute(&paths, block, format),
        Commands::Add { block, question } => commands::edit::add(&paths, block, question),
        Commands::Remove { block, question } => commands::edit::remove(&paths, block, question),
        Commands::AddBlock { name } => commands::edit::add_block(&paths, &name),
        Commands::RemoveBlock { block } => commands::edit::remove_block(&paths, block),
        Commands::Repeat { enumerator } => commands::edit::repeat(&paths, enumerator),
        Commands::Validate => commands::validate::execute(&paths),
        Commands::Report { output, format } => commands::report::execute(&paths, output, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
