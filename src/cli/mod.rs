//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mailtriage",
    version,
    about = "Batch email classification, deduplication and routing",
    long_about = "mailtriage reads a directory of .eml files, classifies each message into a request \
                  category and sub-category, extracts amounts, dates and entities, flags duplicate \
                  submissions, and routes every request to a team with a priority."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/mailtriage/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process every message file in a directory
    Process {
        /// Directory containing the message files
        dir: PathBuf,

        /// Results file (JSON array)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Classification audit log
        #[arg(long, value_name = "FILE")]
        audit_log: Option<PathBuf>,

        /// Record database
        #[arg(long, value_name = "FILE")]
        database: Option<PathBuf>,

        /// Phase-2 worker count (defaults to available parallelism)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Keep records in memory only; duplicates are detected within this run
        #[arg(long, conflicts_with = "database")]
        ephemeral: bool,
    },

    /// Show record store statistics
    Stats {
        /// Also count records carrying this fingerprint
        #[arg(long, value_name = "HASH")]
        fingerprint: Option<String>,
    },

    /// Show categories, sub-categories, teams and base priorities
    Taxonomy,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
