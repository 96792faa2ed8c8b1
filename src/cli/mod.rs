//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mnemo",
    version,
    about = "Local-first personal context store with hybrid retrieval",
    long_about = "Mnemo normalizes heterogeneous text (chat messages, issues, emails, calendar \
                  events, AI conversation exports) into a uniform document shape, embeds it, and \
                  makes it searchable by meaning or keyword."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/mnemo/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a batch of documents from a JSONL file
    Add {
        /// File with one JSON document per line ({"source", "content", "metadata"})
        file: PathBuf,

        /// Override the source field for every document in the batch
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Search stored documents by meaning, with keyword fallback
    Search {
        /// Search query text
        query: String,

        /// Maximum number of results to return
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Keyword-only substring search
    Keyword {
        /// Search query text
        query: String,

        /// Maximum number of results to return
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show store statistics
    Stats,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Print the active configuration
    Show,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
