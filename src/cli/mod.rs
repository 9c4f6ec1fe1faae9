//! CLI command definitions and parsing
use crate::config::Config;
use crate::output::Details;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "docqa",
    version,
    about = "Ask questions about a directory of text files",
    long_about = "docqa loads the text files of a directory, indexes them, and answers questions \
                  interactively: extractive answers over BM25 retrieval (ask), semantic document \
                  search over a persisted vector index (search), or a reader over every document (read)."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/docqa/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration profile to apply (e.g., "offline")
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides shared by the query commands
#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Directory holding the text files
    #[arg(short, long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Number of results to return
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer questions with BM25 retrieval and a reader
    Ask {
        #[command(flatten)]
        run: RunArgs,

        /// Documents handed to the reader per question
        #[arg(long)]
        retriever_top_k: Option<usize>,

        /// Answer detail level
        #[arg(long, value_parser = parse_details)]
        details: Option<Details>,
    },

    /// Search documents by meaning using the persisted vector index
    Search {
        #[command(flatten)]
        run: RunArgs,

        /// Rebuild the index even if one exists
        #[arg(long)]
        rebuild: bool,

        /// Result detail level; medium and all add document ids and scores
        #[arg(long, value_parser = parse_details)]
        details: Option<Details>,
    },

    /// Answer questions by reading every document
    Read {
        #[command(flatten)]
        run: RunArgs,

        /// Answer detail level
        #[arg(long, value_parser = parse_details)]
        details: Option<Details>,
    },

    /// Build (or rebuild) the persisted vector index and exit
    Index {
        /// Directory holding the text files
        #[arg(short, long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

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

fn parse_details(value: &str) -> Result<Details, String> {
    Details::parse(value).ok_or_else(|| {
        format!(
            "unknown detail level '{}' (expected minimum, medium or all)",
            value
        )
    })
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl RunArgs {
    /// Apply the data directory override
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.data_dir {
            config.data.doc_dir = dir.clone();
        }
    }
}
