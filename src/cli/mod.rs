//! CLI module for ragdesk
//!
//! Command-line parsing with clap; colored terminal output with owo-colors.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ragdesk - question answering over an indexed document corpus
#[derive(Parser, Debug)]
#[command(
    name = "ragdesk",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "Retrieval-augmented question answering over your documents",
    long_about = "Indexes scraped documents into a vector index and answers questions with\n\
                  a language model grounded in the most relevant passages.\n\n\
                  Run without a subcommand to start the HTTP server.",
    after_help = "EXAMPLES:\n    \
                  ragdesk ingest                      # Index data/scraped_data.json\n    \
                  ragdesk ask \"Who runs the office?\"  # One-off question\n    \
                  ragdesk chat                        # Interactive session\n    \
                  ragdesk serve                       # Start the HTTP API\n    \
                  ragdesk --config my.toml stats      # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "ragdesk.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server (default)
    Serve {
        /// Override the configured host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not index documents on startup
        #[arg(long)]
        no_ingest: bool,
    },

    /// Index documents into the vector index
    ///
    /// Skipped when the index already has entries unless --reindex is given.
    Ingest {
        /// JSON document file (defaults to data.documents_file)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Clear the index before ingesting
        #[arg(long)]
        reindex: bool,
    },

    /// Ask a single question
    Ask {
        /// The question
        question: String,

        /// Answer without retrieved context
        #[arg(long)]
        no_context: bool,
    },

    /// Interactive chat session (/clear, /history, /exit)
    Chat {
        /// Answer without retrieved context
        #[arg(long)]
        no_context: bool,
    },

    /// Show the passages most similar to a query
    Search {
        /// Query text
        query: String,

        /// Number of results
        #[arg(short, default_value = "5")]
        k: usize,
    },

    /// Show index statistics
    Stats,

    /// Remove every entry from the index
    Clear {
        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file and referenced secrets
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["ragdesk"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("ragdesk.toml"));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["ragdesk", "stats", "--config", "other.toml", "--no-color"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Stats)));
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(cli.no_color);
    }

    #[test]
    fn test_search_k() {
        let cli = Cli::try_parse_from(["ragdesk", "search", "budget", "-k", "3"]).unwrap();
        match cli.command {
            Some(Commands::Search { query, k }) => {
                assert_eq!(query, "budget");
                assert_eq!(k, 3);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_ingest_flags() {
        let cli =
            Cli::try_parse_from(["ragdesk", "ingest", "--file", "docs.json", "--reindex"]).unwrap();
        match cli.command {
            Some(Commands::Ingest { file, reindex }) => {
                assert_eq!(file, Some(PathBuf::from("docs.json")));
                assert!(reindex);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
