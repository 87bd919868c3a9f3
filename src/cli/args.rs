//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

const AFTER_HELP: &str = "\
Quick Start:
  $ secondbrain init                     # Create .secondbrain/settings.toml
  $ secondbrain ingest docs/             # Index the PDF corpus
  $ secondbrain ask \"What is EduTrack used for?\"
  $ secondbrain chat --user abc          # Interactive session";

/// Retrieval-augmented assistant over a PDF corpus
#[derive(Parser)]
#[command(
    name = "secondbrain",
    version = env!("CARGO_PKG_VERSION"),
    about = "Retrieval-augmented assistant over a PDF corpus",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up .secondbrain directory with default settings
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Reset the collection and ingest PDFs
    Ingest {
        /// PDF file or directory (defaults to corpus.path)
        path: Option<PathBuf>,

        /// Disable the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Answer a single question
    Ask {
        /// The question
        query: String,

        /// Caller id stored with the conversation record
        #[arg(short, long)]
        user: Option<String>,

        /// Re-ingest the corpus before answering
        #[arg(long)]
        ingest: bool,
    },

    /// Interactive session; ingests the corpus first
    Chat {
        /// Caller id stored with the conversation records
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Show the chunks nearest to a query
    Search {
        query: String,

        /// Number of chunks
        #[arg(short, default_value_t = 3)]
        k: usize,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect the conversation log
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Display active settings
    Config,
}

#[derive(Subcommand)]
pub enum MemoryAction {
    /// Most recent exchanges, oldest first
    Recent {
        #[arg(short, default_value_t = 5)]
        n: usize,
    },

    /// Keyword search over past exchanges
    Search {
        query: String,

        #[arg(long, default_value_t = 3)]
        limit: usize,
    },

    /// Context block built from the log
    Context,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from(["secondbrain", "ask", "What is EduTrack?", "--user", "abc"]);
        match cli.command {
            Commands::Ask { query, user, ingest } => {
                assert_eq!(query, "What is EduTrack?");
                assert_eq!(user.as_deref(), Some("abc"));
                assert!(!ingest);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_parse_memory_recent_with_global_config() {
        let cli = Cli::parse_from(["secondbrain", "memory", "recent", "-n", "2", "-c", "x.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(
            cli.command,
            Commands::Memory {
                action: MemoryAction::Recent { n: 2 }
            }
        ));
    }
}
