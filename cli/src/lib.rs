//! Command-line front end for docrag.
//!
//! Parses arguments, loads configuration, and maps each subcommand onto one
//! engine call. All failures propagate to `main`, which exits non-zero.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use docrag_retrieval::{Rag, RagConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "docrag")]
#[command(version, about = "Index documents and answer questions from them", long_about = None)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/docrag/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level; repeat for more detail
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Add a document to the index
    Add {
        /// Path to the document
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Remove a document from the index
    Remove {
        /// Path to a file whose exact content should be removed
        #[arg(short, long, required_unless_present = "id", conflicts_with = "id")]
        file: Option<PathBuf>,

        /// Identifier printed by `add`
        #[arg(long)]
        id: Option<String>,
    },

    /// Find the most relevant documents
    Find {
        /// Query text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Number of results to return
        #[arg(short = 'n', long = "num")]
        num: Option<usize>,
    },

    /// Run the language model with relevant documents as context
    Help {
        /// Question to answer
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Number of context documents
        #[arg(short = 'n', long = "num")]
        num: Option<usize>,
    },
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbosity` picks the level.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

/// Load configuration, build the engine and run `cli.command`.
pub async fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    let config = RagConfig::load(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?
        .with_env_overrides();
    let rag = Rag::from_config(&config).context("Failed to set up engine")?;

    execute(&rag, cli.command, out).await
}

/// Run one command against `rag`, writing results to `out`.
pub async fn execute<W: Write>(rag: &Rag, command: Command, out: &mut W) -> Result<()> {
    match command {
        Command::Add { file } => {
            let content = read_document(&file).await?;
            let id = rag
                .add(&content)
                .await
                .context("Failed to index document")?;
            writeln!(out, "Document indexed successfully. id: {id}")?;
        }
        Command::Remove { file, id } => {
            let removed = match (file, id) {
                (_, Some(id)) => rag
                    .remove_by_id(&id)
                    .await
                    .context("Failed to remove document")?,
                (Some(file), None) => {
                    let content = read_document(&file).await?;
                    rag.remove(&content)
                        .await
                        .context("Failed to remove document")?
                }
                (None, None) => anyhow::bail!("File path or --id is required"),
            };
            writeln!(out, "Document removed successfully ({removed} removed).")?;
        }
        Command::Find { query, num } => {
            let query = query.join(" ");
            let k = num.unwrap_or_else(|| rag.default_k());
            let neighbors = rag
                .nearest(&query, k)
                .await
                .context("Failed to retrieve documents")?;

            writeln!(out, "Relevant Documents:")?;
            for neighbor in neighbors {
                debug!("{} at distance {}", neighbor.id, neighbor.distance);
                writeln!(out, "- {}", neighbor.content)?;
            }
        }
        Command::Help { query, num } => {
            let query = query.join(" ");
            let k = num.unwrap_or_else(|| rag.default_k());
            let response = rag
                .answer(&query, k)
                .await
                .context("Failed to generate answer")?;

            writeln!(out, "AI Response:")?;
            writeln!(out, "{response}")?;
        }
    }

    Ok(())
}

async fn read_document(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("docrag").chain(args.iter().copied()))
    }

    #[test]
    fn test_help_is_the_answer_command() {
        let cli = parse(&["help", "What", "color", "is", "the", "sky?", "-n", "1"]).unwrap();

        assert_eq!(
            cli.command,
            Command::Help {
                query: vec![
                    "What".to_string(),
                    "color".to_string(),
                    "is".to_string(),
                    "the".to_string(),
                    "sky?".to_string(),
                ],
                num: Some(1),
            }
        );
    }

    #[test]
    fn test_find_defaults_k_to_config() {
        let cli = parse(&["find", "color", "of", "sky"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Find {
                query: vec!["color".to_string(), "of".to_string(), "sky".to_string()],
                num: None,
            }
        );
    }

    #[test]
    fn test_add_requires_file() {
        assert!(parse(&["add"]).is_err());
        let cli = parse(&["add", "-f", "doc.txt"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Add {
                file: PathBuf::from("doc.txt")
            }
        );
    }

    #[test]
    fn test_remove_takes_file_or_id() {
        assert!(parse(&["remove"]).is_err());
        assert!(parse(&["remove", "-f", "a.txt", "--id", "abc"]).is_err());
        assert!(parse(&["remove", "--id", "abc"]).is_ok());
        assert!(parse(&["remove", "--file", "a.txt"]).is_ok());
    }

    #[test]
    fn test_query_is_required() {
        assert!(parse(&["find"]).is_err());
        assert!(parse(&["help"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = parse(&["find", "sky", "-vv", "--config", "/tmp/docrag.toml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/docrag.toml")));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
