use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docs_rag::Result;
use docs_rag::commands::{ask_once, build_index, chat, show_status};
use docs_rag::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "docs-rag")]
#[command(about = "Ask questions about a local document folder using Ollama")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and pipeline settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Build the document index if it is missing or empty
    Index {
        /// Rebuild the index even if one already exists
        #[arg(long)]
        rebuild: bool,
        /// Directory of documents to index, overriding the configuration
        #[arg(long)]
        docs_dir: Option<PathBuf>,
    },
    /// Answer a single question
    Ask {
        /// The question to answer
        question: String,
        /// Directory of documents to index, overriding the configuration
        #[arg(long)]
        docs_dir: Option<PathBuf>,
    },
    /// Start an interactive chat session
    Chat {
        /// Directory of documents to index, overriding the configuration
        #[arg(long)]
        docs_dir: Option<PathBuf>,
    },
    /// Show configuration, Ollama and index status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Index { rebuild, docs_dir } => {
            build_index(docs_dir, rebuild).await?;
        }
        Commands::Ask { question, docs_dir } => {
            ask_once(&question, docs_dir).await?;
        }
        Commands::Chat { docs_dir } => {
            chat(docs_dir).await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn status_command() {
        let cli = Cli::try_parse_from(["docs-rag", "status"]).expect("should parse");
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn index_command_defaults() {
        let cli = Cli::try_parse_from(["docs-rag", "index"]).expect("should parse");
        let Commands::Index { rebuild, docs_dir } = cli.command else {
            panic!("expected index command");
        };
        assert!(!rebuild);
        assert_eq!(docs_dir, None);
    }

    #[test]
    fn index_command_with_rebuild_and_dir() {
        let cli = Cli::try_parse_from(["docs-rag", "index", "--rebuild", "--docs-dir", "./notes"])
            .expect("should parse");
        let Commands::Index { rebuild, docs_dir } = cli.command else {
            panic!("expected index command");
        };
        assert!(rebuild);
        assert_eq!(docs_dir, Some(PathBuf::from("./notes")));
    }

    #[test]
    fn ask_command_with_question() {
        let cli = Cli::try_parse_from(["docs-rag", "ask", "What is MLIR?"]).expect("should parse");
        let Commands::Ask { question, docs_dir } = cli.command else {
            panic!("expected ask command");
        };
        assert_eq!(question, "What is MLIR?");
        assert_eq!(docs_dir, None);
    }

    #[test]
    fn ask_command_requires_question() {
        let err = Cli::try_parse_from(["docs-rag", "ask"]).err().expect("should fail");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn chat_command_with_docs_dir() {
        let cli =
            Cli::try_parse_from(["docs-rag", "chat", "--docs-dir", "data"]).expect("should parse");
        let Commands::Chat { docs_dir } = cli.command else {
            panic!("expected chat command");
        };
        assert_eq!(docs_dir, Some(PathBuf::from("data")));
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["docs-rag", "config", "--show"]).expect("should parse");
        let Commands::Config { show } = cli.command else {
            panic!("expected config command");
        };
        assert!(show);
    }

    #[test]
    fn invalid_command() {
        let err = Cli::try_parse_from(["docs-rag", "invalid"]).err().expect("should fail");
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn help_message() {
        let err = Cli::try_parse_from(["docs-rag", "--help"]).err().expect("should fail");
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }
}
