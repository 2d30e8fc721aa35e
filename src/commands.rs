use std::path::PathBuf;
use std::sync::Arc;

use console::style;
use dialoguer::Input;
use tracing::{info, warn};

use crate::config::Config;
use crate::conversation::DisplayHistory;
use crate::embeddings::{Embedder, OllamaClient};
use crate::index::{EmbeddingIndex, IndexSettings};
use crate::session::{Session, SessionOptions};
use crate::{RagError, Result};

/// Load and validate the configuration, applying a `--docs-dir` override
fn load_config(docs_dir: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::load_default().map_err(|e| RagError::Config(format!("{e:#}")))?;
    if let Some(docs_dir) = docs_dir {
        config.docs_dir = docs_dir;
    }
    config
        .validate()
        .map_err(|e| RagError::Config(e.to_string()))?;
    Ok(config)
}

fn ollama_client(config: &Config) -> Result<Arc<OllamaClient>> {
    Ok(Arc::new(OllamaClient::new(&config.ollama)?))
}

async fn start_session(docs_dir: Option<PathBuf>) -> Result<Session> {
    let config = load_config(docs_dir)?;
    let client = ollama_client(&config)?;

    if let Err(e) = client.health_check() {
        warn!("Ollama health check failed: {:#}", e);
        eprintln!(
            "{} {}",
            style("⚠ Ollama is not ready:").yellow(),
            style(format!("{e:#}")).dim()
        );
    }

    let embedder: Arc<dyn Embedder> = Arc::<OllamaClient>::clone(&client);
    let session = Session::new(SessionOptions::from_config(&config), embedder, client);
    session.initialize().await?;
    Ok(session)
}

/// Build the index if needed, or unconditionally with `rebuild`
#[inline]
pub async fn build_index(docs_dir: Option<PathBuf>, rebuild: bool) -> Result<()> {
    let config = load_config(docs_dir)?;
    let settings = IndexSettings::from_config(&config);
    let client = ollama_client(&config)?;

    info!(
        "Indexing {} into {}",
        settings.docs_dir.display(),
        settings.store_dir.display()
    );

    let index = if rebuild {
        EmbeddingIndex::rebuild(&settings, client).await?
    } else {
        EmbeddingIndex::open_or_build(&settings, client).await?
    };

    println!(
        "{} {} chunks indexed from {}",
        style("✓").green(),
        style(index.len()).cyan(),
        settings.docs_dir.display()
    );
    Ok(())
}

/// Answer a single question and print the answer
#[inline]
pub async fn ask_once(question: &str, docs_dir: Option<PathBuf>) -> Result<()> {
    let session = start_session(docs_dir).await?;
    let answer = session.ask(question).await?;
    println!("{answer}");
    Ok(())
}

/// Interactive question loop until the exit sentinel or end of input
#[inline]
pub async fn chat(docs_dir: Option<PathBuf>) -> Result<()> {
    let session = start_session(docs_dir).await?;

    eprintln!("{}", style("Local RAG chat").bold().cyan());
    eprintln!(
        "Ask questions about your documents. Type '{}' to leave.",
        session.options().conversation.exit_sentinel
    );

    loop {
        let Some(question) = read_question()? else {
            break;
        };

        match session.ask(&question).await {
            Ok(answer) if session.is_exit(&question) => {
                println!("{answer}");
                break;
            }
            Ok(_) => render_history(&session.history().await),
            Err(e) => eprintln!("{} {}", style("Error:").red().bold(), e),
        }
    }

    Ok(())
}

/// `None` on end of input (Ctrl-D)
fn read_question() -> Result<Option<String>> {
    match Input::<String>::new()
        .with_prompt("Ask a question")
        .interact_text()
    {
        Ok(question) => Ok(Some(question)),
        Err(dialoguer::Error::IO(e))
            if matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::Interrupted
            ) =>
        {
            Ok(None)
        }
        Err(dialoguer::Error::IO(e)) => Err(RagError::Io(e)),
    }
}

/// Latest answer first, then earlier exchanges newest first
fn render_history(history: &DisplayHistory) {
    let Some(latest) = history.latest() else {
        return;
    };

    println!();
    println!("{}", style("Answer").bold().green());
    println!("{}", latest.answer);

    if history.len() > 1 {
        println!();
        println!("{}", style("Chat History").bold().yellow());
        for turn in history.iter().rev().skip(1) {
            println!("{} {}", style("Q:").bold(), turn.question);
            println!("{} {}", style("A:").bold(), turn.answer);
            println!();
        }
    }
}

/// Show configuration, Ollama health and index state
#[inline]
pub async fn show_status() -> Result<()> {
    let config = Config::load_default().map_err(|e| RagError::Config(format!("{e:#}")))?;

    println!("📊 Docs-RAG Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("📁 Paths:");
    println!("   Config: {}", config.config_file_path().display());
    println!("   Documents: {}", config.docs_dir.display());
    println!("   Index: {}", config.vector_database_path().display());
    println!();

    println!("🤖 Ollama Status:");
    match OllamaClient::new(&config.ollama) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!(
                    "   ✅ Ollama: Connected ({}:{})",
                    config.ollama.host, config.ollama.port
                );
                println!("   📋 Embedding Model: {}", config.ollama.embedding_model);
                println!("   💬 Generation Model: {}", config.ollama.generation_model);
            }
            Err(e) => {
                println!("   ⚠️  Ollama: Unhealthy - {:#}", e);
            }
        },
        Err(e) => {
            println!("   ❌ Ollama: Invalid configuration - {:#}", e);
        }
    }
    println!();

    println!("🔍 Index Status:");
    let store_dir = config.vector_database_path();
    match EmbeddingIndex::exists(&store_dir).await {
        Ok(false) => println!("   💤 Not built yet (run 'docs-rag index')"),
        Ok(true) => {
            let embedder = ollama_client(&config)?;
            match EmbeddingIndex::open(&store_dir, embedder).await {
                Ok(index) if index.is_empty() => {
                    println!("   ⚠️  Empty (will be rebuilt on next start)");
                }
                Ok(index) => println!("   ✅ {} chunks indexed", index.len()),
                Err(e) => println!("   ❌ Unreadable - {}", e),
            }
        }
        Err(e) => println!("   ❌ Unreadable - {}", e),
    }

    Ok(())
}
