use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to build index: {0}")]
    IndexBuild(String),

    #[error("Persisted index is unreadable: {0}")]
    IndexCorrupt(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Session is busy answering another question")]
    Busy,

    #[error("Session has not been initialized")]
    NotInitialized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod conversation;
pub mod database;
pub mod embeddings;
pub mod generation;
pub mod index;
pub mod ingest;
pub mod prompt;
pub mod retriever;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;
