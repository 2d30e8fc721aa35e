// LanceDB vector database module
// Handles vector storage and similarity search for chunk embeddings

#[cfg(test)]
mod tests;

pub mod vector_store;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use vector_store::{SearchHit, VectorStore};

/// Name of the single table holding the chunk embeddings
pub const CHUNKS_TABLE: &str = "chunks";

/// One embedded chunk as persisted in LanceDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Unique identifier for this row
    pub id: String,
    /// The chunk embedding
    pub vector: Vec<f32>,
    pub chunk: StoredChunk,
    /// RFC 3339 timestamp of when the row was written
    pub created_at: String,
}

/// Chunk payload stored alongside its embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Path of the document the chunk was split from
    pub source_path: String,
    /// The chunk text handed to the prompt builder
    pub text: String,
    /// Position of the chunk within its document
    pub sequence_index: u32,
    /// Position of the chunk in the whole build, used to break score ties
    pub ordinal: u32,
}

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("{context}: {source}")]
    Lance {
        context: &'static str,
        #[source]
        source: lancedb::Error,
    },

    #[error("{context}: {source}")]
    Arrow {
        context: &'static str,
        #[source]
        source: arrow::error::ArrowError,
    },

    #[error("Failed to create vector database directory: {0}")]
    Directory(#[from] std::io::Error),

    #[error("Invalid table layout: {0}")]
    Schema(String),

    #[error("Vector has {actual} dimensions, table expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl VectorStoreError {
    pub(crate) fn lance(context: &'static str) -> impl FnOnce(lancedb::Error) -> Self {
        move |source| Self::Lance { context, source }
    }

    pub(crate) fn arrow(context: &'static str) -> impl FnOnce(arrow::error::ArrowError) -> Self {
        move |source| Self::Arrow { context, source }
    }
}
