// Retriever module
// Fixed similarity-search policy over the embedding index


use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;
use crate::index::{EmbeddingIndex, ScoredChunk};

pub const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the prompt per question
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    #[inline]
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Plain top-k similarity search; no query rewriting or diversity reranking
#[derive(Debug, Clone)]
pub struct Retriever {
    index: Arc<EmbeddingIndex>,
    top_k: usize,
}

impl Retriever {
    #[inline]
    pub fn new(index: Arc<EmbeddingIndex>, config: &RetrievalConfig) -> Self {
        Self {
            index,
            top_k: config.top_k,
        }
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[inline]
    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    /// Chunk texts most relevant to the question, best first
    #[inline]
    pub async fn retrieve(&self, question: &str) -> Result<Vec<String>> {
        Ok(self
            .retrieve_scored(question)
            .await?
            .into_iter()
            .map(|chunk| chunk.text)
            .collect())
    }

    /// Like [`Retriever::retrieve`], keeping scores and source paths
    #[inline]
    pub async fn retrieve_scored(&self, question: &str) -> Result<Vec<ScoredChunk>> {
        let chunks = self.index.query(question, self.top_k).await?;
        debug!(
            "Retrieved {} chunks for question of {} characters",
            chunks.len(),
            question.chars().count()
        );
        Ok(chunks)
    }
}
