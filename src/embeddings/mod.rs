// Embeddings module
// Text splitting and the embedding model boundary (Ollama)

pub mod chunking;
pub mod ollama;

pub use chunking::{ChunkingConfig, split_text};
pub use ollama::{EmbeddingResult, OllamaClient};

use anyhow::Result;

/// Turns text into fixed-dimension vectors.
///
/// Implementations must be deterministic: the same text always maps to the same vector,
/// and documents and queries must be embedded by the same model.
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in the same order
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()])?;
        vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedder returned no vector"))
    }
}
