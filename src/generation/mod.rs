// Generation module
// The text generation boundary used to answer questions


use async_trait::async_trait;
use tracing::debug;

use crate::embeddings::OllamaClient;
use crate::{RagError, Result};

/// Produces a complete answer for a fully rendered prompt.
///
/// Called exactly once per answered question. Failures surface as [`RagError::Generation`].
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl Generator for OllamaClient {
    #[inline]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let client = self.clone();
        let prompt = prompt.to_string();

        debug!("Dispatching generation request to Ollama");
        tokio::task::spawn_blocking(move || OllamaClient::generate(&client, &prompt))
            .await
            .map_err(|e| RagError::Generation(format!("generation task failed: {e}")))?
            .map_err(|e| RagError::Generation(format!("{e:#}")))
    }
}
