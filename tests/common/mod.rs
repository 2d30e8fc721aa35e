// Shared test doubles for the integration tests

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docs_rag::embeddings::Embedder;
use docs_rag::generation::Generator;
use docs_rag::{RagError, Result};

pub const DIMENSION: usize = 64;

/// Bag-of-words embedder with a bias bucket so no vector is zero
#[derive(Debug, Default)]
pub struct WordHashEmbedder {
    pub batches: AtomicUsize,
}

impl WordHashEmbedder {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl Embedder for WordHashEmbedder {
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0; DIMENSION];
                vector[0] = 0.5;
                for word in text
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|w| !w.is_empty())
                {
                    let mut hasher = DefaultHasher::new();
                    word.to_lowercase().hash(&mut hasher);
                    let bucket = 1 + (hasher.finish() % (DIMENSION as u64 - 1)) as usize;
                    vector[bucket] += 1.0;
                }
                vector
            })
            .collect())
    }
}

/// Echoes a numbered answer and keeps every prompt it was given
#[derive(Debug, Default)]
pub struct RecordingGenerator {
    pub prompts: Mutex<Vec<String>>,
    pub fail_next: AtomicBool,
}

impl RecordingGenerator {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt lock").clone()
    }

    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(RagError::Generation("model timed out".to_string()));
        }

        let mut prompts = self.prompts.lock().expect("prompt lock");
        prompts.push(prompt.to_string());
        Ok(format!("reply #{}", prompts.len()))
    }
}
