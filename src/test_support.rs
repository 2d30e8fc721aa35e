// Test doubles for the embedding and generation boundaries

use std::collections::HashSet;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::embeddings::Embedder;
use crate::generation::Generator;
use crate::{RagError, Result};

pub(crate) const TEST_DIMENSION: usize = 32;

/// Deterministic bag-of-words embedder: each lowercase word bumps one hashed bucket
#[derive(Debug, Default)]
pub(crate) struct HashingEmbedder {
    calls: AtomicUsize,
}

impl HashingEmbedder {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn vector_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; TEST_DIMENSION];
        // Bias bucket keeps every vector non-zero
        vector[0] = 0.5;
        for word in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let bucket = 1 + (hasher.finish() % (TEST_DIMENSION as u64 - 1)) as usize;
            vector[bucket] += 1.0;
        }
        vector
    }
}

impl Embedder for HashingEmbedder {
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|text| Self::vector_for(text)).collect())
    }
}

/// Embedder that always fails
#[derive(Debug, Default)]
pub(crate) struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Err(anyhow::anyhow!("embedding backend unavailable"))
    }
}

/// Generator that answers "answer N", fails on chosen calls, and can park on a gate
#[derive(Debug, Default)]
pub(crate) struct ScriptedGenerator {
    calls: AtomicUsize,
    fail_on: HashSet<usize>,
    prompts: std::sync::Mutex<Vec<String>>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl ScriptedGenerator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail the given 1-based calls with a generation error
    pub(crate) fn failing_on(calls: impl IntoIterator<Item = usize>) -> Self {
        Self {
            fail_on: calls.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Signal `entered` once a call starts, then wait for `release` before answering
    pub(crate) fn gated(entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            gate: Some((entered, release)),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log lock").clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts
            .lock()
            .expect("prompt log lock")
            .push(prompt.to_string());

        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }

        if self.fail_on.contains(&call) {
            return Err(RagError::Generation(format!("scripted failure on call {call}")));
        }
        Ok(format!("answer {call}"))
    }
}
