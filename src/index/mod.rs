// Embedding index module
// Builds, opens and queries the persisted chunk index


use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::database::lancedb::{IndexEntry, SearchHit, StoredChunk, VectorStore};
use crate::embeddings::{ChunkingConfig, Embedder};
use crate::ingest::{DocumentChunk, load_and_split};
use crate::{RagError, Result};

/// Chunks embedded per progress step during a build
const BUILD_BATCH_SIZE: usize = 64;

/// Extra candidates fetched per query so equal-score chunks can be ordered by insertion.
/// The fetch widens further while the last candidate still ties the k-th.
const TIE_BREAK_HEADROOM: usize = 16;

/// A retrieved chunk with its cosine similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub text: String,
    pub source_path: PathBuf,
    pub score: f32,
}

/// Where the index lives and how to rebuild it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    pub store_dir: PathBuf,
    pub docs_dir: PathBuf,
    pub chunking: ChunkingConfig,
    /// Vector width used when the table is created empty
    pub dimension: usize,
}

impl IndexSettings {
    #[inline]
    pub fn from_config(config: &Config) -> Self {
        Self {
            store_dir: config.vector_database_path(),
            docs_dir: config.docs_dir.clone(),
            chunking: config.chunking.clone(),
            dimension: config.ollama.embedding_dimension as usize,
        }
    }
}

/// Persistent, similarity-searchable store of chunk embeddings
pub struct EmbeddingIndex {
    store: VectorStore,
    embedder: Arc<dyn Embedder>,
    len: usize,
}

impl std::fmt::Debug for EmbeddingIndex {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingIndex")
            .field("table", &self.store.table_name())
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl EmbeddingIndex {
    /// Embed every chunk and write a fresh table under `store_dir`, replacing any existing one.
    ///
    /// All vectors are computed before the table is touched, so an embedding failure leaves
    /// the previous state on disk.
    #[inline]
    pub async fn build(
        store_dir: &Path,
        chunks: &[DocumentChunk],
        embedder: Arc<dyn Embedder>,
        dimension: usize,
    ) -> Result<Self> {
        info!(
            "Building index at {} from {} chunks",
            store_dir.display(),
            chunks.len()
        );

        let vectors = embed_chunks(&embedder, chunks).await?;

        let dimension = match vectors.first() {
            Some(vector) if vector.len() != dimension => {
                warn!(
                    "Embedding model returned {} dimensions, configured {}; using model output",
                    vector.len(),
                    dimension
                );
                vector.len()
            }
            _ => dimension,
        };

        let store = VectorStore::connect(store_dir)
            .await
            .map_err(|e| RagError::IndexBuild(e.to_string()))?;
        store
            .recreate_table(dimension)
            .await
            .map_err(|e| RagError::IndexBuild(e.to_string()))?;

        let created_at = chrono::Utc::now().to_rfc3339();
        let entries: Vec<IndexEntry> = chunks
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(ordinal, (chunk, vector))| IndexEntry {
                id: uuid::Uuid::new_v4().to_string(),
                vector,
                chunk: StoredChunk {
                    source_path: chunk.source_path.to_string_lossy().into_owned(),
                    text: chunk.text.clone(),
                    sequence_index: u32::try_from(chunk.sequence_index).unwrap_or(u32::MAX),
                    ordinal: u32::try_from(ordinal).unwrap_or(u32::MAX),
                },
                created_at: created_at.clone(),
            })
            .collect();

        store
            .insert(&entries)
            .await
            .map_err(|e| RagError::IndexBuild(e.to_string()))?;

        info!("Index built with {} entries", entries.len());
        Ok(Self {
            store,
            embedder,
            len: entries.len(),
        })
    }

    /// Attach to an existing persisted index without re-embedding
    #[inline]
    pub async fn open(store_dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if !store_dir.is_dir() {
            return Err(RagError::IndexCorrupt(format!(
                "no index directory at {}",
                store_dir.display()
            )));
        }

        let store = VectorStore::connect(store_dir)
            .await
            .map_err(|e| RagError::IndexCorrupt(e.to_string()))?;

        if !store
            .table_exists()
            .await
            .map_err(|e| RagError::IndexCorrupt(e.to_string()))?
        {
            return Err(RagError::IndexCorrupt(format!(
                "no {} table in {}",
                store.table_name(),
                store_dir.display()
            )));
        }

        store
            .vector_dimension()
            .await
            .map_err(|e| RagError::IndexCorrupt(e.to_string()))?;
        let len = store
            .count()
            .await
            .map_err(|e| RagError::IndexCorrupt(e.to_string()))?;

        info!("Opened index at {} with {} entries", store_dir.display(), len);
        Ok(Self {
            store,
            embedder,
            len,
        })
    }

    /// Reuse the persisted index when it has entries, otherwise build it from the documents
    #[inline]
    pub async fn open_or_build(settings: &IndexSettings, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if !Self::exists(&settings.store_dir).await? {
            info!("No persisted index found, building from scratch");
            return Self::rebuild(settings, embedder).await;
        }

        let index = Self::open(&settings.store_dir, Arc::clone(&embedder)).await?;
        if index.is_empty() {
            info!("Persisted index is empty, rebuilding");
            return Self::rebuild(settings, embedder).await;
        }

        Ok(index)
    }

    /// Load the document directory and build a fresh index from it
    #[inline]
    pub async fn rebuild(settings: &IndexSettings, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let chunks = load_and_split(&settings.docs_dir, &settings.chunking)?;
        Self::build(&settings.store_dir, &chunks, embedder, settings.dimension).await
    }

    /// Whether a chunks table has been persisted under `store_dir`
    #[inline]
    pub async fn exists(store_dir: &Path) -> Result<bool> {
        if !store_dir.is_dir() {
            return Ok(false);
        }

        let store = VectorStore::connect(store_dir)
            .await
            .map_err(|e| RagError::IndexCorrupt(e.to_string()))?;
        store
            .table_exists()
            .await
            .map_err(|e| RagError::IndexCorrupt(e.to_string()))
    }

    /// The `k` most similar chunks, best first; equal scores keep insertion order
    #[inline]
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = embed_blocking(&self.embedder, vec![text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| RagError::Embedding("embedder returned no query vector".to_string()))?;

        let mut candidates = k.saturating_add(TIE_BREAK_HEADROOM).min(self.len);
        let mut hits = loop {
            let mut hits = self
                .store
                .search(&query_vector, candidates)
                .await
                .map_err(|e| RagError::IndexCorrupt(e.to_string()))?;
            hits.sort_by(compare_hits);

            if candidates >= self.len || !ties_reach_cutoff(&hits, k) {
                break hits;
            }
            candidates = candidates.saturating_mul(2).min(self.len);
            debug!("Widening query to {} candidates to order tied chunks", candidates);
        };
        hits.truncate(k);

        debug!("Query matched {} chunks", hits.len());
        Ok(hits
            .into_iter()
            .map(|hit| ScoredChunk {
                score: hit.similarity(),
                source_path: PathBuf::from(hit.chunk.source_path),
                text: hit.chunk.text,
            })
            .collect())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Whether the worst fetched candidate ties the k-th, so unfetched rows may tie too
fn ties_reach_cutoff(hits: &[SearchHit], k: usize) -> bool {
    match (k.checked_sub(1).and_then(|i| hits.get(i)), hits.last()) {
        (Some(kth), Some(last)) if hits.len() > k => last.distance <= kth.distance,
        _ => false,
    }
}

fn compare_hits(a: &SearchHit, b: &SearchHit) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then(a.chunk.ordinal.cmp(&b.chunk.ordinal))
}

async fn embed_chunks(
    embedder: &Arc<dyn Embedder>,
    chunks: &[DocumentChunk],
) -> Result<Vec<Vec<f32>>> {
    let bar = if console::user_attended_stderr() {
        ProgressBar::new(chunks.len() as u64).with_style(
            ProgressStyle::with_template("{bar:40} [{pos}/{len}] Embedding chunks")
                .expect("style template is valid"),
        )
    } else {
        ProgressBar::hidden()
    };

    let mut vectors = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(BUILD_BATCH_SIZE) {
        let texts = batch.iter().map(|chunk| chunk.text.clone()).collect();
        let embedded = embed_blocking(embedder, texts).await?;
        if embedded.len() != batch.len() {
            return Err(RagError::Embedding(format!(
                "expected {} vectors, embedder returned {}",
                batch.len(),
                embedded.len()
            )));
        }
        vectors.extend(embedded);
        bar.inc(batch.len() as u64);
    }

    bar.finish_and_clear();
    Ok(vectors)
}

/// Run the blocking embedder off the async runtime
async fn embed_blocking(embedder: &Arc<dyn Embedder>, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
    let embedder = Arc::clone(embedder);
    tokio::task::spawn_blocking(move || embedder.embed_batch(&texts))
        .await
        .map_err(|e| RagError::Embedding(format!("embedding task failed: {e}")))?
        .map_err(|e| RagError::Embedding(format!("{e:#}")))
}
