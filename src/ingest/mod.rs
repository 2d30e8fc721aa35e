// Document ingestion
// Walks a documentation directory and turns supported files into overlapping text chunks

pub mod extractor;


use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::embeddings::chunking::{ChunkingConfig, split_text};
use crate::{RagError, Result};

/// A bounded slice of a source document's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChunk {
    /// Path of the file this chunk was read from
    pub source_path: PathBuf,
    /// The chunk text
    pub text: String,
    /// Position of this chunk within its source file
    pub sequence_index: usize,
}

/// Supported source formats, selected by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Markdown,
    Text,
    Html,
}

impl DocumentKind {
    #[inline]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "txt" => Some(Self::Text),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }

    /// Extract unstructured text from the raw file contents
    #[inline]
    pub fn extract(self, raw: &str) -> String {
        match self {
            Self::Markdown => extractor::markdown_to_text(raw),
            Self::Text => raw.to_string(),
            Self::Html => extractor::html_to_text(raw),
        }
    }
}

/// Load every supported document under `directory` and split it into chunks.
///
/// Files are visited in sorted order so repeated builds produce the same sequence.
/// Unsupported extensions are skipped; an empty directory yields no chunks.
#[inline]
pub fn load_and_split(directory: &Path, config: &ChunkingConfig) -> Result<Vec<DocumentChunk>> {
    if !directory.is_dir() {
        return Err(RagError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Document directory not found: {}", directory.display()),
        )));
    }

    let mut chunks = Vec::new();
    let mut documents = 0;

    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            RagError::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::other("Filesystem loop while walking document directory")
            }))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(kind) = DocumentKind::from_path(path) else {
            debug!("Skipping unsupported file: {}", path.display());
            continue;
        };

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                warn!("Skipping non UTF-8 file: {}", path.display());
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let file_chunks = split_document(path, kind, &raw, config);
        debug!("Loaded {} chunks from {}", file_chunks.len(), path.display());
        chunks.extend(file_chunks);
        documents += 1;
    }

    info!(
        "Loaded {} documents from {} into {} chunks",
        documents,
        directory.display(),
        chunks.len()
    );

    Ok(chunks)
}

/// Extract and split a single document
#[inline]
pub fn split_document(
    path: &Path,
    kind: DocumentKind,
    raw: &str,
    config: &ChunkingConfig,
) -> Vec<DocumentChunk> {
    let text = kind.extract(raw);
    split_text(&text, config)
        .into_iter()
        .enumerate()
        .map(|(sequence_index, text)| DocumentChunk {
            source_path: path.to_path_buf(),
            text,
            sequence_index,
        })
        .collect()
}
