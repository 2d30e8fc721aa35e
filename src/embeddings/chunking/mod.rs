#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_CHUNK_SIZE: usize = 2000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Split boundaries in order of preference: paragraph, line, word.
/// When none of these fall inside the window the text is cut at the size limit.
const SEPARATORS: &[&[char]] = &[&['\n', '\n'], &['\n'], &[' ']];

/// Configuration for the recursive text splitter.
///
/// Both sizes are measured in characters (Unicode scalar values), not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length
    pub chunk_size: usize,
    /// Number of characters shared by adjacent chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Split text into chunks of at most `chunk_size` characters.
///
/// Each chunk ends on the latest paragraph break that fits, falling back to a line
/// break, then a space, then a hard cut. Chunk `i + 1` starts with the last
/// `chunk_overlap` characters of chunk `i`.
#[inline]
pub fn split_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let size = config.chunk_size.max(1);
    let overlap = config.chunk_overlap.min(size - 1);
    let chars: Vec<char> = text.chars().collect();

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        if chars.len() - start <= size {
            chunks.push(chars[start..].iter().collect());
            break;
        }

        // The end must land past the overlap so the next chunk makes progress
        let end = find_split_point(&chars, start + overlap + 1, start + size);
        chunks.push(chars[start..end].iter().collect());
        start = end - overlap;
    }

    debug!(
        "Split {} characters into {} chunks (size {}, overlap {})",
        chars.len(),
        chunks.len(),
        size,
        overlap
    );

    chunks
}

/// Find the preferred end position in `min_end..=max_end`.
///
/// Separators stay attached to the end of the chunk they terminate.
fn find_split_point(chars: &[char], min_end: usize, max_end: usize) -> usize {
    for separator in SEPARATORS {
        let boundary = (min_end..=max_end)
            .rev()
            .find(|&end| end >= separator.len() && chars[end - separator.len()..end] == **separator);
        if let Some(end) = boundary {
            return end;
        }
    }

    max_end
}
