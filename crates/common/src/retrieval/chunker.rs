//! Text chunking
//!
//! Sliding-window split of document text into overlapping chunks.

use tracing::debug;

/// Configuration for text chunking
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// A text chunk with its position in the source
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// The chunk content
    pub content: String,
    /// Index of this chunk in the document
    pub index: usize,
    /// Start character position in original text
    pub start_pos: usize,
    /// End character position in original text (exclusive)
    pub end_pos: usize,
}

/// Split text into overlapping windows of `chunk_size` characters
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<TextChunk> {
    let chars: Vec<char> = text.chars().collect();
    let total_len = chars.len();
    let mut chunks = Vec::new();

    if total_len == 0 || config.chunk_size == 0 {
        return chunks;
    }

    // Overlap must leave forward progress
    let step = config
        .chunk_size
        .saturating_sub(config.chunk_overlap)
        .max(1);

    let mut start = 0;
    loop {
        let end = (start + config.chunk_size).min(total_len);
        chunks.push(TextChunk {
            content: chars[start..end].iter().collect(),
            index: chunks.len(),
            start_pos: start,
            end_pos: end,
        });

        if end == total_len {
            break;
        }
        start += step;
    }

    debug!(
        input_len = total_len,
        chunk_count = chunks.len(),
        chunk_size = config.chunk_size,
        "Text chunked"
    );

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = chunk_text("hello world", &ChunkingConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "hello world");
    }

    #[test]
    fn test_overlap_windows() {
        let text: String = std::iter::repeat('a').take(1500).collect();
        let chunks = chunk_text(&text, &ChunkingConfig::default());

        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].start_pos, chunks[0].end_pos), (0, 1000));
        assert_eq!((chunks[1].start_pos, chunks[1].end_pos), (800, 1500));
    }

    #[test]
    fn test_degenerate_overlap_still_progresses() {
        let config = ChunkingConfig {
            chunk_size: 4,
            chunk_overlap: 10,
        };
        let chunks = chunk_text("abcdefgh", &config);
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks.last().unwrap().content, "efgh");
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", &ChunkingConfig::default()).is_empty());
    }
}
