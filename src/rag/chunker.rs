//! Sentence-aware text chunking.
//!
//! Lengths and offsets are counted in characters, not bytes, so multi-byte
//! text never splits inside a code point.

use crate::types::{AppError, Chunk, Result};

/// How far back from a tentative boundary to look for a sentence end.
pub const SENTENCE_SEARCH_WINDOW: usize = 100;

const SENTENCE_TERMINALS: [char; 3] = ['.', '!', '?'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Fails on `chunk_size == 0` or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(AppError::InvalidInput(
                "chunk_size must be greater than zero".into(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::InvalidInput(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into overlapping chunks, breaking after sentence ends where
    /// one is close enough to the size limit.
    pub fn chunk(&self, document_id: &str, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();

        if total <= self.chunk_size {
            push_trimmed(&mut chunks, document_id, &chars, 0, total);
            return chunks;
        }

        let mut start = 0;
        while start < total {
            let mut end = (start + self.chunk_size).min(total);

            if end < total {
                if let Some(boundary) = self.sentence_boundary(&chars, start, end) {
                    end = boundary;
                }
            }

            push_trimmed(&mut chunks, document_id, &chars, start, end);

            if end >= total {
                break;
            }

            let next = end.saturating_sub(self.chunk_overlap);
            start = if next > start { next } else { end };
        }

        chunks
    }

    /// Position just past the last sentence terminal in
    /// `[max(start, end - window), end)`.
    fn sentence_boundary(&self, chars: &[char], start: usize, end: usize) -> Option<usize> {
        let floor = end.saturating_sub(SENTENCE_SEARCH_WINDOW).max(start);
        (floor..end)
            .rev()
            .find(|&i| SENTENCE_TERMINALS.contains(&chars[i]))
            .map(|i| i + 1)
    }
}

fn push_trimmed(chunks: &mut Vec<Chunk>, document_id: &str, chars: &[char], start: usize, end: usize) {
    let slice = &chars[start..end];

    let Some(first) = slice.iter().position(|c| !c.is_whitespace()) else {
        return;
    };
    let last = slice
        .iter()
        .rposition(|c| !c.is_whitespace())
        .unwrap_or(first);

    chunks.push(Chunk {
        source_document_id: document_id.to_string(),
        sequence_index: chunks.len(),
        text: slice[first..=last].iter().collect(),
        char_start: start + first,
        char_end: start + last + 1,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeated(pattern: &str, len: usize) -> String {
        pattern.chars().cycle().take(len).collect()
    }

    #[test]
    fn test_short_text_is_single_trimmed_chunk() {
        let chunker = TextChunker::new(1000, 200).unwrap();
        let chunks = chunker.chunk("doc", "  Hello world.  ");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello world.");
        assert_eq!(chunks[0].char_start, 2);
        assert_eq!(chunks[0].char_end, 14);
        assert_eq!(chunks[0].sequence_index, 0);
    }

    #[test]
    fn test_whitespace_only_text_yields_nothing() {
        let chunker = TextChunker::new(10, 2).unwrap();
        assert!(chunker.chunk("doc", "   \n\t ").is_empty());
        assert!(chunker.chunk("doc", "").is_empty());
    }

    #[test]
    fn test_sentence_pattern_produces_two_chunks() {
        let text = repeated("A. B. C. D. ", 1200);
        let chunker = TextChunker::new(1000, 200).unwrap();
        let chunks = chunker.chunk("doc", &text);

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].char_end <= 1000);
        assert!(chunks[0].text.ends_with('.'));
        assert!(chunks[1].char_start <= 800);
        assert_eq!(chunks[1].char_end, text.trim_end().chars().count());
    }

    #[test]
    fn test_hard_boundary_without_terminals() {
        let text = "x".repeat(250);
        let chunker = TextChunker::new(100, 20).unwrap();
        let chunks = chunker.chunk("doc", &text);

        let spans: Vec<(usize, usize)> = chunks.iter().map(|c| (c.char_start, c.char_end)).collect();
        assert_eq!(spans, vec![(0, 100), (80, 180), (160, 250)]);
    }

    #[test]
    fn test_chunks_cover_text_within_size() {
        let text = repeated("The quick brown fox jumps. Over the lazy dog! Why? ", 5000);
        let chunker = TextChunker::new(300, 50).unwrap();
        let chunks = chunker.chunk("doc", &text);

        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].char_start, 0);
        for chunk in &chunks {
            assert!(chunk.char_end - chunk.char_start <= 300);
            assert!(!chunk.text.is_empty());
        }
        for pair in chunks.windows(2) {
            // Overlap or adjacency, never a gap of non-whitespace text.
            assert!(pair[1].char_start <= pair[0].char_end + 1);
            assert!(pair[1].char_start > pair[0].char_start);
        }
        assert_eq!(
            chunks.last().unwrap().char_end,
            text.trim_end().chars().count()
        );
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.sequence_index, i);
        }
    }

    #[test]
    fn test_deterministic() {
        let text = repeated("One. Two! Three? ", 2000);
        let chunker = TextChunker::new(128, 32).unwrap();
        assert_eq!(chunker.chunk("doc", &text), chunker.chunk("doc", &text));
    }

    #[test]
    fn test_multibyte_text() {
        let text = repeated("Grüße aus Köln. ", 400);
        let chunker = TextChunker::new(100, 10).unwrap();
        let chunks = chunker.chunk("doc", &text);
        for chunk in &chunks {
            assert_eq!(chunk.text.chars().count(), chunk.char_end - chunk.char_start);
        }
    }

    #[test]
    fn test_degenerate_configuration_fails_fast() {
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(100, 100).is_err());
        assert!(TextChunker::new(100, 150).is_err());
        assert!(TextChunker::new(100, 99).is_ok());
    }
}
