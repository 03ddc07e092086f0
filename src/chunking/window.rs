//! Fixed-size character windows.

use super::{Chunk, ChunkingConfig, TextSplitter};

/// Slides a window of `chunk_size` characters with a stride of
/// `chunk_size - chunk_overlap`, so consecutive chunks share exactly
/// `chunk_overlap` characters. Text is not trimmed.
#[derive(Debug, Clone)]
pub struct WindowSplitter {
    config: ChunkingConfig,
}

impl WindowSplitter {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }
}

impl TextSplitter for WindowSplitter {
    fn split(&self, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let size = self.config.chunk_size.max(1);
        let stride = size.saturating_sub(self.config.chunk_overlap).max(1);

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + size).min(chars.len());
            chunks.push(Chunk::new(chunks.len(), chars[start..end].iter().collect::<String>()));
            if end == chars.len() {
                break;
            }
            start += stride;
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(chunk_size: usize, chunk_overlap: usize) -> WindowSplitter {
        WindowSplitter::new(ChunkingConfig {
            chunk_size,
            chunk_overlap,
        })
    }

    #[test]
    fn test_exact_overlap() {
        let text: String = ('a'..='z').cycle().take(2500).collect();
        let chunks = splitter(1000, 200).split(&text);

        assert_eq!(chunks.len(), 3);
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].content.chars().collect();
            let next: Vec<char> = pair[1].content.chars().collect();
            assert_eq!(prev[prev.len() - 200..], next[..200]);
        }
        assert!(chunks.iter().all(|c| c.char_len() <= 1000));
    }

    #[test]
    fn test_covers_whole_text() {
        let chunks = splitter(4, 1).split("abcdefghij");
        let contents: Vec<_> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn test_empty_and_short() {
        assert!(splitter(10, 2).split("").is_empty());
        assert_eq!(splitter(10, 2).split("short").len(), 1);
    }
}
