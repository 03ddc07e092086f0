//! Recursive separator splitting.
//!
//! Tries paragraph breaks, then line breaks, then spaces, then single
//! characters, so chunks end on the coarsest boundary that fits.

use super::{Chunk, ChunkingConfig, TextSplitter};
use tracing::warn;

const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Recursive character splitter.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    config: ChunkingConfig,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    pub fn new(config: ChunkingConfig) -> Self {
        Self::with_separators(config, DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect())
    }

    /// Use a custom separator list, coarsest first. An empty string splits into characters.
    pub fn with_separators(config: ChunkingConfig, separators: Vec<String>) -> Self {
        Self { config, separators }
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // Pick the first separator present in the text; "" always applies.
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut good_splits: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.config.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }

            if remaining.is_empty() {
                final_chunks.push(piece.to_string());
            } else {
                final_chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// Greedily merge small splits into chunks, carrying a tail of at most
    /// `chunk_overlap` characters into the next chunk.
    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let ChunkingConfig {
            chunk_size,
            chunk_overlap,
        } = self.config;

        let mut docs = Vec::new();
        let mut current: std::collections::VecDeque<(&str, usize)> = std::collections::VecDeque::new();
        let mut total = 0usize;

        for &split in splits {
            let len = char_len(split);

            if total + len > chunk_size {
                if total > chunk_size {
                    warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, chunk_size
                    );
                }
                if !current.is_empty() {
                    push_joined(&mut docs, current.iter().map(|(s, _)| *s));

                    while total > chunk_overlap || (total + len > chunk_size && total > 0) {
                        match current.pop_front() {
                            Some((_, front_len)) => total -= front_len,
                            None => break,
                        }
                    }
                }
            }

            current.push_back((split, len));
            total += len;
        }

        push_joined(&mut docs, current.iter().map(|(s, _)| *s));
        docs
    }
}

impl TextSplitter for RecursiveSplitter {
    fn split(&self, text: &str) -> Vec<Chunk> {
        self.split_recursive(text, &self.separators)
            .into_iter()
            .enumerate()
            .map(|(order, content)| Chunk::new(order, content))
            .collect()
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Join splits, trim the edges, keep the result only if non-empty.
fn push_joined<'a>(docs: &mut Vec<String>, splits: impl Iterator<Item = &'a str>) {
    let joined: String = splits.collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}

/// Split on `separator`, attaching each separator to the start of the piece
/// that follows it. Empty pieces are dropped; an empty separator yields characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut last = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > last {
            pieces.push(&text[last..idx]);
        }
        last = idx;
    }
    if last < text.len() {
        pieces.push(&text[last..]);
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}
