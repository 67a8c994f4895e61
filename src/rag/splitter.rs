//! Fixed-size, overlapping text splitter.
//!
//! Sizes are counted in characters (Unicode scalar values), never bytes, so a
//! given text always yields the same chunk boundaries.

use serde::{Deserialize, Serialize};

use super::chunk::{Chunk, ChunkMetadata};

/// Configuration for the splitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitterConfig {
    /// Target chunk length in characters
    pub chunk_size: usize,
    /// Characters repeated at the start of the next chunk
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 200,
            chunk_overlap: 30,
        }
    }
}

/// Separators tried, in order, when looking for a place to end a chunk.
const BREAK_PATTERNS: [&str; 7] = ["\n\n", ". ", "! ", "? ", ".\n", "\n", " "];

pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    /// Split `text` into overlapping chunks tagged with `source`.
    ///
    /// Consecutive windows share exactly `chunk_overlap` characters; stored
    /// content is the trimmed window, so the shared part may shrink when it is
    /// whitespace. `start_offset` is the character offset of the stored content.
    /// Inside a window the cut prefers a paragraph or sentence end in the back
    /// half of the window and falls back to a hard cut at `chunk_size`.
    pub fn split(&self, text: &str, source: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let size = self.config.chunk_size.max(1);
        let overlap = self.config.chunk_overlap.min(size - 1);

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let hard_end = (start + size).min(total);
            let end = if hard_end < total {
                find_break(&chars, start, hard_end, overlap)
            } else {
                hard_end
            };

            let window: String = chars[start..end].iter().collect();
            let content = window.trim();
            if !content.is_empty() {
                let leading = window.chars().take_while(|c| c.is_whitespace()).count();
                let chunk_index = chunks.len();
                chunks.push(Chunk::new(content).with_metadata(ChunkMetadata {
                    source: source.to_string(),
                    chunk_index: Some(chunk_index),
                    start_offset: Some(start + leading),
                }));
            }

            if end >= total {
                break;
            }
            start = end - overlap;
        }

        chunks
    }
}

/// Pick an end position in `(start + overlap, hard_end]` so the next window
/// still moves forward.
fn find_break(chars: &[char], start: usize, hard_end: usize, overlap: usize) -> usize {
    let window_len = hard_end - start;
    let earliest = (start + window_len / 2).max(start + overlap + 1);
    if earliest >= hard_end {
        return hard_end;
    }

    let window: String = chars[earliest..hard_end].iter().collect();
    for pattern in BREAK_PATTERNS {
        if let Some(byte_pos) = window.rfind(pattern) {
            let char_pos = window[..byte_pos].chars().count() + pattern.chars().count();
            return earliest + char_pos;
        }
    }

    hard_end
}
