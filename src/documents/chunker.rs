//! Document chunking strategies.
//!
//! Provides the `Chunker` trait and the recursive character splitter used for
//! ingestion.

use std::collections::VecDeque;

use super::config::{ChunkingConfig, DEFAULT_SEPARATORS};

/// A raw chunk before being assigned an ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    /// The text content of this chunk.
    pub content: String,
}

impl RawChunk {
    /// Create a new raw chunk.
    pub fn new(content: String) -> Self {
        Self { content }
    }

    /// Get character count.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Trait for document chunking strategies.
pub trait Chunker: Send + Sync {
    /// Split document content into chunks.
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Vec<RawChunk>;
}

/// Recursive character splitter.
///
/// Algorithm:
/// 1. Pick the first separator that occurs in the text (paragraph break,
///    line break, space, then the empty separator meaning "any character")
/// 2. Split on it, keeping the separator at the start of the following piece
/// 3. Greedily merge pieces smaller than `chunk_size` into chunks, carrying
///    up to `chunk_overlap` characters of the previous chunk forward
/// 4. Recurse into pieces that are still too large with the remaining
///    separators
///
/// Sizes are counted in characters, not bytes. Chunks never exceed
/// `chunk_size` once the character-level fallback is reached.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Create a chunker with the default separator cascade.
    pub fn new() -> Self {
        Self::with_separators(DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect())
    }

    /// Create a chunker with a custom separator cascade (most preferred first).
    pub fn with_separators(separators: Vec<String>) -> Self {
        Self { separators }
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Vec<RawChunk> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();

        split_recursive(content, &separators, config)
            .into_iter()
            .filter_map(|chunk| {
                let trimmed = chunk.trim();
                (!trimmed.is_empty()).then(|| RawChunk::new(trimmed.to_string()))
            })
            .collect()
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split `text` with the first applicable separator, recursing on oversized pieces.
fn split_recursive(text: &str, separators: &[&str], config: &ChunkingConfig) -> Vec<String> {
    let mut separator = separators.last().copied().unwrap_or("");
    let mut remaining: &[&str] = &[];

    for (i, candidate) in separators.iter().enumerate() {
        if candidate.is_empty() {
            separator = candidate;
            break;
        }
        if text.contains(candidate) {
            separator = candidate;
            remaining = &separators[i + 1..];
            break;
        }
    }

    let mut chunks = Vec::new();
    let mut fitting: Vec<&str> = Vec::new();

    for piece in split_keeping_separator(text, separator) {
        if char_len(piece) < config.chunk_size {
            fitting.push(piece);
            continue;
        }

        if !fitting.is_empty() {
            chunks.extend(merge_pieces(&fitting, config));
            fitting.clear();
        }

        if remaining.is_empty() {
            chunks.push(piece.to_string());
        } else {
            chunks.extend(split_recursive(piece, remaining, config));
        }
    }

    if !fitting.is_empty() {
        chunks.extend(merge_pieces(&fitting, config));
    }

    chunks
}

/// Split on `separator`, attaching each separator to the piece that follows it.
///
/// The empty separator splits into single characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Merge small pieces into chunks of at most `chunk_size` characters.
///
/// When a chunk is emitted, pieces are dropped from the front of the window
/// until at most `chunk_overlap` characters remain; those carry over as the
/// head of the next chunk.
fn merge_pieces(pieces: &[&str], config: &ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for piece in pieces {
        let len = char_len(piece);

        if total + len > config.chunk_size && !window.is_empty() {
            if let Some(chunk) = join_window(&window) {
                chunks.push(chunk);
            }

            while total > config.chunk_overlap || (total + len > config.chunk_size && total > 0) {
                match window.pop_front() {
                    Some(front) => total -= char_len(front),
                    None => break,
                }
            }
        }

        window.push_back(piece);
        total += len;
    }

    if let Some(chunk) = join_window(&window) {
        chunks.push(chunk);
    }

    chunks
}

fn join_window(window: &VecDeque<&str>) -> Option<String> {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, chunk_overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size,
            chunk_overlap,
        }
    }

    #[test]
    fn test_empty_content() {
        let chunker = RecursiveChunker::new();
        assert!(chunker.chunk("", &ChunkingConfig::default()).is_empty());
        assert!(chunker.chunk("  \n\n \n", &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = RecursiveChunker::new();
        let content = "EduTrack helps educational institutions monitor student engagement.";
        let chunks = chunker.chunk(content, &ChunkingConfig::default());

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, content);
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let chunker = RecursiveChunker::new();
        let first = "Alpha ".repeat(60);
        let second = "Beta ".repeat(60);
        let content = format!("{first}\n\n{second}");

        let chunks = chunker.chunk(&content, &ChunkingConfig::default());

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, first.trim());
        assert_eq!(chunks[1].content, second.trim());
    }

    #[test]
    fn test_falls_back_to_line_breaks() {
        let chunker = RecursiveChunker::new();
        let lines: Vec<String> = (0..40)
            .map(|i| format!("Line {i:02} of the frequently asked questions."))
            .collect();
        let content = lines.join("\n");

        let chunks = chunker.chunk(&content, &ChunkingConfig::default());

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.char_count() <= 500);
            // Every cut lands on a line boundary, so each chunk starts a line.
            assert!(chunk.content.starts_with("Line "), "{}", chunk.content);
        }
    }

    #[test]
    fn test_chunks_respect_size_budget() {
        let chunker = RecursiveChunker::new();
        let content = "word ".repeat(400);
        let config = config(100, 20);

        let chunks = chunker.chunk(&content, &config);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.char_count() <= config.chunk_size);
        }
    }

    #[test]
    fn test_overlap_between_consecutive_chunks() {
        let chunker = RecursiveChunker::new();
        let words: Vec<String> = (0..300).map(|i| format!("w{i}")).collect();
        let content = words.join(" ");
        let config = config(100, 20);

        let chunks = chunker.chunk(&content, &config);
        assert!(chunks.len() > 2);

        for pair in chunks.windows(2) {
            let head = pair[1]
                .content
                .split_whitespace()
                .next()
                .expect("chunk has at least one word");
            let tail_words: Vec<&str> = pair[0].content.split_whitespace().collect();
            assert!(
                tail_words.contains(&head),
                "expected '{head}' from the next chunk to repeat the previous tail"
            );
        }
    }

    #[test]
    fn test_character_fallback_without_whitespace() {
        let chunker = RecursiveChunker::new();
        let content = "x".repeat(1200);
        let config = config(500, 50);

        let chunks = chunker.chunk(&content, &config);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.char_count() <= 500));
        assert_eq!(chunks[0].char_count(), 500);
    }

    #[test]
    fn test_multibyte_text_counts_characters() {
        let chunker = RecursiveChunker::new();
        let content = "é".repeat(120);
        let chunks = chunker.chunk(&content, &config(50, 10));

        assert!(chunks.iter().all(|c| c.char_count() <= 50));
        assert!(chunks.len() >= 3);
    }

    #[test]
    fn test_split_keeping_separator_attaches_to_following_piece() {
        let pieces = split_keeping_separator("a b c", " ");
        assert_eq!(pieces, vec!["a", " b", " c"]);

        let pieces = split_keeping_separator("\n\nlead", "\n\n");
        assert_eq!(pieces, vec!["\n\nlead"]);
    }
}
