//! Separator-aware text chunking with bounded size and overlap

use unicode_segmentation::UnicodeSegmentation;

use crate::types::{Chunk, Document, SourceLabel};

/// Separators tried after any caller-supplied list is exhausted
const FALLBACK_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Text chunker with configurable size and overlap.
///
/// Splits on a prioritized separator list, recursing into finer
/// separators for oversized pieces, then merges adjacent pieces into
/// chunks no larger than `chunk_size` characters. Each chunk starts
/// with up to `overlap` characters carried from the previous one.
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap,
        }
    }

    /// Chunk a document, tagging every chunk with the caller's source label.
    /// Chunks inherit the document's metadata.
    pub fn chunk_document(
        &self,
        doc: &Document,
        source: SourceLabel,
        separators: Option<&[String]>,
    ) -> Vec<Chunk> {
        self.split_text(&doc.text, separators)
            .into_iter()
            .enumerate()
            .map(|(index, content)| {
                let mut chunk = Chunk::new(doc.id, content, source, index as u32);
                chunk.metadata = doc.metadata.clone();
                chunk
            })
            .collect()
    }

    /// Split text into bounded segments. `None` separators means plain
    /// whitespace/length splitting.
    pub fn split_text(&self, text: &str, separators: Option<&[String]>) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut chain: Vec<String> = separators.map(<[String]>::to_vec).unwrap_or_default();
        for sep in FALLBACK_SEPARATORS {
            if !chain.iter().any(|s| s == sep) {
                chain.push((*sep).to_string());
            }
        }

        let fragments = self.fragment(text, &chain);
        self.merge(fragments)
    }

    /// Recursively break text into pieces of at most `chunk_size` characters,
    /// preferring earlier separators and keeping each matched separator
    /// attached to the start of the piece it introduces
    fn fragment(&self, text: &str, separators: &[String]) -> Vec<String> {
        let chosen = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep.as_str()));

        let index = match chosen {
            Some(index) => index,
            None => return split_chars(text),
        };

        let separator = &separators[index];
        let remaining = &separators[index + 1..];

        let mut fragments = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) <= self.chunk_size {
                fragments.push(piece);
            } else if remaining.is_empty() {
                fragments.extend(split_chars(&piece));
            } else {
                fragments.extend(self.fragment(&piece, remaining));
            }
        }
        fragments
    }

    /// Greedily merge fragments into chunks, carrying an overlap tail
    /// from each finished chunk into the next
    fn merge(&self, fragments: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for fragment in fragments {
            if !current.is_empty()
                && char_len(&current) + char_len(&fragment) > self.chunk_size
            {
                let finished = current.trim();
                if !finished.is_empty() {
                    chunks.push(finished.to_string());
                }

                let seed = self.overlap_tail(&current);
                current = if char_len(&seed) + char_len(&fragment) > self.chunk_size {
                    String::new()
                } else {
                    seed
                };
            }
            current.push_str(&fragment);
        }

        let finished = current.trim();
        if !finished.is_empty() {
            chunks.push(finished.to_string());
        }

        chunks
    }

    /// Last `overlap` characters of a chunk, advanced to a word boundary
    fn overlap_tail(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }
        let total = char_len(text);
        if total <= self.overlap {
            return text.trim_end().to_string();
        }

        let byte_start = text
            .char_indices()
            .nth(total - self.overlap)
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        let tail = &text[byte_start..];

        for (offset, word) in tail.split_word_bound_indices() {
            if offset > 0 && !word.trim().is_empty() {
                return tail[offset..].trim_end().to_string();
            }
        }

        tail.trim_end().to_string()
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split per character, for runs no separator can break
fn split_chars(text: &str) -> Vec<String> {
    text.chars().map(String::from).collect()
}

/// Split so that each occurrence of `separator` begins a new piece.
/// Text before the first occurrence becomes a separator-less piece.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return split_chars(text);
    }

    let mut boundaries: Vec<usize> = vec![0];
    boundaries.extend(text.match_indices(separator).map(|(index, _)| index));
    boundaries.push(text.len());
    boundaries.dedup();

    boundaries
        .windows(2)
        .map(|pair| text[pair[0]..pair[1]].to_string())
        .filter(|piece| !piece.is_empty())
        .collect()
}
