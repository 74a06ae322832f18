//! Offset-mapped text search.
//!
//! Phrases are matched against a plain-text projection of the document in
//! which embeds contribute no characters. Every projected char remembers the
//! document offset it came from, so hits translate back to document ranges
//! even when an embed sits between two runs.

use crate::document::{Document, Insert};

/// A match in document-offset space. `len` is always > 0 for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocatedRange {
    pub start: usize,
    pub len: usize,
}

impl LocatedRange {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOptions {
    pub case_sensitive: bool,
}

impl SearchOptions {
    pub fn case_sensitive() -> Self {
        Self {
            case_sensitive: true,
        }
    }

    pub fn case_insensitive() -> Self {
        Self::default()
    }
}

/// Plain-text view of a document with a per-char offset map.
#[derive(Debug, Clone, Default)]
pub struct TextProjection {
    chars: Vec<char>,
    offsets: Vec<usize>,
}

impl TextProjection {
    pub fn new(doc: &Document) -> Self {
        let mut projection = Self::default();
        let mut offset = 0;
        for op in doc.ops() {
            match &op.insert {
                Insert::Text(text) => {
                    for c in text.chars() {
                        projection.chars.push(c);
                        projection.offsets.push(offset);
                        offset += 1;
                    }
                }
                Insert::Embed(_) => offset += 1,
            }
        }
        projection
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Document offset of the projected char at `index`.
    pub fn offset_of(&self, index: usize) -> Option<usize> {
        self.offsets.get(index).copied()
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    /// Every, possibly overlapping, occurrence of `phrase`.
    ///
    /// An embed is not text, so "bc" does not occur in `ab<embed>cd`.
    pub fn find_all(&self, phrase: &str, options: SearchOptions) -> Vec<LocatedRange> {
        let needle: Vec<char> = phrase
            .chars()
            .map(|c| fold(c, options.case_sensitive))
            .collect();
        if needle.is_empty() || needle.len() > self.chars.len() {
            return Vec::new();
        }

        let haystack: Vec<char> = self
            .chars
            .iter()
            .map(|c| fold(*c, options.case_sensitive))
            .collect();

        haystack
            .windows(needle.len())
            .enumerate()
            .filter(|(_, window)| *window == needle.as_slice())
            .map(|(p, _)| {
                let start = self.offsets[p];
                let last = self.offsets[p + needle.len() - 1];
                LocatedRange {
                    start,
                    len: last - start + 1,
                }
            })
            .filter(|range| range.len == needle.len())
            .collect()
    }
}

/// Case folding that keeps the projection 1:1 with its offset map.
///
/// Chars whose lowercase form is more than one char are left as they are.
fn fold(c: char, case_sensitive: bool) -> char {
    if case_sensitive {
        return c;
    }
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Find every occurrence of `phrase` in `doc`.
pub fn find_all(doc: &Document, phrase: &str, case_sensitive: bool) -> Vec<LocatedRange> {
    let options = SearchOptions { case_sensitive };
    let ranges = TextProjection::new(doc).find_all(phrase, options);
    tracing::trace!(
        target: "weaver::richtext::search",
        phrase,
        case_sensitive,
        matches = ranges.len(),
        "located phrase"
    );
    ranges
}
