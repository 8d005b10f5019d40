//! Grapheme-indexed, persistent document text.
//!
//! Offsets everywhere in the editing core count extended grapheme clusters,
//! not chars or bytes. `Text` keeps a `ropey::Rope` (clones share storage, so
//! every document version keeps its own text cheaply) plus a boundary table
//! that maps grapheme offsets to rope char indices.

use std::ops::Range;
use std::sync::Arc;

use ropey::Rope;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Default)]
pub struct Text {
    rope: Rope,
    /// Char index of every grapheme boundary; always starts with 0 and ends
    /// with the rope's char length.
    boundaries: Arc<[usize]>,
}

impl Text {
    pub fn new(text: &str) -> Self {
        let mut boundaries = Vec::with_capacity(text.len() + 1);
        let mut chars = 0;
        boundaries.push(0);
        for grapheme in text.graphemes(true) {
            chars += grapheme.chars().count();
            boundaries.push(chars);
        }
        Self {
            rope: Rope::from_str(text),
            boundaries: boundaries.into(),
        }
    }

    /// Length in graphemes
    pub fn len(&self) -> usize {
        self.boundaries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn char_index(&self, offset: usize) -> Option<usize> {
        self.boundaries.get(offset).copied()
    }

    /// The grapheme at `offset`, None if out of bounds
    pub fn grapheme(&self, offset: usize) -> Option<String> {
        let start = self.char_index(offset)?;
        let end = self.char_index(offset + 1)?;
        Some(self.rope.slice(start..end).to_string())
    }

    /// Text between two grapheme offsets, None if the range is invalid
    pub fn slice(&self, range: Range<usize>) -> Option<String> {
        if range.start > range.end {
            return None;
        }
        let start = self.char_index(range.start)?;
        let end = self.char_index(range.end)?;
        Some(self.rope.slice(start..end).to_string())
    }

    /// New text with `insertion` spliced in at `offset`
    pub fn with_inserted(&self, offset: usize, insertion: &str) -> Option<Text> {
        let at = self.char_index(offset)?;
        let mut rope = self.rope.clone();
        rope.insert(at, insertion);
        Some(Self::new(&rope.to_string()))
    }

    /// New text without the graphemes in `range`
    pub fn with_removed(&self, range: Range<usize>) -> Option<Text> {
        if range.start > range.end {
            return None;
        }
        let start = self.char_index(range.start)?;
        let end = self.char_index(range.end)?;
        let mut rope = self.rope.clone();
        rope.remove(start..end);
        Some(Self::new(&rope.to_string()))
    }

    /// Zero-based line containing `offset`
    pub fn line_of(&self, offset: usize) -> usize {
        let at = self
            .char_index(offset.min(self.len()))
            .unwrap_or(self.rope.len_chars());
        self.rope.char_to_line(at)
    }

    /// Grapheme offset at which `line` starts, None past the last line
    pub fn line_start(&self, line: usize) -> Option<usize> {
        if line >= self.rope.len_lines() {
            return None;
        }
        let char_start = self.rope.line_to_char(line);
        self.boundaries.binary_search(&char_start).ok()
    }

    /// Grapheme offset of the end of `line`, before its newline
    pub fn line_end(&self, line: usize) -> Option<usize> {
        let start = self.line_start(line)?;
        let next = self.line_start(line + 1);
        Some(match next {
            // The grapheme before the next line's start is the newline
            Some(next) => next.saturating_sub(1).max(start),
            None => self.len(),
        })
    }

    /// Whether `line` contains nothing but spaces and tabs
    pub fn is_blank_line(&self, line: usize) -> bool {
        match (self.line_start(line), self.line_end(line)) {
            (Some(start), Some(end)) => self
                .slice(start..end)
                .is_some_and(|s| s.chars().all(|c| c == ' ' || c == '\t' || c == '\r')),
            _ => false,
        }
    }
}

impl std::fmt::Display for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        self.rope == other.rope
    }
}

impl Eq for Text {}
