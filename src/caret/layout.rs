//! Layout oracle for geometry-dependent caret movement.
//!
//! Vertical movement picks the token on the destination line that is
//! horizontally closest to the caret. Where tokens are drawn is the host's
//! business, so the caret asks a [`Layout`] for token boxes instead of
//! computing them itself.

use crate::source::{Source, TokenSpan};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Horizontal distance from `x` to this box; zero inside it
    pub fn horizontal_distance(&self, x: f32) -> f32 {
        if x < self.x {
            self.x - x
        } else if x > self.right() {
            x - self.right()
        } else {
            0.0
        }
    }
}

/// Rendered geometry of tokens
pub trait Layout {
    /// Bounding box of a token as rendered, None if it is not on screen
    fn bounding_box(&self, source: &Source, token: &TokenSpan) -> Option<Rect>;
}

/// Grid layout: every grapheme is one cell of a fixed size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceLayout {
    pub char_width: f32,
    pub line_height: f32,
}

impl MonospaceLayout {
    pub fn new(char_width: f32, line_height: f32) -> Self {
        Self {
            char_width,
            line_height,
        }
    }
}

impl Default for MonospaceLayout {
    fn default() -> Self {
        Self::new(10.0, 20.0)
    }
}

impl Layout for MonospaceLayout {
    fn bounding_box(&self, source: &Source, token: &TokenSpan) -> Option<Rect> {
        let text = source.text();
        let line = text.line_of(token.start);
        let column = token.start - text.line_start(line)?;
        Some(Rect::new(
            column as f32 * self.char_width,
            line as f32 * self.line_height,
            (token.end - token.start) as f32 * self.char_width,
            self.line_height,
        ))
    }
}
