//! Caret movement: horizontal, vertical, line ends, and selection descent.

use serde::{Deserialize, Serialize};

use super::layout::Layout;
use super::{Caret, Position};
use crate::source::{Sym, TokenSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalDirection {
    Up,
    Down,
}

impl Caret {
    pub fn left(&self, by_sibling: bool) -> Option<Caret> {
        self.horizontal(-1, by_sibling)
    }

    pub fn right(&self, by_sibling: bool) -> Option<Caret> {
        self.horizontal(1, by_sibling)
    }

    /// Move one step in `direction` (-1 or 1).
    ///
    /// A selection collapses to its edge, or with `by_sibling` moves to the
    /// neighbouring child of its parent. An offset selects the token it is
    /// about to cross, selecting a placeholder as a whole.
    fn horizontal(&self, direction: i32, by_sibling: bool) -> Option<Caret> {
        let source = self.source();
        match self.position() {
            Position::Node(id) => {
                if by_sibling {
                    let siblings = source.parent(id)?.children();
                    let index = siblings.iter().position(|child| child.id() == id)?;
                    let target = if direction < 0 {
                        index.checked_sub(1)?
                    } else {
                        index + 1
                    };
                    let sibling = siblings.get(target)?;
                    return Some(self.with_node(sibling.id()));
                }
                let range = source.node_range(id)?;
                let offset = if direction < 0 { range.start } else { range.end };
                Some(self.with_offset(offset))
            }
            Position::Offset(offset) => {
                if let Some(inside) = source.token_containing(offset) {
                    if inside.sym() == Sym::Placeholder {
                        return self.select_token(inside);
                    }
                }
                let crossing = if direction < 0 {
                    if offset == 0 {
                        return None;
                    }
                    source.token_ending_at(offset)
                } else {
                    if offset >= source.len() {
                        return None;
                    }
                    source.token_starting_at(offset)
                };
                match crossing {
                    Some(token) => self.select_token(token),
                    None if direction < 0 => Some(self.with_offset(offset - 1)),
                    None => Some(self.with_offset(offset + 1)),
                }
            }
        }
    }

    /// Select a token, or the placeholder node when the token is a placeholder
    fn select_token(&self, token: &TokenSpan) -> Option<Caret> {
        if token.sym() == Sym::Placeholder {
            if let Some(placeholder) = self.source().parent(token.id()) {
                return Some(self.with_node(placeholder.id()));
            }
        }
        Some(self.with_node(token.id()))
    }

    /// Move to the line above or below.
    ///
    /// A selection is collapsed to its start first and, if the new offset falls
    /// inside a token, that token is selected again.
    pub fn move_vertical(&self, direction: VerticalDirection, layout: &dyn Layout) -> Option<Caret> {
        let (offset, was_selection) = match self.position() {
            Position::Offset(offset) => (offset, false),
            Position::Node(id) => (self.source().node_start(id)?, true),
        };
        let destination = self.vertical(direction, offset, false, layout)?;
        if was_selection {
            if let Some(token) = self.source().token_at(destination) {
                return Some(self.with_node(token.id()));
            }
        }
        Some(self.with_offset(destination))
    }

    /// Offset on the adjacent line that is visually closest to `offset`.
    ///
    /// Picks the token on the destination line whose box is horizontally
    /// nearest and lands at the same fraction of its width. A blank line lands
    /// at its start. With `include_space`, a caret to the right of the line's
    /// last token lands at the end of the line.
    pub fn vertical(
        &self,
        direction: VerticalDirection,
        offset: usize,
        include_space: bool,
        layout: &dyn Layout,
    ) -> Option<usize> {
        let source = self.source();
        let text = source.text();
        let line = text.line_of(offset);
        let destination = match direction {
            VerticalDirection::Up => line.checked_sub(1)?,
            VerticalDirection::Down => line + 1,
        };
        let line_start = text.line_start(destination)?;

        let tokens = source.tokens_on_line(destination);
        if tokens.is_empty() {
            return Some(line_start);
        }

        let x = self.visual_x(offset, layout);
        let boxes: Vec<_> = tokens
            .iter()
            .filter_map(|span| layout.bounding_box(source, span).map(|rect| (*span, rect)))
            .collect();
        let (closest, rect) = boxes
            .iter()
            .min_by(|a, b| {
                a.1.horizontal_distance(x)
                    .total_cmp(&b.1.horizontal_distance(x))
            })
            .copied()?;

        let is_last = boxes.last().is_some_and(|(last, _)| last.id() == closest.id());
        if include_space && is_last && x > rect.right() {
            return text.line_end(destination);
        }

        let length = closest.end - closest.start;
        let fraction = if rect.width > 0.0 {
            ((x - rect.x) / rect.width).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some(closest.start + (fraction * length as f32).round() as usize)
    }

    /// Horizontal position of an offset, measured through the boxes of the
    /// tokens on its line
    fn visual_x(&self, offset: usize, layout: &dyn Layout) -> f32 {
        let source = self.source();
        let tokens = source.tokens_on_line(source.line_of(offset));
        let measure = |span: &TokenSpan| {
            let rect = layout.bounding_box(source, span)?;
            let length = (span.end - span.start).max(1) as f32;
            Some((rect, rect.width / length))
        };

        if let Some(span) = tokens.iter().find(|s| s.start <= offset && offset <= s.end) {
            if let Some((rect, per)) = measure(span) {
                return rect.x + (offset - span.start) as f32 * per;
            }
        }
        if let Some(span) = tokens.iter().rev().find(|s| s.end <= offset) {
            if let Some((rect, per)) = measure(span) {
                return rect.right() + (offset - span.end) as f32 * per;
            }
        }
        if let Some(span) = tokens.iter().find(|s| s.start >= offset) {
            if let Some((rect, per)) = measure(span) {
                return (rect.x - (span.start - offset) as f32 * per).max(0.0);
            }
        }
        0.0
    }

    /// Start of the caret's line
    pub fn home(&self) -> Option<Caret> {
        let line = self.line()?;
        Some(self.with_offset(self.source().text().line_start(line)?))
    }

    /// End of the caret's line, before its newline
    pub fn end(&self) -> Option<Caret> {
        let line = self.line()?;
        Some(self.with_offset(self.source().text().line_end(line)?))
    }

    /// Descend into a selection: into a token's text, or to a node's first child
    pub fn enter(&self) -> Option<Caret> {
        let node = self.node()?;
        if node.is_token() {
            let span = self.source().token_span(node.id())?;
            return Some(self.with_offset((span.start + 1).min(span.end)));
        }
        let child = node.children().into_iter().next()?;
        Some(self.with_node(child.id()))
    }

    /// Widen the selection: a token at the offset, or a selection's parent
    pub fn exit(&self) -> Option<Caret> {
        match self.position() {
            Position::Offset(_) => {
                let token = self.token_excluding_space()?.clone();
                self.select_token(&token)
            }
            Position::Node(id) => {
                let parent = self.source().parent(id)?;
                Some(self.with_node(parent.id()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caret::MonospaceLayout;
    use crate::source::{NodeKind, Source};

    fn caret(code: &str, offset: usize) -> Caret {
        Caret::at_offset(Source::new("test", code), offset)
    }

    #[test]
    fn test_right_selects_crossed_token() {
        let moved = caret("ab + c", 0).right(false).unwrap();
        assert_eq!(moved.node().unwrap().as_token().unwrap().text, "ab");
        let collapsed = moved.right(false).unwrap();
        assert_eq!(collapsed.offset(), Some(2));
        assert_eq!(collapsed.right(false).unwrap().offset(), Some(3));
    }

    #[test]
    fn test_left_at_start_is_none() {
        assert!(caret("1", 0).left(false).is_none());
        assert!(caret("1", 1).right(false).is_none());
    }

    #[test]
    fn test_placeholder_selected_whole() {
        let moved = caret("1 + _", 5).left(false).unwrap();
        assert_eq!(moved.node().unwrap().kind(), NodeKind::Placeholder);
    }

    #[test]
    fn test_sibling_movement() {
        let source = Source::new("test", "[1 2]");
        let one = source.parent(source.token_at(1).unwrap().id()).unwrap().id();
        let moved = Caret::at_node(source, one).right(true).unwrap();
        assert_eq!(moved.node().unwrap().token_text(), "2");
        assert!(moved.right(true).unwrap().node().unwrap().is_sym(Sym::ListClose));
    }

    #[test]
    fn test_vertical_keeps_column() {
        let layout = MonospaceLayout::default();
        let c = caret("abcd\nwxyz", 2);
        assert_eq!(c.vertical(VerticalDirection::Down, 2, false, &layout), Some(7));
        assert_eq!(c.vertical(VerticalDirection::Up, 2, false, &layout), None);
        assert_eq!(c.move_vertical(VerticalDirection::Down, &layout).unwrap().offset(), Some(7));
    }

    #[test]
    fn test_vertical_to_blank_line_lands_at_start() {
        let layout = MonospaceLayout::default();
        let c = caret("abc\n\nxyz", 2);
        assert_eq!(c.vertical(VerticalDirection::Down, 2, false, &layout), Some(4));
    }

    #[test]
    fn test_vertical_past_short_line() {
        let layout = MonospaceLayout::default();
        let c = caret("a\nlonger", 5);
        assert_eq!(c.vertical(VerticalDirection::Up, 5, false, &layout), Some(1));
        assert_eq!(c.vertical(VerticalDirection::Up, 5, true, &layout), Some(1));
    }

    #[test]
    fn test_home_and_end() {
        let c = caret("a\n  bc\nd", 4);
        assert_eq!(c.home().unwrap().offset(), Some(2));
        assert_eq!(c.end().unwrap().offset(), Some(6));
    }

    #[test]
    fn test_enter_and_exit() {
        let source = Source::new("test", "(12)");
        let block = source.root().get("block").unwrap().list_of("statements")[0].clone();
        let inside = Caret::at_node(source.clone(), block.id()).enter().unwrap();
        assert!(inside.node().unwrap().is_sym(Sym::EvalOpen));
        assert_eq!(inside.exit().unwrap().node().unwrap().id(), block.id());

        let number = source.token_at(1).unwrap().id();
        assert_eq!(Caret::at_node(source, number).enter().unwrap().offset(), Some(2));
    }
}
