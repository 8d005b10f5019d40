//! The caret: a cursor over an immutable source.
//!
//! A caret is either a grapheme offset into the document text or a selected
//! node of the tree. Carets never change; every navigation or editing method
//! returns a new value, usually wrapped in an [`Edit`]:
//!
//! - [`Edit::Caret`]: only the caret moved
//! - [`Edit::Source`]: the document changed, with the caret to use in it
//!
//! Methods return `None` when there is nothing sensible to do (a document
//! boundary, a missing ancestor, a node that can't be wrapped), never a
//! half-applied edit.

mod editing;
pub mod layout;
mod navigation;

pub use layout::{Layout, MonospaceLayout, Rect};
pub use navigation::VerticalDirection;

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use crate::source::{Node, NodeId, NodeKind, Source, TokenSpan};

/// Where the caret is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// Grapheme offset into the document text
    Offset(usize),
    /// A selected node
    Node(NodeId),
}

/// The result of every caret or revision operation
#[derive(Debug, Clone)]
pub enum Edit {
    /// Navigation only
    Caret(Caret),
    /// A new document and the caret in it
    Source(Source, Caret),
}

impl Edit {
    pub fn caret(&self) -> &Caret {
        match self {
            Edit::Caret(caret) | Edit::Source(_, caret) => caret,
        }
    }

    pub fn into_caret(self) -> Caret {
        match self {
            Edit::Caret(caret) | Edit::Source(_, caret) => caret,
        }
    }

    /// The document the edit leaves behind
    pub fn source(&self) -> &Source {
        match self {
            Edit::Caret(caret) => caret.source(),
            Edit::Source(source, _) => source,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Edit::Source(..))
    }
}

/// Insertion context around an offset, see [`Caret::nodes_between`]
#[derive(Debug, Clone, Default)]
pub struct Between {
    /// Nodes that begin right after the caret (insert-before sites)
    pub before: Vec<Arc<Node>>,
    /// Nodes that end right before the caret (insert-after sites)
    pub after: Vec<Arc<Node>>,
}

#[derive(Debug, Clone, Default)]
struct Lookups {
    excluding_space: OnceLock<Option<TokenSpan>>,
    including_space: OnceLock<Option<TokenSpan>>,
    prior: OnceLock<Option<TokenSpan>>,
}

#[derive(Clone)]
pub struct Caret {
    created: Instant,
    source: Source,
    position: Position,
    /// A node the host is about to insert, shown as a pending addition
    addition: Option<Arc<Node>>,
    lookups: Arc<Lookups>,
}

impl Caret {
    /// # Panics
    ///
    /// Panics if an offset lies beyond the end of the document. That can only
    /// happen through a bug in the caller or in the editing core.
    pub fn new(source: Source, position: Position) -> Self {
        if let Position::Offset(offset) = position {
            assert!(
                offset <= source.len(),
                "caret offset {offset} beyond document length {}",
                source.len()
            );
        }
        debug_assert!(
            match position {
                Position::Node(id) => source.contains(id),
                Position::Offset(_) => true,
            },
            "caret node is not in the document"
        );
        Self {
            created: Instant::now(),
            source,
            position,
            addition: None,
            lookups: Arc::default(),
        }
    }

    pub fn at_offset(source: Source, offset: usize) -> Self {
        Self::new(source, Position::Offset(offset))
    }

    pub fn at_node(source: Source, node: NodeId) -> Self {
        Self::new(source, Position::Node(node))
    }

    pub fn with_position(&self, position: Position) -> Caret {
        Caret::new(self.source.clone(), position)
    }

    pub fn with_offset(&self, offset: usize) -> Caret {
        self.with_position(Position::Offset(offset))
    }

    pub fn with_node(&self, node: NodeId) -> Caret {
        self.with_position(Position::Node(node))
    }

    pub fn with_addition(&self, addition: Option<Arc<Node>>) -> Caret {
        let mut caret = self.with_position(self.position);
        caret.addition = addition;
        caret
    }

    pub fn created(&self) -> Instant {
        self.created
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn addition(&self) -> Option<&Arc<Node>> {
        self.addition.as_ref()
    }

    pub fn offset(&self) -> Option<usize> {
        match self.position {
            Position::Offset(offset) => Some(offset),
            Position::Node(_) => None,
        }
    }

    /// The selected node, if the caret is a selection
    pub fn node(&self) -> Option<&Arc<Node>> {
        match self.position {
            Position::Node(id) => self.source.get(id),
            Position::Offset(_) => None,
        }
    }

    pub fn is_offset(&self) -> bool {
        matches!(self.position, Position::Offset(_))
    }

    pub fn is_node(&self) -> bool {
        matches!(self.position, Position::Node(_))
    }

    // =========================================================================
    // Cached token lookups
    // =========================================================================

    /// Token whose text contains the offset (or ends at it)
    pub fn token_excluding_space(&self) -> Option<&TokenSpan> {
        self.lookups
            .excluding_space
            .get_or_init(|| {
                let offset = self.offset()?;
                self.source
                    .token_at(offset)
                    .or_else(|| self.source.token_ending_at(offset))
                    .cloned()
            })
            .as_ref()
    }

    /// Token whose leading space or text holds the offset
    pub fn token_including_space(&self) -> Option<&TokenSpan> {
        self.lookups
            .including_space
            .get_or_init(|| {
                let offset = self.offset()?;
                self.source
                    .token_with_space_at(offset)
                    .or_else(|| self.source.token_at(offset))
                    .cloned()
            })
            .as_ref()
    }

    /// Last non-empty token that ends at or before the offset
    pub fn token_prior(&self) -> Option<&TokenSpan> {
        self.lookups
            .prior
            .get_or_init(|| {
                let offset = self.offset()?;
                self.source
                    .tokens()
                    .iter()
                    .rev()
                    .find(|span| !span.is_empty() && span.end <= offset)
                    .cloned()
            })
            .as_ref()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn at_token_start(&self) -> bool {
        self.offset()
            .is_some_and(|offset| self.source.token_starting_at(offset).is_some())
    }

    pub fn at_token_end(&self) -> bool {
        self.offset()
            .is_some_and(|offset| self.source.token_ending_at(offset).is_some())
    }

    /// Whether the caret is on `node`, on something inside it, or at an offset
    /// within its text
    pub fn is_in(&self, node: NodeId) -> bool {
        match self.position {
            Position::Node(selected) => self
                .source
                .get(node)
                .is_some_and(|candidate| candidate.contains(selected)),
            Position::Offset(offset) => self
                .source
                .node_range(node)
                .is_some_and(|range| range.start <= offset && offset <= range.end),
        }
    }

    /// Nodes the caret sits between, used to offer insertions.
    ///
    /// `before` holds each ancestor of the token after the caret that starts
    /// with that token, as long as the caret is in their leading space and on the same
    /// line (or on a blank line, for statements of a block). `after` holds the
    /// ancestors of the preceding token that end with it.
    pub fn nodes_between(&self) -> Option<Between> {
        let offset = self.offset()?;
        let after_token = self.source.token_with_space_at(offset)?;
        let line = self.source.line_of(offset);
        let blank = self.source.text().is_blank_line(line);

        let insertable = |node: &Arc<Node>| {
            self.source
                .parent(node.id())
                .is_some_and(|parent| parent.kind() != NodeKind::Program)
        };

        let mut before = Vec::new();
        for ancestor in self.source.ancestors(after_token.id()) {
            let (Some(space_start), Some(start)) = (
                self.source.node_space_start(ancestor.id()),
                self.source.node_start(ancestor.id()),
            ) else {
                break;
            };
            if offset < space_start || offset > start {
                break;
            }
            let same_line = self.source.line_of(start) == line;
            let in_block = self
                .source
                .parent(ancestor.id())
                .is_some_and(|parent| parent.kind() == NodeKind::Block);
            if insertable(&ancestor) && (same_line || (blank && in_block)) {
                before.push(ancestor);
            }
        }

        let mut after = Vec::new();
        if let Some(before_token) = self.source.token_before(after_token.id()) {
            for ancestor in self.source.ancestors(before_token.id()) {
                let ends_here = ancestor
                    .last_leaf()
                    .is_some_and(|leaf| leaf.id() == before_token.id());
                if !ends_here {
                    break;
                }
                if insertable(&ancestor) {
                    after.push(ancestor);
                }
            }
        }

        Some(Between { before, after })
    }

    /// Offset at which `row` begins
    pub fn row_position(&self, row: usize) -> Option<usize> {
        self.source.text().line_start(row)
    }

    /// The offset the caret stands for: its offset, or a selection's start
    pub fn text_offset(&self) -> Option<usize> {
        match self.position {
            Position::Offset(offset) => Some(offset),
            Position::Node(id) => self.source.node_start(id),
        }
    }

    /// Zero-based line of the caret
    pub fn line(&self) -> Option<usize> {
        self.text_offset().map(|offset| self.source.line_of(offset))
    }

    /// Graphemes between the start of the line and the caret
    pub fn column(&self) -> Option<usize> {
        let offset = self.text_offset()?;
        let line_start = self.source.text().line_start(self.source.line_of(offset))?;
        Some(offset - line_start)
    }
}

impl fmt::Debug for Caret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Caret")
            .field("position", &self.position)
            .field("code", &self.source.code())
            .field("addition", &self.addition.as_ref().map(|n| n.kind()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caret(code: &str, offset: usize) -> Caret {
        Caret::at_offset(Source::new("test", code), offset)
    }

    #[test]
    #[should_panic(expected = "beyond document length")]
    fn test_offset_past_end_panics() {
        caret("1", 5);
    }

    #[test]
    fn test_token_boundaries() {
        let c = caret("12 + 3", 2);
        assert!(c.at_token_end());
        assert!(!c.at_token_start());
        assert!(caret("12 + 3", 3).at_token_start());
        assert_eq!(c.token_excluding_space().unwrap().text(), "12");
        assert_eq!(c.token_including_space().unwrap().text(), "+");
        assert_eq!(c.token_prior().unwrap().text(), "12");
    }

    #[test]
    fn test_is_in() {
        let source = Source::new("test", "1 + 2");
        let sum = source.root().get("block").unwrap().list_of("statements")[0].clone();
        assert!(Caret::at_offset(source.clone(), 5).is_in(sum.id()));
        let two = source.token_at(4).unwrap().id();
        assert!(Caret::at_node(source.clone(), two).is_in(sum.id()));
        assert!(!Caret::at_node(source, sum.id()).is_in(two));
    }

    #[test]
    fn test_nodes_between_in_list() {
        let c = caret("[1 2]", 2);
        let between = c.nodes_between().unwrap();
        assert_eq!(between.before.len(), 1);
        assert_eq!(between.before[0].token_text(), "2");
        assert_eq!(between.after.len(), 1);
        assert_eq!(between.after[0].token_text(), "1");
    }

    #[test]
    fn test_nodes_between_statements_on_blank_line() {
        let c = caret("a: 1\n\nb", 5);
        let between = c.nodes_between().unwrap();
        // `b` is on a later line, but the caret's line is blank and `b` is a statement
        assert_eq!(between.before.len(), 1);
        assert_eq!(between.before[0].token_text(), "b");
        assert!(between.after.iter().any(|n| n.kind() == NodeKind::Bind));
    }

    #[test]
    fn test_nodes_between_requires_offset() {
        let source = Source::new("test", "1");
        let token = source.token_at(0).unwrap().id();
        assert!(Caret::at_node(source, token).nodes_between().is_none());
    }

    #[test]
    fn test_line_and_column() {
        let c = caret("a\nbc", 3);
        assert_eq!(c.line(), Some(1));
        assert_eq!(c.column(), Some(1));
        assert_eq!(c.row_position(1), Some(2));
        assert_eq!(c.row_position(5), None);
    }
}
