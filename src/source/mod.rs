//! Immutable source documents.
//!
//! A [`Source`] pairs a program tree with its whitespace and the text they
//! serialize to, plus an index for the position and parent queries the caret
//! and revisions need. Every change produces a new `Source`; old versions stay
//! valid and share unchanged subtrees and text storage with new ones.
//!
//! # Architecture
//!
//! ```text
//! text ──tokenize──▶ lexemes ──parse──▶ (program, spaces)
//!                                            │
//!                          Index::build ◀────┘ ──▶ tokens with offsets, parents
//! ```
//!
//! Text edits re-parse the whole document. Tree edits swap nodes with
//! [`Source::replace`] and serialize the new tree with the adjusted spaces.

mod node;
mod parser;
mod spaces;
mod text;
mod token;
mod tokenizer;

pub use node::{Category, Field, Node, NodeId, NodeKind, Slot, ROOT_FIELD};
pub use parser::parse;
pub use spaces::Spaces;
pub use text::Text;
pub use token::{Sym, Token};
pub use tokenizer::{tokenize, Lexeme};

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::util::grapheme_count;

/// Where a token sits in the document text, in grapheme offsets
#[derive(Debug, Clone)]
pub struct TokenSpan {
    pub token: Arc<Node>,
    /// Start of the whitespace before the token
    pub space_start: usize,
    /// Start of the token's text
    pub start: usize,
    /// End of the token's text (exclusive)
    pub end: usize,
}

impl TokenSpan {
    pub fn id(&self) -> NodeId {
        self.token.id()
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn sym(&self) -> Sym {
        self.token.as_token().map_or(Sym::End, |t| t.sym)
    }

    pub fn text(&self) -> &str {
        self.token.as_token().map_or("", |t| t.text.as_str())
    }
}

#[derive(Debug, Default)]
struct Index {
    nodes: HashMap<NodeId, Arc<Node>>,
    parents: HashMap<NodeId, NodeId>,
    tokens: Vec<TokenSpan>,
    token_positions: HashMap<NodeId, usize>,
}

impl Index {
    /// Index the tree and serialize it with its spaces
    fn build(root: &Arc<Node>, spaces: &Spaces) -> (Index, String) {
        let mut index = Index::default();
        let mut code = String::new();
        let mut offset = 0;
        index.visit(root, None, spaces, &mut code, &mut offset);
        (index, code)
    }

    fn visit(
        &mut self,
        node: &Arc<Node>,
        parent: Option<NodeId>,
        spaces: &Spaces,
        code: &mut String,
        offset: &mut usize,
    ) {
        self.nodes.insert(node.id(), Arc::clone(node));
        if let Some(parent) = parent {
            self.parents.insert(node.id(), parent);
        }
        if let Some(token) = node.as_token() {
            let space = spaces.token_space(node.id());
            let space_start = *offset;
            *offset += grapheme_count(space);
            let start = *offset;
            *offset += token.len();
            code.push_str(space);
            code.push_str(&token.text);
            self.token_positions.insert(node.id(), self.tokens.len());
            self.tokens.push(TokenSpan {
                token: Arc::clone(node),
                space_start,
                start,
                end: *offset,
            });
            return;
        }
        for child in node.children() {
            self.visit(&child, Some(node.id()), spaces, code, offset);
        }
    }
}

/// An immutable document: program tree, whitespace, and text
#[derive(Clone)]
pub struct Source {
    name: Arc<str>,
    root: Arc<Node>,
    spaces: Spaces,
    text: Text,
    index: Arc<Index>,
}

impl Source {
    /// Parse a document from text
    pub fn new(name: &str, code: &str) -> Self {
        let (root, spaces) = parse(code);
        Self::from_parts(Arc::from(name), root, Spaces::new(spaces))
    }

    fn from_parts(name: Arc<str>, root: Arc<Node>, spaces: Spaces) -> Self {
        let (index, code) = Index::build(&root, &spaces);
        Self {
            name,
            root,
            spaces,
            text: Text::new(&code),
            index: Arc::new(index),
        }
    }

    /// Same document name, new tree and whitespace
    pub fn with_program(&self, root: Arc<Node>, spaces: Spaces) -> Source {
        Self::from_parts(Arc::clone(&self.name), root, spaces)
    }

    /// Re-parse the document from new text
    pub fn with_code(&self, code: &str) -> Source {
        let (root, spaces) = parse(code);
        Self::from_parts(Arc::clone(&self.name), root, Spaces::new(spaces))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    pub fn spaces(&self) -> &Spaces {
        &self.spaces
    }

    pub fn text(&self) -> &Text {
        &self.text
    }

    pub fn code(&self) -> String {
        self.text.to_string()
    }

    /// Length in graphemes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    // =========================================================================
    // Text operations
    // =========================================================================

    pub fn with_graphemes_at(&self, insertion: &str, offset: usize) -> Option<Source> {
        let text = self.text.with_inserted(offset, insertion)?;
        tracing::trace!(offset, insertion, "splicing text");
        Some(self.with_code(&text.to_string()))
    }

    pub fn without_graphemes_between(&self, start: usize, end: usize) -> Option<Source> {
        let text = self.text.with_removed(start..end)?;
        tracing::trace!(start, end, "removing text");
        Some(self.with_code(&text.to_string()))
    }

    /// Replace the text in `range` with `replacement`
    pub fn with_range_replaced(&self, range: Range<usize>, replacement: &str) -> Option<Source> {
        let removed = self.text.with_removed(range.clone())?;
        let text = removed.with_inserted(range.start, replacement)?;
        Some(self.with_code(&text.to_string()))
    }

    // =========================================================================
    // Tree operations
    // =========================================================================

    /// Swap `original` for `replacement` (or remove it), moving its leading
    /// space onto the replacement.
    pub fn replace(&self, original: NodeId, replacement: Option<Arc<Node>>) -> Option<Source> {
        let original_node = self.get(original)?;
        if original == self.root.id() {
            let replacement = replacement.filter(|r| r.kind() == NodeKind::Program)?;
            let spaces = self.spaces.with_replacement(original_node, &replacement);
            return Some(self.with_program(replacement, spaces));
        }
        let root = self.root.replaced(original, replacement.as_ref())?;
        let spaces = match &replacement {
            Some(replacement) => self.spaces.with_replacement(original_node, replacement),
            None => self.spaces.clone(),
        };
        Some(self.with_program(root, spaces))
    }

    // =========================================================================
    // Tree queries
    // =========================================================================

    pub fn get(&self, id: NodeId) -> Option<&Arc<Node>> {
        self.index.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.nodes.contains_key(&id)
    }

    pub fn parent(&self, id: NodeId) -> Option<&Arc<Node>> {
        self.index
            .parents
            .get(&id)
            .and_then(|parent| self.index.nodes.get(parent))
    }

    /// Ancestors of a node, nearest first
    pub fn ancestors(&self, id: NodeId) -> Vec<Arc<Node>> {
        let mut ancestors = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent.id();
            ancestors.push(Arc::clone(parent));
        }
        ancestors
    }

    /// The field of the parent that holds this node
    pub fn field_of(&self, id: NodeId) -> Option<&'static Field> {
        if id == self.root.id() {
            return Some(&ROOT_FIELD);
        }
        self.parent(id)?.field_of(id)
    }

    /// Index of a node among its parent's children
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        self.parent(id)?
            .children()
            .iter()
            .position(|child| child.id() == id)
    }

    // =========================================================================
    // Position queries
    // =========================================================================

    pub fn tokens(&self) -> &[TokenSpan] {
        &self.index.tokens
    }

    pub fn token_span(&self, token: NodeId) -> Option<&TokenSpan> {
        let position = *self.index.token_positions.get(&token)?;
        self.index.tokens.get(position)
    }

    fn leaf_spans(&self, id: NodeId) -> Option<(&TokenSpan, &TokenSpan)> {
        let node = self.get(id)?;
        let first = self.token_span(node.first_leaf()?.id())?;
        let last = self.token_span(node.last_leaf()?.id())?;
        Some((first, last))
    }

    /// Offset where the node's text begins
    pub fn node_start(&self, id: NodeId) -> Option<usize> {
        self.leaf_spans(id).map(|(first, _)| first.start)
    }

    /// Offset where the node's text ends
    pub fn node_end(&self, id: NodeId) -> Option<usize> {
        self.leaf_spans(id).map(|(_, last)| last.end)
    }

    pub fn node_range(&self, id: NodeId) -> Option<Range<usize>> {
        self.leaf_spans(id).map(|(first, last)| first.start..last.end)
    }

    /// Offset where the node's leading whitespace begins
    pub fn node_space_start(&self, id: NodeId) -> Option<usize> {
        self.leaf_spans(id).map(|(first, _)| first.space_start)
    }

    /// Non-empty token whose text contains or starts at `offset`
    pub fn token_at(&self, offset: usize) -> Option<&TokenSpan> {
        self.index
            .tokens
            .iter()
            .find(|span| span.start <= offset && offset < span.end)
    }

    /// Token whose text strictly contains `offset`
    pub fn token_containing(&self, offset: usize) -> Option<&TokenSpan> {
        self.index
            .tokens
            .iter()
            .find(|span| span.start < offset && offset < span.end)
    }

    /// Non-empty token whose text ends exactly at `offset`
    pub fn token_ending_at(&self, offset: usize) -> Option<&TokenSpan> {
        self.index
            .tokens
            .iter()
            .find(|span| span.end == offset && !span.is_empty())
    }

    /// Non-empty token whose text starts exactly at `offset`
    pub fn token_starting_at(&self, offset: usize) -> Option<&TokenSpan> {
        self.index
            .tokens
            .iter()
            .find(|span| span.start == offset && !span.is_empty())
    }

    /// Token whose leading whitespace span (up to and including its text
    /// start) contains `offset`
    pub fn token_with_space_at(&self, offset: usize) -> Option<&TokenSpan> {
        self.index
            .tokens
            .iter()
            .find(|span| span.space_start <= offset && offset <= span.start)
    }

    pub fn token_before(&self, token: NodeId) -> Option<&TokenSpan> {
        let position = *self.index.token_positions.get(&token)?;
        position
            .checked_sub(1)
            .and_then(|previous| self.index.tokens.get(previous))
    }

    pub fn token_after(&self, token: NodeId) -> Option<&TokenSpan> {
        let position = *self.index.token_positions.get(&token)?;
        self.index.tokens.get(position + 1)
    }

    /// Token immediately after a node
    pub fn token_after_node(&self, id: NodeId) -> Option<&TokenSpan> {
        let last = self.get(id)?.last_leaf()?;
        self.token_after(last.id())
    }

    /// Token immediately before a node
    pub fn token_before_node(&self, id: NodeId) -> Option<&TokenSpan> {
        let first = self.get(id)?.first_leaf()?;
        self.token_before(first.id())
    }

    /// Non-empty tokens whose text starts on `line`
    pub fn tokens_on_line(&self, line: usize) -> Vec<&TokenSpan> {
        self.index
            .tokens
            .iter()
            .filter(|span| !span.is_empty() && self.text.line_of(span.start) == line)
            .collect()
    }

    /// Whether a closing token has a matching opener in the tree
    pub fn is_matched_closer(&self, token: NodeId) -> bool {
        let Some(node) = self.get(token) else {
            return false;
        };
        let Some(tok) = node.as_token() else {
            return false;
        };
        if tok.sym == Sym::Text {
            return tok.text_closer().is_some() && !tok.is_unclosed();
        }
        if !tok.sym.is_close() {
            return false;
        }
        self.parent(token)
            .and_then(|parent| parent.get("open"))
            .and_then(|open| open.as_token())
            .is_some_and(|open| open.sym.closer() == Some(tok.sym))
    }

    pub fn line_of(&self, offset: usize) -> usize {
        self.text.line_of(offset)
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.name)
            .field("code", &self.code())
            .finish()
    }
}
