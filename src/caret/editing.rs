//! Text and structural editing at the caret.

use std::sync::Arc;

use super::{Caret, Edit, Position};
use crate::config::EditConfig;
use crate::revision::Revision;
use crate::source::{Category, Node, NodeId, NodeKind, Source, Sym};
use crate::util::{closer_for, grapheme_count, is_closing_delimiter, is_opening_delimiter, normalize};

impl Caret {
    /// Type `text` at the caret.
    ///
    /// At an offset, typing a closing delimiter just before its matching
    /// closer steps over it, and typing an opening delimiter inserts its closer
    /// too. On a selection, the text either wraps the selection or replaces it.
    pub fn insert(&self, text: &str, config: &EditConfig) -> Option<Edit> {
        let text = normalize(text);
        if text.is_empty() {
            return None;
        }
        match self.position() {
            Position::Offset(offset) => self.insert_at(offset, &text, config),
            Position::Node(id) => {
                if let Some(edit) = self.wrap(&text) {
                    return Some(edit);
                }
                // Typing over a selection replaces its text only; the
                // wrapper around a sole child stays
                self.replace(id, &text)
            }
        }
    }

    fn insert_at(&self, offset: usize, text: &str, config: &EditConfig) -> Option<Edit> {
        let source = self.source();

        if self.is_type_through(offset, text) {
            tracing::trace!(offset, text, "typing through closer");
            return Some(Edit::Caret(self.with_offset(offset + 1)));
        }

        let closer = if config.auto_close_delimiters
            && is_opening_delimiter(text)
            && !self.is_inside_text(offset)
        {
            closer_for(text)
        } else {
            None
        };

        let insertion = match closer {
            Some(closer) => format!("{text}{closer}"),
            None => text.to_string(),
        };
        let edited = source.with_graphemes_at(&insertion, offset)?;
        let caret = caret_after(&edited, offset, text);
        Some(Edit::Source(edited, caret))
    }

    /// Whether typing `text` at `offset` should only step over an existing
    /// closer
    fn is_type_through(&self, offset: usize, text: &str) -> bool {
        let source = self.source();
        if is_closing_delimiter(text) {
            if let Some(next) = source.token_starting_at(offset) {
                if next.text() == text && source.is_matched_closer(next.id()) {
                    return true;
                }
            }
        }
        // The closing quote of a text literal is part of the text token
        source.token_containing(offset).is_some_and(|span| {
            let Some(token) = span.token.as_token() else {
                return false;
            };
            token.sym == Sym::Text
                && !token.is_unclosed()
                && offset + 1 == span.end
                && token.text_closer() == Some(text)
        })
    }

    /// Strictly inside a text literal, or at the end of one still waiting
    /// for its closer
    fn is_inside_text(&self, offset: usize) -> bool {
        let source = self.source();
        let inside = source
            .token_containing(offset)
            .is_some_and(|span| span.sym() == Sym::Text);
        let awaiting = source.token_ending_at(offset).is_some_and(|span| {
            matches!(span.sym(), Sym::Text | Sym::Unknown)
                && span.token.as_token().is_some_and(|token| token.is_unclosed())
        });
        inside || awaiting
    }

    /// Delete backwards.
    ///
    /// At an offset this removes a placeholder that ends at the caret, an
    /// empty delimiter pair around the caret, or one grapheme. On a selection
    /// it unwraps a single-child wrapper, or removes the node in whatever way
    /// its field allows.
    pub fn backspace(&self) -> Option<Edit> {
        match self.position() {
            Position::Offset(offset) => self.backspace_offset(offset),
            Position::Node(id) => self.backspace_node(id),
        }
    }

    fn backspace_offset(&self, offset: usize) -> Option<Edit> {
        let source = self.source();

        if let Some(prior) = source.token_ending_at(offset) {
            let candidates = std::iter::once(Arc::clone(&prior.token))
                .chain(source.ancestors(prior.id()));
            for node in candidates {
                if source.node_end(node.id()) != Some(offset) {
                    break;
                }
                if node.first_placeholder().is_some() {
                    return self.delete_node(node.id());
                }
            }
        }

        if offset == 0 {
            return None;
        }

        let (start, end) = if self.is_empty_pair(offset) {
            (offset - 1, offset + 1)
        } else {
            (offset - 1, offset)
        };
        let edited = source.without_graphemes_between(start, end)?;
        let caret = Caret::at_offset(edited.clone(), start);
        Some(Edit::Source(edited, caret))
    }

    /// Whether the caret sits inside one empty delimited construct: an empty
    /// text literal, or the opener and closer of the same node with nothing
    /// between them
    fn is_empty_pair(&self, offset: usize) -> bool {
        let source = self.source();
        let empty_text = source.token_at(offset - 1).is_some_and(|span| {
            let Some(token) = span.token.as_token() else {
                return false;
            };
            token.sym == Sym::Text
                && span.start + 1 == offset
                && span.end == offset + 1
                && token.len() == 2
                && !token.is_unclosed()
        });
        if empty_text {
            return true;
        }

        let (Some(open), Some(close)) = (source.token_ending_at(offset), source.token_starting_at(offset))
        else {
            return false;
        };
        if !open.sym().is_open() || open.sym().closer() != Some(close.sym()) {
            return false;
        }
        source.parent(open.id()).is_some_and(|parent| {
            parent.get("open").is_some_and(|node| node.id() == open.id())
                && parent.get("close").is_some_and(|node| node.id() == close.id())
        })
    }

    fn backspace_node(&self, id: NodeId) -> Option<Edit> {
        let source = self.source();
        let node = source.get(id)?;

        if let Some(parent) = source.parent(id) {
            if let Some(child) = sole_wrapped(parent) {
                let fits = source
                    .field_of(parent.id())
                    .is_some_and(|field| field.admits(&child));
                if fits {
                    tracing::trace!(kind = ?parent.kind(), "unwrapping");
                    let edited = source.replace(parent.id(), Some(Arc::clone(&child)))?;
                    let caret = Caret::at_node(edited.clone(), child.id());
                    return Some(Edit::Source(edited, caret));
                }
            }
        }

        let field = source.field_of(id)?;
        if field.list || field.optional {
            let start = source.node_space_start(id)?;
            let edited = source.replace(id, None)?;
            let caret = Caret::at_offset(edited.clone(), start.min(edited.len()));
            return Some(Edit::Source(edited, caret));
        }
        if field.accepts(Category::Expression) {
            return self.with_placeholder(id);
        }
        if field.accepts(Category::Program) {
            let edited = source.with_program(Node::empty_program(), Default::default());
            let caret = Caret::at_offset(edited.clone(), 0);
            return Some(Edit::Source(edited, caret));
        }
        let parent = source.parent(id)?;
        if parent.is_expression() && node.is_token() && parent.leaves().len() == 1 {
            return self.with_placeholder(parent.id());
        }
        tracing::trace!(kind = ?node.kind(), field = field.name, "nothing to delete");
        None
    }

    /// Replace a node with a placeholder and select it
    fn with_placeholder(&self, id: NodeId) -> Option<Edit> {
        let placeholder = Node::placeholder();
        let edited = self.source().replace(id, Some(Arc::clone(&placeholder)))?;
        let caret = Caret::at_node(edited.clone(), placeholder.id());
        Some(Edit::Source(edited, caret))
    }

    /// Delete forwards: one grapheme at an offset, or the selection
    pub fn delete(&self) -> Option<Edit> {
        match self.position() {
            Position::Offset(offset) => {
                let edited = self.source().without_graphemes_between(offset, offset + 1)?;
                let caret = Caret::at_offset(edited.clone(), offset);
                Some(Edit::Source(edited, caret))
            }
            Position::Node(_) => self.backspace(),
        }
    }

    /// Replace the text of `old` with `text`, leaving the caret after it
    pub fn replace(&self, old: NodeId, text: &str) -> Option<Edit> {
        let source = self.source();
        let range = source.node_range(old)?;
        let text = normalize(text);
        let edited = source.with_range_replaced(range.clone(), &text)?;
        let caret = caret_after(&edited, range.start, &text);
        Some(Edit::Source(edited, caret))
    }

    /// Remove the text of a node, leaving the caret where it started
    pub fn delete_node(&self, node: NodeId) -> Option<Edit> {
        let source = self.source();
        let range = source.node_range(node)?;
        let edited = source.without_graphemes_between(range.start, range.end)?;
        let caret = Caret::at_offset(edited.clone(), range.start);
        Some(Edit::Source(edited, caret))
    }

    /// Wrap the selected expression in a block (`(`) or list (`[`)
    pub fn wrap(&self, key: &str) -> Option<Edit> {
        let source = self.source();
        let selected = self.node()?;
        let target = if selected.is_token() {
            source
                .ancestors(selected.id())
                .into_iter()
                .find(|ancestor| ancestor.is_expression())?
        } else {
            Arc::clone(selected)
        };
        if !target.is_expression() {
            return None;
        }
        let field = source.field_of(target.id())?;
        if !field.accepts(Category::Expression) {
            return None;
        }
        let wrapper = match key {
            "(" => Node::block(vec![Arc::clone(&target)]),
            "[" => Node::list(vec![Arc::clone(&target)]),
            _ => return None,
        };
        let edited = source.replace(target.id(), Some(Arc::clone(&wrapper)))?;
        let caret = Caret::at_node(edited.clone(), wrapper.id());
        Some(Edit::Source(edited, caret))
    }

    /// Insert a ready-made node at the caret's offset, into the nearest list
    /// that the caret sits between elements of
    pub fn insert_node(&self, node: Arc<Node>, config: &EditConfig) -> Option<Edit> {
        let offset = self.offset()?;
        let source = self.source();
        let between = self.nodes_between()?;

        let before_site = between.before.iter().find_map(|sibling| {
            let field = source.field_of(sibling.id()).filter(|field| field.list)?;
            let index = list_index(source, sibling.id(), field.name)?;
            Some((sibling.id(), field.name, index))
        });
        let after_site = || {
            between.after.iter().find_map(|sibling| {
                let field = source.field_of(sibling.id()).filter(|field| field.list)?;
                let index = list_index(source, sibling.id(), field.name)?;
                Some((sibling.id(), field.name, index + 1))
            })
        };
        let (sibling, field, index) = before_site.or_else(after_site)?;
        let parent = source.parent(sibling)?.id();
        Revision::append(source, offset, parent, field, index, node).edit_with(config)
    }
}

/// Caret just past `text` inserted at `offset`. A combining mark can fuse
/// with the grapheme before it, so the offset is capped at the new length.
fn caret_after(edited: &Source, offset: usize, text: &str) -> Caret {
    let end = (offset + grapheme_count(text)).min(edited.len());
    Caret::at_offset(edited.clone(), end)
}

/// Position of a child within its parent's list field
fn list_index(source: &Source, child: NodeId, field: &str) -> Option<usize> {
    source
        .parent(child)?
        .list_of(field)
        .iter()
        .position(|item| item.id() == child)
}

/// The only child of a delimited block or list
fn sole_wrapped(parent: &Arc<Node>) -> Option<Arc<Node>> {
    let items = match parent.kind() {
        NodeKind::Block if parent.get("open").is_some() => parent.list_of("statements"),
        NodeKind::ListLiteral => parent.list_of("values"),
        _ => return None,
    };
    match items {
        [only] => Some(Arc::clone(only)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caret(code: &str, offset: usize) -> Caret {
        Caret::at_offset(Source::new("test", code), offset)
    }

    fn typed(caret: &Caret, text: &str) -> Caret {
        caret.insert(text, &EditConfig::default()).unwrap().into_caret()
    }

    #[test]
    fn test_auto_close_and_type_through() {
        let c = typed(&caret("1 + ", 4), "(");
        assert_eq!(c.source().code(), "1 + ()");
        assert_eq!(c.offset(), Some(5));
        let edit = c.insert(")", &EditConfig::default()).unwrap();
        assert!(!edit.is_structural());
        assert_eq!(edit.source().code(), "1 + ()");
        assert_eq!(edit.caret().offset(), Some(6));
    }

    #[test]
    fn test_auto_close_can_be_disabled() {
        let config = EditConfig {
            auto_close_delimiters: false,
            ..EditConfig::default()
        };
        let edit = caret("", 0).insert("[", &config).unwrap();
        assert_eq!(edit.source().code(), "[");
    }

    #[test]
    fn test_function_then_paren() {
        let c = typed(&typed(&caret("", 0), "ƒ"), "(");
        assert_eq!(c.source().code(), "ƒ()");
        assert_eq!(c.offset(), Some(2));
    }

    #[test]
    fn test_no_auto_close_inside_text() {
        let c = typed(&caret("\"ab\"", 2), "(");
        assert_eq!(c.source().code(), "\"a(b\"");
        let closing = typed(&caret("\"ab", 3), "\"");
        assert_eq!(closing.source().code(), "\"ab\"");
    }

    #[test]
    fn test_type_through_text_closer() {
        let edit = caret("\"ab\"", 3).insert("\"", &EditConfig::default()).unwrap();
        assert_eq!(edit.source().code(), "\"ab\"");
        assert_eq!(edit.caret().offset(), Some(4));
    }

    #[test]
    fn test_insert_normalizes() {
        let c = typed(&caret("", 0), "e\u{301}");
        assert_eq!(c.source().code(), "\u{e9}");
        assert_eq!(c.offset(), Some(1));
    }

    #[test]
    fn test_backspace_grapheme_and_pair() {
        let edit = caret("12", 2).backspace().unwrap();
        assert_eq!(edit.source().code(), "1");
        let edit = caret("[]", 1).backspace().unwrap();
        assert_eq!(edit.source().code(), "");
        assert_eq!(edit.caret().offset(), Some(0));
        assert!(caret("1", 0).backspace().is_none());
    }

    #[test]
    fn test_backspace_between_text_literals_deletes_one_grapheme() {
        let edit = caret("\"a\"\"b\"", 3).backspace().unwrap();
        assert_eq!(edit.source().code(), "\"a\"b\"");
        assert_eq!(edit.caret().offset(), Some(2));

        let edit = caret("x: \"\"", 4).backspace().unwrap();
        assert_eq!(edit.source().code(), "x: ");
        assert_eq!(edit.caret().offset(), Some(3));
    }

    #[test]
    fn test_backspace_between_unrelated_delimiters() {
        // `)` closes the call, `(` opens a new block: not one pair
        let edit = caret("f(1)(2)", 4).backspace().unwrap();
        assert_eq!(edit.source().code(), "f(1(2)");
        let edit = caret("f()", 2).backspace().unwrap();
        assert_eq!(edit.source().code(), "f");
    }

    #[test]
    fn test_backspace_placeholder() {
        let edit = caret("1 + _", 5).backspace().unwrap();
        assert_eq!(edit.source().code(), "1 + ");
        assert_eq!(edit.caret().offset(), Some(4));
    }

    #[test]
    fn test_backspace_unwraps_block() {
        let source = Source::new("test", "(1 + 2)");
        let sum = source.parent(source.token_at(3).unwrap().id()).unwrap().clone();
        assert_eq!(sum.kind(), NodeKind::BinaryEvaluate);
        let edit = Caret::at_node(source, sum.id()).backspace().unwrap();
        assert_eq!(edit.source().code(), "1 + 2");
        let statements = edit.source().root().get("block").unwrap().list_of("statements").to_vec();
        assert_eq!(statements[0].id(), sum.id());
    }

    #[test]
    fn test_backspace_expression_becomes_placeholder() {
        let source = Source::new("test", "1 + 2");
        let two = source.parent(source.token_at(4).unwrap().id()).unwrap().id();
        let edit = Caret::at_node(source, two).backspace().unwrap();
        assert_eq!(edit.source().code(), "1 + _");
        assert!(edit.caret().node().unwrap().is_placeholder());
    }

    #[test]
    fn test_backspace_list_item_removes_it() {
        let source = Source::new("test", "[1 2 3]");
        let two = source.parent(source.token_at(3).unwrap().id()).unwrap().id();
        let edit = Caret::at_node(source, two).backspace().unwrap();
        assert_eq!(edit.source().code(), "[1 3]");
        assert_eq!(edit.caret().offset(), Some(2));
    }

    #[test]
    fn test_backspace_single_token_in_expression() {
        let source = Source::new("test", "1 + 2");
        let two = source.token_at(4).unwrap().id();
        let edit = Caret::at_node(source, two).backspace().unwrap();
        assert_eq!(edit.source().code(), "1 + _");
    }

    #[test]
    fn test_backspace_root_program() {
        let source = Source::new("test", "1 + 2");
        let root = source.root().id();
        let edit = Caret::at_node(source, root).backspace().unwrap();
        assert_eq!(edit.source().code(), "");
    }

    #[test]
    fn test_insert_over_selection() {
        let source = Source::new("test", "1 + 2");
        let two = source.parent(source.token_at(4).unwrap().id()).unwrap().id();
        let edit = Caret::at_node(source, two).insert("7", &EditConfig::default()).unwrap();
        assert_eq!(edit.source().code(), "1 + 7");
        assert_eq!(edit.caret().offset(), Some(5));
    }

    #[test]
    fn test_insert_over_sole_child_keeps_wrapper() {
        let source = Source::new("test", "(1 + 2)");
        let sum = source.parent(source.token_at(3).unwrap().id()).unwrap().id();
        let edit = Caret::at_node(source, sum).insert("7", &EditConfig::default()).unwrap();
        assert_eq!(edit.source().code(), "(7)");
        assert_eq!(edit.caret().offset(), Some(2));

        for code in ["[_]", "x: (_)"] {
            let source = Source::new("test", code);
            let placeholder = source.parent(source.token_at(code.len() - 2).unwrap().id()).unwrap();
            assert!(placeholder.is_placeholder());
            let edit = Caret::at_node(source.clone(), placeholder.id())
                .insert("7", &EditConfig::default())
                .unwrap();
            assert_eq!(edit.source().code(), code.replace('_', "7"));
        }
    }

    #[test]
    fn test_wrap_selection() {
        let source = Source::new("test", "1 + 2");
        let two = source.token_at(4).unwrap().id();
        let edit = Caret::at_node(source, two).insert("(", &EditConfig::default()).unwrap();
        assert_eq!(edit.source().code(), "1 + (2)");
        assert_eq!(edit.caret().node().unwrap().kind(), NodeKind::Block);
        assert!(Caret::at_offset(edit.source().clone(), 0).wrap("(").is_none());
    }

    #[test]
    fn test_forward_delete_and_replace() {
        let edit = caret("abc", 1).delete().unwrap();
        assert_eq!(edit.source().code(), "ac");
        assert!(caret("abc", 3).delete().is_none());

        let source = Source::new("test", "1 + 2");
        let one = source.token_at(0).unwrap().id();
        let edit = Caret::at_offset(source, 0).replace(one, "10").unwrap();
        assert_eq!(edit.source().code(), "10 + 2");
        assert_eq!(edit.caret().offset(), Some(2));
    }

    #[test]
    fn test_insert_node_between_list_items() {
        let edit = caret("[1 2]", 2)
            .insert_node(Node::number("9"), &EditConfig::default())
            .unwrap();
        assert_eq!(edit.source().code(), "[1 9 2]");
    }
}
