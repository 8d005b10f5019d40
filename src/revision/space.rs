//! Whitespace around inserted nodes.
//!
//! Inserting at an offset that sits inside some token's leading whitespace
//! splits that whitespace: the part before the offset goes to the new node
//! and the rest stays with the token. The split never creates or drops a
//! character. Preferred spacing is a separate, optional pass that only adds
//! separators where an insertion would otherwise abut its neighbours.

use std::sync::Arc;

use crate::source::{Node, NodeKind, Source, Spaces};
use crate::util::split_at_grapheme;

/// Split the leading space of the token after `offset` in `source` between
/// `new_node` and that token, returning the updated copy of `spaces`.
///
/// `spaces` usually belongs to a newer version of the document that already
/// contains `new_node`; `offset` is measured in `source`.
pub fn split_space(source: &Source, offset: usize, new_node: &Arc<Node>, spaces: &Spaces) -> Spaces {
    let Some(after) = source.token_with_space_at(offset) else {
        return spaces.clone();
    };
    let space = source.spaces().token_space(after.id());
    let (before, rest) = split_at_grapheme(space, offset - after.space_start);
    tracing::trace!(before, rest, "splitting space");
    spaces
        .with_space(new_node, before)
        .with_token_space(after.id(), rest)
}

/// Add single separators around `child` where it abuts list siblings or,
/// for a binary operation, where its operator touches its operands.
pub fn preferred_spacing(source: &Source, child: &Arc<Node>, spaces: Spaces) -> Spaces {
    let mut spaces = spaces;

    if let Some(parent) = source.parent(child.id()) {
        if let Some(field) = parent.field_of(child.id()).filter(|field| field.list) {
            let separator = if parent.kind() == NodeKind::Block {
                "\n"
            } else {
                " "
            };
            let siblings = parent.list_of(field.name);
            if let Some(index) = siblings.iter().position(|s| s.id() == child.id()) {
                if index > 0 && spaces.space(child).is_empty() {
                    spaces = spaces.with_space(child, separator);
                }
                if let Some(next) = siblings.get(index + 1) {
                    if spaces.space(next).is_empty() {
                        spaces = spaces.with_space(next, separator);
                    }
                }
            }
        }
    }

    if child.kind() == NodeKind::BinaryEvaluate {
        for name in ["operator", "right"] {
            if let Some(part) = child.get(name) {
                if spaces.space(part).is_empty() {
                    spaces = spaces.with_space(part, " ");
                }
            }
        }
    }

    spaces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Slot;
    use crate::util::grapheme_count;

    #[test]
    fn test_split_conserves_space() {
        let source = Source::new("test", "a:1\n  \t b");
        let b = source.token_at(8).unwrap().clone();
        let space = source.spaces().token_space(b.id()).to_string();
        for offset in b.space_start..=b.start {
            let node = Node::number("9");
            let spaces = split_space(&source, offset, &node, source.spaces());
            let before = spaces.space(&node);
            let after = spaces.token_space(b.id());
            assert_eq!(grapheme_count(before) + grapheme_count(after), grapheme_count(&space));
            assert_eq!(format!("{before}{after}"), space);
        }
    }

    #[test]
    fn test_split_assigns_prefix_to_new_node() {
        let source = Source::new("test", "[1   2]");
        let two = source.token_at(5).unwrap().id();
        let node = Node::number("9");
        let spaces = split_space(&source, 3, &node, source.spaces());
        assert_eq!(spaces.space(&node), " ");
        assert_eq!(spaces.token_space(two), "  ");
    }

    #[test]
    fn test_preferred_spacing_separates_list_items() {
        let nine = Node::number("9");
        let list = Node::list(vec![Node::number("1"), Arc::clone(&nine), Node::number("2")]);
        let block = Node::branch(
            NodeKind::Block,
            vec![Slot::One(None), Slot::Many(vec![list]), Slot::One(None)],
        );
        let empty = Source::new("test", "");
        let program = empty.root().with_slot("block", Slot::One(Some(block))).unwrap();
        let source = empty.with_program(program, Spaces::default());
        assert_eq!(source.code(), "[192]");
        let spaces = preferred_spacing(&source, &nine, source.spaces().clone());
        let spaced = source.with_program(source.root().clone(), spaces);
        assert_eq!(spaced.code(), "[1 9 2]");
    }

    #[test]
    fn test_preferred_spacing_around_operator() {
        let sum = Node::binary(Node::number("1"), "+", Node::number("2"));
        let spaces = preferred_spacing(&Source::new("test", ""), &sum, Spaces::default());
        assert_eq!(spaces.space(sum.get("operator").unwrap()), " ");
        assert_eq!(spaces.space(sum.get("right").unwrap()), " ");
        assert_eq!(spaces.space(&sum), "");
    }
}
