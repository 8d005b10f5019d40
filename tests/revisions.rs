//! Revision tests - replacing, appending, removing and deferred references

mod common;

use common::{node_at, source, statements};
use sprig::caret::Position;
use sprig::config::EditConfig;
use sprig::locale::Locales;
use sprig::revision::{Refer, Revision};
use sprig::source::{Node, NodeKind};

fn no_spacing() -> EditConfig {
    EditConfig {
        preferred_spacing: false,
        ..EditConfig::default()
    }
}

// ========================================================================
// Replace
// ========================================================================

#[test]
fn test_replace_number_with_reference() {
    let doc = source("c: 1\n1 + 2");
    let bind = statements(&doc)[0].id();
    let two = node_at(&doc, 9);
    assert_eq!(two.kind(), NodeKind::NumberLiteral);

    let revision = Revision::replace(&doc, two.id(), Refer::new(bind));
    assert!(revision.is_reference());
    assert!(!revision.is_completion(&Locales::default()));

    let edit = revision.edit(&Locales::default()).unwrap();
    assert_eq!(edit.source().code(), "c: 1\n1 + c");
    assert_eq!(edit.caret().offset(), Some(10));
    // The revision's own document is untouched
    assert_eq!(revision.source().code(), "c: 1\n1 + 2");
}

#[test]
fn test_reference_to_missing_definition_is_noop() {
    let doc = source("1 + 2");
    let one = node_at(&doc, 0);
    let revision = Revision::replace(&doc, one.id(), Refer::new(one.id()));
    assert!(revision.edit(&Locales::default()).is_none());
    assert_eq!(revision.description(&Locales::default()).to_string(), "replace 1 with nothing");
}

#[test]
fn test_replace_root_block_statement() {
    let doc = source("x");
    let x = statements(&doc)[0].id();
    let edit = Revision::replace(&doc, x, Node::binary(Node::number("1"), "+", Node::placeholder()))
        .edit(&Locales::default())
        .unwrap();
    assert_eq!(edit.source().code(), "1 + _");
    assert!(matches!(edit.caret().position(), Position::Node(_)));
    assert!(edit.caret().node().unwrap().is_placeholder());
}

// ========================================================================
// Append and locales
// ========================================================================

#[test]
fn test_append_reference_uses_active_locale() {
    let doc = source("hello/en,hola/es: 1\n[]");
    let bind = statements(&doc)[0].id();
    let list = statements(&doc)[1].id();
    let revision = Revision::append(&doc, 21, list, "values", 0, Refer::new(bind));

    let spanish = EditConfig {
        locales: Locales::new(["es"]),
        ..EditConfig::default()
    };
    let edit = revision.edit_with(&spanish).unwrap();
    assert_eq!(edit.source().code(), "hello/en,hola/es: 1\n[hola]");
    assert_eq!(edit.caret().offset(), Some(25));

    let english = revision.edit(&Locales::new(["en"])).unwrap();
    assert_eq!(english.source().code(), "hello/en,hola/es: 1\n[hello]");
    assert_eq!(
        revision.description(&Locales::new(["es"])).to_string(),
        "append hola"
    );
}

#[test]
fn test_append_statement_to_root_block() {
    let doc = source("a: 1");
    let block = doc.root().get("block").unwrap().id();
    let revision = Revision::append(&doc, 4, block, "statements", 1, Node::number("2"));

    let spaced = revision.edit(&Locales::default()).unwrap();
    assert_eq!(spaced.source().code(), "a: 1\n2");
    assert_eq!(spaced.caret().offset(), Some(6));

    let tight = revision.edit_with(&no_spacing()).unwrap();
    assert_eq!(tight.source().code(), "a: 12");
    assert_eq!(tight.caret().offset(), Some(5));
}

#[test]
fn test_split_space_conserves_whitespace() {
    let doc = source("[1    2]");
    let list = statements(&doc)[0].id();
    let edit = Revision::append(&doc, 3, list, "values", 1, Node::number("9"))
        .edit_with(&no_spacing())
        .unwrap();
    assert_eq!(edit.source().code(), "[1 9   2]");
    assert_eq!(edit.caret().offset(), Some(4));
    let spaces = |code: &str| code.chars().filter(|c| *c == ' ').count();
    assert_eq!(spaces(&edit.source().code()), spaces(&doc.code()));
}

#[test]
fn test_append_rejects_wrong_field() {
    let doc = source("a: 1");
    let bind = statements(&doc)[0].id();
    assert!(Revision::append(&doc, 4, bind, "value", 0, Node::number("2"))
        .edit(&Locales::default())
        .is_none());
}

// ========================================================================
// Remove
// ========================================================================

#[test]
fn test_remove_every_other_item() {
    let doc = source("[a b c d e f]");
    let list = statements(&doc)[0].clone();
    let values = list.list_of("values").to_vec();
    let revision = Revision::remove(
        &doc,
        list.id(),
        vec![values[5].id(), values[1].id(), values[3].id()],
    );
    assert!(revision.is_removal());
    assert_eq!(revision.description(&Locales::default()).to_string(), "remove 3 nodes");

    let edit = revision.edit(&Locales::default()).unwrap();
    assert_eq!(edit.source().code(), "[a c e]");
    assert_eq!(edit.caret().offset(), Some(2));
    let kept: Vec<_> = statements(edit.source())[0]
        .list_of("values")
        .iter()
        .map(|value| value.token_text())
        .collect();
    assert_eq!(kept, vec!["a", "c", "e"]);
}

#[test]
fn test_remove_one_statement() {
    let doc = source("a: 1\nb: 2");
    let block = doc.root().get("block").unwrap().id();
    let second = statements(&doc)[1].id();
    let revision = Revision::remove(&doc, block, vec![second]);
    assert_eq!(revision.description(&Locales::default()).to_string(), "remove bind");
    let edit = revision.edit(&Locales::default()).unwrap();
    assert_eq!(edit.source().code(), "a: 1");
    assert_eq!(edit.caret().offset(), Some(4));
}

#[test]
fn test_remove_unknown_child_is_noop() {
    let doc = source("[1 2]");
    let list = statements(&doc)[0].id();
    let stranger = source("3").root().id();
    assert!(Revision::remove(&doc, list, vec![stranger])
        .edit(&Locales::default())
        .is_none());
}

// ========================================================================
// Equality
// ========================================================================

#[test]
fn test_equality_of_revisions() {
    let doc = source("x: 1\ny");
    let bind = statements(&doc)[0].id();
    let y = statements(&doc)[1].id();
    assert_eq!(
        Revision::replace(&doc, y, Refer::new(bind)),
        Revision::replace(&doc, y, Refer::operator(bind))
    );
    assert_ne!(
        Revision::replace(&doc, y, Refer::new(bind)),
        Revision::replace(&doc, y, Node::reference("x"))
    );
    let block = doc.root().get("block").unwrap().id();
    assert_eq!(
        Revision::remove(&doc, block, vec![bind, y]),
        Revision::remove(&doc, block, vec![y, bind])
    );
}
