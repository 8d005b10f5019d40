//! Source tests - tokenizing, parsing, positions and whitespace

mod common;

use common::{nodes_of, source, statements, syms};
use sprig::source::{NodeKind, Sym};

// ========================================================================
// Round trip
// ========================================================================

#[test]
fn test_reparse_yields_equal_tree_and_spaces() {
    for code in [
        "c: 1\n1 + 2",
        "hello/en,hola/es: \"hi\"\n\nhola",
        "ƒ sum(a b) a + b\nsum(1 2)",
        "  [1 2 {3 4}]  \n\t",
        "x ? 1 2",
        ") ] stray",
    ] {
        let original = source(code);
        let again = original.with_code(&original.code());
        assert_eq!(again.code(), code);
        assert!(again.root().is_equal_to(original.root()), "tree differs for {code:?}");

        let spaces_before: Vec<&str> = original
            .tokens()
            .iter()
            .map(|span| original.spaces().token_space(span.id()))
            .collect();
        let spaces_after: Vec<&str> = again
            .tokens()
            .iter()
            .map(|span| again.spaces().token_space(span.id()))
            .collect();
        assert_eq!(spaces_before, spaces_after);
    }
}

#[test]
fn test_every_node_has_a_space() {
    let doc = source("a: [1  2]\n  b");
    let mut text = String::new();
    for span in doc.tokens() {
        text.push_str(doc.spaces().token_space(span.id()));
        text.push_str(span.text());
    }
    assert_eq!(text, doc.code());
    for node in doc.root().nodes() {
        // Lookups never fail for nodes in the tree
        let _ = doc.spaces().space(&node);
    }
    let b = nodes_of(&doc, NodeKind::Reference).pop().unwrap();
    assert_eq!(doc.spaces().space(&b), "\n  ");
}

// ========================================================================
// Tokens
// ========================================================================

#[test]
fn test_mixed_unicode_tokens() {
    let doc = source("🐈: « hi »\ne\u{301}");
    assert_eq!(
        syms(&doc),
        vec![Sym::Name, Sym::Bind, Sym::Text, Sym::Name]
    );
    // Offsets count graphemes, not chars or bytes
    assert_eq!(doc.len(), 11);
    assert_eq!(doc.token_at(10).unwrap().text(), "e\u{301}");
}

#[test]
fn test_unclosed_text_stops_at_line_end() {
    let doc = source("\"open\n1");
    assert_eq!(syms(&doc), vec![Sym::Text, Sym::Number]);
    assert_eq!(doc.token_at(0).unwrap().text(), "\"open");
}

#[test]
fn test_decimal_numbers() {
    let doc = source("1.5 2.");
    assert_eq!(doc.token_at(0).unwrap().text(), "1.5");
    assert_eq!(doc.token_at(4).unwrap().text(), "2");
}

// ========================================================================
// Parsing
// ========================================================================

#[test]
fn test_evaluate_needs_adjacent_paren() {
    let call = source("f(1)");
    assert_eq!(statements(&call)[0].kind(), NodeKind::Evaluate);

    let spaced = source("f (1)");
    let kinds: Vec<_> = statements(&spaced).iter().map(|s| s.kind()).collect();
    assert_eq!(kinds, vec![NodeKind::Reference, NodeKind::Block]);
}

#[test]
fn test_unary_only_when_adjacent() {
    assert_eq!(statements(&source("-1"))[0].kind(), NodeKind::UnaryEvaluate);
    let kinds: Vec<_> = statements(&source("- 1")).iter().map(|s| s.kind()).collect();
    assert_eq!(kinds, vec![NodeKind::Reference, NodeKind::NumberLiteral]);
}

#[test]
fn test_conditional() {
    let doc = source("x ? 1 2");
    let conditional = &statements(&doc)[0];
    assert_eq!(conditional.kind(), NodeKind::Conditional);
    assert_eq!(conditional.get("no").unwrap().token_text(), "2");
}

#[test]
fn test_stray_tokens_are_unparsable() {
    let doc = source(") 1");
    let kinds: Vec<_> = statements(&doc).iter().map(|s| s.kind()).collect();
    assert_eq!(kinds, vec![NodeKind::Unparsable, NodeKind::NumberLiteral]);
}

#[test]
fn test_missing_closer_leaves_slot_empty() {
    let doc = source("[1 2");
    let list = &statements(&doc)[0];
    assert_eq!(list.kind(), NodeKind::ListLiteral);
    assert!(list.get("close").is_none());
    assert_eq!(list.list_of("values").len(), 2);
}

#[test]
fn test_function_definition_shape() {
    let doc = source("ƒ sum(a b) a + b");
    let fun = &statements(&doc)[0];
    assert_eq!(fun.kind(), NodeKind::FunctionDefinition);
    assert_eq!(fun.list_of("inputs").len(), 2);
    assert_eq!(fun.get("body").unwrap().kind(), NodeKind::BinaryEvaluate);
}

// ========================================================================
// Queries and edits
// ========================================================================

#[test]
fn test_node_ranges_and_neighbours() {
    let doc = source("a: [1 2]");
    let list = statements(&doc)[0].get("value").unwrap().clone();
    assert_eq!(doc.node_range(list.id()), Some(3..8));
    assert_eq!(doc.node_space_start(list.id()), Some(2));
    assert_eq!(doc.token_before_node(list.id()).unwrap().text(), ":");
    assert_eq!(doc.token_after_node(list.id()).unwrap().sym(), Sym::End);
    assert_eq!(doc.child_index(list.id()), Some(2));
}

#[test]
fn test_tree_replace_shares_untouched_nodes() {
    let doc = source("a: 1\nb: 2");
    let first = statements(&doc)[0].clone();
    let second_value = statements(&doc)[1].get("value").unwrap().id();
    let edited = doc
        .replace(second_value, Some(sprig::Node::number("3")))
        .unwrap();
    assert_eq!(edited.code(), "a: 1\nb: 3");
    assert_eq!(statements(&edited)[0].id(), first.id());
    assert!(!edited.contains(second_value));
    assert!(doc.contains(second_value));
}
