//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::sync::Arc;

use sprig::caret::{Caret, Edit};
use sprig::config::EditConfig;
use sprig::source::{Node, NodeKind, Source, Sym};

/// Parse `code` into a document named "test"
pub fn source(code: &str) -> Source {
    Source::new("test", code)
}

/// Caret at an offset in freshly parsed `code`
pub fn caret_at(code: &str, offset: usize) -> Caret {
    Caret::at_offset(source(code), offset)
}

/// Statements of the program's top-level block
pub fn statements(source: &Source) -> Vec<Arc<Node>> {
    source
        .root()
        .get("block")
        .map(|block| block.list_of("statements").to_vec())
        .unwrap_or_default()
}

/// The innermost non-token node around the token whose text starts at `offset`
pub fn node_at(source: &Source, offset: usize) -> Arc<Node> {
    let token = source
        .token_at(offset)
        .unwrap_or_else(|| panic!("no token at {offset} in {:?}", source.code()));
    source.parent(token.id()).unwrap().clone()
}

/// Type each string in turn, following the caret through every edit
pub fn type_all(caret: Caret, inputs: &[&str]) -> Caret {
    let config = EditConfig::default();
    inputs.iter().fold(caret, |caret, text| {
        caret
            .insert(text, &config)
            .unwrap_or_else(|| panic!("inserting {text:?} did nothing"))
            .into_caret()
    })
}

/// Document text after an edit
pub fn code(edit: &Edit) -> String {
    edit.source().code()
}

/// Every node of a kind, in document order
pub fn nodes_of(source: &Source, kind: NodeKind) -> Vec<Arc<Node>> {
    source
        .root()
        .nodes()
        .into_iter()
        .filter(|node| node.kind() == kind)
        .collect()
}

/// Token symbols of a document, ignoring the end marker
pub fn syms(source: &Source) -> Vec<Sym> {
    source
        .tokens()
        .iter()
        .map(|span| span.sym())
        .filter(|sym| *sym != Sym::End)
        .collect()
}
