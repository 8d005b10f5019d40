//! Deferred references to existing definitions.
//!
//! A revision that inserts a reference doesn't know which of a definition's
//! names to spell it with until it is committed under the active locales, so
//! it carries a [`Refer`] instead of a ready-made node.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::locale::Locales;
use crate::source::{Node, NodeId, NodeKind, Source};
use crate::util::is_operator;

/// A name of a definition together with its language tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spelling {
    pub name: String,
    pub language: Option<String>,
}

impl Spelling {
    pub fn is_symbolic(&self) -> bool {
        !self.name.is_empty() && self.name.chars().all(is_operator)
    }
}

#[derive(Debug, Clone, Copy, Eq, Serialize, Deserialize)]
pub struct Refer {
    pub definition: NodeId,
    /// Prefer a symbolic name (`+`) over a word when there is one
    #[serde(default)]
    pub operator_form: bool,
}

impl PartialEq for Refer {
    fn eq(&self, other: &Self) -> bool {
        self.definition == other.definition
    }
}

impl Refer {
    pub fn new(definition: NodeId) -> Self {
        Self {
            definition,
            operator_form: false,
        }
    }

    pub fn operator(definition: NodeId) -> Self {
        Self {
            definition,
            operator_form: true,
        }
    }

    /// The first binding or function in `source` known by `name`
    pub fn named(source: &Source, name: &str, operator_form: bool) -> Option<Self> {
        source
            .root()
            .nodes()
            .into_iter()
            .find(|node| spellings(node).iter().any(|s| s.name == name))
            .map(|definition| Self {
                definition: definition.id(),
                operator_form,
            })
    }

    /// Build the reference node, or None if the definition is gone or has
    /// no names
    pub fn resolve(&self, source: &Source, locales: &Locales) -> Option<Arc<Node>> {
        let definition = source.get(self.definition)?;
        let spellings = spellings(definition);
        let spelling = choose(&spellings, locales, self.operator_form)?;
        tracing::trace!(name = %spelling.name, definition = ?self.definition, "resolved reference");
        Some(Node::reference(&spelling.name))
    }
}

/// Every name a binding or function is known by, in source order
pub fn spellings(definition: &Arc<Node>) -> Vec<Spelling> {
    let names = match definition.kind() {
        NodeKind::Bind | NodeKind::FunctionDefinition => definition.get("names"),
        _ => None,
    };
    let Some(names) = names else {
        return Vec::new();
    };
    names
        .list_of("names")
        .iter()
        .filter_map(|name| {
            let token = name.get("name")?.as_token()?;
            let language = name
                .get("language")
                .and_then(|language| language.get("tag"))
                .and_then(|tag| tag.as_token())
                .map(|tag| tag.text.clone());
            Some(Spelling {
                name: token.text.clone(),
                language,
            })
        })
        .collect()
}

/// The name to use under `locales`
pub fn choose<'a>(
    spellings: &'a [Spelling],
    locales: &Locales,
    operator_form: bool,
) -> Option<&'a Spelling> {
    if operator_form {
        if let Some(symbolic) = spellings.iter().find(|s| s.is_symbolic()) {
            return Some(symbolic);
        }
    }
    spellings
        .iter()
        .filter_map(|s| {
            let rank = locales.rank(s.language.as_deref()?)?;
            Some((rank, s))
        })
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, s)| s)
        .or_else(|| spellings.iter().find(|s| s.language.is_none()))
        .or_else(|| spellings.first())
}
