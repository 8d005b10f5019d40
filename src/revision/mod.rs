//! Revisions: structural edit recipes.
//!
//! A [`Revision`] names a change to the tree of one document version (add a
//! child, assign fields, append to a list, remove children, replace a node).
//! It is a value, not an edit: hosts list and compare revisions, describe
//! them, and only when one is chosen ask it for the [`Edit`] under the active
//! locales. Inserted references stay deferred as [`Refer`]s until then.

mod refer;
mod space;

pub use refer::{choose, spellings, Refer, Spelling};
pub use space::{preferred_spacing, split_space};

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::caret::{Caret, Edit, Position};
use crate::config::EditConfig;
use crate::locale::Locales;
use crate::source::{Node, NodeId, Slot, Source};

/// What a revision inserts
#[derive(Debug, Clone)]
pub enum Insertion {
    Node(Arc<Node>),
    Refer(Refer),
}

impl Insertion {
    pub fn resolve(&self, source: &Source, locales: &Locales) -> Option<Arc<Node>> {
        match self {
            Insertion::Node(node) => Some(Arc::clone(node)),
            Insertion::Refer(refer) => refer.resolve(source, locales),
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Insertion::Refer(_))
    }
}

impl PartialEq for Insertion {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Insertion::Node(a), Insertion::Node(b)) => a.is_equal_to(b),
            (Insertion::Refer(a), Insertion::Refer(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Arc<Node>> for Insertion {
    fn from(node: Arc<Node>) -> Self {
        Insertion::Node(node)
    }
}

impl From<Refer> for Insertion {
    fn from(refer: Refer) -> Self {
        Insertion::Refer(refer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Add,
    Set,
    Append,
    Remove,
    Replace,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Add => "add",
            Action::Set => "set",
            Action::Append => "append",
            Action::Remove => "remove",
            Action::Replace => "replace",
        })
    }
}

/// Short human-readable summary of a revision, e.g. `replace 2 with c`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Description {
    pub action: Action,
    pub subject: String,
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action, self.subject)
    }
}

/// How a node is named in descriptions: its text if it is a single token
/// deep, otherwise its kind
fn subject(node: &Arc<Node>) -> String {
    let leaves = node.leaves();
    if leaves.len() == 1 {
        node.token_text()
    } else {
        node.kind().label().to_string()
    }
}

#[derive(Debug, Clone)]
pub enum Revision {
    /// Fill one field of `parent` with a new child inserted at `position`
    Add {
        source: Source,
        position: usize,
        parent: NodeId,
        field: &'static str,
        child: Insertion,
    },
    /// Set several fields of `parent` at once; `None` empties a field
    Assign {
        source: Source,
        position: usize,
        parent: NodeId,
        fields: Vec<(&'static str, Option<Insertion>)>,
    },
    /// Insert into the list field of `parent` at `index`
    Append {
        source: Source,
        position: usize,
        parent: NodeId,
        field: &'static str,
        index: usize,
        child: Insertion,
    },
    /// Remove children of `parent`
    Remove {
        source: Source,
        parent: NodeId,
        nodes: Vec<NodeId>,
    },
    /// Swap one node for another
    Replace {
        source: Source,
        original: NodeId,
        replacement: Insertion,
    },
}

impl Revision {
    pub fn replace(source: &Source, original: NodeId, replacement: impl Into<Insertion>) -> Self {
        Revision::Replace {
            source: source.clone(),
            original,
            replacement: replacement.into(),
        }
    }

    pub fn remove(source: &Source, parent: NodeId, nodes: Vec<NodeId>) -> Self {
        Revision::Remove {
            source: source.clone(),
            parent,
            nodes,
        }
    }

    pub fn append(
        source: &Source,
        position: usize,
        parent: NodeId,
        field: &'static str,
        index: usize,
        child: impl Into<Insertion>,
    ) -> Self {
        Revision::Append {
            source: source.clone(),
            position,
            parent,
            field,
            index,
            child: child.into(),
        }
    }

    pub fn add(
        source: &Source,
        position: usize,
        parent: NodeId,
        field: &'static str,
        child: impl Into<Insertion>,
    ) -> Self {
        Revision::Add {
            source: source.clone(),
            position,
            parent,
            field,
            child: child.into(),
        }
    }

    /// The document version this revision applies to
    pub fn source(&self) -> &Source {
        match self {
            Revision::Add { source, .. }
            | Revision::Assign { source, .. }
            | Revision::Append { source, .. }
            | Revision::Remove { source, .. }
            | Revision::Replace { source, .. } => source,
        }
    }

    pub fn is_reference(&self) -> bool {
        match self {
            Revision::Add { child, .. } | Revision::Append { child, .. } => child.is_reference(),
            Revision::Assign { fields, .. } => fields
                .iter()
                .any(|(_, child)| child.as_ref().is_some_and(Insertion::is_reference)),
            Revision::Remove { .. } => false,
            Revision::Replace { replacement, .. } => replacement.is_reference(),
        }
    }

    pub fn is_removal(&self) -> bool {
        match self {
            Revision::Remove { .. } => true,
            Revision::Assign { fields, .. } => fields.iter().all(|(_, child)| child.is_none()),
            _ => false,
        }
    }

    /// Whether a replacement only extends what it replaces, as when
    /// completing a partially typed name
    pub fn is_completion(&self, locales: &Locales) -> bool {
        let Revision::Replace { source, original, .. } = self else {
            return false;
        };
        let (Some(original), Some(new)) = (source.get(*original), self.new_node(locales)) else {
            return false;
        };
        let before = original.token_text();
        let after = new.token_text();
        !before.is_empty() && after.len() > before.len() && after.starts_with(&before)
    }

    /// The node this revision inserts, if any
    pub fn new_node(&self, locales: &Locales) -> Option<Arc<Node>> {
        let source = self.source();
        match self {
            Revision::Add { child, .. } | Revision::Append { child, .. } => {
                child.resolve(source, locales)
            }
            Revision::Assign { fields, .. } => fields
                .iter()
                .find_map(|(_, child)| child.as_ref())
                .and_then(|child| child.resolve(source, locales)),
            Revision::Remove { .. } => None,
            Revision::Replace { replacement, .. } => replacement.resolve(source, locales),
        }
    }

    /// The inserted node (if any) and the rebuilt parent that holds it
    pub fn edited_node(&self, locales: &Locales) -> Option<(Option<Arc<Node>>, Arc<Node>)> {
        let source = self.source();
        match self {
            Revision::Add {
                parent,
                field,
                child,
                ..
            } => {
                let parent = source.get(*parent)?;
                let field = parent.kind().field(field)?;
                let child = child.resolve(source, locales)?;
                if !field.admits(&child) {
                    return None;
                }
                let slot = if field.list {
                    Slot::Many(vec![Arc::clone(&child)])
                } else {
                    Slot::One(Some(Arc::clone(&child)))
                };
                Some((Some(child), parent.with_slot(field.name, slot)?))
            }
            Revision::Assign { parent, fields, .. } => {
                let mut edited = Arc::clone(source.get(*parent)?);
                let mut first = None;
                for (name, child) in fields {
                    let field = edited.kind().field(name)?;
                    let node = match child {
                        Some(child) => Some(child.resolve(source, locales)?),
                        None => None,
                    };
                    let slot = match &node {
                        Some(node) if !field.admits(node) => return None,
                        Some(node) if field.list => Slot::Many(vec![Arc::clone(node)]),
                        Some(node) => Slot::One(Some(Arc::clone(node))),
                        None if field.list => Slot::Many(Vec::new()),
                        None if field.optional => Slot::One(None),
                        None => return None,
                    };
                    edited = edited.with_slot(field.name, slot)?;
                    if first.is_none() {
                        first = node;
                    }
                }
                Some((first, edited))
            }
            Revision::Append {
                parent,
                field,
                index,
                child,
                ..
            } => {
                let parent = source.get(*parent)?;
                let field = parent.kind().field(field).filter(|field| field.list)?;
                let child = child.resolve(source, locales)?;
                if !field.admits(&child) {
                    return None;
                }
                let mut items = parent.list_of(field.name).to_vec();
                if *index > items.len() {
                    return None;
                }
                items.insert(*index, Arc::clone(&child));
                Some((Some(child), parent.with_slot(field.name, Slot::Many(items))?))
            }
            Revision::Remove { parent, nodes, .. } => {
                let mut edited = Arc::clone(source.get(*parent)?);
                let children = edited.children();
                let mut indices = nodes
                    .iter()
                    .map(|id| children.iter().position(|child| child.id() == *id))
                    .collect::<Option<Vec<_>>>()?;
                indices.sort_unstable_by(|a, b| b.cmp(a));
                indices.dedup();
                for index in indices {
                    // Removing a child rebuilds the parent, so look the
                    // children up again every time
                    let children = edited.children();
                    let child = children.get(index)?;
                    let field = edited.field_of(child.id())?;
                    if !field.list && !field.optional {
                        return None;
                    }
                    edited = edited.replaced(child.id(), None)?;
                }
                Some((None, edited))
            }
            Revision::Replace {
                original,
                replacement,
                ..
            } => {
                let child = replacement.resolve(source, locales)?;
                match source.parent(*original) {
                    Some(parent) => {
                        let field = parent.field_of(*original)?;
                        if !field.admits(&child) {
                            return None;
                        }
                        let edited = parent.replaced(*original, Some(&child))?;
                        Some((Some(child), edited))
                    }
                    None => Some((Some(Arc::clone(&child)), child)),
                }
            }
        }
    }

    /// The node whose replacement carries this revision out
    fn target(&self) -> Option<NodeId> {
        match self {
            Revision::Add { parent, .. }
            | Revision::Assign { parent, .. }
            | Revision::Append { parent, .. }
            | Revision::Remove { parent, .. } => Some(*parent),
            Revision::Replace {
                source, original, ..
            } => Some(
                source
                    .parent(*original)
                    .map_or(*original, |parent| parent.id()),
            ),
        }
    }

    /// Where inserted text starts, for splitting whitespace
    fn insertion_offset(&self) -> Option<usize> {
        match self {
            Revision::Add { position, .. }
            | Revision::Assign { position, .. }
            | Revision::Append { position, .. } => Some(*position),
            Revision::Remove { .. } => None,
            Revision::Replace {
                source, original, ..
            } => source.node_start(*original),
        }
    }

    /// Where the caret goes when nothing was inserted
    fn removal_offset(&self) -> Option<usize> {
        let source = self.source();
        match self {
            Revision::Remove { nodes, .. } => nodes
                .iter()
                .filter_map(|id| source.node_space_start(*id))
                .min(),
            Revision::Assign {
                parent,
                fields,
                position,
                ..
            } => fields
                .first()
                .and_then(|(name, _)| source.get(*parent)?.get(name))
                .and_then(|child| source.node_space_start(child.id()))
                .or(Some(*position)),
            _ => None,
        }
    }

    /// Apply the revision with preferred spacing
    pub fn edit(&self, locales: &Locales) -> Option<Edit> {
        self.apply(locales, true)
    }

    /// Apply the revision with the given preferences
    pub fn edit_with(&self, config: &EditConfig) -> Option<Edit> {
        self.apply(&config.locales, config.preferred_spacing)
    }

    fn apply(&self, locales: &Locales, spacing: bool) -> Option<Edit> {
        let source = self.source();
        let (child, parent) = self.edited_node(locales)?;
        let replaced = source.replace(self.target()?, Some(parent))?;

        let mut spaces = replaced.spaces().clone();
        if let (Some(child), Some(offset)) = (&child, self.insertion_offset()) {
            spaces = split_space(source, offset, child, &spaces);
        }
        let mut edited = replaced.with_program(Arc::clone(replaced.root()), spaces);
        if spacing {
            if let Some(child) = &child {
                let spaces = preferred_spacing(&edited, child, edited.spaces().clone());
                edited = edited.with_program(Arc::clone(edited.root()), spaces);
            }
        }

        let position = match &child {
            Some(child) => match child.first_placeholder() {
                Some(placeholder) if edited.contains(placeholder.id()) => {
                    Position::Node(placeholder.id())
                }
                _ => Position::Offset(edited.node_end(child.id()).unwrap_or(0)),
            },
            None => Position::Offset(self.removal_offset()?.min(edited.len())),
        };

        tracing::debug!(
            description = %self.description(locales),
            length = edited.len(),
            "applied revision"
        );
        let caret = Caret::new(edited.clone(), position);
        Some(Edit::Source(edited, caret))
    }

    pub fn description(&self, locales: &Locales) -> Description {
        let source = self.source();
        let new = || {
            self.new_node(locales)
                .map_or_else(|| "nothing".to_string(), |node| subject(&node))
        };
        match self {
            Revision::Add { .. } => Description {
                action: Action::Add,
                subject: new(),
            },
            Revision::Assign { fields, .. } => Description {
                action: Action::Set,
                subject: fields
                    .iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join(", "),
            },
            Revision::Append { .. } => Description {
                action: Action::Append,
                subject: new(),
            },
            Revision::Remove { nodes, .. } => Description {
                action: Action::Remove,
                subject: match nodes.as_slice() {
                    [only] => source.get(*only).map_or_else(String::new, subject),
                    nodes => format!("{} nodes", nodes.len()),
                },
            },
            Revision::Replace { original, .. } => Description {
                action: Action::Replace,
                subject: format!(
                    "{} with {}",
                    source.get(*original).map_or_else(String::new, subject),
                    new()
                ),
            },
        }
    }
}

impl PartialEq for Revision {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Revision::Add {
                    position: p1,
                    parent: a,
                    field: f1,
                    child: c1,
                    ..
                },
                Revision::Add {
                    position: p2,
                    parent: b,
                    field: f2,
                    child: c2,
                    ..
                },
            ) => a == b && f1 == f2 && p1 == p2 && c1 == c2,
            (
                Revision::Assign {
                    parent: a,
                    fields: f1,
                    ..
                },
                Revision::Assign {
                    parent: b,
                    fields: f2,
                    ..
                },
            ) => a == b && f1 == f2,
            (
                Revision::Append {
                    parent: a,
                    field: f1,
                    index: i1,
                    child: c1,
                    ..
                },
                Revision::Append {
                    parent: b,
                    field: f2,
                    index: i2,
                    child: c2,
                    ..
                },
            ) => a == b && f1 == f2 && i1 == i2 && c1 == c2,
            (
                Revision::Remove {
                    parent: a,
                    nodes: n1,
                    ..
                },
                Revision::Remove {
                    parent: b,
                    nodes: n2,
                    ..
                },
            ) => {
                let (mut n1, mut n2) = (n1.clone(), n2.clone());
                n1.sort_unstable();
                n2.sort_unstable();
                a == b && n1 == n2
            }
            (
                Revision::Replace {
                    original: a,
                    replacement: r1,
                    ..
                },
                Revision::Replace {
                    original: b,
                    replacement: r2,
                    ..
                },
            ) => a == b && r1 == r2,
            _ => false,
        }
    }
}
