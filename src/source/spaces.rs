//! Leading whitespace of every node.
//!
//! Whitespace is stored on tokens. The space of a branch node is the space of
//! its first leaf token, so moving a node around keeps its formatting with it.

use std::collections::HashMap;
use std::sync::Arc;

use super::node::{Node, NodeId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spaces {
    map: Arc<HashMap<NodeId, String>>,
}

impl Spaces {
    pub fn new(map: HashMap<NodeId, String>) -> Self {
        Self { map: Arc::new(map) }
    }

    /// Space owned by a token id; empty when unassigned
    pub fn token_space(&self, token: NodeId) -> &str {
        self.map.get(&token).map_or("", String::as_str)
    }

    /// Leading space of any node
    pub fn space(&self, node: &Arc<Node>) -> &str {
        match node.first_leaf() {
            Some(leaf) => self.token_space(leaf.id()),
            None => "",
        }
    }

    /// A copy with the node's leading space set. Nodes without tokens have
    /// nowhere to keep a space, so they leave the map unchanged.
    pub fn with_space(&self, node: &Arc<Node>, space: &str) -> Spaces {
        match node.first_leaf() {
            Some(leaf) => self.with_token_space(leaf.id(), space),
            None => self.clone(),
        }
    }

    /// A copy with a token's space set; empty removes the entry
    pub fn with_token_space(&self, token: NodeId, space: &str) -> Spaces {
        if self.token_space(token) == space {
            return self.clone();
        }
        let mut map = (*self.map).clone();
        if space.is_empty() {
            map.remove(&token);
        } else {
            map.insert(token, space.to_string());
        }
        Spaces::new(map)
    }

    /// Move `original`'s leading space onto `replacement`.
    pub fn with_replacement(&self, original: &Arc<Node>, replacement: &Arc<Node>) -> Spaces {
        let (Some(from), Some(to)) = (original.first_leaf(), replacement.first_leaf()) else {
            return self.clone();
        };
        if from.id() == to.id() {
            return self.clone();
        }
        let space = self.token_space(from.id()).to_string();
        let mut map = (*self.map).clone();
        map.remove(&from.id());
        if space.is_empty() {
            map.remove(&to.id());
        } else {
            map.insert(to.id(), space);
        }
        Spaces::new(map)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
