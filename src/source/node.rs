//! Immutable syntax tree nodes.
//!
//! Nodes never point at their parents. Every node carries a stable
//! [`NodeId`]; untouched subtrees keep their ids across document versions and
//! rebuilt ancestors get fresh ones. Parent lookups go through the per-document
//! index in [`crate::source::Source`].
//!
//! Each non-leaf kind has a static field table ([`NodeKind::fields`]) and one
//! [`Slot`] per field, so edits can address children by field name and check
//! what a field accepts.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::token::{Sym, Token};

static NEXT_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a node, unique for the lifetime of the process
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    fn fresh() -> Self {
        NodeId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Token,
    Program,
    Block,
    Bind,
    Names,
    Name,
    Language,
    NumberLiteral,
    TextLiteral,
    BooleanLiteral,
    NoneLiteral,
    Reference,
    Placeholder,
    BinaryEvaluate,
    UnaryEvaluate,
    Evaluate,
    Conditional,
    ListLiteral,
    SetLiteral,
    FunctionDefinition,
    Unparsable,
}

/// What a field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Expression,
    Bind,
    Names,
    Name,
    Language,
    Block,
    Program,
    Token(Sym),
    AnyToken,
}

/// Static description of one child slot of a node kind
#[derive(Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub allowed: &'static [Category],
    pub list: bool,
    pub optional: bool,
}

impl Field {
    const fn one(name: &'static str, allowed: &'static [Category]) -> Self {
        Self {
            name,
            allowed,
            list: false,
            optional: false,
        }
    }

    const fn maybe(name: &'static str, allowed: &'static [Category]) -> Self {
        Self {
            name,
            allowed,
            list: false,
            optional: true,
        }
    }

    const fn many(name: &'static str, allowed: &'static [Category]) -> Self {
        Self {
            name,
            allowed,
            list: true,
            optional: false,
        }
    }

    pub fn accepts(&self, category: Category) -> bool {
        self.allowed.contains(&category)
    }

    /// Whether a node can be placed in this field
    pub fn admits(&self, node: &Node) -> bool {
        self.allowed.iter().any(|category| node.is(*category))
    }
}

/// The pseudo-field that holds a document's root program
pub static ROOT_FIELD: Field = Field::one("program", &[Category::Program]);

use Category as C;

const EXPRESSION: &[Category] = &[C::Expression];
const STATEMENT: &[Category] = &[C::Expression, C::Bind];
const NAME_TOKEN: &[Category] = &[C::Token(Sym::Name), C::Token(Sym::Operator)];

static PROGRAM_FIELDS: [Field; 2] = [
    Field::one("block", &[C::Block]),
    Field::one("end", &[C::Token(Sym::End)]),
];
static BLOCK_FIELDS: [Field; 3] = [
    Field::maybe("open", &[C::Token(Sym::EvalOpen)]),
    Field::many("statements", STATEMENT),
    Field::maybe("close", &[C::Token(Sym::EvalClose)]),
];
static BIND_FIELDS: [Field; 3] = [
    Field::one("names", &[C::Names]),
    Field::maybe("colon", &[C::Token(Sym::Bind)]),
    Field::maybe("value", EXPRESSION),
];
static NAMES_FIELDS: [Field; 1] = [Field::many("names", &[C::Name])];
static NAME_FIELDS: [Field; 3] = [
    Field::maybe("separator", &[C::Token(Sym::Comma)]),
    Field::one("name", NAME_TOKEN),
    Field::maybe("language", &[C::Language]),
];
static LANGUAGE_FIELDS: [Field; 2] = [
    Field::one("slash", &[C::Token(Sym::Language)]),
    Field::maybe("tag", &[C::Token(Sym::Name)]),
];
static NUMBER_FIELDS: [Field; 1] = [Field::one("number", &[C::Token(Sym::Number)])];
static TEXT_FIELDS: [Field; 1] = [Field::one("text", &[C::Token(Sym::Text)])];
static BOOLEAN_FIELDS: [Field; 1] = [Field::one("value", &[C::Token(Sym::Boolean)])];
static NONE_FIELDS: [Field; 1] = [Field::one("none", &[C::Token(Sym::None)])];
static REFERENCE_FIELDS: [Field; 1] = [Field::one("name", NAME_TOKEN)];
static PLACEHOLDER_FIELDS: [Field; 1] =
    [Field::one("placeholder", &[C::Token(Sym::Placeholder)])];
static BINARY_FIELDS: [Field; 3] = [
    Field::one("left", EXPRESSION),
    Field::one("operator", &[C::Token(Sym::Operator)]),
    Field::one("right", EXPRESSION),
];
static UNARY_FIELDS: [Field; 2] = [
    Field::one("operator", &[C::Token(Sym::Operator)]),
    Field::one("operand", EXPRESSION),
];
static EVALUATE_FIELDS: [Field; 4] = [
    Field::one("fun", EXPRESSION),
    Field::one("open", &[C::Token(Sym::EvalOpen)]),
    Field::many("inputs", EXPRESSION),
    Field::maybe("close", &[C::Token(Sym::EvalClose)]),
];
static CONDITIONAL_FIELDS: [Field; 4] = [
    Field::one("condition", EXPRESSION),
    Field::one("question", &[C::Token(Sym::Conditional)]),
    Field::one("yes", EXPRESSION),
    Field::maybe("no", EXPRESSION),
];
static LIST_FIELDS: [Field; 3] = [
    Field::one("open", &[C::Token(Sym::ListOpen)]),
    Field::many("values", EXPRESSION),
    Field::maybe("close", &[C::Token(Sym::ListClose)]),
];
static SET_FIELDS: [Field; 3] = [
    Field::one("open", &[C::Token(Sym::SetOpen)]),
    Field::many("values", EXPRESSION),
    Field::maybe("close", &[C::Token(Sym::SetClose)]),
];
static FUNCTION_FIELDS: [Field; 6] = [
    Field::one("fun", &[C::Token(Sym::Function)]),
    Field::maybe("names", &[C::Names]),
    Field::maybe("open", &[C::Token(Sym::EvalOpen)]),
    Field::many("inputs", &[C::Bind]),
    Field::maybe("close", &[C::Token(Sym::EvalClose)]),
    Field::maybe("body", EXPRESSION),
];
static UNPARSABLE_FIELDS: [Field; 1] = [Field::many("tokens", &[C::AnyToken])];

impl NodeKind {
    pub fn fields(self) -> &'static [Field] {
        match self {
            NodeKind::Token => &[],
            NodeKind::Program => &PROGRAM_FIELDS,
            NodeKind::Block => &BLOCK_FIELDS,
            NodeKind::Bind => &BIND_FIELDS,
            NodeKind::Names => &NAMES_FIELDS,
            NodeKind::Name => &NAME_FIELDS,
            NodeKind::Language => &LANGUAGE_FIELDS,
            NodeKind::NumberLiteral => &NUMBER_FIELDS,
            NodeKind::TextLiteral => &TEXT_FIELDS,
            NodeKind::BooleanLiteral => &BOOLEAN_FIELDS,
            NodeKind::NoneLiteral => &NONE_FIELDS,
            NodeKind::Reference => &REFERENCE_FIELDS,
            NodeKind::Placeholder => &PLACEHOLDER_FIELDS,
            NodeKind::BinaryEvaluate => &BINARY_FIELDS,
            NodeKind::UnaryEvaluate => &UNARY_FIELDS,
            NodeKind::Evaluate => &EVALUATE_FIELDS,
            NodeKind::Conditional => &CONDITIONAL_FIELDS,
            NodeKind::ListLiteral => &LIST_FIELDS,
            NodeKind::SetLiteral => &SET_FIELDS,
            NodeKind::FunctionDefinition => &FUNCTION_FIELDS,
            NodeKind::Unparsable => &UNPARSABLE_FIELDS,
        }
    }

    pub fn field(self, name: &str) -> Option<&'static Field> {
        self.fields().iter().find(|field| field.name == name)
    }

    pub fn is_expression(self) -> bool {
        matches!(
            self,
            NodeKind::Block
                | NodeKind::NumberLiteral
                | NodeKind::TextLiteral
                | NodeKind::BooleanLiteral
                | NodeKind::NoneLiteral
                | NodeKind::Reference
                | NodeKind::Placeholder
                | NodeKind::BinaryEvaluate
                | NodeKind::UnaryEvaluate
                | NodeKind::Evaluate
                | NodeKind::Conditional
                | NodeKind::ListLiteral
                | NodeKind::SetLiteral
                | NodeKind::FunctionDefinition
                | NodeKind::Unparsable
        )
    }

    /// Human-readable label used in descriptions
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Token => "token",
            NodeKind::Program => "program",
            NodeKind::Block => "block",
            NodeKind::Bind => "bind",
            NodeKind::Names => "names",
            NodeKind::Name => "name",
            NodeKind::Language => "language",
            NodeKind::NumberLiteral => "number",
            NodeKind::TextLiteral => "text",
            NodeKind::BooleanLiteral => "boolean",
            NodeKind::NoneLiteral => "none",
            NodeKind::Reference => "reference",
            NodeKind::Placeholder => "placeholder",
            NodeKind::BinaryEvaluate => "operation",
            NodeKind::UnaryEvaluate => "unary operation",
            NodeKind::Evaluate => "evaluation",
            NodeKind::Conditional => "conditional",
            NodeKind::ListLiteral => "list",
            NodeKind::SetLiteral => "set",
            NodeKind::FunctionDefinition => "function",
            NodeKind::Unparsable => "unparsable code",
        }
    }
}

/// One child slot of a node
#[derive(Debug, Clone)]
pub enum Slot {
    One(Option<Arc<Node>>),
    Many(Vec<Arc<Node>>),
}

impl Slot {
    pub fn nodes(&self) -> &[Arc<Node>] {
        match self {
            Slot::One(Some(node)) => std::slice::from_ref(node),
            Slot::One(None) => &[],
            Slot::Many(nodes) => nodes,
        }
    }
}

#[derive(Debug)]
enum Body {
    Leaf(Token),
    Branch(Vec<Slot>),
}

#[derive(Debug)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    body: Body,
}

impl Node {
    pub fn token(sym: Sym, text: impl Into<String>) -> Arc<Node> {
        Arc::new(Node {
            id: NodeId::fresh(),
            kind: NodeKind::Token,
            body: Body::Leaf(Token::new(sym, text)),
        })
    }

    /// Build a branch node; `slots` must line up with the kind's field table.
    pub fn branch(kind: NodeKind, slots: Vec<Slot>) -> Arc<Node> {
        debug_assert_eq!(slots.len(), kind.fields().len(), "slot count for {kind:?}");
        Arc::new(Node {
            id: NodeId::fresh(),
            kind,
            body: Body::Branch(slots),
        })
    }

    pub fn placeholder() -> Arc<Node> {
        Self::branch(
            NodeKind::Placeholder,
            vec![Slot::One(Some(Self::token(Sym::Placeholder, "_")))],
        )
    }

    pub fn reference(name: &str) -> Arc<Node> {
        let sym = if name.chars().all(crate::util::is_operator) {
            Sym::Operator
        } else {
            Sym::Name
        };
        Self::branch(
            NodeKind::Reference,
            vec![Slot::One(Some(Self::token(sym, name)))],
        )
    }

    pub fn number(text: &str) -> Arc<Node> {
        Self::branch(
            NodeKind::NumberLiteral,
            vec![Slot::One(Some(Self::token(Sym::Number, text)))],
        )
    }

    pub fn binary(left: Arc<Node>, operator: &str, right: Arc<Node>) -> Arc<Node> {
        Self::branch(
            NodeKind::BinaryEvaluate,
            vec![
                Slot::One(Some(left)),
                Slot::One(Some(Self::token(Sym::Operator, operator))),
                Slot::One(Some(right)),
            ],
        )
    }

    /// A parenthesized block
    pub fn block(statements: Vec<Arc<Node>>) -> Arc<Node> {
        Self::branch(
            NodeKind::Block,
            vec![
                Slot::One(Some(Self::token(Sym::EvalOpen, "("))),
                Slot::Many(statements),
                Slot::One(Some(Self::token(Sym::EvalClose, ")"))),
            ],
        )
    }

    pub fn list(values: Vec<Arc<Node>>) -> Arc<Node> {
        Self::branch(
            NodeKind::ListLiteral,
            vec![
                Slot::One(Some(Self::token(Sym::ListOpen, "["))),
                Slot::Many(values),
                Slot::One(Some(Self::token(Sym::ListClose, "]"))),
            ],
        )
    }

    /// A program with no statements
    pub fn empty_program() -> Arc<Node> {
        let block = Self::branch(
            NodeKind::Block,
            vec![Slot::One(None), Slot::Many(Vec::new()), Slot::One(None)],
        );
        Self::branch(
            NodeKind::Program,
            vec![
                Slot::One(Some(block)),
                Slot::One(Some(Self::token(Sym::End, ""))),
            ],
        )
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn as_token(&self) -> Option<&Token> {
        match &self.body {
            Body::Leaf(token) => Some(token),
            Body::Branch(_) => None,
        }
    }

    pub fn is_token(&self) -> bool {
        self.kind == NodeKind::Token
    }

    pub fn is_sym(&self, sym: Sym) -> bool {
        self.as_token().is_some_and(|token| token.sym == sym)
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind == NodeKind::Placeholder
    }

    pub fn is_expression(&self) -> bool {
        self.kind.is_expression()
    }

    pub fn is(&self, category: Category) -> bool {
        match category {
            Category::Expression => self.kind.is_expression(),
            Category::Bind => self.kind == NodeKind::Bind,
            Category::Names => self.kind == NodeKind::Names,
            Category::Name => self.kind == NodeKind::Name,
            Category::Language => self.kind == NodeKind::Language,
            Category::Block => self.kind == NodeKind::Block,
            Category::Program => self.kind == NodeKind::Program,
            Category::Token(sym) => self.is_sym(sym),
            Category::AnyToken => self.is_token(),
        }
    }

    fn slots(&self) -> &[Slot] {
        match &self.body {
            Body::Leaf(_) => &[],
            Body::Branch(slots) => slots,
        }
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        let index = self.kind.fields().iter().position(|f| f.name == name)?;
        self.slots().get(index)
    }

    /// The single child held in a field
    pub fn get(&self, name: &str) -> Option<&Arc<Node>> {
        match self.slot(name)? {
            Slot::One(node) => node.as_ref(),
            Slot::Many(_) => None,
        }
    }

    /// The children held in a list field (empty for unknown fields)
    pub fn list_of(&self, name: &str) -> &[Arc<Node>] {
        match self.slot(name) {
            Some(Slot::Many(nodes)) => nodes,
            _ => &[],
        }
    }

    /// All children in source order
    pub fn children(&self) -> Vec<Arc<Node>> {
        self.slots()
            .iter()
            .flat_map(|slot| slot.nodes().iter().cloned())
            .collect()
    }

    /// The field of this node that directly holds `child`
    pub fn field_of(&self, child: NodeId) -> Option<&'static Field> {
        self.kind
            .fields()
            .iter()
            .zip(self.slots())
            .find(|(_, slot)| slot.nodes().iter().any(|n| n.id == child))
            .map(|(field, _)| field)
    }

    /// All leaf tokens, in source order
    pub fn leaves(self: &Arc<Self>) -> Vec<Arc<Node>> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves(self: &Arc<Self>, out: &mut Vec<Arc<Node>>) {
        match &self.body {
            Body::Leaf(_) => out.push(Arc::clone(self)),
            Body::Branch(slots) => {
                for slot in slots {
                    for child in slot.nodes() {
                        child.collect_leaves(out);
                    }
                }
            }
        }
    }

    pub fn first_leaf(self: &Arc<Self>) -> Option<Arc<Node>> {
        match &self.body {
            Body::Leaf(_) => Some(Arc::clone(self)),
            Body::Branch(slots) => slots
                .iter()
                .flat_map(|slot| slot.nodes())
                .find_map(|child| child.first_leaf()),
        }
    }

    pub fn last_leaf(self: &Arc<Self>) -> Option<Arc<Node>> {
        match &self.body {
            Body::Leaf(_) => Some(Arc::clone(self)),
            Body::Branch(slots) => slots
                .iter()
                .rev()
                .flat_map(|slot| slot.nodes().iter().rev())
                .find_map(|child| child.last_leaf()),
        }
    }

    /// Every node in the subtree, parents before children
    pub fn nodes(self: &Arc<Self>) -> Vec<Arc<Node>> {
        let mut out = vec![Arc::clone(self)];
        for child in self.children() {
            out.extend(child.nodes());
        }
        out
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id == id || self.children().iter().any(|child| child.contains(id))
    }

    pub fn first_placeholder(self: &Arc<Self>) -> Option<Arc<Node>> {
        self.nodes().into_iter().find(|node| node.is_placeholder())
    }

    /// Concatenated token text, ignoring whitespace
    pub fn token_text(self: &Arc<Self>) -> String {
        self.leaves()
            .iter()
            .filter_map(|leaf| leaf.as_token().map(|t| t.text.as_str()))
            .collect()
    }

    /// A copy of this node with one field's slot replaced
    pub fn with_slot(&self, name: &str, slot: Slot) -> Option<Arc<Node>> {
        let index = self.kind.fields().iter().position(|f| f.name == name)?;
        let mut slots = self.slots().to_vec();
        slots[index] = slot;
        Some(Node::branch(self.kind, slots))
    }

    /// A copy of this node with `original` swapped for `replacement`, or
    /// removed when `replacement` is None. Returns None if `original` is not
    /// a strict descendant.
    pub fn replaced(&self, original: NodeId, replacement: Option<&Arc<Node>>) -> Option<Arc<Node>> {
        let slots = self.slots();
        for (index, slot) in slots.iter().enumerate() {
            let new_slot = match slot {
                Slot::One(Some(child)) if child.id == original => {
                    Some(Slot::One(replacement.cloned()))
                }
                Slot::One(Some(child)) => child
                    .replaced(original, replacement)
                    .map(|new_child| Slot::One(Some(new_child))),
                Slot::One(None) => None,
                Slot::Many(children) => {
                    if let Some(position) = children.iter().position(|c| c.id == original) {
                        let mut children = children.clone();
                        match replacement {
                            Some(node) => children[position] = Arc::clone(node),
                            None => {
                                children.remove(position);
                            }
                        }
                        Some(Slot::Many(children))
                    } else {
                        children.iter().enumerate().find_map(|(i, child)| {
                            child.replaced(original, replacement).map(|new_child| {
                                let mut children = children.clone();
                                children[i] = new_child;
                                Slot::Many(children)
                            })
                        })
                    }
                }
            };
            if let Some(new_slot) = new_slot {
                let mut slots = slots.to_vec();
                slots[index] = new_slot;
                return Some(Node::branch(self.kind, slots));
            }
        }
        None
    }

    /// Structural equality: same kinds, same token text, same shape
    pub fn is_equal_to(&self, other: &Node) -> bool {
        if self.kind != other.kind {
            return false;
        }
        match (&self.body, &other.body) {
            (Body::Leaf(a), Body::Leaf(b)) => a == b,
            (Body::Branch(a), Body::Branch(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| {
                        let (x, y) = (x.nodes(), y.nodes());
                        x.len() == y.len() && x.iter().zip(y).all(|(m, n)| m.is_equal_to(n))
                    })
            }
            _ => false,
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal_to(other)
    }
}
