//! Error-tolerant recursive descent parser.
//!
//! Every token sequence parses. Tokens that cannot start or continue a
//! construct are gathered into `Unparsable` nodes, and missing closers leave
//! the corresponding optional slot empty, so the tree always covers every
//! token exactly once.

use std::collections::HashMap;
use std::sync::Arc;

use super::node::{Node, NodeId, NodeKind, Slot};
use super::token::Sym;
use super::tokenizer::{tokenize, Lexeme};

/// Parse text into a program and the leading whitespace of each token
pub fn parse(source: &str) -> (Arc<Node>, HashMap<NodeId, String>) {
    let lexemes = tokenize(source);
    let mut parser = Parser::new(lexemes);
    let program = parser.program();
    (program, parser.spaces)
}

pub(crate) fn can_start_expression(sym: Sym) -> bool {
    matches!(
        sym,
        Sym::Number
            | Sym::Text
            | Sym::Boolean
            | Sym::None
            | Sym::Placeholder
            | Sym::Name
            | Sym::EvalOpen
            | Sym::ListOpen
            | Sym::SetOpen
            | Sym::Function
            | Sym::Operator
    )
}

struct Parser {
    tokens: Vec<Arc<Node>>,
    space_before: Vec<String>,
    spaces: HashMap<NodeId, String>,
    pos: usize,
    /// Closers of the constructs currently open, innermost last
    closers: Vec<Sym>,
}

impl Parser {
    fn new(lexemes: Vec<Lexeme>) -> Self {
        let mut tokens = Vec::with_capacity(lexemes.len());
        let mut space_before = Vec::with_capacity(lexemes.len());
        let mut spaces = HashMap::new();
        for lexeme in lexemes {
            let node = Node::token(lexeme.token.sym, lexeme.token.text);
            if !lexeme.space.is_empty() {
                spaces.insert(node.id(), lexeme.space.clone());
            }
            tokens.push(node);
            space_before.push(lexeme.space);
        }
        Self {
            tokens,
            space_before,
            spaces,
            pos: 0,
            closers: Vec::new(),
        }
    }

    fn sym_at(&self, pos: usize) -> Sym {
        self.tokens
            .get(pos)
            .and_then(|t| t.as_token())
            .map_or(Sym::End, |t| t.sym)
    }

    fn peek(&self) -> Sym {
        self.sym_at(self.pos)
    }

    fn spaced(&self, pos: usize) -> bool {
        self.space_before.get(pos).is_some_and(|s| !s.is_empty())
    }

    fn newline_before(&self, pos: usize) -> bool {
        self.space_before.get(pos).is_some_and(|s| s.contains('\n'))
    }

    fn bump(&mut self) -> Arc<Node> {
        let token = Arc::clone(&self.tokens[self.pos]);
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, sym: Sym) -> Option<Arc<Node>> {
        (self.peek() == sym).then(|| self.bump())
    }

    fn at_terminator(&self) -> bool {
        let sym = self.peek();
        sym == Sym::End || self.closers.contains(&sym)
    }

    fn program(&mut self) -> Arc<Node> {
        let statements = self.sequence(|parser| parser.statement());
        let block = Node::branch(
            NodeKind::Block,
            vec![Slot::One(None), Slot::Many(statements), Slot::One(None)],
        );
        // Stray closers at the top level were already collected as unparsable
        let end = self.bump();
        Node::branch(
            NodeKind::Program,
            vec![Slot::One(Some(block)), Slot::One(Some(end))],
        )
    }

    /// Parse items until a terminator, collecting anything unparsable
    fn sequence(&mut self, item: impl Fn(&mut Self) -> Option<Arc<Node>>) -> Vec<Arc<Node>> {
        let mut items = Vec::new();
        while !self.at_terminator() {
            if let Some(node) = item(self) {
                items.push(node);
                continue;
            }
            let mut junk = vec![self.bump()];
            while !self.at_terminator() && !can_start_expression(self.peek()) {
                junk.push(self.bump());
            }
            items.push(Node::branch(NodeKind::Unparsable, vec![Slot::Many(junk)]));
        }
        items
    }

    /// Open a delimited construct, parse its items and consume its closer
    fn delimited(
        &mut self,
        close: Sym,
        item: impl Fn(&mut Self) -> Option<Arc<Node>>,
    ) -> (Vec<Arc<Node>>, Option<Arc<Node>>) {
        self.closers.push(close);
        let items = self.sequence(item);
        self.closers.pop();
        let closer = self.eat(close);
        (items, closer)
    }

    fn statement(&mut self) -> Option<Arc<Node>> {
        if self.is_bind_ahead() {
            Some(self.bind())
        } else {
            self.expression()
        }
    }

    fn is_name_sym(sym: Sym) -> bool {
        matches!(sym, Sym::Name | Sym::Operator)
    }

    /// `name (/lang)? (, name (/lang)?)* :`
    fn is_bind_ahead(&self) -> bool {
        let mut pos = self.pos;
        loop {
            if !Self::is_name_sym(self.sym_at(pos)) {
                return false;
            }
            pos += 1;
            if self.sym_at(pos) == Sym::Language {
                pos += 1;
                if self.sym_at(pos) == Sym::Name {
                    pos += 1;
                }
            }
            match self.sym_at(pos) {
                Sym::Comma => pos += 1,
                Sym::Bind => return true,
                _ => return false,
            }
        }
    }

    fn names(&mut self) -> Arc<Node> {
        let mut names = Vec::new();
        loop {
            let separator = if names.is_empty() {
                None
            } else if self.peek() == Sym::Comma && Self::is_name_sym(self.sym_at(self.pos + 1)) {
                Some(self.bump())
            } else {
                break;
            };
            if !Self::is_name_sym(self.peek()) {
                break;
            }
            let name = self.bump();
            let language = self.eat(Sym::Language).map(|slash| {
                let tag = self.eat(Sym::Name);
                Node::branch(
                    NodeKind::Language,
                    vec![Slot::One(Some(slash)), Slot::One(tag)],
                )
            });
            names.push(Node::branch(
                NodeKind::Name,
                vec![
                    Slot::One(separator),
                    Slot::One(Some(name)),
                    Slot::One(language),
                ],
            ));
        }
        Node::branch(NodeKind::Names, vec![Slot::Many(names)])
    }

    fn bind(&mut self) -> Arc<Node> {
        let names = self.names();
        let colon = self.eat(Sym::Bind);
        let value = if colon.is_some() {
            self.expression()
        } else {
            None
        };
        Node::branch(
            NodeKind::Bind,
            vec![Slot::One(Some(names)), Slot::One(colon), Slot::One(value)],
        )
    }

    fn expression(&mut self) -> Option<Arc<Node>> {
        let mut left = self.postfix()?;
        while self.peek() == Sym::Operator && can_start_expression(self.sym_at(self.pos + 1)) {
            let operator = self.bump();
            let Some(right) = self.postfix() else {
                break;
            };
            left = Node::branch(
                NodeKind::BinaryEvaluate,
                vec![
                    Slot::One(Some(left)),
                    Slot::One(Some(operator)),
                    Slot::One(Some(right)),
                ],
            );
        }
        if self.peek() == Sym::Conditional && can_start_expression(self.sym_at(self.pos + 1)) {
            let question = self.bump();
            let yes = self.expression();
            let no = if can_start_expression(self.peek()) {
                self.expression()
            } else {
                None
            };
            left = Node::branch(
                NodeKind::Conditional,
                vec![
                    Slot::One(Some(left)),
                    Slot::One(Some(question)),
                    Slot::One(yes),
                    Slot::One(no),
                ],
            );
        }
        Some(left)
    }

    fn postfix(&mut self) -> Option<Arc<Node>> {
        let mut fun = self.atom()?;
        while self.peek() == Sym::EvalOpen && !self.spaced(self.pos) {
            let open = self.bump();
            let (inputs, close) = self.delimited(Sym::EvalClose, |p| p.expression());
            fun = Node::branch(
                NodeKind::Evaluate,
                vec![
                    Slot::One(Some(fun)),
                    Slot::One(Some(open)),
                    Slot::Many(inputs),
                    Slot::One(close),
                ],
            );
        }
        Some(fun)
    }

    fn leaf(&mut self, kind: NodeKind) -> Arc<Node> {
        let token = self.bump();
        Node::branch(kind, vec![Slot::One(Some(token))])
    }

    fn atom(&mut self) -> Option<Arc<Node>> {
        let node = match self.peek() {
            Sym::Number => self.leaf(NodeKind::NumberLiteral),
            Sym::Text => self.leaf(NodeKind::TextLiteral),
            Sym::Boolean => self.leaf(NodeKind::BooleanLiteral),
            Sym::None => self.leaf(NodeKind::NoneLiteral),
            Sym::Placeholder => self.leaf(NodeKind::Placeholder),
            Sym::Name => self.leaf(NodeKind::Reference),
            Sym::Operator => {
                let next = self.sym_at(self.pos + 1);
                if !self.spaced(self.pos + 1)
                    && next != Sym::Operator
                    && can_start_expression(next)
                {
                    let operator = self.bump();
                    let operand = self.postfix()?;
                    Node::branch(
                        NodeKind::UnaryEvaluate,
                        vec![Slot::One(Some(operator)), Slot::One(Some(operand))],
                    )
                } else {
                    self.leaf(NodeKind::Reference)
                }
            }
            Sym::EvalOpen => {
                let open = self.bump();
                let (statements, close) = self.delimited(Sym::EvalClose, |p| p.statement());
                Node::branch(
                    NodeKind::Block,
                    vec![
                        Slot::One(Some(open)),
                        Slot::Many(statements),
                        Slot::One(close),
                    ],
                )
            }
            Sym::ListOpen => self.collection(NodeKind::ListLiteral, Sym::ListClose),
            Sym::SetOpen => self.collection(NodeKind::SetLiteral, Sym::SetClose),
            Sym::Function => self.function(),
            _ => return None,
        };
        Some(node)
    }

    fn collection(&mut self, kind: NodeKind, close: Sym) -> Arc<Node> {
        let open = self.bump();
        let (values, close) = self.delimited(close, |p| p.expression());
        Node::branch(
            kind,
            vec![Slot::One(Some(open)), Slot::Many(values), Slot::One(close)],
        )
    }

    fn function(&mut self) -> Arc<Node> {
        let fun = self.bump();
        let names = Self::is_name_sym(self.peek()).then(|| self.names());
        let open = self.eat(Sym::EvalOpen);
        let mut inputs = Vec::new();
        let mut close = None;
        if open.is_some() {
            self.closers.push(Sym::EvalClose);
            while Self::is_name_sym(self.peek()) {
                inputs.push(self.bind());
            }
            self.closers.pop();
            close = self.eat(Sym::EvalClose);
        }
        // The body must start on the same line as the header
        let body = if can_start_expression(self.peek()) && !self.newline_before(self.pos) {
            self.expression()
        } else {
            None
        };
        Node::branch(
            NodeKind::FunctionDefinition,
            vec![
                Slot::One(Some(fun)),
                Slot::One(names),
                Slot::One(open),
                Slot::Many(inputs),
                Slot::One(close),
                Slot::One(body),
            ],
        )
    }
}
