//! Arena-backed concrete syntax tree.
//!
//! Nodes live in a flat vector and refer to their children by index, so the
//! tree has no pointer cycles and is cheap to hand to another thread. The
//! parser builds it through [`TreeBuilder`] with a stack of open markers.

use std::fmt::Write as _;

use serde::Serialize;

use crate::kinds::{NodeKind, TokenKind};
use crate::lexer::{LexState, TextRange, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TokenId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TokenId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    Token(TokenId),
    Node(NodeId),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    range: TextRange,
    parent: Option<NodeId>,
    children: Vec<Child>,
}

/// An immutable syntax tree plus the text it was built from.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    text: String,
    tokens: Vec<Token>,
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn root(&self) -> NodeRef<'_> {
        self.node(self.root)
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    pub fn token(&self, id: TokenId) -> TokenRef<'_> {
        TokenRef { tree: self, id }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// All tokens, trivia included, in source order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Concatenation of every leaf in tree order. Equal to the input text.
    pub fn leaf_text(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        for tok in self.root().leaf_tokens() {
            out.push_str(tok.text());
        }
        out
    }

    /// Indented `Kind@start..end` rendering, one element per line.
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        dump_node(self.root(), &mut out);
        out
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        node_json(self.root())
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

fn dump_node(root: NodeRef<'_>, out: &mut String) {
    let mut stack = vec![(Element::Node(root), 0usize)];
    while let Some((element, depth)) = stack.pop() {
        let indent = depth * 2;
        match element {
            Element::Node(n) => {
                let _ = writeln!(out, "{:indent$}{:?}@{}", "", n.kind(), n.range());
                let children: Vec<_> = n.children().collect();
                stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
            }
            Element::Token(t) => {
                let _ = writeln!(out, "{:indent$}{:?}@{} {:?}", "", t.kind(), t.range(), t.text());
            }
        }
    }
}

/// A node whose children are still being converted.
struct JsonFrame<'t> {
    node: NodeRef<'t>,
    pending: std::vec::IntoIter<Element<'t>>,
    done: Vec<serde_json::Value>,
}

impl<'t> JsonFrame<'t> {
    fn new(node: NodeRef<'t>) -> Self {
        let children: Vec<_> = node.children().collect();
        JsonFrame {
            node,
            pending: children.into_iter(),
            done: Vec::new(),
        }
    }

    fn into_json(self) -> serde_json::Value {
        serde_json::json!({
            "node":     self.node.kind(),
            "range":    [self.node.range().start, self.node.range().end],
            "children": self.done,
        })
    }
}

fn token_json(t: TokenRef<'_>) -> serde_json::Value {
    serde_json::json!({
        "token": t.kind(),
        "range": [t.range().start, t.range().end],
        "text":  t.text(),
    })
}

fn node_json(root: NodeRef<'_>) -> serde_json::Value {
    let mut stack = vec![JsonFrame::new(root)];
    loop {
        let next = match stack.last_mut() {
            Some(frame) => frame.pending.next(),
            None => return serde_json::Value::Null,
        };
        match next {
            Some(Element::Token(t)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.done.push(token_json(t));
                }
            }
            Some(Element::Node(n)) => stack.push(JsonFrame::new(n)),
            None => {
                let value = match stack.pop() {
                    Some(frame) => frame.into_json(),
                    None => return serde_json::Value::Null,
                };
                match stack.last_mut() {
                    Some(parent) => parent.done.push(value),
                    None => return value,
                }
            }
        }
    }
}

// ──────────────────────────────────────────────
// Navigation
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

#[derive(Debug, Clone, Copy)]
pub struct TokenRef<'t> {
    tree: &'t SyntaxTree,
    id: TokenId,
}

#[derive(Debug, Clone, Copy)]
pub enum Element<'t> {
    Node(NodeRef<'t>),
    Token(TokenRef<'t>),
}

impl<'t> Element<'t> {
    pub fn range(self) -> TextRange {
        match self {
            Element::Node(n) => n.range(),
            Element::Token(t) => t.range(),
        }
    }

    pub fn as_node(self) -> Option<NodeRef<'t>> {
        match self {
            Element::Node(n) => Some(n),
            Element::Token(_) => None,
        }
    }

    pub fn as_token(self) -> Option<TokenRef<'t>> {
        match self {
            Element::Token(t) => Some(t),
            Element::Node(_) => None,
        }
    }
}

impl<'t> NodeRef<'t> {
    pub fn id(self) -> NodeId {
        self.id
    }

    pub fn tree(self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(self) -> NodeKind {
        self.tree.data(self.id).kind
    }

    pub fn range(self) -> TextRange {
        self.tree.data(self.id).range
    }

    pub fn text(self) -> &'t str {
        self.range().slice(&self.tree.text)
    }

    pub fn parent(self) -> Option<NodeRef<'t>> {
        self.tree.data(self.id).parent.map(|id| self.tree.node(id))
    }

    pub fn children(self) -> impl Iterator<Item = Element<'t>> + 't {
        let tree = self.tree;
        tree.data(self.id).children.iter().map(move |c| match *c {
            Child::Token(id) => Element::Token(tree.token(id)),
            Child::Node(id) => Element::Node(tree.node(id)),
        })
    }

    pub fn child_nodes(self) -> impl Iterator<Item = NodeRef<'t>> + 't {
        self.children().filter_map(Element::as_node)
    }

    /// Direct child tokens, trivia excluded.
    pub fn child_tokens(self) -> impl Iterator<Item = TokenRef<'t>> + 't {
        self.children()
            .filter_map(Element::as_token)
            .filter(|t| !t.kind().is_trivia())
    }

    pub fn first_child(self, kind: NodeKind) -> Option<NodeRef<'t>> {
        self.child_nodes().find(|n| n.kind() == kind)
    }

    pub fn first_token(self, kind: TokenKind) -> Option<TokenRef<'t>> {
        self.child_tokens().find(|t| t.kind() == kind)
    }

    /// This node and all nodes below it, pre-order.
    pub fn descendants(self) -> Vec<NodeRef<'t>> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(n) = stack.pop() {
            out.push(n);
            let mut kids: Vec<_> = n.child_nodes().collect();
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    /// Every token below this node, trivia included, in source order.
    pub fn leaf_tokens(self) -> Vec<TokenRef<'t>> {
        let mut out = Vec::new();
        let mut stack = vec![Element::Node(self)];
        while let Some(e) = stack.pop() {
            match e {
                Element::Token(t) => out.push(t),
                Element::Node(n) => {
                    let mut kids: Vec<_> = n.children().collect();
                    kids.reverse();
                    stack.extend(kids);
                }
            }
        }
        out
    }
}

impl<'t> TokenRef<'t> {
    pub fn id(self) -> TokenId {
        self.id
    }

    fn data(self) -> &'t Token {
        &self.tree.tokens[self.id.index()]
    }

    pub fn kind(self) -> TokenKind {
        self.data().kind
    }

    pub fn range(self) -> TextRange {
        self.data().range
    }

    pub fn state(self) -> LexState {
        self.data().state
    }

    pub fn text(self) -> &'t str {
        self.range().slice(&self.tree.text)
    }
}

// ──────────────────────────────────────────────
// Builder
// ──────────────────────────────────────────────

/// Handle for a node whose kind is not known yet. Must be completed or
/// abandoned, innermost first.
#[must_use = "markers must be completed or abandoned"]
#[derive(Debug)]
pub(crate) struct Marker {
    depth: usize,
}

struct Frame {
    start: usize,
    children: Vec<Child>,
}

pub(crate) struct TreeBuilder {
    tokens: Vec<Token>,
    nodes: Vec<NodeData>,
    base: Vec<Child>,
    stack: Vec<Frame>,
    offset: usize,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        TreeBuilder {
            tokens: Vec::new(),
            nodes: Vec::new(),
            base: Vec::new(),
            stack: Vec::new(),
            offset: 0,
        }
    }

    pub(crate) fn open(&mut self) -> Marker {
        self.stack.push(Frame {
            start: self.offset,
            children: Vec::new(),
        });
        Marker {
            depth: self.stack.len() - 1,
        }
    }

    pub(crate) fn token(&mut self, token: Token) -> TokenId {
        let id = TokenId(self.tokens.len() as u32);
        self.offset = token.range.end;
        self.tokens.push(token);
        self.top().push(Child::Token(id));
        id
    }

    pub(crate) fn complete(&mut self, m: Marker, kind: NodeKind) -> NodeId {
        let frame = self.pop(m);
        let range = match (frame.children.first(), frame.children.last()) {
            (Some(first), Some(last)) => {
                TextRange::new(self.child_range(*first).start, self.child_range(*last).end)
            }
            _ => TextRange::empty(frame.start),
        };
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            range,
            parent: None,
            children: frame.children,
        });
        self.top().push(Child::Node(id));
        id
    }

    /// Drop the marker, handing its children to the enclosing node.
    pub(crate) fn abandon(&mut self, m: Marker) {
        let frame = self.pop(m);
        self.top().extend(frame.children);
    }

    /// Open a marker that will wrap the just-completed `node`.
    pub(crate) fn precede(&mut self, node: NodeId) -> Marker {
        let last = self.top().pop();
        assert_eq!(
            last,
            Some(Child::Node(node)),
            "only the most recent child can be wrapped"
        );
        let start = self.nodes[node.index()].range.start;
        self.stack.push(Frame {
            start,
            children: vec![Child::Node(node)],
        });
        Marker {
            depth: self.stack.len() - 1,
        }
    }

    pub(crate) fn node_range(&self, id: NodeId) -> TextRange {
        self.nodes[id.index()].range
    }

    pub(crate) fn finish(mut self, text: &str) -> SyntaxTree {
        assert!(self.stack.is_empty(), "unclosed markers at end of parse");
        let root = match self.base.as_slice() {
            [Child::Node(id)] => *id,
            _ => panic!("parse must produce exactly one root node"),
        };
        for i in 0..self.nodes.len() {
            let parent = NodeId(i as u32);
            let kids: Vec<NodeId> = self.nodes[i]
                .children
                .iter()
                .filter_map(|c| match c {
                    Child::Node(id) => Some(*id),
                    Child::Token(_) => None,
                })
                .collect();
            for kid in kids {
                self.nodes[kid.index()].parent = Some(parent);
            }
        }
        SyntaxTree {
            text: text.to_owned(),
            tokens: self.tokens,
            nodes: self.nodes,
            root,
        }
    }

    fn pop(&mut self, m: Marker) -> Frame {
        assert_eq!(
            m.depth + 1,
            self.stack.len(),
            "markers must close innermost first"
        );
        match self.stack.pop() {
            Some(frame) => frame,
            None => unreachable!("marker without an open frame"),
        }
    }

    fn top(&mut self) -> &mut Vec<Child> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.base,
        }
    }

    fn child_range(&self, child: Child) -> TextRange {
        match child {
            Child::Token(id) => self.tokens[id.index()].range,
            Child::Node(id) => self.nodes[id.index()].range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, start: usize, end: usize) -> Token {
        Token {
            kind,
            range: TextRange::new(start, end),
            state: LexState::Arguments(crate::lexer::ArgRegion::Operands),
        }
    }

    #[test]
    fn complete_covers_children() {
        let mut b = TreeBuilder::new();
        let root = b.open();
        let m = b.open();
        b.token(tok(TokenKind::Ident, 0, 3));
        b.token(tok(TokenKind::Plus, 3, 4));
        let n = b.complete(m, NodeKind::BinaryExpr);
        assert_eq!(b.node_range(n), TextRange::new(0, 4));
        b.complete(root, NodeKind::Root);
        let tree = b.finish("abc+");
        assert_eq!(tree.root().kind(), NodeKind::Root);
        assert_eq!(tree.root().range(), TextRange::new(0, 4));
        let child = tree.root().child_nodes().next().unwrap();
        assert_eq!(child.text(), "abc+");
        assert_eq!(child.parent().unwrap().id(), tree.root().id());
    }

    #[test]
    fn precede_wraps_previous_node() {
        let mut b = TreeBuilder::new();
        let root = b.open();
        let m = b.open();
        b.token(tok(TokenKind::Int, 0, 1));
        let lhs = b.complete(m, NodeKind::IntLiteral);
        let wrap = b.precede(lhs);
        b.token(tok(TokenKind::Plus, 1, 2));
        b.complete(wrap, NodeKind::BinaryExpr);
        b.complete(root, NodeKind::Root);
        let tree = b.finish("1+");
        let bin = tree.root().first_child(NodeKind::BinaryExpr).unwrap();
        assert_eq!(bin.range(), TextRange::new(0, 2));
        assert!(bin.first_child(NodeKind::IntLiteral).is_some());
    }

    #[test]
    fn dump_walks_deep_trees_in_order() {
        let depth = 2_000;
        let text = format!("1{}", "+1".repeat(depth));
        let mut b = TreeBuilder::new();
        let root = b.open();
        let m = b.open();
        b.token(tok(TokenKind::Int, 0, 1));
        let mut lhs = b.complete(m, NodeKind::IntLiteral);
        for i in 0..depth {
            let wrap = b.precede(lhs);
            let at = 1 + 2 * i;
            b.token(tok(TokenKind::Plus, at, at + 1));
            let m = b.open();
            b.token(tok(TokenKind::Int, at + 1, at + 2));
            b.complete(m, NodeKind::IntLiteral);
            lhs = b.complete(wrap, NodeKind::BinaryExpr);
        }
        b.complete(root, NodeKind::Root);
        let tree = b.finish(&text);
        let dump = tree.debug_dump();
        assert_eq!(dump.lines().count(), 4 * depth + 3);
        let innermost = format!("{}Int@0..1 \"1\"", " ".repeat((depth + 2) * 2));
        assert_eq!(dump.lines().nth(depth + 2), Some(innermost.as_str()));
        assert_eq!(tree.leaf_text(), text);
    }

    #[test]
    fn abandon_splices_children_into_parent() {
        let mut b = TreeBuilder::new();
        let root = b.open();
        let m = b.open();
        b.token(tok(TokenKind::Ident, 0, 1));
        b.abandon(m);
        b.complete(root, NodeKind::Root);
        let tree = b.finish("a");
        assert_eq!(tree.root().child_tokens().count(), 1);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn empty_node_sits_at_open_position() {
        let mut b = TreeBuilder::new();
        let root = b.open();
        b.token(tok(TokenKind::Ident, 0, 2));
        let m = b.open();
        let e = b.complete(m, NodeKind::Error);
        assert_eq!(b.node_range(e), TextRange::empty(2));
        b.complete(root, NodeKind::Root);
    }

    #[test]
    #[should_panic(expected = "innermost first")]
    fn closing_out_of_order_panics() {
        let mut b = TreeBuilder::new();
        let outer = b.open();
        let _inner = b.open();
        b.complete(outer, NodeKind::Root);
    }
}
