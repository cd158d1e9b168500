//! Concrete syntax tree produced by the parser.
//!
//! Every lexed token ends up in the tree: tokens removed by recovery ride
//! along as `invalid_leading` on the next kept token, and tokens inserted by
//! recovery appear as zero-width `missing` tokens. Diagnostics live on the
//! tokens they describe and are collected in source order.

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::Diagnostic;
use crate::token::{SyntaxKind, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    CompUnit,
    ImportDecl,
    FunctionDefinition,
    ParamList,
    Parameter,
    ReturnTypeDescriptor,
    TypeDefinition,
    RecordTypeDescriptor,
    RecordField,
    ObjectTypeDescriptor,
    ObjectField,
    MethodDeclaration,
    BuiltinType,
    TypeReference,
    OptionalType,
    ConstDecl,
    VarDecl,
    Block,
    IfStmt,
    ElseClause,
    WhileStmt,
    ReturnStmt,
    BreakStmt,
    ContinueStmt,
    MatchStmt,
    MatchClause,
    ForeachStmt,
    LockStmt,
    WorkerDecl,
    ForkStmt,
    SendStmt,
    AssignmentStmt,
    CallStmt,
    ArgList,
    BinaryExpr,
    UnaryExpr,
    BracedExpr,
    FieldAccess,
    CallExpr,
    NameRef,
    Literal,
    ListConstructor,
    MappingConstructor,
    MappingField,
    NewExpr,
    QueryExpr,
    FromClause,
    WhereClause,
    LetClause,
    SelectClause,
    ReceiveExpr,
    WaitExpr,
    TemplateExpr,
    Interpolation,
    // Match patterns
    NamePattern,
    ConstPattern,
    BindingPattern,
    ListPattern,
    MappingPattern,
    FieldPattern,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "element", rename_all = "lowercase")]
pub enum SyntaxElement {
    Node(SyntaxNode),
    Token(Token),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub children: Vec<SyntaxElement>,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind) -> Self {
        SyntaxNode {
            kind,
            children: Vec::new(),
        }
    }

    /// A node wrapping a single token.
    pub fn leaf(kind: NodeKind, token: Token) -> Self {
        SyntaxNode {
            kind,
            children: vec![SyntaxElement::Token(token)],
        }
    }

    pub fn push_token(&mut self, token: Token) {
        self.children.push(SyntaxElement::Token(token));
    }

    pub fn push_node(&mut self, node: SyntaxNode) {
        self.children.push(SyntaxElement::Node(node));
    }

    /// Insert elements before the existing children.
    pub fn prepend(&mut self, elements: Vec<SyntaxElement>) {
        self.children.splice(0..0, elements);
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = &SyntaxNode> + '_ {
        self.children.iter().filter_map(|c| match c {
            SyntaxElement::Node(n) => Some(n),
            SyntaxElement::Token(_) => None,
        })
    }

    /// Tokens in source order, excluding removed tokens.
    pub fn tokens(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens<'t>(&'t self, out: &mut Vec<&'t Token>) {
        for child in &self.children {
            match child {
                SyntaxElement::Token(t) => out.push(t),
                SyntaxElement::Node(n) => n.collect_tokens(out),
            }
        }
    }

    /// First node of `kind` in depth-first order, including `self`.
    pub fn find(&self, kind: NodeKind) -> Option<&SyntaxNode> {
        if self.kind == kind {
            return Some(self);
        }
        self.child_nodes().find_map(|n| n.find(kind))
    }

    pub fn count(&self, kind: NodeKind) -> usize {
        let own = usize::from(self.kind == kind);
        own + self.child_nodes().map(|n| n.count(kind)).sum::<usize>()
    }

    /// All diagnostics, removed tokens before the token they precede.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for token in self.tokens() {
            for invalid in &token.invalid_leading {
                out.extend(invalid.diagnostics.iter().cloned());
            }
            out.extend(token.diagnostics.iter().cloned());
        }
        out
    }

    /// Source text of the kept tokens, separated by single spaces.
    pub fn text(&self) -> String {
        self.tokens()
            .into_iter()
            .filter(|t| !t.missing && t.kind != SyntaxKind::Eof)
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Indented outline, one element per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, indent: usize) {
        let _ = writeln!(out, "{:indent$}{:?}", "", self.kind, indent = indent);
        for child in &self.children {
            match child {
                SyntaxElement::Node(n) => n.dump_into(out, indent + 2),
                SyntaxElement::Token(t) => {
                    for invalid in &t.invalid_leading {
                        let _ = writeln!(
                            out,
                            "{:indent$}invalid {:?} {:?}",
                            "",
                            invalid.kind,
                            invalid.text,
                            indent = indent + 2
                        );
                    }
                    if t.missing {
                        let _ = writeln!(out, "{:indent$}missing {:?}", "", t.kind, indent = indent + 2);
                    } else {
                        let _ = writeln!(out, "{:indent$}{:?} {:?}", "", t.kind, t.text, indent = indent + 2);
                    }
                }
            }
        }
    }
}
