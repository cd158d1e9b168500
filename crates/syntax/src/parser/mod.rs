/// Recursive-descent parser driven by the recovery engine.
///
/// Each production keeps its grammar context on the handler's stack for as
/// long as it is being parsed, the same way `grammar::next_rule` pushes and
/// pops, so a search started at any mismatch sees the productions that
/// enclose it. Parsing never fails on bad input: mismatches become missing
/// or invalid tokens in the tree. Only a lex error or a failure of the
/// recovery engine itself aborts.
use log::{debug, warn};

use crate::context::GrammarContext as Ctx;
use crate::error::{Diagnostic, SyntaxError};
use crate::grammar::terminals::accepts_token;
use crate::grammar::{alternatives, classify, expected_token_kind, ContextClass};
use crate::lexer::lex;
use crate::reader::{BufferedTokenReader, TokenReader};
use crate::recovery::{Action, ErrorHandler, RecoveryConfig, Solution};
use crate::token::{SyntaxKind, Token};
use crate::tree::SyntaxNode;

mod expressions;
mod module;
mod statements;
mod types;

/// A parsed compilation unit and every diagnostic recovery produced.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub tree: SyntaxNode,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

pub fn parse(src: &str) -> Result<ParseOutput, SyntaxError> {
    parse_with_config(src, RecoveryConfig::default())
}

pub fn parse_with_config(src: &str, config: RecoveryConfig) -> Result<ParseOutput, SyntaxError> {
    let tokens = lex(src)?;
    parse_tokens(tokens, config)
}

/// Parse an already lexed token stream.
pub fn parse_tokens(tokens: Vec<Token>, config: RecoveryConfig) -> Result<ParseOutput, SyntaxError> {
    let reader = BufferedTokenReader::new(tokens);
    let mut parser = Parser::new(ErrorHandler::new(reader, config));
    let tree = parser.parse_comp_unit()?;
    let diagnostics = tree.diagnostics();
    debug!("parsed compilation unit with {} diagnostics", diagnostics.len());
    Ok(ParseOutput { tree, diagnostics })
}

// ──────────────────────────────────────────────
// Token classes used at branch points
// ──────────────────────────────────────────────

fn starts_type(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Identifier | SyntaxKind::RecordKeyword | SyntaxKind::ObjectKeyword
    ) || kind.is_builtin_type()
}

fn starts_expression(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Identifier
            | SyntaxKind::OpenParen
            | SyntaxKind::OpenBracket
            | SyntaxKind::OpenBrace
            | SyntaxKind::NewKeyword
            | SyntaxKind::FromKeyword
            | SyntaxKind::LeftArrow
            | SyntaxKind::WaitKeyword
            | SyntaxKind::StringKeyword
    ) || kind.is_literal()
        || kind.is_unary_operator()
}

fn starts_match_pattern(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Identifier
            | SyntaxKind::VarKeyword
            | SyntaxKind::OpenBracket
            | SyntaxKind::OpenBrace
    ) || kind.is_literal()
}

fn starts_top_level_construct(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::FunctionKeyword
            | SyntaxKind::TypeKeyword
            | SyntaxKind::ConstKeyword
            | SyntaxKind::VarKeyword
    ) || starts_type(kind)
}

fn can_start_statement(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::VarKeyword
            | SyntaxKind::IfKeyword
            | SyntaxKind::WhileKeyword
            | SyntaxKind::ReturnKeyword
            | SyntaxKind::BreakKeyword
            | SyntaxKind::ContinueKeyword
            | SyntaxKind::MatchKeyword
            | SyntaxKind::ForeachKeyword
            | SyntaxKind::LockKeyword
            | SyntaxKind::WorkerKeyword
            | SyntaxKind::ForkKeyword
            | SyntaxKind::OpenBrace
    ) || starts_type(kind)
}

/// Productions whose body is closed by `}`.
const BRACED: &[Ctx] = &[
    Ctx::Block,
    Ctx::RecordTypeDesc,
    Ctx::ObjectTypeDesc,
    Ctx::MappingConstructor,
    Ctx::MatchStmt,
    Ctx::MappingMatchPattern,
    Ctx::ForkStmt,
    Ctx::Interpolation,
];

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

/// Outcome of a branch point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    /// Continue as if the next token were of this kind.
    Kind(SyntaxKind),
    /// Continue into this production or nested branch point.
    Path(Ctx),
}

struct Parser {
    handler: ErrorHandler<BufferedTokenReader>,
    /// Tokens removed by recovery, waiting for the next kept token.
    pending_invalid: Vec<Token>,
    /// Missing token synthesised by the last INSERT, not yet consumed.
    inserted: Option<Token>,
}

impl Parser {
    fn new(handler: ErrorHandler<BufferedTokenReader>) -> Self {
        Parser {
            handler,
            pending_invalid: Vec::new(),
            inserted: None,
        }
    }

    fn peek_token(&self) -> &Token {
        match self.inserted {
            Some(ref token) => token,
            None => self.handler.reader().peek(),
        }
    }

    fn peek_kind(&self) -> SyntaxKind {
        self.peek_token().kind
    }

    /// Take the next token, attaching any tokens removed before it.
    fn bump(&mut self) -> Token {
        let mut token = match self.inserted.take() {
            Some(token) => token,
            None => self.handler.reader_mut().read(),
        };
        if !self.pending_invalid.is_empty() {
            token.invalid_leading.append(&mut self.pending_invalid);
        }
        token
    }

    fn start(&mut self, ctx: Ctx) {
        self.handler.start_context(ctx);
    }

    fn end(&mut self) -> Result<(), SyntaxError> {
        self.handler.end_context()?;
        Ok(())
    }

    fn switch(&mut self, ctx: Ctx) -> Result<(), SyntaxError> {
        self.handler.switch_context(ctx)?;
        Ok(())
    }

    /// Run recovery at `ctx` and record its effect on the token stream.
    fn recover(&mut self, ctx: Ctx) -> Result<Solution, SyntaxError> {
        self.inserted = None;
        let token = self.handler.reader().peek().clone();
        // A stray `}` is completed against only while a brace is open.
        let is_completion = token.kind == SyntaxKind::CloseBrace
            && BRACED.iter().any(|c| self.handler.has_ancestor_context(*c));
        let mut solution = self.handler.recover(ctx, &token, is_completion)?;
        match solution.action {
            Action::Remove => {
                if let Some(mut removed) = solution.removed_token.take() {
                    removed
                        .diagnostics
                        .push(Diagnostic::invalid(&removed.text, removed.line));
                    self.pending_invalid.push(removed);
                }
            }
            Action::Insert => self.inserted = solution.recovered_token.clone(),
            Action::Keep => {}
        }
        Ok(solution)
    }

    /// Consume the token `ctx` expects, recovering until one is available.
    fn expect(&mut self, ctx: Ctx) -> Result<Token, SyntaxError> {
        loop {
            if accepts_token(ctx, self.peek_token()) {
                return Ok(self.bump());
            }
            let solution = self.recover(ctx)?;
            if solution.action != Action::Remove {
                return Ok(self.bump());
            }
        }
    }

    /// Resolve the branch point `ctx`. Tokens `accept` approves are taken
    /// as they are; anything else goes through recovery.
    fn decide(&mut self, ctx: Ctx, accept: impl Fn(SyntaxKind) -> bool) -> Result<Choice, SyntaxError> {
        loop {
            let kind = self.peek_kind();
            if accept(kind) {
                return Ok(Choice::Kind(kind));
            }
            let solution = self.recover(ctx)?;
            match solution.action {
                Action::Remove => continue,
                Action::Insert => return Ok(Choice::Kind(solution.resolved_kind)),
                Action::Keep => return Ok(self.steer(ctx, solution.ctx)),
            }
        }
    }

    /// Map a KEEP onto the branch: a path of `branch` is followed directly,
    /// anything deeper is dispatched on the token as it stands.
    fn steer(&self, branch: Ctx, target: Ctx) -> Choice {
        let is_path = alternatives(branch).map_or(false, |paths| paths.contains(&target));
        if !is_path {
            return Choice::Kind(self.peek_kind());
        }
        match classify(target) {
            Ok(ContextClass::Terminal(_)) | Ok(ContextClass::Keyword(_)) => {
                Choice::Kind(expected_token_kind(target))
            }
            _ => Choice::Path(target),
        }
    }

    /// Discard everything up to end of input as invalid.
    fn skip_trailing_input(&mut self) {
        self.inserted = None;
        while self.handler.reader().peek().kind != SyntaxKind::Eof {
            let mut token = self.handler.reader_mut().read();
            warn!("discarding '{}' after the last top-level node", token);
            token.diagnostics.push(Diagnostic::invalid(&token.text, token.line));
            self.pending_invalid.push(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DiagnosticCode, RecoveryError};
    use crate::tree::NodeKind;

    fn parse_ok(src: &str) -> ParseOutput {
        parse(src).unwrap_or_else(|e| panic!("parse failed: {}", e))
    }

    // ── Clean input

    #[test]
    fn clean_program_has_no_diagnostics() {
        let src = r#"
import org/module;
# Adds numbers.
public function add(int a, int b) returns int {
    int total = a + b;
    if total > 10 {
        return total;
    } else if total < 0 {
        return 0;
    } else {
        total = total * 2;
    }
    while total > 0 {
        total = total - 1;
        break;
    }
    print(total);
    return total;
}
type Point record { int x; int y; };
const LIMIT = 10;
string? name;
"#;
        let out = parse_ok(src);
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let tree = &out.tree;
        assert_eq!(tree.kind, NodeKind::CompUnit);
        assert_eq!(tree.count(NodeKind::FunctionDefinition), 1);
        assert_eq!(tree.count(NodeKind::IfStmt), 2);
        assert_eq!(tree.count(NodeKind::ElseClause), 2);
        assert_eq!(tree.count(NodeKind::RecordField), 2);
        assert_eq!(tree.count(NodeKind::OptionalType), 1);
        assert_eq!(tree.count(NodeKind::CallStmt), 1);
    }

    #[test]
    fn every_source_token_survives() {
        let src = "function f() { x = (1 + 2) * -y.z; g(1, h(2)); }";
        let out = parse_ok(src);
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert_eq!(out.tree.text(), "function f ( ) { x = ( 1 + 2 ) * - y . z ; g ( 1 , h ( 2 ) ) ; }");
    }

    #[test]
    fn binary_operators_respect_precedence() {
        let out = parse_ok("const C = 1 + 2 * 3;");
        let top = out.tree.find(NodeKind::BinaryExpr).unwrap();
        // The outer node is the addition; multiplication is its right operand.
        let ops: Vec<_> = top
            .children
            .iter()
            .filter_map(|c| match c {
                crate::tree::SyntaxElement::Token(t) => Some(t.kind),
                _ => None,
            })
            .collect();
        assert_eq!(ops, vec![SyntaxKind::Plus]);
        assert_eq!(top.count(NodeKind::BinaryExpr), 2);
    }

    #[test]
    fn identifier_statement_forms() {
        let out = parse_ok("function f() { a = 1; b(); Point p; Point? q = a; }");
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert_eq!(out.tree.count(NodeKind::AssignmentStmt), 1);
        assert_eq!(out.tree.count(NodeKind::CallStmt), 1);
        assert_eq!(out.tree.count(NodeKind::VarDecl), 2);
        assert_eq!(out.tree.count(NodeKind::OptionalType), 1);
    }

    #[test]
    fn clean_program_with_constructors_queries_and_workers() {
        let src = r#"
function main() {
    var xs = [1, 2, 3];
    var m = {a: 1, b: xs};
    Counter c = new Counter(1, m);
    var evens = from int x in xs where x % 2 == 0 let int y = x * 2 select y;
    string s = string `total ${m.a} of ${ {n: 1}.n } items`;
    match x { 0 | 1 => { return; } [var a, _] => { } {k: var v} => { } var other => { } }
    foreach var e in xs { lock { total = total + e; } }
    fork { worker w1 returns int { total -> w2; } worker w2 { var r = <- w1; } }
    var done = wait w1;
}
"#;
        let out = parse_ok(src);
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let tree = &out.tree;
        let expected = [
            (NodeKind::ListConstructor, 1),
            (NodeKind::MappingConstructor, 2),
            (NodeKind::NewExpr, 1),
            (NodeKind::QueryExpr, 1),
            (NodeKind::WhereClause, 1),
            (NodeKind::LetClause, 1),
            (NodeKind::SelectClause, 1),
            (NodeKind::TemplateExpr, 1),
            (NodeKind::Interpolation, 2),
            (NodeKind::MatchClause, 4),
            (NodeKind::ConstPattern, 2),
            (NodeKind::NamePattern, 1),
            (NodeKind::BindingPattern, 3),
            (NodeKind::ListPattern, 1),
            (NodeKind::MappingPattern, 1),
            (NodeKind::FieldPattern, 1),
            (NodeKind::ForeachStmt, 1),
            (NodeKind::LockStmt, 1),
            (NodeKind::WorkerDecl, 2),
            (NodeKind::SendStmt, 1),
            (NodeKind::ReceiveExpr, 1),
            (NodeKind::WaitExpr, 1),
        ];
        for (kind, count) in expected {
            assert_eq!(tree.count(kind), count, "{:?}", kind);
        }
    }

    // ── Recovery

    #[test]
    fn missing_close_paren_is_inserted() {
        let out = parse_ok("function foo(int a {}");
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].code, DiagnosticCode::MissingToken);
        assert_eq!(out.diagnostics[0].message, "missing ')'");
        let params = out.tree.find(NodeKind::ParamList).unwrap();
        let close = params.tokens().into_iter().last().unwrap();
        assert!(close.missing);
        assert_eq!(close.kind, SyntaxKind::CloseParen);
        assert_eq!(out.tree.count(NodeKind::Block), 1);
    }

    #[test]
    fn duplicate_comma_is_removed_from_parameters() {
        let out = parse_ok("function f(int a, , int b) {}");
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].code, DiagnosticCode::InvalidToken);
        assert_eq!(out.diagnostics[0].message, "invalid token ','");
        assert_eq!(out.tree.count(NodeKind::Parameter), 2);
    }

    #[test]
    fn unclosed_block_is_closed_at_end_of_input() {
        let out = parse_ok("function foo() {\n    int x = 1;\n");
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].message, "missing '}'");
        assert_eq!(out.diagnostics[0].line, 3);
    }

    #[test]
    fn stray_token_before_return_type_is_removed() {
        let out = parse_ok("function foo() x returns int {}");
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].message, "invalid token 'x'");
        let func = out.tree.find(NodeKind::FunctionDefinition).unwrap();
        assert!(func.find(NodeKind::ReturnTypeDescriptor).is_some());
    }

    #[test]
    fn truncated_input_is_completed_without_error() {
        let out = parse_ok("public");
        assert!(out.has_errors());
        assert!(out
            .diagnostics
            .iter()
            .all(|d| d.code == DiagnosticCode::MissingToken));
        assert_eq!(out.tree.count(NodeKind::FunctionDefinition), 1);
    }

    #[test]
    fn garbage_input_terminates() {
        let inputs = [
            "@ @ @ @ @ @",
            ") ) ) ) } } }",
            "function ( ( ( , , ,",
            "{ { { { { {",
            "if while return ; ; ; else",
            "import / / / ;",
            "function f() { a = = = ; }",
        ];
        for src in inputs {
            match parse(src) {
                Ok(_) => {}
                Err(SyntaxError::Recovery(RecoveryError::Exhausted { .. })) => {}
                Err(other) => panic!("{}: unexpected failure {}", src, other),
            }
        }
    }

    #[test]
    fn lex_errors_abort() {
        assert!(matches!(parse("const s = \"open;"), Err(SyntaxError::Lex { line: 1, .. })));
    }

    #[test]
    fn trailing_separators_after_a_completed_block_are_removed() {
        let out = parse_ok("function f() { int x = 1 } ; ;");
        let messages: Vec<_> = out.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["missing ';'", "invalid token ';'", "invalid token ';'"]);
        assert_eq!(out.tree.count(NodeKind::ReturnStmt), 0);
    }

    #[test]
    fn duplicate_comma_is_removed_from_call_arguments() {
        for src in ["function f() { g(a, , b); }", "function f() { int y = g(a, , b); }"] {
            let out = parse_ok(src);
            let messages: Vec<_> = out.diagnostics.iter().map(|d| d.message.as_str()).collect();
            assert_eq!(messages, vec!["invalid token ','"], "{}", src);
            let args = out.tree.find(NodeKind::ArgList).unwrap();
            assert_eq!(args.count(NodeKind::NameRef), 2, "{}", src);
        }
    }

    #[test]
    fn misspelt_returns_is_replaced() {
        let out = parse_ok("function foo() retuns int {}");
        let messages: Vec<_> = out.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["invalid token 'retuns'", "missing 'returns'"]);
        let ret = out.tree.find(NodeKind::ReturnTypeDescriptor).unwrap();
        assert_eq!(ret.count(NodeKind::BuiltinType), 1);
        assert_eq!(out.tree.count(NodeKind::Block), 1);
    }

    #[test]
    fn documentation_is_never_inserted() {
        let out = parse_ok("function f() { int x = 1; } funtion g() {}");
        assert!(out.has_errors());
        assert!(out
            .diagnostics
            .iter()
            .all(|d| !d.message.contains("documentation")), "{:?}", out.diagnostics);
    }

    #[test]
    fn removed_tokens_ride_on_the_next_token() {
        let out = parse_ok("function f(int a, , int b) {}");
        let carrier = out
            .tree
            .tokens()
            .into_iter()
            .find(|t| !t.invalid_leading.is_empty())
            .unwrap();
        assert_eq!(carrier.kind, SyntaxKind::IntKeyword);
        assert_eq!(carrier.invalid_leading[0].text, ",");
    }
}
