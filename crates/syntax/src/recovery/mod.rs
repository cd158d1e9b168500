//! Syntax error recovery.
//!
//! The parser calls [`ErrorHandler::recover`] whenever the next token does
//! not fit the grammar position it is parsing. The handler searches a few
//! tokens ahead (see [`search`]) and applies one single-token repair:
//! remove the token, insert a missing one, or keep the token and steer the
//! parser onto the branch that accepts it.
//!
//! Recovery always returns a repair except in one case: when repeated
//! attempts at the same token index reach the completion iteration limit
//! without a usable repair, it fails with [`RecoveryError::Exhausted`].
//! Past the resolution limit, attempts outside completion mode fall back to
//! removing the token, which always makes progress.

pub mod search;
pub mod solution;

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::context::{ContextStack, GrammarContext};
use crate::error::{Diagnostic, RecoveryError};
use crate::grammar::{classify, expected_token_kind, next_rule, shortest_alternative, ContextClass};
use crate::reader::TokenReader;
use crate::token::{SyntaxKind, Token};

use search::{Search, MAX_PASS_THROUGH_STEPS};
pub use solution::{Action, SearchResult, Solution};

// ──────────────────────────────────────────────
// Configuration
// ──────────────────────────────────────────────

/// Search and iteration bounds.
///
/// These are the only circuit breakers of the search, so changing them
/// changes which repairs are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecoveryConfig {
    /// Tokens a search branch may match before it stops.
    pub lookahead_limit: usize,
    /// Attempts at one token index that may use completion mode.
    pub completion_iteration_limit: usize,
    /// Attempts at one token index that may use the full search.
    pub resolution_iteration_limit: usize,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        RecoveryConfig {
            lookahead_limit: 4,
            completion_iteration_limit: 15,
            resolution_iteration_limit: 7,
        }
    }
}

// ──────────────────────────────────────────────
// Session state
// ──────────────────────────────────────────────

/// Counts consecutive recovery attempts at the same token index.
#[derive(Debug, Default, Clone)]
pub struct RecoverySession {
    previous_index: Option<usize>,
    iterations: usize,
}

impl RecoverySession {
    /// Record an attempt at `index` and return the updated count. The first
    /// attempt at a new index counts as zero.
    fn record(&mut self, index: usize) -> usize {
        if self.previous_index == Some(index) {
            self.iterations += 1;
        } else {
            self.previous_index = Some(index);
            self.iterations = 0;
        }
        self.iterations
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

// ──────────────────────────────────────────────
// Missing tokens
// ──────────────────────────────────────────────

/// Builds the zero-width token an INSERT repair stands in for.
pub trait MissingTokenFactory {
    fn create_missing(&self, kind: SyntaxKind, ctx: GrammarContext, line: u32) -> Token;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultMissingTokenFactory;

impl MissingTokenFactory for DefaultMissingTokenFactory {
    fn create_missing(&self, kind: SyntaxKind, _ctx: GrammarContext, line: u32) -> Token {
        Token::missing(kind, line, Diagnostic::missing(kind, line))
    }
}

// ──────────────────────────────────────────────
// Error handler
// ──────────────────────────────────────────────

/// Owns the token reader and the live context stack for one parse.
pub struct ErrorHandler<R: TokenReader> {
    reader: R,
    stack: ContextStack,
    session: RecoverySession,
    config: RecoveryConfig,
    factory: Box<dyn MissingTokenFactory>,
}

impl<R: TokenReader> ErrorHandler<R> {
    pub fn new(reader: R, config: RecoveryConfig) -> Self {
        ErrorHandler {
            reader,
            stack: ContextStack::new(),
            session: RecoverySession::default(),
            config,
            factory: Box::new(DefaultMissingTokenFactory),
        }
    }

    pub fn with_factory(mut self, factory: Box<dyn MissingTokenFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    pub fn stack(&self) -> &ContextStack {
        &self.stack
    }

    /// Attempts made so far at the current token index.
    pub fn iteration_count(&self) -> usize {
        self.session.iterations()
    }

    pub fn start_context(&mut self, ctx: GrammarContext) {
        self.stack.start(ctx);
    }

    pub fn end_context(&mut self) -> Result<GrammarContext, RecoveryError> {
        self.stack.end()
    }

    pub fn switch_context(&mut self, ctx: GrammarContext) -> Result<(), RecoveryError> {
        self.stack.switch(ctx)
    }

    pub fn parent_context(&self) -> Option<GrammarContext> {
        self.stack.parent()
    }

    pub fn grand_parent_context(&self) -> Option<GrammarContext> {
        self.stack.grand_parent()
    }

    pub fn has_ancestor_context(&self, ctx: GrammarContext) -> bool {
        self.stack.has_ancestor(ctx)
    }

    /// Choose and apply a repair for `next_token` at `ctx`.
    ///
    /// In completion mode an insertion is preferred, so the parser can
    /// finish the construct without consuming the token.
    pub fn recover(
        &mut self,
        ctx: GrammarContext,
        next_token: &Token,
        is_completion: bool,
    ) -> Result<Solution, RecoveryError> {
        // Nothing can be removed at end of input.
        if next_token.kind == SyntaxKind::Eof {
            let mut solution = self
                .shortest_insertion(ctx)
                .unwrap_or_else(|| Solution::insert(ctx, expected_token_kind(ctx)));
            self.apply_fix(&mut solution);
            debug!("{}: {} at end of input", ctx, solution);
            return Ok(solution);
        }

        let index = self.reader.current_index();
        let iterations = self.session.record(index);

        let fix = if is_completion && iterations < self.config.completion_iteration_limit {
            self.completion(ctx, next_token)?
        } else if iterations < self.config.resolution_iteration_limit {
            self.resolution(ctx, next_token)?
        } else {
            None
        };

        if let Some(mut solution) = fix {
            self.apply_fix(&mut solution);
            debug!(
                "{}: {} for '{}' at token {} (attempt {})",
                ctx, solution, next_token, index, iterations
            );
            return Ok(solution);
        }

        if iterations == self.config.completion_iteration_limit {
            error!(
                "{}: recovery made no progress at token {} after {} attempts",
                ctx, index, iterations
            );
            return Err(RecoveryError::Exhausted {
                context: ctx,
                token_index: index,
                iterations,
            });
        }

        let mut solution = Solution::remove(ctx, next_token);
        self.apply_fix(&mut solution);
        warn!("{}: fail-safe removal of '{}' at token {}", ctx, next_token, index);
        Ok(solution)
    }

    fn completion(
        &self,
        ctx: GrammarContext,
        next_token: &Token,
    ) -> Result<Option<Solution>, RecoveryError> {
        match self.shortest_insertion(ctx) {
            Some(solution) => Ok(Some(solution)),
            None => {
                debug!("{}: no insertion path, falling back to full search", ctx);
                self.resolution(ctx, next_token)
            }
        }
    }

    /// The insertion that lets the parser move on from `ctx` soonest: the
    /// token `ctx` expects, or the first token of its shortest continuation.
    ///
    /// `None` when the walk reaches end of input, a position with nothing to
    /// synthesise, or a dead end in the tables.
    fn shortest_insertion(&self, ctx: GrammarContext) -> Option<Solution> {
        let mut stack = self.stack.clone();
        let mut current = ctx;
        for _ in 0..MAX_PASS_THROUGH_STEPS {
            match classify(current).ok()? {
                ContextClass::Terminal(_) | ContextClass::Keyword(_) => {
                    let kind = expected_token_kind(current);
                    if matches!(kind, SyntaxKind::None | SyntaxKind::Eof) {
                        return None;
                    }
                    return Some(Solution::insert(ctx, kind));
                }
                ContextClass::Ambiguous(_) => current = shortest_alternative(current)?,
                ContextClass::PassThrough => current = next_rule(current, &mut stack).ok()?,
            }
        }
        None
    }

    fn resolution(
        &self,
        ctx: GrammarContext,
        next_token: &Token,
    ) -> Result<Option<Solution>, RecoveryError> {
        let mut result = Search::new(&self.reader, self.config.lookahead_limit).run(ctx, &self.stack)?;
        validate_solution(&mut result, ctx, next_token);
        if result.matches == 0 {
            return Ok(None);
        }
        Ok(result.solution)
    }

    /// Carry out `solution` on the token stream.
    pub fn apply_fix(&mut self, solution: &mut Solution) {
        match solution.action {
            Action::Remove => {
                solution.removed_token = Some(self.reader.read());
                solution.recovered_token = Some(self.reader.peek().clone());
            }
            Action::Insert => {
                let line = self.reader.peek().line;
                let token = self.factory.create_missing(solution.token_kind, solution.ctx, line);
                solution.resolved_kind = token.kind;
                solution.recovered_token = Some(token);
            }
            Action::Keep => {}
        }
    }
}

/// Correct the chosen solution of a finished search.
///
/// A KEEP is never allowed to accept a documentation string into a
/// structural position; it becomes a REMOVE of that token. An INSERT is
/// replaced by the fix beneath it when that fix is a REMOVE at depth 1.
pub fn validate_solution(result: &mut SearchResult, ctx: GrammarContext, next_token: &Token) {
    let action = match result.solution {
        Some(ref s) => s.action,
        None => return,
    };
    match action {
        Action::Remove => {}
        Action::Keep => {
            if next_token.kind == SyntaxKind::DocumentationString {
                result.solution = Some(Solution::remove(ctx, next_token));
            }
        }
        Action::Insert => {
            if result.fix_count() < 2 {
                return;
            }
            if let Some(second) = result.second_fix() {
                if second.action == Action::Remove && second.depth == 1 {
                    result.solution = Some(second.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::reader::BufferedTokenReader;
    use crate::context::GrammarContext as Ctx;

    fn handler(src: &str, ctxs: &[Ctx]) -> ErrorHandler<BufferedTokenReader> {
        let mut h = ErrorHandler::new(
            BufferedTokenReader::new(lex(src).unwrap()),
            RecoveryConfig::default(),
        );
        for c in ctxs {
            h.start_context(*c);
        }
        h
    }

    fn next(h: &ErrorHandler<BufferedTokenReader>) -> Token {
        h.reader().peek().clone()
    }

    // ── Validation ────────────────────────────────────────────────────────

    #[test]
    fn keep_before_documentation_becomes_remove() {
        let doc = Token::new(SyntaxKind::DocumentationString, "stray", 2);
        let mut result = SearchResult::new(2);
        result.solution = Some(Solution::keep(Ctx::Statement, SyntaxKind::Identifier));
        validate_solution(&mut result, Ctx::StatementsOrEnd, &doc);
        let solution = result.solution.unwrap();
        assert_eq!(solution.action, Action::Remove);
        assert_eq!(solution.token_kind, SyntaxKind::DocumentationString);
        assert_eq!(solution.ctx, Ctx::StatementsOrEnd);
    }

    #[test]
    fn keep_before_ordinary_token_is_unchanged() {
        let tok = Token::new(SyntaxKind::Identifier, "x", 2);
        let mut result = SearchResult::new(2);
        result.solution = Some(Solution::keep(Ctx::Statement, SyntaxKind::Identifier));
        validate_solution(&mut result, Ctx::StatementsOrEnd, &tok);
        assert_eq!(result.solution.unwrap().action, Action::Keep);
    }

    #[test]
    fn shallow_remove_beats_deep_insert() {
        let comma = Token::new(SyntaxKind::Comma, ",", 1);
        let mut result = SearchResult::new(2);
        result.push_fix(Solution::remove(Ctx::Comma, &comma).at_depth(1));
        let insert = Solution::insert(Ctx::Semicolon, SyntaxKind::Semicolon).at_depth(2);
        result.push_fix(insert.clone());
        result.solution = Some(insert);
        validate_solution(&mut result, Ctx::Comma, &comma);
        let solution = result.solution.unwrap();
        assert_eq!(solution.action, Action::Remove);
        assert_eq!(solution.depth, 1);
    }

    #[test]
    fn deeper_remove_does_not_override_insert() {
        let comma = Token::new(SyntaxKind::Comma, ",", 1);
        let mut result = SearchResult::new(2);
        result.push_fix(Solution::remove(Ctx::Comma, &comma).at_depth(2));
        let insert = Solution::insert(Ctx::Semicolon, SyntaxKind::Semicolon).at_depth(1);
        result.push_fix(insert.clone());
        result.solution = Some(insert);
        validate_solution(&mut result, Ctx::Comma, &comma);
        assert_eq!(result.solution.unwrap().action, Action::Insert);
    }

    #[test]
    fn single_fix_insert_is_unchanged() {
        let tok = Token::new(SyntaxKind::OpenBrace, "{", 1);
        let mut result = SearchResult::new(3);
        let insert = Solution::insert(Ctx::CloseParenthesis, SyntaxKind::CloseParen).at_depth(1);
        result.push_fix(insert.clone());
        result.solution = Some(insert);
        validate_solution(&mut result, Ctx::CloseParenthesis, &tok);
        assert_eq!(result.solution.unwrap().action, Action::Insert);
    }

    // ── Driver ────────────────────────────────────────────────────────────

    #[test]
    fn insert_synthesises_missing_token_without_consuming() {
        let mut h = handler("{ }", &[Ctx::CompUnit, Ctx::FuncDefinition, Ctx::ParamList]);
        let tok = next(&h);
        let solution = h.recover(Ctx::CloseParenthesis, &tok, false).unwrap();
        assert_eq!(solution.action, Action::Insert);
        let missing = solution.recovered_token.unwrap();
        assert!(missing.is_missing());
        assert_eq!(missing.kind, SyntaxKind::CloseParen);
        assert_eq!(missing.diagnostics[0].message, "missing ')'");
        assert_eq!(h.reader().current_index(), 0);
        // the live stack is untouched by the search
        assert_eq!(h.parent_context(), Some(Ctx::ParamList));
    }

    #[test]
    fn end_of_input_inserts_expected_token() {
        let mut h = handler("", &[Ctx::CompUnit, Ctx::FuncDefinition, Ctx::Block]);
        let tok = next(&h);
        let solution = h.recover(Ctx::StatementsOrEnd, &tok, false).unwrap();
        assert_eq!(solution.action, Action::Insert);
        assert_eq!(solution.token_kind, SyntaxKind::CloseBrace);
        assert_eq!(h.iteration_count(), 0);
    }

    #[test]
    fn fail_safe_removes_exactly_one_token() {
        let mut h = handler("@ @ @ @ @ @", &[Ctx::CompUnit, Ctx::ImportDecl]);
        let tok = next(&h);
        let solution = h.recover(Ctx::Semicolon, &tok, false).unwrap();
        assert_eq!(solution.action, Action::Remove);
        assert_eq!(solution.token_kind, SyntaxKind::Invalid);
        assert_eq!(solution.removed_token.unwrap().text, "@");
        assert_eq!(h.reader().current_index(), 1);
        assert_eq!(solution.recovered_token.unwrap().text, "@");
    }

    #[test]
    fn repeated_attempts_fall_back_to_removal_past_the_resolution_limit() {
        let mut h = handler("{ }", &[Ctx::CompUnit, Ctx::FuncDefinition, Ctx::ParamList]);
        let tok = next(&h);
        let limit = h.config().resolution_iteration_limit;
        for attempt in 0..limit {
            let solution = h.recover(Ctx::CloseParenthesis, &tok, false).unwrap();
            assert_eq!(solution.action, Action::Insert);
            assert_eq!(h.iteration_count(), attempt);
        }

        let solution = h.recover(Ctx::CloseParenthesis, &tok, false).unwrap();
        assert_eq!(h.iteration_count(), limit);
        assert_eq!(solution.action, Action::Remove);
        assert_eq!(solution.removed_token.unwrap().text, "{");
        assert_eq!(h.reader().current_index(), 1);
    }

    #[test]
    fn completion_attempts_exhaust_at_the_completion_limit() {
        let mut h = handler("}", &[Ctx::CompUnit, Ctx::FuncDefinition, Ctx::Block]);
        let tok = next(&h);
        let limit = h.config().completion_iteration_limit;
        for _ in 0..limit {
            let solution = h.recover(Ctx::Semicolon, &tok, true).unwrap();
            assert_eq!(solution.action, Action::Insert);
        }
        let err = h.recover(Ctx::Semicolon, &tok, true).unwrap_err();
        assert_eq!(
            err,
            RecoveryError::Exhausted {
                context: Ctx::Semicolon,
                token_index: 0,
                iterations: limit,
            }
        );
    }

    #[test]
    fn progress_resets_the_iteration_counter() {
        let mut h = handler("{ } { }", &[Ctx::CompUnit, Ctx::FuncDefinition, Ctx::ParamList]);
        let tok = next(&h);
        h.recover(Ctx::CloseParenthesis, &tok, false).unwrap();
        h.recover(Ctx::CloseParenthesis, &tok, false).unwrap();
        assert_eq!(h.iteration_count(), 1);
        h.reader_mut().read();
        let tok = next(&h);
        h.recover(Ctx::CloseParenthesis, &tok, false).unwrap();
        assert_eq!(h.iteration_count(), 0);
    }

    #[test]
    fn completion_inserts_for_the_position_being_recovered() {
        let ctxs = [Ctx::CompUnit, Ctx::FuncDefinition, Ctx::Block, Ctx::VarDecl];

        let mut h = handler("}", &ctxs);
        let tok = next(&h);
        let solution = h.recover(Ctx::ExpressionRhs, &tok, true).unwrap();
        assert_eq!(solution.action, Action::Insert);
        assert_eq!(solution.ctx, Ctx::ExpressionRhs);
        assert_eq!(solution.token_kind, SyntaxKind::Semicolon);

        let mut h = handler("}", &ctxs);
        let solution = h.recover(Ctx::Semicolon, &tok, true).unwrap();
        assert_eq!(solution.ctx, Ctx::Semicolon);
        assert_eq!(solution.token_kind, expected_token_kind(Ctx::Semicolon));

        // A statement position completes with its own first token, never
        // with one from deeper in the grammar.
        let mut h = handler("}", &[Ctx::CompUnit, Ctx::FuncDefinition, Ctx::Block]);
        let solution = h.recover(Ctx::Statement, &tok, true).unwrap();
        assert_eq!(solution.ctx, Ctx::Statement);
        assert_eq!(solution.token_kind, SyntaxKind::Identifier);
    }

    #[test]
    fn full_search_repairs_the_same_position_outside_completion() {
        let ctxs = [Ctx::CompUnit, Ctx::FuncDefinition, Ctx::Block, Ctx::VarDecl];
        let mut h = handler("}", &ctxs);
        let tok = next(&h);
        let solution = h.recover(Ctx::ExpressionRhs, &tok, false).unwrap();
        assert_eq!(solution.action, Action::Insert);
        assert_eq!(solution.ctx, Ctx::Semicolon);
        assert_eq!(solution.token_kind, SyntaxKind::Semicolon);
    }

    /// Tags every synthesised token with the position it was made for.
    struct TaggingFactory;

    impl MissingTokenFactory for TaggingFactory {
        fn create_missing(&self, kind: SyntaxKind, ctx: GrammarContext, line: u32) -> Token {
            let mut token = Token::missing(kind, line, Diagnostic::missing(kind, line));
            token.text = format!("<{}>", ctx);
            token
        }
    }

    #[test]
    fn custom_factory_builds_inserted_tokens() {
        let mut h = handler("{ }", &[Ctx::CompUnit, Ctx::FuncDefinition, Ctx::ParamList])
            .with_factory(Box::new(TaggingFactory));
        let tok = next(&h);
        let solution = h.recover(Ctx::ParamEnd, &tok, false).unwrap();
        let token = solution.recovered_token.unwrap();
        assert_eq!(token.text, "<CloseParenthesis>");
        assert_eq!(token.kind, SyntaxKind::CloseParen);
        assert_eq!(solution.resolved_kind, SyntaxKind::CloseParen);
    }

    #[test]
    fn config_reads_partial_toml_shape() {
        let config: RecoveryConfig =
            serde_json::from_str(r#"{ "lookahead_limit": 5 }"#).unwrap();
        assert_eq!(config.lookahead_limit, 5);
        assert_eq!(config.resolution_iteration_limit, 7);
        assert!(serde_json::from_str::<RecoveryConfig>(r#"{ "depth": 1 }"#).is_err());
    }
}
