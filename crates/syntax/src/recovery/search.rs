//! Bounded lookahead search over the grammar automaton.
//!
//! Starting from a context, the search walks the transition function over
//! the upcoming tokens. At a mismatch it scores two continuations (delete
//! the token, or insert the expected one) and at a branch point it scores
//! every alternative. Each branch runs on its own clone of the context stack
//! and only peeks the token stream. Depth is capped by the lookahead limit,
//! so every call terminates.

use log::trace;

use crate::context::{ContextStack, GrammarContext as Ctx};
use crate::error::RecoveryError;
use crate::grammar::terminals::{keyword_of, matches_keyword};
use crate::grammar::{classify, expected_token_kind, next_rule, ContextClass};
use crate::reader::TokenReader;
use crate::token::SyntaxKind;

use super::solution::{Action, SearchResult, Solution};

/// Consecutive non-consuming steps allowed before the tables are considered cyclic.
pub const MAX_PASS_THROUGH_STEPS: usize = 64;

pub struct Search<'a, R: TokenReader + ?Sized> {
    reader: &'a R,
    limit: usize,
}

impl<'a, R: TokenReader + ?Sized> Search<'a, R> {
    pub fn new(reader: &'a R, lookahead_limit: usize) -> Self {
        Search {
            reader,
            limit: lookahead_limit.max(1),
        }
    }

    /// Search from `ctx` at the next token, treating it as the entry point.
    pub fn run(&self, ctx: Ctx, stack: &ContextStack) -> Result<SearchResult, RecoveryError> {
        self.seek_match(ctx, 1, 0, true, stack.clone())
    }

    pub fn seek_match(
        &self,
        mut ctx: Ctx,
        mut lookahead: usize,
        mut depth: usize,
        mut entry: bool,
        mut stack: ContextStack,
    ) -> Result<SearchResult, RecoveryError> {
        let mut matches = 0;
        let mut pass_through = 0;

        while depth < self.limit {
            if ctx != Ctx::DocString {
                while self.reader.peek_n(lookahead).kind == SyntaxKind::DocumentationString {
                    lookahead += 1;
                }
            }
            let token = self.reader.peek_n(lookahead);

            let consumes = match classify(ctx)? {
                ContextClass::Ambiguous(paths) => {
                    return self.seek_in_alternative_paths(paths, lookahead, depth, matches, entry, &stack);
                }
                ContextClass::Terminal(matcher) => {
                    if !matcher.matches(token) {
                        return self.fix_and_continue(ctx, lookahead, depth, matches, entry, stack);
                    }
                    true
                }
                ContextClass::Keyword(kw) => {
                    if !matches_keyword(kw, token) {
                        return self.fix_and_continue(ctx, lookahead, depth, matches, entry, stack);
                    }
                    true
                }
                ContextClass::PassThrough => {
                    pass_through += 1;
                    if pass_through > MAX_PASS_THROUGH_STEPS {
                        return Err(RecoveryError::unreachable(ctx, "pass-through cycle"));
                    }
                    false
                }
            };

            ctx = next_rule(ctx, &mut stack)?;
            if consumes {
                depth += 1;
                matches += 1;
                lookahead += 1;
                entry = false;
                pass_through = 0;
            }
        }

        let mut result = SearchResult::new(matches);
        result.solution = Some(Solution::keep(ctx, SyntaxKind::None));
        Ok(result)
    }

    pub fn seek_in_alternative_paths(
        &self,
        paths: &[Ctx],
        lookahead: usize,
        depth: usize,
        current_matches: usize,
        entry: bool,
        stack: &ContextStack,
    ) -> Result<SearchResult, RecoveryError> {
        let mut best: Option<SearchResult> = None;

        for &path in paths {
            let mut result = self.seek_match(path, lookahead, depth, entry, stack.clone())?;
            trace!("path {} at depth {}: {} matches", path, depth, result.matches);

            // Nothing can do better within the limit.
            let decisive = result.matches == self.limit - 1
                && result.solution.as_ref().map_or(true, |s| s.action != Action::Remove);
            if decisive {
                // An insertion at the entry token is the repair itself; anything
                // else is reported as the path to follow.
                let inserts_at_entry = entry
                    && result.solution.as_ref().map_or(false, |s| s.action == Action::Insert);
                if !inserts_at_entry {
                    result.solution = Some(Solution::keep(path, expected_token_kind(path)));
                }
                result.matches += current_matches;
                return Ok(result);
            }

            best = Some(match best {
                None => result,
                Some(best) => select_best(best, result),
            });
        }

        let mut best = best.ok_or_else(|| {
            RecoveryError::unreachable(Ctx::CompUnit, "branch point without alternatives")
        })?;
        best.matches += current_matches;
        Ok(best)
    }

    fn fix_and_continue(
        &self,
        ctx: Ctx,
        lookahead: usize,
        depth: usize,
        matches: usize,
        entry: bool,
        stack: ContextStack,
    ) -> Result<SearchResult, RecoveryError> {
        let mut result = self.fix(ctx, lookahead, depth + 1, stack)?;
        result.solution = if entry {
            result.peek_fix().cloned()
        } else {
            Some(Solution::keep(ctx, expected_token_kind(ctx)))
        };
        result.matches += matches;
        Ok(result)
    }

    /// Score deleting the token at `lookahead` against inserting the token
    /// `ctx` expects, and record the winner as a fix.
    ///
    /// Deletion is the only option when `ctx` has no token to synthesise or
    /// when the token repeats the separator just before it.
    fn fix(
        &self,
        ctx: Ctx,
        lookahead: usize,
        depth: usize,
        mut stack: ContextStack,
    ) -> Result<SearchResult, RecoveryError> {
        let token = self.reader.peek_n(lookahead);
        let kind = expected_token_kind(ctx);
        let deletion = self.seek_match(ctx, lookahead + 1, depth, false, stack.clone())?;
        let insertion = if kind == SyntaxKind::None || self.repeats_separator(lookahead) {
            None
        } else {
            let next = next_rule(ctx, &mut stack)?;
            Some(self.seek_match(next, lookahead, depth, false, stack)?)
        };

        let insert = match insertion {
            None => false,
            Some(ref insertion) if insertion.matches == 0 && deletion.matches == 0 => true,
            Some(ref insertion) if insertion.matches == deletion.matches => {
                // A name where a keyword belongs is a misspelt keyword.
                let misspelt = keyword_of(ctx).is_some() && token.kind == SyntaxKind::Identifier;
                !misspelt && insertion.remove_fixes <= deletion.remove_fixes + 1
            }
            Some(ref insertion) => insertion.matches > deletion.matches,
        };

        let insertion_matches = insertion.as_ref().map(|r| r.matches);
        let deletion_matches = deletion.matches;
        let result = match insertion {
            Some(mut result) if insert => {
                result.push_fix(Solution::insert(ctx, kind).at_depth(depth));
                result
            }
            _ => {
                let mut result = deletion;
                result.remove_fixes += 1;
                result.push_fix(Solution::remove(ctx, token).at_depth(depth));
                result
            }
        };
        trace!(
            "fix {} at depth {}: insertion {:?} vs deletion {}, chose {:?}",
            ctx,
            depth,
            insertion_matches,
            deletion_matches,
            result.peek_fix().map(|s| s.action)
        );
        Ok(result)
    }

    /// Whether the token at `lookahead` is a separator doubling the one before it.
    fn repeats_separator(&self, lookahead: usize) -> bool {
        let token = self.reader.peek_n(lookahead);
        if !token.kind.is_separator() {
            return false;
        }
        let before = if lookahead > 1 {
            Some(self.reader.peek_n(lookahead - 1))
        } else {
            self.reader.previous()
        };
        before.map_or(false, |t| t.kind == token.kind)
    }
}

/// Pick the better of two branch results.
///
/// More matches wins, then fewer removals. At equal cost a branch whose most
/// recent fix is a REMOVE replaces one whose most recent fix is an INSERT;
/// otherwise the earlier branch is kept.
pub fn select_best(best: SearchResult, candidate: SearchResult) -> SearchResult {
    if candidate.matches != best.matches {
        return if candidate.matches > best.matches { candidate } else { best };
    }
    if candidate.remove_fixes != best.remove_fixes {
        return if candidate.remove_fixes < best.remove_fixes { candidate } else { best };
    }
    let best_fix = best.peek_fix().map(|s| s.action);
    let candidate_fix = candidate.peek_fix().map(|s| s.action);
    if best_fix == Some(Action::Insert) && candidate_fix == Some(Action::Remove) {
        candidate
    } else {
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::reader::BufferedTokenReader;
    use crate::token::Token;

    fn reader(src: &str) -> BufferedTokenReader {
        BufferedTokenReader::new(lex(src).unwrap())
    }

    fn stack_of(ctxs: &[Ctx]) -> ContextStack {
        let mut stack = ContextStack::new();
        for c in ctxs {
            stack.start(*c);
        }
        stack
    }

    fn result_with_fix(matches: usize, remove_fixes: usize, action: Action) -> SearchResult {
        let mut r = SearchResult::new(matches);
        r.remove_fixes = remove_fixes;
        let fix = match action {
            Action::Remove => Solution::remove(Ctx::Comma, &Token::new(SyntaxKind::Comma, ",", 1)),
            Action::Insert => Solution::insert(Ctx::Comma, SyntaxKind::Comma),
            Action::Keep => Solution::keep(Ctx::Comma, SyntaxKind::Comma),
        };
        r.push_fix(fix);
        r
    }

    // ── Selection ─────────────────────────────────────────────────────────

    #[test]
    fn more_matches_wins() {
        let a = result_with_fix(1, 0, Action::Insert);
        let b = result_with_fix(2, 1, Action::Insert);
        assert_eq!(select_best(a, b).matches, 2);
    }

    #[test]
    fn fewer_removals_win_at_equal_matches() {
        let a = result_with_fix(2, 1, Action::Remove);
        let b = result_with_fix(2, 0, Action::Insert);
        assert_eq!(select_best(a, b).remove_fixes, 0);
    }

    #[test]
    fn remove_beats_insert_at_equal_cost() {
        let insert = result_with_fix(2, 1, Action::Insert);
        let remove = result_with_fix(2, 1, Action::Remove);
        let chosen = select_best(insert.clone(), remove.clone());
        assert_eq!(chosen.peek_fix().unwrap().action, Action::Remove);

        // Order does not matter for this rule.
        let chosen = select_best(remove, insert);
        assert_eq!(chosen.peek_fix().unwrap().action, Action::Remove);
    }

    #[test]
    fn earlier_branch_kept_on_full_tie() {
        let mut first = result_with_fix(1, 0, Action::Insert);
        first.solution = Some(Solution::keep(Ctx::CloseParenthesis, SyntaxKind::CloseParen));
        let second = result_with_fix(1, 0, Action::Insert);
        let chosen = select_best(first, second);
        assert_eq!(chosen.solution.unwrap().ctx, Ctx::CloseParenthesis);
    }

    // ── Search ────────────────────────────────────────────────────────────

    #[test]
    fn missing_close_paren_is_a_decisive_insert_at_the_branch() {
        // function foo(int a {}
        let r = reader("{ }");
        let stack = stack_of(&[Ctx::CompUnit, Ctx::FuncDefinition, Ctx::ParamList]);
        let result = Search::new(&r, 4).run(Ctx::ParamEnd, &stack).unwrap();
        let solution = result.solution.unwrap();
        assert_eq!(solution.action, Action::Insert);
        assert_eq!(solution.ctx, Ctx::CloseParenthesis);
        assert_eq!(solution.token_kind, SyntaxKind::CloseParen);
        assert_eq!(solution.depth, 1);
        assert_eq!(result.matches, 3);
    }

    #[test]
    fn missing_close_paren_is_inserted() {
        let r = reader("{ }");
        let stack = stack_of(&[Ctx::CompUnit, Ctx::FuncDefinition, Ctx::ParamList]);
        let result = Search::new(&r, 4).run(Ctx::CloseParenthesis, &stack).unwrap();
        let solution = result.solution.unwrap();
        assert_eq!(solution.action, Action::Insert);
        assert_eq!(solution.token_kind, SyntaxKind::CloseParen);
        assert_eq!(solution.depth, 1);
        assert_eq!(result.matches, 3);
    }

    #[test]
    fn duplicate_comma_in_parameters_is_removed() {
        // function f(int a, , int b) {}  -- searching after the first comma
        let r = reader(", int b ) { }");
        let stack = stack_of(&[Ctx::CompUnit, Ctx::FuncDefinition, Ctx::ParamList]);
        let result = Search::new(&r, 4).run(Ctx::TypeDescriptor, &stack).unwrap();
        let solution = result.solution.unwrap();
        assert_eq!(solution.action, Action::Remove);
        assert_eq!(solution.token_kind, SyntaxKind::Comma);
        assert_eq!(result.remove_fixes, 1);
    }

    #[test]
    fn duplicate_comma_in_arguments_is_removed() {
        // g(a, , b);  -- searching at the second comma
        let mut r = reader("g ( a , , b ) ;");
        for _ in 0..4 {
            r.read();
        }
        let stack = stack_of(&[
            Ctx::CompUnit,
            Ctx::FuncDefinition,
            Ctx::Block,
            Ctx::CallStmt,
            Ctx::ArgList,
        ]);
        let result = Search::new(&r, 4).run(Ctx::Expression, &stack).unwrap();
        let solution = result.solution.unwrap();
        assert_eq!(solution.action, Action::Remove);
        assert_eq!(solution.token_kind, SyntaxKind::Comma);
        assert_eq!(solution.depth, 1);
        assert_eq!(result.matches, 3);
    }

    #[test]
    fn misspelt_keyword_is_removed_rather_than_read_as_a_name() {
        // function foo() retuns int {}
        let r = reader("retuns int { }");
        let stack = stack_of(&[Ctx::CompUnit, Ctx::FuncDefinition]);
        let result = Search::new(&r, 4).run(Ctx::ReturnTypeOrBody, &stack).unwrap();
        let solution = result.solution.unwrap();
        assert_eq!(solution.action, Action::Remove);
        assert_eq!(solution.ctx, Ctx::ReturnsKeyword);
        assert_eq!(solution.token_kind, SyntaxKind::Identifier);
        assert_eq!(result.matches, 2);
    }

    #[test]
    fn documentation_is_never_synthesised() {
        let r = reader("x");
        let stack = stack_of(&[Ctx::CompUnit]);
        let result = Search::new(&r, 4).run(Ctx::DocString, &stack).unwrap();
        assert_eq!(result.solution.as_ref().unwrap().action, Action::Remove);
        assert!(result.fixes().all(|f| f.action == Action::Remove));
    }

    #[test]
    fn search_never_mutates_the_live_stack() {
        let r = reader("{ }");
        let stack = stack_of(&[Ctx::CompUnit, Ctx::FuncDefinition, Ctx::ParamList]);
        Search::new(&r, 4).run(Ctx::ParamEnd, &stack).unwrap();
        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.parent(), Some(Ctx::ParamList));
    }

    #[test]
    fn documentation_tokens_are_skipped() {
        let r = reader("# note\n;");
        let stack = stack_of(&[Ctx::CompUnit, Ctx::ImportDecl]);
        let result = Search::new(&r, 4).run(Ctx::Semicolon, &stack).unwrap();
        assert!(result.peek_fix().is_none());
        assert_eq!(result.matches, 4);
    }

    #[test]
    fn limit_reached_without_mismatch_keeps() {
        let r = reader("a = b ;");
        let stack = stack_of(&[Ctx::CompUnit, Ctx::FuncDefinition, Ctx::Block]);
        let result = Search::new(&r, 2).run(Ctx::StatementStartIdentifier, &stack).unwrap();
        assert_eq!(result.fix_count(), 0);
        assert_eq!(result.matches, 2);
        let solution = result.solution.unwrap();
        assert_eq!(solution.action, Action::Keep);
        assert_eq!(solution.ctx, Ctx::AssignmentStmt);
    }

    #[test]
    fn adversarial_streams_terminate() {
        let commas = vec![","; 40].join(" ");
        let r = reader(&commas);
        let stacks = [
            stack_of(&[Ctx::CompUnit]),
            stack_of(&[Ctx::CompUnit, Ctx::FuncDefinition, Ctx::ParamList]),
            stack_of(&[Ctx::CompUnit, Ctx::FuncDefinition, Ctx::Block, Ctx::CallStmt, Ctx::ArgList]),
            stack_of(&[Ctx::CompUnit, Ctx::TypeDefinition, Ctx::RecordTypeDesc]),
        ];
        let search = Search::new(&r, 4);
        for stack in &stacks {
            for ctx in crate::grammar::ALL_CONTEXTS {
                // Any outcome is fine as long as the call returns.
                let _ = search.run(*ctx, stack);
            }
        }
        let params = &stacks[1];
        assert!(search.run(Ctx::ParamEnd, params).is_ok());
        assert!(search.run(Ctx::ArgEnd, &stacks[2]).is_ok());
    }
}
