use std::fmt;

use crate::context::GrammarContext;
use crate::token::{SyntaxKind, Token};

/// Kind of repair a [`Solution`] proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Synthesise the expected token without consuming input.
    Insert,
    /// Discard the next token.
    Remove,
    /// Accept the next token as it is.
    Keep,
}

/// A single-token repair.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub action: Action,
    pub ctx: GrammarContext,
    /// Expected kind for INSERT and KEEP, removed kind for REMOVE.
    pub token_kind: SyntaxKind,
    pub text: String,
    /// Search depth at which the repair was proposed.
    pub depth: usize,
    /// Token consumed when a REMOVE was applied.
    pub removed_token: Option<Token>,
    /// Synthesised token after an INSERT, or the token following a REMOVE.
    pub recovered_token: Option<Token>,
    pub resolved_kind: SyntaxKind,
}

impl Solution {
    pub fn new(action: Action, ctx: GrammarContext, token_kind: SyntaxKind, text: impl Into<String>) -> Self {
        Solution {
            action,
            ctx,
            token_kind,
            text: text.into(),
            depth: 0,
            removed_token: None,
            recovered_token: None,
            resolved_kind: token_kind,
        }
    }

    pub fn insert(ctx: GrammarContext, token_kind: SyntaxKind) -> Self {
        Solution::new(Action::Insert, ctx, token_kind, ctx.to_string())
    }

    pub fn remove(ctx: GrammarContext, token: &Token) -> Self {
        Solution::new(Action::Remove, ctx, token.kind, token.text.clone())
    }

    pub fn keep(ctx: GrammarContext, token_kind: SyntaxKind) -> Self {
        Solution::new(Action::Keep, ctx, token_kind, ctx.to_string())
    }

    pub fn at_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.action {
            Action::Insert => "INSERT",
            Action::Remove => "REMOVE",
            Action::Keep => "KEEP",
        };
        write!(f, "{} {:?} in {} (depth {})", action, self.token_kind, self.ctx, self.depth)
    }
}

/// Outcome of one search branch.
///
/// Branches compare by `matches` (more is better), then `remove_fixes`
/// (fewer is better), then by the action of the most recent fix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    fixes: Vec<Solution>,
    pub matches: usize,
    pub remove_fixes: usize,
    pub solution: Option<Solution>,
}

impl SearchResult {
    pub fn new(matches: usize) -> Self {
        SearchResult {
            matches,
            ..SearchResult::default()
        }
    }

    pub fn push_fix(&mut self, fix: Solution) {
        self.fixes.push(fix);
    }

    /// Most recently pushed fix.
    pub fn peek_fix(&self) -> Option<&Solution> {
        self.fixes.last()
    }

    pub fn pop_fix(&mut self) -> Option<Solution> {
        self.fixes.pop()
    }

    /// Fix just below the top of the stack.
    pub fn second_fix(&self) -> Option<&Solution> {
        self.fixes.iter().rev().nth(1)
    }

    /// Fixes from most to least recent.
    pub fn fixes(&self) -> impl Iterator<Item = &Solution> + '_ {
        self.fixes.iter().rev()
    }

    pub fn fix_count(&self) -> usize {
        self.fixes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fix_stack_is_lifo() {
        let mut r = SearchResult::new(2);
        r.push_fix(Solution::insert(GrammarContext::Comma, SyntaxKind::Comma).at_depth(3));
        r.push_fix(Solution::keep(GrammarContext::Semicolon, SyntaxKind::Semicolon).at_depth(1));
        assert_eq!(r.peek_fix().map(|s| s.action), Some(Action::Keep));
        assert_eq!(r.second_fix().map(|s| s.depth), Some(3));
        assert_eq!(r.fix_count(), 2);
        assert_eq!(r.pop_fix().map(|s| s.depth), Some(1));
        assert_eq!(r.second_fix(), None);
    }

    #[test]
    fn remove_records_token_text() {
        let tok = Token::new(SyntaxKind::Comma, ",", 4);
        let s = Solution::remove(GrammarContext::ParamEnd, &tok);
        assert_eq!(s.action, Action::Remove);
        assert_eq!(s.token_kind, SyntaxKind::Comma);
        assert_eq!(s.text, ",");
        assert_eq!(s.to_string(), "REMOVE Comma in ParamEnd (depth 0)");
    }
}
