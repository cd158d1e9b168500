//! skein-syntax: parser with search-based syntax error recovery.
//!
//! The parser never gives up on bad input. At every mismatch it asks the
//! recovery engine for a single-token repair (insert a missing token,
//! remove an unexpected one, or keep it and switch grammar branch), chosen
//! by a bounded lookahead search over the grammar automaton.
//!
//! # Public API
//!
//! - [`parse()`] / [`parse_with_config()`] -- lex and parse source text
//! - [`ParseOutput`] -- the recovered [`SyntaxNode`] tree plus diagnostics
//! - [`RecoveryConfig`] -- search and iteration bounds
//! - [`ErrorHandler`] -- the recovery driver, usable with any [`TokenReader`]
//! - [`SyntaxError`] / [`RecoveryError`] -- failures that abort a parse

pub mod context;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod reader;
pub mod recovery;
pub mod token;
pub mod tree;

// ── Convenience re-exports ───────────────────────────────────────────

pub use context::{ContextStack, GrammarContext};
pub use error::{Diagnostic, DiagnosticCode, RecoveryError, SyntaxError};
pub use parser::{parse, parse_tokens, parse_with_config, ParseOutput};
pub use reader::{BufferedTokenReader, TokenReader};
pub use recovery::{
    Action, DefaultMissingTokenFactory, ErrorHandler, MissingTokenFactory, RecoveryConfig,
    SearchResult, Solution,
};
pub use token::{SyntaxKind, Token};
pub use tree::{NodeKind, SyntaxElement, SyntaxNode};
