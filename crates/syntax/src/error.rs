use serde::{Deserialize, Serialize};

use crate::context::GrammarContext;
use crate::token::SyntaxKind;

/// Category of a recovery diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// A zero-width token was synthesised where the grammar required one
    MissingToken,
    /// A token was removed because no grammar path accepts it
    InvalidToken,
}

/// A diagnostic attached to a synthesised or removed token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub line: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn missing(kind: SyntaxKind, line: u32) -> Self {
        let message = match kind.text() {
            "" => format!("missing {}", describe(kind)),
            text => format!("missing '{}'", text),
        };
        Diagnostic {
            code: DiagnosticCode::MissingToken,
            line,
            message,
        }
    }

    pub fn invalid(text: &str, line: u32) -> Self {
        Diagnostic {
            code: DiagnosticCode::InvalidToken,
            line,
            message: format!("invalid token '{}'", text),
        }
    }

    /// Serialize with every field present, matching the CLI's JSON report.
    pub fn to_json_value(&self, file: &str) -> serde_json::Value {
        serde_json::json!({
            "code":    self.code,
            "file":    file,
            "line":    self.line,
            "message": self.message,
        })
    }
}

fn describe(kind: SyntaxKind) -> &'static str {
    match kind {
        SyntaxKind::Identifier => "identifier",
        SyntaxKind::IntLiteral => "integer literal",
        SyntaxKind::FloatLiteral => "floating point literal",
        SyntaxKind::StringLiteral => "string literal",
        SyntaxKind::TemplateString => "template text",
        SyntaxKind::DocumentationString => "documentation string",
        SyntaxKind::Eof => "end of file",
        _ => "token",
    }
}

/// Failures of the recovery engine itself. None of these describe bad input:
/// they mean the grammar tables are incomplete or the search budget ran out.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecoveryError {
    /// The transition function or a classifier has no rule for this state.
    #[error("no grammar transition from {context:?}: {detail}")]
    UnreachableState {
        context: GrammarContext,
        detail: String,
    },

    /// `end` was called with no active production.
    #[error("context stack underflow")]
    StackUnderflow,

    /// Recovery made no progress at one token within the iteration budget.
    #[error(
        "recovery exhausted at token {token_index} in {context:?} after {iterations} attempts"
    )]
    Exhausted {
        context: GrammarContext,
        token_index: usize,
        iterations: usize,
    },
}

impl RecoveryError {
    pub(crate) fn unreachable(context: GrammarContext, detail: impl Into<String>) -> Self {
        RecoveryError::UnreachableState {
            context,
            detail: detail.into(),
        }
    }
}

/// Errors that abort a parse.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyntaxError {
    #[error("line {line}: {message}")]
    Lex { line: u32, message: String },

    #[error(transparent)]
    Recovery(#[from] RecoveryError),
}

impl SyntaxError {
    pub fn lex(line: u32, message: impl Into<String>) -> Self {
        SyntaxError::Lex {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_punctuation_quotes_the_token_text() {
        let d = Diagnostic::missing(SyntaxKind::CloseParen, 3);
        assert_eq!(d.message, "missing ')'");
        assert_eq!(d.code, DiagnosticCode::MissingToken);
    }

    #[test]
    fn missing_identifier_is_described() {
        let d = Diagnostic::missing(SyntaxKind::Identifier, 1);
        assert_eq!(d.message, "missing identifier");
    }

    #[test]
    fn json_value_has_every_field() {
        let d = Diagnostic::invalid(",", 7);
        let v = d.to_json_value("main.sk");
        assert_eq!(v["code"], "invalid_token");
        assert_eq!(v["file"], "main.sk");
        assert_eq!(v["line"], 7);
        assert_eq!(v["message"], "invalid token ','");
    }

    #[test]
    fn recovery_error_converts_into_syntax_error() {
        let err: SyntaxError = RecoveryError::StackUnderflow.into();
        assert_eq!(err.to_string(), "context stack underflow");
    }
}
