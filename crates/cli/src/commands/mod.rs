pub(crate) mod check;
pub(crate) mod test;
pub(crate) mod tree;

use skein_syntax::{Diagnostic, DiagnosticCode};

/// `line: code: message`, the text form shared by `check` and the suite runner.
pub(crate) fn render_diagnostic(d: &Diagnostic) -> String {
    let code = match d.code {
        DiagnosticCode::MissingToken => "missing_token",
        DiagnosticCode::InvalidToken => "invalid_token",
    };
    format!("{}: {}: {}", d.line, code, d.message)
}
