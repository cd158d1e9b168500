use serde::Serialize;

use crate::error::Diagnostic;

/// Kind of a lexed (or synthesised) token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SyntaxKind {
    // Keywords
    ImportKeyword,
    PublicKeyword,
    FunctionKeyword,
    ReturnsKeyword,
    TypeKeyword,
    RecordKeyword,
    ConstKeyword,
    VarKeyword,
    IfKeyword,
    ElseKeyword,
    WhileKeyword,
    ReturnKeyword,
    BreakKeyword,
    ContinueKeyword,
    TrueKeyword,
    FalseKeyword,
    ObjectKeyword,
    NewKeyword,
    FromKeyword,
    InKeyword,
    WhereKeyword,
    LetKeyword,
    SelectKeyword,
    MatchKeyword,
    ForeachKeyword,
    LockKeyword,
    WorkerKeyword,
    ForkKeyword,
    WaitKeyword,
    // Builtin type keywords
    IntKeyword,
    StringKeyword,
    BooleanKeyword,
    FloatKeyword,
    DecimalKeyword,
    AnyKeyword,
    // Punctuation
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    Semicolon,
    Comma,
    Dot,
    Slash,
    Assign,
    QuestionMark,
    OpenBracket,
    CloseBracket,
    Colon,
    Pipe,
    /// `=>`
    RightDoubleArrow,
    /// `->`
    RightArrow,
    /// `<-`
    LeftArrow,
    Backtick,
    /// `${` inside a string template
    InterpolationStart,
    // Operators
    Plus,
    Minus,
    Asterisk,
    Percent,
    DoubleEqual,
    NotEqual,
    Lt,
    Lte,
    Gt,
    Gte,
    LogicalAnd,
    LogicalOr,
    Exclamation,
    // Literals and names
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    /// Literal text between the backticks of a string template
    TemplateString,
    /// `# ...` line; carries the text after the hash
    DocumentationString,
    /// A character the lexer could not classify
    Invalid,
    Eof,
    /// No token; used by solutions over contexts that expect nothing
    None,
}

impl SyntaxKind {
    /// Keyword lookup for an identifier-shaped word.
    pub fn keyword(word: &str) -> Option<SyntaxKind> {
        let kind = match word {
            "import" => SyntaxKind::ImportKeyword,
            "public" => SyntaxKind::PublicKeyword,
            "function" => SyntaxKind::FunctionKeyword,
            "returns" => SyntaxKind::ReturnsKeyword,
            "type" => SyntaxKind::TypeKeyword,
            "record" => SyntaxKind::RecordKeyword,
            "const" => SyntaxKind::ConstKeyword,
            "var" => SyntaxKind::VarKeyword,
            "if" => SyntaxKind::IfKeyword,
            "else" => SyntaxKind::ElseKeyword,
            "while" => SyntaxKind::WhileKeyword,
            "return" => SyntaxKind::ReturnKeyword,
            "break" => SyntaxKind::BreakKeyword,
            "continue" => SyntaxKind::ContinueKeyword,
            "true" => SyntaxKind::TrueKeyword,
            "false" => SyntaxKind::FalseKeyword,
            "object" => SyntaxKind::ObjectKeyword,
            "new" => SyntaxKind::NewKeyword,
            "from" => SyntaxKind::FromKeyword,
            "in" => SyntaxKind::InKeyword,
            "where" => SyntaxKind::WhereKeyword,
            "let" => SyntaxKind::LetKeyword,
            "select" => SyntaxKind::SelectKeyword,
            "match" => SyntaxKind::MatchKeyword,
            "foreach" => SyntaxKind::ForeachKeyword,
            "lock" => SyntaxKind::LockKeyword,
            "worker" => SyntaxKind::WorkerKeyword,
            "fork" => SyntaxKind::ForkKeyword,
            "wait" => SyntaxKind::WaitKeyword,
            "int" => SyntaxKind::IntKeyword,
            "string" => SyntaxKind::StringKeyword,
            "boolean" => SyntaxKind::BooleanKeyword,
            "float" => SyntaxKind::FloatKeyword,
            "decimal" => SyntaxKind::DecimalKeyword,
            "any" => SyntaxKind::AnyKeyword,
            _ => return None,
        };
        Some(kind)
    }

    /// Source text of fixed-text tokens; empty for names, literals and markers.
    pub fn text(self) -> &'static str {
        match self {
            SyntaxKind::ImportKeyword => "import",
            SyntaxKind::PublicKeyword => "public",
            SyntaxKind::FunctionKeyword => "function",
            SyntaxKind::ReturnsKeyword => "returns",
            SyntaxKind::TypeKeyword => "type",
            SyntaxKind::RecordKeyword => "record",
            SyntaxKind::ConstKeyword => "const",
            SyntaxKind::VarKeyword => "var",
            SyntaxKind::IfKeyword => "if",
            SyntaxKind::ElseKeyword => "else",
            SyntaxKind::WhileKeyword => "while",
            SyntaxKind::ReturnKeyword => "return",
            SyntaxKind::BreakKeyword => "break",
            SyntaxKind::ContinueKeyword => "continue",
            SyntaxKind::TrueKeyword => "true",
            SyntaxKind::FalseKeyword => "false",
            SyntaxKind::ObjectKeyword => "object",
            SyntaxKind::NewKeyword => "new",
            SyntaxKind::FromKeyword => "from",
            SyntaxKind::InKeyword => "in",
            SyntaxKind::WhereKeyword => "where",
            SyntaxKind::LetKeyword => "let",
            SyntaxKind::SelectKeyword => "select",
            SyntaxKind::MatchKeyword => "match",
            SyntaxKind::ForeachKeyword => "foreach",
            SyntaxKind::LockKeyword => "lock",
            SyntaxKind::WorkerKeyword => "worker",
            SyntaxKind::ForkKeyword => "fork",
            SyntaxKind::WaitKeyword => "wait",
            SyntaxKind::IntKeyword => "int",
            SyntaxKind::StringKeyword => "string",
            SyntaxKind::BooleanKeyword => "boolean",
            SyntaxKind::FloatKeyword => "float",
            SyntaxKind::DecimalKeyword => "decimal",
            SyntaxKind::AnyKeyword => "any",
            SyntaxKind::OpenParen => "(",
            SyntaxKind::CloseParen => ")",
            SyntaxKind::OpenBrace => "{",
            SyntaxKind::CloseBrace => "}",
            SyntaxKind::Semicolon => ";",
            SyntaxKind::Comma => ",",
            SyntaxKind::Dot => ".",
            SyntaxKind::Slash => "/",
            SyntaxKind::Assign => "=",
            SyntaxKind::QuestionMark => "?",
            SyntaxKind::OpenBracket => "[",
            SyntaxKind::CloseBracket => "]",
            SyntaxKind::Colon => ":",
            SyntaxKind::Pipe => "|",
            SyntaxKind::RightDoubleArrow => "=>",
            SyntaxKind::RightArrow => "->",
            SyntaxKind::LeftArrow => "<-",
            SyntaxKind::Backtick => "`",
            SyntaxKind::InterpolationStart => "${",
            SyntaxKind::Plus => "+",
            SyntaxKind::Minus => "-",
            SyntaxKind::Asterisk => "*",
            SyntaxKind::Percent => "%",
            SyntaxKind::DoubleEqual => "==",
            SyntaxKind::NotEqual => "!=",
            SyntaxKind::Lt => "<",
            SyntaxKind::Lte => "<=",
            SyntaxKind::Gt => ">",
            SyntaxKind::Gte => ">=",
            SyntaxKind::LogicalAnd => "&&",
            SyntaxKind::LogicalOr => "||",
            SyntaxKind::Exclamation => "!",
            _ => "",
        }
    }

    pub fn is_keyword(self) -> bool {
        !self.text().is_empty() && self.text().chars().all(|c| c.is_ascii_alphabetic())
    }

    pub fn is_builtin_type(self) -> bool {
        matches!(
            self,
            SyntaxKind::IntKeyword
                | SyntaxKind::StringKeyword
                | SyntaxKind::BooleanKeyword
                | SyntaxKind::FloatKeyword
                | SyntaxKind::DecimalKeyword
                | SyntaxKind::AnyKeyword
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::IntLiteral
                | SyntaxKind::FloatLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::TrueKeyword
                | SyntaxKind::FalseKeyword
        )
    }

    /// Punctuation that separates list elements or statements.
    pub fn is_separator(self) -> bool {
        matches!(self, SyntaxKind::Comma | SyntaxKind::Semicolon)
    }

    pub fn is_unary_operator(self) -> bool {
        matches!(self, SyntaxKind::Minus | SyntaxKind::Exclamation)
    }

    /// Binding power of a binary operator; `None` for anything else.
    pub fn binary_precedence(self) -> Option<u8> {
        let prec = match self {
            SyntaxKind::LogicalOr => 1,
            SyntaxKind::LogicalAnd => 2,
            SyntaxKind::DoubleEqual | SyntaxKind::NotEqual => 3,
            SyntaxKind::Lt | SyntaxKind::Lte | SyntaxKind::Gt | SyntaxKind::Gte => 4,
            SyntaxKind::Plus | SyntaxKind::Minus => 5,
            SyntaxKind::Asterisk | SyntaxKind::Slash | SyntaxKind::Percent => 6,
            _ => return None,
        };
        Some(prec)
    }

    pub fn is_binary_operator(self) -> bool {
        self.binary_precedence().is_some()
    }
}

/// A token with its source line and any diagnostics attached during recovery.
///
/// Tokens removed by recovery are not dropped: they ride along as
/// `invalid_leading` on the next real token so the tree keeps every byte.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: SyntaxKind,
    pub text: String,
    pub line: u32,
    /// Zero-width token synthesised by recovery
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub missing: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid_leading: Vec<Token>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl Token {
    pub fn new(kind: SyntaxKind, text: impl Into<String>, line: u32) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
            missing: false,
            invalid_leading: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn missing(kind: SyntaxKind, line: u32, diagnostic: Diagnostic) -> Self {
        Token {
            kind,
            text: String::new(),
            line,
            missing: true,
            invalid_leading: Vec::new(),
            diagnostics: vec![diagnostic],
        }
    }

    pub fn eof(line: u32) -> Self {
        Token::new(SyntaxKind::Eof, "", line)
    }

    pub fn is_missing(&self) -> bool {
        self.missing
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            SyntaxKind::Eof => write!(f, "<EOF>"),
            _ if self.missing => write!(f, "<missing {:?}>", self.kind),
            _ => write!(f, "{}", self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_round_trips_through_text() {
        for word in ["import", "function", "returns", "while", "int", "any", "from", "worker"] {
            let kind = SyntaxKind::keyword(word).expect("keyword");
            assert_eq!(kind.text(), word);
            assert!(kind.is_keyword());
        }
        assert_eq!(SyntaxKind::keyword("functon"), None);
    }

    #[test]
    fn punctuation_is_not_a_keyword() {
        assert!(!SyntaxKind::OpenParen.is_keyword());
        assert!(!SyntaxKind::Identifier.is_keyword());
        assert!(!SyntaxKind::LogicalAnd.is_keyword());
        assert!(!SyntaxKind::RightDoubleArrow.is_keyword());
        assert!(!SyntaxKind::TemplateString.is_keyword());
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        let mul = SyntaxKind::Asterisk.binary_precedence().unwrap();
        let add = SyntaxKind::Plus.binary_precedence().unwrap();
        let or = SyntaxKind::LogicalOr.binary_precedence().unwrap();
        assert!(mul > add && add > or);
        assert_eq!(SyntaxKind::Assign.binary_precedence(), None);
    }
}
