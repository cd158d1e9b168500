//! Token-level classification of grammar contexts.

use crate::context::GrammarContext as Ctx;
use crate::token::{SyntaxKind, Token};

/// What a terminal context accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMatcher {
    Kind(SyntaxKind),
    BuiltinType,
    Literal,
    UnaryOperator,
    BinaryOperator,
}

impl TokenMatcher {
    pub fn matches(self, token: &Token) -> bool {
        match self {
            TokenMatcher::Kind(kind) => token.kind == kind,
            TokenMatcher::BuiltinType => token.kind.is_builtin_type(),
            TokenMatcher::Literal => token.kind.is_literal(),
            TokenMatcher::UnaryOperator => token.kind.is_unary_operator(),
            TokenMatcher::BinaryOperator => token.kind.is_binary_operator(),
        }
    }
}

/// Non-keyword contexts that consume exactly one token.
pub fn terminal_matcher(ctx: Ctx) -> Option<TokenMatcher> {
    let kind = match ctx {
        Ctx::ImportOrgOrModuleName
        | Ctx::ImportModuleName
        | Ctx::FunctionName
        | Ctx::ParameterName
        | Ctx::TypeName
        | Ctx::FieldName
        | Ctx::ConstName
        | Ctx::VariableName
        | Ctx::TypeReference
        | Ctx::VariableRef
        | Ctx::FieldAccessName
        | Ctx::StatementStartIdentifier
        | Ctx::ClassName
        | Ctx::BindingName
        | Ctx::MappingFieldName
        | Ctx::PatternFieldName
        | Ctx::PatternName
        | Ctx::WorkerName
        | Ctx::PeerWorker => SyntaxKind::Identifier,
        Ctx::OpenParenthesis => SyntaxKind::OpenParen,
        Ctx::CloseParenthesis => SyntaxKind::CloseParen,
        Ctx::OpenBrace => SyntaxKind::OpenBrace,
        Ctx::CloseBrace => SyntaxKind::CloseBrace,
        Ctx::Semicolon => SyntaxKind::Semicolon,
        Ctx::Comma => SyntaxKind::Comma,
        Ctx::Slash => SyntaxKind::Slash,
        Ctx::AssignOp => SyntaxKind::Assign,
        Ctx::QuestionMark => SyntaxKind::QuestionMark,
        Ctx::Dot => SyntaxKind::Dot,
        Ctx::OpenBracket => SyntaxKind::OpenBracket,
        Ctx::CloseBracket => SyntaxKind::CloseBracket,
        Ctx::Colon => SyntaxKind::Colon,
        Ctx::Pipe => SyntaxKind::Pipe,
        Ctx::RightDoubleArrow => SyntaxKind::RightDoubleArrow,
        Ctx::RightArrow => SyntaxKind::RightArrow,
        Ctx::LeftArrow => SyntaxKind::LeftArrow,
        Ctx::OpenBacktick | Ctx::CloseBacktick => SyntaxKind::Backtick,
        Ctx::InterpolationStart => SyntaxKind::InterpolationStart,
        Ctx::TemplateText => SyntaxKind::TemplateString,
        Ctx::DocString => SyntaxKind::DocumentationString,
        Ctx::Eof => SyntaxKind::Eof,
        Ctx::BuiltinTypeDescriptor => return Some(TokenMatcher::BuiltinType),
        Ctx::BasicLiteral | Ctx::ConstPattern => return Some(TokenMatcher::Literal),
        Ctx::UnaryOperator => return Some(TokenMatcher::UnaryOperator),
        Ctx::BinaryOperator => return Some(TokenMatcher::BinaryOperator),
        _ => return None,
    };
    Some(TokenMatcher::Kind(kind))
}

/// Contexts that expect a specific keyword.
pub fn keyword_of(ctx: Ctx) -> Option<SyntaxKind> {
    let kind = match ctx {
        Ctx::ImportKeyword => SyntaxKind::ImportKeyword,
        Ctx::PublicKeyword => SyntaxKind::PublicKeyword,
        Ctx::FunctionKeyword => SyntaxKind::FunctionKeyword,
        Ctx::ReturnsKeyword => SyntaxKind::ReturnsKeyword,
        Ctx::TypeKeyword => SyntaxKind::TypeKeyword,
        Ctx::RecordKeyword => SyntaxKind::RecordKeyword,
        Ctx::ConstKeyword => SyntaxKind::ConstKeyword,
        Ctx::VarKeyword => SyntaxKind::VarKeyword,
        Ctx::IfKeyword => SyntaxKind::IfKeyword,
        Ctx::ElseKeyword => SyntaxKind::ElseKeyword,
        Ctx::WhileKeyword => SyntaxKind::WhileKeyword,
        Ctx::ReturnKeyword => SyntaxKind::ReturnKeyword,
        Ctx::BreakKeyword => SyntaxKind::BreakKeyword,
        Ctx::ContinueKeyword => SyntaxKind::ContinueKeyword,
        Ctx::ObjectKeyword => SyntaxKind::ObjectKeyword,
        Ctx::NewKeyword => SyntaxKind::NewKeyword,
        Ctx::FromKeyword => SyntaxKind::FromKeyword,
        Ctx::InKeyword => SyntaxKind::InKeyword,
        Ctx::WhereKeyword => SyntaxKind::WhereKeyword,
        Ctx::LetKeyword => SyntaxKind::LetKeyword,
        Ctx::SelectKeyword => SyntaxKind::SelectKeyword,
        Ctx::MatchKeyword => SyntaxKind::MatchKeyword,
        Ctx::ForeachKeyword => SyntaxKind::ForeachKeyword,
        Ctx::LockKeyword => SyntaxKind::LockKeyword,
        Ctx::WorkerKeyword => SyntaxKind::WorkerKeyword,
        Ctx::ForkKeyword => SyntaxKind::ForkKeyword,
        Ctx::WaitKeyword => SyntaxKind::WaitKeyword,
        Ctx::TemplateTypeKeyword => SyntaxKind::StringKeyword,
        _ => return None,
    };
    Some(kind)
}

/// Keyword match that also accepts an identifier spelled like the keyword,
/// as produced by readers that do not reserve contextual keywords.
pub fn matches_keyword(keyword: SyntaxKind, token: &Token) -> bool {
    token.kind == keyword || (token.kind == SyntaxKind::Identifier && token.text == keyword.text())
}

/// Whether `token` satisfies a terminal or keyword context.
pub fn accepts_token(ctx: Ctx, token: &Token) -> bool {
    if let Some(kw) = keyword_of(ctx) {
        return matches_keyword(kw, token);
    }
    terminal_matcher(ctx).map_or(false, |m| m.matches(token))
}

/// Contexts that consume no token and only move the automaton.
pub fn is_pass_through(ctx: Ctx) -> bool {
    matches!(
        ctx,
        Ctx::CompUnit
            | Ctx::ImportDecl
            | Ctx::FuncDefinition
            | Ctx::ParamList
            | Ctx::TypeDefinition
            | Ctx::RecordTypeDesc
            | Ctx::RecordField
            | Ctx::ConstDecl
            | Ctx::VarDecl
            | Ctx::Block
            | Ctx::IfBlock
            | Ctx::WhileBlock
            | Ctx::ReturnStmt
            | Ctx::BreakStmt
            | Ctx::ContinueStmt
            | Ctx::AssignmentStmt
            | Ctx::CallStmt
            | Ctx::ArgList
            | Ctx::BracedExpr
            | Ctx::ObjectTypeDesc
            | Ctx::ObjectField
            | Ctx::ObjectMethod
            | Ctx::NewExpr
            | Ctx::ListConstructor
            | Ctx::MappingConstructor
            | Ctx::MappingField
            | Ctx::QueryExpr
            | Ctx::FromClause
            | Ctx::WhereClause
            | Ctx::LetClause
            | Ctx::SelectClause
            | Ctx::MatchStmt
            | Ctx::MatchClause
            | Ctx::VarBindingPattern
            | Ctx::ListMatchPattern
            | Ctx::MappingMatchPattern
            | Ctx::FieldMatchPattern
            | Ctx::ForeachStmt
            | Ctx::LockStmt
            | Ctx::WorkerDecl
            | Ctx::ForkStmt
            | Ctx::SendStmt
            | Ctx::ReceiveExpr
            | Ctx::WaitExpr
            | Ctx::TemplateExpr
            | Ctx::Interpolation
            | Ctx::Parameter
            | Ctx::VarDeclAfterTypeRef
            | Ctx::TypeDescEnd
            | Ctx::ExpressionEnd
            | Ctx::IfEnd
    )
}

/// The token a recovery would synthesise for `ctx`.
///
/// Branch points and production entries resolve to the first token of their
/// shortest continuation; positions with no token of their own return
/// `SyntaxKind::None`.
pub fn expected_token_kind(ctx: Ctx) -> SyntaxKind {
    // Documentation is never synthesised.
    if ctx == Ctx::DocString {
        return SyntaxKind::None;
    }
    if let Some(kind) = keyword_of(ctx) {
        return kind;
    }
    if let Some(matcher) = terminal_matcher(ctx) {
        return match matcher {
            TokenMatcher::Kind(kind) => kind,
            TokenMatcher::BuiltinType => SyntaxKind::IntKeyword,
            TokenMatcher::Literal => SyntaxKind::IntLiteral,
            TokenMatcher::UnaryOperator => SyntaxKind::Minus,
            TokenMatcher::BinaryOperator => SyntaxKind::Plus,
        };
    }
    if let Some(path) = super::alternatives::shortest_alternative(ctx) {
        return expected_token_kind(path);
    }
    match ctx {
        Ctx::ImportDecl => SyntaxKind::ImportKeyword,
        Ctx::FuncDefinition => SyntaxKind::FunctionKeyword,
        Ctx::TypeDefinition => SyntaxKind::TypeKeyword,
        Ctx::RecordTypeDesc => SyntaxKind::RecordKeyword,
        Ctx::ConstDecl => SyntaxKind::ConstKeyword,
        Ctx::IfBlock => SyntaxKind::IfKeyword,
        Ctx::WhileBlock => SyntaxKind::WhileKeyword,
        Ctx::ReturnStmt => SyntaxKind::ReturnKeyword,
        Ctx::BreakStmt => SyntaxKind::BreakKeyword,
        Ctx::ContinueStmt => SyntaxKind::ContinueKeyword,
        Ctx::AssignmentStmt => SyntaxKind::Assign,
        Ctx::Block => SyntaxKind::OpenBrace,
        Ctx::ParamList | Ctx::CallStmt | Ctx::ArgList | Ctx::BracedExpr => SyntaxKind::OpenParen,
        Ctx::VarDecl => expected_token_kind(Ctx::VarDeclTypeStart),
        Ctx::RecordField | Ctx::Parameter => expected_token_kind(Ctx::TypeDescriptor),
        Ctx::VarDeclAfterTypeRef => SyntaxKind::Identifier,
        Ctx::ObjectTypeDesc => SyntaxKind::ObjectKeyword,
        Ctx::ObjectMethod => SyntaxKind::FunctionKeyword,
        Ctx::ObjectField => expected_token_kind(Ctx::TypeDescriptor),
        Ctx::NewExpr => SyntaxKind::NewKeyword,
        Ctx::ListConstructor | Ctx::ListMatchPattern => SyntaxKind::OpenBracket,
        Ctx::MappingConstructor | Ctx::MappingMatchPattern => SyntaxKind::OpenBrace,
        Ctx::MappingField | Ctx::FieldMatchPattern => SyntaxKind::Identifier,
        Ctx::QueryExpr | Ctx::FromClause => SyntaxKind::FromKeyword,
        Ctx::WhereClause => SyntaxKind::WhereKeyword,
        Ctx::LetClause => SyntaxKind::LetKeyword,
        Ctx::SelectClause => SyntaxKind::SelectKeyword,
        Ctx::MatchStmt => SyntaxKind::MatchKeyword,
        Ctx::MatchClause => expected_token_kind(Ctx::MatchPattern),
        Ctx::VarBindingPattern => SyntaxKind::VarKeyword,
        Ctx::ForeachStmt => SyntaxKind::ForeachKeyword,
        Ctx::LockStmt => SyntaxKind::LockKeyword,
        Ctx::WorkerDecl => SyntaxKind::WorkerKeyword,
        Ctx::ForkStmt => SyntaxKind::ForkKeyword,
        Ctx::SendStmt => SyntaxKind::RightArrow,
        Ctx::ReceiveExpr => SyntaxKind::LeftArrow,
        Ctx::WaitExpr => SyntaxKind::WaitKeyword,
        Ctx::TemplateExpr => SyntaxKind::StringKeyword,
        Ctx::Interpolation => SyntaxKind::InterpolationStart,
        _ => SyntaxKind::None,
    }
}
