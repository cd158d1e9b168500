//! Static grammar knowledge used by the recovery search.
//!
//! Three separate tables answer three separate questions:
//! - [`alternatives`]: which contexts are branch points, and their paths;
//! - [`terminals`]: which contexts consume a token, and which token;
//! - [`transitions`]: what follows a context once it has matched.

pub mod alternatives;
pub mod terminals;
pub mod transitions;

use crate::context::GrammarContext as Ctx;
use crate::error::RecoveryError;
use crate::token::SyntaxKind;

pub use alternatives::{alternatives, has_alternative_paths, shortest_alternative};
pub use terminals::{expected_token_kind, is_pass_through, TokenMatcher};
pub use transitions::next_rule;

/// How the search treats a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextClass {
    Terminal(TokenMatcher),
    Keyword(SyntaxKind),
    Ambiguous(&'static [Ctx]),
    PassThrough,
}

pub fn classify(ctx: Ctx) -> Result<ContextClass, RecoveryError> {
    if let Some(paths) = alternatives(ctx) {
        return Ok(ContextClass::Ambiguous(paths));
    }
    if let Some(kw) = terminals::keyword_of(ctx) {
        return Ok(ContextClass::Keyword(kw));
    }
    if let Some(matcher) = terminals::terminal_matcher(ctx) {
        return Ok(ContextClass::Terminal(matcher));
    }
    if is_pass_through(ctx) {
        return Ok(ContextClass::PassThrough);
    }
    Err(RecoveryError::unreachable(ctx, "context is never searched"))
}

/// Every grammar context, in declaration order.
pub const ALL_CONTEXTS: &[Ctx] = &[
    Ctx::CompUnit,
    Ctx::ImportDecl,
    Ctx::FuncDefinition,
    Ctx::ParamList,
    Ctx::TypeDefinition,
    Ctx::RecordTypeDesc,
    Ctx::RecordField,
    Ctx::ConstDecl,
    Ctx::VarDecl,
    Ctx::Block,
    Ctx::IfBlock,
    Ctx::ElseBlock,
    Ctx::WhileBlock,
    Ctx::ReturnStmt,
    Ctx::BreakStmt,
    Ctx::ContinueStmt,
    Ctx::AssignmentStmt,
    Ctx::CallStmt,
    Ctx::ArgList,
    Ctx::BracedExpr,
    Ctx::ObjectTypeDesc,
    Ctx::ObjectField,
    Ctx::ObjectMethod,
    Ctx::NewExpr,
    Ctx::ListConstructor,
    Ctx::MappingConstructor,
    Ctx::MappingField,
    Ctx::QueryExpr,
    Ctx::FromClause,
    Ctx::WhereClause,
    Ctx::LetClause,
    Ctx::SelectClause,
    Ctx::MatchStmt,
    Ctx::MatchClause,
    Ctx::VarBindingPattern,
    Ctx::ListMatchPattern,
    Ctx::MappingMatchPattern,
    Ctx::FieldMatchPattern,
    Ctx::ForeachStmt,
    Ctx::LockStmt,
    Ctx::WorkerDecl,
    Ctx::ForkStmt,
    Ctx::SendStmt,
    Ctx::ReceiveExpr,
    Ctx::WaitExpr,
    Ctx::TemplateExpr,
    Ctx::Interpolation,
    Ctx::Parameter,
    Ctx::VarDeclAfterTypeRef,
    Ctx::TypeDescEnd,
    Ctx::ExpressionEnd,
    Ctx::IfEnd,
    Ctx::TopLevelNode,
    Ctx::TopLevelNodeWithoutMetadata,
    Ctx::TopLevelNodeWithoutModifier,
    Ctx::ImportNameRhs,
    Ctx::ParamStart,
    Ctx::ParamEnd,
    Ctx::ReturnTypeOrBody,
    Ctx::TypeDescriptor,
    Ctx::TypeDescRhs,
    Ctx::RecordFieldOrEnd,
    Ctx::VarDeclTypeStart,
    Ctx::VarDeclRhs,
    Ctx::StatementsOrEnd,
    Ctx::Statement,
    Ctx::StatementStartIdentifierRhs,
    Ctx::ElseOrEnd,
    Ctx::ElseBody,
    Ctx::ReturnRhs,
    Ctx::Expression,
    Ctx::ExpressionRhs,
    Ctx::ArgStart,
    Ctx::ArgEnd,
    Ctx::ObjectMemberOrEnd,
    Ctx::ObjectMember,
    Ctx::MethodDeclRhs,
    Ctx::ListConstructorStart,
    Ctx::ListConstructorEnd,
    Ctx::MappingFieldOrEnd,
    Ctx::MappingFieldEnd,
    Ctx::QueryClauseOrSelect,
    Ctx::MatchClauseOrEnd,
    Ctx::MatchPattern,
    Ctx::MatchPatternRhs,
    Ctx::ListPatternStart,
    Ctx::ListPatternEnd,
    Ctx::MappingPatternStart,
    Ctx::MappingPatternEnd,
    Ctx::WorkerReturnOrBody,
    Ctx::ForkBodyOrEnd,
    Ctx::TemplateMemberOrEnd,
    Ctx::ImportKeyword,
    Ctx::PublicKeyword,
    Ctx::FunctionKeyword,
    Ctx::ReturnsKeyword,
    Ctx::TypeKeyword,
    Ctx::RecordKeyword,
    Ctx::ConstKeyword,
    Ctx::VarKeyword,
    Ctx::IfKeyword,
    Ctx::ElseKeyword,
    Ctx::WhileKeyword,
    Ctx::ReturnKeyword,
    Ctx::BreakKeyword,
    Ctx::ContinueKeyword,
    Ctx::ObjectKeyword,
    Ctx::NewKeyword,
    Ctx::FromKeyword,
    Ctx::InKeyword,
    Ctx::WhereKeyword,
    Ctx::LetKeyword,
    Ctx::SelectKeyword,
    Ctx::MatchKeyword,
    Ctx::ForeachKeyword,
    Ctx::LockKeyword,
    Ctx::WorkerKeyword,
    Ctx::ForkKeyword,
    Ctx::WaitKeyword,
    Ctx::TemplateTypeKeyword,
    Ctx::ImportOrgOrModuleName,
    Ctx::ImportModuleName,
    Ctx::FunctionName,
    Ctx::ParameterName,
    Ctx::TypeName,
    Ctx::FieldName,
    Ctx::ConstName,
    Ctx::VariableName,
    Ctx::TypeReference,
    Ctx::VariableRef,
    Ctx::FieldAccessName,
    Ctx::StatementStartIdentifier,
    Ctx::ClassName,
    Ctx::BindingName,
    Ctx::MappingFieldName,
    Ctx::PatternFieldName,
    Ctx::PatternName,
    Ctx::WorkerName,
    Ctx::PeerWorker,
    Ctx::BuiltinTypeDescriptor,
    Ctx::BasicLiteral,
    Ctx::UnaryOperator,
    Ctx::BinaryOperator,
    Ctx::ConstPattern,
    Ctx::TemplateText,
    Ctx::OpenParenthesis,
    Ctx::CloseParenthesis,
    Ctx::OpenBrace,
    Ctx::CloseBrace,
    Ctx::Semicolon,
    Ctx::Comma,
    Ctx::Slash,
    Ctx::AssignOp,
    Ctx::QuestionMark,
    Ctx::Dot,
    Ctx::OpenBracket,
    Ctx::CloseBracket,
    Ctx::Colon,
    Ctx::Pipe,
    Ctx::RightDoubleArrow,
    Ctx::RightArrow,
    Ctx::LeftArrow,
    Ctx::OpenBacktick,
    Ctx::CloseBacktick,
    Ctx::InterpolationStart,
    Ctx::DocString,
    Ctx::Eof,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_contexts_has_no_duplicates() {
        let set: HashSet<_> = ALL_CONTEXTS.iter().collect();
        assert_eq!(set.len(), ALL_CONTEXTS.len());
    }

    #[test]
    fn every_searched_context_classifies() {
        for ctx in ALL_CONTEXTS {
            let class = classify(*ctx);
            if *ctx == Ctx::ElseBlock {
                assert!(class.is_err());
            } else {
                assert!(class.is_ok(), "{:?}", ctx);
            }
        }
    }

    #[test]
    fn classification_examples() {
        assert_eq!(
            classify(Ctx::Comma).unwrap(),
            ContextClass::Terminal(TokenMatcher::Kind(SyntaxKind::Comma))
        );
        assert_eq!(
            classify(Ctx::WhileKeyword).unwrap(),
            ContextClass::Keyword(SyntaxKind::WhileKeyword)
        );
        assert_eq!(classify(Ctx::ArgList).unwrap(), ContextClass::PassThrough);
        assert!(matches!(
            classify(Ctx::ParamEnd).unwrap(),
            ContextClass::Ambiguous(paths) if paths.len() == 2
        ));
        assert_eq!(
            classify(Ctx::TemplateTypeKeyword).unwrap(),
            ContextClass::Keyword(SyntaxKind::StringKeyword)
        );
        assert_eq!(
            classify(Ctx::ConstPattern).unwrap(),
            ContextClass::Terminal(TokenMatcher::Literal)
        );
        assert_eq!(classify(Ctx::QueryExpr).unwrap(), ContextClass::PassThrough);
        assert!(matches!(
            classify(Ctx::MatchPattern).unwrap(),
            ContextClass::Ambiguous(paths) if paths.len() == 5
        ));
    }
}
