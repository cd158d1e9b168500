//! Branch points of the grammar and their ordered continuations.
//!
//! Order matters: it is the final tie-break between equally good search
//! results. Completion walks [`shortest_alternative`], which is the first
//! entry unless a branch point can simply stop.

use crate::context::GrammarContext as Ctx;

// Documentation only ever arrives as a real token, so it is not a path.
const TOP_LEVEL_NODE: &[Ctx] = &[
    Ctx::Eof,
    Ctx::ImportDecl,
    Ctx::TopLevelNodeWithoutMetadata,
];

const TOP_LEVEL_NODE_WITHOUT_METADATA: &[Ctx] =
    &[Ctx::PublicKeyword, Ctx::TopLevelNodeWithoutModifier];

const TOP_LEVEL_NODE_WITHOUT_MODIFIER: &[Ctx] = &[
    Ctx::FuncDefinition,
    Ctx::TypeDefinition,
    Ctx::ConstDecl,
    Ctx::VarDecl,
];

const IMPORT_NAME_RHS: &[Ctx] = &[Ctx::Semicolon, Ctx::Slash];

const PARAM_START: &[Ctx] = &[Ctx::CloseParenthesis, Ctx::Parameter];

const PARAM_END: &[Ctx] = &[Ctx::CloseParenthesis, Ctx::Comma];

const RETURN_TYPE_OR_BODY: &[Ctx] = &[Ctx::Block, Ctx::ReturnsKeyword];

const TYPE_DESCRIPTOR: &[Ctx] = &[
    Ctx::TypeReference,
    Ctx::BuiltinTypeDescriptor,
    Ctx::RecordTypeDesc,
    Ctx::ObjectTypeDesc,
];

const TYPE_DESC_RHS: &[Ctx] = &[Ctx::QuestionMark, Ctx::TypeDescEnd];

const RECORD_FIELD_OR_END: &[Ctx] = &[Ctx::CloseBrace, Ctx::RecordField];

const VAR_DECL_TYPE_START: &[Ctx] = &[Ctx::VarKeyword, Ctx::TypeDescriptor];

const VAR_DECL_RHS: &[Ctx] = &[Ctx::Semicolon, Ctx::AssignOp];

const STATEMENTS_OR_END: &[Ctx] = &[Ctx::CloseBrace, Ctx::Statement];

const STATEMENT: &[Ctx] = &[
    Ctx::StatementStartIdentifier,
    Ctx::VarDecl,
    Ctx::IfBlock,
    Ctx::WhileBlock,
    Ctx::ReturnStmt,
    Ctx::BreakStmt,
    Ctx::ContinueStmt,
    Ctx::MatchStmt,
    Ctx::ForeachStmt,
    Ctx::LockStmt,
    Ctx::WorkerDecl,
    Ctx::ForkStmt,
    Ctx::Block,
];

const STATEMENT_START_IDENTIFIER_RHS: &[Ctx] = &[
    Ctx::AssignmentStmt,
    Ctx::CallStmt,
    Ctx::VarDeclAfterTypeRef,
    Ctx::SendStmt,
];

const ELSE_OR_END: &[Ctx] = &[Ctx::ElseKeyword, Ctx::IfEnd];

const ELSE_BODY: &[Ctx] = &[Ctx::Block, Ctx::IfBlock];

const RETURN_RHS: &[Ctx] = &[Ctx::Semicolon, Ctx::Expression];

const EXPRESSION: &[Ctx] = &[
    Ctx::VariableRef,
    Ctx::BasicLiteral,
    Ctx::BracedExpr,
    Ctx::UnaryOperator,
    Ctx::ListConstructor,
    Ctx::MappingConstructor,
    Ctx::NewExpr,
    Ctx::QueryExpr,
    Ctx::ReceiveExpr,
    Ctx::WaitExpr,
    Ctx::TemplateExpr,
];

const EXPRESSION_RHS: &[Ctx] = &[
    Ctx::BinaryOperator,
    Ctx::Dot,
    Ctx::ArgList,
    Ctx::ExpressionEnd,
];

const ARG_START: &[Ctx] = &[Ctx::CloseParenthesis, Ctx::Expression];

const ARG_END: &[Ctx] = &[Ctx::CloseParenthesis, Ctx::Comma];

const OBJECT_MEMBER_OR_END: &[Ctx] = &[Ctx::CloseBrace, Ctx::ObjectMember];

const OBJECT_MEMBER: &[Ctx] = &[Ctx::ObjectMethod, Ctx::ObjectField];

const METHOD_DECL_RHS: &[Ctx] = &[Ctx::Semicolon, Ctx::ReturnsKeyword];

const LIST_CONSTRUCTOR_START: &[Ctx] = &[Ctx::CloseBracket, Ctx::Expression];

const LIST_CONSTRUCTOR_END: &[Ctx] = &[Ctx::CloseBracket, Ctx::Comma];

const MAPPING_FIELD_OR_END: &[Ctx] = &[Ctx::CloseBrace, Ctx::MappingField];

const MAPPING_FIELD_END: &[Ctx] = &[Ctx::CloseBrace, Ctx::Comma];

const QUERY_CLAUSE_OR_SELECT: &[Ctx] = &[
    Ctx::SelectClause,
    Ctx::WhereClause,
    Ctx::LetClause,
    Ctx::FromClause,
];

const MATCH_CLAUSE_OR_END: &[Ctx] = &[Ctx::CloseBrace, Ctx::MatchClause];

const MATCH_PATTERN: &[Ctx] = &[
    Ctx::PatternName,
    Ctx::ConstPattern,
    Ctx::VarBindingPattern,
    Ctx::ListMatchPattern,
    Ctx::MappingMatchPattern,
];

const MATCH_PATTERN_RHS: &[Ctx] = &[Ctx::RightDoubleArrow, Ctx::Pipe];

const LIST_PATTERN_START: &[Ctx] = &[Ctx::CloseBracket, Ctx::MatchPattern];

const LIST_PATTERN_END: &[Ctx] = &[Ctx::CloseBracket, Ctx::Comma];

const MAPPING_PATTERN_START: &[Ctx] = &[Ctx::CloseBrace, Ctx::FieldMatchPattern];

const MAPPING_PATTERN_END: &[Ctx] = &[Ctx::CloseBrace, Ctx::Comma];

const WORKER_RETURN_OR_BODY: &[Ctx] = &[Ctx::Block, Ctx::ReturnsKeyword];

const FORK_BODY_OR_END: &[Ctx] = &[Ctx::CloseBrace, Ctx::WorkerDecl];

const TEMPLATE_MEMBER_OR_END: &[Ctx] = &[
    Ctx::CloseBacktick,
    Ctx::TemplateText,
    Ctx::Interpolation,
];

/// Continuations of a branch point, or `None` if `ctx` is deterministic.
pub fn alternatives(ctx: Ctx) -> Option<&'static [Ctx]> {
    let paths = match ctx {
        Ctx::TopLevelNode => TOP_LEVEL_NODE,
        Ctx::TopLevelNodeWithoutMetadata => TOP_LEVEL_NODE_WITHOUT_METADATA,
        Ctx::TopLevelNodeWithoutModifier => TOP_LEVEL_NODE_WITHOUT_MODIFIER,
        Ctx::ImportNameRhs => IMPORT_NAME_RHS,
        Ctx::ParamStart => PARAM_START,
        Ctx::ParamEnd => PARAM_END,
        Ctx::ReturnTypeOrBody => RETURN_TYPE_OR_BODY,
        Ctx::TypeDescriptor => TYPE_DESCRIPTOR,
        Ctx::TypeDescRhs => TYPE_DESC_RHS,
        Ctx::RecordFieldOrEnd => RECORD_FIELD_OR_END,
        Ctx::VarDeclTypeStart => VAR_DECL_TYPE_START,
        Ctx::VarDeclRhs => VAR_DECL_RHS,
        Ctx::StatementsOrEnd => STATEMENTS_OR_END,
        Ctx::Statement => STATEMENT,
        Ctx::StatementStartIdentifierRhs => STATEMENT_START_IDENTIFIER_RHS,
        Ctx::ElseOrEnd => ELSE_OR_END,
        Ctx::ElseBody => ELSE_BODY,
        Ctx::ReturnRhs => RETURN_RHS,
        Ctx::Expression => EXPRESSION,
        Ctx::ExpressionRhs => EXPRESSION_RHS,
        Ctx::ArgStart => ARG_START,
        Ctx::ArgEnd => ARG_END,
        Ctx::ObjectMemberOrEnd => OBJECT_MEMBER_OR_END,
        Ctx::ObjectMember => OBJECT_MEMBER,
        Ctx::MethodDeclRhs => METHOD_DECL_RHS,
        Ctx::ListConstructorStart => LIST_CONSTRUCTOR_START,
        Ctx::ListConstructorEnd => LIST_CONSTRUCTOR_END,
        Ctx::MappingFieldOrEnd => MAPPING_FIELD_OR_END,
        Ctx::MappingFieldEnd => MAPPING_FIELD_END,
        Ctx::QueryClauseOrSelect => QUERY_CLAUSE_OR_SELECT,
        Ctx::MatchClauseOrEnd => MATCH_CLAUSE_OR_END,
        Ctx::MatchPattern => MATCH_PATTERN,
        Ctx::MatchPatternRhs => MATCH_PATTERN_RHS,
        Ctx::ListPatternStart => LIST_PATTERN_START,
        Ctx::ListPatternEnd => LIST_PATTERN_END,
        Ctx::MappingPatternStart => MAPPING_PATTERN_START,
        Ctx::MappingPatternEnd => MAPPING_PATTERN_END,
        Ctx::WorkerReturnOrBody => WORKER_RETURN_OR_BODY,
        Ctx::ForkBodyOrEnd => FORK_BODY_OR_END,
        Ctx::TemplateMemberOrEnd => TEMPLATE_MEMBER_OR_END,
        _ => return None,
    };
    Some(paths)
}

/// The continuation that finishes a branch point with the fewest tokens.
///
/// Operator tails, `?` and `else` are optional, so their branch points stop
/// rather than take the first listed path.
pub fn shortest_alternative(ctx: Ctx) -> Option<Ctx> {
    match ctx {
        Ctx::ExpressionRhs => Some(Ctx::ExpressionEnd),
        Ctx::TypeDescRhs => Some(Ctx::TypeDescEnd),
        Ctx::ElseOrEnd => Some(Ctx::IfEnd),
        _ => alternatives(ctx).map(|paths| paths[0]),
    }
}

pub fn has_alternative_paths(ctx: Ctx) -> bool {
    alternatives(ctx).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_branch_point_has_at_least_two_paths() {
        for ctx in crate::grammar::ALL_CONTEXTS {
            if let Some(paths) = alternatives(*ctx) {
                assert!(paths.len() >= 2, "{:?} is not a branch point", ctx);
                assert!(!paths.contains(ctx), "{:?} lists itself", ctx);
            }
        }
    }

    #[test]
    fn list_ends_prefer_closing() {
        assert_eq!(alternatives(Ctx::ParamEnd).unwrap()[0], Ctx::CloseParenthesis);
        assert_eq!(alternatives(Ctx::ArgEnd).unwrap()[0], Ctx::CloseParenthesis);
        assert_eq!(alternatives(Ctx::StatementsOrEnd).unwrap()[0], Ctx::CloseBrace);
        assert_eq!(alternatives(Ctx::VarDeclRhs).unwrap()[0], Ctx::Semicolon);
        assert_eq!(alternatives(Ctx::ListConstructorEnd).unwrap()[0], Ctx::CloseBracket);
        assert_eq!(alternatives(Ctx::MatchClauseOrEnd).unwrap()[0], Ctx::CloseBrace);
        assert_eq!(alternatives(Ctx::TemplateMemberOrEnd).unwrap()[0], Ctx::CloseBacktick);
    }

    #[test]
    fn shortest_alternative_stops_at_optional_tails() {
        assert_eq!(shortest_alternative(Ctx::ExpressionRhs), Some(Ctx::ExpressionEnd));
        assert_eq!(shortest_alternative(Ctx::TypeDescRhs), Some(Ctx::TypeDescEnd));
        assert_eq!(shortest_alternative(Ctx::ElseOrEnd), Some(Ctx::IfEnd));
        assert_eq!(shortest_alternative(Ctx::ArgEnd), Some(Ctx::CloseParenthesis));
        assert_eq!(shortest_alternative(Ctx::Statement), Some(Ctx::StatementStartIdentifier));
        assert_eq!(shortest_alternative(Ctx::Semicolon), None);
    }

    #[test]
    fn documentation_is_not_a_top_level_path() {
        assert!(!alternatives(Ctx::TopLevelNode).unwrap().contains(&Ctx::DocString));
    }

    #[test]
    fn deterministic_contexts_have_no_table_entry() {
        assert!(!has_alternative_paths(Ctx::Semicolon));
        assert!(!has_alternative_paths(Ctx::FuncDefinition));
        assert!(has_alternative_paths(Ctx::Expression));
    }
}
