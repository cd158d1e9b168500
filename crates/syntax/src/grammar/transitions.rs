//! The grammar transition function.
//!
//! `next_rule` maps the context that just matched to the context to try
//! next, pushing, popping or switching productions on the stack as the
//! parser would. Where the successor depends on where the production is
//! nested, the enclosing production (top of stack) decides.

use crate::context::{ContextStack, GrammarContext as Ctx};
use crate::error::RecoveryError;

pub fn next_rule(ctx: Ctx, stack: &mut ContextStack) -> Result<Ctx, RecoveryError> {
    let next = match ctx {
        // Production entries push themselves and move to their first token.
        Ctx::CompUnit => start(stack, ctx, Ctx::TopLevelNode),
        Ctx::ImportDecl => start(stack, ctx, Ctx::ImportKeyword),
        Ctx::FuncDefinition => start(stack, ctx, Ctx::FunctionKeyword),
        Ctx::ParamList => start(stack, ctx, Ctx::OpenParenthesis),
        Ctx::TypeDefinition => start(stack, ctx, Ctx::TypeKeyword),
        Ctx::RecordTypeDesc => start(stack, ctx, Ctx::RecordKeyword),
        Ctx::RecordField => start(stack, ctx, Ctx::TypeDescriptor),
        Ctx::ConstDecl => start(stack, ctx, Ctx::ConstKeyword),
        Ctx::VarDecl => start(stack, ctx, Ctx::VarDeclTypeStart),
        Ctx::Block => start(stack, ctx, Ctx::OpenBrace),
        Ctx::IfBlock => start(stack, ctx, Ctx::IfKeyword),
        Ctx::WhileBlock => start(stack, ctx, Ctx::WhileKeyword),
        Ctx::ReturnStmt => start(stack, ctx, Ctx::ReturnKeyword),
        Ctx::BreakStmt => start(stack, ctx, Ctx::BreakKeyword),
        Ctx::ContinueStmt => start(stack, ctx, Ctx::ContinueKeyword),
        Ctx::AssignmentStmt => start(stack, ctx, Ctx::AssignOp),
        Ctx::CallStmt => start(stack, ctx, Ctx::ArgList),
        Ctx::ArgList => start(stack, ctx, Ctx::OpenParenthesis),
        Ctx::BracedExpr => start(stack, ctx, Ctx::OpenParenthesis),
        Ctx::VarDeclAfterTypeRef => start(stack, Ctx::VarDecl, Ctx::TypeDescRhs),
        Ctx::ObjectTypeDesc => start(stack, ctx, Ctx::ObjectKeyword),
        Ctx::ObjectField => start(stack, ctx, Ctx::TypeDescriptor),
        Ctx::ObjectMethod => start(stack, ctx, Ctx::FunctionKeyword),
        Ctx::NewExpr => start(stack, ctx, Ctx::NewKeyword),
        Ctx::ListConstructor | Ctx::ListMatchPattern => start(stack, ctx, Ctx::OpenBracket),
        Ctx::MappingConstructor | Ctx::MappingMatchPattern => start(stack, ctx, Ctx::OpenBrace),
        Ctx::MappingField => start(stack, ctx, Ctx::MappingFieldName),
        Ctx::QueryExpr => start(stack, ctx, Ctx::FromClause),
        Ctx::FromClause => start(stack, ctx, Ctx::FromKeyword),
        Ctx::WhereClause => start(stack, ctx, Ctx::WhereKeyword),
        Ctx::LetClause => start(stack, ctx, Ctx::LetKeyword),
        Ctx::SelectClause => start(stack, ctx, Ctx::SelectKeyword),
        Ctx::MatchStmt => start(stack, ctx, Ctx::MatchKeyword),
        Ctx::MatchClause => start(stack, ctx, Ctx::MatchPattern),
        Ctx::VarBindingPattern => start(stack, ctx, Ctx::VarKeyword),
        Ctx::FieldMatchPattern => start(stack, ctx, Ctx::PatternFieldName),
        Ctx::ForeachStmt => start(stack, ctx, Ctx::ForeachKeyword),
        Ctx::LockStmt => start(stack, ctx, Ctx::LockKeyword),
        Ctx::WorkerDecl => start(stack, ctx, Ctx::WorkerKeyword),
        Ctx::ForkStmt => start(stack, ctx, Ctx::ForkKeyword),
        Ctx::SendStmt => start(stack, ctx, Ctx::RightArrow),
        Ctx::ReceiveExpr => start(stack, ctx, Ctx::LeftArrow),
        Ctx::WaitExpr => start(stack, ctx, Ctx::WaitKeyword),
        Ctx::TemplateExpr => start(stack, ctx, Ctx::TemplateTypeKeyword),
        Ctx::Interpolation => start(stack, ctx, Ctx::InterpolationStart),

        Ctx::Parameter => Ctx::TypeDescriptor,
        Ctx::TypeDescEnd => end_type_descriptor(stack)?,
        Ctx::ExpressionEnd => end_expression(stack)?,
        Ctx::IfEnd => {
            stack.end()?;
            end_production(stack)?
        }

        Ctx::Eof => Ctx::Eof,
        Ctx::DocString => Ctx::TopLevelNodeWithoutMetadata,
        Ctx::PublicKeyword => Ctx::TopLevelNodeWithoutModifier,

        Ctx::ImportKeyword => Ctx::ImportOrgOrModuleName,
        Ctx::ImportOrgOrModuleName => Ctx::ImportNameRhs,
        Ctx::Slash => Ctx::ImportModuleName,
        Ctx::ImportModuleName => Ctx::Semicolon,

        Ctx::FunctionKeyword => Ctx::FunctionName,
        Ctx::FunctionName => Ctx::ParamList,
        Ctx::ParameterName => Ctx::ParamEnd,
        Ctx::ReturnsKeyword => Ctx::TypeDescriptor,

        Ctx::TypeKeyword => Ctx::TypeName,
        Ctx::TypeName => Ctx::TypeDescriptor,
        Ctx::TypeReference | Ctx::BuiltinTypeDescriptor => Ctx::TypeDescRhs,
        Ctx::QuestionMark => Ctx::TypeDescEnd,
        Ctx::RecordKeyword => Ctx::OpenBrace,
        Ctx::FieldName => Ctx::Semicolon,

        Ctx::ConstKeyword => Ctx::ConstName,
        Ctx::ConstName => Ctx::AssignOp,
        Ctx::VarKeyword => match stack.parent() {
            Some(Ctx::VarDecl | Ctx::LetClause) => Ctx::VariableName,
            Some(Ctx::FromClause | Ctx::ForeachStmt | Ctx::VarBindingPattern) => Ctx::BindingName,
            parent => return Err(unexpected_parent(ctx, parent)),
        },
        Ctx::VariableName => match stack.parent() {
            Some(Ctx::VarDecl) => Ctx::VarDeclRhs,
            Some(Ctx::LetClause) => Ctx::AssignOp,
            parent => return Err(unexpected_parent(ctx, parent)),
        },
        Ctx::AssignOp => match stack.parent() {
            Some(Ctx::VarDecl | Ctx::ConstDecl | Ctx::AssignmentStmt | Ctx::LetClause) => {
                Ctx::Expression
            }
            parent => return Err(unexpected_parent(ctx, parent)),
        },

        Ctx::StatementStartIdentifier => Ctx::StatementStartIdentifierRhs,
        Ctx::IfKeyword | Ctx::WhileKeyword => Ctx::Expression,
        Ctx::ElseKeyword => {
            match stack.parent() {
                Some(Ctx::IfBlock) => stack.switch(Ctx::ElseBlock)?,
                parent => return Err(unexpected_parent(ctx, parent)),
            }
            Ctx::ElseBody
        }
        Ctx::ReturnKeyword => Ctx::ReturnRhs,
        Ctx::BreakKeyword | Ctx::ContinueKeyword => Ctx::Semicolon,

        Ctx::VariableRef | Ctx::BasicLiteral | Ctx::FieldAccessName => Ctx::ExpressionRhs,
        Ctx::UnaryOperator | Ctx::BinaryOperator => Ctx::Expression,
        Ctx::Dot => Ctx::FieldAccessName,

        Ctx::ObjectKeyword | Ctx::ForkKeyword => Ctx::OpenBrace,
        Ctx::NewKeyword => Ctx::ClassName,
        Ctx::ClassName => Ctx::ArgList,
        Ctx::FromKeyword | Ctx::LetKeyword | Ctx::ForeachKeyword => Ctx::VarDeclTypeStart,
        Ctx::BindingName => match stack.parent() {
            Some(Ctx::FromClause | Ctx::ForeachStmt) => Ctx::InKeyword,
            Some(Ctx::VarBindingPattern) => {
                stack.end()?;
                end_pattern(stack)?
            }
            parent => return Err(unexpected_parent(ctx, parent)),
        },
        Ctx::InKeyword | Ctx::WhereKeyword | Ctx::SelectKeyword | Ctx::MatchKeyword => {
            Ctx::Expression
        }
        Ctx::MappingFieldName | Ctx::PatternFieldName => Ctx::Colon,
        Ctx::Colon => match stack.parent() {
            Some(Ctx::MappingField) => Ctx::Expression,
            Some(Ctx::FieldMatchPattern) => Ctx::MatchPattern,
            parent => return Err(unexpected_parent(ctx, parent)),
        },
        Ctx::PatternName | Ctx::ConstPattern => end_pattern(stack)?,
        Ctx::Pipe => Ctx::MatchPattern,
        Ctx::RightDoubleArrow | Ctx::LockKeyword => Ctx::Block,
        Ctx::WorkerKeyword => Ctx::WorkerName,
        Ctx::WorkerName => Ctx::WorkerReturnOrBody,
        Ctx::RightArrow | Ctx::LeftArrow | Ctx::WaitKeyword => Ctx::PeerWorker,
        Ctx::PeerWorker => match stack.parent() {
            Some(Ctx::SendStmt) => Ctx::Semicolon,
            Some(Ctx::ReceiveExpr | Ctx::WaitExpr) => {
                stack.end()?;
                Ctx::ExpressionRhs
            }
            parent => return Err(unexpected_parent(ctx, parent)),
        },
        Ctx::TemplateTypeKeyword => Ctx::OpenBacktick,
        Ctx::OpenBacktick | Ctx::TemplateText => Ctx::TemplateMemberOrEnd,
        Ctx::CloseBacktick => {
            stack.end()?;
            Ctx::ExpressionRhs
        }
        Ctx::InterpolationStart => Ctx::Expression,
        Ctx::OpenBracket => match stack.parent() {
            Some(Ctx::ListConstructor) => Ctx::ListConstructorStart,
            Some(Ctx::ListMatchPattern) => Ctx::ListPatternStart,
            parent => return Err(unexpected_parent(ctx, parent)),
        },
        Ctx::CloseBracket => close_bracket(stack)?,

        Ctx::OpenParenthesis => match stack.parent() {
            Some(Ctx::ParamList) => Ctx::ParamStart,
            Some(Ctx::ArgList) => Ctx::ArgStart,
            Some(Ctx::BracedExpr) => Ctx::Expression,
            parent => return Err(unexpected_parent(ctx, parent)),
        },
        Ctx::CloseParenthesis => close_parenthesis(stack)?,
        Ctx::OpenBrace => match stack.parent() {
            Some(Ctx::Block) => Ctx::StatementsOrEnd,
            Some(Ctx::RecordTypeDesc) => Ctx::RecordFieldOrEnd,
            Some(Ctx::ObjectTypeDesc) => Ctx::ObjectMemberOrEnd,
            Some(Ctx::MappingConstructor) => Ctx::MappingFieldOrEnd,
            Some(Ctx::MatchStmt) => Ctx::MatchClauseOrEnd,
            Some(Ctx::MappingMatchPattern) => Ctx::MappingPatternStart,
            Some(Ctx::ForkStmt) => Ctx::ForkBodyOrEnd,
            parent => return Err(unexpected_parent(ctx, parent)),
        },
        Ctx::CloseBrace => close_brace(stack)?,
        Ctx::Comma => match stack.parent() {
            Some(Ctx::ParamList) => Ctx::Parameter,
            Some(Ctx::ArgList | Ctx::ListConstructor) => Ctx::Expression,
            Some(Ctx::MappingConstructor) => Ctx::MappingField,
            Some(Ctx::ListMatchPattern) => Ctx::MatchPattern,
            Some(Ctx::MappingMatchPattern) => Ctx::FieldMatchPattern,
            parent => return Err(unexpected_parent(ctx, parent)),
        },
        Ctx::Semicolon => {
            match stack.parent() {
                Some(
                    Ctx::ImportDecl
                    | Ctx::TypeDefinition
                    | Ctx::RecordField
                    | Ctx::ConstDecl
                    | Ctx::VarDecl
                    | Ctx::AssignmentStmt
                    | Ctx::CallStmt
                    | Ctx::ReturnStmt
                    | Ctx::BreakStmt
                    | Ctx::ContinueStmt
                    | Ctx::ObjectField
                    | Ctx::ObjectMethod
                    | Ctx::SendStmt,
                ) => stack.end()?,
                parent => return Err(unexpected_parent(ctx, parent)),
            };
            end_production(stack)?
        }

        // Branch points are resolved by the search, never stepped over.
        _ => {
            return Err(RecoveryError::unreachable(
                ctx,
                "context has no single successor",
            ))
        }
    };
    Ok(next)
}

fn start(stack: &mut ContextStack, production: Ctx, first: Ctx) -> Ctx {
    stack.start(production);
    first
}

fn unexpected_parent(ctx: Ctx, parent: Option<Ctx>) -> RecoveryError {
    RecoveryError::unreachable(ctx, format!("unexpected enclosing production {:?}", parent))
}

/// Successor once the innermost production has been popped.
fn end_production(stack: &mut ContextStack) -> Result<Ctx, RecoveryError> {
    match stack.parent() {
        Some(Ctx::CompUnit) => Ok(Ctx::TopLevelNode),
        Some(Ctx::Block) => Ok(Ctx::StatementsOrEnd),
        Some(Ctx::RecordTypeDesc) => Ok(Ctx::RecordFieldOrEnd),
        Some(Ctx::ObjectTypeDesc) => Ok(Ctx::ObjectMemberOrEnd),
        Some(Ctx::MatchStmt) => Ok(Ctx::MatchClauseOrEnd),
        Some(Ctx::ForkStmt) => Ok(Ctx::ForkBodyOrEnd),
        Some(Ctx::ElseBlock) => {
            stack.end()?;
            end_production(stack)
        }
        Some(parent) => Err(RecoveryError::unreachable(
            parent,
            "production ended in a context that cannot continue",
        )),
        None => Err(RecoveryError::StackUnderflow),
    }
}

fn end_type_descriptor(stack: &mut ContextStack) -> Result<Ctx, RecoveryError> {
    match stack.parent() {
        Some(Ctx::ParamList) => Ok(Ctx::ParameterName),
        Some(Ctx::FuncDefinition) => Ok(Ctx::Block),
        Some(Ctx::TypeDefinition) => Ok(Ctx::Semicolon),
        Some(Ctx::RecordField) => Ok(Ctx::FieldName),
        Some(Ctx::VarDecl | Ctx::LetClause) => Ok(Ctx::VariableName),
        Some(Ctx::ObjectField) => Ok(Ctx::FieldName),
        Some(Ctx::ObjectMethod) => Ok(Ctx::Semicolon),
        Some(Ctx::WorkerDecl) => Ok(Ctx::Block),
        Some(Ctx::FromClause | Ctx::ForeachStmt) => Ok(Ctx::BindingName),
        parent => Err(unexpected_parent(Ctx::TypeDescEnd, parent)),
    }
}

fn end_expression(stack: &mut ContextStack) -> Result<Ctx, RecoveryError> {
    match stack.parent() {
        Some(Ctx::VarDecl | Ctx::ConstDecl | Ctx::AssignmentStmt | Ctx::ReturnStmt) => {
            Ok(Ctx::Semicolon)
        }
        Some(Ctx::ArgList) => Ok(Ctx::ArgEnd),
        Some(Ctx::BracedExpr) => Ok(Ctx::CloseParenthesis),
        Some(Ctx::IfBlock | Ctx::WhileBlock | Ctx::ForeachStmt) => Ok(Ctx::Block),
        Some(Ctx::MatchStmt) => Ok(Ctx::OpenBrace),
        Some(Ctx::Interpolation) => Ok(Ctx::CloseBrace),
        Some(Ctx::ListConstructor) => Ok(Ctx::ListConstructorEnd),
        Some(Ctx::MappingField) => {
            stack.end()?;
            Ok(Ctx::MappingFieldEnd)
        }
        Some(Ctx::FromClause | Ctx::WhereClause | Ctx::LetClause) => {
            stack.end()?;
            Ok(Ctx::QueryClauseOrSelect)
        }
        Some(Ctx::SelectClause) => {
            // `select` closes the whole query.
            stack.end()?;
            stack.end()?;
            Ok(Ctx::ExpressionRhs)
        }
        parent => Err(unexpected_parent(Ctx::ExpressionEnd, parent)),
    }
}

/// Successor of a complete match pattern, decided by what encloses it.
fn end_pattern(stack: &mut ContextStack) -> Result<Ctx, RecoveryError> {
    match stack.parent() {
        Some(Ctx::MatchClause) => Ok(Ctx::MatchPatternRhs),
        Some(Ctx::ListMatchPattern) => Ok(Ctx::ListPatternEnd),
        Some(Ctx::FieldMatchPattern) => {
            stack.end()?;
            Ok(Ctx::MappingPatternEnd)
        }
        parent => Err(unexpected_parent(Ctx::MatchPattern, parent)),
    }
}

fn close_parenthesis(stack: &mut ContextStack) -> Result<Ctx, RecoveryError> {
    match stack.parent() {
        Some(Ctx::ParamList) => {
            stack.end()?;
            if stack.parent() == Some(Ctx::ObjectMethod) {
                Ok(Ctx::MethodDeclRhs)
            } else {
                Ok(Ctx::ReturnTypeOrBody)
            }
        }
        Some(Ctx::ArgList) => {
            stack.end()?;
            match stack.parent() {
                Some(Ctx::CallStmt) => Ok(Ctx::Semicolon),
                Some(Ctx::NewExpr) => {
                    stack.end()?;
                    Ok(Ctx::ExpressionRhs)
                }
                _ => Ok(Ctx::ExpressionRhs),
            }
        }
        Some(Ctx::BracedExpr) => {
            stack.end()?;
            Ok(Ctx::ExpressionRhs)
        }
        parent => Err(unexpected_parent(Ctx::CloseParenthesis, parent)),
    }
}

fn close_brace(stack: &mut ContextStack) -> Result<Ctx, RecoveryError> {
    match stack.parent() {
        Some(Ctx::RecordTypeDesc | Ctx::ObjectTypeDesc) => {
            stack.end()?;
            Ok(Ctx::TypeDescRhs)
        }
        Some(Ctx::MappingConstructor) => {
            stack.end()?;
            Ok(Ctx::ExpressionRhs)
        }
        Some(Ctx::MappingMatchPattern) => {
            stack.end()?;
            end_pattern(stack)
        }
        Some(Ctx::Interpolation) => {
            stack.end()?;
            Ok(Ctx::TemplateMemberOrEnd)
        }
        Some(Ctx::MatchStmt | Ctx::ForkStmt) => {
            stack.end()?;
            end_production(stack)
        }
        Some(Ctx::Block) => {
            stack.end()?;
            // The block's owner decides what follows it.
            match stack.parent() {
                Some(
                    Ctx::FuncDefinition
                    | Ctx::WhileBlock
                    | Ctx::ElseBlock
                    | Ctx::ForeachStmt
                    | Ctx::LockStmt
                    | Ctx::WorkerDecl,
                ) => {
                    stack.end()?;
                    end_production(stack)
                }
                Some(Ctx::MatchClause) => {
                    stack.end()?;
                    Ok(Ctx::MatchClauseOrEnd)
                }
                Some(Ctx::IfBlock) => Ok(Ctx::ElseOrEnd),
                Some(Ctx::Block) => Ok(Ctx::StatementsOrEnd),
                parent => Err(unexpected_parent(Ctx::CloseBrace, parent)),
            }
        }
        parent => Err(unexpected_parent(Ctx::CloseBrace, parent)),
    }
}

fn close_bracket(stack: &mut ContextStack) -> Result<Ctx, RecoveryError> {
    match stack.parent() {
        Some(Ctx::ListConstructor) => {
            stack.end()?;
            Ok(Ctx::ExpressionRhs)
        }
        Some(Ctx::ListMatchPattern) => {
            stack.end()?;
            end_pattern(stack)
        }
        parent => Err(unexpected_parent(Ctx::CloseBracket, parent)),
    }
}
