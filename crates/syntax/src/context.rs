//! Grammar positions and the stack of productions currently being parsed.
//!
//! The recovery engine treats the grammar as a pushdown automaton: a
//! [`GrammarContext`] names the position being parsed and the
//! [`ContextStack`] records which productions enclose it. The stack is a
//! persistent linked list, so a speculative search branch can take its own
//! copy in O(1) and mutate it freely without disturbing the live parse.

use std::rc::Rc;

use crate::error::RecoveryError;

/// A named position in the grammar.
///
/// Variants fall into four groups (see `grammar::terminals` and
/// `grammar::alternatives` for the classification):
/// productions that are pushed on the [`ContextStack`], terminal positions
/// that expect one token, keyword positions, and branch points with more
/// than one legal continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrammarContext {
    // Productions. Each is also the entry context that starts it.
    CompUnit,
    ImportDecl,
    FuncDefinition,
    ParamList,
    TypeDefinition,
    RecordTypeDesc,
    RecordField,
    ConstDecl,
    VarDecl,
    Block,
    IfBlock,
    ElseBlock,
    WhileBlock,
    ReturnStmt,
    BreakStmt,
    ContinueStmt,
    AssignmentStmt,
    CallStmt,
    ArgList,
    BracedExpr,
    ObjectTypeDesc,
    ObjectField,
    ObjectMethod,
    NewExpr,
    ListConstructor,
    MappingConstructor,
    MappingField,
    QueryExpr,
    FromClause,
    WhereClause,
    LetClause,
    SelectClause,
    MatchStmt,
    MatchClause,
    VarBindingPattern,
    ListMatchPattern,
    MappingMatchPattern,
    FieldMatchPattern,
    ForeachStmt,
    LockStmt,
    WorkerDecl,
    ForkStmt,
    SendStmt,
    ReceiveExpr,
    WaitExpr,
    TemplateExpr,
    Interpolation,

    // Pure bookkeeping positions
    Parameter,
    VarDeclAfterTypeRef,
    TypeDescEnd,
    ExpressionEnd,
    IfEnd,

    // Branch points
    TopLevelNode,
    TopLevelNodeWithoutMetadata,
    TopLevelNodeWithoutModifier,
    ImportNameRhs,
    ParamStart,
    ParamEnd,
    ReturnTypeOrBody,
    TypeDescriptor,
    TypeDescRhs,
    RecordFieldOrEnd,
    VarDeclTypeStart,
    VarDeclRhs,
    StatementsOrEnd,
    Statement,
    StatementStartIdentifierRhs,
    ElseOrEnd,
    ElseBody,
    ReturnRhs,
    Expression,
    ExpressionRhs,
    ArgStart,
    ArgEnd,
    ObjectMemberOrEnd,
    ObjectMember,
    MethodDeclRhs,
    ListConstructorStart,
    ListConstructorEnd,
    MappingFieldOrEnd,
    MappingFieldEnd,
    QueryClauseOrSelect,
    MatchClauseOrEnd,
    MatchPattern,
    MatchPatternRhs,
    ListPatternStart,
    ListPatternEnd,
    MappingPatternStart,
    MappingPatternEnd,
    WorkerReturnOrBody,
    ForkBodyOrEnd,
    TemplateMemberOrEnd,

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
    /// The `string` that opens a string template
    TemplateTypeKeyword,

    // Names
    ImportOrgOrModuleName,
    ImportModuleName,
    FunctionName,
    ParameterName,
    TypeName,
    FieldName,
    ConstName,
    VariableName,
    TypeReference,
    VariableRef,
    FieldAccessName,
    StatementStartIdentifier,
    ClassName,
    BindingName,
    MappingFieldName,
    PatternFieldName,
    /// A name or `_` standing alone as a match pattern
    PatternName,
    WorkerName,
    PeerWorker,

    // Token classes
    BuiltinTypeDescriptor,
    BasicLiteral,
    UnaryOperator,
    BinaryOperator,
    ConstPattern,
    TemplateText,

    // Punctuation
    OpenParenthesis,
    CloseParenthesis,
    OpenBrace,
    CloseBrace,
    Semicolon,
    Comma,
    Slash,
    AssignOp,
    QuestionMark,
    Dot,
    OpenBracket,
    CloseBracket,
    Colon,
    Pipe,
    RightDoubleArrow,
    RightArrow,
    LeftArrow,
    OpenBacktick,
    CloseBacktick,
    InterpolationStart,
    DocString,
    Eof,
}

impl std::fmt::Display for GrammarContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug)]
struct Frame {
    ctx: GrammarContext,
    below: Option<Rc<Frame>>,
}

/// Persistent stack of active productions.
///
/// Cloning shares structure with the original; `start`, `end` and `switch`
/// only ever replace the top pointer, so a clone is an independent snapshot.
#[derive(Debug, Clone, Default)]
pub struct ContextStack {
    top: Option<Rc<Frame>>,
    depth: usize,
}

impl ContextStack {
    pub fn new() -> Self {
        ContextStack::default()
    }

    /// Push `ctx` as the innermost production.
    pub fn start(&mut self, ctx: GrammarContext) {
        self.top = Some(Rc::new(Frame {
            ctx,
            below: self.top.take(),
        }));
        self.depth += 1;
    }

    /// Pop the innermost production.
    pub fn end(&mut self) -> Result<GrammarContext, RecoveryError> {
        let frame = self.top.take().ok_or(RecoveryError::StackUnderflow)?;
        self.top = frame.below.clone();
        self.depth -= 1;
        Ok(frame.ctx)
    }

    /// Replace the innermost production.
    pub fn switch(&mut self, ctx: GrammarContext) -> Result<(), RecoveryError> {
        self.end()?;
        self.start(ctx);
        Ok(())
    }

    /// The innermost production (top of stack).
    pub fn parent(&self) -> Option<GrammarContext> {
        self.top.as_ref().map(|f| f.ctx)
    }

    /// The production enclosing the innermost one.
    pub fn grand_parent(&self) -> Option<GrammarContext> {
        self.top
            .as_ref()
            .and_then(|f| f.below.as_ref())
            .map(|f| f.ctx)
    }

    pub fn has_ancestor(&self, ctx: GrammarContext) -> bool {
        self.iter().any(|c| c == ctx)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    /// Contexts from innermost to outermost.
    pub fn iter(&self) -> impl Iterator<Item = GrammarContext> + '_ {
        std::iter::successors(self.top.as_deref(), |f| f.below.as_deref()).map(|f| f.ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_end_switch() {
        let mut stack = ContextStack::new();
        stack.start(GrammarContext::CompUnit);
        stack.start(GrammarContext::FuncDefinition);
        stack.start(GrammarContext::ParamList);
        assert_eq!(stack.parent(), Some(GrammarContext::ParamList));
        assert_eq!(stack.grand_parent(), Some(GrammarContext::FuncDefinition));
        assert_eq!(stack.depth(), 3);

        stack.switch(GrammarContext::Block).unwrap();
        assert_eq!(stack.parent(), Some(GrammarContext::Block));
        assert_eq!(stack.depth(), 3);

        assert_eq!(stack.end().unwrap(), GrammarContext::Block);
        assert_eq!(stack.parent(), Some(GrammarContext::FuncDefinition));
    }

    #[test]
    fn end_on_empty_stack_underflows() {
        let mut stack = ContextStack::new();
        assert_eq!(stack.end(), Err(RecoveryError::StackUnderflow));
        assert!(stack.switch(GrammarContext::Block).is_err());
    }

    #[test]
    fn has_ancestor_scans_whole_stack() {
        let mut stack = ContextStack::new();
        stack.start(GrammarContext::CompUnit);
        stack.start(GrammarContext::Block);
        stack.start(GrammarContext::ArgList);
        assert!(stack.has_ancestor(GrammarContext::CompUnit));
        assert!(stack.has_ancestor(GrammarContext::ArgList));
        assert!(!stack.has_ancestor(GrammarContext::ParamList));
    }

    #[test]
    fn clones_are_independent() {
        let mut live = ContextStack::new();
        live.start(GrammarContext::CompUnit);
        live.start(GrammarContext::Block);

        let mut branch = live.clone();
        branch.end().unwrap();
        branch.end().unwrap();
        branch.start(GrammarContext::ImportDecl);

        assert_eq!(live.parent(), Some(GrammarContext::Block));
        assert_eq!(live.depth(), 2);
        assert_eq!(branch.parent(), Some(GrammarContext::ImportDecl));
        assert_eq!(branch.depth(), 1);
    }
}
