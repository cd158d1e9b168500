use super::{starts_expression, Choice, Parser};
use crate::context::GrammarContext as Ctx;
use crate::error::SyntaxError;
use crate::token::SyntaxKind;
use crate::tree::{NodeKind, SyntaxNode};

impl Parser {
    pub(super) fn parse_expression(&mut self) -> Result<SyntaxNode, SyntaxError> {
        self.parse_binary(0)
    }

    /// Precedence climbing over `SyntaxKind::binary_precedence`; all binary
    /// operators are left-associative.
    fn parse_binary(&mut self, min_prec: u8) -> Result<SyntaxNode, SyntaxError> {
        let mut lhs = self.parse_unary()?;
        while let Some(prec) = self.peek_kind().binary_precedence() {
            if prec < min_prec {
                break;
            }
            let op = self.expect(Ctx::BinaryOperator)?;
            let rhs = self.parse_binary(prec + 1)?;
            let mut node = SyntaxNode::new(NodeKind::BinaryExpr);
            node.push_node(lhs);
            node.push_token(op);
            node.push_node(rhs);
            lhs = node;
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let primary = match self.decide(Ctx::Expression, starts_expression)? {
            Choice::Kind(kind) if kind.is_unary_operator() => {
                let mut node = SyntaxNode::new(NodeKind::UnaryExpr);
                node.push_token(self.expect(Ctx::UnaryOperator)?);
                node.push_node(self.parse_unary()?);
                return Ok(node);
            }
            Choice::Kind(SyntaxKind::OpenParen) | Choice::Path(Ctx::BracedExpr) => {
                self.parse_braced()?
            }
            Choice::Kind(kind) if kind.is_literal() => {
                SyntaxNode::leaf(NodeKind::Literal, self.expect(Ctx::BasicLiteral)?)
            }
            Choice::Kind(SyntaxKind::OpenBracket) | Choice::Path(Ctx::ListConstructor) => {
                self.parse_list_constructor()?
            }
            Choice::Kind(SyntaxKind::OpenBrace) | Choice::Path(Ctx::MappingConstructor) => {
                self.parse_mapping_constructor()?
            }
            Choice::Kind(SyntaxKind::NewKeyword) | Choice::Path(Ctx::NewExpr) => {
                let mut node = SyntaxNode::new(NodeKind::NewExpr);
                self.start(Ctx::NewExpr);
                node.push_token(self.expect(Ctx::NewKeyword)?);
                node.push_token(self.expect(Ctx::ClassName)?);
                node.push_node(self.parse_arg_list()?);
                self.end()?;
                node
            }
            Choice::Kind(SyntaxKind::FromKeyword) | Choice::Path(Ctx::QueryExpr) => {
                self.parse_query()?
            }
            Choice::Kind(SyntaxKind::LeftArrow) | Choice::Path(Ctx::ReceiveExpr) => {
                self.parse_worker_action(NodeKind::ReceiveExpr, Ctx::ReceiveExpr, Ctx::LeftArrow)?
            }
            Choice::Kind(SyntaxKind::WaitKeyword) | Choice::Path(Ctx::WaitExpr) => {
                self.parse_worker_action(NodeKind::WaitExpr, Ctx::WaitExpr, Ctx::WaitKeyword)?
            }
            Choice::Kind(SyntaxKind::StringKeyword) | Choice::Path(Ctx::TemplateExpr) => {
                self.parse_template()?
            }
            _ => SyntaxNode::leaf(NodeKind::NameRef, self.expect(Ctx::VariableRef)?),
        };
        self.parse_postfix(primary)
    }

    fn parse_postfix(&mut self, mut expr: SyntaxNode) -> Result<SyntaxNode, SyntaxError> {
        loop {
            match self.peek_kind() {
                SyntaxKind::Dot => {
                    let mut node = SyntaxNode::new(NodeKind::FieldAccess);
                    node.push_node(expr);
                    node.push_token(self.expect(Ctx::Dot)?);
                    node.push_token(self.expect(Ctx::FieldAccessName)?);
                    expr = node;
                }
                SyntaxKind::OpenParen => {
                    let mut node = SyntaxNode::new(NodeKind::CallExpr);
                    node.push_node(expr);
                    node.push_node(self.parse_arg_list()?);
                    expr = node;
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_braced(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::BracedExpr);
        self.start(Ctx::BracedExpr);
        node.push_token(self.expect(Ctx::OpenParenthesis)?);
        node.push_node(self.parse_expression()?);
        node.push_token(self.expect(Ctx::CloseParenthesis)?);
        self.end()?;
        Ok(node)
    }

    fn parse_list_constructor(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::ListConstructor);
        self.start(Ctx::ListConstructor);
        node.push_token(self.expect(Ctx::OpenBracket)?);
        let first = self.decide(Ctx::ListConstructorStart, |k| {
            k == SyntaxKind::CloseBracket || starts_expression(k)
        })?;
        if first != Choice::Kind(SyntaxKind::CloseBracket) {
            loop {
                node.push_node(self.parse_expression()?);
                let next = self.decide(Ctx::ListConstructorEnd, |k| {
                    k == SyntaxKind::CloseBracket || k == SyntaxKind::Comma
                })?;
                if next != Choice::Kind(SyntaxKind::Comma) {
                    break;
                }
                node.push_token(self.expect(Ctx::Comma)?);
            }
        }
        node.push_token(self.expect(Ctx::CloseBracket)?);
        self.end()?;
        Ok(node)
    }

    /// `{ name: expr, ... }`
    fn parse_mapping_constructor(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::MappingConstructor);
        self.start(Ctx::MappingConstructor);
        node.push_token(self.expect(Ctx::OpenBrace)?);
        let first = self.decide(Ctx::MappingFieldOrEnd, |k| {
            k == SyntaxKind::CloseBrace || k == SyntaxKind::Identifier
        })?;
        if first != Choice::Kind(SyntaxKind::CloseBrace) {
            loop {
                let mut field = SyntaxNode::new(NodeKind::MappingField);
                self.start(Ctx::MappingField);
                field.push_token(self.expect(Ctx::MappingFieldName)?);
                field.push_token(self.expect(Ctx::Colon)?);
                field.push_node(self.parse_expression()?);
                self.end()?;
                node.push_node(field);

                let next = self.decide(Ctx::MappingFieldEnd, |k| {
                    k == SyntaxKind::CloseBrace || k == SyntaxKind::Comma
                })?;
                if next != Choice::Kind(SyntaxKind::Comma) {
                    break;
                }
                node.push_token(self.expect(Ctx::Comma)?);
            }
        }
        node.push_token(self.expect(Ctx::CloseBrace)?);
        self.end()?;
        Ok(node)
    }

    // -- Queries ------------------------------------------------

    /// `from T x in e (where e | let T y = e | from ...)* select e`
    fn parse_query(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::QueryExpr);
        self.start(Ctx::QueryExpr);
        node.push_node(self.parse_from_clause()?);
        loop {
            let clause = self.decide(Ctx::QueryClauseOrSelect, |k| {
                matches!(
                    k,
                    SyntaxKind::SelectKeyword
                        | SyntaxKind::WhereKeyword
                        | SyntaxKind::LetKeyword
                        | SyntaxKind::FromKeyword
                )
            })?;
            match clause {
                Choice::Kind(SyntaxKind::WhereKeyword) | Choice::Path(Ctx::WhereClause) => {
                    let mut where_clause = SyntaxNode::new(NodeKind::WhereClause);
                    self.start(Ctx::WhereClause);
                    where_clause.push_token(self.expect(Ctx::WhereKeyword)?);
                    where_clause.push_node(self.parse_expression()?);
                    self.end()?;
                    node.push_node(where_clause);
                }
                Choice::Kind(SyntaxKind::LetKeyword) | Choice::Path(Ctx::LetClause) => {
                    let mut let_clause = SyntaxNode::new(NodeKind::LetClause);
                    self.start(Ctx::LetClause);
                    let_clause.push_token(self.expect(Ctx::LetKeyword)?);
                    self.parse_binding_type(&mut let_clause)?;
                    let_clause.push_token(self.expect(Ctx::VariableName)?);
                    let_clause.push_token(self.expect(Ctx::AssignOp)?);
                    let_clause.push_node(self.parse_expression()?);
                    self.end()?;
                    node.push_node(let_clause);
                }
                Choice::Kind(SyntaxKind::FromKeyword) | Choice::Path(Ctx::FromClause) => {
                    node.push_node(self.parse_from_clause()?);
                }
                _ => break,
            }
        }
        let mut select = SyntaxNode::new(NodeKind::SelectClause);
        self.start(Ctx::SelectClause);
        select.push_token(self.expect(Ctx::SelectKeyword)?);
        select.push_node(self.parse_expression()?);
        self.end()?;
        node.push_node(select);
        self.end()?;
        Ok(node)
    }

    fn parse_from_clause(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::FromClause);
        self.start(Ctx::FromClause);
        node.push_token(self.expect(Ctx::FromKeyword)?);
        self.parse_binding_type(&mut node)?;
        node.push_token(self.expect(Ctx::BindingName)?);
        node.push_token(self.expect(Ctx::InKeyword)?);
        node.push_node(self.parse_expression()?);
        self.end()?;
        Ok(node)
    }

    // -- Workers and templates ----------------------------------

    /// `<- w` and `wait w`
    fn parse_worker_action(&mut self, kind: NodeKind, production: Ctx, marker: Ctx) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(kind);
        self.start(production);
        node.push_token(self.expect(marker)?);
        node.push_token(self.expect(Ctx::PeerWorker)?);
        self.end()?;
        Ok(node)
    }

    /// ``string `text ${expr} text` ``
    fn parse_template(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::TemplateExpr);
        self.start(Ctx::TemplateExpr);
        node.push_token(self.expect(Ctx::TemplateTypeKeyword)?);
        node.push_token(self.expect(Ctx::OpenBacktick)?);
        loop {
            let member = self.decide(Ctx::TemplateMemberOrEnd, |k| {
                matches!(
                    k,
                    SyntaxKind::Backtick | SyntaxKind::TemplateString | SyntaxKind::InterpolationStart
                )
            })?;
            match member {
                Choice::Kind(SyntaxKind::TemplateString) | Choice::Path(Ctx::TemplateText) => {
                    node.push_token(self.expect(Ctx::TemplateText)?);
                }
                Choice::Kind(SyntaxKind::InterpolationStart) | Choice::Path(Ctx::Interpolation) => {
                    let mut interpolation = SyntaxNode::new(NodeKind::Interpolation);
                    self.start(Ctx::Interpolation);
                    interpolation.push_token(self.expect(Ctx::InterpolationStart)?);
                    interpolation.push_node(self.parse_expression()?);
                    interpolation.push_token(self.expect(Ctx::CloseBrace)?);
                    self.end()?;
                    node.push_node(interpolation);
                }
                _ => break,
            }
        }
        node.push_token(self.expect(Ctx::CloseBacktick)?);
        self.end()?;
        Ok(node)
    }

    /// `( expr, ... )` for calls, as a statement or inside an expression.
    pub(super) fn parse_arg_list(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::ArgList);
        self.start(Ctx::ArgList);
        node.push_token(self.expect(Ctx::OpenParenthesis)?);
        let first = self.decide(Ctx::ArgStart, |k| {
            k == SyntaxKind::CloseParen || starts_expression(k)
        })?;
        if first != Choice::Kind(SyntaxKind::CloseParen) {
            loop {
                node.push_node(self.parse_expression()?);
                let next = self.decide(Ctx::ArgEnd, |k| {
                    k == SyntaxKind::CloseParen || k == SyntaxKind::Comma
                })?;
                if next != Choice::Kind(SyntaxKind::Comma) {
                    break;
                }
                node.push_token(self.expect(Ctx::Comma)?);
            }
        }
        node.push_token(self.expect(Ctx::CloseParenthesis)?);
        self.end()?;
        Ok(node)
    }
}
