use super::{can_start_statement, starts_expression, starts_match_pattern, starts_type, Choice, Parser};
use crate::context::GrammarContext as Ctx;
use crate::error::SyntaxError;
use crate::token::SyntaxKind;
use crate::tree::{NodeKind, SyntaxNode};

impl Parser {
    pub(super) fn parse_block(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::Block);
        self.start(Ctx::Block);
        node.push_token(self.expect(Ctx::OpenBrace)?);
        loop {
            let choice = self.decide(Ctx::StatementsOrEnd, |k| {
                k == SyntaxKind::CloseBrace || can_start_statement(k)
            })?;
            if choice == Choice::Kind(SyntaxKind::CloseBrace) {
                break;
            }
            node.push_node(self.parse_statement()?);
        }
        node.push_token(self.expect(Ctx::CloseBrace)?);
        self.end()?;
        Ok(node)
    }

    fn parse_statement(&mut self) -> Result<SyntaxNode, SyntaxError> {
        match self.decide(Ctx::Statement, can_start_statement)? {
            Choice::Kind(
                SyntaxKind::VarKeyword | SyntaxKind::RecordKeyword | SyntaxKind::ObjectKeyword,
            )
            | Choice::Path(Ctx::VarDecl) => self.parse_var_decl(),
            Choice::Kind(kind) if kind.is_builtin_type() => self.parse_var_decl(),
            Choice::Kind(SyntaxKind::IfKeyword) | Choice::Path(Ctx::IfBlock) => self.parse_if(),
            Choice::Kind(SyntaxKind::WhileKeyword) | Choice::Path(Ctx::WhileBlock) => {
                self.parse_while()
            }
            Choice::Kind(SyntaxKind::ReturnKeyword) | Choice::Path(Ctx::ReturnStmt) => {
                self.parse_return()
            }
            Choice::Kind(SyntaxKind::BreakKeyword) | Choice::Path(Ctx::BreakStmt) => {
                self.parse_jump(NodeKind::BreakStmt, Ctx::BreakStmt, Ctx::BreakKeyword)
            }
            Choice::Kind(SyntaxKind::ContinueKeyword) | Choice::Path(Ctx::ContinueStmt) => {
                self.parse_jump(NodeKind::ContinueStmt, Ctx::ContinueStmt, Ctx::ContinueKeyword)
            }
            Choice::Kind(SyntaxKind::MatchKeyword) | Choice::Path(Ctx::MatchStmt) => {
                self.parse_match()
            }
            Choice::Kind(SyntaxKind::ForeachKeyword) | Choice::Path(Ctx::ForeachStmt) => {
                self.parse_foreach()
            }
            Choice::Kind(SyntaxKind::LockKeyword) | Choice::Path(Ctx::LockStmt) => {
                self.parse_lock()
            }
            Choice::Kind(SyntaxKind::WorkerKeyword) | Choice::Path(Ctx::WorkerDecl) => {
                self.parse_worker()
            }
            Choice::Kind(SyntaxKind::ForkKeyword) | Choice::Path(Ctx::ForkStmt) => {
                self.parse_fork()
            }
            Choice::Kind(SyntaxKind::OpenBrace) | Choice::Path(Ctx::Block) => self.parse_block(),
            _ => self.parse_identifier_statement(),
        }
    }

    /// Statements that open with a name: assignment, call, send to a worker,
    /// or a variable declaration whose type is that name.
    fn parse_identifier_statement(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let name = self.expect(Ctx::StatementStartIdentifier)?;
        let choice = self.decide(Ctx::StatementStartIdentifierRhs, |k| {
            matches!(
                k,
                SyntaxKind::Assign
                    | SyntaxKind::OpenParen
                    | SyntaxKind::Identifier
                    | SyntaxKind::QuestionMark
                    | SyntaxKind::RightArrow
            )
        })?;
        match choice {
            Choice::Kind(SyntaxKind::Assign) | Choice::Path(Ctx::AssignmentStmt) => {
                let mut node = SyntaxNode::new(NodeKind::AssignmentStmt);
                self.start(Ctx::AssignmentStmt);
                node.push_node(SyntaxNode::leaf(NodeKind::NameRef, name));
                node.push_token(self.expect(Ctx::AssignOp)?);
                node.push_node(self.parse_expression()?);
                node.push_token(self.expect(Ctx::Semicolon)?);
                self.end()?;
                Ok(node)
            }
            Choice::Kind(SyntaxKind::OpenParen) | Choice::Path(Ctx::CallStmt) => {
                let mut node = SyntaxNode::new(NodeKind::CallStmt);
                self.start(Ctx::CallStmt);
                node.push_node(SyntaxNode::leaf(NodeKind::NameRef, name));
                node.push_node(self.parse_arg_list()?);
                node.push_token(self.expect(Ctx::Semicolon)?);
                self.end()?;
                Ok(node)
            }
            Choice::Kind(SyntaxKind::RightArrow) | Choice::Path(Ctx::SendStmt) => {
                let mut node = SyntaxNode::new(NodeKind::SendStmt);
                self.start(Ctx::SendStmt);
                node.push_node(SyntaxNode::leaf(NodeKind::NameRef, name));
                node.push_token(self.expect(Ctx::RightArrow)?);
                node.push_token(self.expect(Ctx::PeerWorker)?);
                node.push_token(self.expect(Ctx::Semicolon)?);
                self.end()?;
                Ok(node)
            }
            _ => {
                let mut node = SyntaxNode::new(NodeKind::VarDecl);
                self.start(Ctx::VarDecl);
                let ty = self.parse_optional_suffix(SyntaxNode::leaf(NodeKind::TypeReference, name));
                node.push_node(ty);
                self.parse_var_decl_tail(&mut node)?;
                self.end()?;
                Ok(node)
            }
        }
    }

    /// Variable declaration at module or statement level.
    pub(super) fn parse_var_decl(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::VarDecl);
        self.start(Ctx::VarDecl);
        self.parse_binding_type(&mut node)?;
        self.parse_var_decl_tail(&mut node)?;
        self.end()?;
        Ok(node)
    }

    /// `var` or a type descriptor in front of a declared name.
    pub(super) fn parse_binding_type(&mut self, node: &mut SyntaxNode) -> Result<(), SyntaxError> {
        let start = self.decide(Ctx::VarDeclTypeStart, |k| {
            k == SyntaxKind::VarKeyword || starts_type(k)
        })?;
        if start == Choice::Kind(SyntaxKind::VarKeyword) {
            node.push_token(self.expect(Ctx::VarKeyword)?);
        } else {
            node.push_node(self.parse_type_descriptor()?);
        }
        Ok(())
    }

    /// Name, optional initialiser and terminating semicolon.
    fn parse_var_decl_tail(&mut self, node: &mut SyntaxNode) -> Result<(), SyntaxError> {
        node.push_token(self.expect(Ctx::VariableName)?);
        let rhs = self.decide(Ctx::VarDeclRhs, |k| {
            k == SyntaxKind::Assign || k == SyntaxKind::Semicolon
        })?;
        if rhs == Choice::Kind(SyntaxKind::Assign) {
            node.push_token(self.expect(Ctx::AssignOp)?);
            node.push_node(self.parse_expression()?);
        }
        node.push_token(self.expect(Ctx::Semicolon)?);
        Ok(())
    }

    // -- Control flow -------------------------------------------

    fn parse_if(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::IfStmt);
        self.start(Ctx::IfBlock);
        node.push_token(self.expect(Ctx::IfKeyword)?);
        node.push_node(self.parse_expression()?);
        node.push_node(self.parse_block()?);

        if self.peek_kind() == SyntaxKind::ElseKeyword {
            let mut clause = SyntaxNode::new(NodeKind::ElseClause);
            clause.push_token(self.expect(Ctx::ElseKeyword)?);
            self.switch(Ctx::ElseBlock)?;
            let body = self.decide(Ctx::ElseBody, |k| {
                k == SyntaxKind::OpenBrace || k == SyntaxKind::IfKeyword
            })?;
            match body {
                Choice::Kind(SyntaxKind::IfKeyword) | Choice::Path(Ctx::IfBlock) => {
                    clause.push_node(self.parse_if()?)
                }
                _ => clause.push_node(self.parse_block()?),
            }
            node.push_node(clause);
        }
        // Pops the if block, or the else block that replaced it.
        self.end()?;
        Ok(node)
    }

    fn parse_while(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::WhileStmt);
        self.start(Ctx::WhileBlock);
        node.push_token(self.expect(Ctx::WhileKeyword)?);
        node.push_node(self.parse_expression()?);
        node.push_node(self.parse_block()?);
        self.end()?;
        Ok(node)
    }

    fn parse_return(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::ReturnStmt);
        self.start(Ctx::ReturnStmt);
        node.push_token(self.expect(Ctx::ReturnKeyword)?);
        let rhs = self.decide(Ctx::ReturnRhs, |k| {
            k == SyntaxKind::Semicolon || starts_expression(k)
        })?;
        if rhs != Choice::Kind(SyntaxKind::Semicolon) {
            node.push_node(self.parse_expression()?);
        }
        node.push_token(self.expect(Ctx::Semicolon)?);
        self.end()?;
        Ok(node)
    }

    fn parse_foreach(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::ForeachStmt);
        self.start(Ctx::ForeachStmt);
        node.push_token(self.expect(Ctx::ForeachKeyword)?);
        self.parse_binding_type(&mut node)?;
        node.push_token(self.expect(Ctx::BindingName)?);
        node.push_token(self.expect(Ctx::InKeyword)?);
        node.push_node(self.parse_expression()?);
        node.push_node(self.parse_block()?);
        self.end()?;
        Ok(node)
    }

    fn parse_lock(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::LockStmt);
        self.start(Ctx::LockStmt);
        node.push_token(self.expect(Ctx::LockKeyword)?);
        node.push_node(self.parse_block()?);
        self.end()?;
        Ok(node)
    }

    // -- Match --------------------------------------------------

    fn parse_match(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::MatchStmt);
        self.start(Ctx::MatchStmt);
        node.push_token(self.expect(Ctx::MatchKeyword)?);
        node.push_node(self.parse_expression()?);
        node.push_token(self.expect(Ctx::OpenBrace)?);
        loop {
            let choice = self.decide(Ctx::MatchClauseOrEnd, |k| {
                k == SyntaxKind::CloseBrace || starts_match_pattern(k)
            })?;
            if choice == Choice::Kind(SyntaxKind::CloseBrace) {
                break;
            }
            node.push_node(self.parse_match_clause()?);
        }
        node.push_token(self.expect(Ctx::CloseBrace)?);
        self.end()?;
        Ok(node)
    }

    /// `p1 | p2 => { ... }`
    fn parse_match_clause(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::MatchClause);
        self.start(Ctx::MatchClause);
        loop {
            node.push_node(self.parse_match_pattern()?);
            let next = self.decide(Ctx::MatchPatternRhs, |k| {
                k == SyntaxKind::RightDoubleArrow || k == SyntaxKind::Pipe
            })?;
            if next != Choice::Kind(SyntaxKind::Pipe) {
                break;
            }
            node.push_token(self.expect(Ctx::Pipe)?);
        }
        node.push_token(self.expect(Ctx::RightDoubleArrow)?);
        node.push_node(self.parse_block()?);
        self.end()?;
        Ok(node)
    }

    fn parse_match_pattern(&mut self) -> Result<SyntaxNode, SyntaxError> {
        match self.decide(Ctx::MatchPattern, starts_match_pattern)? {
            Choice::Kind(SyntaxKind::VarKeyword) | Choice::Path(Ctx::VarBindingPattern) => {
                let mut node = SyntaxNode::new(NodeKind::BindingPattern);
                self.start(Ctx::VarBindingPattern);
                node.push_token(self.expect(Ctx::VarKeyword)?);
                node.push_token(self.expect(Ctx::BindingName)?);
                self.end()?;
                Ok(node)
            }
            Choice::Kind(SyntaxKind::OpenBracket) | Choice::Path(Ctx::ListMatchPattern) => {
                self.parse_list_pattern()
            }
            Choice::Kind(SyntaxKind::OpenBrace) | Choice::Path(Ctx::MappingMatchPattern) => {
                self.parse_mapping_pattern()
            }
            Choice::Kind(kind) if kind.is_literal() => {
                Ok(SyntaxNode::leaf(NodeKind::ConstPattern, self.expect(Ctx::ConstPattern)?))
            }
            _ => Ok(SyntaxNode::leaf(NodeKind::NamePattern, self.expect(Ctx::PatternName)?)),
        }
    }

    fn parse_list_pattern(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::ListPattern);
        self.start(Ctx::ListMatchPattern);
        node.push_token(self.expect(Ctx::OpenBracket)?);
        let first = self.decide(Ctx::ListPatternStart, |k| {
            k == SyntaxKind::CloseBracket || starts_match_pattern(k)
        })?;
        if first != Choice::Kind(SyntaxKind::CloseBracket) {
            loop {
                node.push_node(self.parse_match_pattern()?);
                let next = self.decide(Ctx::ListPatternEnd, |k| {
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

    fn parse_mapping_pattern(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::MappingPattern);
        self.start(Ctx::MappingMatchPattern);
        node.push_token(self.expect(Ctx::OpenBrace)?);
        let first = self.decide(Ctx::MappingPatternStart, |k| {
            k == SyntaxKind::CloseBrace || k == SyntaxKind::Identifier
        })?;
        if first != Choice::Kind(SyntaxKind::CloseBrace) {
            loop {
                let mut field = SyntaxNode::new(NodeKind::FieldPattern);
                self.start(Ctx::FieldMatchPattern);
                field.push_token(self.expect(Ctx::PatternFieldName)?);
                field.push_token(self.expect(Ctx::Colon)?);
                field.push_node(self.parse_match_pattern()?);
                self.end()?;
                node.push_node(field);

                let next = self.decide(Ctx::MappingPatternEnd, |k| {
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

    // -- Workers ------------------------------------------------

    fn parse_worker(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::WorkerDecl);
        self.start(Ctx::WorkerDecl);
        node.push_token(self.expect(Ctx::WorkerKeyword)?);
        node.push_token(self.expect(Ctx::WorkerName)?);
        let rhs = self.decide(Ctx::WorkerReturnOrBody, |k| {
            k == SyntaxKind::OpenBrace || k == SyntaxKind::ReturnsKeyword
        })?;
        if rhs == Choice::Kind(SyntaxKind::ReturnsKeyword) {
            node.push_node(self.parse_return_type()?);
        }
        node.push_node(self.parse_block()?);
        self.end()?;
        Ok(node)
    }

    fn parse_fork(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::ForkStmt);
        self.start(Ctx::ForkStmt);
        node.push_token(self.expect(Ctx::ForkKeyword)?);
        node.push_token(self.expect(Ctx::OpenBrace)?);
        loop {
            let choice = self.decide(Ctx::ForkBodyOrEnd, |k| {
                k == SyntaxKind::CloseBrace || k == SyntaxKind::WorkerKeyword
            })?;
            if choice == Choice::Kind(SyntaxKind::CloseBrace) {
                break;
            }
            node.push_node(self.parse_worker()?);
        }
        node.push_token(self.expect(Ctx::CloseBrace)?);
        self.end()?;
        Ok(node)
    }

    /// `break;` and `continue;`
    fn parse_jump(&mut self, kind: NodeKind, production: Ctx, keyword: Ctx) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(kind);
        self.start(production);
        node.push_token(self.expect(keyword)?);
        node.push_token(self.expect(Ctx::Semicolon)?);
        self.end()?;
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse;
    use crate::tree::NodeKind;

    #[test]
    fn else_if_chain_nests_clauses() {
        let out = parse("function f() { if a { } else if b { } else { x = 1; } }").unwrap();
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let outer = out.tree.find(NodeKind::IfStmt).unwrap();
        let clause = outer.find(NodeKind::ElseClause).unwrap();
        let inner = clause.find(NodeKind::IfStmt).unwrap();
        assert!(inner.find(NodeKind::ElseClause).is_some());
        assert_eq!(out.tree.count(NodeKind::Block), 4);
    }

    #[test]
    fn statements_after_if_continue_in_the_block() {
        let out = parse("function f() { if a { } return; }").unwrap();
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let body = out.tree.find(NodeKind::Block).unwrap();
        assert_eq!(body.child_nodes().count(), 2);
    }

    #[test]
    fn var_keyword_declaration() {
        let out = parse("function f() { var x = 1; var y; continue; }").unwrap();
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert_eq!(out.tree.count(NodeKind::VarDecl), 2);
        assert_eq!(out.tree.count(NodeKind::ContinueStmt), 1);
    }

    #[test]
    fn missing_semicolon_before_close_brace_is_inserted() {
        let out = parse("function f() { int x = 1 }").unwrap();
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].message, "missing ';'");
        assert_eq!(out.tree.count(NodeKind::VarDecl), 1);
    }

    #[test]
    fn match_clauses_with_alternative_patterns() {
        let out = parse("function f() { match v { 1 | 2 => { } [var h, _] | {k: 3} => { } } }").unwrap();
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let stmt = out.tree.find(NodeKind::MatchStmt).unwrap();
        assert_eq!(stmt.count(NodeKind::MatchClause), 2);
        assert_eq!(stmt.count(NodeKind::ConstPattern), 3);
        assert_eq!(stmt.count(NodeKind::ListPattern), 1);
        assert_eq!(stmt.count(NodeKind::FieldPattern), 1);
    }

    #[test]
    fn missing_match_arrow_is_inserted() {
        let out = parse("function f() { match x { 1 { } } }").unwrap();
        let messages: Vec<_> = out.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["missing '=>'"]);
        let clause = out.tree.find(NodeKind::MatchClause).unwrap();
        assert_eq!(clause.count(NodeKind::Block), 1);
    }

    #[test]
    fn missing_in_keyword_is_inserted() {
        let out = parse("function f() { foreach var e xs { } }").unwrap();
        let messages: Vec<_> = out.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["missing 'in'"]);
        let stmt = out.tree.find(NodeKind::ForeachStmt).unwrap();
        assert_eq!(stmt.count(NodeKind::NameRef), 1);
    }

    #[test]
    fn unnamed_worker_gets_a_name() {
        let out = parse("function f() { worker { } }").unwrap();
        let messages: Vec<_> = out.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["missing identifier"]);
        let worker = out.tree.find(NodeKind::WorkerDecl).unwrap();
        assert!(worker.tokens().into_iter().any(|t| t.missing));
    }

    #[test]
    fn send_statement_targets_a_peer() {
        let out = parse("function f() { fork { worker a { v -> b; } worker b { } } }").unwrap();
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert_eq!(out.tree.count(NodeKind::SendStmt), 1);
    }
}
