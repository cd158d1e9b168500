use super::{starts_top_level_construct, starts_type, Choice, Parser};
use crate::context::GrammarContext as Ctx;
use crate::error::SyntaxError;
use crate::token::SyntaxKind;
use crate::tree::{NodeKind, SyntaxElement, SyntaxNode};

impl Parser {
    pub(super) fn parse_comp_unit(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut root = SyntaxNode::new(NodeKind::CompUnit);
        self.start(Ctx::CompUnit);
        while let Some(node) = self.parse_top_level_node()? {
            root.push_node(node);
        }
        root.push_token(self.bump());
        self.end()?;
        Ok(root)
    }

    /// `None` once end of input is reached.
    fn parse_top_level_node(&mut self) -> Result<Option<SyntaxNode>, SyntaxError> {
        let choice = self.decide(Ctx::TopLevelNode, |k| {
            matches!(
                k,
                SyntaxKind::Eof
                    | SyntaxKind::ImportKeyword
                    | SyntaxKind::DocumentationString
                    | SyntaxKind::PublicKeyword
            ) || starts_top_level_construct(k)
        })?;
        let node = match choice {
            Choice::Kind(SyntaxKind::Eof) => {
                self.skip_trailing_input();
                return Ok(None);
            }
            Choice::Kind(SyntaxKind::ImportKeyword) | Choice::Path(Ctx::ImportDecl) => {
                self.parse_import()?
            }
            Choice::Kind(SyntaxKind::DocumentationString) => {
                let doc = self.expect(Ctx::DocString)?;
                let mut node = self.parse_without_metadata()?;
                node.prepend(vec![SyntaxElement::Token(doc)]);
                node
            }
            _ => self.parse_without_metadata()?,
        };
        Ok(Some(node))
    }

    fn parse_without_metadata(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let choice = self.decide(Ctx::TopLevelNodeWithoutMetadata, |k| {
            k == SyntaxKind::PublicKeyword || starts_top_level_construct(k)
        })?;
        let mut prefix = Vec::new();
        if choice == Choice::Kind(SyntaxKind::PublicKeyword) {
            prefix.push(SyntaxElement::Token(self.expect(Ctx::PublicKeyword)?));
        }
        let mut node = self.parse_without_modifier()?;
        node.prepend(prefix);
        Ok(node)
    }

    fn parse_without_modifier(&mut self) -> Result<SyntaxNode, SyntaxError> {
        match self.decide(Ctx::TopLevelNodeWithoutModifier, starts_top_level_construct)? {
            Choice::Kind(SyntaxKind::FunctionKeyword) | Choice::Path(Ctx::FuncDefinition) => {
                self.parse_function()
            }
            Choice::Kind(SyntaxKind::TypeKeyword) | Choice::Path(Ctx::TypeDefinition) => {
                self.parse_type_definition()
            }
            Choice::Kind(SyntaxKind::ConstKeyword) | Choice::Path(Ctx::ConstDecl) => {
                self.parse_const_decl()
            }
            _ => self.parse_var_decl(),
        }
    }

    // -- Imports ------------------------------------------------

    fn parse_import(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::ImportDecl);
        self.start(Ctx::ImportDecl);
        node.push_token(self.expect(Ctx::ImportKeyword)?);
        node.push_token(self.expect(Ctx::ImportOrgOrModuleName)?);
        let rhs = self.decide(Ctx::ImportNameRhs, |k| {
            k == SyntaxKind::Slash || k == SyntaxKind::Semicolon
        })?;
        if rhs == Choice::Kind(SyntaxKind::Slash) {
            node.push_token(self.expect(Ctx::Slash)?);
            node.push_token(self.expect(Ctx::ImportModuleName)?);
        }
        node.push_token(self.expect(Ctx::Semicolon)?);
        self.end()?;
        Ok(node)
    }

    // -- Functions ----------------------------------------------

    fn parse_function(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::FunctionDefinition);
        self.start(Ctx::FuncDefinition);
        node.push_token(self.expect(Ctx::FunctionKeyword)?);
        node.push_token(self.expect(Ctx::FunctionName)?);
        node.push_node(self.parse_param_list()?);

        let choice = self.decide(Ctx::ReturnTypeOrBody, |k| {
            k == SyntaxKind::OpenBrace || k == SyntaxKind::ReturnsKeyword
        })?;
        if choice == Choice::Kind(SyntaxKind::ReturnsKeyword) {
            node.push_node(self.parse_return_type()?);
        }
        node.push_node(self.parse_block()?);
        self.end()?;
        Ok(node)
    }

    /// `returns T`
    pub(super) fn parse_return_type(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::ReturnTypeDescriptor);
        node.push_token(self.expect(Ctx::ReturnsKeyword)?);
        node.push_node(self.parse_type_descriptor()?);
        Ok(node)
    }

    pub(super) fn parse_param_list(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::ParamList);
        self.start(Ctx::ParamList);
        node.push_token(self.expect(Ctx::OpenParenthesis)?);
        let first = self.decide(Ctx::ParamStart, |k| {
            k == SyntaxKind::CloseParen || starts_type(k)
        })?;
        if first != Choice::Kind(SyntaxKind::CloseParen) {
            loop {
                node.push_node(self.parse_parameter()?);
                let next = self.decide(Ctx::ParamEnd, |k| {
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

    fn parse_parameter(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::Parameter);
        node.push_node(self.parse_type_descriptor()?);
        node.push_token(self.expect(Ctx::ParameterName)?);
        Ok(node)
    }

    // -- Type and constant definitions --------------------------

    fn parse_type_definition(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::TypeDefinition);
        self.start(Ctx::TypeDefinition);
        node.push_token(self.expect(Ctx::TypeKeyword)?);
        node.push_token(self.expect(Ctx::TypeName)?);
        node.push_node(self.parse_type_descriptor()?);
        node.push_token(self.expect(Ctx::Semicolon)?);
        self.end()?;
        Ok(node)
    }

    fn parse_const_decl(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::ConstDecl);
        self.start(Ctx::ConstDecl);
        node.push_token(self.expect(Ctx::ConstKeyword)?);
        node.push_token(self.expect(Ctx::ConstName)?);
        node.push_token(self.expect(Ctx::AssignOp)?);
        node.push_node(self.parse_expression()?);
        node.push_token(self.expect(Ctx::Semicolon)?);
        self.end()?;
        Ok(node)
    }
}
