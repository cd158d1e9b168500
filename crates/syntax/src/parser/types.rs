use super::{starts_type, Choice, Parser};
use crate::context::GrammarContext as Ctx;
use crate::error::SyntaxError;
use crate::token::SyntaxKind;
use crate::tree::{NodeKind, SyntaxNode};

impl Parser {
    pub(super) fn parse_type_descriptor(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let base = match self.decide(Ctx::TypeDescriptor, starts_type)? {
            Choice::Kind(SyntaxKind::RecordKeyword) | Choice::Path(Ctx::RecordTypeDesc) => {
                self.parse_record_type()?
            }
            Choice::Kind(SyntaxKind::ObjectKeyword) | Choice::Path(Ctx::ObjectTypeDesc) => {
                self.parse_object_type()?
            }
            Choice::Kind(kind) if kind.is_builtin_type() => {
                SyntaxNode::leaf(NodeKind::BuiltinType, self.expect(Ctx::BuiltinTypeDescriptor)?)
            }
            _ => SyntaxNode::leaf(NodeKind::TypeReference, self.expect(Ctx::TypeReference)?),
        };
        Ok(self.parse_optional_suffix(base))
    }

    /// `T?`. The suffix is optional, so its absence never needs recovery.
    pub(super) fn parse_optional_suffix(&mut self, base: SyntaxNode) -> SyntaxNode {
        if self.peek_kind() != SyntaxKind::QuestionMark {
            return base;
        }
        let mut node = SyntaxNode::new(NodeKind::OptionalType);
        node.push_node(base);
        node.push_token(self.bump());
        node
    }

    fn parse_record_type(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::RecordTypeDescriptor);
        self.start(Ctx::RecordTypeDesc);
        node.push_token(self.expect(Ctx::RecordKeyword)?);
        node.push_token(self.expect(Ctx::OpenBrace)?);
        loop {
            let choice = self.decide(Ctx::RecordFieldOrEnd, |k| {
                k == SyntaxKind::CloseBrace || starts_type(k)
            })?;
            if choice == Choice::Kind(SyntaxKind::CloseBrace) {
                break;
            }
            node.push_node(self.parse_record_field()?);
        }
        node.push_token(self.expect(Ctx::CloseBrace)?);
        self.end()?;
        Ok(node)
    }

    fn parse_record_field(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::RecordField);
        self.start(Ctx::RecordField);
        node.push_node(self.parse_type_descriptor()?);
        node.push_token(self.expect(Ctx::FieldName)?);
        node.push_token(self.expect(Ctx::Semicolon)?);
        self.end()?;
        Ok(node)
    }

    /// `object { T field; function m(params) returns T; }`
    fn parse_object_type(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::ObjectTypeDescriptor);
        self.start(Ctx::ObjectTypeDesc);
        node.push_token(self.expect(Ctx::ObjectKeyword)?);
        node.push_token(self.expect(Ctx::OpenBrace)?);
        let starts_member = |k: SyntaxKind| k == SyntaxKind::FunctionKeyword || starts_type(k);
        loop {
            let choice = self.decide(Ctx::ObjectMemberOrEnd, |k| {
                k == SyntaxKind::CloseBrace || starts_member(k)
            })?;
            if choice == Choice::Kind(SyntaxKind::CloseBrace) {
                break;
            }
            let member = match self.decide(Ctx::ObjectMember, starts_member)? {
                Choice::Kind(SyntaxKind::FunctionKeyword) | Choice::Path(Ctx::ObjectMethod) => {
                    self.parse_method_declaration()?
                }
                _ => {
                    let mut field = SyntaxNode::new(NodeKind::ObjectField);
                    self.start(Ctx::ObjectField);
                    field.push_node(self.parse_type_descriptor()?);
                    field.push_token(self.expect(Ctx::FieldName)?);
                    field.push_token(self.expect(Ctx::Semicolon)?);
                    self.end()?;
                    field
                }
            };
            node.push_node(member);
        }
        node.push_token(self.expect(Ctx::CloseBrace)?);
        self.end()?;
        Ok(node)
    }

    fn parse_method_declaration(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let mut node = SyntaxNode::new(NodeKind::MethodDeclaration);
        self.start(Ctx::ObjectMethod);
        node.push_token(self.expect(Ctx::FunctionKeyword)?);
        node.push_token(self.expect(Ctx::FunctionName)?);
        node.push_node(self.parse_param_list()?);
        let rhs = self.decide(Ctx::MethodDeclRhs, |k| {
            k == SyntaxKind::Semicolon || k == SyntaxKind::ReturnsKeyword
        })?;
        if rhs == Choice::Kind(SyntaxKind::ReturnsKeyword) {
            node.push_node(self.parse_return_type()?);
        }
        node.push_token(self.expect(Ctx::Semicolon)?);
        self.end()?;
        Ok(node)
    }
}
