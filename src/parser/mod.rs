//! Hand-written predictive recursive-descent parser over the filtered
//! token stream. Each `parse_*` method consumes tokens from `self.pos`
//! onward and returns the parsed node; lookahead never exceeds two tokens
//! (see [`Parser::peek2`]).
//!
//! Two entry points mirror the driver's two kinds of files:
//! [`parse_regular_file`] and [`parse_builtins_file`]. The grammar itself
//! does not differentiate between them — a regular file may declare
//! `builtin` structs and functions too — the distinction matters only to
//! the driver and cross-referencer.

use std::fmt::{self, Display};

use crate::ast::{
    Arg, BodyItem, EnumDecl, EnumVariant, FunctionBody, FunctionCall, FunctionDecl,
    FunctionPointerTypeLiteral, Import, ImportItem, MatchCase, ReturnTypes, SourceFile,
    StructDecl, StructField, TopLevelItem, TypeLiteral, TypeOrFnPtr,
};
use crate::lexer::{Token, TokenKind};
use crate::position::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub expected: Vec<TokenKind>,
    pub found: Option<Token>,
    pub position: Position,
    /// Overrides the generic "expected X, found Y" rendering below for
    /// errors that aren't a plain token mismatch (e.g. leftover top-level
    /// tokens after a complete parse).
    pub message: Option<String>,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = &self.message {
            return write!(f, "{message}");
        }
        let expected = self
            .expected
            .iter()
            .map(|k| format!("{k:?}"))
            .collect::<Vec<_>>()
            .join(" or ");
        match &self.found {
            Some(token) => write!(
                f,
                "expected {expected}, found {:?} {:?}",
                token.kind, token.text
            ),
            None => write!(f, "expected {expected}, found end of file"),
        }
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Position to blame when we run out of tokens entirely.
    eof_position: Position,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], eof_position: Position) -> Self {
        Self {
            tokens,
            pos: 0,
            eof_position,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek2(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos + 1)
    }

    fn current_position(&self) -> Position {
        self.peek()
            .map(|t| t.position.clone())
            .unwrap_or_else(|| self.eof_position.clone())
    }

    fn error(&self, expected: &[TokenKind]) -> ParseError {
        ParseError {
            expected: expected.to_vec(),
            found: self.peek().cloned(),
            position: self.current_position(),
            message: None,
        }
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().map(|t| t.kind == kind).unwrap_or(false)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<&'a Token> {
        if self.check(kind) {
            Ok(self.advance().unwrap())
        } else {
            Err(self.error(&[kind]))
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<(String, Position)> {
        let token = self.expect(TokenKind::Identifier)?;
        Ok((token.text.clone(), token.position.clone()))
    }

    fn expect_string(&mut self) -> ParseResult<(String, Position)> {
        let token = self.expect(TokenKind::String)?;
        Ok((
            crate::lexer::unescape_string_literal(&token.text),
            token.position.clone(),
        ))
    }

    /// Parse `(item sep)* item? sep?`-shaped comma lists, accepting a
    /// trailing separator.
    fn parse_comma_list<T>(
        &mut self,
        end: TokenKind,
        mut parse_item: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        let mut items = Vec::new();
        if self.check(end) {
            return Ok(items);
        }
        loop {
            items.push(parse_item(self)?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
            if self.check(end) {
                break;
            }
        }
        Ok(items)
    }

    fn parse_source_file(&mut self) -> ParseResult<SourceFile> {
        let mut items = Vec::new();
        while let Some(token) = self.peek() {
            let item = match token.kind {
                TokenKind::From => TopLevelItem::Import(self.parse_import()?),
                TokenKind::Struct => TopLevelItem::Struct(self.parse_struct(false)?),
                TokenKind::Enum => TopLevelItem::Enum(self.parse_enum()?),
                TokenKind::Fn => TopLevelItem::Function(self.parse_function(false)?),
                TokenKind::Builtin => match self.peek2().map(|t| t.kind) {
                    Some(TokenKind::Struct) => {
                        self.advance();
                        TopLevelItem::Struct(self.parse_struct(true)?)
                    }
                    Some(TokenKind::Fn) => {
                        self.advance();
                        TopLevelItem::Function(self.parse_function(true)?)
                    }
                    _ => {
                        return Err(self.error(&[TokenKind::Struct, TokenKind::Fn]));
                    }
                },
                _ => break,
            };
            items.push(item);
        }
        Ok(SourceFile::new(items))
    }

    fn parse_import(&mut self) -> ParseResult<Import> {
        let position = self.expect(TokenKind::From)?.position.clone();
        let (source, _) = self.expect_string()?;
        self.expect(TokenKind::Import)?;
        // No bracketing token ends an import list; it simply runs until the
        // next top-level declaration (or EOF), so a trailing comma is only
        // recognisable by the absence of a following identifier.
        let mut items = vec![self.parse_import_item()?];
        while self.eat(TokenKind::Comma) {
            if !self.check(TokenKind::Identifier) {
                break;
            }
            items.push(self.parse_import_item()?);
        }
        Ok(Import {
            source,
            items,
            position,
        })
    }

    fn parse_import_item(&mut self) -> ParseResult<ImportItem> {
        let (original, position) = self.expect_identifier()?;
        let imported = if self.eat(TokenKind::As) {
            self.expect_identifier()?.0
        } else {
            original.clone()
        };
        Ok(ImportItem {
            original,
            imported,
            position,
        })
    }

    fn parse_flat_type_literal(&mut self) -> ParseResult<(String, Vec<String>, Position)> {
        let (name, position) = self.expect_identifier()?;
        let mut params = Vec::new();
        if self.eat(TokenKind::LBracket) {
            params = self.parse_comma_list(TokenKind::RBracket, |p| Ok(p.expect_identifier()?.0))?;
            self.expect(TokenKind::RBracket)?;
        }
        Ok((name, params, position))
    }

    fn parse_struct(&mut self, is_builtin: bool) -> ParseResult<StructDecl> {
        let position = self.expect(TokenKind::Struct)?.position.clone();
        let (name, type_params, _) = self.parse_flat_type_literal()?;
        self.expect(TokenKind::LBrace)?;
        let fields = self.parse_comma_list(TokenKind::RBrace, |p| p.parse_struct_field())?;
        self.expect(TokenKind::RBrace)?;
        Ok(StructDecl {
            name,
            type_params,
            fields,
            is_builtin,
            position,
        })
    }

    fn parse_struct_field(&mut self) -> ParseResult<StructField> {
        let (name, position) = self.expect_identifier()?;
        self.expect(TokenKind::As)?;
        let type_ = self.parse_type_or_fn_ptr()?;
        Ok(StructField {
            name,
            type_,
            position,
        })
    }

    fn parse_enum(&mut self) -> ParseResult<EnumDecl> {
        let position = self.expect(TokenKind::Enum)?.position.clone();
        let (name, _) = self.expect_identifier()?;
        self.expect(TokenKind::LBrace)?;
        let variants = self.parse_comma_list(TokenKind::RBrace, |p| p.parse_enum_variant())?;
        self.expect(TokenKind::RBrace)?;
        Ok(EnumDecl {
            name,
            variants,
            position,
        })
    }

    fn parse_enum_variant(&mut self) -> ParseResult<EnumVariant> {
        let (name, position) = self.expect_identifier()?;
        let mut data = Vec::new();
        if self.eat(TokenKind::As) {
            if self.eat(TokenKind::LBrace) {
                data = self.parse_comma_list(TokenKind::RBrace, |p| p.parse_type_or_fn_ptr())?;
                self.expect(TokenKind::RBrace)?;
            } else {
                data.push(self.parse_type_or_fn_ptr()?);
            }
        }
        Ok(EnumVariant {
            name,
            data,
            position,
        })
    }

    fn parse_type_or_fn_ptr(&mut self) -> ParseResult<TypeOrFnPtr> {
        if self.check(TokenKind::Fn) {
            return Ok(TypeOrFnPtr::FunctionPointer(
                self.parse_function_pointer_type()?,
            ));
        }
        Ok(TypeOrFnPtr::Named(self.parse_type_literal()?))
    }

    fn parse_type_literal(&mut self) -> ParseResult<TypeLiteral> {
        let is_const = self.eat(TokenKind::Const);
        let (name, position) = self.expect_identifier()?;
        let mut params = Vec::new();
        if self.eat(TokenKind::LBracket) {
            params = self.parse_comma_list(TokenKind::RBracket, |p| p.parse_type_or_fn_ptr())?;
            self.expect(TokenKind::RBracket)?;
        }
        Ok(TypeLiteral {
            name,
            params,
            is_const,
            position,
        })
    }

    fn parse_function_pointer_type(&mut self) -> ParseResult<FunctionPointerTypeLiteral> {
        let position = self.expect(TokenKind::Fn)?.position.clone();
        self.expect(TokenKind::LBracket)?;
        let arg_types = self.parse_comma_list(TokenKind::RBracket, |p| p.parse_type_or_fn_ptr())?;
        self.expect(TokenKind::RBracket)?;
        self.expect(TokenKind::LBracket)?;
        let return_types = if self.eat(TokenKind::Never) {
            ReturnTypes::Never
        } else {
            ReturnTypes::Types(
                self.parse_comma_list(TokenKind::RBracket, |p| p.parse_type_or_fn_ptr())?,
            )
        };
        self.expect(TokenKind::RBracket)?;
        Ok(FunctionPointerTypeLiteral {
            arg_types,
            return_types,
            position,
        })
    }

    fn parse_function(&mut self, is_builtin: bool) -> ParseResult<FunctionDecl> {
        let position = self.expect(TokenKind::Fn)?.position.clone();
        let (flat_name, generic_params, _) = self.parse_flat_type_literal()?;
        let (struct_name, name) = if self.eat(TokenKind::Colon) {
            let (member_name, _) = self.expect_identifier()?;
            (Some(flat_name), member_name)
        } else {
            (None, flat_name)
        };

        let args = if self.eat(TokenKind::Args) {
            self.parse_arg_list()?
        } else {
            Vec::new()
        };

        let return_types = if self.eat(TokenKind::Return) {
            if self.eat(TokenKind::Never) {
                ReturnTypes::Never
            } else {
                ReturnTypes::Types(self.parse_return_type_list()?)
            }
        } else {
            ReturnTypes::Types(vec![])
        };

        let body = if self.check(TokenKind::LBrace) {
            Some(self.parse_body()?)
        } else {
            None
        };

        Ok(FunctionDecl {
            struct_name,
            name,
            generic_params,
            args,
            return_types,
            body,
            is_builtin,
            position,
        })
    }

    /// `ArgList` has no fixed terminator token (it is followed by `return`,
    /// `{`, or the end of the declaration), so it is parsed manually
    /// instead of via [`Parser::parse_comma_list`].
    fn parse_arg_list(&mut self) -> ParseResult<Vec<Arg>> {
        let mut args = vec![self.parse_arg()?];
        while self.eat(TokenKind::Comma) {
            if self.check(TokenKind::Return) || self.check(TokenKind::LBrace) {
                break;
            }
            args.push(self.parse_arg()?);
        }
        Ok(args)
    }

    fn parse_arg(&mut self) -> ParseResult<Arg> {
        let (name, position) = self.expect_identifier()?;
        self.expect(TokenKind::As)?;
        let type_ = self.parse_type_or_fn_ptr()?;
        Ok(Arg {
            name,
            type_,
            position,
        })
    }

    fn parse_return_type_list(&mut self) -> ParseResult<Vec<TypeOrFnPtr>> {
        let mut types = vec![self.parse_type_or_fn_ptr()?];
        while self.eat(TokenKind::Comma) {
            if self.check(TokenKind::LBrace) {
                break;
            }
            types.push(self.parse_type_or_fn_ptr()?);
        }
        Ok(types)
    }

    fn parse_body(&mut self) -> ParseResult<FunctionBody> {
        self.expect(TokenKind::LBrace)?;
        let mut items = Vec::new();
        while !self.check(TokenKind::RBrace) {
            items.push(self.parse_body_item()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(FunctionBody::new(items))
    }

    fn parse_body_item(&mut self) -> ParseResult<BodyItem> {
        let Some(token) = self.peek() else {
            return Err(self.error(&[]));
        };
        let position = token.position.clone();
        match token.kind {
            TokenKind::Integer => {
                let text = self.advance().unwrap().text.clone();
                let value: i64 = text.parse().map_err(|_| ParseError {
                    expected: vec![TokenKind::Integer],
                    found: None,
                    position: position.clone(),
                    message: None,
                })?;
                Ok(BodyItem::IntegerLiteral { value, position })
            }
            TokenKind::True | TokenKind::False => {
                let value = token.kind == TokenKind::True;
                self.advance();
                Ok(BodyItem::BooleanLiteral { value, position })
            }
            TokenKind::String => self.parse_string_led_item(),
            TokenKind::Return => {
                self.advance();
                Ok(BodyItem::Return { position })
            }
            TokenKind::Call => {
                self.advance();
                Ok(BodyItem::IndirectCall { position })
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Foreach => self.parse_foreach(),
            TokenKind::Match => self.parse_match(),
            TokenKind::Use => self.parse_use(),
            TokenKind::Identifier => self.parse_identifier_led_item(),
            _ => Err(self.error(&[
                TokenKind::Integer,
                TokenKind::String,
                TokenKind::Identifier,
                TokenKind::If,
                TokenKind::While,
                TokenKind::Foreach,
                TokenKind::Match,
                TokenKind::Use,
                TokenKind::Return,
                TokenKind::Call,
            ])),
        }
    }

    /// A `STRING` can start a field query (`"f" ?`), a field update
    /// (`"f" { .. } !`) or a get-function-pointer (`"name" fn`); peeking one
    /// token past the string disambiguates all three.
    fn parse_string_led_item(&mut self) -> ParseResult<BodyItem> {
        let (value, position) = self.expect_string()?;
        if self.eat(TokenKind::Question) {
            return Ok(BodyItem::FieldQuery {
                field: value,
                position,
            });
        }
        if self.check(TokenKind::LBrace) {
            let body = self.parse_body()?;
            self.expect(TokenKind::Bang)?;
            return Ok(BodyItem::FieldUpdate {
                field: value,
                body,
                position,
            });
        }
        if self.eat(TokenKind::Fn) {
            return Ok(BodyItem::GetFunctionPointer {
                name: value,
                position,
            });
        }
        Err(self.error(&[TokenKind::Question, TokenKind::LBrace, TokenKind::Fn]))
    }

    /// An `IDENTIFIER` can start a call (`name`, `name:member`,
    /// `name[T]`), an assignment (`name, ... <- { .. }`), or it can simply
    /// be the call itself. Two tokens of lookahead (comma or `<-` following
    /// the identifier list) distinguish a call from an assignment.
    fn parse_identifier_led_item(&mut self) -> ParseResult<BodyItem> {
        if self.looks_like_assignment() {
            return self.parse_assignment();
        }
        let call = self.parse_call()?;
        Ok(BodyItem::Call(call))
    }

    fn looks_like_assignment(&self) -> bool {
        let mut offset = self.pos;
        loop {
            match self.tokens.get(offset).map(|t| t.kind) {
                Some(TokenKind::Identifier) => offset += 1,
                _ => return false,
            }
            match self.tokens.get(offset).map(|t| t.kind) {
                Some(TokenKind::Comma) => {
                    offset += 1;
                    continue;
                }
                Some(TokenKind::LeftArrow) => return true,
                _ => return false,
            }
        }
    }

    fn parse_call(&mut self) -> ParseResult<FunctionCall> {
        let (name, position) = self.expect_identifier()?;
        let qualifier = if self.eat(TokenKind::Colon) {
            Some(name.clone())
        } else {
            None
        };
        let name = if qualifier.is_some() {
            self.expect_identifier()?.0
        } else {
            name
        };
        let mut type_params = Vec::new();
        if self.eat(TokenKind::LBracket) {
            type_params = self.parse_comma_list(TokenKind::RBracket, |p| p.parse_type_or_fn_ptr())?;
            self.expect(TokenKind::RBracket)?;
        }
        Ok(FunctionCall {
            qualifier,
            name,
            type_params,
            position,
        })
    }

    fn parse_if(&mut self) -> ParseResult<BodyItem> {
        let position = self.expect(TokenKind::If)?.position.clone();
        let condition = self.parse_body()?;
        let if_body = self.parse_body()?;
        let else_body = if self.eat(TokenKind::Else) {
            Some(self.parse_body()?)
        } else {
            None
        };
        Ok(BodyItem::If {
            condition,
            if_body,
            else_body,
            position,
        })
    }

    fn parse_while(&mut self) -> ParseResult<BodyItem> {
        let position = self.expect(TokenKind::While)?.position.clone();
        let condition = self.parse_body()?;
        let body = self.parse_body()?;
        Ok(BodyItem::While {
            condition,
            body,
            position,
        })
    }

    fn parse_foreach(&mut self) -> ParseResult<BodyItem> {
        let position = self.expect(TokenKind::Foreach)?.position.clone();
        let body = self.parse_body()?;
        Ok(BodyItem::Foreach { body, position })
    }

    fn parse_match(&mut self) -> ParseResult<BodyItem> {
        let position = self.expect(TokenKind::Match)?.position.clone();
        self.expect(TokenKind::LBrace)?;
        let mut cases = Vec::new();
        let mut default = None;
        while self.check(TokenKind::Case) || self.check(TokenKind::Default) {
            if self.eat(TokenKind::Case) {
                let (enum_name, case_position) = self.expect_identifier()?;
                self.expect(TokenKind::Colon)?;
                let (variant, _) = self.expect_identifier()?;
                let mut bindings = Vec::new();
                if self.eat(TokenKind::As) {
                    bindings.push(self.expect_identifier()?.0);
                    while self.eat(TokenKind::Comma) {
                        bindings.push(self.expect_identifier()?.0);
                    }
                }
                let body = self.parse_body()?;
                cases.push(MatchCase {
                    enum_name,
                    variant,
                    bindings,
                    body,
                    position: case_position,
                });
            } else {
                self.expect(TokenKind::Default)?;
                default = Some(self.parse_body()?);
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(BodyItem::Match {
            cases,
            default,
            position,
        })
    }

    fn parse_use(&mut self) -> ParseResult<BodyItem> {
        let position = self.expect(TokenKind::Use)?.position.clone();
        let mut variables = vec![self.expect_identifier()?.0];
        while self.eat(TokenKind::Comma) {
            variables.push(self.expect_identifier()?.0);
        }
        let body = self.parse_body()?;
        Ok(BodyItem::Use {
            variables,
            body,
            position,
        })
    }

    fn parse_assignment(&mut self) -> ParseResult<BodyItem> {
        let (first, position) = self.expect_identifier()?;
        let mut variables = vec![first];
        while self.eat(TokenKind::Comma) {
            variables.push(self.expect_identifier()?.0);
        }
        self.expect(TokenKind::LeftArrow)?;
        let body = self.parse_body()?;
        Ok(BodyItem::Assign {
            variables,
            body,
            position,
        })
    }

    fn finish(self, source_file: SourceFile) -> ParseResult<SourceFile> {
        if let Some(token) = self.peek() {
            return Err(ParseError {
                expected: vec![],
                found: Some(token.clone()),
                position: token.position.clone(),
                message: Some("unhandled top-level token".to_string()),
            });
        }
        Ok(source_file)
    }
}

/// Parse a regular source file's filtered token stream into an AST.
pub fn parse_regular_file(tokens: &[Token], eof_position: Position) -> ParseResult<SourceFile> {
    let mut parser = Parser::new(tokens, eof_position);
    let file = parser.parse_source_file()?;
    parser.finish(file)
}

/// Parse the builtins file's filtered token stream. Grammatically
/// identical to a regular file; kept as a distinct entry point because the
/// driver and cross-referencer treat the builtins file's declarations
/// specially (visible to every other file without an explicit import).
pub fn parse_builtins_file(tokens: &[Token], eof_position: Position) -> ParseResult<SourceFile> {
    parse_regular_file(tokens, eof_position)
}
