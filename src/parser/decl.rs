//! Builds one [`AstDecl`] from a [`PreparsedItem`]'s token span. `Module`
//! bodies recurse through [`parse_decl_sequence`] directly over raw tokens
//! (braces already balanced by [`crate::preparser`]'s span collection) since
//! nested declarations never went through their own preparser pass.

use crate::ast::{
    AstDecl, AstDeclKind, ConstantDecl, ErrorDecl, FunDecl, FunParam, MethodDecl, ModuleDecl, ObjectBody, ObjectDecl,
    TypeBody, TypeDecl,
};
use crate::diagnostics::errors::CompilerError;
use crate::parser::cursor::Cursor;
use crate::parser::data_type::parse_data_type;
use crate::parser::expr::parse_expr;
use crate::parser::stmt::parse_block;
use crate::preparser::{PreparsedItem, PreparsedKind};
use crate::token::token::{Keyword, Punct};
use crate::token::TokenKind;

fn parse_generics(c: &mut Cursor) -> Result<Vec<String>, CompilerError> {
    let mut generics = Vec::new();
    if matches!(c.peek(), TokenKind::Punct(Punct::LBracket)) {
        c.advance();
        loop {
            match c.peek().clone() {
                TokenKind::Identifier(name) => {
                    c.advance();
                    generics.push(name);
                }
                _ => return Err(c.error("expected a generic parameter name")),
            }
            if matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                c.advance();
            } else {
                break;
            }
        }
        c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBracket)), "expected ']' closing generic parameter list")?;
    }
    Ok(generics)
}

fn parse_fun_params(c: &mut Cursor) -> Result<Vec<FunParam>, CompilerError> {
    c.expect(|k| matches!(k, TokenKind::Punct(Punct::LParen)), "expected '(' to start a parameter list")?;
    let mut params = Vec::new();
    if !matches!(c.peek(), TokenKind::Punct(Punct::RParen)) {
        loop {
            let name = match c.peek().clone() {
                TokenKind::Identifier(name) => {
                    c.advance();
                    name
                }
                TokenKind::Keyword(Keyword::SelfValue) => {
                    c.advance();
                    "self".to_string()
                }
                _ => return Err(c.error("expected a parameter name")),
            };
            let ty = if matches!(c.peek(), TokenKind::Punct(Punct::Colon)) {
                c.advance();
                Some(parse_data_type(c)?)
            } else {
                None
            };
            let default = if matches!(c.peek(), TokenKind::Punct(Punct::Assign)) {
                c.advance();
                Some(parse_expr(c)?)
            } else {
                None
            };
            params.push(FunParam { name, ty, default });
            if matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                c.advance();
            } else {
                break;
            }
        }
    }
    c.expect(|k| matches!(k, TokenKind::Punct(Punct::RParen)), "expected ')' closing parameter list")?;
    Ok(params)
}

fn parse_fun(c: &mut Cursor) -> Result<FunDecl, CompilerError> {
    c.expect(|k| matches!(k, TokenKind::Keyword(Keyword::Fun)), "expected 'fun'")?;
    let name = match c.peek().clone() {
        TokenKind::Identifier(name) => {
            c.advance();
            name
        }
        _ => return Err(c.error("expected a function name")),
    };
    let generics = parse_generics(c)?;
    let params = parse_fun_params(c)?;
    let return_type = if matches!(c.peek(), TokenKind::Punct(Punct::Arrow)) {
        c.advance();
        Some(parse_data_type(c)?)
    } else {
        None
    };
    let body = parse_block(c)?;
    Ok(FunDecl { name, generics, params, return_type, body })
}

fn parse_constant(c: &mut Cursor) -> Result<ConstantDecl, CompilerError> {
    c.expect(|k| matches!(k, TokenKind::Keyword(Keyword::Const)), "expected 'const'")?;
    let name = match c.peek().clone() {
        TokenKind::Identifier(name) => {
            c.advance();
            name
        }
        _ => return Err(c.error("expected a constant name")),
    };
    let ty = if matches!(c.peek(), TokenKind::Punct(Punct::Colon)) {
        c.advance();
        Some(parse_data_type(c)?)
    } else {
        None
    };
    c.expect(|k| matches!(k, TokenKind::Punct(Punct::Assign)), "expected '=' after constant name")?;
    let value = parse_expr(c)?;
    Ok(ConstantDecl { name, ty, value })
}

fn parse_error(c: &mut Cursor) -> Result<ErrorDecl, CompilerError> {
    c.expect(|k| matches!(k, TokenKind::Keyword(Keyword::Error)), "expected 'error'")?;
    let name = match c.peek().clone() {
        TokenKind::Identifier(name) => {
            c.advance();
            name
        }
        _ => return Err(c.error("expected an error name")),
    };
    let payload = if matches!(c.peek(), TokenKind::Punct(Punct::LParen)) {
        c.advance();
        let ty = parse_data_type(c)?;
        c.expect(|k| matches!(k, TokenKind::Punct(Punct::RParen)), "expected ')' closing error payload type")?;
        Some(ty)
    } else {
        None
    };
    Ok(ErrorDecl { name, payload })
}

fn parse_type(c: &mut Cursor) -> Result<TypeDecl, CompilerError> {
    c.expect(|k| matches!(k, TokenKind::Keyword(Keyword::Type)), "expected 'type'")?;
    let name = match c.peek().clone() {
        TokenKind::Identifier(name) => {
            c.advance();
            name
        }
        _ => return Err(c.error("expected a type name")),
    };
    let generics = parse_generics(c)?;
    c.expect(|k| matches!(k, TokenKind::Punct(Punct::Assign)), "expected '=' after type name")?;

    let body = if matches!(c.peek(), TokenKind::Keyword(Keyword::Record)) {
        c.advance();
        c.expect(|k| matches!(k, TokenKind::Punct(Punct::LBrace)), "expected '{' to start a record body")?;
        let mut fields = Vec::new();
        while !matches!(c.peek(), TokenKind::Punct(Punct::RBrace) | TokenKind::Eof) {
            let field_name = match c.peek().clone() {
                TokenKind::Identifier(n) => {
                    c.advance();
                    n
                }
                _ => return Err(c.error("expected a field name")),
            };
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::Colon)), "expected ':' after field name")?;
            let ty = parse_data_type(c)?;
            fields.push((field_name, ty));
            if matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                c.advance();
            }
        }
        c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBrace)), "expected '}' closing record body")?;
        TypeBody::Record(fields)
    } else if matches!(c.peek(), TokenKind::Keyword(Keyword::Enum)) {
        c.advance();
        c.expect(|k| matches!(k, TokenKind::Punct(Punct::LBrace)), "expected '{' to start an enum body")?;
        let mut variants = Vec::new();
        while !matches!(c.peek(), TokenKind::Punct(Punct::RBrace) | TokenKind::Eof) {
            let variant_name = match c.peek().clone() {
                TokenKind::Identifier(n) => {
                    c.advance();
                    n
                }
                _ => return Err(c.error("expected a variant name")),
            };
            let payload = if matches!(c.peek(), TokenKind::Punct(Punct::LParen)) {
                c.advance();
                let ty = parse_data_type(c)?;
                c.expect(|k| matches!(k, TokenKind::Punct(Punct::RParen)), "expected ')' closing variant payload")?;
                Some(ty)
            } else {
                None
            };
            variants.push((variant_name, payload));
            if matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                c.advance();
            }
        }
        c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBrace)), "expected '}' closing enum body")?;
        TypeBody::Enum(variants)
    } else {
        TypeBody::Alias(parse_data_type(c)?)
    };

    Ok(TypeDecl { name, generics, body })
}

fn parse_object(c: &mut Cursor) -> Result<ObjectDecl, CompilerError> {
    c.expect(|k| matches!(k, TokenKind::Keyword(Keyword::Object)), "expected 'object'")?;
    let kind_is_trait = matches!(c.peek(), TokenKind::Keyword(Keyword::Trait));
    if matches!(c.peek(), TokenKind::Keyword(Keyword::Class) | TokenKind::Keyword(Keyword::Trait)) {
        c.advance();
    }
    let name = match c.peek().clone() {
        TokenKind::Identifier(name) => {
            c.advance();
            name
        }
        _ => return Err(c.error("expected an object name")),
    };
    let generics = parse_generics(c)?;

    let mut implements = Vec::new();
    if matches!(c.peek(), TokenKind::Keyword(Keyword::As)) {
        c.advance();
        loop {
            match c.peek().clone() {
                TokenKind::Identifier(name) => {
                    c.advance();
                    implements.push(name);
                }
                _ => return Err(c.error("expected a trait name")),
            }
            if matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                c.advance();
            } else {
                break;
            }
        }
    }

    c.expect(|k| matches!(k, TokenKind::Punct(Punct::LBrace)), "expected '{' to start an object body")?;

    let body = if kind_is_trait {
        let mut method_signatures = Vec::new();
        while !matches!(c.peek(), TokenKind::Punct(Punct::RBrace) | TokenKind::Eof) {
            method_signatures.push(parse_fun(c)?);
        }
        ObjectBody::Trait { method_signatures }
    } else {
        let mut attributes = Vec::new();
        let mut methods = Vec::new();
        while !matches!(c.peek(), TokenKind::Punct(Punct::RBrace) | TokenKind::Eof) {
            if matches!(c.peek(), TokenKind::Keyword(Keyword::Fun)) {
                methods.push(parse_fun(c)?);
            } else {
                let attr_name = match c.peek().clone() {
                    TokenKind::Identifier(n) => {
                        c.advance();
                        n
                    }
                    _ => return Err(c.error("expected an attribute name or 'fun'")),
                };
                c.expect(|k| matches!(k, TokenKind::Punct(Punct::Colon)), "expected ':' after attribute name")?;
                let ty = parse_data_type(c)?;
                attributes.push((attr_name, ty));
                if matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                    c.advance();
                }
            }
        }
        ObjectBody::Class { attributes, methods }
    };

    c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBrace)), "expected '}' closing object body")?;
    Ok(ObjectDecl { name, generics, implements, body })
}

fn parse_method(c: &mut Cursor) -> Result<MethodDecl, CompilerError> {
    c.expect(|k| matches!(k, TokenKind::Keyword(Keyword::Method)), "expected 'method'")?;
    let object_name = match c.peek().clone() {
        TokenKind::Identifier(name) => {
            c.advance();
            name
        }
        _ => return Err(c.error("expected an object name after 'method'")),
    };
    c.expect(|k| matches!(k, TokenKind::Punct(Punct::Dot)), "expected '.' between object name and method name")?;
    let fun = parse_fun(c)?;
    Ok(MethodDecl { object_name, fun })
}

/// Parses every declaration in a raw token slice (a module body, or a whole
/// package given the declarations the preparser already grouped).
pub fn parse_decl_sequence(tokens: &[crate::token::Token]) -> (Vec<AstDecl>, Vec<CompilerError>) {
    let mut c = Cursor::new(tokens);
    let mut decls = Vec::new();
    let mut errors = Vec::new();

    while !c.at_end() {
        match c.peek().clone() {
            TokenKind::Newline | TokenKind::Punct(Punct::Semicolon) => {
                c.advance();
                continue;
            }
            TokenKind::Keyword(Keyword::Pub) => {
                c.advance();
            }
            _ => {}
        }
        if c.at_end() {
            break;
        }
        let loc = c.location();
        let kind = match c.peek().clone() {
            TokenKind::Keyword(Keyword::Fun) => parse_fun(&mut c).map(AstDeclKind::Fun),
            TokenKind::Keyword(Keyword::Const) => parse_constant(&mut c).map(AstDeclKind::Constant),
            TokenKind::Keyword(Keyword::Error) => parse_error(&mut c).map(AstDeclKind::Error),
            TokenKind::Keyword(Keyword::Type) => parse_type(&mut c).map(AstDeclKind::Type),
            TokenKind::Keyword(Keyword::Object) => parse_object(&mut c).map(AstDeclKind::Object),
            TokenKind::Keyword(Keyword::Module) => parse_module(&mut c),
            TokenKind::Keyword(Keyword::Method) => parse_method(&mut c).map(AstDeclKind::Method),
            _ => Err(c.error("expected a declaration")),
        };
        match kind {
            Ok(kind) => decls.push(AstDecl::new(kind, loc)),
            Err(err) => {
                errors.push(err);
                c.advance();
            }
        }
    }

    (decls, errors)
}

fn parse_module(c: &mut Cursor) -> Result<AstDeclKind, CompilerError> {
    c.advance();
    let name = match c.peek().clone() {
        TokenKind::Identifier(name) => {
            c.advance();
            name
        }
        _ => return Err(c.error("expected a module name")),
    };
    let body_start = c.location();
    c.expect(|k| matches!(k, TokenKind::Punct(Punct::LBrace)), "expected '{' to start a module body")?;
    let mut depth = 1usize;
    let mut inner = Vec::new();
    loop {
        match c.peek().clone() {
            TokenKind::Punct(Punct::LBrace) => {
                depth += 1;
                inner.push(crate::token::Token::new(c.peek().clone(), body_start));
                c.advance();
            }
            TokenKind::Punct(Punct::RBrace) => {
                depth -= 1;
                if depth == 0 {
                    c.advance();
                    break;
                }
                inner.push(crate::token::Token::new(c.peek().clone(), body_start));
                c.advance();
            }
            TokenKind::Eof => return Err(c.error("unterminated module body")),
            other => {
                inner.push(crate::token::Token::new(other, body_start));
                c.advance();
            }
        }
    }
    let (decls, inner_errors) = parse_decl_sequence(&inner);
    if let Some(err) = inner_errors.into_iter().next() {
        return Err(err);
    }
    Ok(AstDeclKind::Module(ModuleDecl { name, decls }))
}

/// Turns one package's preparsed items into parsed declarations, recursing
/// into methods declared directly inside a preparsed `Object` item's span.
pub fn parse_item(item: &PreparsedItem) -> Result<AstDecl, CompilerError> {
    let mut c = Cursor::new(&item.tokens);
    let kind = match item.kind {
        PreparsedKind::Fun => AstDeclKind::Fun(parse_fun(&mut c)?),
        PreparsedKind::Constant => AstDeclKind::Constant(parse_constant(&mut c)?),
        PreparsedKind::Error => AstDeclKind::Error(parse_error(&mut c)?),
        PreparsedKind::Type => AstDeclKind::Type(parse_type(&mut c)?),
        PreparsedKind::Object => AstDeclKind::Object(parse_object(&mut c)?),
        PreparsedKind::Module => parse_module(&mut c)?,
        PreparsedKind::Method => AstDeclKind::Method(parse_method(&mut c)?),
    };
    Ok(AstDecl::new(kind, item.location))
}
