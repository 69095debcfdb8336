//! Parses the surface type grammar into [`crate::ast::AstDataType`].
//!
//! Primitive type names (`Int32`, `Str`, `Bool`, ...) are plain identifiers
//! recognized by a lookup table, the same way the scanner leaves most
//! keywords as ordinary identifiers unless the word is reserved — only
//! `Self`/`Result`/`Ok`/`Err`/`Optional` are real [`Keyword`] tokens here.
//! Array/pointer/reference/mut/trace/optional/list are prefix sigils:
//! `[T]` dynamic array, `[T; N]` sized, `[*T]` multi-pointer, `[_T]`
//! undetermined-size array, `&T` ref, `*T` ptr, `mut T`, `trace T`,
//! `?T` optional, `List[T]` list.

use crate::ast::{ArrayKind, AstDataType, AstDataTypeKind, CustomType, LambdaType, ResultType};
use crate::parser::cursor::Cursor;
use crate::token::token::{Keyword, Punct};
use crate::token::TokenKind;
use crate::diagnostics::errors::CompilerError;

fn primitive(name: &str) -> Option<AstDataTypeKind> {
    use AstDataTypeKind::*;
    Some(match name {
        "Any" => Any,
        "Bool" => Bool,
        "Byte" => Byte,
        "Bytes" => Bytes,
        "Char" => Char,
        "Str" => Str,
        "Unit" => Unit,
        "Never" => Never,
        "Object" => Object,
        "CShort" => Cshort,
        "CUShort" => Cushort,
        "CInt" => Cint,
        "CUInt" => Cuint,
        "CLong" => Clong,
        "CULong" => Culong,
        "CLongLong" => Clonglong,
        "CULongLong" => Culonglong,
        "CFloat" => Cfloat,
        "CDouble" => Cdouble,
        "CStr" => Cstr,
        "CVoid" => Cvoid,
        "Int8" => Int8,
        "Int16" => Int16,
        "Int32" => Int32,
        "Int64" => Int64,
        "Isize" => Isize,
        "Uint8" => Uint8,
        "Uint16" => Uint16,
        "Uint32" => Uint32,
        "Uint64" => Uint64,
        "Usize" => Usize,
        "Float32" => Float32,
        "Float64" => Float64,
        _ => return None,
    })
}

pub fn parse_data_type(c: &mut Cursor) -> Result<AstDataType, CompilerError> {
    let start_loc = c.location();

    let kind = match c.peek().clone() {
        TokenKind::Keyword(Keyword::SelfType) => {
            c.advance();
            AstDataTypeKind::SelfType
        }
        TokenKind::Keyword(Keyword::Optional) => {
            c.advance();
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::LBracket)), "expected '[' after 'Optional'")?;
            let inner = parse_data_type(c)?;
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBracket)), "expected ']' after Optional's type")?;
            AstDataTypeKind::Optional(Box::new(inner))
        }
        TokenKind::Keyword(Keyword::Result) => {
            c.advance();
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::LBracket)), "expected '[' after 'Result'")?;
            let ok = parse_data_type(c)?;
            let mut errs = Vec::new();
            while matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                c.advance();
                errs.push(parse_data_type(c)?);
            }
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBracket)), "expected ']' closing Result's type list")?;
            AstDataTypeKind::Result(ResultType { ok: Box::new(ok), errs })
        }
        TokenKind::Punct(Punct::Amp) => {
            c.advance();
            AstDataTypeKind::Ref(Box::new(parse_data_type(c)?))
        }
        TokenKind::Punct(Punct::Star) => {
            c.advance();
            AstDataTypeKind::Ptr(Box::new(parse_data_type(c)?))
        }
        TokenKind::Punct(Punct::Question) => {
            c.advance();
            AstDataTypeKind::Optional(Box::new(parse_data_type(c)?))
        }
        TokenKind::Keyword(Keyword::Mut) => {
            c.advance();
            AstDataTypeKind::Mut(Box::new(parse_data_type(c)?))
        }
        TokenKind::Keyword(Keyword::Trace) => {
            c.advance();
            AstDataTypeKind::Trace(Box::new(parse_data_type(c)?))
        }
        TokenKind::Punct(Punct::LParen) => {
            c.advance();
            let mut elems = vec![parse_data_type(c)?];
            while matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                c.advance();
                elems.push(parse_data_type(c)?);
            }
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::RParen)), "expected ')' closing tuple type")?;
            AstDataTypeKind::Tuple(elems)
        }
        TokenKind::Punct(Punct::LBracket) => {
            c.advance();
            match c.peek().clone() {
                TokenKind::Punct(Punct::Star) => {
                    c.advance();
                    let inner = parse_data_type(c)?;
                    c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBracket)), "expected ']' closing array type")?;
                    AstDataTypeKind::Array(ArrayKind::MultiPointers, Box::new(inner))
                }
                TokenKind::Punct(Punct::Underscore) => {
                    c.advance();
                    let inner = parse_data_type(c)?;
                    c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBracket)), "expected ']' closing array type")?;
                    AstDataTypeKind::Array(ArrayKind::Undetermined, Box::new(inner))
                }
                _ => {
                    let inner = parse_data_type(c)?;
                    if matches!(c.peek(), TokenKind::Punct(Punct::Semicolon)) {
                        c.advance();
                        let len = match c.peek().clone() {
                            TokenKind::IntLiteral { digits, base } => {
                                c.advance();
                                u64::from_str_radix(&digits, base.radix())
                                    .map_err(|_| c.error("array length literal does not fit in u64"))?
                            }
                            _ => return Err(c.error("expected an integer array length after ';'")),
                        };
                        c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBracket)), "expected ']' closing array type")?;
                        AstDataTypeKind::Array(ArrayKind::Sized(len), Box::new(inner))
                    } else {
                        c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBracket)), "expected ']' closing array type")?;
                        AstDataTypeKind::Array(ArrayKind::Dynamic, Box::new(inner))
                    }
                }
            }
        }
        TokenKind::Identifier(name) => {
            c.advance();
            if name == "List" {
                c.expect(|k| matches!(k, TokenKind::Punct(Punct::LBracket)), "expected '[' after 'List'")?;
                let inner = parse_data_type(c)?;
                c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBracket)), "expected ']' closing List's type")?;
                AstDataTypeKind::List(Box::new(inner))
            } else if let Some(kind) = primitive(&name) {
                kind
            } else {
                let mut generics = Vec::new();
                if matches!(c.peek(), TokenKind::Punct(Punct::LBracket)) {
                    c.advance();
                    generics.push(parse_data_type(c)?);
                    while matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                        c.advance();
                        generics.push(parse_data_type(c)?);
                    }
                    c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBracket)), "expected ']' closing generic argument list")?;
                }
                AstDataTypeKind::Custom(CustomType { name, generics })
            }
        }
        TokenKind::Keyword(Keyword::Fn) => {
            c.advance();
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::LParen)), "expected '(' after 'fn'")?;
            let mut params = Vec::new();
            if !matches!(c.peek(), TokenKind::Punct(Punct::RParen)) {
                params.push(parse_data_type(c)?);
                while matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                    c.advance();
                    params.push(parse_data_type(c)?);
                }
            }
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::RParen)), "expected ')' closing lambda parameter types")?;
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::Arrow)), "expected '->' after lambda parameter list")?;
            let return_type = parse_data_type(c)?;
            AstDataTypeKind::Lambda(LambdaType { params, return_type: Box::new(return_type) })
        }
        _ => return Err(c.error("expected a type")),
    };

    Ok(AstDataType::new(kind, start_loc))
}
