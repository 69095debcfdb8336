//! Pattern parser for `match`/`switch` arms, `for` bindings and
//! variable-declaration destructuring. `AutoComplete` has no surface
//! syntax here (no lexical form for it reached the scanner) and is left
//! constructible only by the analyzer for internal exhaustiveness bookkeeping.

use crate::ast::{AstPattern, AstPatternKind};
use crate::diagnostics::errors::CompilerError;
use crate::parser::cursor::Cursor;
use crate::parser::expr::parse_expr;
use crate::token::token::Punct;
use crate::token::TokenKind;

pub fn parse_pattern(c: &mut Cursor) -> Result<AstPattern, CompilerError> {
    let base = parse_pattern_primary(c)?;
    if matches!(c.peek(), TokenKind::Keyword(crate::token::token::Keyword::As)) {
        let loc = base.location;
        c.advance();
        let name = match c.peek().clone() {
            TokenKind::Identifier(name) => {
                c.advance();
                name
            }
            _ => return Err(c.error("expected a name after 'as'")),
        };
        return Ok(AstPattern::new(AstPatternKind::As { pattern: Box::new(base), name }, loc));
    }
    if matches!(c.peek(), TokenKind::Punct(Punct::DotDot)) {
        let loc = base.location;
        c.advance();
        let to = parse_pattern_primary(c)?;
        return Ok(AstPattern::new(AstPatternKind::Range { from: Box::new(base), to: Box::new(to) }, loc));
    }
    Ok(base)
}

fn parse_pattern_primary(c: &mut Cursor) -> Result<AstPattern, CompilerError> {
    let loc = c.location();

    match c.peek().clone() {
        TokenKind::Punct(Punct::Underscore) => {
            c.advance();
            Ok(AstPattern::new(AstPatternKind::Wildcard, loc))
        }
        TokenKind::Punct(Punct::LBracket) => {
            c.advance();
            let mut elems = Vec::new();
            if !matches!(c.peek(), TokenKind::Punct(Punct::RBracket)) {
                elems.push(parse_pattern(c)?);
                while matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                    c.advance();
                    elems.push(parse_pattern(c)?);
                }
            }
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBracket)), "expected ']' closing array pattern")?;
            Ok(AstPattern::new(AstPatternKind::Array(elems), loc))
        }
        TokenKind::Punct(Punct::LParen) => {
            c.advance();
            let mut elems = Vec::new();
            if !matches!(c.peek(), TokenKind::Punct(Punct::RParen)) {
                elems.push(parse_pattern(c)?);
                while matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                    c.advance();
                    elems.push(parse_pattern(c)?);
                }
            }
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::RParen)), "expected ')' closing tuple pattern")?;
            Ok(AstPattern::new(AstPatternKind::Tuple(elems), loc))
        }
        TokenKind::Identifier(name) => {
            c.advance();
            if matches!(c.peek(), TokenKind::Punct(Punct::ColonColon)) {
                c.advance();
                let variant = match c.peek().clone() {
                    TokenKind::Identifier(v) => {
                        c.advance();
                        v
                    }
                    _ => return Err(c.error("expected a variant name after '::'")),
                };
                let args = if matches!(c.peek(), TokenKind::Punct(Punct::LParen)) {
                    c.advance();
                    let mut args = Vec::new();
                    if !matches!(c.peek(), TokenKind::Punct(Punct::RParen)) {
                        args.push(parse_pattern(c)?);
                        while matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                            c.advance();
                            args.push(parse_pattern(c)?);
                        }
                    }
                    c.expect(|k| matches!(k, TokenKind::Punct(Punct::RParen)), "expected ')' closing variant pattern")?;
                    args
                } else {
                    Vec::new()
                };
                return Ok(AstPattern::new(AstPatternKind::VariantCall { name, variant, args }, loc));
            }
            if matches!(c.peek(), TokenKind::Punct(Punct::LBrace)) {
                c.advance();
                let mut fields = Vec::new();
                if !matches!(c.peek(), TokenKind::Punct(Punct::RBrace)) {
                    loop {
                        let field_name = match c.peek().clone() {
                            TokenKind::Identifier(n) => {
                                c.advance();
                                n
                            }
                            _ => return Err(c.error("expected a field name")),
                        };
                        c.expect(|k| matches!(k, TokenKind::Punct(Punct::Colon)), "expected ':' after field name")?;
                        let pattern = parse_pattern(c)?;
                        fields.push((field_name, pattern));
                        if matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                            c.advance();
                        } else {
                            break;
                        }
                    }
                }
                c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBrace)), "expected '}' closing record pattern")?;
                return Ok(AstPattern::new(AstPatternKind::RecordCall { name, fields }, loc));
            }
            Ok(AstPattern::new(AstPatternKind::Name(name), loc))
        }
        TokenKind::Keyword(crate::token::token::Keyword::Catch) => {
            c.advance();
            let name = match c.peek().clone() {
                TokenKind::Identifier(n) => {
                    c.advance();
                    Some(n)
                }
                _ => None,
            };
            let inner = parse_pattern(c)?;
            Ok(AstPattern::new(AstPatternKind::Exception { name, pattern: Box::new(inner) }, loc))
        }
        _ => {
            let expr = parse_expr(c)?;
            match expr.kind {
                crate::ast::AstExprKind::Literal(lit) => Ok(AstPattern::new(AstPatternKind::Literal(lit), loc)),
                _ => Err(c.error("expected a pattern")),
            }
        }
    }
}
