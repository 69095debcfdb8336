//! Pratt/precedence-climbing expression parser built on
//! [`crate::ast::BinaryOp::precedence`]. Binary operators bind by precedence
//! number; unary prefix operators (`not`, `-`, `&`, `*`, `ref`) always bind
//! tighter than any binary operator, so unary parsing happens once per
//! primary before climbing starts.

use crate::ast::{AstExpr, AstExprKind, BinaryOp, Call, CallArg, Literal, UnaryOp};
use crate::diagnostics::errors::CompilerError;
use crate::parser::cursor::Cursor;
use crate::parser::data_type::parse_data_type;
use crate::token::token::{Keyword, Punct};
use crate::token::TokenKind;

fn binary_op_for(kind: &TokenKind) -> Option<BinaryOp> {
    use BinaryOp::*;
    Some(match kind {
        TokenKind::Punct(Punct::StarStar) => Exp,
        TokenKind::Punct(Punct::Star) => Mul,
        TokenKind::Punct(Punct::Slash) => Div,
        TokenKind::Punct(Punct::Percent) => Mod,
        TokenKind::Punct(Punct::Plus) => Add,
        TokenKind::Punct(Punct::Minus) => Sub,
        TokenKind::Punct(Punct::Lt) => Lt,
        TokenKind::Punct(Punct::LtEq) => LtEq,
        TokenKind::Punct(Punct::Gt) => Gt,
        TokenKind::Punct(Punct::GtEq) => GtEq,
        TokenKind::Punct(Punct::EqEq) => Eq,
        TokenKind::Punct(Punct::NotEq) => NotEq,
        TokenKind::Punct(Punct::Amp) => BitAnd,
        TokenKind::Punct(Punct::Caret) => Xor,
        TokenKind::Punct(Punct::Pipe) => BitOr,
        TokenKind::Punct(Punct::AmpAmp) => And,
        TokenKind::Punct(Punct::PipePipe) => Or,
        TokenKind::Punct(Punct::DotDot) => Range,
        TokenKind::Punct(Punct::Assign) => Assign,
        TokenKind::Punct(Punct::PlusEq) => AssignAdd,
        TokenKind::Punct(Punct::MinusEq) => AssignSub,
        TokenKind::Punct(Punct::StarEq) => AssignMul,
        TokenKind::Punct(Punct::SlashEq) => AssignDiv,
        TokenKind::Punct(Punct::PercentEq) => AssignMod,
        TokenKind::Punct(Punct::StarStarEq) => AssignExp,
        TokenKind::Punct(Punct::CaretEq) => AssignXor,
        _ => return None,
    })
}

pub fn parse_expr(c: &mut Cursor) -> Result<AstExpr, CompilerError> {
    parse_binary(c, 0)
}

fn parse_binary(c: &mut Cursor, min_prec: u8) -> Result<AstExpr, CompilerError> {
    let loc = c.location();
    let mut left = parse_unary(c)?;

    loop {
        let Some(op) = binary_op_for(c.peek()) else { break };
        let prec = op.precedence();
        if prec < min_prec {
            break;
        }
        c.advance();
        let next_min = if op.is_right_associative() { prec } else { prec + 1 };
        let right = parse_binary(c, next_min)?;
        left = AstExpr::new(AstExprKind::Binary { op, left: Box::new(left), right: Box::new(right) }, loc);
    }

    Ok(left)
}

fn parse_unary(c: &mut Cursor) -> Result<AstExpr, CompilerError> {
    let loc = c.location();
    let op = match c.peek() {
        TokenKind::Keyword(Keyword::Not) => Some(UnaryOp::Not),
        TokenKind::Punct(Punct::Minus) => Some(UnaryOp::Neg),
        TokenKind::Punct(Punct::Amp) => Some(UnaryOp::AddressOf),
        TokenKind::Punct(Punct::Star) => Some(UnaryOp::Deref),
        TokenKind::Keyword(Keyword::Ref) => Some(UnaryOp::RefKeyword),
        _ => None,
    };

    if let Some(op) = op {
        c.advance();
        let operand = parse_unary(c)?;
        return Ok(AstExpr::new(AstExprKind::Unary { op, operand: Box::new(operand) }, loc));
    }

    parse_postfix(c)
}

fn parse_postfix(c: &mut Cursor) -> Result<AstExpr, CompilerError> {
    let loc = c.location();
    let mut expr = parse_primary(c)?;

    loop {
        match c.peek() {
            TokenKind::Punct(Punct::Dot) => {
                c.advance();
                let name = identifier(c)?;
                if matches!(c.peek(), TokenKind::Punct(Punct::LParen)) {
                    let args = parse_call_args(c)?;
                    expr = AstExpr::new(
                        AstExprKind::Call(Call::Method { base: Box::new(expr), name, args }),
                        loc,
                    );
                } else {
                    expr = AstExpr::new(AstExprKind::FieldAccess { base: Box::new(expr), field: name }, loc);
                }
            }
            TokenKind::Keyword(Keyword::As) => {
                c.advance();
                let to = parse_data_type(c)?;
                expr = AstExpr::new(AstExprKind::Cast { expr: Box::new(expr), to }, loc);
            }
            _ => break,
        }
    }

    Ok(expr)
}

fn identifier(c: &mut Cursor) -> Result<String, CompilerError> {
    match c.peek().clone() {
        TokenKind::Identifier(name) => {
            c.advance();
            Ok(name)
        }
        _ => Err(c.error("expected an identifier")),
    }
}

fn parse_call_args(c: &mut Cursor) -> Result<Vec<CallArg>, CompilerError> {
    c.expect(|k| matches!(k, TokenKind::Punct(Punct::LParen)), "expected '(' to start an argument list")?;
    let mut args = Vec::new();
    if !matches!(c.peek(), TokenKind::Punct(Punct::RParen)) {
        args.push(parse_call_arg(c)?);
        while matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
            c.advance();
            args.push(parse_call_arg(c)?);
        }
    }
    c.expect(|k| matches!(k, TokenKind::Punct(Punct::RParen)), "expected ')' closing argument list")?;
    Ok(args)
}

fn parse_call_arg(c: &mut Cursor) -> Result<CallArg, CompilerError> {
    if let TokenKind::Identifier(name) = c.peek().clone() {
        if matches!(c.peek_at(1), TokenKind::Punct(Punct::Colon)) {
            c.advance();
            c.advance();
            return Ok(CallArg::Named(name, parse_expr(c)?));
        }
    }
    Ok(CallArg::Positional(parse_expr(c)?))
}

fn parse_record_fields(c: &mut Cursor) -> Result<Vec<(String, AstExpr)>, CompilerError> {
    c.expect(|k| matches!(k, TokenKind::Punct(Punct::LBrace)), "expected '{' to start a record literal")?;
    let mut fields = Vec::new();
    if !matches!(c.peek(), TokenKind::Punct(Punct::RBrace)) {
        loop {
            let name = identifier(c)?;
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::Colon)), "expected ':' after field name")?;
            let value = parse_expr(c)?;
            fields.push((name, value));
            if matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                c.advance();
            } else {
                break;
            }
        }
    }
    c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBrace)), "expected '}' closing record literal")?;
    Ok(fields)
}

fn parse_path(c: &mut Cursor) -> Result<Vec<String>, CompilerError> {
    let mut segments = vec![identifier(c)?];
    while matches!(c.peek(), TokenKind::Punct(Punct::ColonColon)) {
        c.advance();
        segments.push(identifier(c)?);
    }
    Ok(segments)
}

fn parse_identifier_led(c: &mut Cursor, loc: crate::token::Location) -> Result<AstExpr, CompilerError> {
    let path = parse_path(c)?;

    if matches!(c.peek(), TokenKind::Punct(Punct::LParen)) {
        let args = parse_call_args(c)?;
        let call = match path.as_slice() {
            [root, name] if root == "sys" => Call::FunSys { name: name.clone(), args },
            [root, name] if root == "builtin" => Call::FunBuiltin { name: name.clone(), args },
            [name] if name == "len" && args.len() == 1 => {
                let mut args = args;
                return Ok(AstExpr::new(
                    AstExprKind::Call(Call::Len(Box::new(match args.remove(0) {
                        CallArg::Positional(e) | CallArg::Named(_, e) => e,
                    }))),
                    loc,
                ));
            }
            [name, variant] => Call::Variant { name: name.clone(), variant: variant.clone(), args },
            _ => Call::Fun { name: path.join("::"), args },
        };
        return Ok(AstExpr::new(AstExprKind::Call(call), loc));
    }

    if matches!(c.peek(), TokenKind::Punct(Punct::LBrace)) && path.len() == 1 {
        let fields = parse_record_fields(c)?;
        return Ok(AstExpr::new(AstExprKind::Call(Call::Record { name: path[0].clone(), fields }), loc));
    }

    if path.len() == 1 {
        Ok(AstExpr::new(AstExprKind::Identifier(path.into_iter().next().unwrap()), loc))
    } else {
        let segments = path.into_iter().map(|name| AstExpr::new(AstExprKind::Identifier(name), loc)).collect();
        Ok(AstExpr::new(AstExprKind::AccessChain(segments), loc))
    }
}

fn parse_primary(c: &mut Cursor) -> Result<AstExpr, CompilerError> {
    let loc = c.location();

    let lit = match c.peek().clone() {
        TokenKind::Keyword(Keyword::True) => Some(Literal::Bool(true)),
        TokenKind::Keyword(Keyword::False) => Some(Literal::Bool(false)),
        TokenKind::Keyword(Keyword::Nil) => Some(Literal::Nil),
        TokenKind::Keyword(Keyword::Undef) => Some(Literal::Undef),
        TokenKind::IntLiteral { digits, base } => Some(Literal::Int { digits, base }),
        TokenKind::FloatLiteral(text) => Some(Literal::Float64(text.parse().unwrap_or(0.0))),
        TokenKind::StringLiteral(s) => Some(Literal::Str(s)),
        TokenKind::ByteStringLiteral(bytes) => Some(Literal::Bytes(bytes)),
        TokenKind::CharLiteral(ch) => Some(Literal::Char(ch)),
        TokenKind::ByteCharLiteral(b) => Some(Literal::Byte(b)),
        TokenKind::LitI8(v) => Some(Literal::SuffixI8(v)),
        TokenKind::LitI16(v) => Some(Literal::SuffixI16(v)),
        TokenKind::LitI32(v) => Some(Literal::SuffixI32(v)),
        TokenKind::LitI64(v) => Some(Literal::SuffixI64(v)),
        TokenKind::LitIsize(v) => Some(Literal::SuffixIsize(v)),
        TokenKind::LitU8(v) => Some(Literal::SuffixU8(v)),
        TokenKind::LitU16(v) => Some(Literal::SuffixU16(v)),
        TokenKind::LitU32(v) => Some(Literal::SuffixU32(v)),
        TokenKind::LitU64(v) => Some(Literal::SuffixU64(v)),
        TokenKind::LitUsize(v) => Some(Literal::SuffixUsize(v)),
        TokenKind::LitF32(v) => Some(Literal::SuffixF32(v)),
        TokenKind::LitF64(v) => Some(Literal::SuffixF64(v)),
        _ => None,
    };
    if let Some(lit) = lit {
        c.advance();
        return Ok(AstExpr::new(AstExprKind::Literal(lit), loc));
    }

    match c.peek().clone() {
        TokenKind::Identifier(_) => parse_identifier_led(c, loc),
        TokenKind::Punct(Punct::LBracket) => {
            c.advance();
            let mut elems = Vec::new();
            if !matches!(c.peek(), TokenKind::Punct(Punct::RBracket)) {
                elems.push(parse_expr(c)?);
                while matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                    c.advance();
                    elems.push(parse_expr(c)?);
                }
            }
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBracket)), "expected ']' closing array literal")?;
            Ok(AstExpr::new(AstExprKind::Array(elems), loc))
        }
        TokenKind::Punct(Punct::LParen) => {
            c.advance();
            if matches!(c.peek(), TokenKind::Punct(Punct::RParen)) {
                c.advance();
                return Ok(AstExpr::new(AstExprKind::Literal(Literal::Unit), loc));
            }
            let first = parse_expr(c)?;
            if matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                let mut elems = vec![first];
                while matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                    c.advance();
                    elems.push(parse_expr(c)?);
                }
                c.expect(|k| matches!(k, TokenKind::Punct(Punct::RParen)), "expected ')' closing tuple")?;
                Ok(AstExpr::new(AstExprKind::Tuple(elems), loc))
            } else {
                c.expect(|k| matches!(k, TokenKind::Punct(Punct::RParen)), "expected ')' closing grouped expression")?;
                Ok(AstExpr::new(AstExprKind::Grouping(Box::new(first)), loc))
            }
        }
        TokenKind::Keyword(Keyword::Fn) => {
            c.advance();
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::LParen)), "expected '(' after 'fn'")?;
            let mut params = Vec::new();
            if !matches!(c.peek(), TokenKind::Punct(Punct::RParen)) {
                loop {
                    let name = identifier(c)?;
                    let ty = if matches!(c.peek(), TokenKind::Punct(Punct::Colon)) {
                        c.advance();
                        Some(parse_data_type(c)?)
                    } else {
                        None
                    };
                    params.push((name, ty));
                    if matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                        c.advance();
                    } else {
                        break;
                    }
                }
            }
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::RParen)), "expected ')' closing lambda parameters")?;
            let return_type = if matches!(c.peek(), TokenKind::Punct(Punct::Arrow)) {
                c.advance();
                Some(parse_data_type(c)?)
            } else {
                None
            };
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::FatArrow)), "expected '=>' before lambda body")?;
            let body = parse_expr(c)?;
            Ok(AstExpr::new(AstExprKind::Lambda { params, return_type, body: Box::new(body) }, loc))
        }
        _ => Err(c.error("expected an expression")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstExprKind, BinaryOp};
    use crate::scanner::Scanner;
    use crate::string_interning::StringTable;
    use crate::token::{SourceFile, SourceFileId, SourceFileTable};

    fn scan(src: &str) -> Vec<crate::token::Token> {
        let mut files = SourceFileTable::default();
        let id = files.insert(SourceFile::new(std::path::PathBuf::from("t.lily"), src.to_string()));
        let mut strings = StringTable::default();
        Scanner::scan(src, id, &mut strings).tokens
    }

    #[test]
    fn exponent_binds_tighter_than_addition() {
        let tokens = scan("1 + 2 ** 3");
        let mut c = Cursor::new(&tokens);
        let expr = parse_expr(&mut c).unwrap();
        match expr.kind {
            AstExprKind::Binary { op: BinaryOp::Add, right, .. } => {
                assert!(matches!(right.kind, AstExprKind::Binary { op: BinaryOp::Exp, .. }));
            }
            _ => panic!("expected a top-level addition"),
        }
    }

    #[test]
    fn assignment_is_right_associative() {
        let tokens = scan("a = b = 1");
        let mut c = Cursor::new(&tokens);
        let expr = parse_expr(&mut c).unwrap();
        match expr.kind {
            AstExprKind::Binary { op: BinaryOp::Assign, right, .. } => {
                assert!(matches!(right.kind, AstExprKind::Binary { op: BinaryOp::Assign, .. }));
            }
            _ => panic!("expected assignment"),
        }
    }

    #[test]
    fn call_with_named_and_positional_args() {
        let tokens = scan("foo(1, bar: 2)");
        let mut c = Cursor::new(&tokens);
        let expr = parse_expr(&mut c).unwrap();
        match expr.kind {
            AstExprKind::Call(Call::Fun { name, args }) => {
                assert_eq!(name, "foo");
                assert_eq!(args.len(), 2);
                assert!(matches!(args[1], CallArg::Named(ref n, _) if n == "bar"));
            }
            other => panic!("expected a function call, got {other:?}"),
        }
    }
}
