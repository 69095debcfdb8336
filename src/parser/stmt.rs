//! Statement parser: block bodies are `{ stmt* }`, most statements are
//! terminated by a newline or `;` the way the scanner's [`TokenKind::Newline`]
//! already marks statement boundaries — see spec.md §4.4.

use crate::ast::{AstStmt, AstStmtKind, IfBranch, MatchArm, SwitchCase};
use crate::diagnostics::errors::CompilerError;
use crate::parser::cursor::Cursor;
use crate::parser::data_type::parse_data_type;
use crate::parser::expr::parse_expr;
use crate::parser::pattern::parse_pattern;
use crate::token::token::{Keyword, Punct};
use crate::token::TokenKind;

fn skip_separators(c: &mut Cursor) {
    while matches!(c.peek(), TokenKind::Newline | TokenKind::Punct(Punct::Semicolon)) {
        c.advance();
    }
}

pub fn parse_block(c: &mut Cursor) -> Result<Vec<AstStmt>, CompilerError> {
    c.expect(|k| matches!(k, TokenKind::Punct(Punct::LBrace)), "expected '{' to start a block")?;
    let mut stmts = Vec::new();
    skip_separators(c);
    while !matches!(c.peek(), TokenKind::Punct(Punct::RBrace) | TokenKind::Eof) {
        stmts.push(parse_stmt(c)?);
        skip_separators(c);
    }
    c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBrace)), "expected '}' closing block")?;
    Ok(stmts)
}

pub fn parse_stmt(c: &mut Cursor) -> Result<AstStmt, CompilerError> {
    let loc = c.location();

    let kind = match c.peek().clone() {
        TokenKind::Punct(Punct::LBrace) => AstStmtKind::Block(parse_block(c)?),
        TokenKind::Keyword(Keyword::Break) => {
            c.advance();
            AstStmtKind::Break
        }
        TokenKind::Keyword(Keyword::Next) => {
            c.advance();
            AstStmtKind::Next
        }
        TokenKind::Keyword(Keyword::Drop) => {
            c.advance();
            AstStmtKind::Drop(parse_expr(c)?)
        }
        TokenKind::Keyword(Keyword::Defer) => {
            c.advance();
            AstStmtKind::Defer(Box::new(parse_stmt(c)?))
        }
        TokenKind::Keyword(Keyword::Return) => {
            c.advance();
            let value = if matches!(c.peek(), TokenKind::Newline | TokenKind::Punct(Punct::Semicolon | Punct::RBrace) | TokenKind::Eof) {
                None
            } else {
                Some(parse_expr(c)?)
            };
            AstStmtKind::Return(value)
        }
        TokenKind::Keyword(Keyword::Raise) => {
            c.advance();
            AstStmtKind::Raise(parse_expr(c)?)
        }
        TokenKind::Keyword(Keyword::Await) => {
            c.advance();
            AstStmtKind::Await(parse_expr(c)?)
        }
        TokenKind::Keyword(Keyword::Unsafe) => {
            c.advance();
            AstStmtKind::Unsafe(parse_block(c)?)
        }
        TokenKind::Keyword(Keyword::Asm) => {
            c.advance();
            let template = match c.peek().clone() {
                TokenKind::StringLiteral(s) => {
                    c.advance();
                    s
                }
                _ => return Err(c.error("expected an asm template string")),
            };
            let mut operands = Vec::new();
            if matches!(c.peek(), TokenKind::Punct(Punct::LParen)) {
                c.advance();
                if !matches!(c.peek(), TokenKind::Punct(Punct::RParen)) {
                    operands.push(parse_expr(c)?);
                    while matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
                        c.advance();
                        operands.push(parse_expr(c)?);
                    }
                }
                c.expect(|k| matches!(k, TokenKind::Punct(Punct::RParen)), "expected ')' closing asm operand list")?;
            }
            AstStmtKind::Asm { template, operands }
        }
        TokenKind::Keyword(Keyword::If) => parse_if(c)?,
        TokenKind::Keyword(Keyword::Match) => parse_match(c)?,
        TokenKind::Keyword(Keyword::Switch) => parse_switch(c)?,
        TokenKind::Keyword(Keyword::For) => {
            c.advance();
            let pattern = parse_pattern(c)?;
            c.expect(|k| matches!(k, TokenKind::Keyword(Keyword::In)), "expected 'in' after for-loop pattern")?;
            let iterable = parse_expr(c)?;
            let body = parse_block(c)?;
            AstStmtKind::For { pattern, iterable, body }
        }
        TokenKind::Keyword(Keyword::While) => {
            c.advance();
            let condition = parse_expr(c)?;
            AstStmtKind::If {
                branches: vec![IfBranch { condition, body: {
                    let mut body = parse_block(c)?;
                    body.push(AstStmt::new(AstStmtKind::Next, loc));
                    body
                } }],
                else_body: None,
            }
        }
        TokenKind::Keyword(Keyword::Try) => {
            c.advance();
            let body = parse_block(c)?;
            c.expect(|k| matches!(k, TokenKind::Keyword(Keyword::Catch)), "expected 'catch' after try block")?;
            let catch_pattern = if !matches!(c.peek(), TokenKind::Punct(Punct::LBrace)) {
                Some(parse_pattern(c)?)
            } else {
                None
            };
            let catch_body = parse_block(c)?;
            AstStmtKind::Try { body, catch_pattern, catch_body }
        }
        TokenKind::Keyword(Keyword::Let) | TokenKind::Keyword(Keyword::Mut) => {
            let mutable = matches!(c.peek(), TokenKind::Keyword(Keyword::Mut));
            c.advance();
            if mutable && matches!(c.peek(), TokenKind::Keyword(Keyword::Let)) {
                c.advance();
            }
            let name = match c.peek().clone() {
                TokenKind::Identifier(n) => {
                    c.advance();
                    n
                }
                _ => return Err(c.error("expected a variable name")),
            };
            let ty = if matches!(c.peek(), TokenKind::Punct(Punct::Colon)) {
                c.advance();
                Some(parse_data_type(c)?)
            } else {
                None
            };
            let value = if matches!(c.peek(), TokenKind::Punct(Punct::Assign)) {
                c.advance();
                Some(parse_expr(c)?)
            } else {
                None
            };
            AstStmtKind::Variable { name, mutable, ty, value }
        }
        _ => AstStmtKind::Expr(parse_expr(c)?),
    };

    Ok(AstStmt::new(kind, loc))
}

fn parse_if(c: &mut Cursor) -> Result<AstStmtKind, CompilerError> {
    c.advance();
    let mut branches = vec![IfBranch { condition: parse_expr(c)?, body: parse_block(c)? }];
    let mut else_body = None;
    loop {
        match c.peek() {
            TokenKind::Keyword(Keyword::Elif) => {
                c.advance();
                branches.push(IfBranch { condition: parse_expr(c)?, body: parse_block(c)? });
            }
            TokenKind::Keyword(Keyword::Else) => {
                c.advance();
                else_body = Some(parse_block(c)?);
                break;
            }
            _ => break,
        }
    }
    Ok(AstStmtKind::If { branches, else_body })
}

fn parse_match(c: &mut Cursor) -> Result<AstStmtKind, CompilerError> {
    c.advance();
    let scrutinee = parse_expr(c)?;
    c.expect(|k| matches!(k, TokenKind::Punct(Punct::LBrace)), "expected '{' to start a match body")?;
    skip_separators(c);
    let mut arms = Vec::new();
    while !matches!(c.peek(), TokenKind::Punct(Punct::RBrace) | TokenKind::Eof) {
        let pattern = parse_pattern(c)?;
        let guard = if matches!(c.peek(), TokenKind::Keyword(Keyword::If)) {
            c.advance();
            Some(parse_expr(c)?)
        } else {
            None
        };
        c.expect(|k| matches!(k, TokenKind::Punct(Punct::FatArrow)), "expected '=>' after match pattern")?;
        let body = if matches!(c.peek(), TokenKind::Punct(Punct::LBrace)) {
            parse_block(c)?
        } else {
            vec![AstStmt::new(AstStmtKind::Expr(parse_expr(c)?), c.location())]
        };
        arms.push(MatchArm { pattern, guard, body });
        if matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
            c.advance();
        }
        skip_separators(c);
    }
    c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBrace)), "expected '}' closing match body")?;
    Ok(AstStmtKind::Match { scrutinee, arms })
}

fn parse_switch(c: &mut Cursor) -> Result<AstStmtKind, CompilerError> {
    c.advance();
    let scrutinee = parse_expr(c)?;
    c.expect(|k| matches!(k, TokenKind::Punct(Punct::LBrace)), "expected '{' to start a switch body")?;
    skip_separators(c);
    let mut cases = Vec::new();
    let mut default = None;
    while !matches!(c.peek(), TokenKind::Punct(Punct::RBrace) | TokenKind::Eof) {
        if matches!(c.peek(), TokenKind::Punct(Punct::Underscore)) {
            c.advance();
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::FatArrow)), "expected '=>' after default case")?;
            default = Some(parse_block(c)?);
        } else {
            let pattern = parse_pattern(c)?;
            c.expect(|k| matches!(k, TokenKind::Punct(Punct::FatArrow)), "expected '=>' after switch pattern")?;
            let body = parse_block(c)?;
            cases.push(SwitchCase { pattern, body });
        }
        if matches!(c.peek(), TokenKind::Punct(Punct::Comma)) {
            c.advance();
        }
        skip_separators(c);
    }
    c.expect(|k| matches!(k, TokenKind::Punct(Punct::RBrace)), "expected '}' closing switch body")?;
    Ok(AstStmtKind::Switch { scrutinee, cases, default })
}
