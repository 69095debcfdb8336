//! A position-tracking view over one declaration's token slice. Mirrors the
//! index-juggling style of `preparser::preparser` (`kind_at`, `resync`) but
//! packaged as a small cursor type since the parser recurses through nested
//! expressions/statements far more deeply than the preparser's flat passes.

use crate::diagnostics::errors::{CompilerError, ErrorLocation, ErrorType};
use crate::token::{Location, Token, TokenKind};

pub struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Cursor<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Cursor { tokens, pos: 0 }
    }

    pub fn peek(&self) -> &TokenKind {
        self.tokens.get(self.pos).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    pub fn peek_at(&self, offset: usize) -> &TokenKind {
        self.tokens.get(self.pos + offset).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    pub fn location(&self) -> Location {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.location)
            .unwrap_or_else(|| {
                let p = crate::token::Position::default();
                Location::new(crate::token::SourceFileId(0), p, p)
            })
    }

    pub fn at_end(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    pub fn advance(&mut self) -> &TokenKind {
        let kind = self.tokens.get(self.pos).map(|t| &t.kind).unwrap_or(&TokenKind::Eof);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    pub fn error(&self, msg: impl Into<String>) -> CompilerError {
        CompilerError::new(msg, ErrorLocation::resolve(self.location(), std::path::PathBuf::new()), ErrorType::Parser)
    }

    /// Consumes the current token if it matches `pred`, otherwise reports
    /// `msg` at the current location and leaves the cursor in place.
    pub fn expect(&mut self, pred: impl Fn(&TokenKind) -> bool, msg: &str) -> Result<Token, CompilerError> {
        if pred(self.peek()) {
            let tok = self.tokens[self.pos].clone();
            self.pos += 1;
            Ok(tok)
        } else {
            Err(self.error(msg.to_string()))
        }
    }
}
