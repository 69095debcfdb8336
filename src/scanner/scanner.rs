//! Character stream to token stream. Grounded in the teacher's
//! `compiler_frontend/tokenizer/tokenizer.rs` `TokenStream`/`get_token_kind`
//! shape (a `Peekable<Chars>` walked one token at a time, tracking line and
//! column as it goes) but restructured to collect every [`CompilerError`]
//! it meets instead of bailing on the first one, per spec.md §4.1's
//! resynchronize-and-continue contract.

use crate::diagnostics::errors::{CompilerError, ErrorLocation, ErrorType};
use crate::string_interning::StringTable;
use crate::token::{IntBase, Location, Position, SourceFileId, Token, TokenKind};
use crate::token::token::{Keyword, Punct};
use std::iter::Peekable;
use std::str::Chars;

pub struct ScanResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<CompilerError>,
}

/// Recovery skip after a lexical error: advance past the offending
/// character so the next call doesn't loop forever on the same byte.
const RESYNC_CHARS: &[char] = &[' ', '\t', '\n', '\r', ';', '}', ')'];

pub struct Scanner<'a> {
    file: SourceFileId,
    chars: Peekable<Chars<'a>>,
    offset: u32,
    line: u32,
    column: u32,
    start: Position,
    tokens: Vec<Token>,
    errors: Vec<CompilerError>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str, file: SourceFileId) -> Self {
        Scanner {
            file,
            chars: source.chars().peekable(),
            offset: 0,
            line: 1,
            column: 1,
            start: Position::default(),
            tokens: Vec::with_capacity(source.len() / 4),
            errors: Vec::new(),
        }
    }

    pub fn scan(source: &'a str, file: SourceFileId, strings: &mut StringTable) -> ScanResult {
        let mut scanner = Scanner::new(source, file);
        scanner.run(strings);
        ScanResult {
            tokens: scanner.tokens,
            errors: scanner.errors,
        }
    }

    fn pos(&self) -> Position {
        Position {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn mark_start(&mut self) {
        self.start = self.pos();
    }

    fn here(&self) -> Location {
        Location::new(self.file, self.start, self.pos())
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek2(&mut self) -> Option<char> {
        let mut clone = self.chars.clone();
        clone.next();
        clone.next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.offset += ch.len_utf8() as u32;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn error(&mut self, msg: impl Into<String>, location: Location) {
        self.errors.push(CompilerError::new(
            msg,
            ErrorLocation::resolve(location, std::path::PathBuf::new()),
            ErrorType::Lexical,
        ));
    }

    fn resync(&mut self) {
        while let Some(c) = self.peek() {
            if RESYNC_CHARS.contains(&c) {
                return;
            }
            self.advance();
        }
    }

    fn push(&mut self, kind: TokenKind, location: Location) {
        self.tokens.push(Token::new(kind, location));
    }

    fn run(&mut self, strings: &mut StringTable) {
        loop {
            self.skip_whitespace_and_comments();
            self.mark_start();

            let Some(ch) = self.peek() else {
                let loc = self.here();
                self.push(TokenKind::Eof, loc);
                return;
            };

            match self.scan_token(ch, strings) {
                Ok(()) => {}
                Err(()) => self.resync(),
            }
        }
    }

    /// Consumes whitespace, `//` line comments, `///` doc comments (emitted
    /// as tokens, not discarded) and `/* ... */` block comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek2() == Some('/') => {
                    self.mark_start();
                    self.advance();
                    self.advance();
                    if self.peek() == Some('/') {
                        self.advance();
                        let mut text = String::new();
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            text.push(self.advance().unwrap());
                        }
                        let loc = self.here();
                        self.push(TokenKind::DocComment(text.trim().to_string()), loc);
                        continue;
                    }
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek2() == Some('*') => {
                    let start = self.here();
                    self.advance();
                    self.advance();
                    let mut depth = 1;
                    loop {
                        match (self.peek(), self.peek2()) {
                            (Some('*'), Some('/')) => {
                                self.advance();
                                self.advance();
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            (Some('/'), Some('*')) => {
                                self.advance();
                                self.advance();
                                depth += 1;
                            }
                            (Some(_), _) => {
                                self.advance();
                            }
                            (None, _) => {
                                self.error("unterminated block comment", start);
                                break;
                            }
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn scan_token(&mut self, ch: char, strings: &mut StringTable) -> Result<(), ()> {
        if ch.is_ascii_digit() {
            return self.scan_number();
        }
        if ch == '_' && !Self::continues_ident(self.peek2()) {
            self.advance();
            let loc = self.here();
            self.push(TokenKind::Punct(Punct::Underscore), loc);
            return Ok(());
        }
        if ch.is_alphabetic() || ch == '_' {
            return self.scan_identifier(strings);
        }
        if ch == '"' {
            return self.scan_string();
        }
        if ch == '\'' {
            return self.scan_char();
        }
        if ch == 'b' && matches!(self.peek2(), Some('"') | Some('\'')) {
            return self.scan_identifier(strings);
        }
        if ch == '`' {
            return self.scan_operator_identifier();
        }
        if ch == '#' {
            return self.scan_macro_identifier(strings);
        }
        self.scan_punct()
    }

    fn continues_ident(c: Option<char>) -> bool {
        matches!(c, Some(c) if c.is_alphanumeric() || c == '_')
    }

    fn scan_identifier(&mut self, strings: &mut StringTable) -> Result<(), ()> {
        // Byte-string/byte-char literals: `b"..."` / `b'c'`.
        if self.peek() == Some('b') {
            let mut clone = self.chars.clone();
            clone.next();
            match clone.next() {
                Some('"') => {
                    self.advance();
                    return self.scan_byte_string();
                }
                Some('\'') => {
                    self.advance();
                    return self.scan_byte_char();
                }
                _ => {}
            }
        }

        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(self.advance().unwrap());
            } else {
                break;
            }
        }

        let loc = self.here();
        if let Some(keyword) = Keyword::from_str(&text) {
            self.push(TokenKind::Keyword(keyword), loc);
            return Ok(());
        }

        let _ = strings.intern(&text);
        self.push(TokenKind::Identifier(text), loc);
        Ok(())
    }

    fn scan_macro_identifier(&mut self, strings: &mut StringTable) -> Result<(), ()> {
        self.advance(); // '#'
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(self.advance().unwrap());
            } else {
                break;
            }
        }
        if text.is_empty() {
            let loc = self.here();
            self.error("expected a macro name after '#'", loc);
            return Err(());
        }
        let _ = strings.intern(&text);
        let loc = self.here();
        self.push(TokenKind::MacroIdentifier(text), loc);
        Ok(())
    }

    fn scan_operator_identifier(&mut self) -> Result<(), ()> {
        let start = self.here();
        self.advance(); // opening backtick
        let mut text = String::new();
        loop {
            match self.advance() {
                Some('`') => break,
                Some(c) => text.push(c),
                None => {
                    self.error("unterminated operator identifier, missing closing backtick", start);
                    return Err(());
                }
            }
        }
        if text.is_empty() {
            self.error("operator identifier cannot be empty", start);
            return Err(());
        }
        let loc = self.here();
        self.push(TokenKind::OperatorIdentifier(text), loc);
        Ok(())
    }

    fn scan_string(&mut self) -> Result<(), ()> {
        let start = self.here();
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => match self.scan_escape() {
                    Ok(c) => text.push(c),
                    Err(()) => return Err(()),
                },
                Some(c) => text.push(c),
                None => {
                    self.error("unterminated string literal, missing closing quote", start);
                    return Err(());
                }
            }
        }
        let loc = self.here();
        self.push(TokenKind::StringLiteral(text), loc);
        Ok(())
    }

    fn scan_byte_string(&mut self) -> Result<(), ()> {
        let start = self.here();
        self.advance(); // opening quote
        let mut bytes = Vec::new();
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => match self.scan_escape() {
                    Ok(c) => bytes.push(c as u8),
                    Err(()) => return Err(()),
                },
                Some(c) if c.is_ascii() => bytes.push(c as u8),
                Some(_) => {
                    let loc = self.here();
                    self.error("byte string literals may only contain ASCII characters", loc);
                    return Err(());
                }
                None => {
                    self.error("unterminated byte string literal, missing closing quote", start);
                    return Err(());
                }
            }
        }
        let loc = self.here();
        self.push(TokenKind::ByteStringLiteral(bytes), loc);
        Ok(())
    }

    fn scan_char(&mut self) -> Result<(), ()> {
        let start = self.here();
        self.advance(); // opening quote
        let c = match self.advance() {
            Some('\\') => match self.scan_escape() {
                Ok(c) => c,
                Err(()) => return Err(()),
            },
            Some(c) => c,
            None => {
                self.error("unterminated char literal", start);
                return Err(());
            }
        };
        match self.advance() {
            Some('\'') => {}
            _ => {
                self.error("char literal must contain exactly one character", start);
                return Err(());
            }
        }
        let loc = self.here();
        self.push(TokenKind::CharLiteral(c), loc);
        Ok(())
    }

    fn scan_byte_char(&mut self) -> Result<(), ()> {
        let start = self.here();
        self.advance(); // opening quote
        let c = match self.advance() {
            Some('\\') => match self.scan_escape() {
                Ok(c) => c,
                Err(()) => return Err(()),
            },
            Some(c) => c,
            None => {
                self.error("unterminated byte char literal", start);
                return Err(());
            }
        };
        if !c.is_ascii() {
            self.error("byte char literals may only contain ASCII characters", start);
            return Err(());
        }
        match self.advance() {
            Some('\'') => {}
            _ => {
                self.error("byte char literal must contain exactly one character", start);
                return Err(());
            }
        }
        let loc = self.here();
        self.push(TokenKind::ByteCharLiteral(c as u8), loc);
        Ok(())
    }

    fn scan_escape(&mut self) -> Result<char, ()> {
        let start = self.here();
        match self.advance() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('0') => Ok('\0'),
            Some('\\') => Ok('\\'),
            Some('\'') => Ok('\''),
            Some('"') => Ok('"'),
            Some('x') => {
                let mut digits = String::new();
                for _ in 0..2 {
                    match self.peek() {
                        Some(c) if c.is_ascii_hexdigit() => digits.push(self.advance().unwrap()),
                        _ => {
                            self.error("\\x escape requires two hex digits", start);
                            return Err(());
                        }
                    }
                }
                let value = u8::from_str_radix(&digits, 16).map_err(|_| ())?;
                Ok(value as char)
            }
            Some(other) => {
                self.error(format!("unknown escape sequence '\\{other}'"), start);
                Err(())
            }
            None => {
                self.error("unterminated escape sequence", start);
                Err(())
            }
        }
    }

    fn scan_number(&mut self) -> Result<(), ()> {
        let first = self.advance().unwrap();

        let base = if first == '0' {
            match self.peek() {
                Some('b') => {
                    self.advance();
                    Some(IntBase::Binary)
                }
                Some('o') => {
                    self.advance();
                    Some(IntBase::Octal)
                }
                Some('x') => {
                    self.advance();
                    Some(IntBase::Hex)
                }
                _ => None,
            }
        } else {
            None
        };

        let mut digits = String::new();
        if base.is_none() {
            digits.push(first);
        }

        while let Some(c) = self.peek() {
            if c == '_' {
                self.advance();
            } else if c.is_ascii_hexdigit() {
                digits.push(self.advance().unwrap());
            } else {
                break;
            }
        }

        let int_base = base.unwrap_or(IntBase::Decimal);
        let mut is_float = false;
        let mut float_text = digits.clone();

        if int_base == IntBase::Decimal {
            if self.peek() == Some('.') && self.peek2().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                float_text.push(self.advance().unwrap());
                while let Some(c) = self.peek() {
                    if c == '_' {
                        self.advance();
                    } else if c.is_ascii_digit() {
                        float_text.push(self.advance().unwrap());
                    } else {
                        break;
                    }
                }
            }
            if matches!(self.peek(), Some('e') | Some('E')) {
                is_float = true;
                float_text.push(self.advance().unwrap());
                if matches!(self.peek(), Some('+') | Some('-')) {
                    float_text.push(self.advance().unwrap());
                }
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        float_text.push(self.advance().unwrap());
                    } else {
                        break;
                    }
                }
            }
        }

        let suffix = self.scan_numeric_suffix();
        let loc = self.here();

        if is_float {
            return self.emit_float(float_text, suffix, loc);
        }

        match suffix {
            Some(s) => self.emit_suffixed_int(&digits, int_base, &s, loc),
            None => {
                self.push(
                    TokenKind::IntLiteral {
                        digits,
                        base: int_base,
                    },
                    loc,
                );
                Ok(())
            }
        }
    }

    fn scan_numeric_suffix(&mut self) -> Option<String> {
        const SUFFIXES: &[&str] = &[
            "i8", "i16", "i32", "i64", "isize", "u8", "u16", "u32", "u64", "usize", "f32", "f64",
        ];
        let mut clone = self.chars.clone();
        let mut text = String::new();
        while let Some(c) = clone.peek().copied() {
            if c.is_alphanumeric() {
                text.push(c);
                clone.next();
            } else {
                break;
            }
        }
        if SUFFIXES.contains(&text.as_str()) {
            for _ in 0..text.chars().count() {
                self.advance();
            }
            Some(text)
        } else {
            None
        }
    }

    fn emit_float(&mut self, text: String, suffix: Option<String>, loc: Location) -> Result<(), ()> {
        let parsed: f64 = match text.parse() {
            Ok(v) => v,
            Err(_) => {
                self.error(format!("invalid floating point literal '{text}'"), loc);
                return Err(());
            }
        };
        match suffix.as_deref() {
            Some("f32") => self.push(TokenKind::LitF32(parsed as f32), loc),
            Some("f64") | None => self.push(TokenKind::LitF64(parsed), loc),
            Some(other) => {
                self.error(format!("floating point literal cannot have suffix '{other}'"), loc);
                return Err(());
            }
        }
        Ok(())
    }

    fn emit_suffixed_int(
        &mut self,
        digits: &str,
        base: IntBase,
        suffix: &str,
        loc: Location,
    ) -> Result<(), ()> {
        let radix = base.radix();
        macro_rules! parse_signed {
            ($ty:ty, $variant:ident) => {{
                match <$ty>::from_str_radix(digits, radix) {
                    Ok(v) => {
                        self.push(TokenKind::$variant(v), loc);
                        Ok(())
                    }
                    Err(_) => {
                        self.error(format!("integer literal '{digits}{suffix}' does not fit in {}", stringify!($ty)), loc);
                        Err(())
                    }
                }
            }};
        }
        match suffix {
            "i8" => parse_signed!(i8, LitI8),
            "i16" => parse_signed!(i16, LitI16),
            "i32" => parse_signed!(i32, LitI32),
            "i64" => parse_signed!(i64, LitI64),
            "isize" => parse_signed!(isize, LitIsize),
            "u8" => parse_signed!(u8, LitU8),
            "u16" => parse_signed!(u16, LitU16),
            "u32" => parse_signed!(u32, LitU32),
            "u64" => parse_signed!(u64, LitU64),
            "usize" => parse_signed!(usize, LitUsize),
            _ => unreachable!("scan_numeric_suffix only returns known int suffixes"),
        }
    }

    fn scan_punct(&mut self) -> Result<(), ()> {
        let ch = self.advance().unwrap();
        let kind = match ch {
            '(' => Punct::LParen,
            ')' => Punct::RParen,
            '{' => Punct::LBrace,
            '}' => Punct::RBrace,
            '[' => Punct::LBracket,
            ']' => Punct::RBracket,
            ',' => Punct::Comma,
            ';' => Punct::Semicolon,
            '@' => Punct::At,
            ':' => {
                if self.peek() == Some(':') {
                    self.advance();
                    Punct::ColonColon
                } else {
                    Punct::Colon
                }
            }
            '.' => {
                if self.peek() == Some('.') {
                    self.advance();
                    Punct::DotDot
                } else {
                    Punct::Dot
                }
            }
            '?' => Punct::Question,
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Punct::NotEq
                } else {
                    Punct::Bang
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    Punct::AmpAmp
                } else {
                    Punct::Amp
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    Punct::PipePipe
                } else {
                    Punct::Pipe
                }
            }
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        Punct::StarStarEq
                    } else {
                        Punct::StarStar
                    }
                } else if self.peek() == Some('=') {
                    self.advance();
                    Punct::StarEq
                } else {
                    Punct::Star
                }
            }
            '/' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Punct::SlashEq
                } else {
                    Punct::Slash
                }
            }
            '%' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Punct::PercentEq
                } else {
                    Punct::Percent
                }
            }
            '^' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Punct::CaretEq
                } else {
                    Punct::Caret
                }
            }
            '+' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Punct::PlusEq
                } else {
                    Punct::Plus
                }
            }
            '-' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Punct::MinusEq
                } else if self.peek() == Some('>') {
                    self.advance();
                    Punct::Arrow
                } else {
                    Punct::Minus
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Punct::EqEq
                } else if self.peek() == Some('>') {
                    self.advance();
                    Punct::FatArrow
                } else {
                    Punct::Assign
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Punct::LtEq
                } else {
                    Punct::Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Punct::GtEq
                } else {
                    Punct::Gt
                }
            }
            other => {
                let loc = self.here();
                self.error(format!("unexpected character '{other}'"), loc);
                return Err(());
            }
        };
        let loc = self.here();
        self.push(TokenKind::Punct(kind), loc);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(src: &str) -> ScanResult {
        let mut strings = StringTable::new();
        Scanner::scan(src, SourceFileId(0), &mut strings)
    }

    #[test]
    fn scans_keyword_then_identifier() {
        let result = scan("let x");
        assert!(result.errors.is_empty());
        assert_eq!(result.tokens[0].kind, TokenKind::Keyword(Keyword::Let));
        assert_eq!(result.tokens[1].kind, TokenKind::Identifier("x".into()));
        assert_eq!(result.tokens[2].kind, TokenKind::Eof);
    }

    #[test]
    fn scans_suffixed_int_literal() {
        let result = scan("42u8");
        assert!(result.errors.is_empty());
        assert_eq!(result.tokens[0].kind, TokenKind::LitU8(42));
    }

    #[test]
    fn overflowing_suffixed_int_is_lexical_error() {
        let result = scan("999u8");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].error_type, ErrorType::Lexical);
    }

    #[test]
    fn preserves_doc_comment_but_discards_line_comment() {
        let result = scan("/// hi\n// bye\nlet");
        assert!(matches!(result.tokens[0].kind, TokenKind::DocComment(ref s) if s == "hi"));
        assert_eq!(result.tokens[1].kind, TokenKind::Keyword(Keyword::Let));
    }

    #[test]
    fn unterminated_string_is_recovered_from() {
        let result = scan("\"oops\nlet x");
        assert_eq!(result.errors.len(), 1);
        assert!(result.tokens.iter().any(|t| t.kind == TokenKind::Keyword(Keyword::Let)));
    }

    #[test]
    fn scans_exponent_and_compound_assign_operators() {
        let result = scan("a **= b");
        assert!(result.errors.is_empty());
        assert_eq!(result.tokens[1].kind, TokenKind::Punct(Punct::StarStarEq));
    }

    #[test]
    fn scans_operator_identifier() {
        let result = scan("`+`");
        assert!(result.errors.is_empty());
        assert_eq!(result.tokens[0].kind, TokenKind::OperatorIdentifier("+".into()));
    }
}
