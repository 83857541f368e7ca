// Hand-written lexer for the template language

pub mod token;

use crate::error::LexError;
use crate::name::Interner;
use crate::span::Span;
use token::{Token, TokenKind};

/// Lexer that converts template source into tokens.
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    errors: Vec<LexError>,
    interner: &'a mut Interner,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, interner: &'a mut Interner) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            errors: Vec::new(),
            interner,
        }
    }

    /// Tokenize the entire source, returning tokens and any errors.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<LexError>) {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            if self.pos >= self.bytes.len() {
                tokens.push(Token::new(
                    TokenKind::Eof,
                    Span::new(self.pos as u32, self.pos as u32),
                ));
                break;
            }
            match self.next_token() {
                Some(token) => tokens.push(token),
                None => {
                    let start = self.pos;
                    self.pos += 1;
                    self.errors.push(LexError::new(
                        format!(
                            "unexpected character '{}'",
                            self.source[start..].chars().next().unwrap_or('?')
                        ),
                        Span::new(start as u32, self.pos as u32),
                    ));
                }
            }
        }
        (tokens, self.errors)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }

            if self.peek() == Some(b'/') && self.peek_at(1) == Some(b'/') {
                self.pos += 2;
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }

            if self.peek() == Some(b'/') && self.peek_at(1) == Some(b'*') {
                let start = self.pos;
                self.pos += 2;
                let mut closed = false;
                while self.pos + 1 < self.bytes.len() {
                    if self.bytes[self.pos] == b'*' && self.bytes[self.pos + 1] == b'/' {
                        self.pos += 2;
                        closed = true;
                        break;
                    }
                    self.pos += 1;
                }
                if !closed {
                    self.pos = self.bytes.len();
                    self.errors.push(LexError::new(
                        "unterminated block comment",
                        Span::new(start as u32, self.pos as u32),
                    ));
                }
                continue;
            }

            break;
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        let start = self.pos;
        let b = self.peek()?;

        if b.is_ascii_digit() {
            return Some(self.lex_number(start));
        }
        if b == b'"' {
            return Some(self.lex_string(start));
        }
        if b == b'\'' {
            return Some(self.lex_char(start));
        }
        if b.is_ascii_alphabetic() || b == b'_' {
            return Some(self.lex_ident(start));
        }
        self.lex_operator(start)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start as u32, self.pos as u32)
    }

    fn lex_number(&mut self, start: usize) -> Token {
        if self.bytes[self.pos] == b'0' {
            match self.peek_at(1) {
                Some(b'x') | Some(b'X') => return self.lex_radix(start, 16),
                Some(b'b') | Some(b'B')
                    if matches!(self.peek_at(2), Some(b'0') | Some(b'1')) =>
                {
                    return self.lex_radix(start, 2)
                }
                Some(c) if c.is_ascii_digit() => return self.lex_octal(start),
                _ => {}
            }
        }
        self.lex_decimal(start)
    }

    fn lex_radix(&mut self, start: usize, radix: u32) -> Token {
        self.pos += 2; // 0x or 0b
        let digit_start = self.pos;
        while self
            .peek()
            .map(|b| (b as char).is_digit(radix))
            .unwrap_or(false)
        {
            self.pos += 1;
        }
        let span = self.span_from(start);
        let digits = &self.source[digit_start..self.pos];
        if digits.is_empty() {
            self.errors
                .push(LexError::new("expected digits after numeric prefix", span));
            return Token::new(TokenKind::IntLiteral(0), span);
        }
        match u64::from_str_radix(digits, radix) {
            Ok(v) => Token::new(TokenKind::IntLiteral(v), span),
            Err(_) => {
                self.errors.push(LexError::new("integer literal overflow", span));
                Token::new(TokenKind::IntLiteral(0), span)
            }
        }
    }

    fn lex_octal(&mut self, start: usize) -> Token {
        self.pos += 1; // leading 0
        let digit_start = self.pos;
        while self.peek().map(|b| (b'0'..=b'7').contains(&b)).unwrap_or(false) {
            self.pos += 1;
        }
        let span = self.span_from(start);
        match u64::from_str_radix(&self.source[digit_start..self.pos], 8) {
            Ok(v) => Token::new(TokenKind::IntLiteral(v), span),
            Err(_) => {
                self.errors.push(LexError::new("integer literal overflow", span));
                Token::new(TokenKind::IntLiteral(0), span)
            }
        }
    }

    fn lex_decimal(&mut self, start: usize) -> Token {
        while self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
            self.pos += 1;
        }

        let mut is_float = false;
        if self.peek() == Some(b'.')
            && self.peek_at(1).map(|b| b.is_ascii_digit()).unwrap_or(false)
        {
            is_float = true;
            self.pos += 1;
            while self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let mut lookahead = 1;
            if matches!(self.peek_at(1), Some(b'+') | Some(b'-')) {
                lookahead = 2;
            }
            if self
                .peek_at(lookahead)
                .map(|b| b.is_ascii_digit())
                .unwrap_or(false)
            {
                is_float = true;
                self.pos += lookahead + 1;
                while self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
                    self.pos += 1;
                }
            }
        }

        let span = self.span_from(start);
        let text = &self.source[start..self.pos];
        if is_float {
            match text.parse::<f64>() {
                Ok(v) => Token::new(TokenKind::FloatLiteral(v), span),
                Err(_) => {
                    self.errors.push(LexError::new("malformed float literal", span));
                    Token::new(TokenKind::FloatLiteral(0.0), span)
                }
            }
        } else {
            match text.parse::<u64>() {
                Ok(v) => Token::new(TokenKind::IntLiteral(v), span),
                Err(_) => {
                    self.errors.push(LexError::new("integer literal overflow", span));
                    Token::new(TokenKind::IntLiteral(0), span)
                }
            }
        }
    }

    /// Decode one escape sequence after a backslash has been consumed.
    fn lex_escape(&mut self, span_start: usize) -> u8 {
        let Some(b) = self.peek() else {
            return b'\\';
        };
        self.pos += 1;
        match b {
            b'n' => b'\n',
            b't' => b'\t',
            b'r' => b'\r',
            b'0' => 0,
            b'\\' => b'\\',
            b'\'' => b'\'',
            b'"' => b'"',
            b'x' => {
                let mut v = 0u8;
                let mut digits = 0;
                while digits < 2 {
                    match self.peek() {
                        Some(h) if h.is_ascii_hexdigit() => {
                            v = v.wrapping_mul(16)
                                + (h as char).to_digit(16).unwrap() as u8;
                            self.pos += 1;
                            digits += 1;
                        }
                        _ => break,
                    }
                }
                if digits == 0 {
                    self.errors.push(LexError::new(
                        "expected hex digits after '\\x'",
                        self.span_from(span_start),
                    ));
                }
                v
            }
            other => {
                self.errors.push(LexError::new(
                    format!("unknown escape sequence '\\{}'", other as char),
                    self.span_from(span_start),
                ));
                other
            }
        }
    }

    fn lex_string(&mut self, start: usize) -> Token {
        self.pos += 1; // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    self.errors.push(LexError::new(
                        "unterminated string literal",
                        self.span_from(start),
                    ));
                    break;
                }
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    value.push(self.lex_escape(start) as char);
                }
                Some(_) => {
                    let c = self.source[self.pos..].chars().next().unwrap();
                    value.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
        Token::new(TokenKind::StringLiteral(value), self.span_from(start))
    }

    fn lex_char(&mut self, start: usize) -> Token {
        self.pos += 1; // opening quote
        let value = match self.peek() {
            Some(b'\\') => {
                self.pos += 1;
                self.lex_escape(start)
            }
            Some(b) => {
                self.pos += 1;
                b
            }
            None => {
                self.errors.push(LexError::new(
                    "unterminated character literal",
                    self.span_from(start),
                ));
                0
            }
        };
        if self.peek() == Some(b'\'') {
            self.pos += 1;
        } else {
            self.errors.push(LexError::new(
                "unterminated character literal",
                self.span_from(start),
            ));
        }
        Token::new(TokenKind::CharLiteral(value), self.span_from(start))
    }

    fn lex_ident(&mut self, start: usize) -> Token {
        while self
            .peek()
            .map(|b| b.is_ascii_alphanumeric() || b == b'_')
            .unwrap_or(false)
        {
            self.pos += 1;
        }
        let text = &self.source[start..self.pos];
        let span = self.span_from(start);
        match TokenKind::keyword_from_str(text) {
            Some(kind) => Token::new(kind, span),
            None => Token::new(TokenKind::Ident(self.interner.intern(text)), span),
        }
    }

    fn lex_operator(&mut self, start: usize) -> Option<Token> {
        let b = self.peek()?;
        let b2 = self.peek_at(1);
        let b3 = self.peek_at(2);

        let (kind, len) = match (b, b2, b3) {
            (b'<', Some(b'<'), Some(b'=')) => (TokenKind::LShiftEq, 3),
            (b'>', Some(b'>'), Some(b'=')) => (TokenKind::RShiftEq, 3),
            (b'<', Some(b'<'), _) => (TokenKind::LShift, 2),
            (b'>', Some(b'>'), _) => (TokenKind::RShift, 2),
            (b'<', Some(b'='), _) => (TokenKind::LessEq, 2),
            (b'>', Some(b'='), _) => (TokenKind::GreaterEq, 2),
            (b'=', Some(b'='), _) => (TokenKind::EqEq, 2),
            (b'!', Some(b'='), _) => (TokenKind::BangEq, 2),
            (b'&', Some(b'&'), _) => (TokenKind::AmpAmp, 2),
            (b'|', Some(b'|'), _) => (TokenKind::PipePipe, 2),
            (b'+', Some(b'='), _) => (TokenKind::PlusEq, 2),
            (b'-', Some(b'='), _) => (TokenKind::MinusEq, 2),
            (b'*', Some(b'='), _) => (TokenKind::StarEq, 2),
            (b'/', Some(b'='), _) => (TokenKind::SlashEq, 2),
            (b'%', Some(b'='), _) => (TokenKind::PercentEq, 2),
            (b'&', Some(b'='), _) => (TokenKind::AmpEq, 2),
            (b'|', Some(b'='), _) => (TokenKind::PipeEq, 2),
            (b'^', Some(b'='), _) => (TokenKind::CaretEq, 2),
            (b'+', _, _) => (TokenKind::Plus, 1),
            (b'-', _, _) => (TokenKind::Minus, 1),
            (b'*', _, _) => (TokenKind::Star, 1),
            (b'/', _, _) => (TokenKind::Slash, 1),
            (b'%', _, _) => (TokenKind::Percent, 1),
            (b'&', _, _) => (TokenKind::Ampersand, 1),
            (b'|', _, _) => (TokenKind::Pipe, 1),
            (b'^', _, _) => (TokenKind::Caret, 1),
            (b'~', _, _) => (TokenKind::Tilde, 1),
            (b'!', _, _) => (TokenKind::Bang, 1),
            (b'<', _, _) => (TokenKind::Less, 1),
            (b'>', _, _) => (TokenKind::Greater, 1),
            (b'=', _, _) => (TokenKind::Eq, 1),
            (b'.', _, _) => (TokenKind::Dot, 1),
            (b',', _, _) => (TokenKind::Comma, 1),
            (b';', _, _) => (TokenKind::Semicolon, 1),
            (b':', _, _) => (TokenKind::Colon, 1),
            (b'?', _, _) => (TokenKind::Question, 1),
            (b'(', _, _) => (TokenKind::LParen, 1),
            (b')', _, _) => (TokenKind::RParen, 1),
            (b'[', _, _) => (TokenKind::LBracket, 1),
            (b']', _, _) => (TokenKind::RBracket, 1),
            (b'{', _, _) => (TokenKind::LBrace, 1),
            (b'}', _, _) => (TokenKind::RBrace, 1),
            _ => return None,
        };
        self.pos += len;
        Some(Token::new(kind, self.span_from(start)))
    }
}
