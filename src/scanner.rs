use std::rc::Rc;

use log::trace;

use crate::common::{Source, Span};
use crate::error::{Location, MidasError};
use crate::token::{Token, TokenKind};

/// Turns a [`Source`]'s text into a stream of [`Token`]s, one `next()`
/// call at a time. Single-shot: once a lexical error is hit the
/// scanner does not attempt to recover.
pub struct Scanner {
    source: Rc<Source>,
    index: usize,
    line: u32,
    column: u32,
}

impl Scanner {
    pub fn new(source: Rc<Source>) -> Scanner {
        Scanner {
            source,
            index: 0,
            line: 1,
            column: 1,
        }
    }

    fn remaining(&self) -> &str {
        &self.source.contents[self.index..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.remaining().chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Discards whitespace and `#`-comments between tokens.
    fn strip(&mut self) {
        loop {
            let mut stripped_any = false;
            while matches!(self.peek(), Some(c) if c.is_whitespace()) {
                self.advance();
                stripped_any = true;
            }
            if self.peek() == Some('#') {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                stripped_any = true;
            }
            if !stripped_any {
                break;
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> MidasError {
        MidasError::LexError {
            message: message.into(),
            location: Location {
                line: self.line,
                column: self.column,
            },
        }
    }

    /// Pulls characters while `pred` holds, returning the consumed slice.
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> (usize, u32, u32) {
        let start = self.index;
        let line = self.line;
        let column = self.column;
        while matches!(self.peek(), Some(c) if pred(c)) {
            self.advance();
        }
        (start, line, column)
    }

    fn identifier(&mut self) -> Token {
        let (start, line, column) =
            self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let lexeme = self.source.contents[start..self.index].to_string();
        let kind = TokenKind::keyword(&lexeme)
            .unwrap_or_else(|| TokenKind::Identifier(lexeme.clone()));
        let length = (self.index - start) as u32;
        Token::new(kind, lexeme, Span::new(line, column, length))
    }

    fn number(&mut self) -> Result<Token, MidasError> {
        let (start, line, column) = self.take_while(|c| c.is_ascii_digit());
        let mut is_double = false;
        if self.peek() == Some('.') && matches!(self.peek_second(), Some(c) if c.is_ascii_digit())
        {
            is_double = true;
            self.advance();
            self.take_while(|c| c.is_ascii_digit());
        }
        let lexeme = self.source.contents[start..self.index].to_string();
        let length = (self.index - start) as u32;
        let span = Span::new(line, column, length);
        let kind = if is_double {
            let value: f64 = lexeme
                .parse()
                .map_err(|_| self.error(format!("malformed double literal '{}'", lexeme)))?;
            TokenKind::Double(value)
        } else {
            let value: i64 = lexeme
                .parse()
                .map_err(|_| self.error(format!("malformed integer literal '{}'", lexeme)))?;
            TokenKind::Integer(value)
        };
        Ok(Token::new(kind, lexeme, span))
    }

    fn string(&mut self) -> Result<Token, MidasError> {
        let line = self.line;
        let column = self.column;
        self.advance(); // opening quote
        let content_start = self.index;
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string literal")),
                Some('"') => break,
                Some(_) => {
                    self.advance();
                }
            }
        }
        let content = self.source.contents[content_start..self.index].to_string();
        self.advance(); // closing quote
        let length = (self.index - (content_start - 1)) as u32;
        Ok(Token::new(
            TokenKind::String(content.clone()),
            content,
            Span::new(line, column, length),
        ))
    }

    /// Greedily matches a digraph, falling back to the corresponding
    /// single-character token when the second character doesn't match.
    fn operator(&mut self) -> Token {
        let line = self.line;
        let column = self.column;
        let first = self.advance().expect("operator called with input remaining");
        let second = self.peek();

        macro_rules! digraph {
            ($expected:expr, $kind:expr, $fallback:expr) => {
                if second == Some($expected) {
                    self.advance();
                    Token::new($kind, format!("{}{}", first, $expected), Span::new(line, column, 2))
                } else {
                    Token::new($fallback, first.to_string(), Span::new(line, column, 1))
                }
            };
        }

        match first {
            '!' => digraph!('=', TokenKind::BangEqual, TokenKind::Bang),
            '=' => digraph!('=', TokenKind::EqualEqual, TokenKind::Equal),
            '>' => digraph!('=', TokenKind::GreaterEqual, TokenKind::Greater),
            '<' => digraph!('=', TokenKind::LessEqual, TokenKind::Less),
            '+' => digraph!('+', TokenKind::PlusPlus, TokenKind::Plus),
            '/' => digraph!('/', TokenKind::SlashSlash, TokenKind::Slash),
            ',' => Token::new(TokenKind::Comma, ",", Span::new(line, column, 1)),
            '-' => Token::new(TokenKind::Minus, "-", Span::new(line, column, 1)),
            '(' => Token::new(TokenKind::LeftParen, "(", Span::new(line, column, 1)),
            ')' => Token::new(TokenKind::RightParen, ")", Span::new(line, column, 1)),
            '%' => Token::new(TokenKind::Percent, "%", Span::new(line, column, 1)),
            ';' => Token::new(TokenKind::Semicolon, ";", Span::new(line, column, 1)),
            '*' => Token::new(TokenKind::Star, "*", Span::new(line, column, 1)),
            other => unreachable!("operator() called on non-operator glyph '{}'", other),
        }
    }

    /// Produces the next token, or `EOF` once the source is exhausted.
    /// Idempotent once `EOF` has been reached.
    pub fn next(&mut self) -> Result<Token, MidasError> {
        self.strip();

        let Some(c) = self.peek() else {
            let token = Token::new(
                TokenKind::Eof,
                "",
                Span::new(self.line, self.column, 0),
            );
            trace!("scanned {:?}", token.kind);
            return Ok(token);
        };

        let token = if c.is_ascii_digit() {
            self.number()?
        } else if c == '"' {
            self.string()?
        } else if c.is_ascii_alphabetic() || c == '_' {
            self.identifier()
        } else if "!=><+-/,();%*".contains(c) {
            self.operator()
        } else {
            return Err(self.error(format!("unexpected character '{}'", c)));
        };

        trace!("scanned {:?}", token.kind);
        Ok(token)
    }

    /// Lexes the whole source up front into a `Vec<Token>`, ending
    /// with a single trailing `Eof`.
    pub fn scan_all(source: Rc<Source>) -> Result<Vec<Token>, MidasError> {
        let mut scanner = Scanner::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = scanner.next()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}
