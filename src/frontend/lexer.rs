//! Lexer for the LA language
//!
//! Converts source code into a stream of tokens. Lexical errors do not stop
//! the lexer: they become error tokens, and the parser reports the first one
//! it reaches, so errors surface in source order together with syntax errors.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::Span;

/// The lexer state
pub struct Lexer {
    /// Source code as characters
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Start position of current token
    start: usize,
    /// Current line and column (1-based)
    line: usize,
    column: usize,
    /// Line and column where the current token starts
    start_line: usize,
    start_column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            start: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Get the next character without advancing
    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(ch) = c {
            self.pos += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        c
    }

    fn advance_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn begin_token(&mut self) {
        self.start = self.pos;
        self.start_line = self.line;
        self.start_column = self.column;
    }

    /// Create a span from start to current position
    fn make_span(&self) -> Span {
        Span::new(self.start, self.pos, self.start_line, self.start_column)
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.pos].iter().collect()
    }

    /// Create a token with the current span and lexeme
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.lexeme(), self.make_span())
    }

    /// Skip whitespace
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    /// Skip a `{ ... }` comment. Comments may not span lines.
    fn skip_comment(&mut self) -> bool {
        self.advance(); // {
        while let Some(c) = self.peek() {
            match c {
                '}' => {
                    self.advance();
                    return true;
                }
                '\n' | '\r' => return false,
                _ => {
                    self.advance();
                }
            }
        }
        false
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.lexeme();
        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Ident(text));
        self.make_token(kind)
    }

    /// Read a number literal: `123` or `12.5`
    fn read_number(&mut self) -> Token {
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // `1..3` is an interval, not a real
        if self.peek() == Some('.') && self.peek_next().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
            return self.make_token(TokenKind::RealLit(self.lexeme()));
        }

        match self.lexeme().parse() {
            Ok(value) => self.make_token(TokenKind::IntLit(value)),
            Err(_) => self.make_token(TokenKind::Unknown(self.lexeme())),
        }
    }

    /// Read a string literal. Strings may not span lines.
    fn read_string(&mut self) -> Token {
        self.advance(); // opening quote

        while let Some(c) = self.peek() {
            match c {
                '"' => {
                    self.advance();
                    let text = self.lexeme();
                    let contents = text[1..text.len() - 1].to_string();
                    return self.make_token(TokenKind::StringLit(contents));
                }
                '\n' | '\r' => break,
                _ => {
                    self.advance();
                }
            }
        }

        self.make_token(TokenKind::UnclosedString)
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();
            self.begin_token();

            if self.peek() != Some('{') {
                break;
            }
            if !self.skip_comment() {
                return self.make_token(TokenKind::UnclosedComment);
            }
        }

        let c = match self.peek() {
            Some(c) => c,
            None => return Token::eof(self.make_span()),
        };

        if c.is_ascii_alphabetic() {
            return self.read_identifier();
        }
        if c.is_ascii_digit() {
            return self.read_number();
        }
        if c == '"' {
            return self.read_string();
        }

        self.advance();
        let kind = match c {
            '<' => {
                if self.advance_if('-') {
                    TokenKind::Assign
                } else if self.advance_if('=') {
                    TokenKind::Le
                } else if self.advance_if('>') {
                    TokenKind::Ne
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.advance_if('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '.' => {
                if self.advance_if('.') {
                    TokenKind::DotDot
                } else {
                    TokenKind::Dot
                }
            }
            '=' => TokenKind::Eq,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '^' => TokenKind::Caret,
            '&' => TokenKind::Ampersand,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            other => TokenKind::Unknown(other.to_string()),
        };

        self.make_token(kind)
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}
