//! Hand-written scanner for eis
//!
//! Converts source text into a token vector terminated by a single
//! end-of-file sentinel. Newlines become `EndOfLine` tokens only where they
//! terminate a statement; everything else about the scan is a plain
//! single-pass maximal-munch loop.

use super::token::{Token, TokenKind, keyword_kind};
use crate::errors::{Diagnostics, SourceSpan};

/// The scanner for eis source code
pub struct Scanner<'src, 'd> {
    /// The source code being scanned
    source: &'src str,
    /// Diagnostics engine lex errors are reported through
    diagnostics: &'d mut Diagnostics,
    /// Current byte position in the source
    pos: usize,
    /// Start position of the current token
    start: usize,
    /// Current 1-based line
    line: usize,
    /// Tokens produced so far
    tokens: Vec<Token>,
}

/// Token kinds a statement can end on; a newline after one of these
/// produces an `EndOfLine` terminator.
fn ends_statement(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier
            | TokenKind::IntValue
            | TokenKind::FloatValue
            | TokenKind::StringValue
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::This
            | TokenKind::Super
            | TokenKind::Break
            | TokenKind::Continue
            | TokenKind::Return
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus
            | TokenKind::Bool
            | TokenKind::Int
            | TokenKind::Float
            | TokenKind::String
    )
}

impl<'src, 'd> Scanner<'src, 'd> {
    /// Create a new scanner for the given source code
    pub fn new(source: &'src str, diagnostics: &'d mut Diagnostics) -> Self {
        Self {
            source,
            diagnostics,
            pos: 0,
            start: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    /// Scan the whole source into tokens
    pub fn scan(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.pos;
            self.scan_token();
        }

        self.start = self.pos;
        self.push(TokenKind::EndOfFile, "");
        self.tokens
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Peek at the current character without consuming it
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    /// Peek at the next character (one ahead of current)
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advance to the next character and return it
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume the character if it matches the expected one
    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current_span(&self) -> SourceSpan {
        SourceSpan::new(self.start, self.pos)
    }

    fn current_lexeme(&self) -> &'src str {
        &self.source[self.start..self.pos]
    }

    /// Push a token with an explicit lexeme (string literals store their
    /// unescaped contents rather than the raw text)
    fn push(&mut self, kind: TokenKind, lexeme: impl Into<String>) {
        self.tokens
            .push(Token::new(kind, lexeme, self.line, self.current_span()));
    }

    /// Push a token whose lexeme is the scanned text itself
    fn push_kind(&mut self, kind: TokenKind) {
        let lexeme = self.current_lexeme().to_string();
        self.push(kind, lexeme);
    }

    fn error(&mut self, message: &str) {
        self.diagnostics.error(message, self.current_span());
    }

    fn scan_token(&mut self) {
        let c = match self.advance() {
            Some(c) => c,
            None => return,
        };

        match c {
            ' ' | '\t' | '\r' => {}
            '\n' => self.newline(),

            '/' if self.peek() == Some('/') => {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            }
            '/' if self.peek() == Some('*') => self.block_comment(),

            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            c if c.is_ascii_digit() => self.number(),
            '"' => self.string(),

            '(' => self.push_kind(TokenKind::LParen),
            ')' => self.push_kind(TokenKind::RParen),
            '[' => self.push_kind(TokenKind::LBracket),
            ']' => self.push_kind(TokenKind::RBracket),
            '{' => self.push_kind(TokenKind::LBrace),
            '}' => self.push_kind(TokenKind::RBrace),
            ',' => self.push_kind(TokenKind::Comma),
            ';' => self.push_kind(TokenKind::Semicolon),
            '?' => self.push_kind(TokenKind::Question),
            '~' => self.push_kind(TokenKind::Tilde),
            '^' => self.push_kind(TokenKind::Caret),
            '&' => self.push_kind(TokenKind::Amp),
            '|' => self.push_kind(TokenKind::Pipe),
            '%' => self.push_kind(TokenKind::Percent),

            ':' => {
                if self.match_char(':') {
                    self.push_kind(TokenKind::ColonColon);
                } else {
                    self.push_kind(TokenKind::Colon);
                }
            }

            '.' => {
                if self.match_char('.') {
                    if self.match_char('=') {
                        self.push_kind(TokenKind::DotDotEq);
                    } else {
                        self.push_kind(TokenKind::DotDot);
                    }
                } else {
                    self.push_kind(TokenKind::Dot);
                }
            }

            '+' => {
                if self.match_char('=') {
                    self.push_kind(TokenKind::PlusEq);
                } else if self.match_char('+') {
                    self.push_kind(TokenKind::PlusPlus);
                } else {
                    self.push_kind(TokenKind::Plus);
                }
            }

            '-' => {
                if self.match_char('=') {
                    self.push_kind(TokenKind::MinusEq);
                } else if self.match_char('-') {
                    self.push_kind(TokenKind::MinusMinus);
                } else if self.match_char('>') {
                    self.push_kind(TokenKind::Arrow);
                } else {
                    self.push_kind(TokenKind::Minus);
                }
            }

            '*' => {
                if self.match_char('=') {
                    self.push_kind(TokenKind::StarEq);
                } else {
                    self.push_kind(TokenKind::Star);
                }
            }

            '/' => {
                if self.match_char('=') {
                    self.push_kind(TokenKind::SlashEq);
                } else {
                    self.push_kind(TokenKind::Slash);
                }
            }

            '=' => {
                if self.match_char('=') {
                    self.push_kind(TokenKind::EqEq);
                } else {
                    self.push_kind(TokenKind::Eq);
                }
            }

            '!' => {
                if self.match_char('=') {
                    self.push_kind(TokenKind::BangEq);
                } else {
                    self.error("unexpected character '!', logical negation is spelled 'not'");
                }
            }

            '<' => {
                if self.match_char('=') {
                    self.push_kind(TokenKind::LtEq);
                } else if self.match_char('<') {
                    self.push_kind(TokenKind::LtLt);
                } else {
                    self.push_kind(TokenKind::Lt);
                }
            }

            '>' => {
                if self.match_char('=') {
                    self.push_kind(TokenKind::GtEq);
                } else if self.match_char('>') {
                    self.push_kind(TokenKind::GtGt);
                } else {
                    self.push_kind(TokenKind::Gt);
                }
            }

            _ => self.error(&format!("unrecognized character '{}'", c)),
        }
    }

    /// Handle a newline: emit the statement terminator when the previous
    /// token can end a statement. Consecutive newlines collapse because the
    /// terminator itself is not statement-ending.
    fn newline(&mut self) {
        if self.tokens.last().is_some_and(|t| ends_statement(t.kind)) {
            self.push(TokenKind::EndOfLine, "\n");
        }
        self.line += 1;
    }

    /// Skip a nestable block comment, keeping the line count accurate
    fn block_comment(&mut self) {
        self.advance(); // consume '*'
        let mut depth = 1;
        while depth > 0 && !self.is_at_end() {
            if self.peek() == Some('/') && self.peek_next() == Some('*') {
                self.advance();
                self.advance();
                depth += 1;
            } else if self.peek() == Some('*') && self.peek_next() == Some('/') {
                self.advance();
                self.advance();
                depth -= 1;
            } else {
                if self.peek() == Some('\n') {
                    self.line += 1;
                }
                self.advance();
            }
        }
        if depth > 0 {
            self.error("unterminated block comment");
        }
    }

    /// Scan an identifier or keyword
    fn identifier(&mut self) {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }

        match keyword_kind(self.current_lexeme()) {
            Some(kind) => self.push_kind(kind),
            None => self.push_kind(TokenKind::Identifier),
        }
    }

    /// Scan an integer or float literal; `1.` without a following digit is
    /// scanned as an integer followed by '.'
    fn number(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // consume '.'
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
            self.push_kind(TokenKind::FloatValue);
        } else {
            self.push_kind(TokenKind::IntValue);
        }
    }

    /// Scan a string literal, unescaping as we go
    fn string(&mut self) {
        let mut value = String::new();

        loop {
            match self.peek() {
                None => {
                    self.error("unterminated string");
                    return;
                }
                Some('\n') => {
                    self.error("unterminated string (newline in string)");
                    return;
                }
                Some('"') => {
                    self.advance();
                    self.push(TokenKind::StringValue, value);
                    return;
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => value.push('\n'),
                        Some('r') => value.push('\r'),
                        Some('t') => value.push('\t'),
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        Some('0') => value.push('\0'),
                        Some(other) => {
                            self.error(&format!("invalid escape sequence '\\{}'", other));
                            value.push(other);
                        }
                        None => {
                            self.error("unterminated string");
                            return;
                        }
                    }
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }
    }
}
