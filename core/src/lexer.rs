use crate::error::{LispError, Result};

// ============================================================================
// Token Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    LeftParen,
    RightParen,
    Quote,
    QuasiQuote,
    Unquote,
    UnquoteSplice,
    Dot,
    /// `&rest`, the vararg marker in parameter lists
    AndRest,
    Integer(i64),
    Symbol(String),
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Character offset of the token's first character in the input
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, offset: usize) -> Self {
        Token { kind, offset }
    }
}

// ============================================================================
// Lexer
// ============================================================================

/// Pre-scanned token sequence for one unit of input, always ending in `Eof`.
pub struct Lexer {
    tokens: Vec<Token>,
    index: usize,
}

impl Lexer {
    /// Scan all of `input`. Fails on the first invalid character.
    pub fn new(input: &str) -> Result<Self> {
        Ok(Lexer {
            tokens: tokenize(input)?,
            index: 0,
        })
    }

    /// Hand out the next token. Asking again after `Eof` has been handed out
    /// is a reader bug.
    pub fn next_token(&mut self) -> Result<Token> {
        let token = self.tokens.get(self.index).cloned().ok_or_else(|| {
            LispError::Lex(format!("read past end of input (token {})", self.index))
        })?;
        self.index += 1;
        Ok(token)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

/// Scan `input` into tokens, appending a single `Eof`.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut scanner = Scanner::new(input);
    let mut tokens = Vec::new();

    loop {
        let token = scanner.scan_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

fn is_symbol_start(c: char) -> bool {
    c.is_ascii_alphabetic()
        || matches!(c, '+' | '-' | '*' | '/' | '<' | '>' | '=' | '!' | '?' | '%' | '_' | '$')
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '-' | '>' | '<' | '=' | '$' | '?' | '!' | '*' | '+' | '/' | '_' | '%')
}

struct Scanner {
    input: Vec<char>,
    position: usize,
}

impl Scanner {
    fn new(input: &str) -> Self {
        Scanner {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) {
        if self.position < self.input.len() {
            self.position += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char() {
            if c == ';' {
                // Comment runs to the end of the line, newline included
                while let Some(c) = self.current_char() {
                    self.advance();
                    if c == '\n' {
                        break;
                    }
                }
            } else if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.current_char().filter(|c| pred(*c)) {
            text.push(c);
            self.advance();
        }
        text
    }

    fn single(&mut self, kind: TokenKind, offset: usize) -> Result<Token> {
        self.advance();
        Ok(Token { kind, offset })
    }

    fn scan_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let offset = self.position;

        let Some(c) = self.current_char() else {
            return Ok(Token::new(TokenKind::Eof, offset));
        };

        match c {
            '(' => self.single(TokenKind::LeftParen, offset),
            ')' => self.single(TokenKind::RightParen, offset),
            '\'' => self.single(TokenKind::Quote, offset),
            '`' => self.single(TokenKind::QuasiQuote, offset),
            '.' => self.single(TokenKind::Dot, offset),
            ',' => {
                if self.peek_ahead(1) == Some('@') {
                    self.advance();
                    self.single(TokenKind::UnquoteSplice, offset)
                } else {
                    self.single(TokenKind::Unquote, offset)
                }
            }
            '&' => self.read_marker(offset),
            c if c.is_ascii_digit() => self.read_integer(offset),
            '+' | '-' if self.peek_ahead(1).is_some_and(|d| d.is_ascii_digit()) => {
                self.read_integer(offset)
            }
            c if is_symbol_start(c) => {
                let name = self.take_while(is_symbol_char);
                Ok(Token::new(TokenKind::Symbol(name), offset))
            }
            other => Err(LispError::Lex(format!(
                "invalid character '{}' (code point U+{:04X}) at offset {offset}",
                other.escape_debug(),
                other as u32
            ))),
        }
    }

    fn read_integer(&mut self, offset: usize) -> Result<Token> {
        let mut text = String::new();
        if let Some(sign @ ('+' | '-')) = self.current_char() {
            text.push(sign);
            self.advance();
        }
        text.push_str(&self.take_while(|c| c.is_ascii_digit()));

        if self.current_char().is_some_and(is_symbol_char) {
            let rest = self.take_while(is_symbol_char);
            return Err(LispError::Lex(format!(
                "malformed integer literal {text}{rest} at offset {offset}"
            )));
        }

        let value = text.parse::<i64>().map_err(|_| {
            LispError::Lex(format!("{text} is not a valid integer at offset {offset}"))
        })?;
        Ok(Token::new(TokenKind::Integer(value), offset))
    }

    fn read_marker(&mut self, offset: usize) -> Result<Token> {
        self.advance();
        let name = self.take_while(is_symbol_char);
        if name.eq_ignore_ascii_case("rest") {
            Ok(Token::new(TokenKind::AndRest, offset))
        } else {
            Err(LispError::Lex(format!("invalid marker &{name} at offset {offset}")))
        }
    }
}
