use crate::error::{LispError, Result};
use crate::interner::InternedSymbol;
use crate::language::{
    QUASIQUOTE, QUOTE, REST_MARKER, UNQUOTE, UNQUOTE_SPLICING, Value, list, list_with_tail,
};
use crate::lexer::{Lexer, Token, TokenKind};

// ============================================================================
// Reader
// ============================================================================

/// Deepest nesting of lists and quote prefixes the reader accepts by default.
pub const DEFAULT_MAX_NESTING: usize = 1000;

/// Recursive-descent reader with a single token of lookahead.
pub struct Reader {
    lexer: Lexer,
    current: Token,
    depth: usize,
    max_depth: usize,
}

impl Reader {
    pub fn new(lexer: Lexer) -> Result<Self> {
        Self::with_max_depth(lexer, DEFAULT_MAX_NESTING)
    }

    /// A reader that rejects input nested more than `max_depth` levels deep.
    pub fn with_max_depth(mut lexer: Lexer, max_depth: usize) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Reader {
            lexer,
            current,
            depth: 0,
            max_depth,
        })
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    /// Read the next top-level form, or `None` once the input is exhausted.
    pub fn read_form(&mut self) -> Result<Option<Value>> {
        let offset = self.current.offset;

        let form = match &self.current.kind {
            TokenKind::Eof => return Ok(None),
            TokenKind::Integer(n) => {
                let value = Value::Integer(*n);
                self.advance()?;
                value
            }
            TokenKind::Symbol(name) => {
                let value = symbol_value(name);
                self.advance()?;
                value
            }
            TokenKind::Quote => self.nested(offset, |r| r.read_prefixed(QUOTE, "'"))?,
            TokenKind::QuasiQuote => self.nested(offset, |r| r.read_prefixed(QUASIQUOTE, "`"))?,
            TokenKind::Unquote => self.nested(offset, |r| r.read_prefixed(UNQUOTE, ","))?,
            TokenKind::UnquoteSplice => {
                self.nested(offset, |r| r.read_prefixed(UNQUOTE_SPLICING, ",@"))?
            }
            TokenKind::AndRest => {
                self.advance()?;
                match self.nested(offset, |r| r.read_required("&rest"))? {
                    target @ Value::Symbol(_) => list(vec![Value::symbol(REST_MARKER), target]),
                    other => {
                        return Err(LispError::Parse(format!(
                            "&rest at offset {offset} must be followed by a symbol, got {other}"
                        )));
                    }
                }
            }
            TokenKind::LeftParen => {
                self.advance()?;
                self.nested(offset, |r| r.read_list(offset))?
            }
            TokenKind::RightParen => {
                return Err(LispError::Parse(format!(
                    "unmatched parenthesis: unexpected ')' at offset {offset}"
                )));
            }
            TokenKind::Dot => {
                return Err(LispError::Parse(format!(
                    "unexpected '.' outside of a list at offset {offset}"
                )));
            }
        };

        Ok(Some(form))
    }

    /// Run `read` one nesting level deeper, failing once the limit is reached.
    fn nested<F>(&mut self, offset: usize, read: F) -> Result<Value>
    where
        F: FnOnce(&mut Self) -> Result<Value>,
    {
        if self.depth >= self.max_depth {
            return Err(LispError::Parse(format!(
                "nesting too deep: more than {} levels at offset {offset}",
                self.max_depth
            )));
        }

        self.depth += 1;
        let result = read(self);
        self.depth -= 1;
        result
    }

    /// Read a form that must be present, e.g. after a quote.
    fn read_required(&mut self, after: &str) -> Result<Value> {
        self.read_form()?
            .ok_or_else(|| LispError::Parse(format!("unexpected end of input after {after}")))
    }

    /// `'x` reads as `(QUOTE x)`, and likewise for the other prefixes.
    fn read_prefixed(&mut self, head: &str, prefix: &str) -> Result<Value> {
        self.advance()?;
        let form = self.read_required(prefix)?;
        Ok(list(vec![Value::symbol(head), form]))
    }

    /// Read the elements of a list whose '(' at `open` was already consumed.
    fn read_list(&mut self, open: usize) -> Result<Value> {
        let mut forms = Vec::new();

        loop {
            match self.current.kind {
                TokenKind::RightParen => {
                    self.advance()?;
                    return Ok(list(forms));
                }
                TokenKind::Eof => {
                    return Err(LispError::Parse(format!(
                        "unmatched parenthesis: missing ')' for '(' at offset {open}"
                    )));
                }
                TokenKind::Dot => {
                    if forms.is_empty() {
                        return Err(LispError::Parse(format!(
                            "illegal dotted pair: no car element before '.' at offset {}",
                            self.current.offset
                        )));
                    }
                    self.advance()?;
                    let tail = self.read_required("'.'")?;
                    if self.current.kind != TokenKind::RightParen {
                        return Err(LispError::Parse(
                            "illegal dotted pair: more forms after cdr element".to_string(),
                        ));
                    }
                    self.advance()?;
                    return Ok(list_with_tail(forms, tail));
                }
                _ => forms.push(self.read_required("'('")?),
            }
        }
    }

    /// Read every top-level form of the input, in order.
    pub fn read(&mut self) -> Result<Vec<Value>> {
        let mut forms = Vec::new();
        while let Some(form) = self.read_form()? {
            forms.push(form);
        }
        Ok(forms)
    }
}

/// `nil` and `t` read as the constants themselves; every other name interns.
fn symbol_value(name: &str) -> Value {
    if name.eq_ignore_ascii_case("nil") {
        Value::Nil
    } else if name.eq_ignore_ascii_case("t") {
        Value::True
    } else {
        Value::Symbol(InternedSymbol::new(name))
    }
}

/// Read all top-level forms from `input`
pub fn parse(input: &str) -> Result<Vec<Value>> {
    Reader::new(Lexer::new(input)?)?.read()
}

/// Read exactly one form from `input`
pub fn parse_one(input: &str) -> Result<Value> {
    let mut forms = parse(input)?;
    match forms.len() {
        1 => Ok(forms.remove(0)),
        0 => Err(LispError::Parse("expected a form, got end of input".to_string())),
        n => Err(LispError::Parse(format!("expected a single form, got {n}"))),
    }
}
