//! Error type shared by the reader and the evaluator
//!
//! Every failure surfaced to the boundary is a `LispError`. The variant names the
//! kind of failure, the payload carries the human-readable detail.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LispError {
    #[error("lex error: {0}")]
    Lex(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unbound symbol: {0}")]
    UnboundSymbol(String),

    #[error("not a function: {0}")]
    NotAFunction(String),

    #[error("arity error: {0}")]
    Arity(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("eval error: {0}")]
    Eval(String),

    #[error("recursion limit exceeded: {0}")]
    RecursionLimit(String),
}

pub type Result<T> = std::result::Result<T, LispError>;

impl LispError {
    /// Short name of the failure kind, as shown by the REPL.
    pub fn kind(&self) -> &'static str {
        match self {
            LispError::Lex(_) => "LexError",
            LispError::Parse(_) => "ParseError",
            LispError::UnboundSymbol(_) => "UnboundSymbolError",
            LispError::NotAFunction(_) => "NotAFunctionError",
            LispError::Arity(_) => "ArityError",
            LispError::Type(_) => "TypeError",
            LispError::Eval(_) => "EvalError",
            LispError::RecursionLimit(_) => "RecursionLimitError",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            LispError::Lex(m)
            | LispError::Parse(m)
            | LispError::UnboundSymbol(m)
            | LispError::NotAFunction(m)
            | LispError::Arity(m)
            | LispError::Type(m)
            | LispError::Eval(m)
            | LispError::RecursionLimit(m) => m,
        }
    }
}
