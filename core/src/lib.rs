//! Core language definition for rdlisp
//!
//! This crate contains the value model, reader, and environment for the
//! rdlisp language. It does not include the evaluator or the REPL; those
//! live in the `rdl` crate.

pub mod environment;
pub mod error;
pub mod interner;
pub mod language;
pub mod lexer;
pub mod parser;

// Re-export commonly used items for convenience
pub use environment::Environment;
pub use error::{LispError, Result};
pub use interner::InternedSymbol;
pub use language::{Lambda, Pair, Params, Value, cons, list, list_with_tail};
pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use parser::{DEFAULT_MAX_NESTING, Reader, parse, parse_one};
