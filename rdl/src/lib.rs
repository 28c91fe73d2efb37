//! rdlisp runtime - evaluator, builtins, and REPL support
//!
//! This crate provides the execution side of rdlisp:
//! - Interpreter sessions and the tree-walking evaluator
//! - Special forms, macro expansion and quasiquote
//! - Standard library builtins

pub mod config;
pub mod interpreter;
pub mod repl;
pub mod stdlib;

pub use config::InterpreterConfig;
pub use interpreter::{Interpreter, NativeFn};
pub use repl::eval_line;
pub use stdlib::register_stdlib;

// Re-export the language core so embedders need a single dependency
pub use rdlisp::{
    Environment, InternedSymbol, Lambda, LispError, Result, Value, parse, parse_one,
};
