//! Interpreter session configuration

use std::path::PathBuf;

/// Default cap on nested `eval` calls before a `RecursionLimit` error.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Maximum evaluation depth; deeper nesting fails instead of overflowing
    /// the host stack.
    pub max_depth: usize,
    /// Library files evaluated into the global environment at startup, in order.
    pub preload: Vec<PathBuf>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            preload: Vec::new(),
        }
    }
}

impl InterpreterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_preload(mut self, path: impl Into<PathBuf>) -> Self {
        self.preload.push(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = InterpreterConfig::new()
            .with_max_depth(50)
            .with_preload("a.lisp")
            .with_preload("b.lisp");
        assert_eq!(config.max_depth, 50);
        assert_eq!(config.preload, vec![PathBuf::from("a.lisp"), PathBuf::from("b.lisp")]);
        assert_eq!(InterpreterConfig::default().max_depth, DEFAULT_MAX_DEPTH);
    }
}
