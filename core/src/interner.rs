use once_cell::sync::Lazy;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

static INTERNER: Lazy<RwLock<StringInterner<DefaultBackend>>> =
    Lazy::new(|| RwLock::new(StringInterner::default()));

/// A symbol interned under its canonical (uppercase) spelling.
///
/// Symbols are case-insensitive: `foo`, `Foo` and `FOO` intern to the same
/// `InternedSymbol`, so comparing two symbols is a comparison of their keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InternedSymbol(DefaultSymbol);

impl InternedSymbol {
    /// Canonicalize and intern a spelling, returning the existing symbol if
    /// one with the same canonical spelling was interned before.
    pub fn new(s: &str) -> Self {
        let canonical = s.to_ascii_uppercase();
        let mut interner = INTERNER.write().unwrap_or_else(PoisonError::into_inner);
        InternedSymbol(interner.get_or_intern(canonical))
    }

    /// Look up a spelling without interning it.
    pub fn existing(s: &str) -> Option<Self> {
        let canonical = s.to_ascii_uppercase();
        let interner = INTERNER.read().unwrap_or_else(PoisonError::into_inner);
        interner.get(canonical).map(InternedSymbol)
    }

    /// Resolve the interned symbol back to its canonical spelling
    pub fn resolve(&self) -> String {
        self.with_str(str::to_string)
    }

    /// Resolve the symbol and run a function with the string slice
    pub fn with_str<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        let interner = INTERNER.read().unwrap_or_else(PoisonError::into_inner);
        // Keys only come from `get_or_intern` on this interner, which never forgets.
        f(interner.resolve(self.0).unwrap_or(""))
    }

    pub fn is(&self, name: &str) -> bool {
        self.with_str(|s| s.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for InternedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|s| write!(f, "{s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_same_string_returns_same_symbol() {
        let sym1 = InternedSymbol::new("foo");
        let sym2 = InternedSymbol::new("foo");
        assert_eq!(sym1, sym2);
    }

    #[test]
    fn test_intern_is_case_insensitive() {
        let lower = InternedSymbol::new("lambda");
        let mixed = InternedSymbol::new("LaMbDa");
        assert_eq!(lower, mixed);
        assert_eq!(lower.resolve(), "LAMBDA");
    }

    #[test]
    fn test_intern_different_strings_returns_different_symbols() {
        let sym1 = InternedSymbol::new("foo");
        let sym2 = InternedSymbol::new("bar");
        assert_ne!(sym1, sym2);
    }

    #[test]
    fn test_existing_does_not_intern() {
        assert_eq!(InternedSymbol::existing("never-interned-before-xyz"), None);
        let sym = InternedSymbol::new("interned-once");
        assert_eq!(InternedSymbol::existing("INTERNED-ONCE"), Some(sym));
    }

    #[test]
    fn test_display() {
        let sym = InternedSymbol::new("display-test");
        assert_eq!(format!("{sym}"), "DISPLAY-TEST");
        assert!(sym.is("Display-Test"));
    }
}
