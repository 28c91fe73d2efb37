//! Environment for variable bindings
//!
//! An Environment is a frame of bindings plus an optional parent frame. Lookup
//! walks the parent chain, so the root (global) frame is the fallback for every
//! environment derived from it. Closures keep a reference to the frame they were
//! created in; applying one creates a child frame for the parameters.
//!
//! Binding tables are persistent maps, so `snapshot` copies a table in O(1)
//! while keeping the copy fully independent of the original.

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

use rustc_hash::FxBuildHasher;

use crate::interner::InternedSymbol;
use crate::language::Value;

type Bindings = im::HashMap<InternedSymbol, Value, FxBuildHasher>;

// Internal state holding the data and parent pointer
struct Frame {
    bindings: Bindings,
    parent: Option<Environment>,
}

/// Environment for variable bindings.
///
/// Cloning an Environment clones the handle, not the frame: both handles see
/// the same bindings. Use `snapshot` for an independent copy.
#[derive(Clone)]
pub struct Environment {
    frame: Rc<RefCell<Frame>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.frame.borrow();
        f.debug_struct("Environment")
            .field("bindings", &frame.bindings.len())
            .field("has_parent", &frame.parent.is_some())
            .finish()
    }
}

impl Environment {
    /// Create a new, empty root environment
    pub fn new() -> Self {
        Self::with_parent(None, Bindings::default())
    }

    fn with_parent(parent: Option<Environment>, bindings: Bindings) -> Self {
        Environment {
            frame: Rc::new(RefCell::new(Frame { bindings, parent })),
        }
    }

    /// Intern `name` as a canonical symbol. Idempotent per spelling.
    pub fn declare(name: &str) -> InternedSymbol {
        InternedSymbol::new(name)
    }

    /// Interning lookup: the symbol value for `name`, declaring it if needed.
    pub fn resolve_symbol(name: &str) -> Value {
        Value::Symbol(Self::declare(name))
    }

    /// Create an empty child environment of this one
    pub fn extend(&self) -> Self {
        Self::with_parent(Some(self.clone()), Bindings::default())
    }

    /// Set or overwrite a binding in this frame
    pub fn bind(&self, symbol: InternedSymbol, value: Value) {
        self.frame.borrow_mut().bindings.insert(symbol, value);
    }

    /// Look up a binding, walking up the parent chain
    pub fn lookup(&self, symbol: InternedSymbol) -> Option<Value> {
        let mut env = self.clone();
        loop {
            let parent = {
                let frame = env.frame.borrow();
                if let Some(value) = frame.bindings.get(&symbol) {
                    return Some(value.clone());
                }
                frame.parent.clone()
            };
            env = parent?;
        }
    }

    pub fn contains(&self, symbol: InternedSymbol) -> bool {
        self.lookup(symbol).is_some()
    }

    /// An independent environment with a shallow copy of this frame's table.
    ///
    /// Values are shared (a Pair mutated through one is seen through the
    /// other) but new bindings in either are invisible to the other. The
    /// parent chain is shared as-is.
    pub fn snapshot(&self) -> Self {
        let frame = self.frame.borrow();
        Self::with_parent(frame.parent.clone(), frame.bindings.clone())
    }

    /// The root of this environment's parent chain
    pub fn global(&self) -> Self {
        let mut env = self.clone();
        loop {
            let parent = env.frame.borrow().parent.clone();
            match parent {
                Some(parent) => env = parent,
                None => return env,
            }
        }
    }

    /// Symbols bound directly in this frame, sorted by name
    pub fn symbols(&self) -> Vec<InternedSymbol> {
        let mut symbols: Vec<_> = self.frame.borrow().bindings.keys().copied().collect();
        symbols.sort_by_cached_key(InternedSymbol::resolve);
        symbols
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.frame, &other.frame)
    }

    /// Remove every binding from this frame.
    ///
    /// A closure bound in the frame it captured keeps that frame alive, so a
    /// frame that is no longer needed must be cleared to be freed.
    pub fn clear(&self) {
        let bindings = mem::take(&mut self.frame.borrow_mut().bindings);
        drop(bindings);
    }

    /// Clear this frame if `self` is the last handle to it apart from the
    /// closures bound in it that capture it. Returns whether it was cleared.
    ///
    /// Only closures reachable from nowhere else are counted, so a frame whose
    /// closures escaped (returned, stored in a list, bound elsewhere) is kept.
    pub fn release(&self) -> bool {
        if Rc::strong_count(&self.frame) == 1 {
            return false;
        }

        let self_refs = self
            .frame
            .borrow()
            .bindings
            .values()
            .filter(|value| match value {
                Value::Closure(lambda) | Value::Macro(lambda) => {
                    Rc::strong_count(lambda) == 1 && lambda.env.ptr_eq(self)
                }
                _ => false,
            })
            .count();

        if Rc::strong_count(&self.frame) != self_refs + 1 {
            return false;
        }
        self.clear();
        true
    }
}
