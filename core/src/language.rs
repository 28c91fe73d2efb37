use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::environment::Environment;
use crate::error::{LispError, Result};
use crate::interner::InternedSymbol;

// ============================================================================
// Reserved Spellings
// ============================================================================

pub const QUOTE: &str = "QUOTE";
pub const QUASIQUOTE: &str = "QUASIQUOTE";
pub const UNQUOTE: &str = "UNQUOTE";
pub const UNQUOTE_SPLICING: &str = "UNQUOTE-SPLICING";
/// Head of the `(&REST name)` marker the reader builds for `&rest name`.
/// `&` never starts a symbol, so user code cannot spell this symbol directly.
pub const REST_MARKER: &str = "&REST";

// ============================================================================
// Core Type System
// ============================================================================

/// Mutable cons cell. Pairs are shared by reference: every `Value::Pair`
/// pointing at the same cell sees mutations made through any of them.
pub struct Pair {
    car: RefCell<Value>,
    cdr: RefCell<Value>,
}

impl Pair {
    pub fn new(car: Value, cdr: Value) -> Self {
        Pair {
            car: RefCell::new(car),
            cdr: RefCell::new(cdr),
        }
    }

    pub fn car(&self) -> Value {
        self.car.borrow().clone()
    }

    pub fn cdr(&self) -> Value {
        self.cdr.borrow().clone()
    }

    pub fn set_car(&self, value: Value) {
        *self.car.borrow_mut() = value;
    }

    pub fn set_cdr(&self, value: Value) {
        *self.cdr.borrow_mut() = value;
    }
}

// Unlink the cdr chain in a loop; the derived drop would recurse once per cell.
impl Drop for Pair {
    fn drop(&mut self) {
        let mut next = mem::replace(self.cdr.get_mut(), Value::Nil);
        while let Value::Pair(cell) = next {
            match Rc::try_unwrap(cell) {
                Ok(mut pair) => next = mem::replace(pair.cdr.get_mut(), Value::Nil),
                // Still shared: whoever holds it drops the rest
                Err(_) => break,
            }
        }
    }
}

/// Formal parameters of a closure or macro: the required names, then an
/// optional rest name that collects any remaining arguments as a list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    pub required: Vec<InternedSymbol>,
    pub rest: Option<InternedSymbol>,
}

impl Params {
    /// Validate a parameter list as written in `lambda`, `defun` or `defmacro`.
    ///
    /// The list must be proper and hold only symbols, optionally ending in a
    /// single `(&REST name)` marker. Names may not repeat.
    pub fn parse(spec: &Value) -> Result<Self> {
        let rest_marker = InternedSymbol::new(REST_MARKER);
        let items = spec.list_to_vec().map_err(|_| {
            LispError::Eval(format!("parameter list must be a proper list, got {spec}"))
        })?;

        let mut params = Params::default();
        let mut seen = FxHashSet::default();

        for (index, item) in items.iter().enumerate() {
            if params.rest.is_some() {
                return Err(LispError::Eval(format!(
                    "&rest parameter must be the last parameter in {spec}"
                )));
            }

            let (name, is_rest) = match item {
                Value::Symbol(sym) => (*sym, false),
                Value::Pair(pair) if pair.car().as_symbol() == Some(rest_marker) => {
                    match pair.cdr().list_to_vec().as_deref() {
                        Ok([Value::Symbol(sym)]) => (*sym, true),
                        _ => {
                            return Err(LispError::Eval(format!(
                                "malformed &rest parameter {item}"
                            )));
                        }
                    }
                }
                other => {
                    return Err(LispError::Eval(format!(
                        "parameter {} must be a symbol, got {other}",
                        index + 1
                    )));
                }
            };

            if !seen.insert(name) {
                return Err(LispError::Eval(format!("duplicate parameter {name} in {spec}")));
            }

            if is_rest {
                params.rest = Some(name);
            } else {
                params.required.push(name);
            }
        }

        Ok(params)
    }

    /// Check `args` against these parameters and bind them into `frame`.
    pub fn bind(&self, who: &str, frame: &Environment, args: Vec<Value>) -> Result<()> {
        let expected = self.required.len();
        let arity_ok = match self.rest {
            Some(_) => args.len() >= expected,
            None => args.len() == expected,
        };

        if !arity_ok {
            return Err(LispError::Arity(format!(
                "{who}: expected {} argument{}, got {}",
                self.describe(),
                if expected == 1 { "" } else { "s" },
                args.len()
            )));
        }

        let mut args = args.into_iter();
        for (name, value) in self.required.iter().zip(args.by_ref()) {
            frame.bind(*name, value);
        }
        if let Some(rest) = self.rest {
            frame.bind(rest, list(args));
        }

        Ok(())
    }

    fn describe(&self) -> String {
        match self.rest {
            Some(_) => format!("at least {}", self.required.len()),
            None => self.required.len().to_string(),
        }
    }
}

/// Body of a closure or macro.
pub struct Lambda {
    pub name: Option<InternedSymbol>,
    pub params: Params,
    pub body: Vec<Value>,
    pub env: Environment,
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("body", &self.body)
            .field("env", &"<environment>")
            .finish()
    }
}

#[derive(Clone)]
pub enum Value {
    Nil,
    True,
    Integer(i64),
    Symbol(InternedSymbol),
    Pair(Rc<Pair>),
    Closure(Rc<Lambda>),
    /// Invoked on unevaluated arguments; the result is evaluated again.
    Macro(Rc<Lambda>),
    /// Native primitive, identified by its canonical name.
    Builtin(InternedSymbol),
}

impl Value {
    pub fn symbol(name: &str) -> Value {
        Value::Symbol(InternedSymbol::new(name))
    }

    pub fn from_bool(b: bool) -> Value {
        if b { Value::True } else { Value::Nil }
    }

    /// Everything except `NIL` counts as true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_symbol(&self) -> Option<InternedSymbol> {
        match self {
            Value::Symbol(sym) => Some(*sym),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_pair(&self) -> Option<&Rc<Pair>> {
        match self {
            Value::Pair(pair) => Some(pair),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::True => "t",
            Value::Integer(_) => "integer",
            Value::Symbol(_) => "symbol",
            Value::Pair(_) => "pair",
            Value::Closure(_) => "closure",
            Value::Macro(_) => "macro",
            Value::Builtin(_) => "builtin",
        }
    }

    /// Identity comparison used by `eq?`: integers and symbols compare by
    /// value, pairs and callables by reference.
    pub fn is_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) | (Value::True, Value::True) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Pair(a), Value::Pair(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) | (Value::Macro(a), Value::Macro(b)) => {
                Rc::ptr_eq(a, b)
            }
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => false,
        }
    }

    /// Collect a proper list into a vector.
    ///
    /// Fails with a type error on a dotted list or a circular cdr chain.
    pub fn list_to_vec(&self) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut current = self.clone();
        // Brent-style cycle check: compare against a marker that jumps ahead
        // every power-of-two steps.
        let mut marker: Option<*const Pair> = None;
        let mut steps = 0usize;
        let mut limit = 2usize;

        loop {
            match current {
                Value::Nil => return Ok(items),
                Value::Pair(pair) => {
                    let ptr = Rc::as_ptr(&pair);
                    if marker == Some(ptr) {
                        return Err(LispError::Type(
                            "expected a proper list, got a circular list".to_string(),
                        ));
                    }
                    steps += 1;
                    if steps == limit {
                        marker = Some(ptr);
                        steps = 0;
                        limit *= 2;
                    }
                    items.push(pair.car());
                    current = pair.cdr();
                }
                other => {
                    return Err(LispError::Type(format!(
                        "expected a proper list, got one ending in {other}"
                    )));
                }
            }
        }
    }
}

// ============================================================================
// Equality
// ============================================================================

/// Structural equality: pairs compare element-wise, everything else as `eq?`.
///
/// Cdr chains are walked in a loop, cars recursively. Used by tests and
/// embedders; not cycle-safe.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        let mut left = self.clone();
        let mut right = other.clone();
        loop {
            let (next_left, next_right) = match (&left, &right) {
                (Value::Pair(a), Value::Pair(b)) => {
                    if Rc::ptr_eq(a, b) {
                        return true;
                    }
                    if a.car() != b.car() {
                        return false;
                    }
                    (a.cdr(), b.cdr())
                }
                _ => return left.is_eq(&right),
            };
            left = next_left;
            right = next_right;
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

// ============================================================================
// Display Implementation
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut path = FxHashSet::default();
        write_value(f, self, &mut path)
    }
}

/// `path` holds the pairs currently being printed; meeting one of them again
/// means the structure is circular and it is printed as `...`.
fn write_value(
    f: &mut fmt::Formatter,
    value: &Value,
    path: &mut FxHashSet<*const Pair>,
) -> fmt::Result {
    match value {
        Value::Nil => write!(f, "NIL"),
        Value::True => write!(f, "T"),
        Value::Integer(n) => write!(f, "{n}"),
        Value::Symbol(sym) => write!(f, "{sym}"),
        Value::Pair(pair) if path.contains(&Rc::as_ptr(pair)) => write!(f, "..."),
        Value::Pair(pair) => write_list(f, pair, path),
        Value::Closure(lambda) => match lambda.name {
            Some(name) => write!(f, "#<closure {name}>"),
            None => write!(f, "#<closure>"),
        },
        Value::Macro(lambda) => match lambda.name {
            Some(name) => write!(f, "#<macro {name}>"),
            None => write!(f, "#<macro>"),
        },
        Value::Builtin(name) => write!(f, "#<builtin {name}>"),
    }
}

fn write_list(
    f: &mut fmt::Formatter,
    head: &Rc<Pair>,
    path: &mut FxHashSet<*const Pair>,
) -> fmt::Result {
    let mut entered = Vec::new();
    let mut cell = head.clone();

    write!(f, "(")?;
    loop {
        let ptr = Rc::as_ptr(&cell);
        path.insert(ptr);
        entered.push(ptr);

        write_value(f, &cell.car(), path)?;

        match cell.cdr() {
            Value::Nil => break,
            Value::Pair(next) if path.contains(&Rc::as_ptr(&next)) => {
                write!(f, " . ...")?;
                break;
            }
            Value::Pair(next) => {
                write!(f, " ")?;
                cell = next;
            }
            other => {
                write!(f, " . ")?;
                write_value(f, &other, path)?;
                break;
            }
        }
    }

    for ptr in entered {
        path.remove(&ptr);
    }
    write!(f, ")")
}

// ============================================================================
// Constructors
// ============================================================================

pub fn cons(car: Value, cdr: Value) -> Value {
    Value::Pair(Rc::new(Pair::new(car, cdr)))
}

/// Build a proper list from `items`.
pub fn list<I>(items: I) -> Value
where
    I: IntoIterator<Item = Value>,
    I::IntoIter: DoubleEndedIterator,
{
    list_with_tail(items, Value::Nil)
}

/// Build a list from `items` whose last cdr is `tail`.
pub fn list_with_tail<I>(items: I, tail: Value) -> Value
where
    I: IntoIterator<Item = Value>,
    I::IntoIter: DoubleEndedIterator,
{
    items.into_iter().rev().fold(tail, |acc, item| cons(item, acc))
}
