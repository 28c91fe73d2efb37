//! Built-in primitives
//!
//! Every builtin is a plain `NativeFn` registered under its name in the
//! global environment. Builtins check their own arity and argument types.

use rdlisp::{LispError, Result, Value, cons, list};

use crate::interpreter::Interpreter;

// ============================================================================
// Argument Helpers
// ============================================================================

fn expect_arity(name: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() == expected {
        return Ok(());
    }
    Err(LispError::Arity(format!(
        "{name}: expected {expected} argument{}, got {}",
        if expected == 1 { "" } else { "s" },
        args.len()
    )))
}

fn expect_at_least(name: &str, args: &[Value], minimum: usize) -> Result<()> {
    if args.len() >= minimum {
        return Ok(());
    }
    Err(LispError::Arity(format!(
        "{name}: expected at least {minimum} argument{}, got {}",
        if minimum == 1 { "" } else { "s" },
        args.len()
    )))
}

fn extract_int(name: &str, value: &Value) -> Result<i64> {
    value
        .as_integer()
        .ok_or_else(|| {
            LispError::Type(format!(
                "{name}: expected an integer, got {} {value}",
                value.type_name()
            ))
        })
}

fn integers(name: &str, args: &[Value]) -> Result<Vec<i64>> {
    args.iter().map(|arg| extract_int(name, arg)).collect()
}

fn overflow(name: &str) -> LispError {
    LispError::Eval(format!("{name}: integer overflow"))
}

// ============================================================================
// Pairs and Lists
// ============================================================================

/// Usage: (cons 1 2) => (1 . 2)
pub fn cons_fn(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_arity("cons", args, 2)?;
    Ok(cons(args[0].clone(), args[1].clone()))
}

/// Usage: (car '(1 2)) => 1, (car nil) => nil
pub fn car(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_arity("car", args, 1)?;
    match &args[0] {
        Value::Pair(pair) => Ok(pair.car()),
        Value::Nil => Ok(Value::Nil),
        other => Err(LispError::Type(format!(
            "car: expected a pair, got {} {other}",
            other.type_name()
        ))),
    }
}

/// Usage: (cdr '(1 2)) => (2), (cdr nil) => nil
pub fn cdr(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_arity("cdr", args, 1)?;
    match &args[0] {
        Value::Pair(pair) => Ok(pair.cdr()),
        Value::Nil => Ok(Value::Nil),
        other => Err(LispError::Type(format!(
            "cdr: expected a pair, got {} {other}",
            other.type_name()
        ))),
    }
}

/// Usage: (list 1 2 3) => (1 2 3)
pub fn list_fn(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(list(args.to_vec()))
}

/// Replace the car of a pair in place, returning the pair.
pub fn set_car(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_arity("set-car!", args, 2)?;
    let pair = args[0]
        .as_pair()
        .ok_or_else(|| LispError::Type(format!("set-car!: expected a pair, got {}", args[0])))?;
    pair.set_car(args[1].clone());
    Ok(args[0].clone())
}

/// Replace the cdr of a pair in place, returning the pair.
pub fn set_cdr(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_arity("set-cdr!", args, 2)?;
    let pair = args[0]
        .as_pair()
        .ok_or_else(|| LispError::Type(format!("set-cdr!: expected a pair, got {}", args[0])))?;
    pair.set_cdr(args[1].clone());
    Ok(args[0].clone())
}

// ============================================================================
// Predicates
// ============================================================================

/// Usage: (eq? 'a 'a) => t
///
/// Integers and symbols compare by value; pairs and procedures by identity.
pub fn eq(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_arity("eq?", args, 2)?;
    Ok(Value::from_bool(args[0].is_eq(&args[1])))
}

pub fn is_pair(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_arity("pair?", args, 1)?;
    Ok(Value::from_bool(matches!(args[0], Value::Pair(_))))
}

pub fn is_null(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_arity("null?", args, 1)?;
    Ok(Value::from_bool(args[0].is_nil()))
}

/// Anything that is not a pair, `nil` included
pub fn is_atom(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_arity("atom?", args, 1)?;
    Ok(Value::from_bool(!matches!(args[0], Value::Pair(_))))
}

pub fn is_symbol(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_arity("symbol?", args, 1)?;
    Ok(Value::from_bool(matches!(args[0], Value::Symbol(_))))
}

pub fn is_integer(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_arity("integer?", args, 1)?;
    Ok(Value::from_bool(matches!(args[0], Value::Integer(_))))
}

pub fn not(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_arity("not", args, 1)?;
    Ok(Value::from_bool(!args[0].is_truthy()))
}

// ============================================================================
// Arithmetic
// ============================================================================

/// Usage: (+) => 0, (+ 1 2 3) => 6
pub fn add(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    integers("+", args)?
        .into_iter()
        .try_fold(0i64, |acc, n| acc.checked_add(n))
        .map(Value::Integer)
        .ok_or_else(|| overflow("+"))
}

/// Usage: (*) => 1, (* 2 3 4) => 24
pub fn mul(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    integers("*", args)?
        .into_iter()
        .try_fold(1i64, |acc, n| acc.checked_mul(n))
        .map(Value::Integer)
        .ok_or_else(|| overflow("*"))
}

/// Usage: (- 10 3 2) => 5, (- 4) => -4
pub fn sub(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_at_least("-", args, 1)?;
    let numbers = integers("-", args)?;

    let result = if numbers.len() == 1 {
        numbers[0].checked_neg()
    } else {
        numbers[1..]
            .iter()
            .try_fold(numbers[0], |acc, n| acc.checked_sub(*n))
    };
    result.map(Value::Integer).ok_or_else(|| overflow("-"))
}

/// Usage: (/ 20 2 5) => 2, (/ 7 2) => 3, (/ 2) => 0
///
/// Integer division, truncating toward zero.
pub fn div(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_at_least("/", args, 1)?;
    let numbers = integers("/", args)?;

    let (seed, divisors) = if numbers.len() == 1 {
        (1, &numbers[..])
    } else {
        (numbers[0], &numbers[1..])
    };

    let mut acc = seed;
    for divisor in divisors {
        if *divisor == 0 {
            return Err(LispError::Eval("/: division by zero".to_string()));
        }
        acc = acc.checked_div(*divisor).ok_or_else(|| overflow("/"))?;
    }
    Ok(Value::Integer(acc))
}

fn compare(name: &str, args: &[Value], op: fn(&i64, &i64) -> bool) -> Result<Value> {
    expect_arity(name, args, 2)?;
    let a = extract_int(name, &args[0])?;
    let b = extract_int(name, &args[1])?;
    Ok(Value::from_bool(op(&a, &b)))
}

/// Usage: (< 1 2) => t
pub fn lt(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    compare("<", args, i64::lt)
}

pub fn gt(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    compare(">", args, i64::gt)
}

pub fn num_eq(_interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    compare("=", args, i64::eq)
}

// ============================================================================
// Evaluation
// ============================================================================

/// Usage: (apply + '(1 2 3)) => 6, (apply + 1 2 '(3 4)) => 10
///
/// Arguments between the function and the final list are prepended to it.
pub fn apply(interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_at_least("apply", args, 2)?;
    let callee = &args[0];
    let last = &args[args.len() - 1];
    let leading = &args[1..args.len() - 1];

    let spread = last.list_to_vec().map_err(|_| {
        LispError::Type(format!("apply: last argument must be a proper list, got {last}"))
    })?;

    let mut call_args = leading.to_vec();
    call_args.extend(spread);
    interp.apply(callee, call_args)
}

/// Usage: (eval '(+ 1 2)) => 3, evaluated in the global environment
pub fn eval(interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_arity("eval", args, 1)?;
    interp.eval_global(&args[0])
}

/// Expand a macro call once without evaluating the expansion
/// Usage: (macroexpand-1 '(twice 3)) => (+ 3 3)
pub fn macroexpand_1(interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    expect_arity("macroexpand-1", args, 1)?;
    interp.macroexpand_1(&args[0])
}

// ============================================================================
// Registration
// ============================================================================

/// Register all standard library functions in the interpreter's global
/// environment
pub fn register_stdlib(interp: &mut Interpreter) {
    // Pairs and lists
    interp.register_builtin("cons", cons_fn);
    interp.register_builtin("car", car);
    interp.register_builtin("cdr", cdr);
    interp.register_builtin("list", list_fn);
    interp.register_builtin("set-car!", set_car);
    interp.register_builtin("set-cdr!", set_cdr);

    // Predicates
    interp.register_builtin("eq?", eq);
    interp.register_builtin("pair?", is_pair);
    interp.register_builtin("null?", is_null);
    interp.register_builtin("atom?", is_atom);
    interp.register_builtin("symbol?", is_symbol);
    interp.register_builtin("integer?", is_integer);
    interp.register_builtin("not", not);

    // Arithmetic
    interp.register_builtin("+", add);
    interp.register_builtin("-", sub);
    interp.register_builtin("*", mul);
    interp.register_builtin("/", div);

    // Comparison
    interp.register_builtin("<", lt);
    interp.register_builtin(">", gt);
    interp.register_builtin("=", num_eq);

    // Evaluation
    interp.register_builtin("apply", apply);
    interp.register_builtin("eval", eval);
    interp.register_builtin("macroexpand-1", macroexpand_1);
}
