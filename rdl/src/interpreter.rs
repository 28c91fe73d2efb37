//! Tree-walking evaluator
//!
//! An `Interpreter` is one session: a global environment, the registry of
//! native builtins, and the evaluation depth counter. Sessions share nothing
//! but the symbol interner, so any number of them can coexist.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use rdlisp::language::{QUASIQUOTE, QUOTE, UNQUOTE, UNQUOTE_SPLICING};
use rdlisp::{
    Environment, InternedSymbol, Lambda, LispError, Pair, Params, Result, Value, list,
    list_with_tail, parse,
};
use rustc_hash::FxHashMap;

use crate::config::InterpreterConfig;
use crate::stdlib::register_stdlib;

/// Signature of a native builtin. Arguments arrive already evaluated.
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> Result<Value>;

/// Special forms receive their argument forms unevaluated.
type SpecialForm = fn(&mut Interpreter, &[Value], &Environment) -> Result<Value>;

#[derive(Clone, Copy)]
struct Symbols {
    quasiquote: InternedSymbol,
    unquote: InternedSymbol,
    unquote_splicing: InternedSymbol,
}

/// Owner of a session's global frame.
///
/// Top-level closures capture the global frame they are bound in, so the frame
/// is cleared when the last session that can reach it goes away. A forked
/// session keeps its origin alive, since closures it copied still run there.
struct SessionRoot {
    global: Environment,
    _origin: Option<Rc<SessionRoot>>,
}

impl Drop for SessionRoot {
    fn drop(&mut self) {
        self.global.clear();
    }
}

/// Cloning yields another handle on the same session.
#[derive(Clone)]
pub struct Interpreter {
    root: Rc<SessionRoot>,
    builtins: FxHashMap<InternedSymbol, NativeFn>,
    special_forms: FxHashMap<InternedSymbol, SpecialForm>,
    symbols: Symbols,
    config: InterpreterConfig,
    depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// A fresh session with the default configuration.
    pub fn new() -> Self {
        Self::bare(InterpreterConfig::default())
    }

    /// A fresh session that also evaluates every preload file of `config`.
    pub fn with_config(config: InterpreterConfig) -> Result<Self> {
        let mut interp = Self::bare(config);
        for path in interp.config.preload.clone() {
            interp.load_file(&path)?;
        }
        Ok(interp)
    }

    fn bare(config: InterpreterConfig) -> Self {
        let global = Environment::new();
        global.bind(InternedSymbol::new("nil"), Value::Nil);
        global.bind(InternedSymbol::new("t"), Value::True);

        let mut interp = Interpreter {
            root: Rc::new(SessionRoot {
                global,
                _origin: None,
            }),
            builtins: FxHashMap::default(),
            special_forms: FxHashMap::default(),
            symbols: Symbols {
                quasiquote: InternedSymbol::new(QUASIQUOTE),
                unquote: InternedSymbol::new(UNQUOTE),
                unquote_splicing: InternedSymbol::new(UNQUOTE_SPLICING),
            },
            config,
            depth: 0,
        };

        let forms: [(&str, SpecialForm); 10] = [
            (QUOTE, Self::eval_quote),
            (QUASIQUOTE, Self::eval_quasiquote),
            (UNQUOTE, Self::eval_stray_unquote),
            (UNQUOTE_SPLICING, Self::eval_stray_unquote),
            ("DEF", Self::eval_def),
            ("DEFUN", Self::eval_defun),
            ("DEFMACRO", Self::eval_defmacro),
            ("LAMBDA", Self::eval_lambda),
            ("IF", Self::eval_if),
            ("PROGN", Self::eval_progn),
        ];
        for (name, form) in forms {
            interp.special_forms.insert(InternedSymbol::new(name), form);
        }

        register_stdlib(&mut interp);
        interp
    }

    /// Bind a native function under `name` in the global environment.
    pub fn register_builtin(&mut self, name: &str, function: NativeFn) {
        let symbol = InternedSymbol::new(name);
        self.builtins.insert(symbol, function);
        self.root.global.bind(symbol, Value::Builtin(symbol));
    }

    pub fn global(&self) -> &Environment {
        &self.root.global
    }

    /// Current nesting of `eval` calls; zero between top-level forms.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_special_form(&self, symbol: InternedSymbol) -> bool {
        self.special_forms.contains_key(&symbol)
    }

    /// A new session whose global bindings start as a copy of this one's.
    ///
    /// Definitions made in either session afterwards are invisible to the
    /// other. Closures created before the fork still see the original frame,
    /// which therefore lives until both sessions are dropped.
    pub fn fork(&self) -> Self {
        Interpreter {
            root: Rc::new(SessionRoot {
                global: self.root.global.snapshot(),
                _origin: Some(self.root.clone()),
            }),
            depth: 0,
            ..self.clone()
        }
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Evaluate `form` in the global environment
    pub fn eval_global(&mut self, form: &Value) -> Result<Value> {
        let global = self.root.global.clone();
        self.eval(form, &global)
    }

    /// Read every form in `input` and evaluate them in order, stopping at the
    /// first failure. Definitions made by earlier forms stay in place.
    pub fn eval_str(&mut self, input: &str) -> Result<Vec<Value>> {
        let forms = parse(input)?;
        let mut results = Vec::with_capacity(forms.len());
        for form in &forms {
            results.push(self.eval_global(form)?);
        }
        Ok(results)
    }

    /// Like `eval_str`, but only the last result (`NIL` for empty input)
    pub fn eval_str_last(&mut self, input: &str) -> Result<Value> {
        Ok(self.eval_str(input)?.pop().unwrap_or(Value::Nil))
    }

    /// Evaluate a source file into the global environment
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|e| LispError::Eval(format!("failed to read '{}': {e}", path.display())))?;
        self.eval_str_last(&source)
    }

    // ========================================================================
    // Evaluator
    // ========================================================================

    pub fn eval(&mut self, form: &Value, env: &Environment) -> Result<Value> {
        if self.depth >= self.config.max_depth {
            return Err(LispError::RecursionLimit(format!(
                "evaluation nested deeper than {} levels",
                self.config.max_depth
            )));
        }

        self.depth += 1;
        let result = self.eval_form(form, env);
        self.depth -= 1;
        result
    }

    fn eval_form(&mut self, form: &Value, env: &Environment) -> Result<Value> {
        match form {
            Value::Nil | Value::True | Value::Integer(_) => Ok(form.clone()),
            Value::Symbol(symbol) => env
                .lookup(*symbol)
                .ok_or_else(|| LispError::UnboundSymbol(symbol.resolve())),
            Value::Pair(pair) => self.eval_call(form, pair, env),
            Value::Closure(_) | Value::Macro(_) | Value::Builtin(_) => {
                Err(LispError::Eval(format!("cannot evaluate {form}")))
            }
        }
    }

    fn eval_call(&mut self, form: &Value, pair: &Pair, env: &Environment) -> Result<Value> {
        let head = pair.car();
        let rest = pair.cdr();

        match head {
            Value::Symbol(symbol) => {
                if let Some(special) = self.special_forms.get(&symbol).copied() {
                    let args = rest.list_to_vec().map_err(|_| {
                        LispError::Eval(format!("{symbol}: malformed argument list in {form}"))
                    })?;
                    return special(self, &args, env);
                }

                let callee = env
                    .lookup(symbol)
                    .ok_or_else(|| LispError::NotAFunction(format!("{symbol} is not bound")))?;

                match callee {
                    Value::Macro(ref lambda) => {
                        let args = call_args(&rest)?;
                        let expansion = self.expand(lambda, args)?;
                        self.eval(&expansion, env)
                    }
                    Value::Closure(_) | Value::Builtin(_) => {
                        let args = self.eval_args(&rest, env)?;
                        self.apply(&callee, args)
                    }
                    other => Err(LispError::NotAFunction(format!(
                        "{symbol} is bound to {other}, not a function"
                    ))),
                }
            }
            Value::Pair(_) => {
                let callee = self.eval(&head, env)?;
                match callee {
                    Value::Closure(_) | Value::Builtin(_) => {
                        let args = self.eval_args(&rest, env)?;
                        self.apply(&callee, args)
                    }
                    other => Err(LispError::NotAFunction(format!(
                        "{head} evaluated to {other}, not a function"
                    ))),
                }
            }
            other => Err(LispError::Eval(format!("{other} is not an operator in {form}"))),
        }
    }

    fn eval_args(&mut self, rest: &Value, env: &Environment) -> Result<Vec<Value>> {
        call_args(rest)?
            .iter()
            .map(|arg| self.eval(arg, env))
            .collect()
    }

    fn eval_body(&mut self, body: &[Value], env: &Environment) -> Result<Value> {
        let mut result = Value::Nil;
        for form in body {
            result = self.eval(form, env)?;
        }
        Ok(result)
    }

    /// Apply a closure or builtin to already-evaluated arguments.
    pub fn apply(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value> {
        match callee {
            Value::Closure(lambda) => {
                let who = lambda
                    .name
                    .map_or_else(|| "lambda".to_string(), |name| name.resolve());
                let frame = lambda.env.extend();
                lambda.params.bind(&who, &frame, args)?;
                let result = self.eval_body(&lambda.body, &frame);
                frame.release();
                result
            }
            Value::Builtin(name) => {
                let function = self
                    .builtins
                    .get(name)
                    .copied()
                    .ok_or_else(|| LispError::NotAFunction(format!("no builtin named {name}")))?;
                function(self, &args)
            }
            Value::Macro(_) => Err(LispError::NotAFunction(format!(
                "{callee} is a macro and cannot be applied"
            ))),
            other => Err(LispError::NotAFunction(format!("{other} is not a function"))),
        }
    }

    /// Run a macro's body on unevaluated argument forms, yielding the expansion.
    fn expand(&mut self, lambda: &Rc<Lambda>, args: Vec<Value>) -> Result<Value> {
        let who = lambda
            .name
            .map_or_else(|| "macro".to_string(), |name| name.resolve());
        let frame = lambda.env.extend();
        lambda.params.bind(&who, &frame, args)?;
        let expansion = self.eval_body(&lambda.body, &frame);
        frame.release();
        expansion
    }

    /// Expand `form` once if it is a call to a macro bound in the global
    /// environment; otherwise return it unchanged.
    pub fn macroexpand_1(&mut self, form: &Value) -> Result<Value> {
        let Some(pair) = form.as_pair() else {
            return Ok(form.clone());
        };
        let Some(symbol) = pair.car().as_symbol() else {
            return Ok(form.clone());
        };
        if self.is_special_form(symbol) {
            return Ok(form.clone());
        }

        match self.root.global.lookup(symbol) {
            Some(Value::Macro(lambda)) => {
                let args = call_args(&pair.cdr())?;
                self.expand(&lambda, args)
            }
            _ => Ok(form.clone()),
        }
    }

    // ========================================================================
    // Special forms
    // ========================================================================

    fn eval_quote(&mut self, args: &[Value], _env: &Environment) -> Result<Value> {
        expect_args("quote", args, 1)?;
        Ok(args[0].clone())
    }

    fn eval_def(&mut self, args: &[Value], env: &Environment) -> Result<Value> {
        expect_args("def", args, 2)?;
        let name = expect_name("def", &args[0])?;
        let value = self.eval(&args[1], env)?;
        env.bind(name, value);
        Ok(Value::Symbol(name))
    }

    fn eval_defun(&mut self, args: &[Value], env: &Environment) -> Result<Value> {
        let (lambda, name) = define_lambda("defun", args, env)?;
        env.bind(name, Value::Closure(Rc::new(lambda)));
        Ok(Value::Symbol(name))
    }

    fn eval_defmacro(&mut self, args: &[Value], env: &Environment) -> Result<Value> {
        let (lambda, name) = define_lambda("defmacro", args, env)?;
        env.bind(name, Value::Macro(Rc::new(lambda)));
        Ok(Value::Symbol(name))
    }

    fn eval_lambda(&mut self, args: &[Value], env: &Environment) -> Result<Value> {
        if args.len() < 2 {
            return Err(LispError::Arity(format!(
                "lambda: expected at least 2 arguments, got {}",
                args.len()
            )));
        }
        Ok(Value::Closure(Rc::new(Lambda {
            name: None,
            params: Params::parse(&args[0])?,
            body: args[1..].to_vec(),
            env: env.clone(),
        })))
    }

    fn eval_if(&mut self, args: &[Value], env: &Environment) -> Result<Value> {
        if !(2..=3).contains(&args.len()) {
            return Err(LispError::Arity(format!(
                "if: expected 2 or 3 arguments, got {}",
                args.len()
            )));
        }

        if self.eval(&args[0], env)?.is_truthy() {
            self.eval(&args[1], env)
        } else if let Some(otherwise) = args.get(2) {
            self.eval(otherwise, env)
        } else {
            Ok(Value::Nil)
        }
    }

    fn eval_progn(&mut self, args: &[Value], env: &Environment) -> Result<Value> {
        self.eval_body(args, env)
    }

    fn eval_stray_unquote(&mut self, _args: &[Value], _env: &Environment) -> Result<Value> {
        Err(LispError::Eval("unquote used outside of a quasiquote".to_string()))
    }

    // ========================================================================
    // Quasiquote
    // ========================================================================

    fn eval_quasiquote(&mut self, args: &[Value], env: &Environment) -> Result<Value> {
        expect_args("quasiquote", args, 1)?;
        self.quasiquote(&args[0], 1, env)
    }

    /// Expand a quasiquote template. `depth` counts enclosing quasiquotes; an
    /// unquote only evaluates when it closes the outermost one.
    fn quasiquote(&mut self, template: &Value, depth: usize, env: &Environment) -> Result<Value> {
        let Symbols {
            quasiquote,
            unquote,
            ..
        } = self.symbols;

        if let Some(inner) = unary_form(template, unquote) {
            if depth == 1 {
                return self.eval(&inner, env);
            }
            let inner = self.quasiquote(&inner, depth - 1, env)?;
            return Ok(list(vec![Value::Symbol(unquote), inner]));
        }

        if let Some(inner) = unary_form(template, quasiquote) {
            let inner = self.quasiquote(&inner, depth + 1, env)?;
            return Ok(list(vec![Value::Symbol(quasiquote), inner]));
        }

        match template {
            Value::Pair(_) => self.quasiquote_list(template, depth, env),
            atom => Ok(atom.clone()),
        }
    }

    fn quasiquote_list(
        &mut self,
        template: &Value,
        depth: usize,
        env: &Environment,
    ) -> Result<Value> {
        let Symbols {
            quasiquote,
            unquote,
            unquote_splicing,
        } = self.symbols;

        let mut items = Vec::new();
        let mut current = template.clone();

        let tail = loop {
            // `(a . ,b)` reads as `(a UNQUOTE b)`: an unquote in cdr position
            if !items.is_empty()
                && (unary_form(&current, unquote).is_some()
                    || unary_form(&current, quasiquote).is_some())
            {
                break self.quasiquote(&current, depth, env)?;
            }

            let cell = match &current {
                Value::Pair(cell) => cell.clone(),
                other => break other.clone(),
            };

            let element = cell.car();
            match unary_form(&element, unquote_splicing) {
                Some(inner) if depth == 1 => {
                    let spliced = self.eval(&inner, env)?;
                    let spliced = spliced.list_to_vec().map_err(|_| {
                        LispError::Type(format!(
                            "unquote-splicing: expected a proper list, got {spliced}"
                        ))
                    })?;
                    items.extend(spliced);
                }
                Some(inner) => {
                    let inner = self.quasiquote(&inner, depth - 1, env)?;
                    items.push(list(vec![Value::Symbol(unquote_splicing), inner]));
                }
                None => items.push(self.quasiquote(&element, depth, env)?),
            }

            current = cell.cdr();
        };

        Ok(list_with_tail(items, tail))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// The argument forms of a call, which must be a proper list.
fn call_args(rest: &Value) -> Result<Vec<Value>> {
    rest.list_to_vec()
        .map_err(|_| LispError::Eval(format!("improper argument list {rest}")))
}

fn expect_args(who: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(LispError::Arity(format!(
            "{who}: expected {expected} argument{}, got {}",
            if expected == 1 { "" } else { "s" },
            args.len()
        )))
    }
}

fn expect_name(who: &str, value: &Value) -> Result<InternedSymbol> {
    value.as_symbol().ok_or_else(|| {
        LispError::Type(format!("{who}: expected a symbol as the name, got {value}"))
    })
}

/// Shared shape of `defun` and `defmacro`: a name, a parameter list and at
/// least one body form.
fn define_lambda(who: &str, args: &[Value], env: &Environment) -> Result<(Lambda, InternedSymbol)> {
    if args.len() < 3 {
        return Err(LispError::Arity(format!(
            "{who}: expected at least 3 arguments, got {}",
            args.len()
        )));
    }

    let name = expect_name(who, &args[0])?;
    let lambda = Lambda {
        name: Some(name),
        params: Params::parse(&args[1])?,
        body: args[2..].to_vec(),
        env: env.clone(),
    };
    Ok((lambda, name))
}

/// `Some(x)` when `value` is exactly the two-element list `(head x)`.
fn unary_form(value: &Value, head: InternedSymbol) -> Option<Value> {
    let pair = value.as_pair()?;
    if pair.car().as_symbol() != Some(head) {
        return None;
    }
    let rest = pair.cdr();
    let rest = rest.as_pair()?;
    rest.cdr().is_nil().then(|| rest.car())
}
