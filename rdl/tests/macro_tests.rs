use rdl::{Interpreter, LispError};

fn eval_str(input: &str) -> Result<String, LispError> {
    let mut interp = Interpreter::new();
    Ok(interp.eval_str_last(input)?.to_string())
}

fn eval_multi(inputs: &[&str]) -> Result<String, LispError> {
    let mut interp = Interpreter::new();
    let mut result = String::new();
    for input in inputs {
        result = interp.eval_str_last(input)?.to_string();
    }
    Ok(result)
}

#[test]
fn test_quasiquote_basic() {
    assert_eq!(eval_str("`x").unwrap(), "X");
    assert_eq!(eval_str("`(a b c)").unwrap(), "(A B C)");
    assert_eq!(eval_str("`5").unwrap(), "5");
}

#[test]
fn test_quasiquote_with_unquote() {
    assert_eq!(eval_str("`(a ,(+ 1 2) c)").unwrap(), "(A 3 C)");
    assert_eq!(eval_str("`(a ,(cons 'x 'y) b)").unwrap(), "(A (X . Y) B)");
    assert_eq!(eval_str("`,(+ 1 1)").unwrap(), "2");
}

#[test]
fn test_quasiquote_with_unquote_splicing() {
    assert_eq!(eval_str("`(a ,@(cons 1 (cons 2 nil)) b)").unwrap(), "(A 1 2 B)");
    assert_eq!(eval_str("`(a ,@nil b)").unwrap(), "(A B)");
    assert!(matches!(eval_str("`(a ,@1)"), Err(LispError::Type(_))));
}

#[test]
fn test_quasiquote_dotted_tail() {
    assert_eq!(eval_str("`(a . ,(+ 1 2))").unwrap(), "(A . 3)");
    assert_eq!(eval_str("`(a . b)").unwrap(), "(A . B)");
}

#[test]
fn test_nested_quasiquote() {
    assert_eq!(eval_str("``(a ,,1)").unwrap(), "(QUASIQUOTE (A (UNQUOTE 1)))");
    assert_eq!(
        eval_str("`(a `(b ,(c ,(+ 1 2))))").unwrap(),
        "(A (QUASIQUOTE (B (UNQUOTE (C 3)))))"
    );
}

#[test]
fn test_unquote_outside_quasiquote() {
    assert!(matches!(eval_str(",x"), Err(LispError::Eval(_))));
    assert!(matches!(eval_str(",@x"), Err(LispError::Eval(_))));
}

#[test]
fn test_twice_macro() {
    let result = eval_multi(&["(defmacro twice (x) (list '+ x x))", "(twice 3)"]).unwrap();
    assert_eq!(result, "6");
}

#[test]
fn test_macro_receives_unevaluated_arguments() {
    // The argument form is never evaluated by the macro itself
    let result = eval_multi(&[
        "(defmacro first-form (x) (list 'quote x))",
        "(first-form (this is not evaluated))",
    ])
    .unwrap();
    assert_eq!(result, "(THIS IS NOT EVALUATED)");
}

#[test]
fn test_expansion_is_evaluated_in_caller_environment() {
    let result = eval_multi(&[
        "(defmacro use-y () 'y)",
        "(defun f (y) (use-y))",
        "(f 42)",
    ])
    .unwrap();
    assert_eq!(result, "42");
}

#[test]
fn test_macro_when_usage() {
    let defmacro = "(defmacro when (condition &rest body) `(if ,condition (progn ,@body) nil))";
    assert_eq!(eval_multi(&[defmacro, "(when t 1 2 42)"]).unwrap(), "42");
    assert_eq!(eval_multi(&[defmacro, "(when nil 42)"]).unwrap(), "NIL");
}

#[test]
fn test_macro_unless() {
    let defmacro = "(defmacro unless (condition body) `(if ,condition nil ,body))";
    assert_eq!(eval_multi(&[defmacro, "(unless nil 99)"]).unwrap(), "99");
    assert_eq!(eval_multi(&[defmacro, "(unless t 99)"]).unwrap(), "NIL");
}

#[test]
fn test_defmacro_returns_name() {
    assert_eq!(eval_str("(defmacro m (x) x)").unwrap(), "M");
}

#[test]
fn test_macro_arity() {
    let result = eval_multi(&["(defmacro twice (x) (list '+ x x))", "(twice 1 2)"]);
    assert!(matches!(result, Err(LispError::Arity(_))));
}

#[test]
fn test_macroexpand_1() {
    let result = eval_multi(&[
        "(defmacro twice (x) (list '+ x x))",
        "(macroexpand-1 '(twice (car y)))",
    ])
    .unwrap();
    assert_eq!(result, "(+ (CAR Y) (CAR Y))");

    // Non-macro forms come back unchanged
    assert_eq!(eval_str("(macroexpand-1 '(+ 1 2))").unwrap(), "(+ 1 2)");
    assert_eq!(eval_str("(macroexpand-1 7)").unwrap(), "7");
}

#[test]
fn test_macroexpand_1_only_expands_once() {
    let result = eval_multi(&[
        "(defmacro inner (x) x)",
        "(defmacro outer (x) (list 'inner x))",
        "(macroexpand-1 '(outer 5))",
    ])
    .unwrap();
    assert_eq!(result, "(INNER 5)");
}

#[test]
fn test_macro_defining_functions() {
    let result = eval_multi(&[
        "(defmacro defconst (name value) `(defun ,name () ,value))",
        "(defconst answer 42)",
        "(answer)",
    ])
    .unwrap();
    assert_eq!(result, "42");
}

#[test]
fn test_macro_variable_capture() {
    // Expansions are unhygienic: they bind in the caller's environment
    let result = eval_multi(&["(defmacro set-x (val) `(def x ,val))", "(set-x 100)", "x"]).unwrap();
    assert_eq!(result, "100");
}

#[test]
fn test_macros_are_not_applicable() {
    let result = eval_multi(&["(defmacro m (x) x)", "(apply m '(1))"]);
    assert!(matches!(result, Err(LispError::NotAFunction(_))));

    let computed = eval_multi(&["(defmacro m (x) x)", "((progn m) 1)"]);
    assert!(matches!(computed, Err(LispError::NotAFunction(_))));
}
