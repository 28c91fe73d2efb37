//! Read-eval-print helpers shared by the interactive loop and the file runner

use rdlisp::{Result, Value, parse};

use crate::interpreter::Interpreter;

pub const PROMPT: &str = "rdl> ";

/// Evaluate every form on one input line against the global environment.
///
/// Results come back in order; evaluation stops after the first failure, so
/// an error is always the last entry. A line that fails to read yields a
/// single error and evaluates nothing.
pub fn eval_line(interp: &mut Interpreter, line: &str) -> Vec<Result<Value>> {
    let forms = match parse(line.trim()) {
        Ok(forms) => forms,
        Err(e) => return vec![Err(e)],
    };

    let mut results = Vec::with_capacity(forms.len());
    for form in &forms {
        let result = interp.eval_global(form);
        let failed = result.is_err();
        results.push(result);
        if failed {
            break;
        }
    }
    results
}
