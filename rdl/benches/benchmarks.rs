use codspeed_criterion_compat::{Criterion, black_box, criterion_group, criterion_main};
use rdl::{Environment, InternedSymbol, Interpreter, Value, parse, parse_one};
use std::time::Duration;

// ============================================================================
// Parsing Benchmarks
// ============================================================================

fn bench_parse_small(c: &mut Criterion) {
    c.bench_function("parse small expr", |b| {
        b.iter(|| black_box(parse("(cons 1 2)").unwrap()))
    });
}

fn bench_parse_large_list(c: &mut Criterion) {
    // Generate a list with 1000 elements
    let mut elements = vec!["(list".to_string()];
    for i in 0..1000 {
        elements.push(i.to_string());
    }
    elements.push(")".to_string());
    let expr = elements.join(" ");

    c.bench_function("parse large list (1000 elements)", |b| {
        b.iter(|| black_box(parse(&expr).unwrap()))
    });
}

fn bench_parse_deep_nesting(c: &mut Criterion) {
    // (+ (+ (+ ... (+ 1 1) ...) 1) 1)
    let mut expr = String::from("1");
    for _ in 0..100 {
        expr = format!("(+ {expr} 1)");
    }

    c.bench_function("parse deep nesting (100 levels)", |b| {
        b.iter(|| black_box(parse(&expr).unwrap()))
    });
}

// ============================================================================
// Evaluation Benchmarks
// ============================================================================

fn bench_eval_simple_arithmetic(c: &mut Criterion) {
    let mut interp = Interpreter::new();
    let expr = parse_one("(+ 1 2 3 4 5)").unwrap();

    c.bench_function("eval simple arithmetic", |b| {
        b.iter(|| black_box(interp.eval_global(&expr).unwrap()))
    });
}

fn bench_eval_lambda_invocation(c: &mut Criterion) {
    let mut interp = Interpreter::new();
    let expr = parse_one("((lambda (x) (+ x 1)) 42)").unwrap();

    c.bench_function("eval lambda invocation", |b| {
        b.iter(|| black_box(interp.eval_global(&expr).unwrap()))
    });
}

fn bench_macro_expansion(c: &mut Criterion) {
    let mut interp = Interpreter::new();
    interp
        .eval_str("(defmacro unless (c body) `(if ,c nil ,body))")
        .unwrap();
    let expr = parse_one("(unless nil (+ 1 2))").unwrap();

    c.bench_function("eval macro call", |b| {
        b.iter(|| black_box(interp.eval_global(&expr).unwrap()))
    });
}

// ============================================================================
// Recursive Function Benchmarks
// ============================================================================

fn bench_recursive_factorial(c: &mut Criterion) {
    let mut interp = Interpreter::new();
    interp
        .eval_str("(defun factorial (n) (if (< n 1) 1 (* n (factorial (- n 1)))))")
        .unwrap();
    let expr = parse_one("(factorial 10)").unwrap();

    c.bench_function("recursive factorial(10)", |b| {
        b.iter(|| black_box(interp.eval_global(&expr).unwrap()))
    });
}

fn bench_recursive_fibonacci(c: &mut Criterion) {
    let mut interp = Interpreter::new();
    interp
        .eval_str(
            r#"
            (defun fib (n)
              (if (< n 2)
                  n
                  (+ (fib (- n 1)) (fib (- n 2)))))
            "#,
        )
        .unwrap();
    let expr = parse_one("(fib 15)").unwrap();

    c.bench_function("recursive fibonacci(15)", |b| {
        b.iter(|| black_box(interp.eval_global(&expr).unwrap()))
    });
}

// ============================================================================
// Environment Benchmarks
// ============================================================================

fn populated_env(size: usize) -> Environment {
    let env = Environment::new();
    for i in 0..size {
        env.bind(InternedSymbol::new(&format!("var-{i}")), Value::Integer(i as i64));
    }
    env
}

fn bench_env_lookup_deep_chain(c: &mut Criterion) {
    let global = populated_env(100);
    let mut env = global.clone();
    for _ in 0..20 {
        env = env.extend();
    }
    let symbol = InternedSymbol::new("var-50");

    c.bench_function("lookup through 20 frames", |b| {
        b.iter(|| black_box(env.lookup(symbol)))
    });
}

fn bench_env_snapshot(c: &mut Criterion) {
    let env = populated_env(1000);

    c.bench_function("snapshot 1000 bindings", |b| {
        b.iter(|| black_box(env.snapshot()))
    });
}

criterion_group!(
    parsing_benches,
    bench_parse_small,
    bench_parse_large_list,
    bench_parse_deep_nesting
);

criterion_group!(
    eval_benches,
    bench_eval_simple_arithmetic,
    bench_eval_lambda_invocation,
    bench_macro_expansion
);

criterion_group! {
    name = recursive_benches;
    config = Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(10));
    targets =
        bench_recursive_factorial,
        bench_recursive_fibonacci
}

criterion_group!(env_benches, bench_env_lookup_deep_chain, bench_env_snapshot);

criterion_main!(parsing_benches, eval_benches, recursive_benches, env_benches);
