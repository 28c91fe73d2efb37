use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn rdl_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_rdl"))
}

fn temp_lisp_file(content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("rdl_test_{}.lisp", rand::random::<u32>()));
    fs::write(&path, content).unwrap();
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(rdl_binary()).args(args).output().unwrap()
}

// Helper function to create a temp file and run it
fn run_lisp_file(content: &str) -> Result<String, String> {
    let file_path = temp_lisp_file(content);
    let output = run(&[file_path.to_str().unwrap()]);
    fs::remove_file(&file_path).ok();

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
    }
}

#[test]
fn test_multiple_expressions() {
    let result = run_lisp_file(
        r#"
(cons 1 2)
(cons 3 4)
(cons 5 6)
"#,
    );
    // Only the last expression's result is printed
    assert_eq!(result.unwrap(), "(5 . 6)");
}

#[test]
fn test_definitions_carry_across_forms() {
    let result = run_lisp_file(
        r#"
(defun fact (n)
  (if (< n 1)
      1
      (* n (fact (- n 1)))))
(fact 10)
"#,
    );
    assert_eq!(result.unwrap(), "3628800");
}

#[test]
fn test_semicolon_comments() {
    let result = run_lisp_file(
        r#"
; This is a comment
(cons 1 2) ; inline comment
; Another comment
(cons 3 4)
"#,
    );
    assert_eq!(result.unwrap(), "(3 . 4)");
}

#[test]
fn test_empty_file_prints_nothing() {
    assert_eq!(run_lisp_file("; nothing here\n").unwrap(), "");
}

#[test]
fn test_error_exits_nonzero() {
    let result = run_lisp_file("(def x 1)\n(car x)\n(def y 2)\n");
    let stderr = result.unwrap_err();
    assert!(stderr.starts_with("Error: type error:"), "stderr was: {stderr}");
}

#[test]
fn test_parse_error_exits_nonzero() {
    let stderr = run_lisp_file("(cons 1 2").unwrap_err();
    assert!(stderr.contains("unmatched parenthesis"), "stderr was: {stderr}");
}

#[test]
fn test_missing_file() {
    let output = run(&["/definitely/not/here.lisp"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read file"));
}

#[test]
fn test_preload_library() {
    let library =
        temp_lisp_file("(defmacro twice (x) (list '+ x x))\n(defun square (x) (* x x))\n");
    let program = temp_lisp_file("(twice (square 3))\n");

    let output = run(&[
        "--load",
        library.to_str().unwrap(),
        program.to_str().unwrap(),
    ]);
    fs::remove_file(&library).ok();
    fs::remove_file(&program).ok();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "18");
}

#[test]
fn test_max_depth_flag() {
    let program = temp_lisp_file("(defun forever (n) (forever n))\n(forever 1)\n");
    let output = run(&["--max-depth", "50", program.to_str().unwrap()]);
    fs::remove_file(&program).ok();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("recursion limit exceeded"));
}

#[test]
fn test_help_and_bad_arguments() {
    let help = run(&["--help"]);
    assert!(help.status.success());
    assert!(String::from_utf8_lossy(&help.stderr).contains("Usage:"));

    let bad = run(&["--max-depth", "lots"]);
    assert!(!bad.status.success());

    let unknown = run(&["--frobnicate"]);
    assert!(!unknown.status.success());
}
