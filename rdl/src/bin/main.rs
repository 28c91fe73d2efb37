use rdl::repl::{PROMPT, eval_line};
use rdl::{Interpreter, InterpreterConfig};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

const HISTORY_FILE: &str = ".rdl_history";

struct Options {
    file: Option<PathBuf>,
    config: InterpreterConfig,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  rdl [OPTIONS]              Start interactive REPL");
    eprintln!("  rdl [OPTIONS] <file.lisp>  Run a Lisp file and print the last result");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --load <file>     Evaluate a library file first (repeatable)");
    eprintln!("  --max-depth <n>   Maximum evaluation depth (default 1000)");
    eprintln!("  -h, --help        Show this help message");
}

fn parse_args(args: &[String]) -> Result<Option<Options>, String> {
    let mut options = Options {
        file: None,
        config: InterpreterConfig::default(),
    };

    let mut args = args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--load" => {
                let path = args.next().ok_or("--load requires a file argument")?;
                options.config = options.config.with_preload(path);
            }
            "--max-depth" => {
                let value = args.next().ok_or("--max-depth requires a number")?;
                let depth = value
                    .parse::<usize>()
                    .map_err(|_| format!("invalid --max-depth value '{value}'"))?;
                options.config = options.config.with_max_depth(depth);
            }
            flag if flag.starts_with('-') => return Err(format!("unknown option '{flag}'")),
            file => {
                if options.file.is_some() {
                    return Err("too many arguments".to_string());
                }
                options.file = Some(PathBuf::from(file));
            }
        }
    }

    Ok(Some(options))
}

fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(HISTORY_FILE))
}

fn repl(interp: &mut Interpreter) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Error: could not start line editor: {e}");
            process::exit(1);
        }
    };

    let history = history_path();
    if let Some(path) = &history {
        // A missing history file is normal on first run
        let _ = rl.load_history(path);
    }

    println!("rdlisp REPL");
    println!("Type expressions to evaluate, :quit or Ctrl-D to exit");
    println!();

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if line == ":quit" {
                    break;
                }

                for result in eval_line(interp, line) {
                    match result {
                        Ok(value) => println!("{value}"),
                        Err(e) => eprintln!("Error: {e}"),
                    }
                }
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    if let Some(path) = &history {
        let _ = rl.save_history(path);
    }
}

fn run_file(interp: &mut Interpreter, path: &Path) -> Result<(), String> {
    let source = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read file '{}': {e}", path.display()))?;

    let results = interp.eval_str(&source).map_err(|e| format!("Error: {e}"))?;
    if let Some(last) = results.last() {
        println!("{last}");
    }

    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_usage();
            return;
        }
        Err(e) => {
            eprintln!("Error: {e}");
            print_usage();
            process::exit(1);
        }
    };

    let mut interp = match Interpreter::with_config(options.config) {
        Ok(interp) => interp,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    match options.file {
        Some(path) => {
            if let Err(e) = run_file(&mut interp, &path) {
                eprintln!("{e}");
                process::exit(1);
            }
        }
        None => repl(&mut interp),
    }
}
