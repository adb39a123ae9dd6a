mod ast;
mod builtins;
mod diagnostics;
mod error;
mod executor;
mod jobs;
mod lexer;
mod parser;
mod path;
mod prompt;
mod reaper;
mod redirect;
mod signals;
mod status;
mod sys;

use std::io::{self, BufRead, Write};

use error::ShellError;
use jobs::JobTable;

fn main() {
    let program_name = program_name();

    let mut job_table = JobTable::new();
    #[cfg(unix)]
    if let Err(e) = signals::install(&mut job_table) {
        diagnostics::report_io(&program_name, None, "failed to install signal handlers", &e);
    }

    let last_exit_code = run(&program_name, &mut job_table);
    std::process::exit(last_exit_code.clamp(0, 255));
}

/// The main loop (SPEC_FULL.md §10): print the prompt, block-read one
/// line, tokenize/parse/execute it, and repeat until EOF or `exit`.
fn run(program_name: &str, job_table: &mut JobTable) -> i32 {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut last_exit_code: i32 = 0;

    loop {
        let cwd = std::env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        print!("{}", prompt::render(&cwd, last_exit_code));
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        let read_result = loop {
            line.clear();
            match stdin.lock().read_line(&mut line) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => break other,
            }
        };

        match read_result {
            Ok(0) => {
                println!("\ngoodbye");
                break;
            }
            Ok(_) => {
                if line.trim().is_empty() {
                    continue;
                }

                match parser::parse_line(&line) {
                    Ok(None) => continue,
                    Ok(Some(pipeline)) => {
                        let (outcome, code) =
                            executor::execute(&pipeline, job_table, program_name);
                        last_exit_code = code;
                        if let executor::Outcome::Exit(code) = outcome {
                            return code;
                        }
                    }
                    Err(err) => {
                        report_parse_error(program_name, &err);
                        last_exit_code = 1;
                    }
                }
            }
            Err(e) => {
                diagnostics::report_io(program_name, None, "error reading input", &e);
                break;
            }
        }
    }

    last_exit_code
}

fn report_parse_error(program_name: &str, err: &ShellError) {
    diagnostics::report_err(program_name, None, err);
}

/// Captured once at startup from `argv[0]`'s file name, falling back to a
/// fixed literal if it is empty or not valid UTF-8.
fn program_name() -> String {
    std::env::args()
        .next()
        .and_then(|arg0| {
            std::path::Path::new(&arg0)
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "jobsh".to_string())
}
