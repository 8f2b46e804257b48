//! Fixture runner: every `.bas` file under test_fixtures/ is a test.
//! Expectations ride in remarks:
//!
//!   ; expect: <printed line>
//!   ; expect parse error: <message>
//!   ; expect runtime error: <message>
//!   ; expect exit: <status>

use std::{
    fs,
    path::{Path, PathBuf},
};

use colored::Colorize;
use itertools::Itertools;
use lazy_static::lazy_static;
use libtest_mimic::{run_tests, Arguments, Outcome, Test};
use miette::{miette, IntoDiagnostic, Result};
use regex::Regex;

use bas_rs::{
    compile_program, CapturedHost, Chunk, CompileError, Interrupt, Parser, Runtime,
    SyntaxDiagnostic,
};

fn main() {
    let tests = read_all_files(PathBuf::from("test_fixtures"))
        .unwrap()
        .into_iter()
        .filter(|path| path.extension().map(|ext| ext == "bas").unwrap_or(false))
        .map(|path| Test {
            name: path.to_string_lossy().into_owned(),
            kind: "program".into(),
            is_bench: false,
            is_ignored: false,
            data: path,
        })
        .collect::<Vec<_>>();

    run_tests(&Arguments::from_args(), tests, |test| {
        match run_test(&test.data) {
            Ok(outcome) => outcome,
            Err(err) => Outcome::Failed {
                msg: Some(format!("{:?}", err)),
            },
        }
    })
    .exit();
}

lazy_static! {
    static ref EXPECTED_OUTPUT_RE: Regex = Regex::new(r"; expect: (.*)\r?\n?").unwrap();
    static ref PARSE_ERROR_RE: Regex = Regex::new(r"; expect parse error: (.*)\r?\n?").unwrap();
    static ref RUNTIME_ERROR_RE: Regex =
        Regex::new(r"; expect runtime error: (.*)\r?\n?").unwrap();
    static ref EXIT_RE: Regex = Regex::new(r"; expect exit: (\d+)").unwrap();
}

fn run_test(path: &Path) -> Result<Outcome> {
    let source = fs::read_to_string(path).into_diagnostic()?;

    let expected_output: Vec<String> = EXPECTED_OUTPUT_RE
        .captures_iter(&source)
        .map(|captures| captures[1].to_string())
        .collect();
    let expected_parse_errors: Vec<String> = PARSE_ERROR_RE
        .captures_iter(&source)
        .map(|captures| captures[1].to_string())
        .collect();
    let expected_runtime_error: Option<String> = RUNTIME_ERROR_RE
        .captures_iter(&source)
        .map(|captures| captures[1].to_string())
        .at_most_one()
        .map_err(|_| miette!("should have at most one expected runtime error"))?;
    let expected_exit: Option<i32> = EXIT_RE
        .captures_iter(&source)
        .filter_map(|captures| captures[1].parse().ok())
        .next();

    let filename = path.to_string_lossy();
    let chunk = match parse_and_compile(&filename, &source) {
        Ok(chunk) => chunk,
        Err(messages) => {
            return Ok(compare_lines(
                "parse error",
                &expected_parse_errors,
                &messages,
            ));
        }
    };
    if !expected_parse_errors.is_empty() {
        return Ok(Outcome::Failed {
            msg: Some(format!(
                "Expected parse errors, but the program compiled:\n{}",
                expected_parse_errors
                    .iter()
                    .map(|message| format!(" - {}\n", message))
                    .collect::<String>()
            )),
        });
    }

    let mut runtime = Runtime::new(CapturedHost::default());
    let run_result = runtime.interpret(&chunk);
    let actual_output = runtime.host().lines.clone();

    match run_result {
        Ok(_) => {
            if let Some(expected) = &expected_runtime_error {
                return Ok(failed(format!("Expected runtime error: {}", expected)));
            }
            if let Some(expected) = expected_exit {
                return Ok(failed(format!("Expected exit status {}", expected)));
            }
        }
        Err(Interrupt::Exit(status)) => match expected_exit {
            Some(expected) if expected == status => {}
            Some(expected) => {
                return Ok(failed(format!(
                    "Expected exit status {}, got {}",
                    expected, status
                )));
            }
            None => return Ok(failed(format!("Unexpected exit status {}", status))),
        },
        Err(Interrupt::Exception(exception)) => match &expected_runtime_error {
            Some(expected) if expected.trim() == exception.message.trim() => {}
            Some(expected) => {
                return Ok(failed(format!(
                    "Runtime errors do not match.\nExpected: {}\n  Actual: {}",
                    expected, exception.message
                )));
            }
            None => {
                return Ok(failed(format!(
                    "Unexpected runtime error: {}",
                    exception.message
                )));
            }
        },
        Err(Interrupt::Fault(fault)) => {
            return Ok(failed(format!("Interpreter fault: {}", fault)));
        }
    }

    Ok(compare_lines("output", &expected_output, &actual_output))
}

fn parse_and_compile(filename: &str, source: &str) -> std::result::Result<Chunk, Vec<String>> {
    let (program, _) =
        Parser::parse_program(filename, source).map_err(|error| error_messages(&error.diagnostics))?;
    compile_program(&program).map_err(|error| match error {
        CompileError::Parse(error) => error_messages(&error.diagnostics),
        CompileError::Fault(fault) => vec![fault.message],
    })
}

fn error_messages(diagnostics: &[SyntaxDiagnostic]) -> Vec<String> {
    diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.is_error())
        .map(|diagnostic| diagnostic.message().to_string())
        .collect()
}

fn failed(msg: String) -> Outcome {
    Outcome::Failed { msg: Some(msg) }
}

/// A side-by-side table of expected vs actual lines, matched row by row.
fn compare_lines(label: &str, expected_lines: &[String], actual_lines: &[String]) -> Outcome {
    const NONE: &str = "<None>";

    fn max_len(lines: &[String], label: &str) -> usize {
        lines
            .iter()
            .map(|line| line.len())
            .max()
            .unwrap_or(0)
            .max(label.len())
    }

    let expected_label = format!("expected {}", label);
    let actual_label = format!("actual {}", label);
    let max_expected_len = max_len(expected_lines, &expected_label);
    let max_actual_len = max_len(actual_lines, &actual_label);

    let mut table = format!(
        "   | {:max_expected_len$} | {:max_actual_len$} \n",
        expected_label.bold(),
        actual_label.bold()
    );
    let line_count = expected_lines.len().max(actual_lines.len());
    let mut unmatched_count = 0usize;
    for i in 0..line_count {
        let expected_line = expected_lines.get(i);
        let actual_line = actual_lines.get(i);

        let is_match = expected_line == actual_line;
        if !is_match {
            unmatched_count += 1;
        }

        let colorify = |string: &str| {
            if is_match {
                string.green()
            } else {
                string.red()
            }
        };

        let result_char = if is_match { "✓" } else { "✗" };
        table.push_str(&format!(
            " {} | {:max_expected_len$} | {:max_actual_len$}\n",
            colorify(result_char),
            expected_line
                .map(|line| colorify(line))
                .unwrap_or_else(|| NONE.dimmed()),
            actual_line
                .map(|line| colorify(line))
                .unwrap_or_else(|| NONE.dimmed()),
        ));
    }

    if unmatched_count > 0 {
        Outcome::Failed { msg: Some(table) }
    } else {
        Outcome::Passed
    }
}

fn read_all_files(prefix: PathBuf) -> Result<Vec<PathBuf>> {
    let mut results = Vec::<PathBuf>::new();
    read_children(prefix, &mut results)?;
    results.sort();
    return Ok(results);

    fn read_children(prefix: PathBuf, results: &mut Vec<PathBuf>) -> Result<()> {
        for entry in fs::read_dir(prefix).into_diagnostic()? {
            let entry = entry.into_diagnostic()?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            if entry.file_type().into_diagnostic()?.is_dir() {
                read_children(entry.path(), results)?;
            } else {
                results.push(entry.path())
            }
        }
        Ok(())
    }
}
