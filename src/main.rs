use colored::Colorize;
use miette::Report;
use rustyline::error::ReadlineError;

use bas_rs::{
    ast::Row, compile_command, compile_program, CompileError, CompiledCmd, ConsoleHost, Exception,
    ExitCode, Interrupt, Parser, Runtime, UsageFault, Value,
};

fn main() {
    let mut args: Vec<_> = std::env::args().skip(1).collect();
    let file = consume_arg(&mut args, |arg| {
        if arg.starts_with("--") {
            None
        } else {
            Some(arg.to_string())
        }
    });
    if !args.is_empty() {
        let fault = UsageFault::new(format!("Unrecognized arguments: {:?}", args));
        eprintln!("{}", fault);
        eprintln!("Usage: bas-rs [file]");
        std::process::exit(fault.exit_code().into());
    }

    let status = match file {
        Some(file) => run_file(&file),
        None => run_prompt(),
    };
    std::process::exit(status);
}

fn consume_arg<T, F: Fn(&str) -> Option<T>>(args: &mut Vec<String>, predicate: F) -> Option<T> {
    let found = args
        .iter()
        .enumerate()
        .filter_map(|(idx, arg)| predicate(arg).map(|val| (idx, val)))
        .next();

    if let Some((idx, val)) = found {
        args.remove(idx);
        Some(val)
    } else {
        None
    }
}

fn run_file(filename: &str) -> i32 {
    let source = match std::fs::read_to_string(filename) {
        Ok(source) => source,
        Err(error) => {
            let exception = Exception::os_read(&error, filename);
            eprintln!("{}", exception.message.red());
            return exception.exit_code().into();
        }
    };

    let (program, warning) = match Parser::parse_program(filename, &source) {
        Ok(parsed) => parsed,
        Err(error) => {
            println!("{:?}", Report::new(error));
            return ExitCode::DataError.into();
        }
    };
    if let Some(warning) = warning {
        println!("{:?}", Report::new(warning));
    }

    let chunk = match compile_program(&program) {
        Ok(chunk) => chunk,
        Err(CompileError::Parse(error)) => {
            println!("{:?}", Report::new(error));
            return ExitCode::DataError.into();
        }
        Err(CompileError::Fault(fault)) => {
            eprintln!("{}", fault.to_string().red());
            return fault.exit_code().into();
        }
    };

    let mut runtime = Runtime::new(ConsoleHost);
    match runtime.interpret(&chunk) {
        Ok(_) => ExitCode::Success.into(),
        Err(interrupt) => report_interrupt(&interrupt),
    }
}

fn report_interrupt(interrupt: &Interrupt) -> i32 {
    match interrupt {
        Interrupt::Exit(_) => {}
        Interrupt::Exception(exception) => {
            if let Some(traceback) = &exception.traceback {
                eprint!("{}", traceback);
            }
            eprintln!("{}", exception.to_string().red());
        }
        Interrupt::Fault(fault) => {
            eprintln!("{}", fault.to_string().red());
        }
    }
    interrupt.exit_code()
}

fn run_prompt() -> i32 {
    let mut editor = rustyline::Editor::<()>::new();
    let mut runtime = Runtime::new(ConsoleHost);
    loop {
        match editor.readline("> ") {
            Ok(line) => {
                editor.add_history_entry(line.as_str());
                if let Some(status) = eval_input(&mut runtime, &format!("{}\n", line)) {
                    return status;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                return ExitCode::Success.into()
            }
            Err(error) => {
                eprintln!("{}", error);
                return ExitCode::IoError.into();
            }
        }
    }
}

/// Evaluate one round of input. Returns an exit status once the session
/// should end.
fn eval_input(runtime: &mut Runtime<ConsoleHost>, source: &str) -> Option<i32> {
    let (input, warning) = match Parser::parse_input(source) {
        Ok(parsed) => parsed,
        Err(error) => {
            println!("{:?}", Report::new(error));
            return None;
        }
    };
    if let Some(warning) = warning {
        println!("{:?}", Report::new(warning));
    }

    for row in input {
        let cmd = match row {
            Row::Line(_) => {
                let exception = Exception::not_implemented("program editing");
                println!("{}", exception.message.yellow());
                continue;
            }
            Row::Cmd(cmd) => cmd,
        };
        match compile_command(&cmd) {
            Ok(compiled) => {
                for compiled in compiled {
                    match compiled {
                        CompiledCmd::Runtime { chunk } => match runtime.interpret(&chunk) {
                            Ok(Value::Nil) => {}
                            Ok(value) => println!("==> {}", value),
                            Err(Interrupt::Exception(exception)) => {
                                if let Some(traceback) = &exception.traceback {
                                    print!("{}", traceback);
                                }
                                println!("{}", exception.to_string().red());
                            }
                            Err(interrupt) => return Some(report_interrupt(&interrupt)),
                        },
                        CompiledCmd::Interactive { name } => {
                            let exception = Exception::not_implemented(name);
                            println!("{}", exception.message.yellow());
                        }
                    }
                }
            }
            Err(CompileError::Parse(error)) => {
                println!("{:?}", Report::new(error));
            }
            Err(CompileError::Fault(fault)) => {
                println!("{}", fault.to_string().red());
            }
        }
    }
    None
}
