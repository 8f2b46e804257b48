//! The bytecode interpreter: a stack machine with a table of global
//! variables and a Host for output.

use std::collections::HashMap;
use std::convert::TryFrom;

use crate::{
    bytecode::{bytes_to_addr, Chunk, OpCode},
    exception::Exception,
    fault::{Interrupt, RuntimeFault},
    host::Host,
    operations,
    traceback::Traceback,
    value::{falsey, truthy, Value},
};

pub struct Runtime<H: Host> {
    host: H,
    stack: Vec<Value>,
    globals: HashMap<String, Value>,
}

impl<H: Host> Runtime<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            stack: Vec::new(),
            globals: HashMap::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Run a chunk to completion. An exception that escapes picks up a
    /// traceback naming the chunk and the line that was executing.
    pub fn interpret(&mut self, chunk: &Chunk) -> Result<Value, Interrupt> {
        self.stack.clear();
        let mut pc = 0;
        loop {
            let addr = pc;
            match self.step(chunk, &mut pc) {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(Interrupt::Exception(exception)) if exception.traceback.is_none() => {
                    let traceback = Traceback::new(chunk.filename(), chunk.line_at(addr));
                    return Err(Interrupt::Exception(exception.with_traceback(traceback)));
                }
                Err(interrupt) => return Err(interrupt),
            }
        }
    }

    fn step(&mut self, chunk: &Chunk, pc: &mut usize) -> Result<Option<Value>, Interrupt> {
        let byte = self.read_byte(chunk, pc)?;
        let op = match OpCode::try_from(byte) {
            Ok(op) => op,
            Err(_) => {
                return Err(Exception::not_implemented(&format!("opcode {:#04x}", byte)).into())
            }
        };
        match op {
            OpCode::Constant => {
                let index = self.read_byte(chunk, pc)?;
                let value = chunk.constant(index)?.clone();
                self.stack.push(value);
            }
            OpCode::Nil => self.stack.push(Value::Nil),
            OpCode::True => self.stack.push(Value::Boolean(true)),
            OpCode::False => self.stack.push(Value::Boolean(false)),
            OpCode::Pop => {
                self.pop()?;
            }
            OpCode::Eq => self.binary(operations::eq)?,
            OpCode::Ne => self.binary(operations::ne)?,
            OpCode::Gt => self.binary(operations::gt)?,
            OpCode::Ge => self.binary(operations::ge)?,
            OpCode::Lt => self.binary(operations::lt)?,
            OpCode::Le => self.binary(operations::le)?,
            OpCode::Add => self.binary(operations::add)?,
            OpCode::Sub => self.binary(operations::sub)?,
            OpCode::Mul => self.binary(operations::mul)?,
            OpCode::Div => self.binary(operations::div)?,
            OpCode::Neg => self.unary(operations::neg)?,
            OpCode::Not => self.unary(operations::not)?,
            OpCode::GetGlobal => {
                let name = self.read_name(chunk, pc)?;
                match self.globals.get(&name) {
                    Some(value) => self.stack.push(value.clone()),
                    None => return Err(Exception::undefined_name(&name).into()),
                }
            }
            OpCode::DefineGlobal => {
                let name = self.read_name(chunk, pc)?;
                let value = self.pop()?;
                self.globals.insert(name, value);
            }
            OpCode::SetGlobal => {
                let name = self.read_name(chunk, pc)?;
                if !self.globals.contains_key(&name) {
                    return Err(Exception::name(&name).into());
                }
                let value = self.pop()?;
                self.globals.insert(name, value);
            }
            OpCode::Print => {
                let value = self.pop()?;
                self.host.print(&value.to_string());
            }
            OpCode::Exit => {
                let value = self.pop()?;
                return Err(Interrupt::Exit(exit_status(&value)));
            }
            OpCode::Jump => {
                let distance = self.read_jump(chunk, pc)?;
                *pc += distance;
            }
            OpCode::JumpIfFalse => {
                let distance = self.read_jump(chunk, pc)?;
                // peeks; the branches pop the condition themselves
                if falsey(self.peek()?) {
                    *pc += distance;
                }
            }
            OpCode::Loop => {
                return Err(Exception::not_implemented("loops").into());
            }
            OpCode::Return => {
                let value = self.pop()?;
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn read_byte(&self, chunk: &Chunk, pc: &mut usize) -> Result<u8, RuntimeFault> {
        let byte = chunk.byte_at(*pc)?;
        *pc += 1;
        Ok(byte)
    }

    fn read_jump(&self, chunk: &Chunk, pc: &mut usize) -> Result<usize, RuntimeFault> {
        let high = self.read_byte(chunk, pc)?;
        let low = self.read_byte(chunk, pc)?;
        Ok(bytes_to_addr(high, low))
    }

    fn read_name(&self, chunk: &Chunk, pc: &mut usize) -> Result<String, Interrupt> {
        let index = self.read_byte(chunk, pc)?;
        match chunk.constant(index)? {
            Value::String(name) => Ok(name.to_string()),
            value => Err(RuntimeFault::new(format!(
                "Variable name constant is not a string: {}",
                value
            ))
            .into()),
        }
    }

    fn binary(
        &mut self,
        operation: fn(Value, Value) -> Result<Value, Interrupt>,
    ) -> Result<(), Interrupt> {
        let b = self.pop()?;
        let a = self.pop()?;
        let result = operation(a, b)?;
        self.stack.push(result);
        Ok(())
    }

    fn unary(
        &mut self,
        operation: fn(Value) -> Result<Value, Interrupt>,
    ) -> Result<(), Interrupt> {
        let a = self.pop()?;
        let result = operation(a)?;
        self.stack.push(result);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, RuntimeFault> {
        self.stack
            .pop()
            .ok_or_else(|| RuntimeFault::new("Stack underflow"))
    }

    fn peek(&self) -> Result<&Value, RuntimeFault> {
        self.stack
            .last()
            .ok_or_else(|| RuntimeFault::new("Stack underflow"))
    }
}

/// `exit` takes any value: numbers become statuses directly (reals round
/// down, out-of-range integers clamp), everything else goes through
/// truthiness.
fn exit_status(value: &Value) -> i32 {
    match value {
        Value::Integer(i) => (*i).clamp(i32::MIN as i64, i32::MAX as i64) as i32,
        Value::Real(r) => r.floor() as i32,
        value => truthy(value) as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compiler::compile_program, exception::ExceptionKind, host::CapturedHost, parser::Parser,
    };
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> (Vec<String>, Result<Value, Interrupt>) {
        let (program, _) = Parser::parse_program("test.bas", source).unwrap();
        let chunk = compile_program(&program).unwrap();
        let mut runtime = Runtime::new(CapturedHost::default());
        let result = runtime.interpret(&chunk);
        (runtime.host().lines.clone(), result)
    }

    fn output(source: &str) -> Vec<String> {
        let (lines, result) = run(source);
        result.unwrap();
        lines
    }

    fn escaped_exception(source: &str) -> Exception {
        match run(source).1 {
            Err(Interrupt::Exception(exception)) => exception,
            other => panic!("expected an exception, got {:?}", other),
        }
    }

    #[test]
    fn prints_hello() {
        assert_eq!(output("10 print \"hello world\"\n"), vec!["hello world"]);
    }

    #[test]
    fn arithmetic_follows_precedence() {
        assert_eq!(output("10 print 1 + 2 * 3\n"), vec!["7"]);
        assert_eq!(output("10 print (1 + 2) * 3\n"), vec!["9"]);
        assert_eq!(output("10 print 1 / 2\n"), vec!["0.5"]);
        assert_eq!(output("10 print -(2 + 3)\n"), vec!["-5"]);
    }

    #[test]
    fn variables_define_assign_and_read() {
        assert_eq!(
            output("10 let count% = 1\n20 count% = count% + 1\n30 print count%\n"),
            vec!["2"]
        );
        assert_eq!(output("10 let a\n20 print a\n"), vec!["nil"]);
    }

    #[test]
    fn assigning_an_undefined_variable_is_a_name_error() {
        let exception = escaped_exception("10 a = 1\n");
        assert!(matches!(exception.kind, ExceptionKind::Name));
        assert_eq!(exception.message, "Cannot assign to undefined variable a");
    }

    #[test]
    fn reading_an_undefined_variable_is_a_name_error() {
        let exception = escaped_exception("10 print missing\n");
        assert_eq!(exception.message, "Undefined variable missing");
    }

    #[test]
    fn escaped_exceptions_carry_a_traceback() {
        let exception = escaped_exception("10 print 1\n20 print 1 / 0\n");
        let traceback = exception.traceback.expect("expected a traceback");
        assert_eq!(
            traceback.to_string(),
            "Traceback:\n  File \"test.bas\", line 20\n"
        );
    }

    #[test]
    fn block_if_takes_the_right_branch() {
        let source = "\
10 let x% = 2
20 if x% == 1 then
30 print \"one\"
40 elseif x% == 2 then
50 print \"two\"
60 elseif x% == 3 then
70 print \"three\"
80 else
90 print \"many\"
100 endif
110 print \"done\"
";
        assert_eq!(output(source), vec!["two", "done"]);
        assert_eq!(
            output(&source.replace("let x% = 2", "let x% = 9")),
            vec!["many", "done"]
        );
    }

    #[test]
    fn inline_if_runs_one_branch() {
        assert_eq!(
            output("10 if true then print 1 else print 2 endif\n"),
            vec!["1"]
        );
        assert_eq!(
            output("10 if \"\" then print 1 else print 2 endif\n"),
            vec!["2"]
        );
    }

    #[test]
    fn logical_operators_short_circuit() {
        // the right side would raise if evaluated
        assert_eq!(
            output("10 if false and missing then print 1 else print 2 endif\n"),
            vec!["2"]
        );
        assert_eq!(
            output("10 if true or missing then print 1 endif\n"),
            vec!["1"]
        );
    }

    #[test]
    fn exit_converts_its_value_to_a_status() {
        assert!(matches!(run("10 exit 3\n").1, Err(Interrupt::Exit(3))));
        assert!(matches!(run("10 exit\n").1, Err(Interrupt::Exit(0))));
        assert!(matches!(run("10 exit 1.9\n").1, Err(Interrupt::Exit(1))));
        assert!(matches!(run("10 exit true\n").1, Err(Interrupt::Exit(1))));
        // too big for a process status clamps instead of wrapping to 0
        assert!(matches!(
            run("10 exit 4294967296\n").1,
            Err(Interrupt::Exit(i32::MAX))
        ));
    }

    #[test]
    fn end_stops_the_program() {
        assert_eq!(output("10 print 1\n20 end\n30 print 2\n"), vec!["1"]);
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(
            output("10 let name$ = \"world\"\n20 print \"hello \" + name$\n"),
            vec!["hello world"]
        );
    }

    #[test]
    fn type_errors_escape_with_their_message() {
        let exception = escaped_exception("10 print 1 + \"one\"\n");
        assert_eq!(
            exception.message,
            "Unsupported operand types for +: Integer and String"
        );
    }
}
