//! Where program output goes. The interpreter only ever talks to a Host,
//! so tests can capture everything a program prints.

pub trait Host {
    fn print(&mut self, text: &str);
}

/// Prints to stdout.
#[derive(Debug, Default)]
pub struct ConsoleHost;

impl Host for ConsoleHost {
    fn print(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Collects printed lines instead of writing them anywhere.
#[derive(Debug, Default)]
pub struct CapturedHost {
    pub lines: Vec<String>,
}

impl Host for CapturedHost {
    fn print(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }
}
