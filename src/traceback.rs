use std::fmt::Display;

/// One entry in a traceback: the code object the error passed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub filename: String,
}

/// Where a runtime exception was raised. Attached to the exception as it
/// propagates out of the interpreter, innermost frame last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traceback {
    pub frames: Vec<Frame>,
    pub line_no: usize,
}

impl Traceback {
    pub fn new(filename: impl Into<String>, line_no: usize) -> Self {
        Self {
            frames: vec![Frame {
                filename: filename.into(),
            }],
            line_no,
        }
    }
}

impl Display for Traceback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Traceback:")?;
        for frame in &self.frames {
            writeln!(f, "  File \"{}\", line {}", frame.filename, self.line_no)?;
        }
        Ok(())
    }
}
