//! Console input/output for PRINT and INPUT
//!
//! The executor talks to the console only through the [`Console`] trait, so a
//! program can run against the real terminal or against an in-memory buffer.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Line-oriented console used by PRINT and INPUT
pub trait Console {
    /// Write text without a trailing newline
    fn write_str(&mut self, text: &str) -> io::Result<()>;

    /// Flush pending output (called before blocking on input)
    fn flush(&mut self) -> io::Result<()>;

    /// Read one line without its terminator. `Ok(None)` means end of input.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Console backed by the process's stdout and stdin
#[derive(Debug, Default)]
pub struct StdConsole;

impl StdConsole {
    /// Create a new standard console
    pub fn new() -> Self {
        Self
    }
}

impl Console for StdConsole {
    fn write_str(&mut self, text: &str) -> io::Result<()> {
        io::stdout().write_all(text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(strip_line_ending(line)))
    }
}

/// In-memory console: output is captured, input is served from a queue
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    output: String,
    input: VecDeque<String>,
}

impl BufferConsole {
    /// Create an empty buffer console
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer console that answers INPUT with the given lines
    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            output: String::new(),
            input: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Everything written so far
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Clear the output buffer
    pub fn clear_output(&mut self) {
        self.output.clear();
    }
}

impl Console for BufferConsole {
    fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.input.pop_front().map(strip_line_ending))
    }
}

fn strip_line_ending(mut line: String) -> String {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_console_captures_output() {
        let mut console = BufferConsole::new();
        console.write_str("HELLO").unwrap();
        console.write_str(" WORLD").unwrap();
        assert_eq!(console.output(), "HELLO WORLD");

        console.clear_output();
        assert_eq!(console.output(), "");
    }

    #[test]
    fn test_buffer_console_serves_input_in_order() {
        let mut console = BufferConsole::with_input(["1\r\n", "2"]);
        assert_eq!(console.read_line().unwrap(), Some("1".to_string()));
        assert_eq!(console.read_line().unwrap(), Some("2".to_string()));
        assert_eq!(console.read_line().unwrap(), None);
    }
}
