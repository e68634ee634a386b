//! Program buffer
//!
//! Holds the program text as characters for the whole lifetime of a run.
//! The buffer is never modified after construction; execution position is
//! tracked separately as an offset into it.

/// End-of-file sentinel some editors append to text files
pub const EOF_SENTINEL: char = '\u{1a}';

/// Immutable program text
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    text: Vec<char>,
}

impl Program {
    /// Create a program from source text, dropping a trailing EOF sentinel
    pub fn new(source: &str) -> Self {
        let mut text: Vec<char> = source.chars().collect();
        if text.last() == Some(&EOF_SENTINEL) {
            text.pop();
        }
        Self { text }
    }

    /// Number of characters in the program
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the program is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Character at an offset, if in range
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.text.get(offset).copied()
    }

    /// Check if the character at `offset` ends a line.
    ///
    /// `\n` always does; `\r` does only when no `\n` follows it, so `\r\n`
    /// counts once.
    pub fn ends_line_at(&self, offset: usize) -> bool {
        match self.char_at(offset) {
            Some('\n') => true,
            Some('\r') => self.char_at(offset + 1) != Some('\n'),
            _ => false,
        }
    }

    /// 1-based source line containing `offset`
    pub fn line_at(&self, offset: usize) -> usize {
        let end = offset.min(self.text.len());
        1 + (0..end).filter(|&i| self.ends_line_at(i)).count()
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new("")
    }
}
