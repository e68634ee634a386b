//! Small BASIC Interpreter
//!
//! A line-oriented BASIC interpreter: the program text is loaded into memory,
//! numeric line labels are resolved in a pre-pass, and statements are then
//! executed straight off the source buffer with a single scan cursor.
//! Jumps (GOTO, GOSUB, loop back-edges) simply move that cursor.

pub mod config;
pub mod console;
pub mod evaluator;
pub mod executor;
pub mod filesystem;
pub mod labels;
pub mod program;
pub mod tokenizer;
pub mod variables;

// Re-export core types for convenience
pub use crate::error::{Result, SmallBasicError};
pub use config::Config;
pub use console::{BufferConsole, Console, StdConsole};
pub use executor::{Completion, Executor, ForFrame, Warning};
pub use labels::LabelTable;
pub use program::Program;
pub use tokenizer::{Delimiter, Keyword, Token, Tokenizer};
pub use variables::Variables;

/// Core error handling types for the interpreter
pub mod error {
    use std::path::PathBuf;
    use thiserror::Error;

    /// Result type for interpreter operations
    pub type Result<T> = std::result::Result<T, SmallBasicError>;

    /// Every fatal condition the interpreter can raise.
    ///
    /// A run stops at the first of these; nothing is retried internally.
    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum SmallBasicError {
        // Syntax errors
        #[error("Syntax Error")]
        Syntax,
        #[error("Unbalanced Parentheses")]
        UnbalancedParentheses,
        #[error("No Expression Present")]
        NoExpression,
        #[error("Equal sign expected")]
        EqualSignExpected,
        #[error("Not a variable: {0}")]
        NotAVariable(String),
        #[error("THEN expected")]
        ThenExpected,
        #[error("TO expected")]
        ToExpected,
        #[error("Closing quotes needed")]
        MissingQuote,

        // Runtime errors
        #[error("Division by Zero")]
        DivisionByZero,

        // Label errors
        #[error("Label table full ({capacity} labels)")]
        LabelTableFull { capacity: usize },
        #[error("Duplicate label {0}")]
        DuplicateLabel(String),
        #[error("Undefined label {0}")]
        UndefinedLabel(String),

        // Control flow errors
        #[error("NEXT without FOR")]
        NextWithoutFor,
        #[error("RETURN without GOSUB")]
        ReturnWithoutGosub,
        #[error("UNTIL without REPEAT")]
        UntilWithoutRepeat,

        // I/O errors
        #[error("File not found: {}", .0.display())]
        FileNotFound(PathBuf),
        #[error("I/O error while loading file: {0}")]
        FileIo(String),
        #[error("I/O error on INPUT statement: {0}")]
        InputIo(String),
        #[error("I/O error on PRINT statement: {0}")]
        OutputIo(String),
    }

}
