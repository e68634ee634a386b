//! File system operations
//!
//! Loads program files from disk into a [`Program`] buffer.

use crate::error::{Result, SmallBasicError};
use crate::program::Program;
use std::fs;
use std::io;
use std::path::Path;

/// Read a program file completely into memory
pub fn load_program(path: impl AsRef<Path>) -> Result<Program> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => SmallBasicError::FileNotFound(path.to_path_buf()),
        _ => SmallBasicError::FileIo(err.to_string()),
    })?;
    tracing::debug!(path = %path.display(), chars = source.len(), "loaded program");
    Ok(Program::new(&source))
}
