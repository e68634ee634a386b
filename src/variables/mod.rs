//! Variable storage
//!
//! Small BASIC has exactly 26 numeric variables, one per letter. Only the
//! first letter of a variable name matters and case is ignored, so `count`,
//! `C` and `Cx` all name the same slot.

use crate::error::{Result, SmallBasicError};

/// Number of variable slots (A to Z)
pub const SLOT_COUNT: usize = 26;

/// Fixed-size store of double-precision variables, all starting at zero
#[derive(Debug, Clone, PartialEq)]
pub struct Variables {
    slots: [f64; SLOT_COUNT],
}

impl Variables {
    /// Create a store with every variable set to zero
    pub fn new() -> Self {
        Self {
            slots: [0.0; SLOT_COUNT],
        }
    }

    /// Slot index for a variable name
    pub fn slot(name: &str) -> Result<usize> {
        match name.chars().next() {
            Some(ch) if ch.is_ascii_alphabetic() => {
                Ok((ch.to_ascii_uppercase() as u8 - b'A') as usize)
            }
            _ => Err(SmallBasicError::NotAVariable(name.to_string())),
        }
    }

    /// Read a variable by name
    pub fn get(&self, name: &str) -> Result<f64> {
        Ok(self.slots[Self::slot(name)?])
    }

    /// Assign a variable by name
    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        self.slots[Self::slot(name)?] = value;
        Ok(())
    }

    /// Read a variable by slot index
    pub fn get_slot(&self, slot: usize) -> f64 {
        self.slots[slot % SLOT_COUNT]
    }

    /// Assign a variable by slot index
    pub fn set_slot(&mut self, slot: usize, value: f64) {
        self.slots[slot % SLOT_COUNT] = value;
    }

    /// Reset every variable to zero
    pub fn clear(&mut self) {
        self.slots = [0.0; SLOT_COUNT];
    }
}

impl Default for Variables {
    fn default() -> Self {
        Self::new()
    }
}
