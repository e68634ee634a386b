//! Label table
//!
//! A label is a number written as the first token of a line. Before a run
//! starts, every line is visited once and each label is mapped to the offset
//! where its line begins; GOTO and GOSUB then jump by looking the label up.

use crate::error::{Result, SmallBasicError};
use crate::tokenizer::{Token, Tokenizer};
use std::collections::BTreeMap;

/// Mapping from label text to the offset of its line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    labels: BTreeMap<String, usize>,
}

impl LabelTable {
    /// Create an empty label table
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the whole program for line labels.
    ///
    /// Only the first token of each line is inspected, so numbers in the
    /// middle of a line never become labels. The cursor is left at zero.
    pub fn scan(tokenizer: &mut Tokenizer, capacity: Option<usize>) -> Result<Self> {
        let mut table = Self::new();
        tokenizer.jump(0);

        loop {
            let line_start = tokenizer.cursor();
            match tokenizer.next_token()? {
                Token::EndOfProgram => break,
                // Blank line: the terminator has already been consumed
                Token::EndOfLine => continue,
                Token::Number(label) => {
                    table.insert(label, line_start, capacity)?;
                    tokenizer.skip_line();
                }
                _ => tokenizer.skip_line(),
            }
        }

        tokenizer.jump(0);
        tracing::debug!(labels = table.len(), "label table built");
        Ok(table)
    }

    fn insert(&mut self, label: String, offset: usize, capacity: Option<usize>) -> Result<()> {
        if self.labels.contains_key(&label) {
            return Err(SmallBasicError::DuplicateLabel(label));
        }
        if let Some(capacity) = capacity {
            if self.labels.len() >= capacity {
                return Err(SmallBasicError::LabelTableFull { capacity });
            }
        }
        self.labels.insert(label, offset);
        Ok(())
    }

    /// Offset of the line carrying `label`
    pub fn get(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if no labels were found
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels and their offsets, ordered by label text
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels.iter().map(|(label, &offset)| (label.as_str(), offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Program;

    fn scan(source: &str) -> Result<LabelTable> {
        let mut tokenizer = Tokenizer::new(Program::new(source));
        LabelTable::scan(&mut tokenizer, None)
    }

    #[test]
    fn test_labels_map_to_line_starts() {
        let table = scan("10 A = 1\n20 B = 2\r\n\n30 END").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("10"), Some(0));
        assert_eq!(table.get("20"), Some(9));
        assert_eq!(table.get("30"), Some(20));
    }

    #[test]
    fn test_unlabelled_lines_are_skipped() {
        let table = scan("PRINT 100\nA = 5\n200 END").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("100"), None);
        assert_eq!(table.get("200"), Some(16));
    }

    #[test]
    fn test_duplicate_label() {
        let result = scan("10 A = 1\n10 B = 2\n");
        assert_eq!(result, Err(SmallBasicError::DuplicateLabel("10".to_string())));
    }

    #[test]
    fn test_label_capacity() {
        let mut tokenizer = Tokenizer::new(Program::new("1 END\n2 END\n3 END"));
        let result = LabelTable::scan(&mut tokenizer, Some(2));
        assert_eq!(result, Err(SmallBasicError::LabelTableFull { capacity: 2 }));
    }

    #[test]
    fn test_cursor_reset_after_scan() {
        let mut tokenizer = Tokenizer::new(Program::new("10 A = 1\n20 END"));
        LabelTable::scan(&mut tokenizer, None).unwrap();
        assert_eq!(tokenizer.cursor(), 0);
    }

    #[test]
    fn test_iter_is_ordered() {
        let table = scan("b0 END\n20 END\n10 END").unwrap();
        let labels: Vec<&str> = table.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["10", "20"]);
    }
}
