//! Interpreter configuration

/// Settings that shape a run without changing program semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Column stop used by `,` in a PRINT list. Default: 8.
    pub tab_width: usize,
    /// Maximum number of labels, or `None` for no limit. Default: `None`.
    pub label_capacity: Option<usize>,
    /// Prompt printed by INPUT when no quoted prompt is given. Default: `"? "`.
    pub input_prompt: String,
    /// Warning printed when INPUT receives a non-numeric line.
    pub invalid_input_message: String,
}

impl Config {
    /// Set the PRINT tab width (clamped to at least one column)
    pub fn with_tab_width(mut self, tab_width: usize) -> Self {
        self.tab_width = tab_width.max(1);
        self
    }

    /// Limit the number of labels the label table accepts
    pub fn with_label_capacity(mut self, capacity: usize) -> Self {
        self.label_capacity = Some(capacity);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tab_width: 8,
            label_capacity: None,
            input_prompt: "? ".to_string(),
            invalid_input_message: "Invalid input.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.tab_width, 8);
        assert_eq!(config.label_capacity, None);
        assert_eq!(config.input_prompt, "? ");
    }

    #[test]
    fn test_zero_tab_width_is_clamped() {
        let config = Config::default().with_tab_width(0);
        assert_eq!(config.tab_width, 1);
    }
}
