use serde::{Deserialize, Serialize};

/// Loader and renderer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Width of each rendered column, values longer than this are truncated
    pub column_width: usize,
    /// Separates the values of one tuple in a data file
    pub field_separator: char,
    /// Literal denoting SQL null for TEXT values (matched case-insensitively)
    pub null_literal: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            column_width: 16,
            field_separator: '|',
            null_literal: "null".to_string(),
        }
    }
}
