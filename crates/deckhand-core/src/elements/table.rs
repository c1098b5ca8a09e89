//! Table element payload.

use serde::{Deserialize, Serialize};

/// A grid of text cells, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
    /// Whether the first row is styled as a header.
    #[serde(default)]
    pub header_row: bool,
}

impl Table {
    /// An empty table of the given size.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows: vec![vec![String::new(); columns]; rows],
            header_row: true,
        }
    }

    /// Number of rows, header included.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}
