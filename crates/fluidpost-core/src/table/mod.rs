//! Whitespace-delimited numeric tables as written by the simulation codes.
//!
//! Column meaning is positional; callers state how many columns they need
//! through [`NumericTable::require_columns`] so a short file fails with a
//! clear message instead of an index panic.

mod parser;

pub use parser::{header_integer, header_number, read_table, read_table_source, token_after};

use crate::domain::{PostError, PostResult};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumericTable {
    column_count: usize,
    values: Vec<f64>,
}

impl NumericTable {
    pub fn parse(source: &str) -> PostResult<Self> {
        parser::parse_table(source)
    }

    pub(crate) fn from_rows(column_count: usize, values: Vec<f64>) -> Self {
        Self {
            column_count,
            values,
        }
    }

    pub fn row_count(&self) -> usize {
        if self.column_count == 0 {
            0
        } else {
            self.values.len() / self.column_count
        }
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.row_count() {
            return None;
        }
        let start = index * self.column_count;
        Some(&self.values[start..start + self.column_count])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.column_count.max(1))
    }

    pub fn last_row(&self) -> Option<&[f64]> {
        self.row_count()
            .checked_sub(1)
            .and_then(|index| self.row(index))
    }

    pub fn value(&self, row: usize, column: usize) -> Option<f64> {
        if column >= self.column_count {
            return None;
        }
        self.row(row).map(|values| values[column])
    }

    pub fn column(&self, index: usize) -> PostResult<Vec<f64>> {
        if index >= self.column_count {
            return Err(PostError::input_validation(
                "INPUT.TABLE_COLUMNS",
                format!(
                    "column {} requested from a table with {} columns",
                    index, self.column_count
                ),
            ));
        }
        Ok(self.rows().map(|row| row[index]).collect())
    }

    /// Checks that the table has at least `columns` columns and one row.
    pub fn require_columns(&self, columns: usize, context: &str) -> PostResult<()> {
        if self.is_empty() {
            return Err(PostError::input_validation(
                "INPUT.TABLE_EMPTY",
                format!("{context} contains no data rows"),
            ));
        }
        if self.column_count < columns {
            return Err(PostError::input_validation(
                "INPUT.TABLE_COLUMNS",
                format!(
                    "{context} needs at least {columns} columns but has {}",
                    self.column_count
                ),
            ));
        }
        Ok(())
    }

    /// Appends a row, used where an analysis pads measured data with a
    /// boundary point.
    pub fn push_row(&mut self, row: &[f64]) -> PostResult<()> {
        if self.column_count == 0 {
            self.column_count = row.len();
        }
        if row.len() != self.column_count {
            return Err(PostError::internal(
                "INTERNAL.TABLE_ROW",
                format!(
                    "row of {} values cannot extend a {}-column table",
                    row.len(),
                    self.column_count
                ),
            ));
        }
        self.values.extend_from_slice(row);
        Ok(())
    }
}
