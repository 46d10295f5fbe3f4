use std::collections::VecDeque;

use crate::{Row, Value};

/// How application code asked rows to be shaped.
///
/// Recorded on the cursor; [`ResultCursor::fetch`] always yields a [`Row`],
/// [`ResultCursor::fetch_values`] always yields values in column order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FetchMode {
    /// Rows keyed by column name.
    #[default]
    Assoc,
    /// Rows keyed by column position.
    Num,
}

/// Sequential reader over one result set.
#[derive(Clone, Debug)]
pub struct ResultCursor {
    sql: String,
    rows: VecDeque<Row>,
    num_rows: usize,
    fetch_mode: FetchMode,
}

impl ResultCursor {
    pub fn new(sql: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            sql: sql.into(),
            num_rows: rows.len(),
            rows: rows.into(),
            fetch_mode: FetchMode::default(),
        }
    }

    /// Statement that produced this result.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of rows the result held when it was produced.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Rows not yet consumed by [`ResultCursor::fetch`].
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    /// Returns the next row, or `None` once the result is exhausted.
    pub fn fetch(&mut self) -> Option<Row> {
        self.rows.pop_front()
    }

    /// Returns the next row's values in column order.
    pub fn fetch_values(&mut self) -> Option<Vec<Value>> {
        self.fetch().map(Row::into_values)
    }

    /// Drains every row not yet fetched.
    pub fn fetch_all(&mut self) -> Vec<Row> {
        self.rows.drain(..).collect()
    }

    pub fn set_fetch_mode(&mut self, mode: FetchMode) {
        self.fetch_mode = mode;
    }

    pub fn fetch_mode(&self) -> FetchMode {
        self.fetch_mode
    }
}

impl Iterator for ResultCursor {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.fetch()
    }
}
