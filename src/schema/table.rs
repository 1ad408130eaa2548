//! A single table: its schema, lifecycle and row count.

/// A column of a `CREATE TABLE` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    name: String,
    ordinal: usize,
}

impl Column {
    /// Create a column at the given zero-based position.
    #[must_use]
    pub fn new(name: impl Into<String>, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            ordinal,
        }
    }

    /// The column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zero-based position of the column in its declaration.
    #[must_use]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

/// Lifecycle of a table's output.
///
/// ```text
/// Uninitialized ──CREATE──▶ SchemaKnown ──first row──▶ SinkOpen ──shutdown──▶ Closed
///       └───────────────────first row────────────────────▲
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableState {
    /// Referenced, but neither declared nor written.
    #[default]
    Uninitialized,
    /// Columns are known; nothing written yet.
    SchemaKnown,
    /// The output is open and receiving rows.
    SinkOpen,
    /// Shut down. Terminal.
    Closed,
}

/// A table seen in the dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    columns: Option<Vec<Column>>,
    state: TableState,
    rows: u64,
}

impl Table {
    /// Create an uninitialized table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: None,
            state: TableState::Uninitialized,
            rows: 0,
        }
    }

    /// The table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared columns, if a `CREATE TABLE` with a column list was seen.
    #[must_use]
    pub fn columns(&self) -> Option<&[Column]> {
        self.columns.as_deref()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TableState {
        self.state
    }

    /// Rows written so far.
    #[must_use]
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Record the declared columns.
    ///
    /// `None` leaves any known columns in place. The state only advances
    /// from [`TableState::Uninitialized`]; an open output is left alone.
    pub fn declare(&mut self, columns: Option<Vec<Column>>) {
        let Some(columns) = columns else {
            return;
        };
        self.columns = Some(columns);
        if self.state == TableState::Uninitialized {
            self.state = TableState::SchemaKnown;
        }
    }

    /// Move to [`TableState::SinkOpen`].
    ///
    /// Returns `false` when the output was already opened or closed.
    pub fn mark_open(&mut self) -> bool {
        match self.state {
            TableState::Uninitialized | TableState::SchemaKnown => {
                self.state = TableState::SinkOpen;
                true
            }
            TableState::SinkOpen | TableState::Closed => false,
        }
    }

    /// Move to [`TableState::Closed`].
    ///
    /// Returns `false` when the table was already closed.
    pub fn mark_closed(&mut self) -> bool {
        if self.state == TableState::Closed {
            return false;
        }
        self.state = TableState::Closed;
        true
    }

    /// Add `rows` to the running count.
    pub fn record_rows(&mut self, rows: u64) {
        self.rows += rows;
    }
}
