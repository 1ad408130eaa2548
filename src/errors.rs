//! Submodule defining the errors used across the crate.
//!
//! Only conditions that abort the current input are represented here.
//! Per-statement problems are reported through [`crate::Scanned::Skipped`]
//! and never surface as an [`Error`].

use std::io;

/// The step of a sink's lifecycle that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOperation {
    /// Creating or acquiring the destination.
    Open,
    /// Writing a header or a row.
    Write,
    /// Flushing buffered output.
    Flush,
    /// Releasing the destination.
    Close,
}

impl core::fmt::Display for SinkOperation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            SinkOperation::Open => "open",
            SinkOperation::Write => "write",
            SinkOperation::Flush => "flush",
            SinkOperation::Close => "close",
        })
    }
}

/// Coarse classification of a fatal [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The dump uses a construct the converter does not handle.
    UnsupportedConstruct,
    /// The configuration does not allow what the dump asks for.
    ConfigurationConflict,
    /// Reading the input or writing an output failed.
    Io,
}

/// Errors that abort processing of the current input.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An `INSERT` names its columns explicitly.
    #[error(
        "INSERT into table '{table}' at byte {position} specifies its columns, which is not supported"
    )]
    UnsupportedColumnList {
        /// The table the statement inserts into.
        table: String,
        /// Byte offset of the column list.
        position: u64,
    },
    /// An `INSERT` takes its rows from something other than `VALUES`.
    #[error("unsupported INSERT {construct} for table '{table}' at byte {position}")]
    UnsupportedInsertSource {
        /// The table the statement inserts into.
        table: String,
        /// The construct found instead of `VALUES`.
        construct: String,
        /// Byte offset of the construct.
        position: u64,
    },
    /// A tuple holds something other than a literal value.
    #[error("unsupported value expression {found} for table '{table}' at byte {position}")]
    UnsupportedValue {
        /// The table the statement inserts into.
        table: String,
        /// Description of the offending token.
        found: String,
        /// Byte offset of the offending token.
        position: u64,
    },
    /// Rows for a second table arrived while only one output is allowed.
    #[error(
        "found INSERT statements for multiple tables '{first}' and '{second}' (at byte {position}); either filter to one table or enable multi-table output"
    )]
    TableConflict {
        /// The table that already owns the output.
        first: String,
        /// The table that tried to write next.
        second: String,
        /// Byte offset of the `INSERT` into `second`.
        position: u64,
    },
    /// A table name cannot be used to derive an output file name.
    #[error("table name '{table}' at byte {position} cannot be used as an output file name")]
    UnsafeTableName {
        /// The rejected table name.
        table: String,
        /// Byte offset of the first `INSERT` into the table.
        position: u64,
    },
    /// An option holds a value the converter cannot work with.
    #[error("invalid {option}: {reason}")]
    InvalidOption {
        /// The option that was rejected.
        option: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// Reading the input stream failed.
    #[error("failed to read input near byte {position}: {source}")]
    Read {
        /// Byte offset reached before the failure.
        position: u64,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },
    /// An output sink failed.
    ///
    /// The position is that of the last `INSERT` routed to the sink, so a
    /// failure at shutdown still points into the dump.
    #[error("failed to {operation} output for table '{table}' near byte {position}: {source}")]
    Sink {
        /// The table whose sink failed.
        table: String,
        /// The lifecycle step that failed.
        operation: SinkOperation,
        /// Byte offset of the last `INSERT` into the table.
        position: u64,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Classify the error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnsupportedColumnList { .. }
            | Error::UnsupportedInsertSource { .. }
            | Error::UnsupportedValue { .. } => ErrorCategory::UnsupportedConstruct,
            Error::TableConflict { .. } | Error::InvalidOption { .. } => {
                ErrorCategory::ConfigurationConflict
            }
            Error::UnsafeTableName { .. } | Error::Read { .. } | Error::Sink { .. } => {
                ErrorCategory::Io
            }
        }
    }

    /// Name of the table involved, when there is one.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        match self {
            Error::UnsupportedColumnList { table, .. }
            | Error::UnsupportedInsertSource { table, .. }
            | Error::UnsupportedValue { table, .. }
            | Error::UnsafeTableName { table, .. }
            | Error::Sink { table, .. } => Some(table),
            Error::TableConflict { second, .. } => Some(second),
            Error::InvalidOption { .. } | Error::Read { .. } => None,
        }
    }

    /// Byte offset in the dump the error refers to, when there is one.
    #[must_use]
    pub fn position(&self) -> Option<u64> {
        match self {
            Error::UnsupportedColumnList { position, .. }
            | Error::UnsupportedInsertSource { position, .. }
            | Error::UnsupportedValue { position, .. }
            | Error::TableConflict { position, .. }
            | Error::UnsafeTableName { position, .. }
            | Error::Read { position, .. }
            | Error::Sink { position, .. } => Some(*position),
            Error::InvalidOption { .. } => None,
        }
    }

    pub(crate) fn sink(
        table: &str,
        operation: SinkOperation,
        position: u64,
        source: io::Error,
    ) -> Self {
        Error::Sink {
            table: table.to_owned(),
            operation,
            position,
            source,
        }
    }
}
