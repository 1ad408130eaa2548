//! Conversion options, built once and shared read-only by every component.

use crate::errors::Error;

/// How rows from different tables are routed to outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// All rows go to one destination, which only one table may use.
    #[default]
    Single,
    /// Every table gets its own destination.
    Multi,
}

/// Options controlling how a dump is converted.
///
/// # Example
///
/// ```
/// use mysqldump2csv::{Config, OutputMode};
///
/// let config = Config::default()
///     .with_delimiter("\t")
///     .with_header(false)
///     .with_mode(OutputMode::Multi);
/// assert_eq!(config.delimiter(), "\t");
/// assert!(!config.header());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    delimiter: String,
    terminator: String,
    header: bool,
    table_filter: Option<String>,
    mode: OutputMode,
    verbose: bool,
    null_sentinel: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delimiter: ",".into(),
            terminator: "\n".into(),
            header: true,
            table_filter: None,
            mode: OutputMode::Single,
            verbose: false,
            null_sentinel: "NULL".into(),
        }
    }
}

impl Config {
    /// Set the field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Set the line terminator.
    #[must_use]
    pub fn with_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
        self
    }

    /// Enable or disable the header line.
    #[must_use]
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Only convert rows of the named table.
    #[must_use]
    pub fn with_table_filter(mut self, table: impl Into<String>) -> Self {
        self.table_filter = Some(table.into());
        self
    }

    /// Choose between one shared output and one output per table.
    #[must_use]
    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Report skipped statements as warnings rather than debug events.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the text written for `NULL` values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] when `sentinel` is empty, since a
    /// `NULL` would then be indistinguishable from a missing field.
    pub fn with_null_sentinel(mut self, sentinel: impl Into<String>) -> Result<Self, Error> {
        let sentinel = sentinel.into();
        if sentinel.is_empty() {
            return Err(Error::InvalidOption {
                option: "null sentinel",
                reason: "must not be empty",
            });
        }
        self.null_sentinel = sentinel;
        Ok(self)
    }

    /// The field delimiter.
    #[must_use]
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// The line terminator.
    #[must_use]
    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    /// Whether a header line is written.
    #[must_use]
    pub fn header(&self) -> bool {
        self.header
    }

    /// The only table to convert, if any.
    #[must_use]
    pub fn table_filter(&self) -> Option<&str> {
        self.table_filter.as_deref()
    }

    /// The routing mode.
    #[must_use]
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Whether skipped statements are reported as warnings.
    #[must_use]
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// The text written for `NULL` values.
    #[must_use]
    pub fn null_sentinel(&self) -> &str {
        &self.null_sentinel
    }

    /// Whether rows of `table` pass the table filter.
    #[must_use]
    pub fn accepts(&self, table: &str) -> bool {
        self.table_filter.as_deref().is_none_or(|only| only == table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.delimiter(), ",");
        assert_eq!(config.terminator(), "\n");
        assert!(config.header());
        assert_eq!(config.table_filter(), None);
        assert_eq!(config.mode(), OutputMode::Single);
        assert!(!config.verbose());
        assert_eq!(config.null_sentinel(), "NULL");
    }

    #[test]
    fn test_filter_accepts_only_named_table() {
        let config = Config::default().with_table_filter("page");
        assert!(config.accepts("page"));
        assert!(!config.accepts("user"));
        assert!(Config::default().accepts("anything"));
    }

    #[test]
    fn test_empty_null_sentinel_rejected() {
        let err = Config::default().with_null_sentinel("").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidOption {
                option: "null sentinel",
                ..
            }
        ));
        let config = Config::default().with_null_sentinel("\\N").unwrap();
        assert_eq!(config.null_sentinel(), "\\N");
    }
}
