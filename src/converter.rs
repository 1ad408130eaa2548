//! Drives the scanner over one or more inputs and feeds the router.

use std::io::Read;

use crate::config::Config;
use crate::encoding::Row;
use crate::errors::Error;
use crate::output::{Router, SinkProvider};
use crate::schema::{Column, Registry};
use crate::sql::{EndOfStream, Scanned, Scanner, Skipped, Statement};

/// What one call to [`Converter::convert`] saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputReport {
    /// Statements recognized, of any kind.
    pub statements: usize,
    /// Statements skipped as malformed.
    pub skipped: usize,
    /// Rows written by this input.
    pub rows: u64,
    /// How the input ended.
    pub end: EndOfStream,
}

/// Rows written per table once every input was converted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Summary {
    tables: Vec<(String, u64)>,
}

impl Summary {
    /// `(table, rows)` pairs in first-reference order.
    #[must_use]
    pub fn tables(&self) -> &[(String, u64)] {
        &self.tables
    }

    /// Rows written for `table`, if the table was seen.
    #[must_use]
    pub fn rows(&self, table: &str) -> Option<u64> {
        self.tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, rows)| *rows)
    }

    /// Rows written across all tables.
    #[must_use]
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|(_, rows)| rows).sum()
    }
}

/// Converts dump streams into delimited output.
///
/// Tables persist across calls to [`Converter::convert`], so several dump
/// files can feed the same outputs. [`Converter::finish`] releases every
/// output and must be called even when a conversion failed.
pub struct Converter<P: SinkProvider> {
    config: Config,
    registry: Registry,
    router: Router<P>,
}

impl<P: SinkProvider> Converter<P> {
    /// Create a converter writing through `provider`.
    #[must_use]
    pub fn new(config: Config, provider: P) -> Self {
        Self {
            registry: Registry::new(&config),
            router: Router::new(&config, provider),
            config,
        }
    }

    /// The options in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The tables seen so far.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Convert one input stream.
    ///
    /// # Errors
    ///
    /// Returns an error when the input cannot be read, uses an unsupported
    /// construct, conflicts with the output mode, or an output fails. The
    /// rest of the input is not read.
    pub fn convert<R: Read>(&mut self, input: R) -> Result<InputReport, Error> {
        let mut scanner = Scanner::new(input);
        let mut statements = 0;
        let mut skipped = 0;
        let mut rows = 0;
        let end = loop {
            match scanner.next_statement()? {
                Scanned::Statement(statement) => {
                    statements += 1;
                    rows += self.apply(statement)?;
                }
                Scanned::Skipped(skip) => {
                    skipped += 1;
                    self.report_skip(&skip);
                }
                Scanned::End(end) => break end,
            }
        };
        if end == EndOfStream::NoStatements {
            tracing::warn!("Input contains no CREATE TABLE or INSERT statements");
        }
        Ok(InputReport {
            statements,
            skipped,
            rows,
            end,
        })
    }

    /// Release every output and report the rows written per table.
    ///
    /// # Errors
    ///
    /// Returns the first output that failed to flush. Every output is
    /// released regardless.
    pub fn finish(mut self) -> Result<Summary, Error> {
        let shutdown = self.router.shutdown();
        for table in self.registry.tables_mut() {
            table.mark_closed();
        }
        if self.registry.is_empty() {
            tracing::info!("Found no tables");
        }
        for table in self.registry.tables() {
            tracing::info!(table = table.name(), "Wrote {} rows for table", table.rows());
        }
        shutdown?;
        Ok(Summary {
            tables: self.registry.summary(),
        })
    }

    fn apply(&mut self, statement: Statement) -> Result<u64, Error> {
        match statement {
            Statement::CreateTable { name, columns, pos } => {
                self.create_table(&name, columns, pos);
                Ok(0)
            }
            Statement::Insert { table, rows, pos } => self.insert(&table, &rows, pos),
            Statement::Other { verb, pos } => {
                tracing::debug!(verb = %verb, position = pos, "Ignoring statement");
                Ok(0)
            }
        }
    }

    fn create_table(&mut self, name: &str, columns: Option<Vec<Column>>, pos: u64) {
        if columns.is_none() {
            tracing::debug!(table = name, position = pos, "CREATE TABLE has no column list");
        }
        let table = self.registry.declare_schema(name, columns);
        if let Some(columns) = table.columns() {
            tracing::debug!(table = name, columns = columns.len(), "Declared table");
        }
    }

    fn insert(&mut self, name: &str, rows: &[Row], pos: u64) -> Result<u64, Error> {
        let Some(table) = self.registry.resolve_for_write(name, pos)? else {
            tracing::debug!(table = name, position = pos, "Ignoring rows of filtered table");
            return Ok(0);
        };
        let written = self
            .router
            .write_rows(table.name(), table.columns(), rows, pos);
        if self.router.is_open(table.name()) {
            table.mark_open();
        }
        let written = written?;
        table.record_rows(written);
        Ok(written)
    }

    fn report_skip(&self, skip: &Skipped) {
        if self.config.verbose() {
            tracing::warn!(position = skip.position, "Skipping statement: {skip}");
        } else {
            tracing::debug!(position = skip.position, "Skipping statement: {skip}");
        }
    }
}
