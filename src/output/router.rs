//! Lazily opened, buffered per-table writers.

use std::io::{self, BufWriter, Write};

use indexmap::IndexMap;

use crate::config::Config;
use crate::encoding::{Encoder, Row};
use crate::errors::{Error, SinkOperation};
use crate::schema::Column;

use super::sink::SinkProvider;

/// An acquired sink and the position of the last `INSERT` routed to it.
struct OpenSink<W: Write> {
    writer: BufWriter<W>,
    position: u64,
}

/// Routes encoded rows to the sink of their table.
///
/// Sinks are acquired from the [`SinkProvider`] on the first row of a table
/// and released by [`Router::shutdown`]. A router dropped without a shutdown
/// still flushes whatever it buffered, ignoring failures.
pub struct Router<P: SinkProvider> {
    provider: P,
    encoder: Encoder,
    header: bool,
    sinks: IndexMap<String, OpenSink<P::Writer>>,
    line: Vec<u8>,
}

impl<P: SinkProvider> Router<P> {
    /// Create a router encoding with the options of `config`.
    #[must_use]
    pub fn new(config: &Config, provider: P) -> Self {
        Self {
            provider,
            encoder: Encoder::new(config),
            header: config.header(),
            sinks: IndexMap::new(),
            line: Vec::new(),
        }
    }

    /// Whether the sink of `table` is open.
    #[must_use]
    pub fn is_open(&self, table: &str) -> bool {
        self.sinks.contains_key(table)
    }

    /// Number of open sinks.
    #[must_use]
    pub fn open_sinks(&self) -> usize {
        self.sinks.len()
    }

    /// Acquire the sink of `table` for the `INSERT` at byte `position` and
    /// write its header.
    ///
    /// Does nothing when the sink is already open. The header is written
    /// only when enabled and `columns` is known and non-empty.
    ///
    /// # Errors
    ///
    /// Returns an error when the sink cannot be acquired or the header
    /// cannot be written. The sink is not kept open in either case.
    pub fn open(
        &mut self,
        table: &str,
        columns: Option<&[Column]>,
        position: u64,
    ) -> Result<(), Error> {
        if self.is_open(table) {
            return Ok(());
        }
        let mut writer = BufWriter::new(self.provider.open(table, position)?);
        if self.header {
            match columns {
                Some(columns) if !columns.is_empty() => {
                    writer
                        .write_all(&self.encoder.encode_header(columns))
                        .map_err(|source| {
                            Error::sink(table, SinkOperation::Write, position, source)
                        })?;
                }
                _ => {
                    tracing::warn!(
                        table,
                        position,
                        "No column names known, writing output without header"
                    );
                }
            }
        }
        self.sinks
            .insert(table.to_owned(), OpenSink { writer, position });
        Ok(())
    }

    /// Encode `rows` of the `INSERT` at byte `position` and write them to the
    /// sink of `table`, opening it with `columns` first if needed. Returns
    /// the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns an error when the sink cannot be opened or written.
    pub fn write_rows(
        &mut self,
        table: &str,
        columns: Option<&[Column]>,
        rows: &[Row],
        position: u64,
    ) -> Result<u64, Error> {
        self.open(table, columns, position)?;
        let Some(sink) = self.sinks.get_mut(table) else {
            return Ok(0);
        };
        sink.position = position;
        let mut written = 0;
        for row in rows {
            self.line.clear();
            self.encoder.encode_row_into(row, &mut self.line);
            sink.writer
                .write_all(&self.line)
                .map_err(|source| Error::sink(table, SinkOperation::Write, position, source))?;
            written += 1;
        }
        Ok(written)
    }

    /// Flush and release every open sink, in opening order.
    ///
    /// Every sink is attempted even after a failure; the first failure is
    /// returned. Returns the names of the released tables otherwise.
    ///
    /// # Errors
    ///
    /// Returns the first sink that failed to flush or close.
    pub fn shutdown(&mut self) -> Result<Vec<String>, Error> {
        let mut first_error = None;
        let mut released = Vec::with_capacity(self.sinks.len());
        for (table, sink) in self.sinks.drain(..) {
            match close(sink.writer) {
                Ok(()) => tracing::debug!(table = %table, "Closed output"),
                Err((operation, source)) => {
                    tracing::error!(
                        table = %table,
                        %operation,
                        error = %source,
                        "Failed to release output"
                    );
                    first_error.get_or_insert_with(|| {
                        Error::sink(&table, operation, sink.position, source)
                    });
                }
            }
            released.push(table);
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(released),
        }
    }
}

/// Write out the buffer, then flush the underlying writer and drop both.
fn close<W: Write>(writer: BufWriter<W>) -> Result<(), (SinkOperation, io::Error)> {
    let mut inner = writer
        .into_inner()
        .map_err(|err| (SinkOperation::Flush, err.into_error()))?;
    inner.flush().map_err(|err| (SinkOperation::Close, err))
}

/// Flushes every sink that was not shut down, ignoring failures.
///
/// `BufWriter` alone only writes out its buffer on drop; this also flushes
/// the underlying writers, such as a locked stdout.
impl<P: SinkProvider> Drop for Router<P> {
    fn drop(&mut self) {
        for sink in self.sinks.values_mut() {
            let _ = sink.writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config::OutputMode;
    use crate::encoding::Value;
    use crate::output::SharedSink;

    /// In-memory files shared with the test body.
    #[derive(Default)]
    struct Store {
        contents: IndexMap<String, Vec<u8>>,
        flushed: Vec<String>,
    }

    #[derive(Default, Clone)]
    struct Files(Rc<RefCell<Store>>);

    struct FileWriter {
        files: Files,
        table: String,
        fail_flush: bool,
    }

    impl Write for FileWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.files
                .0
                .borrow_mut()
                .contents
                .entry(self.table.clone())
                .or_default()
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.fail_flush {
                return Err(io::Error::other("disk full"));
            }
            self.files.0.borrow_mut().flushed.push(self.table.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemorySinks {
        files: Files,
        failing: Vec<&'static str>,
    }

    impl SinkProvider for MemorySinks {
        type Writer = FileWriter;

        fn open(&mut self, table: &str, _position: u64) -> Result<FileWriter, Error> {
            self.files
                .0
                .borrow_mut()
                .contents
                .insert(table.to_owned(), Vec::new());
            Ok(FileWriter {
                files: self.files.clone(),
                table: table.to_owned(),
                fail_flush: self.failing.iter().any(|name| *name == table),
            })
        }
    }

    fn contents(files: &Files, table: &str) -> Vec<u8> {
        files
            .0
            .borrow()
            .contents
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn columns() -> Vec<Column> {
        vec![Column::new("id", 0), Column::new("name", 1)]
    }

    fn row(id: &str, name: &str) -> Row {
        vec![Value::Integer(id.into()), Value::String(name.as_bytes().to_vec())]
    }

    fn multi() -> Config {
        Config::default().with_mode(OutputMode::Multi)
    }

    #[test]
    fn test_header_written_once() {
        let mut out = Vec::new();
        {
            let mut router = Router::new(&Config::default(), SharedSink::new(&mut out));
            let cols = columns();
            router
                .write_rows("page", Some(cols.as_slice()), &[row("1", "A")], 0)
                .unwrap();
            router
                .write_rows("page", Some(cols.as_slice()), &[row("2", "B")], 10)
                .unwrap();
            router.shutdown().unwrap();
        }
        assert_eq!(out, b"id,name\n1,'A'\n2,'B'\n");
    }

    #[test]
    fn test_header_disabled_or_unknown() {
        let mut out = Vec::new();
        {
            let config = Config::default().with_header(false);
            let mut router = Router::new(&config, SharedSink::new(&mut out));
            router
                .write_rows("page", Some(columns().as_slice()), &[row("1", "A")], 0)
                .unwrap();
            router.shutdown().unwrap();
        }
        assert_eq!(out, b"1,'A'\n");

        let mut out = Vec::new();
        {
            let mut router = Router::new(&Config::default(), SharedSink::new(&mut out));
            router.write_rows("page", None, &[row("1", "A")], 0).unwrap();
            router.write_rows("page", Some(&[][..]), &[], 10).unwrap();
            router.shutdown().unwrap();
        }
        assert_eq!(out, b"1,'A'\n");
    }

    #[test]
    fn test_lazy_open() {
        let sinks = MemorySinks::default();
        let files = sinks.files.clone();
        let mut router = Router::new(&multi(), sinks);
        assert_eq!(router.open_sinks(), 0);
        assert!(files.0.borrow().contents.is_empty());

        router.write_rows("b", None, &[row("1", "x")], 0).unwrap();
        router.write_rows("a", None, &[row("2", "y")], 10).unwrap();
        assert!(router.is_open("a"));
        assert_eq!(router.open_sinks(), 2);

        assert_eq!(router.shutdown().unwrap(), vec!["b".to_owned(), "a".to_owned()]);
        assert_eq!(router.open_sinks(), 0);
        assert_eq!(contents(&files, "b"), b"1,'x'\n");
        assert_eq!(contents(&files, "a"), b"2,'y'\n");
        assert_eq!(files.0.borrow().flushed, vec!["b".to_owned(), "a".to_owned()]);
    }

    #[test]
    fn test_shutdown_continues_past_failures() {
        let sinks = MemorySinks {
            failing: vec!["a", "b"],
            ..MemorySinks::default()
        };
        let files = sinks.files.clone();
        let mut router = Router::new(&multi(), sinks);
        for (position, table) in [(5, "a"), (50, "b"), (500, "c")] {
            router.write_rows(table, None, &[row("1", table)], position).unwrap();
        }
        router.write_rows("a", None, &[], 700).unwrap();

        let err = router.shutdown().unwrap_err();
        assert!(matches!(
            &err,
            Error::Sink {
                table,
                operation: SinkOperation::Close,
                position: 700,
                ..
            } if table == "a"
        ));
        // The buffered rows reach every writer even when its flush fails.
        for table in ["a", "b", "c"] {
            assert_eq!(contents(&files, table), format!("1,'{table}'\n").into_bytes());
        }
        assert_eq!(files.0.borrow().flushed, vec!["c".to_owned()]);
        assert_eq!(router.open_sinks(), 0);
    }

    #[test]
    fn test_drop_flushes_underlying_writers() {
        let sinks = MemorySinks::default();
        let files = sinks.files.clone();
        {
            let mut router = Router::new(&multi(), sinks);
            router.write_rows("page", None, &[row("1", "A")], 0).unwrap();
            assert!(contents(&files, "page").is_empty());
        }
        assert_eq!(contents(&files, "page"), b"1,'A'\n");
        assert_eq!(files.0.borrow().flushed, vec!["page".to_owned()]);
    }

    #[test]
    fn test_second_shared_table_cannot_open() {
        let mut out = Vec::new();
        let mut router = Router::new(&Config::default(), SharedSink::new(&mut out));
        router.write_rows("page", None, &[row("1", "A")], 0).unwrap();
        let err = router
            .write_rows("user", None, &[row("1", "A")], 33)
            .unwrap_err();
        assert_eq!(err.position(), Some(33));
        assert!(!router.is_open("user"));
    }
}
