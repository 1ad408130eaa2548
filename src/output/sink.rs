//! Destinations for encoded output.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::errors::{Error, SinkOperation};

/// Hands out the writer a table's rows are sent to.
pub trait SinkProvider {
    /// The writer type.
    type Writer: Write;

    /// Acquire the writer for `table`. Called at most once per table.
    ///
    /// `position` is the byte offset of the `INSERT` that needs the writer,
    /// for error reports.
    ///
    /// # Errors
    ///
    /// Returns an error when the destination cannot be created.
    fn open(&mut self, table: &str, position: u64) -> Result<Self::Writer, Error>;
}

/// A single caller-supplied writer shared by the one table that may write.
///
/// # Example
///
/// ```
/// use mysqldump2csv::{SharedSink, SinkProvider};
///
/// let mut sink = SharedSink::new(Vec::new());
/// assert!(sink.open("page", 0).is_ok());
/// assert!(sink.open("user", 40).is_err());
/// ```
#[derive(Debug)]
pub struct SharedSink<W> {
    writer: Option<W>,
}

impl<W: Write> SharedSink<W> {
    /// Wrap `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
        }
    }
}

impl<W: Write> SinkProvider for SharedSink<W> {
    type Writer = W;

    fn open(&mut self, table: &str, position: u64) -> Result<W, Error> {
        self.writer.take().ok_or_else(|| {
            Error::sink(
                table,
                SinkOperation::Open,
                position,
                io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "the shared output is already in use",
                ),
            )
        })
    }
}

/// One `<table>.csv` file per table inside a directory.
#[derive(Debug, Clone)]
pub struct DirectorySinks {
    dir: PathBuf,
}

impl DirectorySinks {
    /// Write files into `dir`, which must exist.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file `table` is written to, or `None` when the name would escape
    /// the directory or cannot name a file.
    #[must_use]
    pub fn path_for(&self, table: &str) -> Option<PathBuf> {
        is_safe_file_stem(table).then(|| self.dir.join(format!("{table}.csv")))
    }
}

impl SinkProvider for DirectorySinks {
    type Writer = File;

    fn open(&mut self, table: &str, position: u64) -> Result<File, Error> {
        let path = self.path_for(table).ok_or_else(|| Error::UnsafeTableName {
            table: table.to_owned(),
            position,
        })?;
        let file = File::create(&path)
            .map_err(|source| Error::sink(table, SinkOperation::Open, position, source))?;
        tracing::info!(table, path = %path.display(), "Created output file");
        Ok(file)
    }
}

fn is_safe_file_stem(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCategory;

    #[test]
    fn test_shared_sink_hands_out_writer_once() {
        let mut sink = SharedSink::new(Vec::<u8>::new());
        assert!(sink.open("page", 0).is_ok());
        let err = sink.open("page", 30).unwrap_err();
        assert!(matches!(
            err,
            Error::Sink {
                operation: SinkOperation::Open,
                position: 30,
                ..
            }
        ));
    }

    #[test]
    fn test_directory_paths() {
        let sinks = DirectorySinks::new("/out");
        assert_eq!(
            sinks.path_for("page"),
            Some(PathBuf::from("/out/page.csv"))
        );
        assert_eq!(
            sinks.path_for("db.page"),
            Some(PathBuf::from("/out/db.page.csv"))
        );
    }

    #[test]
    fn test_unsafe_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut sinks = DirectorySinks::new(dir.path());
        for name in ["", ".", "..", "../etc/passwd", "a/b", "a\\b", "a\0b"] {
            assert_eq!(sinks.path_for(name), None, "{name:?}");
            let err = sinks.open(name, 17).unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Io, "{name:?}");
            assert_eq!(err.table(), Some(name));
            assert_eq!(err.position(), Some(17));
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_directory_sink_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sinks = DirectorySinks::new(dir.path());
        let mut file = sinks.open("page", 0).unwrap();
        file.write_all(b"1\n").unwrap();
        drop(file);
        assert_eq!(std::fs::read(dir.path().join("page.csv")).unwrap(), b"1\n");
    }

    #[test]
    fn test_missing_directory_is_open_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut sinks = DirectorySinks::new(dir.path().join("missing"));
        assert!(matches!(
            sinks.open("page", 0),
            Err(Error::Sink {
                operation: SinkOperation::Open,
                ..
            })
        ));
    }
}
