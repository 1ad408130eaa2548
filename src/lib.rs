//! Stream MySQL dump files into delimited text, one row per `INSERT` tuple.
//!
//! The crate reads a dump as a token stream and never builds a syntax tree.
//! Two statement shapes matter: `CREATE TABLE` (which supplies a header) and
//! `INSERT INTO ... VALUES` (which supplies rows). Everything else is stepped
//! over.
//!
//! ```
//! use mysqldump2csv::{Config, Converter, SharedSink};
//!
//! let dump = "CREATE TABLE page (id, name);\n\
//!             INSERT INTO page VALUES (1,'A'),(2,'B');\n\
//!             INSERT INTO page VALUES (3,'C');";
//!
//! let mut out = Vec::new();
//! let mut converter = Converter::new(Config::default(), SharedSink::new(&mut out));
//! converter.convert(dump.as_bytes()).unwrap();
//! converter.finish().unwrap();
//!
//! assert_eq!(out, b"id,name\n1,'A'\n2,'B'\n3,'C'\n");
//! ```
#![deny(clippy::mod_module_files)]

pub mod config;
pub mod converter;
pub mod encoding;
pub mod errors;
pub mod output;
pub mod schema;
pub mod sql;

pub use config::{Config, OutputMode};
pub use converter::{Converter, InputReport, Summary};
pub use encoding::{Encoder, Notation, Row, Value};
pub use errors::{Error, ErrorCategory, SinkOperation};
pub use output::{DirectorySinks, Router, SharedSink, SinkProvider};
pub use schema::{Column, Registry, Table, TableState};
pub use sql::{EndOfStream, Scanned, Scanner, Skipped, Statement};

/// Result type used across the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
