//! Line encoding: joins values or column names with the configured delimiter.

use crate::config::Config;
use crate::schema::Column;

use super::value::Value;

/// Encodes rows and header lines.
///
/// # Example
///
/// ```
/// use mysqldump2csv::{Config, Encoder, Value};
///
/// let encoder = Encoder::new(&Config::default());
/// let line = encoder.encode_row(&[
///     Value::Integer("1".into()),
///     Value::String(b"A".to_vec()),
///     Value::Null,
/// ]);
/// assert_eq!(line, b"1,'A',NULL\n");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoder {
    delimiter: Vec<u8>,
    terminator: Vec<u8>,
    null: String,
}

impl Encoder {
    /// Create an encoder using the delimiter, terminator and `NULL` sentinel
    /// of `config`.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            delimiter: config.delimiter().as_bytes().to_vec(),
            terminator: config.terminator().as_bytes().to_vec(),
            null: config.null_sentinel().to_owned(),
        }
    }

    /// Encode one row as a terminated line.
    #[must_use]
    pub fn encode_row(&self, values: &[Value]) -> Vec<u8> {
        let mut line = Vec::new();
        self.encode_row_into(values, &mut line);
        line
    }

    /// Append one row as a terminated line to `out`.
    pub fn encode_row_into(&self, values: &[Value], out: &mut Vec<u8>) {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                out.extend_from_slice(&self.delimiter);
            }
            value.encode_into(&self.null, out);
        }
        out.extend_from_slice(&self.terminator);
    }

    /// Encode the column names as a terminated header line.
    #[must_use]
    pub fn encode_header(&self, columns: &[Column]) -> Vec<u8> {
        let mut line = Vec::new();
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                line.extend_from_slice(&self.delimiter);
            }
            line.extend_from_slice(column.name().as_bytes());
        }
        line.extend_from_slice(&self.terminator);
        line
    }
}
