//! Literal values found in `INSERT` tuples.

use super::escape::escape_string;

/// How a hex or bit literal was spelled in the dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notation {
    /// Quoted form: `X'4A'` or `B'0101'`.
    Quoted,
    /// Prefixed form: `0x4A` or `0b0101`.
    Prefixed,
}

/// A single literal value.
///
/// Numeric values keep their source text, so no precision is lost and the
/// output matches the dump byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// String literal, unescaped.
    String(Vec<u8>),
    /// Integer literal text, sign included.
    Integer(String),
    /// Floating point or decimal literal text, sign included.
    Float(String),
    /// Hexadecimal literal digits.
    Hex {
        /// The hex digits, without prefix or quotes.
        digits: String,
        /// How the literal was written.
        notation: Notation,
    },
    /// Bit literal digits.
    Bit {
        /// The binary digits, without prefix or quotes.
        digits: String,
        /// How the literal was written.
        notation: Notation,
    },
    /// SQL `NULL`.
    Null,
}

/// One tuple of an `INSERT`, in column order.
pub type Row = Vec<Value>;

impl Value {
    /// Append the encoded form of this value to `out`.
    ///
    /// `null` is the text written for [`Value::Null`].
    pub fn encode_into(&self, null: &str, out: &mut Vec<u8>) {
        match self {
            Value::String(raw) => escape_string(raw, out),
            Value::Integer(text) | Value::Float(text) => out.extend_from_slice(text.as_bytes()),
            Value::Hex { digits, notation } => encode_radix(b"X", b"0x", digits, *notation, out),
            Value::Bit { digits, notation } => encode_radix(b"B", b"0b", digits, *notation, out),
            Value::Null => out.extend_from_slice(null.as_bytes()),
        }
    }
}

fn encode_radix(quoted: &[u8], prefix: &[u8], digits: &str, notation: Notation, out: &mut Vec<u8>) {
    match notation {
        Notation::Quoted => {
            out.extend_from_slice(quoted);
            out.push(b'\'');
            out.extend_from_slice(digits.as_bytes());
            out.push(b'\'');
        }
        Notation::Prefixed => {
            out.extend_from_slice(prefix);
            out.extend_from_slice(digits.as_bytes());
        }
    }
}
