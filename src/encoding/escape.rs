//! Backslash escapes for MySQL string literals.
//!
//! [`escape_string`] and [`unescape_byte`] are inverses: every byte written by
//! the former is read back unchanged by a lexer using the latter.

/// Escape character table: `(raw byte, character following the backslash)`.
const ESCAPES: [(u8, u8); 9] = [
    (0x00, b'0'),
    (b'\'', b'\''),
    (b'"', b'"'),
    (0x08, b'b'),
    (b'\n', b'n'),
    (b'\r', b'r'),
    (b'\t', b't'),
    (0x1a, b'Z'),
    (b'\\', b'\\'),
];

/// Append `raw` to `out` as a single-quoted string literal.
///
/// # Example
///
/// ```
/// use mysqldump2csv::encoding::escape_string;
///
/// let mut out = Vec::new();
/// escape_string(b"it's a\\b", &mut out);
/// assert_eq!(out, b"'it\\'s a\\\\b'");
/// ```
pub fn escape_string(raw: &[u8], out: &mut Vec<u8>) {
    out.reserve(raw.len() + 2);
    out.push(b'\'');
    for &byte in raw {
        match ESCAPES.iter().find(|(plain, _)| *plain == byte) {
            Some((_, escaped)) => out.extend_from_slice(&[b'\\', *escaped]),
            None => out.push(byte),
        }
    }
    out.push(b'\'');
}

/// Decode the character following a backslash inside a string literal.
///
/// Returns the bytes the escape stands for. `\%` and `\_` keep their
/// backslash, as MySQL does; any other unknown escape yields the character
/// itself.
#[must_use]
pub fn unescape_byte(escaped: u8) -> Unescaped {
    if escaped == b'%' || escaped == b'_' {
        return Unescaped::Pair(b'\\', escaped);
    }
    let byte = ESCAPES
        .iter()
        .find(|(_, code)| *code == escaped)
        .map_or(escaped, |(plain, _)| *plain);
    Unescaped::Single(byte)
}

/// The bytes produced by one backslash escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unescaped {
    /// The escape stands for one byte.
    Single(u8),
    /// The escape is kept literally, backslash included.
    Pair(u8, u8),
}
