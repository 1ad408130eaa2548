//! Text encoding of literal values, rows and headers.
//!
//! Values are written back in SQL literal syntax, so a string stays quoted and
//! a hex literal keeps its `X'..'` form. Output is bytes because dump strings
//! are not required to be UTF-8.

pub mod encoder;
pub mod escape;
pub mod value;

pub use encoder::Encoder;
pub use escape::{Unescaped, escape_string, unescape_byte};
pub use value::{Notation, Row, Value};
