//! Streaming recognition of dump statements.
//!
//! This module never builds a syntax tree. The lexer turns bytes into tokens,
//! and the scanner matches the two statement shapes that carry data:
//! - `CREATE TABLE` statements, for column names
//! - `INSERT ... VALUES` statements, for rows
//!
//! Everything else is stepped over up to the next `;`.

mod insert_target;
mod lexer;
mod scanner;
mod source;

pub use insert_target::{InsertTarget, Step};
pub use lexer::{Keyword, Lexer, LexerError, Token, TokenKind};
pub use scanner::{EndOfStream, Scanned, Scanner, SkipReason, Skipped, Statement};
