//! Statement scanner: turns the token stream into [`Statement`]s.

use core::fmt;
use std::io::Read;

use crate::encoding::{Row, Value};
use crate::errors::Error;
use crate::schema::Column;

use super::insert_target::{InsertTarget, Step};
use super::lexer::{Keyword, Lexer, LexerError, Token, TokenKind};

/// A statement the scanner recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `CREATE TABLE` statement.
    CreateTable {
        /// Table name, qualifier included.
        name: String,
        /// Declared columns; `None` when the declaration has no column list.
        columns: Option<Vec<Column>>,
        /// Byte offset of the statement.
        pos: u64,
    },
    /// `INSERT ... VALUES` statement.
    Insert {
        /// Table name, qualifier included.
        table: String,
        /// One row per tuple, in input order.
        rows: Vec<Row>,
        /// Byte offset of the statement.
        pos: u64,
    },
    /// Any other statement, stepped over.
    Other {
        /// The word the statement starts with.
        verb: String,
        /// Byte offset of the statement.
        pos: u64,
    },
}

/// Why a statement was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing between two semicolons.
    Empty,
    /// The lexer rejected part of the statement.
    Lexical(String),
    /// A token that does not fit the statement shape.
    Unexpected(String),
    /// The input ended or a `;` arrived in the middle of the statement.
    Truncated,
    /// A tuple with a missing value.
    MalformedTuple,
}

/// A statement the scanner stepped over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// Why the statement was skipped.
    pub reason: SkipReason,
    /// Byte offset of the problem.
    pub position: u64,
}

impl fmt::Display for Skipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            SkipReason::Empty => write!(f, "empty statement at byte {}", self.position),
            SkipReason::Lexical(message) => f.write_str(message),
            SkipReason::Unexpected(found) => {
                write!(f, "unexpected {found} at byte {}", self.position)
            }
            SkipReason::Truncated => {
                write!(f, "statement truncated at byte {}", self.position)
            }
            SkipReason::MalformedTuple => {
                write!(f, "missing value in tuple at byte {}", self.position)
            }
        }
    }
}

/// How the stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfStream {
    /// No `CREATE TABLE` or `INSERT` was recognized: the dump has no tables.
    NoStatements,
    /// This many `CREATE TABLE` and `INSERT` statements were recognized.
    AfterStatements(usize),
}

/// One step of the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scanned {
    /// A statement was recognized.
    Statement(Statement),
    /// A statement was skipped; scanning can continue.
    Skipped(Skipped),
    /// The input is exhausted. Returned again on every later call.
    End(EndOfStream),
}

/// How scanning of one statement stopped early.
enum Abort {
    Skip(Skipped),
    Fatal(Error),
}

impl From<Error> for Abort {
    fn from(err: Error) -> Self {
        Abort::Fatal(err)
    }
}

impl From<LexerError> for Abort {
    fn from(err: LexerError) -> Self {
        match err {
            LexerError::Io { position, source } => Abort::Fatal(Error::Read { position, source }),
            other => Abort::Skip(Skipped {
                position: other.position(),
                reason: SkipReason::Lexical(other.to_string()),
            }),
        }
    }
}

fn skip<T>(reason: SkipReason, position: u64) -> Result<T, Abort> {
    Err(Abort::Skip(Skipped { reason, position }))
}

/// Pulls tokens from a reader and yields one statement at a time.
///
/// # Example
///
/// ```
/// use mysqldump2csv::sql::{EndOfStream, Scanned, Scanner, Statement};
///
/// let mut scanner = Scanner::new(&b"INSERT INTO t VALUES (1),(-2);"[..]);
/// match scanner.next_statement().unwrap() {
///     Scanned::Statement(Statement::Insert { table, rows, .. }) => {
///         assert_eq!(table, "t");
///         assert_eq!(rows.len(), 2);
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// assert_eq!(
///     scanner.next_statement().unwrap(),
///     Scanned::End(EndOfStream::AfterStatements(1))
/// );
/// ```
pub struct Scanner<R> {
    lexer: Lexer<R>,
    recognized: usize,
    /// Whether the last consumed token ended a statement.
    boundary: bool,
    done: bool,
}

impl<R: Read> Scanner<R> {
    /// Create a scanner reading from `reader`.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            lexer: Lexer::new(reader),
            recognized: 0,
            boundary: true,
            done: false,
        }
    }

    /// Approximate byte offset reached in the input.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.lexer.position()
    }

    /// Number of `CREATE TABLE` and `INSERT` statements recognized so far.
    #[must_use]
    pub fn recognized(&self) -> usize {
        self.recognized
    }

    /// Scan the next statement.
    ///
    /// # Errors
    ///
    /// Returns an error when the input cannot be read or a statement uses an
    /// unsupported construct. Both end processing of this input.
    pub fn next_statement(&mut self) -> Result<Scanned, Error> {
        if self.done {
            return Ok(Scanned::End(self.end_of_stream()));
        }
        match self.statement() {
            Ok(Some(statement)) => {
                if !matches!(statement, Statement::Other { .. }) {
                    self.recognized += 1;
                }
                Ok(Scanned::Statement(statement))
            }
            Ok(None) => {
                self.done = true;
                Ok(Scanned::End(self.end_of_stream()))
            }
            Err(Abort::Skip(skipped)) => {
                self.recover()?;
                Ok(Scanned::Skipped(skipped))
            }
            Err(Abort::Fatal(err)) => Err(err),
        }
    }

    fn end_of_stream(&self) -> EndOfStream {
        match self.recognized {
            0 => EndOfStream::NoStatements,
            count => EndOfStream::AfterStatements(count),
        }
    }

    fn advance(&mut self) -> Result<Token, Abort> {
        let token = self.lexer.next()?;
        self.boundary = matches!(token.kind, TokenKind::Semicolon | TokenKind::Eof);
        Ok(token)
    }

    /// Consume the rest of the current statement.
    fn skip_rest(&mut self) -> Result<(), Abort> {
        while !self.boundary {
            self.advance()?;
        }
        Ok(())
    }

    /// Step over the rest of a skipped statement, ignoring further lexical errors.
    fn recover(&mut self) -> Result<(), Error> {
        while !self.boundary {
            match self.advance() {
                Ok(_) | Err(Abort::Skip(_)) => {}
                Err(Abort::Fatal(err)) => return Err(err),
            }
        }
        Ok(())
    }

    fn statement(&mut self) -> Result<Option<Statement>, Abort> {
        let first = self.advance()?;
        match (&first.kind, first.kind.keyword()) {
            (TokenKind::Eof, _) => Ok(None),
            (TokenKind::Semicolon, _) => skip(SkipReason::Empty, first.pos),
            (_, Some(Keyword::Create)) => self.create_table(first.pos).map(Some),
            (_, Some(Keyword::Insert | Keyword::Replace)) => self.insert(first.pos).map(Some),
            (kind, _) => {
                let verb = match kind {
                    TokenKind::Word(word) => word.to_ascii_uppercase(),
                    other => other.to_string(),
                };
                self.skip_rest()?;
                Ok(Some(Statement::Other {
                    verb,
                    pos: first.pos,
                }))
            }
        }
    }

    fn create_table(&mut self, pos: u64) -> Result<Statement, Abort> {
        let mut token = self.advance()?;
        if token.kind.keyword() == Some(Keyword::Temporary) {
            token = self.advance()?;
        }
        if token.kind.keyword() != Some(Keyword::Table) {
            // CREATE DATABASE, CREATE VIEW, ...
            self.skip_rest()?;
            return Ok(Statement::Other {
                verb: "CREATE".into(),
                pos,
            });
        }

        let mut token = self.advance()?;
        if token.kind.keyword() == Some(Keyword::If) {
            for expected in [Keyword::Not, Keyword::Exists] {
                let next = self.advance()?;
                if next.kind.keyword() != Some(expected) {
                    return skip(SkipReason::Unexpected(next.kind.to_string()), next.pos);
                }
            }
            token = self.advance()?;
        }

        let (name, next) = self.qualified_name(&token)?;
        if next.kind != TokenKind::LParen {
            // CREATE TABLE t LIKE u, CREATE TABLE t AS SELECT ...
            self.skip_rest()?;
            return Ok(Statement::CreateTable {
                name,
                columns: None,
                pos,
            });
        }

        let columns = self.column_definitions()?;
        // Table options: ENGINE=InnoDB DEFAULT CHARSET=utf8 ...
        self.skip_rest()?;
        Ok(Statement::CreateTable {
            name,
            columns: Some(columns),
            pos,
        })
    }

    /// Read `name` or `schema.name`, returning it with the token that follows.
    fn qualified_name(&mut self, first: &Token) -> Result<(String, Token), Abort> {
        let mut name = identifier(first)?;
        loop {
            let next = self.advance()?;
            if next.kind != TokenKind::Dot {
                return Ok((name, next));
            }
            let part = self.advance()?;
            name.push('.');
            name.push_str(&identifier(&part)?);
        }
    }

    /// Read column names up to the `)` closing the definition list.
    fn column_definitions(&mut self) -> Result<Vec<Column>, Abort> {
        let mut columns = Vec::new();
        let mut depth = 1usize;
        let mut at_definition_start = true;
        loop {
            let token = self.advance()?;
            let starts_definition = core::mem::replace(&mut at_definition_start, false);
            match &token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(columns);
                    }
                }
                TokenKind::Comma if depth == 1 => at_definition_start = true,
                TokenKind::Semicolon | TokenKind::Eof => {
                    return skip(SkipReason::Truncated, token.pos);
                }
                TokenKind::QuotedIdentifier(name) if starts_definition => {
                    columns.push(Column::new(name.as_str(), columns.len()));
                }
                TokenKind::Word(name) if starts_definition => {
                    if !token.kind.keyword().is_some_and(Keyword::is_constraint) {
                        columns.push(Column::new(name.as_str(), columns.len()));
                    }
                }
                _ => {}
            }
        }
    }

    fn insert(&mut self, pos: u64) -> Result<Statement, Abort> {
        let mut target = InsertTarget::new();
        let table = loop {
            let token = self.advance()?;
            if matches!(token.kind, TokenKind::Semicolon | TokenKind::Eof) {
                return skip(SkipReason::Truncated, token.pos);
            }
            match target.feed(&token.kind) {
                Step::Continue => {}
                Step::Matched(table) => break table,
                Step::ColumnList(table) => {
                    return Err(Error::UnsupportedColumnList {
                        table,
                        position: token.pos,
                    }
                    .into());
                }
                Step::Unsupported { table, construct } => {
                    return Err(Error::UnsupportedInsertSource {
                        table,
                        construct: construct.into(),
                        position: token.pos,
                    }
                    .into());
                }
                Step::Rejected => {
                    return skip(SkipReason::Unexpected(token.kind.to_string()), token.pos);
                }
            }
        };

        let rows = self.tuples(&table)?;
        Ok(Statement::Insert { table, rows, pos })
    }

    /// Read `(..), (..), ...` up to the end of the statement.
    fn tuples(&mut self, table: &str) -> Result<Vec<Row>, Abort> {
        let mut rows = Vec::new();
        loop {
            let open = self.advance()?;
            match open.kind {
                TokenKind::LParen => rows.push(self.tuple(table)?),
                TokenKind::Semicolon | TokenKind::Eof => {
                    return skip(SkipReason::Truncated, open.pos);
                }
                other => return skip(SkipReason::Unexpected(other.to_string()), open.pos),
            }

            let separator = self.advance()?;
            match separator.kind {
                TokenKind::Comma => {}
                TokenKind::Semicolon | TokenKind::Eof => return Ok(rows),
                // ON DUPLICATE KEY UPDATE, RETURNING, ...
                other => {
                    tracing::warn!(
                        table,
                        position = separator.pos,
                        "Ignoring clause starting with {other} after the rows of INSERT"
                    );
                    self.recover()?;
                    return Ok(rows);
                }
            }
        }
    }

    /// Read the values of one tuple; the opening `(` is already consumed.
    fn tuple(&mut self, table: &str) -> Result<Row, Abort> {
        let mut row = Row::new();
        let mut expect_value = true;
        loop {
            let token = self.advance()?;
            match token.kind {
                TokenKind::RParen if expect_value && !row.is_empty() => {
                    return skip(SkipReason::MalformedTuple, token.pos);
                }
                TokenKind::RParen => return Ok(row),
                TokenKind::Comma if !expect_value => expect_value = true,
                TokenKind::Semicolon | TokenKind::Eof => {
                    return skip(SkipReason::Truncated, token.pos);
                }
                kind if expect_value => {
                    row.push(self.value(table, kind, token.pos)?);
                    expect_value = false;
                }
                // `1 + 2`, `'a' 'b'`, ...
                kind => return Err(unsupported_value(table, &kind, token.pos)),
            }
        }
    }

    /// Convert a token in value position to a [`Value`].
    fn value(&mut self, table: &str, kind: TokenKind, pos: u64) -> Result<Value, Abort> {
        match kind {
            TokenKind::StringLiteral(bytes) => Ok(Value::String(bytes)),
            TokenKind::IntegerLiteral(text) => Ok(Value::Integer(text)),
            TokenKind::FloatLiteral(text) => Ok(Value::Float(text)),
            TokenKind::HexLiteral { digits, notation } => Ok(Value::Hex { digits, notation }),
            TokenKind::BitLiteral { digits, notation } => Ok(Value::Bit { digits, notation }),
            TokenKind::Minus => {
                // The lexer never attaches a sign to a number.
                let number = self.advance()?;
                match number.kind {
                    TokenKind::IntegerLiteral(text) => Ok(Value::Integer(format!("-{text}"))),
                    TokenKind::FloatLiteral(text) => Ok(Value::Float(format!("-{text}"))),
                    TokenKind::Semicolon | TokenKind::Eof => {
                        skip(SkipReason::Truncated, number.pos)
                    }
                    other => Err(Abort::Fatal(Error::UnsupportedValue {
                        table: table.to_owned(),
                        found: format!("'-' followed by {other}"),
                        position: pos,
                    })),
                }
            }
            TokenKind::Comma => skip(SkipReason::MalformedTuple, pos),
            TokenKind::Word(word) => {
                if Keyword::from_word(&word) == Some(Keyword::Null) {
                    return Ok(Value::Null);
                }
                // Character set introducer: _binary 'abc', _utf8mb4'x'
                if word.starts_with('_')
                    && matches!(self.lexer.peek()?.kind, TokenKind::StringLiteral(_))
                {
                    if let TokenKind::StringLiteral(bytes) = self.advance()?.kind {
                        return Ok(Value::String(bytes));
                    }
                }
                Err(unsupported_value(table, &TokenKind::Word(word), pos))
            }
            other => Err(unsupported_value(table, &other, pos)),
        }
    }
}

fn unsupported_value(table: &str, found: &TokenKind, position: u64) -> Abort {
    Abort::Fatal(Error::UnsupportedValue {
        table: table.to_owned(),
        found: found.to_string(),
        position,
    })
}

fn identifier(token: &Token) -> Result<String, Abort> {
    match &token.kind {
        TokenKind::Word(name) | TokenKind::QuotedIdentifier(name) => Ok(name.clone()),
        other => skip(SkipReason::Unexpected(other.to_string()), token.pos),
    }
}
