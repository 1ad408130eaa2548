//! SQL lexer for tokenizing dump input.

use core::fmt;
use std::io::{self, Read};

use crate::encoding::{Notation, Unescaped, unescape_byte};

use super::source::ByteSource;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// Byte offset in the input where this token starts.
    pub pos: u64,
}

/// The different kinds of tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A bare word: an identifier or a keyword, see [`TokenKind::keyword`].
    Word(String),
    /// A back-quoted identifier, unquoted.
    QuotedIdentifier(String),
    /// String literal (single or double quoted), unescaped.
    StringLiteral(Vec<u8>),
    /// Integer literal text.
    IntegerLiteral(String),
    /// Decimal or floating point literal text.
    FloatLiteral(String),
    /// Hex literal (`X'..'` or `0x..`).
    HexLiteral {
        /// The digits.
        digits: String,
        /// How the literal was written.
        notation: Notation,
    },
    /// Bit literal (`B'..'` or `0b..`).
    BitLiteral {
        /// The digits.
        digits: String,
        /// How the literal was written.
        notation: Notation,
    },
    /// Left parenthesis
    LParen,
    /// Right parenthesis
    RParen,
    /// Comma
    Comma,
    /// Semicolon
    Semicolon,
    /// Dot, as in `db.table`
    Dot,
    /// Minus sign
    Minus,
    /// Any other single byte.
    Other(u8),
    /// End of input
    Eof,
}

/// Words with a structural meaning to the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// CREATE
    Create,
    /// TABLE
    Table,
    /// TEMPORARY
    Temporary,
    /// IF
    If,
    /// NOT
    Not,
    /// EXISTS
    Exists,
    /// INSERT
    Insert,
    /// REPLACE
    Replace,
    /// INTO
    Into,
    /// VALUES, or its synonym VALUE
    Values,
    /// SET
    Set,
    /// SELECT
    Select,
    /// NULL
    Null,
    /// PRIMARY
    Primary,
    /// KEY
    Key,
    /// INDEX
    Index,
    /// UNIQUE
    Unique,
    /// CONSTRAINT
    Constraint,
    /// FOREIGN
    Foreign,
    /// FULLTEXT
    Fulltext,
    /// SPATIAL
    Spatial,
    /// CHECK
    Check,
}

const KEYWORDS: [(&str, Keyword); 23] = [
    ("CREATE", Keyword::Create),
    ("TABLE", Keyword::Table),
    ("TEMPORARY", Keyword::Temporary),
    ("IF", Keyword::If),
    ("NOT", Keyword::Not),
    ("EXISTS", Keyword::Exists),
    ("INSERT", Keyword::Insert),
    ("REPLACE", Keyword::Replace),
    ("INTO", Keyword::Into),
    ("VALUES", Keyword::Values),
    ("VALUE", Keyword::Values),
    ("SET", Keyword::Set),
    ("SELECT", Keyword::Select),
    ("NULL", Keyword::Null),
    ("PRIMARY", Keyword::Primary),
    ("KEY", Keyword::Key),
    ("INDEX", Keyword::Index),
    ("UNIQUE", Keyword::Unique),
    ("CONSTRAINT", Keyword::Constraint),
    ("FOREIGN", Keyword::Foreign),
    ("FULLTEXT", Keyword::Fulltext),
    ("SPATIAL", Keyword::Spatial),
    ("CHECK", Keyword::Check),
];

impl Keyword {
    /// Match a bare word against the keyword table, ignoring ASCII case.
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .find(|(text, _)| text.eq_ignore_ascii_case(word))
            .map(|(_, keyword)| *keyword)
    }

    /// Whether the keyword opens a constraint or index definition inside
    /// a `CREATE TABLE` body rather than a column.
    #[must_use]
    pub fn is_constraint(self) -> bool {
        matches!(
            self,
            Keyword::Primary
                | Keyword::Key
                | Keyword::Index
                | Keyword::Unique
                | Keyword::Constraint
                | Keyword::Foreign
                | Keyword::Fulltext
                | Keyword::Spatial
                | Keyword::Check
        )
    }
}

impl TokenKind {
    /// The keyword this token spells, if it is a bare word in the keyword table.
    #[must_use]
    pub fn keyword(&self) -> Option<Keyword> {
        match self {
            TokenKind::Word(word) => Keyword::from_word(word),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Word(word) => write!(f, "`{word}`"),
            TokenKind::QuotedIdentifier(name) => write!(f, "identifier `{name}`"),
            TokenKind::StringLiteral(_) => f.write_str("string literal"),
            TokenKind::IntegerLiteral(text) | TokenKind::FloatLiteral(text) => {
                write!(f, "number {text}")
            }
            TokenKind::HexLiteral { .. } => f.write_str("hex literal"),
            TokenKind::BitLiteral { .. } => f.write_str("bit literal"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::Semicolon => f.write_str("';'"),
            TokenKind::Dot => f.write_str("'.'"),
            TokenKind::Minus => f.write_str("'-'"),
            TokenKind::Other(byte) => write!(f, "'{}'", byte.escape_ascii()),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

/// Streaming SQL lexer.
pub struct Lexer<R> {
    source: ByteSource<R>,
    peeked: Option<Token>,
}

impl<R: Read> Lexer<R> {
    /// Create a new lexer reading from `reader`.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            source: ByteSource::new(reader),
            peeked: None,
        }
    }

    /// Byte offset of the next token.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.peeked
            .as_ref()
            .map_or_else(|| self.source.position(), |token| token.pos)
    }

    /// Peek at the next token without consuming it.
    ///
    /// # Errors
    ///
    /// Returns an error if the next token is malformed or the input cannot be read.
    pub fn peek(&mut self) -> Result<&Token, LexerError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.next_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    /// Consume and return the next token.
    ///
    /// # Errors
    ///
    /// Returns an error if the next token is malformed or the input cannot be read.
    pub fn next(&mut self) -> Result<Token, LexerError> {
        if let Some(token) = self.peeked.take() {
            return Ok(token);
        }
        self.next_token()
    }

    fn byte(&mut self, ahead: usize) -> Result<Option<u8>, LexerError> {
        self.source
            .peek_at(ahead)
            .map_err(|source| LexerError::Io {
                position: self.source.position(),
                source,
            })
    }

    /// Skip whitespace and comments.
    fn skip_whitespace(&mut self) -> Result<(), LexerError> {
        loop {
            let Some(b) = self.byte(0)? else {
                return Ok(());
            };
            if b.is_ascii_whitespace() {
                self.source.bump();
            } else if b == b'#' {
                self.skip_line()?;
            } else if b == b'-' && self.byte(1)? == Some(b'-') && self.starts_line_comment()? {
                self.skip_line()?;
            } else if b == b'/' && self.byte(1)? == Some(b'*') {
                self.skip_block_comment()?;
            } else {
                return Ok(());
            }
        }
    }

    /// `--` only opens a comment when followed by whitespace or the end of input.
    fn starts_line_comment(&mut self) -> Result<bool, LexerError> {
        Ok(self
            .byte(2)?
            .is_none_or(|b| b.is_ascii_whitespace() || b.is_ascii_control()))
    }

    fn skip_line(&mut self) -> Result<(), LexerError> {
        while let Some(b) = self.byte(0)? {
            self.source.bump();
            if b == b'\n' {
                break;
            }
        }
        Ok(())
    }

    fn skip_block_comment(&mut self) -> Result<(), LexerError> {
        let start_pos = self.source.position();
        self.source.bump();
        self.source.bump();
        loop {
            match self.byte(0)? {
                None => return Err(LexerError::UnterminatedComment { pos: start_pos }),
                Some(b'*') if self.byte(1)? == Some(b'/') => {
                    self.source.bump();
                    self.source.bump();
                    return Ok(());
                }
                Some(_) => self.source.bump(),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, LexerError> {
        self.skip_whitespace()?;

        let start_pos = self.source.position();
        let Some(b) = self.byte(0)? else {
            return Ok(Token {
                kind: TokenKind::Eof,
                pos: start_pos,
            });
        };
        let next = self.byte(1)?;

        let kind = match (b, next) {
            (b'(', _) => TokenKind::LParen,
            (b')', _) => TokenKind::RParen,
            (b',', _) => TokenKind::Comma,
            (b';', _) => TokenKind::Semicolon,
            (b'-', _) => TokenKind::Minus,
            (b'\'' | b'"', _) => return self.read_string(start_pos),
            (b'`', _) => return self.read_quoted_identifier(start_pos),
            (b'X' | b'x', Some(b'\'')) => return self.read_quoted_radix(start_pos, Radix::Hex),
            (b'B' | b'b', Some(b'\'')) => return self.read_quoted_radix(start_pos, Radix::Bit),
            (b'N' | b'n', Some(b'\'')) => {
                // National character set string, N'...'
                self.source.bump();
                return self.read_string(start_pos);
            }
            (b'0', Some(b'x' | b'X')) if self.byte(2)?.is_some_and(|c| Radix::Hex.accepts(c)) => {
                return self.read_prefixed_radix(start_pos, Radix::Hex);
            }
            (b'0', Some(b'b' | b'B')) if self.byte(2)?.is_some_and(|c| Radix::Bit.accepts(c)) => {
                return self.read_prefixed_radix(start_pos, Radix::Bit);
            }
            (b'.', Some(digit)) if digit.is_ascii_digit() => return self.read_number(start_pos),
            (b'.', _) => TokenKind::Dot,
            _ if b.is_ascii_digit() => return self.read_number(start_pos),
            _ if is_ident_start(b) => return self.read_word(start_pos),
            _ => TokenKind::Other(b),
        };
        self.source.bump();

        Ok(Token {
            kind,
            pos: start_pos,
        })
    }

    fn read_string(&mut self, start_pos: u64) -> Result<Token, LexerError> {
        let Some(quote) = self.byte(0)? else {
            return Err(LexerError::UnterminatedString { pos: start_pos });
        };
        self.source.bump();

        let mut value = Vec::new();
        loop {
            match self.byte(0)? {
                None => return Err(LexerError::UnterminatedString { pos: start_pos }),
                Some(b'\\') => {
                    self.source.bump();
                    let Some(escaped) = self.byte(0)? else {
                        return Err(LexerError::UnterminatedString { pos: start_pos });
                    };
                    self.source.bump();
                    match unescape_byte(escaped) {
                        Unescaped::Single(byte) => value.push(byte),
                        Unescaped::Pair(first, second) => value.extend_from_slice(&[first, second]),
                    }
                }
                Some(b) if b == quote => {
                    self.source.bump();
                    // A doubled quote stands for one quote character.
                    if self.byte(0)? == Some(quote) {
                        value.push(quote);
                        self.source.bump();
                    } else {
                        return Ok(Token {
                            kind: TokenKind::StringLiteral(value),
                            pos: start_pos,
                        });
                    }
                }
                Some(b) => {
                    value.push(b);
                    self.source.bump();
                }
            }
        }
    }

    fn read_quoted_identifier(&mut self, start_pos: u64) -> Result<Token, LexerError> {
        self.source.bump();

        let mut name = Vec::new();
        loop {
            match self.byte(0)? {
                None => return Err(LexerError::UnterminatedIdentifier { pos: start_pos }),
                Some(b'`') => {
                    self.source.bump();
                    if self.byte(0)? == Some(b'`') {
                        name.push(b'`');
                        self.source.bump();
                    } else {
                        return Ok(Token {
                            kind: TokenKind::QuotedIdentifier(lossy(name)),
                            pos: start_pos,
                        });
                    }
                }
                Some(b) => {
                    name.push(b);
                    self.source.bump();
                }
            }
        }
    }

    fn read_quoted_radix(&mut self, start_pos: u64, radix: Radix) -> Result<Token, LexerError> {
        self.source.bump(); // Skip X or B
        self.source.bump(); // Skip opening quote

        let mut digits = String::new();
        let mut invalid = None;
        loop {
            let pos = self.source.position();
            match self.byte(0)? {
                None => return Err(LexerError::UnterminatedString { pos: start_pos }),
                Some(b'\'') => {
                    self.source.bump();
                    break;
                }
                Some(b) => {
                    if !radix.accepts(b) && invalid.is_none() {
                        invalid = Some((b, pos));
                    }
                    digits.push(char::from(b));
                    self.source.bump();
                }
            }
        }

        // The whole literal is consumed first so the lexer resumes after it.
        if let Some((b, pos)) = invalid {
            return Err(LexerError::InvalidDigit {
                char: char::from(b),
                pos,
            });
        }
        Ok(Token {
            kind: radix.token(digits, Notation::Quoted),
            pos: start_pos,
        })
    }

    fn read_prefixed_radix(&mut self, start_pos: u64, radix: Radix) -> Result<Token, LexerError> {
        self.source.bump(); // Skip 0
        self.source.bump(); // Skip x or b

        let mut digits = String::new();
        while let Some(b) = self.byte(0)? {
            if !radix.accepts(b) {
                break;
            }
            digits.push(char::from(b));
            self.source.bump();
        }

        Ok(Token {
            kind: radix.token(digits, Notation::Prefixed),
            pos: start_pos,
        })
    }

    fn read_number(&mut self, start_pos: u64) -> Result<Token, LexerError> {
        let mut text = String::new();

        // Read integer part
        self.read_digits(&mut text)?;

        // Check for decimal point
        let mut is_float = false;
        if self.byte(0)? == Some(b'.') {
            is_float = true;
            text.push('.');
            self.source.bump();
            self.read_digits(&mut text)?;
        }

        // Check for exponent
        if let Some(e @ (b'e' | b'E')) = self.byte(0)? {
            let has_exponent = match self.byte(1)? {
                Some(d) if d.is_ascii_digit() => true,
                Some(b'+' | b'-') => self.byte(2)?.is_some_and(|d| d.is_ascii_digit()),
                _ => false,
            };
            if has_exponent {
                is_float = true;
                text.push(char::from(e));
                self.source.bump();
                if let Some(sign @ (b'+' | b'-')) = self.byte(0)? {
                    text.push(char::from(sign));
                    self.source.bump();
                }
                self.read_digits(&mut text)?;
            }
        }

        let kind = if is_float {
            TokenKind::FloatLiteral(text)
        } else {
            TokenKind::IntegerLiteral(text)
        };
        Ok(Token {
            kind,
            pos: start_pos,
        })
    }

    fn read_digits(&mut self, text: &mut String) -> Result<(), LexerError> {
        while let Some(b) = self.byte(0)? {
            if !b.is_ascii_digit() {
                break;
            }
            text.push(char::from(b));
            self.source.bump();
        }
        Ok(())
    }

    fn read_word(&mut self, start_pos: u64) -> Result<Token, LexerError> {
        let mut word = Vec::new();
        while let Some(b) = self.byte(0)? {
            if !is_ident_cont(b) {
                break;
            }
            word.push(b);
            self.source.bump();
        }

        Ok(Token {
            kind: TokenKind::Word(lossy(word)),
            pos: start_pos,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Radix {
    Hex,
    Bit,
}

impl Radix {
    fn accepts(self, b: u8) -> bool {
        match self {
            Radix::Hex => b.is_ascii_hexdigit(),
            Radix::Bit => b == b'0' || b == b'1',
        }
    }

    fn token(self, digits: String, notation: Notation) -> TokenKind {
        match self {
            Radix::Hex => TokenKind::HexLiteral { digits, notation },
            Radix::Bit => TokenKind::BitLiteral { digits, notation },
        }
    }
}

fn lossy(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

/// Check if a byte can start an identifier.
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

/// Check if a byte can continue an identifier.
fn is_ident_cont(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

/// Errors that can occur during lexing.
#[derive(Debug, thiserror::Error)]
pub enum LexerError {
    /// Unterminated string literal.
    #[error("Unterminated string literal starting at position {pos}")]
    UnterminatedString {
        /// Position where string started.
        pos: u64,
    },
    /// Unterminated back-quoted identifier.
    #[error("Unterminated quoted identifier starting at position {pos}")]
    UnterminatedIdentifier {
        /// Position where the identifier started.
        pos: u64,
    },
    /// Unterminated block comment.
    #[error("Unterminated comment starting at position {pos}")]
    UnterminatedComment {
        /// Position where the comment started.
        pos: u64,
    },
    /// Invalid digit in a hex or bit literal.
    #[error("Invalid digit '{char}' at position {pos}")]
    InvalidDigit {
        /// The invalid character.
        char: char,
        /// Position in input.
        pos: u64,
    },
    /// The underlying reader failed.
    #[error("Read failed at position {position}: {source}")]
    Io {
        /// Position reached before the failure.
        position: u64,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },
}

impl LexerError {
    /// Position in the input the error refers to.
    #[must_use]
    pub fn position(&self) -> u64 {
        match self {
            LexerError::UnterminatedString { pos }
            | LexerError::UnterminatedIdentifier { pos }
            | LexerError::UnterminatedComment { pos }
            | LexerError::InvalidDigit { pos, .. } => *pos,
            LexerError::Io { position, .. } => *position,
        }
    }
}
