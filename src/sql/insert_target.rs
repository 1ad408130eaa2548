//! Two-state automaton locating the target table of an `INSERT`.
//!
//! The keyword sequence alone is ambiguous (`INSERT IGNORE INTO t`,
//! `INSERT INTO db.t`, `INSERT t`), so the table is taken to be the last
//! identifier seen before `VALUES`. Everything after the leading `INSERT` or
//! `REPLACE` keyword is fed token by token:
//!
//! ```text
//!                  identifier
//!   AwaitIdent ─────────────────▶ AwaitValuesKeyword ──VALUES──▶ Matched
//!       ▲  │ INTO                  │   │ identifier (replaces candidate)
//!       │  └───┘                   │   └──┘
//!       └────────── '.' or INTO ───┘
//! ```

use super::lexer::{Keyword, TokenKind};

/// State of the target automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertTarget {
    /// Waiting for a table identifier.
    AwaitIdent {
        /// Schema qualifier read so far, as in `db.`.
        qualifier: Option<String>,
    },
    /// A candidate name was read; waiting for `VALUES`.
    AwaitValuesKeyword {
        /// The candidate table name, qualifier included.
        name: String,
    },
}

/// Outcome of feeding one token to the automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// More tokens are needed.
    Continue,
    /// `VALUES` followed the named table.
    Matched(String),
    /// The statement lists its columns (`t (a, b)` or `t SET a = 1`).
    ColumnList(String),
    /// The statement takes its rows from a construct other than `VALUES`.
    Unsupported {
        /// The candidate table name.
        table: String,
        /// The construct that was found.
        construct: &'static str,
    },
    /// The token cannot appear here; the statement is not an insert we know.
    Rejected,
}

impl Default for InsertTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl InsertTarget {
    /// Start in [`InsertTarget::AwaitIdent`].
    #[must_use]
    pub fn new() -> Self {
        InsertTarget::AwaitIdent { qualifier: None }
    }

    /// Advance the automaton by one token.
    ///
    /// Once a step other than [`Step::Continue`] is returned the automaton is
    /// spent and must not be fed again.
    pub fn feed(&mut self, token: &TokenKind) -> Step {
        let keyword = token.keyword();
        match self {
            InsertTarget::AwaitIdent { qualifier } => {
                if keyword == Some(Keyword::Into) && qualifier.is_none() {
                    return Step::Continue;
                }
                let Some(ident) = identifier(token, keyword) else {
                    return Step::Rejected;
                };
                let name = match qualifier.take() {
                    Some(qualifier) => format!("{qualifier}.{ident}"),
                    None => ident,
                };
                *self = InsertTarget::AwaitValuesKeyword { name };
                Step::Continue
            }
            InsertTarget::AwaitValuesKeyword { name } => match (token, keyword) {
                (_, Some(Keyword::Values)) => Step::Matched(core::mem::take(name)),
                (TokenKind::LParen, _) | (_, Some(Keyword::Set)) => {
                    Step::ColumnList(core::mem::take(name))
                }
                (_, Some(Keyword::Select)) => Step::Unsupported {
                    table: core::mem::take(name),
                    construct: "SELECT",
                },
                (TokenKind::Dot, _) => {
                    let qualifier = Some(core::mem::take(name));
                    *self = InsertTarget::AwaitIdent { qualifier };
                    Step::Continue
                }
                (_, Some(Keyword::Into)) => {
                    *self = InsertTarget::AwaitIdent { qualifier: None };
                    Step::Continue
                }
                _ => match identifier(token, keyword) {
                    Some(ident) => {
                        *name = ident;
                        Step::Continue
                    }
                    None => Step::Rejected,
                },
            },
        }
    }
}

/// The identifier a token spells, unless it is a structural keyword.
fn identifier(token: &TokenKind, keyword: Option<Keyword>) -> Option<String> {
    match (token, keyword) {
        (TokenKind::QuotedIdentifier(name), _) => Some(name.clone()),
        (
            TokenKind::Word(_),
            Some(Keyword::Into | Keyword::Values | Keyword::Set | Keyword::Select),
        ) => None,
        (TokenKind::Word(word), _) => Some(word.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str) -> TokenKind {
        TokenKind::Word(text.into())
    }

    fn quoted(text: &str) -> TokenKind {
        TokenKind::QuotedIdentifier(text.into())
    }

    /// Feed every token, returning the first step that is not `Continue`.
    fn run(tokens: &[TokenKind]) -> Step {
        let mut target = InsertTarget::new();
        for token in tokens {
            let step = target.feed(token);
            if step != Step::Continue {
                return step;
            }
        }
        Step::Continue
    }

    #[test]
    fn test_plain_insert() {
        assert_eq!(
            run(&[word("INTO"), quoted("page"), word("VALUES")]),
            Step::Matched("page".into())
        );
    }

    #[test]
    fn test_states() {
        let mut target = InsertTarget::new();
        assert_eq!(target.feed(&word("into")), Step::Continue);
        assert_eq!(target, InsertTarget::AwaitIdent { qualifier: None });
        assert_eq!(target.feed(&word("page")), Step::Continue);
        assert_eq!(
            target,
            InsertTarget::AwaitValuesKeyword {
                name: "page".into()
            }
        );
        assert_eq!(target.feed(&word("value")), Step::Matched("page".into()));
    }

    #[test]
    fn test_modifiers_before_into() {
        assert_eq!(
            run(&[word("IGNORE"), word("INTO"), word("page"), word("VALUES")]),
            Step::Matched("page".into())
        );
        assert_eq!(
            run(&[word("LOW_PRIORITY"), word("IGNORE"), word("INTO"), word("t"), word("VALUES")]),
            Step::Matched("t".into())
        );
    }

    #[test]
    fn test_insert_without_into() {
        assert_eq!(
            run(&[word("page"), word("VALUES")]),
            Step::Matched("page".into())
        );
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(
            run(&[word("INTO"), quoted("db"), TokenKind::Dot, quoted("page"), word("VALUES")]),
            Step::Matched("db.page".into())
        );
    }

    #[test]
    fn test_column_lists() {
        assert_eq!(
            run(&[word("INTO"), word("page"), TokenKind::LParen]),
            Step::ColumnList("page".into())
        );
        assert_eq!(
            run(&[word("INTO"), word("page"), word("SET")]),
            Step::ColumnList("page".into())
        );
    }

    #[test]
    fn test_insert_select() {
        assert_eq!(
            run(&[word("INTO"), word("page"), word("SELECT")]),
            Step::Unsupported {
                table: "page".into(),
                construct: "SELECT",
            }
        );
    }

    #[test]
    fn test_rejections() {
        assert_eq!(run(&[word("VALUES")]), Step::Rejected);
        assert_eq!(run(&[TokenKind::LParen]), Step::Rejected);
        assert_eq!(run(&[word("INTO"), word("page"), TokenKind::Comma]), Step::Rejected);
        assert_eq!(
            run(&[word("INTO"), word("db"), TokenKind::Dot, word("INTO")]),
            Step::Rejected
        );
    }
}
