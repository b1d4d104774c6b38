//! Safe SQL identifier handling.
//!
//! This module provides [`Ident`] which represents a validated table or column
//! name, optionally qualified as `table.column`, and renders it with the
//! delimiters of a given [`Engine`].
//!
//! - Every part must match `[A-Za-z][A-Za-z0-9_]*`
//! - At most one `.` separator
//! - `*` is accepted as a whole identifier or as the column part, and is never quoted
//!
//! Disallowed characters are rejected, never stripped.
//!
//! # Example
//! ```ignore
//! use safesql::{Engine, Ident};
//!
//! let col = Ident::parse("users.email", true)?;
//! assert_eq!(col.to_sql(Engine::MySql), "`users`.`email`");
//! # Ok::<(), safesql::SqlError>(())
//! ```

use crate::engine::Engine;
use crate::error::{SqlError, SqlResult};
use regex::Regex;
use std::sync::OnceLock;

/// Wildcard accepted wherever an identifier is.
pub const WILDCARD: &str = "*";

fn part_regex() -> &'static Regex {
    static PART_RE: OnceLock<Regex> = OnceLock::new();
    PART_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("invalid built-in identifier regex")
    })
}

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    /// Validated name.
    Name(String),
    /// `*`
    Wildcard,
}

/// A validated SQL identifier (`column`, `table`, or `table.column`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse and validate an identifier.
    ///
    /// With `allow_qualified = false` a `.` is an invalid character. With it set,
    /// exactly one `.` may separate a table part from a column part; more than
    /// one fails with [`SqlError::TooManyParts`].
    pub fn parse(s: &str, allow_qualified: bool) -> SqlResult<Self> {
        if s == WILDCARD {
            return Ok(Self {
                parts: vec![IdentPart::Wildcard],
            });
        }

        if !allow_qualified {
            return match parse_name(s) {
                Some(part) => Ok(Self { parts: vec![part] }),
                None => Err(reject(s)),
            };
        }

        let pieces: Vec<&str> = s.split('.').collect();
        match pieces.as_slice() {
            [single] => match parse_name(single) {
                Some(part) => Ok(Self { parts: vec![part] }),
                None => Err(reject(s)),
            },
            [table, column] => {
                let table = parse_name(table).ok_or_else(|| reject(s))?;
                let column = if *column == WILDCARD {
                    IdentPart::Wildcard
                } else {
                    parse_name(column).ok_or_else(|| reject(s))?
                };
                Ok(Self {
                    parts: vec![table, column],
                })
            }
            _ => {
                tracing::debug!(target: "safesql", ident = s, "rejected identifier: too many parts");
                Err(SqlError::too_many_parts(s))
            }
        }
    }

    /// Whether this identifier has a table qualifier.
    pub fn is_qualified(&self) -> bool {
        self.parts.len() > 1
    }

    /// Whether any part is `*`.
    pub fn has_wildcard(&self) -> bool {
        self.parts.contains(&IdentPart::Wildcard)
    }

    /// Render the identifier, quoting each named part for `engine`.
    pub fn to_sql(&self, engine: Engine) -> String {
        let mut out = String::new();
        self.write_sql(&mut out, engine, true);
        out
    }

    /// Render the identifier without delimiters.
    pub fn to_bare(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out, Engine::Default, false);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String, engine: Engine, quote: bool) {
        let (open, close) = engine.identifier_quotes();
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Wildcard => out.push('*'),
                IdentPart::Name(name) if quote => {
                    out.push(open);
                    out.push_str(name);
                    out.push(close);
                }
                IdentPart::Name(name) => out.push_str(name),
            }
        }
    }
}

fn parse_name(s: &str) -> Option<IdentPart> {
    part_regex()
        .is_match(s)
        .then(|| IdentPart::Name(s.to_string()))
}

fn reject(s: &str) -> SqlError {
    tracing::debug!(target: "safesql", ident = s, "rejected identifier");
    SqlError::invalid_identifier(s)
}

/// Escape an unqualified identifier for `engine`.
///
/// With `quote = false` the validated bare name is returned.
pub fn escape_identifier(name: &str, engine: Engine, quote: bool) -> SqlResult<String> {
    let ident = Ident::parse(name, false)?;
    Ok(if quote {
        ident.to_sql(engine)
    } else {
        ident.to_bare()
    })
}

/// Escape a `table.column` (or plain) identifier for `engine`, quoting each part.
pub fn escape_qualified_identifier(name: &str, engine: Engine) -> SqlResult<String> {
    Ok(Ident::parse(name, true)?.to_sql(engine))
}

/// Returns `true` if `name` is a valid identifier.
pub fn is_valid_identifier(name: &str, allow_qualified: bool) -> bool {
    Ident::parse(name, allow_qualified).is_ok()
}

/// Fail with the identifier error `name` would produce, if any.
pub fn assert_valid_identifier(name: &str, allow_qualified: bool) -> SqlResult<()> {
    Ident::parse(name, allow_qualified).map(|_| ())
}

/// Convert an input into an [`Ident`].
///
/// This is mainly for ergonomics in [`Db`](crate::Db) helpers; string inputs are
/// parsed with the caller's qualification policy.
pub trait IntoIdent {
    fn into_ident(self, allow_qualified: bool) -> SqlResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self, allow_qualified: bool) -> SqlResult<Ident> {
        if self.is_qualified() && !allow_qualified {
            return Err(SqlError::invalid_identifier(self.to_bare()));
        }
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self, allow_qualified: bool) -> SqlResult<Ident> {
        self.clone().into_ident(allow_qualified)
    }
}

impl IntoIdent for &str {
    fn into_ident(self, allow_qualified: bool) -> SqlResult<Ident> {
        Ident::parse(self, allow_qualified)
    }
}

impl IntoIdent for String {
    fn into_ident(self, allow_qualified: bool) -> SqlResult<Ident> {
        Ident::parse(&self, allow_qualified)
    }
}
