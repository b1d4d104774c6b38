//! Database engine (dialect) tags.
//!
//! The engine decides how identifiers are delimited and how string literals are
//! quoted. It is never global: every escaping call receives one explicitly, or
//! takes it from the [`DbConfig`](crate::DbConfig) its [`Db`](crate::Db) was built with.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// SQL dialect tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum Engine {
    /// MySQL / MariaDB: `` `ident` ``
    MySql,
    /// Microsoft SQL Server: `[ident]`
    MsSql,
    /// PostgreSQL: `"ident"`
    Postgres,
    /// SQLite: `"ident"`
    Sqlite,
    /// Anything else: ANSI `"ident"`
    #[default]
    Default,
}

impl Engine {
    /// Driver-style name of this engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::MySql => "mysql",
            Engine::MsSql => "mssql",
            Engine::Postgres => "pgsql",
            Engine::Sqlite => "sqlite",
            Engine::Default => "default",
        }
    }

    /// Opening and closing identifier delimiters.
    pub fn identifier_quotes(&self) -> (char, char) {
        match self {
            Engine::MySql => ('`', '`'),
            Engine::MsSql => ('[', ']'),
            Engine::Postgres | Engine::Sqlite | Engine::Default => ('"', '"'),
        }
    }

    /// Wrap an already validated identifier part in this engine's delimiters.
    pub fn quote_identifier(&self, ident: &str) -> String {
        let (open, close) = self.identifier_quotes();
        let mut out = String::with_capacity(ident.len() + 2);
        out.push(open);
        out.push_str(ident);
        out.push(close);
        out
    }

    /// Quote a string as a SQL literal the way this engine's driver does.
    ///
    /// MySQL uses backslash escapes; every other engine doubles single quotes.
    pub fn quote_literal(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        match self {
            Engine::MySql => {
                for ch in value.chars() {
                    match ch {
                        '\\' => out.push_str("\\\\"),
                        '\'' => out.push_str("\\'"),
                        '"' => out.push_str("\\\""),
                        '\0' => out.push_str("\\0"),
                        '\n' => out.push_str("\\n"),
                        '\r' => out.push_str("\\r"),
                        '\x1a' => out.push_str("\\Z"),
                        c => out.push(c),
                    }
                }
            }
            _ => {
                for ch in value.chars() {
                    if ch == '\'' {
                        out.push_str("''");
                    } else {
                        out.push(ch);
                    }
                }
            }
        }
        out.push('\'');
        out
    }
}

impl FromStr for Engine {
    type Err = std::convert::Infallible;

    /// Unknown driver names map to [`Engine::Default`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let engine = match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Engine::MySql,
            "mssql" | "sqlsrv" | "dblib" | "sqlserver" => Engine::MsSql,
            "pgsql" | "postgres" | "postgresql" => Engine::Postgres,
            "sqlite" | "sqlite3" => Engine::Sqlite,
            _ => Engine::Default,
        };
        Ok(engine)
    }
}

impl From<String> for Engine {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl From<&str> for Engine {
    fn from(s: &str) -> Self {
        Engine::from(s.to_string())
    }
}

/// Serializes as its driver name, the same string [`Display`](fmt::Display) prints.
impl Serialize for Engine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
