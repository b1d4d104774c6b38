//! # safesql
//!
//! Injection-safe helpers over a database client.
//!
//! ## Features
//!
//! - **Identifier escaping**: validate and quote table/column names per engine
//! - **Literal escaping**: LIKE metacharacters and typed literal value sets
//! - **Placeholder masks**: `?*` expands to one `?` per element of an array argument
//! - **Condition trees**: build nested AND/OR `WHERE` clauses with bound values
//! - **Safe defaults**: empty IN lists fail unless explicitly allowed; UPDATE/DELETE
//!   with no conditions touch nothing
//!
//! ## Statements
//!
//! ```ignore
//! use safesql::{Statement, values};
//!
//! let mut stmt = Statement::open();
//! stmt.with("deleted_at IS NULL", values![])?
//!     .and_in("role_id IN (?*)", values![1, 2, 3])?
//!     .or_group()
//!     .with("owner_id = ?", values![42])?
//!     .and_with("shared = ?", values![true])?
//!     .end_group()?;
//!
//! let compiled = stmt.compile();
//! // deleted_at IS NULL AND role_id IN (?, ?, ?) OR (owner_id = ? AND shared = ?)
//! ```
//!
//! ## Database handle
//!
//! ```ignore
//! use safesql::{Db, DbConfig, values};
//!
//! let db = Db::new(client, DbConfig::from_env()?);
//! let rows = db.run("SELECT * FROM users WHERE id IN (?*)", values![vec![1, 2, 3]]).await?;
//! ```

pub mod client;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod escape;
pub mod ident;
pub mod mask;
pub mod statement;
pub mod value;

pub use client::Connection;
pub use config::DbConfig;
pub use db::Db;
pub use engine::Engine;
pub use error::{IdentifierErrorKind, SqlError, SqlResult};
pub use escape::{EMPTY_VALUE_SET, Quote, SetType, escape_like_value, escape_value_set};
pub use ident::{
    Ident, IntoIdent, assert_valid_identifier, escape_identifier, escape_qualified_identifier,
    is_valid_identifier,
};
pub use mask::{Expanded, expand};
pub use statement::{Compiled, Condition, GroupId, Joiner, Statement};
pub use value::Value;
