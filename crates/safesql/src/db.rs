//! Convenience handle over a [`Connection`].
//!
//! [`Db`] binds the escaping helpers to one configured [`Engine`] and adds
//! parameter-safe query helpers on top of the wrapped client.
//!
//! # Example
//!
//! ```ignore
//! use safesql::{Db, DbConfig, values};
//!
//! let db = Db::new(client, DbConfig::new().engine("pgsql"));
//!
//! let rows = db
//!     .run("SELECT * FROM users WHERE id IN (?*) AND status = ?", values![vec![1, 2, 3], "active"])
//!     .await?;
//!
//! let mut filter = db.statement();
//! filter.with("status = ?", values!["banned"])?;
//! db.delete("users", &filter).await?;
//! ```

use crate::client::Connection;
use crate::config::DbConfig;
use crate::engine::Engine;
use crate::error::{SqlError, SqlResult};
use crate::escape::{self, ensure_one_dimensional};
use crate::ident::Ident;
use crate::mask::{self, placeholder_list};
use crate::statement::Statement;
use crate::value::Value;

/// A database handle: a [`Connection`] plus the [`DbConfig`] its helpers obey.
pub struct Db<C> {
    conn: C,
    config: DbConfig,
}

impl<C: Connection> Db<C> {
    /// Wrap a connection.
    pub fn new(conn: C, config: DbConfig) -> Self {
        Self { conn, config }
    }

    /// The wrapped connection, for direct driver access.
    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Unwrap the connection.
    pub fn into_inner(self) -> C {
        self.conn
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn engine(&self) -> Engine {
        self.config.engine
    }

    /// Allow or reject dot-qualified identifiers from now on.
    pub fn set_allow_separators(&mut self, allow: bool) {
        self.config.allow_separators = allow;
    }

    /// Allow empty IN lists in statements opened from now on.
    pub fn set_allow_empty_in(&mut self, allow: bool) {
        self.config.allow_empty_in = allow;
    }

    /// Open a root [`Statement`] honoring this handle's empty-IN policy.
    pub fn statement(&self) -> Statement {
        Statement::open().allow_empty_in(self.config.allow_empty_in)
    }

    // ==================== Escaping ====================

    /// Validate and (optionally) quote an identifier.
    ///
    /// `table.column` is accepted only when `allow_separators` is on.
    pub fn escape_identifier(&self, name: &str, quote: bool) -> SqlResult<String> {
        let ident = Ident::parse(name, self.config.allow_separators)?;
        Ok(if quote {
            ident.to_sql(self.config.engine)
        } else {
            ident.to_bare()
        })
    }

    /// Validate a table or column name for a DML helper and quote it.
    ///
    /// `*` is an identifier only in select lists; here it is rejected.
    fn object_name(&self, name: &str) -> SqlResult<String> {
        let ident = Ident::parse(name, self.config.allow_separators)?;
        if ident.has_wildcard() {
            tracing::debug!(target: "safesql", ident = name, "rejected wildcard object name");
            return Err(SqlError::invalid_identifier(name));
        }
        Ok(ident.to_sql(self.config.engine))
    }

    /// Escape LIKE metacharacters for this handle's engine.
    pub fn escape_like_value(&self, raw: &str) -> String {
        escape::escape_like_value(raw, self.config.engine)
    }

    /// Render a literal value set, quoting strings through the connection.
    pub fn escape_value_set(&self, values: &[Value], declared_type: &str) -> SqlResult<String> {
        let engine = self.config.engine;
        let quoter = |s: &str| self.conn.quote(engine, s);
        escape::escape_value_set(values, declared_type, &quoter)
    }

    /// Quote a string literal through the connection.
    pub fn quote(&self, value: &str) -> String {
        self.conn.quote(self.config.engine, value)
    }

    // ==================== Execution ====================

    fn log_sql(&self, sql: &str, param_count: usize) {
        let engine = self.config.engine.as_str();
        if self.config.log_sql {
            tracing::debug!(target: "safesql.sql", engine, param_count, sql = %sql);
        } else {
            tracing::trace!(target: "safesql.sql", engine, param_count, sql = %sql);
        }
    }

    fn check_statement(sql: &str) -> SqlResult<()> {
        if sql.trim().is_empty() {
            return Err(SqlError::query_construction("empty SQL statement"));
        }
        Ok(())
    }

    /// Expand `?*` markers for array arguments, then run the query.
    pub async fn run(&self, mask: &str, args: Vec<Value>) -> SqlResult<Vec<C::Row>> {
        Self::check_statement(mask)?;
        let expanded = mask::expand(mask, args)?;
        self.log_sql(&expanded.sql, expanded.values.len());
        self.conn.query(&expanded.sql, &expanded.values).await
    }

    /// Run a query whose `?` placeholders already match `params` one to one.
    pub async fn safe_query(&self, sql: &str, params: Vec<Value>) -> SqlResult<Vec<C::Row>> {
        Self::check_statement(sql)?;
        ensure_one_dimensional(&params)?;
        self.log_sql(sql, params.len());
        self.conn.query(sql, &params).await
    }

    /// Expand `?*` markers, then execute a statement and return affected rows.
    pub async fn execute(&self, mask: &str, args: Vec<Value>) -> SqlResult<u64> {
        Self::check_statement(mask)?;
        let expanded = mask::expand(mask, args)?;
        self.log_sql(&expanded.sql, expanded.values.len());
        self.conn.execute(&expanded.sql, &expanded.values).await
    }

    /// `SELECT * FROM <table> WHERE <conditions>`.
    pub async fn select_where(
        &self,
        table: &str,
        conditions: &Statement,
    ) -> SqlResult<Vec<C::Row>> {
        let table = self.object_name(table)?;
        let compiled = conditions.compile();
        ensure_one_dimensional(&compiled.values)?;
        let sql = format!("SELECT * FROM {table} WHERE {}", compiled.sql);
        self.log_sql(&sql, compiled.values.len());
        self.conn.query(&sql, &compiled.values).await
    }

    // ==================== Writes ====================

    /// Build `INSERT INTO <table> (<columns>) VALUES (?, ...)` for `rows` rows.
    pub fn build_insert_query(
        &self,
        table: &str,
        columns: &[&str],
        rows: usize,
    ) -> SqlResult<String> {
        if columns.is_empty() {
            return Err(SqlError::must_be_non_empty("INSERT needs at least one column"));
        }
        if rows == 0 {
            return Err(SqlError::must_be_non_empty("INSERT needs at least one row"));
        }
        let table = self.object_name(table)?;
        let columns = columns
            .iter()
            .map(|c| self.object_name(c))
            .collect::<SqlResult<Vec<_>>>()?;

        let tuple = format!("({})", placeholder_list(columns.len()));
        let tuples = vec![tuple; rows].join(", ");
        Ok(format!(
            "INSERT INTO {table} ({}) VALUES {tuples}",
            columns.join(", ")
        ))
    }

    /// Insert one row.
    pub async fn insert(&self, table: &str, row: &[(&str, Value)]) -> SqlResult<u64> {
        self.insert_many(table, &[row.to_vec()]).await
    }

    /// Insert several rows in one statement.
    ///
    /// Every row must list the same columns in the same order as the first;
    /// every cell must be a scalar.
    pub async fn insert_many(&self, table: &str, rows: &[Vec<(&str, Value)>]) -> SqlResult<u64> {
        let Some(first) = rows.first() else {
            return Err(SqlError::must_be_non_empty("insert_many needs at least one row"));
        };
        let columns: Vec<&str> = first.iter().map(|(c, _)| *c).collect();

        let mut params = Vec::with_capacity(columns.len() * rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let same_columns =
                row.len() == columns.len() && row.iter().zip(&columns).all(|((c, _), e)| c == e);
            if !same_columns {
                return Err(SqlError::query_construction(format!(
                    "row {idx} does not have the same columns as the first row"
                )));
            }
            for (column, value) in row {
                if !value.is_scalar() {
                    return Err(SqlError::must_be_one_dimensional(format!(
                        "row {idx}, column '{column}' holds a list"
                    )));
                }
                params.push(value.clone());
            }
        }

        let sql = self.build_insert_query(table, &columns, rows.len())?;
        self.log_sql(&sql, params.len());
        self.conn.execute(&sql, &params).await
    }

    /// `UPDATE <table> SET ... WHERE <conditions>`.
    ///
    /// A condition tree with no SQL fragments (empty, or only empty groups)
    /// updates nothing and returns `0` without touching the database.
    pub async fn update(
        &self,
        table: &str,
        changes: &[(&str, Value)],
        conditions: &Statement,
    ) -> SqlResult<u64> {
        if changes.is_empty() {
            return Err(SqlError::must_be_non_empty("UPDATE needs at least one column"));
        }
        if !conditions.has_conditions() {
            tracing::debug!(target: "safesql", table, "UPDATE without conditions skipped");
            return Ok(0);
        }
        let table = self.object_name(table)?;

        let mut assignments = Vec::with_capacity(changes.len());
        let mut params = Vec::with_capacity(changes.len());
        for (column, value) in changes {
            if !value.is_scalar() {
                return Err(SqlError::must_be_one_dimensional(format!(
                    "column '{column}' holds a list"
                )));
            }
            assignments.push(format!("{} = ?", self.object_name(column)?));
            params.push(value.clone());
        }

        let compiled = conditions.compile();
        ensure_one_dimensional(&compiled.values)?;
        params.extend(compiled.values);
        let sql = format!(
            "UPDATE {table} SET {} WHERE {}",
            assignments.join(", "),
            compiled.sql
        );
        self.log_sql(&sql, params.len());
        self.conn.execute(&sql, &params).await
    }

    /// `DELETE FROM <table> WHERE <conditions>`.
    ///
    /// A condition tree with no SQL fragments (empty, or only empty groups)
    /// deletes nothing and returns `0` without touching the database.
    pub async fn delete(&self, table: &str, conditions: &Statement) -> SqlResult<u64> {
        if !conditions.has_conditions() {
            tracing::debug!(target: "safesql", table, "DELETE without conditions skipped");
            return Ok(0);
        }
        let table = self.object_name(table)?;
        let compiled = conditions.compile();
        ensure_one_dimensional(&compiled.values)?;
        let sql = format!("DELETE FROM {table} WHERE {}", compiled.sql);
        self.log_sql(&sql, compiled.values.len());
        self.conn.execute(&sql, &compiled.values).await
    }
}
