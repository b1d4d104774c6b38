//! The database client collaborator.
//!
//! safesql never talks to a database itself. Anything that can run SQL with
//! `?` placeholders and positional [`Value`]s implements [`Connection`], and
//! [`Db`](crate::Db) layers the escaping and query-building helpers on top.

use crate::engine::Engine;
use crate::error::SqlResult;
use crate::value::Value;

/// A trait over database clients.
///
/// SQL handed to implementations always uses `?` placeholders, one per element
/// of `params`, in order. Drivers with another placeholder style rewrite it
/// (see [`number_placeholders`](crate::mask::number_placeholders)).
pub trait Connection: Send + Sync {
    /// Row type returned by queries.
    type Row: Send;

    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = SqlResult<Vec<Self::Row>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = SqlResult<u64>> + Send;

    /// Quote `value` as a string literal.
    ///
    /// The default implementation uses the engine's standard quoting rules.
    fn quote(&self, engine: Engine, value: &str) -> String {
        engine.quote_literal(value)
    }
}

#[cfg(feature = "postgres")]
mod pg {
    use super::Connection;
    use crate::error::SqlResult;
    use crate::mask::number_placeholders;
    use crate::value::Value;
    use tokio_postgres::Row;
    use tokio_postgres::types::ToSql;

    fn param_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
        params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }

    impl Connection for tokio_postgres::Client {
        type Row = Row;

        async fn query(&self, sql: &str, params: &[Value]) -> SqlResult<Vec<Row>> {
            let sql = number_placeholders(sql);
            Ok(tokio_postgres::Client::query(self, sql.as_str(), &param_refs(params)).await?)
        }

        async fn execute(&self, sql: &str, params: &[Value]) -> SqlResult<u64> {
            let sql = number_placeholders(sql);
            Ok(tokio_postgres::Client::execute(self, sql.as_str(), &param_refs(params)).await?)
        }
    }

    impl Connection for tokio_postgres::Transaction<'_> {
        type Row = Row;

        async fn query(&self, sql: &str, params: &[Value]) -> SqlResult<Vec<Row>> {
            let sql = number_placeholders(sql);
            Ok(tokio_postgres::Transaction::query(self, sql.as_str(), &param_refs(params)).await?)
        }

        async fn execute(&self, sql: &str, params: &[Value]) -> SqlResult<u64> {
            let sql = number_placeholders(sql);
            Ok(tokio_postgres::Transaction::execute(self, sql.as_str(), &param_refs(params)).await?)
        }
    }
}
