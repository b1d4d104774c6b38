//! Handle configuration.
//!
//! [`DbConfig`] carries the engine tag and the runtime flags the [`Db`](crate::Db)
//! helpers obey. Build it in code, deserialize it, or read it from `SAFESQL_*`
//! environment variables.

use crate::engine::Engine;
use crate::error::{SqlError, SqlResult};
use serde::Deserialize;

/// Configuration for [`Db`](crate::Db).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Dialect used for identifier quoting, LIKE escaping and literal quoting.
    pub engine: Engine,
    /// Accept `table.column` identifiers in table/column arguments.
    pub allow_separators: bool,
    /// Let empty IN lists compile to an always-false fragment instead of failing.
    pub allow_empty_in: bool,
    /// Emit executed SQL at DEBUG instead of TRACE.
    pub log_sql: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            engine: Engine::Default,
            allow_separators: false,
            allow_empty_in: false,
            log_sql: false,
        }
    }
}

impl DbConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine.
    pub fn engine(mut self, engine: impl Into<Engine>) -> Self {
        self.engine = engine.into();
        self
    }

    /// Allow or reject dot-qualified identifiers.
    pub fn allow_separators(mut self, allow: bool) -> Self {
        self.allow_separators = allow;
        self
    }

    /// Allow empty IN lists to degrade to an always-false fragment.
    pub fn allow_empty_in(mut self, allow: bool) -> Self {
        self.allow_empty_in = allow;
        self
    }

    /// Log executed SQL at DEBUG.
    pub fn log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    /// Build a configuration from `SAFESQL_*` environment variables.
    ///
    /// - `SAFESQL_ENGINE`: driver name (`mysql`, `pgsql`, `sqlsrv`, ...)
    /// - `SAFESQL_ALLOW_SEPARATORS`, `SAFESQL_ALLOW_EMPTY_IN`, `SAFESQL_LOG_SQL`: booleans
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> SqlResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SqlResult<Self> {
        let mut config = Self::default();
        if let Some(engine) = lookup("SAFESQL_ENGINE") {
            config.engine = Engine::from(engine);
        }
        if let Some(v) = lookup("SAFESQL_ALLOW_SEPARATORS") {
            config.allow_separators = parse_bool("SAFESQL_ALLOW_SEPARATORS", &v)?;
        }
        if let Some(v) = lookup("SAFESQL_ALLOW_EMPTY_IN") {
            config.allow_empty_in = parse_bool("SAFESQL_ALLOW_EMPTY_IN", &v)?;
        }
        if let Some(v) = lookup("SAFESQL_LOG_SQL") {
            config.log_sql = parse_bool("SAFESQL_LOG_SQL", &v)?;
        }
        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> SqlResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(SqlError::Config(format!(
            "{key}: expected a boolean, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_reject_separators_and_empty_in() {
        let config = DbConfig::default();
        assert_eq!(config.engine, Engine::Default);
        assert!(!config.allow_separators);
        assert!(!config.allow_empty_in);
    }

    #[test]
    fn builder_setters() {
        let config = DbConfig::new()
            .engine("mysql")
            .allow_separators(true)
            .allow_empty_in(true)
            .log_sql(true);
        assert_eq!(config.engine, Engine::MySql);
        assert!(config.allow_separators && config.allow_empty_in && config.log_sql);
    }

    #[test]
    fn reads_environment_lookup() {
        let config = DbConfig::from_lookup(lookup(&[
            ("SAFESQL_ENGINE", "sqlsrv"),
            ("SAFESQL_ALLOW_SEPARATORS", "yes"),
        ]))
        .unwrap();
        assert_eq!(config.engine, Engine::MsSql);
        assert!(config.allow_separators);
        assert!(!config.allow_empty_in);
    }

    #[test]
    fn rejects_malformed_boolean() {
        let err = DbConfig::from_lookup(lookup(&[("SAFESQL_LOG_SQL", "maybe")])).unwrap_err();
        assert!(matches!(err, SqlError::Config(_)));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: DbConfig =
            serde_json::from_str(r#"{"engine": "pgsql", "allow_empty_in": true}"#).unwrap();
        assert_eq!(config.engine, Engine::Postgres);
        assert!(config.allow_empty_in);
        assert!(!config.allow_separators);
    }
}
