//! Value escaping: LIKE patterns and literal value sets.

use crate::engine::Engine;
use crate::error::{SqlError, SqlResult};
use crate::value::Value;
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

/// Subexpression that selects no rows; stands in for an empty or untyped value set.
pub const EMPTY_VALUE_SET: &str = "(SELECT 1 WHERE FALSE)";

/// Driver-correct string literal quoting, supplied by the database client.
pub trait Quote {
    fn quote(&self, value: &str) -> String;
}

impl Quote for Engine {
    fn quote(&self, value: &str) -> String {
        self.quote_literal(value)
    }
}

impl<F> Quote for F
where
    F: Fn(&str) -> String,
{
    fn quote(&self, value: &str) -> String {
        self(value)
    }
}

/// Escape `%`, `_` and `\` (plus `[` and `]` for MSSQL) so `raw` matches literally
/// inside a LIKE pattern.
///
/// ```ignore
/// assert_eq!(escape_like_value("%mix_ed", Engine::MySql), "\\%mix\\_ed");
/// ```
pub fn escape_like_value(raw: &str, engine: Engine) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    for ch in raw.chars() {
        let special = match ch {
            '%' | '_' | '\\' => true,
            '[' | ']' => engine == Engine::MsSql,
            _ => false,
        };
        if special {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Declared element type of a value set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetType {
    Int,
    Float,
    Decimal,
    Number,
    Numeric,
    String,
}

impl SetType {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, SetType::String)
    }
}

impl FromStr for SetType {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int" => Ok(SetType::Int),
            "float" => Ok(SetType::Float),
            "decimal" => Ok(SetType::Decimal),
            "number" => Ok(SetType::Number),
            "numeric" => Ok(SetType::Numeric),
            "string" => Ok(SetType::String),
            other => Err(SqlError::invalid_value(format!(
                "unknown value set type '{other}'"
            ))),
        }
    }
}

/// Fail with [`SqlError::MustBeOneDimensionalArray`] if any element is composite.
pub fn ensure_one_dimensional(values: &[Value]) -> SqlResult<()> {
    match values.iter().position(|v| !v.is_scalar()) {
        Some(idx) => Err(SqlError::must_be_one_dimensional(format!(
            "element {idx} is a list; only scalar values are allowed"
        ))),
        None => Ok(()),
    }
}

fn integer_regex() -> &'static Regex {
    static INT_RE: OnceLock<Regex> = OnceLock::new();
    INT_RE.get_or_init(|| Regex::new(r"^-?[0-9]+$").expect("invalid built-in integer regex"))
}

fn number_regex() -> &'static Regex {
    static NUM_RE: OnceLock<Regex> = OnceLock::new();
    NUM_RE.get_or_init(|| {
        Regex::new(r"^-?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?$")
            .expect("invalid built-in number regex")
    })
}

fn numeric_literal(value: &Value, ty: SetType) -> SqlResult<String> {
    let literal = match (value, ty) {
        (Value::Int(i), _) => Some(i.to_string()),
        (Value::Float(f), t) if t != SetType::Int && f.is_finite() => Some(f.to_string()),
        (Value::Text(s), SetType::Int) => integer_regex().is_match(s).then(|| s.clone()),
        (Value::Text(s), _) => number_regex().is_match(s).then(|| s.clone()),
        _ => None,
    };
    literal.ok_or_else(|| {
        SqlError::invalid_value(format!(
            "{} value {:?} is not a valid {:?} literal",
            value.type_name(),
            value,
            ty
        ))
    })
}

fn string_literal(value: &Value, quoter: &impl Quote) -> SqlResult<String> {
    match value {
        Value::Int(i) => Ok(quoter.quote(&i.to_string())),
        Value::Float(f) => Ok(quoter.quote(&f.to_string())),
        Value::Text(s) => Ok(quoter.quote(s)),
        other => Err(SqlError::invalid_value(format!(
            "{} value cannot be quoted as a string",
            other.type_name()
        ))),
    }
}

/// Render `values` as a parenthesized literal list for `IN (...)`-style set expressions.
///
/// An empty list, or a `declared_type` outside `int`, `float`, `decimal`, `number`,
/// `numeric`, `string`, yields [`EMPTY_VALUE_SET`].
pub fn escape_value_set(
    values: &[Value],
    declared_type: &str,
    quoter: &impl Quote,
) -> SqlResult<String> {
    ensure_one_dimensional(values)?;
    let ty = match declared_type.parse::<SetType>() {
        Ok(ty) if !values.is_empty() => ty,
        _ => return Ok(EMPTY_VALUE_SET.to_string()),
    };

    let literals = values
        .iter()
        .map(|v| {
            if ty.is_numeric() {
                numeric_literal(v, ty)
            } else {
                string_literal(v, quoter)
            }
        })
        .collect::<SqlResult<Vec<_>>>()?;

    Ok(format!("({})", literals.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values;

    #[test]
    fn like_escapes_wildcards() {
        assert_eq!(escape_like_value("%mix_ed", Engine::MySql), "\\%mix\\_ed");
        assert_eq!(escape_like_value("a\\b", Engine::Postgres), "a\\\\b");
        assert_eq!(escape_like_value("plain", Engine::Default), "plain");
    }

    #[test]
    fn like_does_not_double_escape() {
        assert_eq!(escape_like_value("\\%", Engine::MySql), "\\\\\\%");
    }

    #[test]
    fn like_escapes_brackets_only_for_mssql() {
        assert_eq!(escape_like_value("[range]", Engine::MsSql), "\\[range\\]");
        assert_eq!(escape_like_value("[range]", Engine::MySql), "[range]");
    }

    #[test]
    fn empty_set_is_neutral() {
        assert_eq!(
            escape_value_set(&[], "int", &Engine::MySql).unwrap(),
            "(SELECT 1 WHERE FALSE)"
        );
    }

    #[test]
    fn unknown_type_is_neutral() {
        assert_eq!(
            escape_value_set(&values![1, 2], "blob", &Engine::MySql).unwrap(),
            EMPTY_VALUE_SET
        );
    }

    #[test]
    fn string_set_quotes_each_value() {
        assert_eq!(
            escape_value_set(&values![1, 2, 3, 5], "string", &Engine::Postgres).unwrap(),
            "('1', '2', '3', '5')"
        );
        assert_eq!(
            escape_value_set(&values!["o'neil"], "string", &Engine::Sqlite).unwrap(),
            "('o''neil')"
        );
    }

    #[test]
    fn string_set_rejects_bool_and_null() {
        assert!(escape_value_set(&values![true], "string", &Engine::MySql).is_err());
        assert!(escape_value_set(&[Value::Null], "string", &Engine::MySql).is_err());
    }

    #[test]
    fn numeric_set_emits_bare_numerals() {
        assert_eq!(
            escape_value_set(&values![1, "2", -3], "int", &Engine::MySql).unwrap(),
            "(1, 2, -3)"
        );
        assert_eq!(
            escape_value_set(&values![1.5, "2.25", 3], "decimal", &Engine::MySql).unwrap(),
            "(1.5, 2.25, 3)"
        );
    }

    #[test]
    fn numeric_set_rejects_non_numeric() {
        assert!(escape_value_set(&values![1, "1foo"], "int", &Engine::MySql).is_err());
        assert!(escape_value_set(&values![true], "number", &Engine::MySql).is_err());
        assert!(escape_value_set(&[Value::Null], "numeric", &Engine::MySql).is_err());
        assert!(escape_value_set(&values![1.5], "int", &Engine::MySql).is_err());
        assert!(escape_value_set(&values![f64::NAN], "float", &Engine::MySql).is_err());
    }

    #[test]
    fn nested_lists_are_rejected() {
        let err =
            escape_value_set(&values![1, vec![2, 3]], "int", &Engine::MySql).unwrap_err();
        assert!(matches!(err, SqlError::MustBeOneDimensionalArray(_)));
    }

    #[test]
    fn closure_quoter() {
        let quoter = |s: &str| format!("<{s}>");
        assert_eq!(
            escape_value_set(&values!["a", "b"], "string", &quoter).unwrap(),
            "(<a>, <b>)"
        );
    }
}
