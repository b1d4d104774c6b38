//! Bound parameter values.
//!
//! [`Value`] is what flows through masks, condition fragments and the
//! positional parameter list handed to a [`Connection`](crate::Connection).
//! `List` exists so array arguments (for `?*` expansion) and composite inputs
//! can be represented and rejected where only scalars are allowed.

use crate::error::{SqlError, SqlResult};
use serde::{Deserialize, Serialize};

/// A scalar SQL value, or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Array argument; never bound directly.
    List(Vec<Value>),
}

impl Value {
    /// `true` for everything except [`Value::List`].
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::List(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "string",
            Value::List(_) => "list",
        }
    }
}

/// Build a `Vec<Value>` from heterogeneous expressions.
///
/// ```ignore
/// let vals = safesql::values![1, "alice", 2.5, None::<i32>];
/// ```
#[macro_export]
macro_rules! values {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($v:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($v)),+]
    };
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = SqlError;

    /// JSON objects have no positional representation and are rejected.
    fn try_from(v: serde_json::Value) -> SqlResult<Self> {
        Ok(match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().ok_or_else(|| {
                    SqlError::invalid_value(format!("number {n} is not representable"))
                })?),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<SqlResult<Vec<_>>>()?,
            ),
            serde_json::Value::Object(_) => {
                return Err(SqlError::invalid_value(
                    "JSON objects cannot be bound as SQL values",
                ));
            }
        })
    }
}

#[cfg(feature = "postgres")]
mod pg {
    use super::Value;
    use bytes::BytesMut;
    use std::error::Error;
    use tokio_postgres::types::{IsNull, Kind, ToSql, Type, to_sql_checked};

    type BoxError = Box<dyn Error + Sync + Send>;

    /// `i` as a float with `mantissa` significant bits, if it converts exactly.
    fn exact_float(i: i64, mantissa: u32) -> Result<f64, BoxError> {
        if i.unsigned_abs() > 1u64 << mantissa {
            return Err(format!("integer {i} cannot be represented exactly as a float").into());
        }
        Ok(i as f64)
    }

    impl ToSql for Value {
        fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
            match self {
                Value::Null => Ok(IsNull::Yes),
                Value::Bool(b) => b.to_sql(ty, out),
                Value::Int(i) => match *ty {
                    Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                    Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                    Type::FLOAT4 => (exact_float(*i, f32::MANTISSA_DIGITS)? as f32).to_sql(ty, out),
                    Type::FLOAT8 => exact_float(*i, f64::MANTISSA_DIGITS)?.to_sql(ty, out),
                    Type::TEXT | Type::VARCHAR | Type::BPCHAR => i.to_string().to_sql(ty, out),
                    _ => i.to_sql(ty, out),
                },
                Value::Float(f) => match *ty {
                    Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                    _ => f.to_sql(ty, out),
                },
                Value::Text(s) => s.to_sql(ty, out),
                Value::List(items) => match ty.kind() {
                    Kind::Array(_) => items.to_sql(ty, out),
                    _ => Err(format!("a list cannot be bound to a {ty} parameter").into()),
                },
            }
        }

        // Dispatch happens on the runtime variant in `to_sql`.
        fn accepts(_ty: &Type) -> bool {
            true
        }

        to_sql_checked!();
    }
}


#[cfg(all(test, feature = "postgres"))]
mod pg_tests {
    use super::*;
    use bytes::BytesMut;
    use tokio_postgres::types::{ToSql, Type};

    #[test]
    fn list_binds_only_to_array_types() {
        let list = Value::from(vec![1, 2]);
        let mut buf = BytesMut::new();
        assert!(list.to_sql_checked(&Type::INT8, &mut buf).is_err());

        let mut buf = BytesMut::new();
        assert!(list.to_sql_checked(&Type::INT8_ARRAY, &mut buf).is_ok());
    }

    #[test]
    fn int_to_float_must_be_exact() {
        let mut buf = BytesMut::new();
        assert!(Value::Int(1 << 20).to_sql_checked(&Type::FLOAT4, &mut buf).is_ok());

        let mut buf = BytesMut::new();
        assert!(Value::Int((1 << 24) + 1).to_sql_checked(&Type::FLOAT4, &mut buf).is_err());

        let mut buf = BytesMut::new();
        assert!(Value::Int(i64::MAX).to_sql_checked(&Type::FLOAT8, &mut buf).is_err());

        let mut buf = BytesMut::new();
        assert!(Value::Int(-(1 << 53)).to_sql_checked(&Type::FLOAT8, &mut buf).is_ok());
    }

    #[test]
    fn narrowing_ints_are_checked() {
        let mut buf = BytesMut::new();
        assert!(Value::Int(70_000).to_sql_checked(&Type::INT2, &mut buf).is_err());
    }
}
