//! Placeholder masks.
//!
//! A mask is SQL text containing scalar placeholders (`?`) and array-expansion
//! markers (`?*`). [`expand`] walks the supplied arguments left to right: scalars
//! are bound as-is, and each array argument consumes the next `?*` marker,
//! which is replaced by one `?` per element.
//!
//! ```ignore
//! let e = expand("id IN (?*) AND status = ?", values![vec![1, 2, 3], "active"])?;
//! assert_eq!(e.sql, "id IN (?, ?, ?) AND status = ?");
//! assert_eq!(e.values.len(), 4);
//! ```

use crate::escape::ensure_one_dimensional;
use crate::error::{SqlError, SqlResult};
use crate::value::Value;

/// Array-expansion marker.
pub const EXPANSION_MARKER: &str = "?*";

/// Result of expanding a mask.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expanded {
    pub sql: String,
    pub values: Vec<Value>,
}

/// `?, ?, ..., ?` with `count` placeholders.
pub fn placeholder_list(count: usize) -> String {
    let mut s = String::with_capacity(count * 3);
    for i in 0..count {
        if i > 0 {
            s.push_str(", ");
        }
        s.push('?');
    }
    s
}

/// Expand every array argument into its `?*` marker and flatten the values.
///
/// Fails with [`SqlError::QueryConstruction`] when an array argument finds no
/// remaining marker, [`SqlError::MustBeNonEmpty`] for an empty array, and
/// [`SqlError::MustBeOneDimensionalArray`] when an array holds another array.
pub fn expand(mask: &str, args: impl IntoIterator<Item = Value>) -> SqlResult<Expanded> {
    let mut sql = String::with_capacity(mask.len());
    let mut values = Vec::new();
    let mut rest = mask;

    for (idx, arg) in args.into_iter().enumerate() {
        match arg {
            Value::List(items) => {
                let Some(pos) = rest.find(EXPANSION_MARKER) else {
                    tracing::debug!(target: "safesql", mask, arg = idx, "mask lacks an expansion marker");
                    return Err(SqlError::query_construction(format!(
                        "mask lacks an expansion marker (?*) for array argument {idx}"
                    )));
                };
                if items.is_empty() {
                    return Err(SqlError::must_be_non_empty(format!(
                        "array argument {idx} must contain at least one value"
                    )));
                }
                ensure_one_dimensional(&items)?;

                sql.push_str(&rest[..pos]);
                sql.push_str(&placeholder_list(items.len()));
                rest = &rest[pos + EXPANSION_MARKER.len()..];
                values.extend(items);
            }
            scalar => values.push(scalar),
        }
    }
    sql.push_str(rest);

    Ok(Expanded { sql, values })
}

/// Rewrite `?` placeholders as `$1, $2, ...`, leaving quoted literals and
/// identifiers untouched. Returns the rewritten SQL and the placeholder count.
fn rewrite_placeholders(sql: &str) -> (String, usize) {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut count = 0;
    let mut quote: Option<char> = None;

    for ch in sql.chars() {
        match quote {
            Some(q) => {
                // A doubled quote closes and immediately reopens, which is equivalent.
                if ch == q {
                    quote = None;
                }
                out.push(ch);
            }
            None => match ch {
                '\'' | '"' | '`' => {
                    quote = Some(ch);
                    out.push(ch);
                }
                '?' => {
                    count += 1;
                    out.push('$');
                    out.push_str(&count.to_string());
                }
                c => out.push(c),
            },
        }
    }

    (out, count)
}

/// Number of `?` placeholders outside quoted literals.
pub fn count_placeholders(sql: &str) -> usize {
    rewrite_placeholders(sql).1
}

/// Rewrite `?` placeholders to PostgreSQL's `$n` style.
pub fn number_placeholders(sql: &str) -> String {
    rewrite_placeholders(sql).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values;

    #[test]
    fn scalars_leave_mask_untouched() {
        let e = expand("a = ? AND b = ?", values![1, "x"]).unwrap();
        assert_eq!(e.sql, "a = ? AND b = ?");
        assert_eq!(e.values, values![1, "x"]);
    }

    #[test]
    fn array_expands_marker() {
        let e = expand("role_id IN (?*)", values![vec![1, 2, 3]]).unwrap();
        assert_eq!(e.sql, "role_id IN (?, ?, ?)");
        assert_eq!(e.values, values![1, 2, 3]);
    }

    #[test]
    fn arrays_consume_markers_left_to_right() {
        let e = expand(
            "a IN (?*) AND b = ? AND c IN (?*)",
            values![vec!["x", "y"], 7, vec![9]],
        )
        .unwrap();
        assert_eq!(e.sql, "a IN (?, ?) AND b = ? AND c IN (?)");
        assert_eq!(e.values, values!["x", "y", 7, 9]);
    }

    #[test]
    fn missing_marker_is_query_construction_error() {
        let err = expand("a IN (?)", values![vec![1, 2]]).unwrap_err();
        assert!(err.is_query_construction());

        let err = expand("a IN (?*)", values![vec![1], vec![2]]).unwrap_err();
        assert!(err.is_query_construction());
    }

    #[test]
    fn empty_array_must_be_non_empty() {
        let err = expand("a IN (?*)", vec![Value::List(vec![])]).unwrap_err();
        assert!(err.is_must_be_non_empty());
    }

    #[test]
    fn nested_array_rejected() {
        let nested = Value::List(vec![Value::List(vec![Value::Int(1)])]);
        let err = expand("a IN (?*)", vec![nested]).unwrap_err();
        assert!(matches!(err, SqlError::MustBeOneDimensionalArray(_)));
    }

    #[test]
    fn placeholder_list_renders_commas() {
        assert_eq!(placeholder_list(0), "");
        assert_eq!(placeholder_list(1), "?");
        assert_eq!(placeholder_list(3), "?, ?, ?");
    }

    #[test]
    fn numbering_skips_quoted_text() {
        assert_eq!(
            number_placeholders("a = ? AND b = '?' AND \"c?\" = ?"),
            "a = $1 AND b = '?' AND \"c?\" = $2"
        );
        assert_eq!(count_placeholders("x = 'it''s ?' OR y = ?"), 1);
    }
}
