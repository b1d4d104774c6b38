//! Nestable AND/OR condition builder.
//!
//! A [`Statement`] is a tree of condition fragments. Each fragment is either SQL
//! text with its bound values, or a nested group that compiles to a
//! parenthesized sub-expression. Groups live in an arena owned by the root
//! statement and are addressed by [`GroupId`]; a cursor tracks which group new
//! conditions are appended to.
//!
//! # Example
//!
//! ```ignore
//! use safesql::{Statement, values};
//!
//! let mut stmt = Statement::open();
//! stmt.with("status = ?", values!["active"])?
//!     .and_in("role_id IN (?*)", values![1, 2, 3])?
//!     .or_group()
//!     .with("owner_id = ?", values![42])?
//!     .and_with("deleted_at IS NULL", values![])?
//!     .end_group()?;
//!
//! let compiled = stmt.compile();
//! assert_eq!(
//!     compiled.sql,
//!     "status = ? AND role_id IN (?, ?, ?) OR (owner_id = ? AND deleted_at IS NULL)"
//! );
//! assert_eq!(compiled.values.len(), 5);
//! # Ok::<(), safesql::SqlError>(())
//! ```

use crate::engine::Engine;
use crate::error::{SqlError, SqlResult};
use crate::escape::ensure_one_dimensional;
use crate::mask::{self, EXPANSION_MARKER};
use crate::value::Value;
use std::fmt;

/// SQL emitted by an empty statement or group.
pub const ALWAYS_TRUE: &str = "1";

/// SQL emitted for an opted-in empty IN list.
pub const ALWAYS_FALSE: &str = "1=0";

/// Logical connector between a fragment and the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    And,
    Or,
}

impl Joiner {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Joiner::And => "AND",
            Joiner::Or => "OR",
        }
    }
}

/// Handle to a group inside a [`Statement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

/// What a condition-append call receives: SQL text, or a separately built statement
/// to embed as a nested group.
#[derive(Debug, Clone)]
pub enum Condition {
    Sql(String),
    Group(Statement),
}

impl From<&str> for Condition {
    fn from(s: &str) -> Self {
        Condition::Sql(s.to_string())
    }
}

impl From<String> for Condition {
    fn from(s: String) -> Self {
        Condition::Sql(s)
    }
}

impl From<Statement> for Condition {
    fn from(stmt: Statement) -> Self {
        Condition::Group(stmt)
    }
}

impl TryFrom<Value> for Condition {
    type Error = SqlError;

    /// Only text values are conditions; used when conditions arrive as dynamic data.
    fn try_from(value: Value) -> SqlResult<Self> {
        match value {
            Value::Text(s) => Ok(Condition::Sql(s)),
            other => Err(SqlError::MustBeArrayOrSubtree(format!(
                "got a {} value",
                other.type_name()
            ))),
        }
    }
}

#[derive(Debug, Clone)]
enum Body {
    Sql { text: String, values: Vec<Value> },
    Group(GroupId),
}

#[derive(Debug, Clone)]
struct Fragment {
    joiner: Joiner,
    body: Body,
}

#[derive(Debug, Clone, Default)]
struct Group {
    parent: Option<GroupId>,
    fragments: Vec<Fragment>,
}

/// SQL text plus its positional values, ready for `execute(sql, values)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compiled {
    pub sql: String,
    pub values: Vec<Value>,
}

impl Compiled {
    /// The SQL with `?` rewritten to `$1, $2, ...`.
    pub fn numbered(&self) -> String {
        mask::number_placeholders(&self.sql)
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.values)
    }
}

/// A composable WHERE/HAVING/ON expression.
///
/// Construction is single-threaded through `&mut self`; once built, a statement
/// is plain data and [`compile`](Statement::compile) may be called repeatedly,
/// from any thread.
#[derive(Debug, Clone)]
#[must_use]
pub struct Statement {
    groups: Vec<Group>,
    current: GroupId,
    allow_empty_in: bool,
}

impl Default for Statement {
    fn default() -> Self {
        Self::open()
    }
}

impl Statement {
    /// Open a new root statement.
    pub fn open() -> Self {
        Self {
            groups: vec![Group::default()],
            current: GroupId(0),
            allow_empty_in: false,
        }
    }

    /// Let an empty IN list compile to an always-false fragment instead of failing.
    pub fn allow_empty_in(mut self, allow: bool) -> Self {
        self.allow_empty_in = allow;
        self
    }

    /// Whether empty IN lists degrade to an always-false fragment.
    pub fn allows_empty_in(&self) -> bool {
        self.allow_empty_in
    }

    // ==================== Navigation ====================

    /// The root group.
    pub fn root(&self) -> GroupId {
        GroupId(0)
    }

    /// The group new conditions are appended to.
    pub fn current(&self) -> GroupId {
        self.current
    }

    /// Parent of `id`, or `None` for the root (and for ids not from this statement).
    pub fn parent_of(&self, id: GroupId) -> Option<GroupId> {
        self.groups.get(id.0).and_then(|g| g.parent)
    }

    /// Move the cursor to an existing group.
    pub fn enter(&mut self, id: GroupId) -> SqlResult<&mut Self> {
        if id.0 >= self.groups.len() {
            return Err(SqlError::query_construction(format!(
                "group {} does not belong to this statement",
                id.0
            )));
        }
        self.current = id;
        Ok(self)
    }

    /// Open a nested group joined to the current group by `joiner`, and move the
    /// cursor into it.
    pub fn open_group(&mut self, joiner: Joiner) -> &mut Self {
        let child = GroupId(self.groups.len());
        self.groups.push(Group {
            parent: Some(self.current),
            fragments: Vec::new(),
        });
        self.push_fragment(joiner, Body::Group(child));
        self.current = child;
        self
    }

    /// Open an AND-joined group.
    pub fn group(&mut self) -> &mut Self {
        self.open_group(Joiner::And)
    }

    /// Open an AND-joined group.
    pub fn and_group(&mut self) -> &mut Self {
        self.open_group(Joiner::And)
    }

    /// Open an OR-joined group.
    pub fn or_group(&mut self) -> &mut Self {
        self.open_group(Joiner::Or)
    }

    /// Close the current group and move the cursor back to its parent.
    ///
    /// Fails with [`SqlError::NoParentGroup`] at the root.
    pub fn end_group(&mut self) -> SqlResult<&mut Self> {
        let parent = self.parent_of(self.current).ok_or(SqlError::NoParentGroup)?;
        self.current = parent;
        Ok(self)
    }

    /// Alias for [`end_group`](Statement::end_group).
    pub fn end(&mut self) -> SqlResult<&mut Self> {
        self.end_group()
    }

    // ==================== Conditions ====================

    /// Append an AND-joined condition.
    pub fn with(
        &mut self,
        condition: impl Into<Condition>,
        values: Vec<Value>,
    ) -> SqlResult<&mut Self> {
        self.append(Joiner::And, condition.into(), values)
    }

    /// Append an AND-joined condition.
    pub fn and_with(
        &mut self,
        condition: impl Into<Condition>,
        values: Vec<Value>,
    ) -> SqlResult<&mut Self> {
        self.append(Joiner::And, condition.into(), values)
    }

    /// Append an OR-joined condition.
    pub fn or_with(
        &mut self,
        condition: impl Into<Condition>,
        values: Vec<Value>,
    ) -> SqlResult<&mut Self> {
        self.append(Joiner::Or, condition.into(), values)
    }

    /// Append an AND-joined condition binding a single value.
    pub fn and_with_value(
        &mut self,
        condition: impl Into<Condition>,
        value: impl Into<Value>,
    ) -> SqlResult<&mut Self> {
        self.append(Joiner::And, condition.into(), vec![value.into()])
    }

    /// Append an OR-joined condition binding a single value.
    pub fn or_with_value(
        &mut self,
        condition: impl Into<Condition>,
        value: impl Into<Value>,
    ) -> SqlResult<&mut Self> {
        self.append(Joiner::Or, condition.into(), vec![value.into()])
    }

    /// Append an AND-joined IN condition; `text` must contain exactly one `?*`.
    pub fn and_in(&mut self, text: &str, values: Vec<Value>) -> SqlResult<&mut Self> {
        self.append_in(Joiner::And, text, values)
    }

    /// Append an OR-joined IN condition; `text` must contain exactly one `?*`.
    pub fn or_in(&mut self, text: &str, values: Vec<Value>) -> SqlResult<&mut Self> {
        self.append_in(Joiner::Or, text, values)
    }

    fn append(
        &mut self,
        joiner: Joiner,
        condition: Condition,
        values: Vec<Value>,
    ) -> SqlResult<&mut Self> {
        match condition {
            Condition::Sql(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(SqlError::must_be_non_empty("condition text"));
                }
                ensure_one_dimensional(&values)?;
                self.push_fragment(
                    joiner,
                    Body::Sql {
                        text: text.to_string(),
                        values,
                    },
                );
            }
            Condition::Group(sub) => {
                if !values.is_empty() {
                    return Err(SqlError::must_be_empty(format!(
                        "a nested statement carries its own values; got {} extra",
                        values.len()
                    )));
                }
                let id = self.graft(sub);
                self.push_fragment(joiner, Body::Group(id));
            }
        }
        Ok(self)
    }

    fn append_in(
        &mut self,
        joiner: Joiner,
        text: &str,
        values: Vec<Value>,
    ) -> SqlResult<&mut Self> {
        if values.is_empty() {
            if !self.allow_empty_in {
                return Err(SqlError::must_be_non_empty(format!(
                    "IN list for '{text}' has no values"
                )));
            }
            tracing::debug!(target: "safesql", condition = text, "empty IN list compiled as always-false");
            self.push_fragment(
                joiner,
                Body::Sql {
                    text: ALWAYS_FALSE.to_string(),
                    values: Vec::new(),
                },
            );
            return Ok(self);
        }

        let markers = text.matches(EXPANSION_MARKER).count();
        if markers != 1 {
            return Err(SqlError::query_construction(format!(
                "IN condition must contain exactly one {EXPANSION_MARKER} marker, found {markers}"
            )));
        }

        let expanded = mask::expand(text, [Value::List(values)])?;
        self.append(joiner, Condition::Sql(expanded.sql), expanded.values)
    }

    fn push_fragment(&mut self, joiner: Joiner, body: Body) {
        self.groups[self.current.0]
            .fragments
            .push(Fragment { joiner, body });
    }

    /// Move `sub`'s groups into this arena, re-parenting its root under the
    /// current group. Returns the new id of `sub`'s root.
    fn graft(&mut self, sub: Statement) -> GroupId {
        let offset = self.groups.len();
        let current = self.current;
        self.groups.extend(sub.groups.into_iter().map(|mut group| {
            group.parent = Some(group.parent.map_or(current, |p| GroupId(p.0 + offset)));
            for fragment in &mut group.fragments {
                if let Body::Group(id) = &mut fragment.body {
                    id.0 += offset;
                }
            }
            group
        }));
        GroupId(offset)
    }

    // ==================== Inspection ====================

    /// Number of fragments directly in the root group.
    pub fn len(&self) -> usize {
        self.groups[0].fragments.len()
    }

    /// `true` if nothing has been appended to the root group.
    pub fn is_empty(&self) -> bool {
        self.groups[0].fragments.is_empty()
    }

    /// `true` if some group reachable from the root holds SQL text.
    ///
    /// Unlike [`is_empty`](Statement::is_empty), a tree made only of empty groups
    /// has no conditions: it compiles to `(1)` and matches every row.
    pub fn has_conditions(&self) -> bool {
        self.group_has_conditions(self.root())
    }

    fn group_has_conditions(&self, id: GroupId) -> bool {
        self.groups[id.0].fragments.iter().any(|f| match &f.body {
            Body::Sql { .. } => true,
            Body::Group(child) => self.group_has_conditions(*child),
        })
    }

    // ==================== Compilation ====================

    /// Compile the whole tree into SQL text and its positional values.
    ///
    /// An empty statement compiles to `1` with no values. Placeholders are always
    /// `?`, whatever the engine; use [`compile_for`](Statement::compile_for) to get
    /// the placeholder style a specific driver expects.
    pub fn compile(&self) -> Compiled {
        let mut out = Compiled::default();
        self.compile_group(self.root(), &mut out);
        out
    }

    /// Compile for `engine`: PostgreSQL gets `$1, $2, ...`, every other engine `?`.
    pub fn compile_for(&self, engine: Engine) -> Compiled {
        let mut out = self.compile();
        if engine == Engine::Postgres {
            out.sql = out.numbered();
        }
        out
    }

    /// Compiled SQL text.
    pub fn sql(&self) -> String {
        self.compile().sql
    }

    /// Positional values, in placeholder order.
    pub fn values(&self) -> Vec<Value> {
        self.compile().values
    }

    fn compile_group(&self, id: GroupId, out: &mut Compiled) {
        let group = &self.groups[id.0];
        if group.fragments.is_empty() {
            out.sql.push_str(ALWAYS_TRUE);
            return;
        }

        for (i, fragment) in group.fragments.iter().enumerate() {
            if i > 0 {
                out.sql.push(' ');
                out.sql.push_str(fragment.joiner.as_sql());
                out.sql.push(' ');
            }
            match &fragment.body {
                Body::Sql { text, values } => {
                    out.sql.push_str(text);
                    out.values.extend(values.iter().cloned());
                }
                Body::Group(child) => {
                    out.sql.push('(');
                    self.compile_group(*child, out);
                    out.sql.push(')');
                }
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql())
    }
}
