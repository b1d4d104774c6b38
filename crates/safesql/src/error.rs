//! Error types for safesql

use thiserror::Error;

/// Result type alias for safesql operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Discriminates the two identifier failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierErrorKind {
    /// Empty, starts with a non-letter, or contains a disallowed character.
    Invalid,
    /// More than one `.` separator.
    TooManyParts,
}

/// Error types for query construction, escaping and execution.
#[derive(Debug, Error)]
pub enum SqlError {
    /// Identifier failed validation
    #[error("Invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    /// Qualified identifier with more than one separator
    #[error("Too many parts in identifier: '{0}'")]
    TooManyParts(String),

    /// A list that must contain at least one element was empty
    #[error("Must be non-empty: {0}")]
    MustBeNonEmpty(String),

    /// Extra values were supplied where none are accepted
    #[error("Must be empty: {0}")]
    MustBeEmpty(String),

    /// A condition was neither SQL text nor a nested statement
    #[error("Must be SQL text or a nested statement: {0}")]
    MustBeArrayOrSubtree(String),

    /// A composite value appeared where only scalars are allowed
    #[error("Must be a one-dimensional array: {0}")]
    MustBeOneDimensionalArray(String),

    /// Malformed mask or statement handed to the execution layer
    #[error("Query construction error: {0}")]
    QueryConstruction(String),

    /// `end_group` called on a root statement
    #[error("Cannot end group: statement has no parent group")]
    NoParentGroup,

    /// Value of the wrong shape for a declared value-set type
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Error reported by the wrapped database client
    #[error("Client error: {0}")]
    Client(String),

    /// Malformed configuration
    #[error("Config error: {0}")]
    Config(String),

    /// tokio-postgres error
    #[cfg(feature = "postgres")]
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

impl SqlError {
    /// Create an invalid identifier error
    pub fn invalid_identifier(ident: impl Into<String>) -> Self {
        Self::InvalidIdentifier(ident.into())
    }

    /// Create a too-many-parts error
    pub fn too_many_parts(ident: impl Into<String>) -> Self {
        Self::TooManyParts(ident.into())
    }

    /// Create a must-be-non-empty error
    pub fn must_be_non_empty(message: impl Into<String>) -> Self {
        Self::MustBeNonEmpty(message.into())
    }

    /// Create a must-be-empty error
    pub fn must_be_empty(message: impl Into<String>) -> Self {
        Self::MustBeEmpty(message.into())
    }

    /// Create a one-dimensional array violation
    pub fn must_be_one_dimensional(message: impl Into<String>) -> Self {
        Self::MustBeOneDimensionalArray(message.into())
    }

    /// Create a query construction error
    pub fn query_construction(message: impl Into<String>) -> Self {
        Self::QueryConstruction(message.into())
    }

    /// Create an invalid value error
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue(message.into())
    }

    /// Create a client error
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client(message.into())
    }

    /// Which identifier check failed, if this is an identifier error.
    pub fn identifier_kind(&self) -> Option<IdentifierErrorKind> {
        match self {
            Self::InvalidIdentifier(_) => Some(IdentifierErrorKind::Invalid),
            Self::TooManyParts(_) => Some(IdentifierErrorKind::TooManyParts),
            _ => None,
        }
    }

    /// Check if this is an identifier error of either kind
    pub fn is_identifier_error(&self) -> bool {
        self.identifier_kind().is_some()
    }

    /// Check if this is a must-be-non-empty error
    pub fn is_must_be_non_empty(&self) -> bool {
        matches!(self, Self::MustBeNonEmpty(_))
    }

    /// Check if this is a query construction error
    pub fn is_query_construction(&self) -> bool {
        matches!(self, Self::QueryConstruction(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_kind_discriminates() {
        assert_eq!(
            SqlError::invalid_identifier("1abc").identifier_kind(),
            Some(IdentifierErrorKind::Invalid)
        );
        assert_eq!(
            SqlError::too_many_parts("a.b.c").identifier_kind(),
            Some(IdentifierErrorKind::TooManyParts)
        );
        assert_eq!(SqlError::NoParentGroup.identifier_kind(), None);
    }

    #[test]
    fn messages_carry_offending_input() {
        let err = SqlError::invalid_identifier("bad name");
        assert_eq!(err.to_string(), "Invalid identifier: 'bad name'");
    }
}
