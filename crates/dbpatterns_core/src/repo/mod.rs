//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define CRUD contracts for blog, company and school records.
//! - Keep SQL details inside the persistence boundary.
//! - Classify backend failures into semantic errors.
//!
//! # Invariants
//! - Write paths validate input before any SQL mutation.
//! - Lookups by id return `NotFound` instead of an empty value.
//! - Constraint violations are surfaced unchanged as `Constraint`.

use crate::db::DbError;
use crate::model::{EntityKind, RowId, ValidationError};
use rusqlite::types::Value;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod blog_repo;
pub mod employee_repo;
pub mod student_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository and query error.
#[derive(Debug)]
pub enum RepoError {
    /// Backend failure without extra context.
    Db(DbError),
    /// Backend failure annotated with the operation that issued it.
    Query {
        context: &'static str,
        source: rusqlite::Error,
    },
    /// Lookup by id matched no row.
    NotFound { entity: EntityKind, id: RowId },
    /// A query that treats an empty result as exceptional returned no rows.
    NoRows(String),
    /// Referential-integrity, uniqueness or check constraint violation.
    Constraint(rusqlite::Error),
    /// Input rejected before persistence.
    Validation(ValidationError),
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl RepoError {
    /// Whether this error is one of the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoRows(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Query { context, source } => write!(f, "{context}: {source}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::NoRows(message) => write!(f, "no rows: {message}"),
            Self::Constraint(err) => write!(f, "constraint violation: {err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Query { source, .. } => Some(source),
            Self::Constraint(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } | Self::NoRows(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if is_constraint_violation(&value) {
            Self::Constraint(value)
        } else {
            Self::Db(DbError::Sqlite(value))
        }
    }
}

/// Adds operation context to raw backend results.
pub(crate) trait QueryContext<T> {
    fn context(self, context: &'static str) -> RepoResult<T>;
}

impl<T> QueryContext<T> for rusqlite::Result<T> {
    fn context(self, context: &'static str) -> RepoResult<T> {
        self.map_err(|source| {
            if is_constraint_violation(&source) {
                RepoError::Constraint(source)
            } else {
                RepoError::Query { context, source }
            }
        })
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _) if inner.code == ErrorCode::ConstraintViolation
    )
}

/// Appends `LIMIT`/`OFFSET` clauses the same way for every list query.
pub(crate) fn push_pagination(
    sql: &mut String,
    bind_values: &mut Vec<Value>,
    limit: Option<u32>,
    offset: u32,
) {
    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(offset)));
        }
    } else if offset > 0 {
        sql.push_str(" LIMIT -1 OFFSET ?");
        bind_values.push(Value::Integer(i64::from(offset)));
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryContext, RepoError};
    use crate::model::EntityKind;
    use rusqlite::Connection;

    #[test]
    fn unique_violation_is_classified_as_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();

        let err = conn
            .execute("INSERT INTO t VALUES ('a');", [])
            .context("insert duplicate")
            .unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)));
    }

    #[test]
    fn other_failures_keep_their_context() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn
            .execute("SELECT * FROM missing_table;", [])
            .context("read missing table")
            .unwrap_err();
        assert!(err.to_string().starts_with("read missing table: "));
    }

    #[test]
    fn not_found_variants_are_recognized() {
        let by_id = RepoError::NotFound {
            entity: EntityKind::Post,
            id: 7,
        };
        assert!(by_id.is_not_found());
        assert_eq!(by_id.to_string(), "post not found: 7");
        assert!(RepoError::NoRows("empty".to_string()).is_not_found());
        assert!(!RepoError::InvalidData("x".to_string()).is_not_found());
    }
}
