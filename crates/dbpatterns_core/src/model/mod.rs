//! Domain records for the blog, company and school demonstrations.
//!
//! # Responsibility
//! - Define persisted records, insert models and partial-update patches.
//! - Validate caller input before it reaches SQL.
//!
//! # Invariants
//! - Insert and patch models never carry derived fields
//!   (`article_count`, `comment_status`).
//! - Every persisted record is identified by an integer row id.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod blog;
pub mod company;
pub mod school;

/// Integer row identity shared by every table.
pub type RowId = i64;

/// Entity kinds, used for error reporting and hook dispatch logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Post,
    Comment,
    Employee,
    Student,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Post => "post",
            Self::Comment => "comment",
            Self::Employee => "employee",
            Self::Student => "student",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input rejected before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty after trim.
    Blank(&'static str),
    /// Field exceeds its maximum character length.
    TooLong { field: &'static str, max_chars: usize },
    /// Email does not look like an address.
    InvalidEmail(String),
    /// Numeric field is outside its allowed range.
    OutOfRange { field: &'static str, value: i64 },
    /// Bulk mutation without any filter.
    MissingFilter(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank(field) => write!(f, "`{field}` must not be blank"),
            Self::TooLong { field, max_chars } => {
                write!(f, "`{field}` must be at most {max_chars} characters")
            }
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::OutOfRange { field, value } => write!(f, "`{field}` out of range: {value}"),
            Self::MissingFilter(operation) => {
                write!(f, "{operation} requires at least one filter")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max_chars: Option<usize>,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank(field));
    }
    if let Some(max_chars) = max_chars {
        if value.chars().count() > max_chars {
            return Err(ValidationError::TooLong { field, max_chars });
        }
    }
    Ok(())
}
