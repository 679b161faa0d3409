//! School records used by the basic CRUD demonstration.

use super::{require_text, RowId, ValidationError};
use serde::{Deserialize, Serialize};

pub type StudentId = RowId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub age: u8,
    pub grade: String,
}

/// Insert model for [`Student`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
    pub age: u8,
    pub grade: String,
}

impl NewStudent {
    pub fn new(name: impl Into<String>, age: u8, grade: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age,
            grade: grade.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, None)?;
        require_text("grade", &self.grade, None)
    }
}

/// Partial update for [`Student`]. Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub age: Option<u8>,
    pub grade: Option<String>,
}

impl StudentPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.grade.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = self.name.as_deref() {
            require_text("name", name, None)?;
        }
        if let Some(grade) = self.grade.as_deref() {
            require_text("grade", grade, None)?;
        }
        Ok(())
    }
}
