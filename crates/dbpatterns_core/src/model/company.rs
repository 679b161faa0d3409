//! Company records queried through raw mapped SQL.

use super::{require_text, RowId, ValidationError};
use serde::{Deserialize, Serialize};

pub type EmployeeId = RowId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub department: String,
    pub salary: i64,
}

/// Insert model for [`Employee`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub name: String,
    pub department: String,
    pub salary: i64,
}

impl NewEmployee {
    pub fn new(name: impl Into<String>, department: impl Into<String>, salary: i64) -> Self {
        Self {
            name: name.into(),
            department: department.into(),
            salary,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, None)?;
        require_text("department", &self.department, None)?;
        if self.salary < 0 {
            return Err(ValidationError::OutOfRange {
                field: "salary",
                value: self.salary,
            });
        }
        Ok(())
    }
}
