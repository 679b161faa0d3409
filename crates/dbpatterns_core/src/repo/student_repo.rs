//! Student repository: plain CRUD with filtered bulk mutations.
//!
//! # Invariants
//! - Bulk update and bulk delete refuse to run without a filter.
//! - Single-row update and delete return `NotFound` for a missing id.

use crate::model::school::{NewStudent, Student, StudentId, StudentPatch};
use crate::model::{EntityKind, ValidationError};
use crate::repo::{RepoError, RepoResult};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const STUDENT_SELECT_SQL: &str = "SELECT id, name, age, grade FROM students";

/// Row filter shared by list, bulk update and bulk delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentQuery {
    /// Exact name match.
    pub name: Option<String>,
    /// Strictly greater than.
    pub older_than: Option<u8>,
    /// Strictly less than.
    pub younger_than: Option<u8>,
}

impl StudentQuery {
    pub fn is_unfiltered(&self) -> bool {
        self.name.is_none() && self.older_than.is_none() && self.younger_than.is_none()
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut sql = String::from(" WHERE 1 = 1");
        let mut bind_values = Vec::new();
        if let Some(name) = self.name.as_ref() {
            sql.push_str(" AND name = ?");
            bind_values.push(Value::Text(name.clone()));
        }
        if let Some(age) = self.older_than {
            sql.push_str(" AND age > ?");
            bind_values.push(Value::Integer(i64::from(age)));
        }
        if let Some(age) = self.younger_than {
            sql.push_str(" AND age < ?");
            bind_values.push(Value::Integer(i64::from(age)));
        }
        (sql, bind_values)
    }
}

pub trait StudentRepository {
    fn create_student(&self, student: &NewStudent) -> RepoResult<StudentId>;
    fn get_student(&self, id: StudentId) -> RepoResult<Student>;
    fn list_students(&self, query: &StudentQuery) -> RepoResult<Vec<Student>>;
    fn update_student(&self, id: StudentId, patch: &StudentPatch) -> RepoResult<()>;
    /// Applies `patch` to every matching row and returns the row count.
    fn update_students(&self, query: &StudentQuery, patch: &StudentPatch) -> RepoResult<usize>;
    fn delete_student(&self, id: StudentId) -> RepoResult<()>;
    /// Deletes every matching row and returns the row count.
    fn delete_students(&self, query: &StudentQuery) -> RepoResult<usize>;
}

pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn create_student(&self, student: &NewStudent) -> RepoResult<StudentId> {
        student.validate()?;
        self.conn.execute(
            "INSERT INTO students (name, age, grade) VALUES (?1, ?2, ?3);",
            params![student.name, student.age, student.grade],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_student(&self, id: StudentId) -> RepoResult<Student> {
        self.conn
            .query_row(
                &format!("{STUDENT_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_student_row,
            )
            .optional()?
            .ok_or(RepoError::NotFound {
                entity: EntityKind::Student,
                id,
            })
    }

    fn list_students(&self, query: &StudentQuery) -> RepoResult<Vec<Student>> {
        let (where_sql, bind_values) = query.where_clause();
        let mut stmt = self
            .conn
            .prepare(&format!("{STUDENT_SELECT_SQL}{where_sql} ORDER BY id ASC;"))?;
        let students = stmt
            .query_map(params_from_iter(bind_values), parse_student_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(students)
    }

    fn update_student(&self, id: StudentId, patch: &StudentPatch) -> RepoResult<()> {
        patch.validate()?;
        if patch.is_empty() {
            return self.get_student(id).map(|_| ());
        }

        let (set_sql, mut bind_values) = set_clause(patch);
        bind_values.push(Value::Integer(id));
        let changed = self.conn.execute(
            &format!("UPDATE students SET {set_sql} WHERE id = ?;"),
            params_from_iter(bind_values),
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Student,
                id,
            });
        }
        Ok(())
    }

    fn update_students(&self, query: &StudentQuery, patch: &StudentPatch) -> RepoResult<usize> {
        if query.is_unfiltered() {
            return Err(ValidationError::MissingFilter("bulk student update").into());
        }
        patch.validate()?;
        if patch.is_empty() {
            return Ok(0);
        }

        let (set_sql, mut bind_values) = set_clause(patch);
        let (where_sql, where_values) = query.where_clause();
        bind_values.extend(where_values);
        let changed = self.conn.execute(
            &format!("UPDATE students SET {set_sql}{where_sql};"),
            params_from_iter(bind_values),
        )?;
        info!("event=students_updated module=repo status=ok rows={changed}");
        Ok(changed)
    }

    fn delete_student(&self, id: StudentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM students WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Student,
                id,
            });
        }
        Ok(())
    }

    fn delete_students(&self, query: &StudentQuery) -> RepoResult<usize> {
        if query.is_unfiltered() {
            return Err(ValidationError::MissingFilter("bulk student delete").into());
        }

        let (where_sql, bind_values) = query.where_clause();
        let changed = self.conn.execute(
            &format!("DELETE FROM students{where_sql};"),
            params_from_iter(bind_values),
        )?;
        info!("event=students_deleted module=repo status=ok rows={changed}");
        Ok(changed)
    }
}

fn set_clause(patch: &StudentPatch) -> (String, Vec<Value>) {
    let mut columns = Vec::new();
    let mut bind_values = Vec::new();
    if let Some(name) = patch.name.as_ref() {
        columns.push("name = ?");
        bind_values.push(Value::Text(name.clone()));
    }
    if let Some(age) = patch.age {
        columns.push("age = ?");
        bind_values.push(Value::Integer(i64::from(age)));
    }
    if let Some(grade) = patch.grade.as_ref() {
        columns.push("grade = ?");
        bind_values.push(Value::Text(grade.clone()));
    }
    (columns.join(", "), bind_values)
}

fn parse_student_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get("id")?,
        name: row.get("name")?,
        age: row.get("age")?,
        grade: row.get("grade")?,
    })
}
