//! Employee repository used to seed and inspect the company database.

use crate::model::company::{Employee, EmployeeId, NewEmployee};
use crate::model::EntityKind;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(crate) const EMPLOYEE_COLUMNS: &str = "id, name, department, salary";

pub trait EmployeeRepository {
    fn create_employee(&self, employee: &NewEmployee) -> RepoResult<EmployeeId>;
    fn get_employee(&self, id: EmployeeId) -> RepoResult<Employee>;
    fn list_employees(&self) -> RepoResult<Vec<Employee>>;
    fn count_employees(&self) -> RepoResult<i64>;
}

pub struct SqliteEmployeeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EmployeeRepository for SqliteEmployeeRepository<'_> {
    fn create_employee(&self, employee: &NewEmployee) -> RepoResult<EmployeeId> {
        employee.validate()?;
        self.conn.execute(
            "INSERT INTO employees (name, department, salary) VALUES (?1, ?2, ?3);",
            params![employee.name, employee.department, employee.salary],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_employee(&self, id: EmployeeId) -> RepoResult<Employee> {
        self.conn
            .query_row(
                &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1;"),
                [id],
                parse_employee_row,
            )
            .optional()?
            .ok_or(RepoError::NotFound {
                entity: EntityKind::Employee,
                id,
            })
    }

    fn list_employees(&self) -> RepoResult<Vec<Employee>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id ASC;"
        ))?;
        let employees = stmt
            .query_map([], parse_employee_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(employees)
    }

    fn count_employees(&self) -> RepoResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM employees;", [], |row| row.get(0))?;
        Ok(count)
    }
}

pub(crate) fn parse_employee_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get("id")?,
        name: row.get("name")?,
        department: row.get("department")?,
        salary: row.get("salary")?,
    })
}
