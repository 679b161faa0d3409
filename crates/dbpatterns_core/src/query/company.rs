//! Raw mapped SQL over `employees`.

use crate::model::company::Employee;
use crate::repo::employee_repo::{parse_employee_row, EMPLOYEE_COLUMNS};
use crate::repo::{QueryContext, RepoError, RepoResult};
use rusqlite::{Connection, OptionalExtension};

/// All employees of `department`, ordered by id.
///
/// Returns `NoRows` when the department has no employees.
pub fn employees_by_department(conn: &Connection, department: &str) -> RepoResult<Vec<Employee>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {EMPLOYEE_COLUMNS}
             FROM employees
             WHERE department = ?1
             ORDER BY id ASC;"
        ))
        .context("query employees by department")?;
    let employees = stmt
        .query_map([department], parse_employee_row)
        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
        .context("query employees by department")?;

    if employees.is_empty() {
        return Err(RepoError::NoRows(format!(
            "department `{department}` has no employees"
        )));
    }
    Ok(employees)
}

/// One employee with the maximum salary.
///
/// When several employees share the maximum, which one is returned is up
/// to the store. Use [`all_highest_paid_employees`] to get every tie.
pub fn highest_paid_employee(conn: &Connection) -> RepoResult<Employee> {
    conn.query_row(
        &format!(
            "SELECT {EMPLOYEE_COLUMNS}
             FROM employees
             ORDER BY salary DESC
             LIMIT 1;"
        ),
        [],
        parse_employee_row,
    )
    .optional()
    .context("query highest paid employee")?
    .ok_or_else(|| RepoError::NoRows("employees table is empty".to_string()))
}

/// Every employee whose salary equals the maximum, ordered by id.
pub fn all_highest_paid_employees(conn: &Connection) -> RepoResult<Vec<Employee>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {EMPLOYEE_COLUMNS}
             FROM employees
             WHERE salary = (SELECT MAX(salary) FROM employees)
             ORDER BY id ASC;"
        ))
        .context("query all highest paid employees")?;
    let employees = stmt
        .query_map([], parse_employee_row)
        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
        .context("query all highest paid employees")?;
    Ok(employees)
}
