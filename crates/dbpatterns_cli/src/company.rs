//! Company demonstration: raw mapped queries over `employees`.

use crate::{connect, report, SetupResult};
use dbpatterns_core::config::{ConnectionArgs, COMPANY_DB};
use dbpatterns_core::db::{PoolLimits, PooledConn};
use dbpatterns_core::query::company::{
    all_highest_paid_employees, employees_by_department, highest_paid_employee,
};
use dbpatterns_core::{Employee, EmployeeRepository, NewEmployee, SqliteEmployeeRepository};

const DEPARTMENT: &str = "技术部";

pub(crate) fn run(connection: &ConnectionArgs) -> SetupResult<()> {
    let pool = connect(connection, COMPANY_DB, PoolLimits::COMPANY)?;
    let conn = pool.get()?;
    seed_if_empty(&conn)?;

    println!("\nemployees in {DEPARTMENT}:");
    match employees_by_department(&conn, DEPARTMENT) {
        Ok(employees) => employees.iter().for_each(print_employee),
        Err(err) => report("employees_by_department", &err),
    }

    println!("\nhighest paid employee:");
    match highest_paid_employee(&conn) {
        Ok(employee) => print_employee(&employee),
        Err(err) => report("highest_paid_employee", &err),
    }

    println!("\nall employees sharing the highest salary:");
    match all_highest_paid_employees(&conn) {
        Ok(employees) => employees.iter().for_each(print_employee),
        Err(err) => report("all_highest_paid_employees", &err),
    }

    Ok(())
}

fn seed_if_empty(conn: &PooledConn) -> SetupResult<()> {
    let repo = SqliteEmployeeRepository::new(conn);
    if repo.count_employees()? > 0 {
        return Ok(());
    }

    let seed = [
        NewEmployee::new("张三", DEPARTMENT, 15000),
        NewEmployee::new("李四", DEPARTMENT, 18000),
        NewEmployee::new("王五", "市场部", 12000),
        NewEmployee::new("赵六", "财务部", 18000),
    ];
    for employee in &seed {
        repo.create_employee(employee)?;
    }
    println!("seeded {} employees", seed.len());
    Ok(())
}

fn print_employee(employee: &Employee) {
    println!(
        "- ID: {}, name: {}, department: {}, salary: {}",
        employee.id, employee.name, employee.department, employee.salary
    );
}
