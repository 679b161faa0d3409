use dbpatterns_core::db::open_db_in_memory;
use dbpatterns_core::query::company::{
    all_highest_paid_employees, employees_by_department, highest_paid_employee,
};
use dbpatterns_core::{
    EmployeeRepository, NewEmployee, RepoError, SqliteEmployeeRepository, ValidationError,
};

#[test]
fn employees_by_department_filters_and_orders_by_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmployeeRepository::new(&conn);
    let first = repo
        .create_employee(&NewEmployee::new("张三", "技术部", 12000))
        .unwrap();
    repo.create_employee(&NewEmployee::new("王五", "市场部", 9000))
        .unwrap();
    let second = repo
        .create_employee(&NewEmployee::new("李四", "技术部", 15000))
        .unwrap();

    let engineers = employees_by_department(&conn, "技术部").unwrap();
    let ids: Vec<_> = engineers.iter().map(|employee| employee.id).collect();
    assert_eq!(ids, vec![first, second]);
    assert!(engineers
        .iter()
        .all(|employee| employee.department == "技术部"));
}

#[test]
fn employees_by_unknown_department_is_no_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmployeeRepository::new(&conn);
    repo.create_employee(&NewEmployee::new("张三", "技术部", 12000))
        .unwrap();

    assert!(matches!(
        employees_by_department(&conn, "财务部"),
        Err(RepoError::NoRows(_))
    ));
}

#[test]
fn highest_paid_with_tie_returns_one_of_the_tied() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmployeeRepository::new(&conn);
    let left = repo
        .create_employee(&NewEmployee::new("left", "技术部", 20000))
        .unwrap();
    repo.create_employee(&NewEmployee::new("low", "技术部", 1000))
        .unwrap();
    let right = repo
        .create_employee(&NewEmployee::new("right", "市场部", 20000))
        .unwrap();

    let top = highest_paid_employee(&conn).unwrap();
    assert_eq!(top.salary, 20000);
    assert!(top.id == left || top.id == right);

    let all_top = all_highest_paid_employees(&conn).unwrap();
    let ids: Vec<_> = all_top.iter().map(|employee| employee.id).collect();
    assert_eq!(ids, vec![left, right]);
}

#[test]
fn empty_table_behaviour() {
    let conn = open_db_in_memory().unwrap();

    assert!(matches!(
        highest_paid_employee(&conn),
        Err(RepoError::NoRows(_))
    ));
    assert!(all_highest_paid_employees(&conn).unwrap().is_empty());
    assert_eq!(
        SqliteEmployeeRepository::new(&conn)
            .count_employees()
            .unwrap(),
        0
    );
}

#[test]
fn negative_salary_is_rejected_before_insert() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmployeeRepository::new(&conn);

    let err = repo
        .create_employee(&NewEmployee::new("broke", "技术部", -1))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::OutOfRange {
            field: "salary",
            value: -1
        })
    ));
    assert!(repo.list_employees().unwrap().is_empty());
}
