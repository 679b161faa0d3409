//! School demonstration: create, filtered find, partial update, filtered delete.

use crate::{connect, report, SetupResult};
use dbpatterns_core::config::{ConnectionArgs, SCHOOL_DB};
use dbpatterns_core::db::PoolLimits;
use dbpatterns_core::{
    NewStudent, SqliteStudentRepository, Student, StudentPatch, StudentQuery, StudentRepository,
};

pub(crate) fn run(connection: &ConnectionArgs) -> SetupResult<()> {
    let pool = connect(connection, SCHOOL_DB, PoolLimits::SCHOOL)?;
    let conn = pool.get()?;
    let repo = SqliteStudentRepository::new(&conn);

    let id = repo.create_student(&NewStudent::new("张三", 20, "三年级"))?;
    println!("created student {id}");

    let adults = StudentQuery {
        older_than: Some(18),
        ..StudentQuery::default()
    };
    match repo.list_students(&adults) {
        Ok(students) => {
            println!("students older than 18:");
            students.iter().for_each(print_student);
        }
        Err(err) => report("list_students", &err),
    }

    let by_name = StudentQuery {
        name: Some("张三".to_string()),
        ..StudentQuery::default()
    };
    let patch = StudentPatch {
        grade: Some("四年级".to_string()),
        ..StudentPatch::default()
    };
    match repo.update_students(&by_name, &patch) {
        Ok(rows) => println!("updated grade for {rows} student(s)"),
        Err(err) => report("update_students", &err),
    }

    let young = StudentQuery {
        younger_than: Some(15),
        ..StudentQuery::default()
    };
    match repo.delete_students(&young) {
        Ok(rows) => println!("deleted {rows} student(s) younger than 15"),
        Err(err) => report("delete_students", &err),
    }

    Ok(())
}

fn print_student(student: &Student) {
    println!(
        "- ID: {}, name: {}, age: {}, grade: {}",
        student.id, student.name, student.age, student.grade
    );
}
