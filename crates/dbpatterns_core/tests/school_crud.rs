use dbpatterns_core::db::open_db_in_memory;
use dbpatterns_core::{
    EntityKind, NewStudent, RepoError, SqliteStudentRepository, StudentPatch, StudentQuery,
    StudentRepository, ValidationError,
};

#[test]
fn create_update_delete_walkthrough() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);

    let zhang = repo
        .create_student(&NewStudent::new("张三", 20, "三年级"))
        .unwrap();
    repo.create_student(&NewStudent::new("小明", 12, "一年级"))
        .unwrap();

    let adults = repo
        .list_students(&StudentQuery {
            older_than: Some(18),
            ..StudentQuery::default()
        })
        .unwrap();
    assert_eq!(adults.len(), 1);
    assert_eq!(adults[0].name, "张三");

    let updated = repo
        .update_students(
            &StudentQuery {
                name: Some("张三".to_string()),
                ..StudentQuery::default()
            },
            &StudentPatch {
                grade: Some("四年级".to_string()),
                ..StudentPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated, 1);
    let student = repo.get_student(zhang).unwrap();
    assert_eq!(student.grade, "四年级");
    assert_eq!(student.age, 20);

    let deleted = repo
        .delete_students(&StudentQuery {
            younger_than: Some(15),
            ..StudentQuery::default()
        })
        .unwrap();
    assert_eq!(deleted, 1);

    let remaining = repo.list_students(&StudentQuery::default()).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, zhang);
}

#[test]
fn unfiltered_bulk_mutations_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);
    repo.create_student(&NewStudent::new("张三", 20, "三年级"))
        .unwrap();

    let err = repo.delete_students(&StudentQuery::default()).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::MissingFilter(_))
    ));

    let err = repo
        .update_students(
            &StudentQuery::default(),
            &StudentPatch {
                age: Some(1),
                ..StudentPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::MissingFilter(_))
    ));
    assert_eq!(repo.list_students(&StudentQuery::default()).unwrap().len(), 1);
}

#[test]
fn single_row_operations_report_missing_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);

    assert!(matches!(
        repo.get_student(9),
        Err(RepoError::NotFound {
            entity: EntityKind::Student,
            id: 9
        })
    ));
    assert!(repo
        .update_student(9, &StudentPatch::default())
        .unwrap_err()
        .is_not_found());
    assert!(repo
        .update_student(
            9,
            &StudentPatch {
                grade: Some("五年级".to_string()),
                ..StudentPatch::default()
            }
        )
        .unwrap_err()
        .is_not_found());
    assert!(repo.delete_student(9).unwrap_err().is_not_found());
}

#[test]
fn single_row_update_and_delete() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);
    let id = repo
        .create_student(&NewStudent::new("李四", 16, "二年级"))
        .unwrap();

    repo.update_student(
        id,
        &StudentPatch {
            age: Some(17),
            ..StudentPatch::default()
        },
    )
    .unwrap();
    assert_eq!(repo.get_student(id).unwrap().age, 17);

    repo.delete_student(id).unwrap();
    assert!(repo.get_student(id).unwrap_err().is_not_found());
}

#[test]
fn blank_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStudentRepository::new(&conn);

    let err = repo
        .create_student(&NewStudent::new("", 10, "一年级"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::Blank("name"))
    ));
}
