use dbpatterns_core::db::{create_pool, open_db_in_memory, PoolLimits};
use dbpatterns_core::{
    audit_counters, recount_article_count, recount_comment_status, BlogRepository, CommentStatus,
    CounterDrift, HookRegistry, LifecycleEvent, NewComment, NewPost, NewUser, Post, RepoError,
    SqliteBlogRepository, UserId,
};
use rusqlite::Connection;

#[test]
fn article_count_matches_number_of_created_posts() {
    for post_total in [1_i64, 2, 7] {
        let mut conn = open_db_in_memory().unwrap();
        let mut repo = SqliteBlogRepository::new(&mut conn);
        let user_id = create_user(&mut repo, "author");

        for idx in 0..post_total {
            repo.create_post(&NewPost::new(format!("post {idx}"), "body", user_id))
                .unwrap();
        }

        let user = repo.get_user(user_id).unwrap();
        assert_eq!(user.article_count, post_total);
        assert_eq!(
            recount_article_count(repo.conn(), user_id).unwrap(),
            user.article_count
        );
        assert!(audit_counters(repo.conn()).unwrap().is_empty());
    }
}

#[test]
fn article_counts_are_tracked_per_owner() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlogRepository::new(&mut conn);
    let alice = create_user(&mut repo, "alice");
    let bob = create_user(&mut repo, "bob");

    repo.create_post(&NewPost::new("a1", "body", alice)).unwrap();
    repo.create_post(&NewPost::new("a2", "body", alice)).unwrap();
    repo.create_post(&NewPost::new("b1", "body", bob)).unwrap();

    assert_eq!(repo.get_user(alice).unwrap().article_count, 2);
    assert_eq!(repo.get_user(bob).unwrap().article_count, 1);
}

#[test]
fn comment_status_tracks_fresh_count_after_every_deletion() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlogRepository::new(&mut conn);
    let user_id = create_user(&mut repo, "author");
    let post_id = repo
        .create_post(&NewPost::new("busy post", "body", user_id))
        .unwrap();

    let mut comment_ids = Vec::new();
    for idx in 0..4 {
        comment_ids.push(
            repo.create_comment(&NewComment::new(format!("comment {idx}"), post_id, user_id))
                .unwrap(),
        );
    }
    assert_eq!(
        repo.get_post(post_id).unwrap().comment_status,
        CommentStatus::HasComments
    );

    let last_index = comment_ids.len() - 1;
    for (idx, comment_id) in comment_ids.into_iter().enumerate() {
        repo.delete_comment(comment_id).unwrap();

        let stored = repo.get_post(post_id).unwrap().comment_status;
        assert_eq!(stored, recount_comment_status(repo.conn(), post_id).unwrap());
        assert!(audit_counters(repo.conn()).unwrap().is_empty());

        let expected = if idx == last_index {
            CommentStatus::NoComments
        } else {
            CommentStatus::HasComments
        };
        assert_eq!(stored, expected, "after deleting comment #{idx}");
    }
}

#[test]
fn deleting_a_comment_only_touches_its_own_post() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlogRepository::new(&mut conn);
    let user_id = create_user(&mut repo, "author");
    let first = repo
        .create_post(&NewPost::new("first", "body", user_id))
        .unwrap();
    let second = repo
        .create_post(&NewPost::new("second", "body", user_id))
        .unwrap();
    let on_first = repo
        .create_comment(&NewComment::new("on first", first, user_id))
        .unwrap();
    repo.create_comment(&NewComment::new("on second", second, user_id))
        .unwrap();

    repo.delete_comment(on_first).unwrap();

    assert_eq!(
        repo.get_post(first).unwrap().comment_status,
        CommentStatus::NoComments
    );
    assert_eq!(
        repo.get_post(second).unwrap().comment_status,
        CommentStatus::HasComments
    );
}

#[test]
fn create_post_comment_then_delete_comment_scenario() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlogRepository::new(&mut conn);

    let user_a = create_user(&mut repo, "A");
    let p1 = repo.create_post(&NewPost::new("P1", "body", user_a)).unwrap();
    assert_eq!(repo.get_user(user_a).unwrap().article_count, 1);
    assert_eq!(
        repo.get_post(p1).unwrap().comment_status,
        CommentStatus::NoComments
    );

    let c1 = repo
        .create_comment(&NewComment::new("C1", p1, user_a))
        .unwrap();
    assert_eq!(
        repo.get_post(p1).unwrap().comment_status,
        CommentStatus::HasComments
    );

    repo.delete_comment(c1).unwrap();
    assert_eq!(
        repo.get_post(p1).unwrap().comment_status,
        CommentStatus::NoComments
    );
}

#[test]
fn failing_counter_update_rolls_back_post_insert() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlogRepository::new(&mut conn);
    let user_id = create_user(&mut repo, "author");
    repo.create_post(&NewPost::new("kept", "body", user_id))
        .unwrap();

    repo.conn()
        .execute_batch(
            "CREATE TRIGGER fail_article_count
             BEFORE UPDATE OF article_count ON users
             BEGIN
                SELECT RAISE(ABORT, 'forced counter failure');
             END;",
        )
        .unwrap();

    let err = repo
        .create_post(&NewPost::new("lost", "body", user_id))
        .unwrap_err();
    assert!(
        matches!(err, RepoError::Constraint(_)),
        "unexpected error: {err}"
    );
    assert!(err.to_string().contains("forced counter failure"));

    assert_eq!(count_rows(repo.conn(), "posts"), 1);
    assert_eq!(repo.get_user(user_id).unwrap().article_count, 1);
}

#[test]
fn failing_later_hook_rolls_back_counter_increment_too() {
    let mut conn = open_db_in_memory().unwrap();
    let mut hooks = HookRegistry::with_counter_maintenance();
    hooks.register::<Post>(LifecycleEvent::AfterCreate, "reject_all", |_, post| {
        Err(RepoError::InvalidData(format!("rejected post {}", post.id)))
    });
    let mut repo = SqliteBlogRepository::with_hooks(&mut conn, hooks);
    let user_id = create_user(&mut repo, "author");

    let err = repo
        .create_post(&NewPost::new("rejected", "body", user_id))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));

    assert_eq!(count_rows(repo.conn(), "posts"), 0);
    assert_eq!(repo.get_user(user_id).unwrap().article_count, 0);
}

#[test]
fn failing_delete_hook_keeps_the_comment() {
    let mut conn = open_db_in_memory().unwrap();
    let mut hooks = HookRegistry::with_counter_maintenance();
    hooks.register::<dbpatterns_core::Comment>(
        LifecycleEvent::AfterDelete,
        "reject_delete",
        |_, _| Err(RepoError::InvalidData("comment deletes are frozen".to_string())),
    );
    let mut repo = SqliteBlogRepository::with_hooks(&mut conn, hooks);
    let user_id = create_user(&mut repo, "author");
    let post_id = repo
        .create_post(&NewPost::new("post", "body", user_id))
        .unwrap();
    let comment_id = repo
        .create_comment(&NewComment::new("stays", post_id, user_id))
        .unwrap();

    repo.delete_comment(comment_id).unwrap_err();

    assert_eq!(repo.get_comment(comment_id).unwrap().content, "stays");
    assert_eq!(
        repo.get_post(post_id).unwrap().comment_status,
        CommentStatus::HasComments
    );
}

#[test]
fn deleting_a_post_recounts_owner_articles() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlogRepository::new(&mut conn);
    let user_id = create_user(&mut repo, "author");
    let first = repo
        .create_post(&NewPost::new("first", "body", user_id))
        .unwrap();
    repo.create_post(&NewPost::new("second", "body", user_id))
        .unwrap();

    repo.delete_post(first).unwrap();

    assert_eq!(repo.get_user(user_id).unwrap().article_count, 1);
    assert!(audit_counters(repo.conn()).unwrap().is_empty());
}

#[test]
fn deleting_a_commented_post_is_rejected_without_touching_counters() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlogRepository::new(&mut conn);
    let user_id = create_user(&mut repo, "author");
    let post_id = repo
        .create_post(&NewPost::new("post", "body", user_id))
        .unwrap();
    repo.create_comment(&NewComment::new("pin", post_id, user_id))
        .unwrap();

    let err = repo.delete_post(post_id).unwrap_err();
    assert!(matches!(err, RepoError::Constraint(_)));

    assert!(repo.get_post(post_id).is_ok());
    assert_eq!(repo.get_user(user_id).unwrap().article_count, 1);
}

#[test]
fn audit_reports_drift_when_hooks_are_not_installed() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlogRepository::with_hooks(&mut conn, HookRegistry::new());
    let user_id = create_user(&mut repo, "author");
    let post_id = repo
        .create_post(&NewPost::new("untracked", "body", user_id))
        .unwrap();
    repo.create_comment(&NewComment::new("untracked", post_id, user_id))
        .unwrap();

    let drifts = audit_counters(repo.conn()).unwrap();
    assert_eq!(
        drifts,
        vec![
            CounterDrift::ArticleCount {
                user_id,
                stored: 0,
                actual: 1,
            },
            CounterDrift::CommentStatus {
                post_id,
                stored: CommentStatus::NoComments,
                actual: CommentStatus::HasComments,
            },
        ]
    );
}

#[test]
fn concurrent_writers_keep_counters_consistent() {
    const WRITERS: usize = 8;
    const ROUNDS: usize = 20;

    let dir = tempfile::tempdir().unwrap();
    let pool = create_pool(dir.path().join("blog.sqlite3"), PoolLimits::BLOG).unwrap();
    let (user_id, post_id) = {
        let mut conn = pool.get().unwrap();
        let mut repo = SqliteBlogRepository::new(&mut conn);
        let user_id = create_user(&mut repo, "author");
        let post_id = repo
            .create_post(&NewPost::new("shared", "body", user_id))
            .unwrap();
        (user_id, post_id)
    };

    std::thread::scope(|scope| {
        for writer in 0..WRITERS {
            let pool = &pool;
            scope.spawn(move || {
                let mut conn = pool.get().unwrap();
                let mut repo = SqliteBlogRepository::new(&mut conn);
                for round in 0..ROUNDS {
                    repo.create_post(&NewPost::new(
                        format!("w{writer} r{round}"),
                        "body",
                        user_id,
                    ))
                    .unwrap();
                    let comment_id = repo
                        .create_comment(&NewComment::new(
                            format!("w{writer} c{round}"),
                            post_id,
                            user_id,
                        ))
                        .unwrap();
                    if round % 2 == 0 {
                        repo.delete_comment(comment_id).unwrap();
                    }
                }
            });
        }
    });

    let conn = pool.get().unwrap();
    assert!(audit_counters(&conn).unwrap().is_empty());
    assert_eq!(
        recount_article_count(&conn, user_id).unwrap(),
        1 + (WRITERS * ROUNDS) as i64
    );
    assert_eq!(
        recount_comment_status(&conn, post_id).unwrap(),
        CommentStatus::HasComments
    );
    assert_eq!(count_rows(&conn, "comments"), (WRITERS * ROUNDS / 2) as i64);
}

fn create_user(repo: &mut SqliteBlogRepository<'_>, name: &str) -> UserId {
    repo.create_user(&NewUser::new(
        name,
        format!("{}@example.com", name.to_lowercase()),
        "secret",
    ))
    .unwrap()
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
