//! Derived-counter maintenance for the blog entity graph.
//!
//! # Responsibility
//! - Keep `users.article_count` equal to the number of owned posts.
//! - Keep `posts.comment_status` in line with the presence of comments.
//! - Recompute both values from source for auditing.
//!
//! # Invariants
//! - Every hook runs inside the mutating transaction; an error here rolls
//!   back the primary mutation as well.
//! - Comment status is always recomputed from a fresh count, never
//!   incremented or decremented.

use super::{HookRegistry, LifecycleEvent};
use crate::model::blog::{Comment, CommentStatus, Post, PostId, UserId};
use crate::model::EntityKind;
use crate::repo::{QueryContext, RepoError, RepoResult};
use log::info;
use rusqlite::{params, Connection, Transaction};

/// Installs the counter hooks into `registry`.
pub fn register(registry: &mut HookRegistry) {
    registry
        .register::<Post>(LifecycleEvent::AfterCreate, "on_post_created", on_post_created)
        .register::<Post>(LifecycleEvent::AfterDelete, "on_post_deleted", on_post_deleted)
        .register::<Comment>(
            LifecycleEvent::AfterCreate,
            "on_comment_created",
            on_comment_created,
        )
        .register::<Comment>(
            LifecycleEvent::AfterDelete,
            "on_comment_deleted",
            on_comment_deleted,
        );
}

/// Increments the owner's `article_count` by exactly one.
pub fn on_post_created(tx: &Transaction<'_>, post: &Post) -> RepoResult<()> {
    let changed = tx
        .execute(
            "UPDATE users
             SET
                article_count = article_count + 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [post.user_id],
        )
        .context("increment article_count")?;

    if changed == 0 {
        return Err(RepoError::NotFound {
            entity: EntityKind::User,
            id: post.user_id,
        });
    }

    info!(
        "event=article_count_updated module=hooks status=ok user_id={} post_id={} delta=1",
        post.user_id, post.id
    );
    Ok(())
}

/// Recounts the owner's posts after a post was removed.
pub fn on_post_deleted(tx: &Transaction<'_>, post: &Post) -> RepoResult<()> {
    let changed = tx
        .execute(
            "UPDATE users
             SET
                article_count = (SELECT COUNT(*) FROM posts WHERE user_id = ?1),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [post.user_id],
        )
        .context("recount article_count")?;

    if changed == 0 {
        return Err(RepoError::NotFound {
            entity: EntityKind::User,
            id: post.user_id,
        });
    }

    info!(
        "event=article_count_updated module=hooks status=ok user_id={} post_id={} mode=recount",
        post.user_id, post.id
    );
    Ok(())
}

/// Marks the post as commented.
pub fn on_comment_created(tx: &Transaction<'_>, comment: &Comment) -> RepoResult<()> {
    refresh_comment_status(tx, comment.post_id).map(|_| ())
}

/// Recomputes the post's status from the comments that remain.
pub fn on_comment_deleted(tx: &Transaction<'_>, comment: &Comment) -> RepoResult<()> {
    refresh_comment_status(tx, comment.post_id).map(|_| ())
}

fn refresh_comment_status(tx: &Transaction<'_>, post_id: PostId) -> RepoResult<CommentStatus> {
    let status = recount_comment_status(tx, post_id)?;
    let changed = tx
        .execute(
            "UPDATE posts
             SET
                comment_status = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![post_id, status.as_db_str()],
        )
        .context("update comment_status")?;

    if changed == 0 {
        return Err(RepoError::NotFound {
            entity: EntityKind::Post,
            id: post_id,
        });
    }

    info!(
        "event=comment_status_updated module=hooks status=ok post_id={} comment_status={}",
        post_id,
        status.as_db_str()
    );
    Ok(status)
}

/// Counts the user's posts directly from `posts`.
pub fn recount_article_count(conn: &Connection, user_id: UserId) -> RepoResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM posts WHERE user_id = ?1;",
        [user_id],
        |row| row.get(0),
    )
    .context("count posts for user")
}

/// Derives the post's comment status from a fresh count of `comments`.
pub fn recount_comment_status(conn: &Connection, post_id: PostId) -> RepoResult<CommentStatus> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?1;",
            [post_id],
            |row| row.get(0),
        )
        .context("count comments for post")?;
    Ok(CommentStatus::from_count(count))
}

/// A stored derived value that disagrees with its source rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterDrift {
    ArticleCount {
        user_id: UserId,
        stored: i64,
        actual: i64,
    },
    CommentStatus {
        post_id: PostId,
        stored: CommentStatus,
        actual: CommentStatus,
    },
}

/// Lists every user and post whose derived field is stale.
///
/// Returns an empty list when all counters are consistent.
pub fn audit_counters(conn: &Connection) -> RepoResult<Vec<CounterDrift>> {
    let mut drifts = Vec::new();

    let mut stmt = conn
        .prepare(
            "SELECT u.id, u.article_count, COUNT(p.id) AS actual
             FROM users u
             LEFT JOIN posts p ON p.user_id = u.id
             GROUP BY u.id, u.article_count
             HAVING u.article_count != COUNT(p.id)
             ORDER BY u.id ASC;",
        )
        .context("audit article_count")?;
    let mut rows = stmt.query([]).context("audit article_count")?;
    while let Some(row) = rows.next().context("audit article_count")? {
        drifts.push(CounterDrift::ArticleCount {
            user_id: row.get(0)?,
            stored: row.get(1)?,
            actual: row.get(2)?,
        });
    }

    let mut stmt = conn
        .prepare(
            "SELECT p.id, p.comment_status, COUNT(c.id) AS actual
             FROM posts p
             LEFT JOIN comments c ON c.post_id = p.id
             GROUP BY p.id, p.comment_status
             ORDER BY p.id ASC;",
        )
        .context("audit comment_status")?;
    let mut rows = stmt.query([]).context("audit comment_status")?;
    while let Some(row) = rows.next().context("audit comment_status")? {
        let post_id: PostId = row.get(0)?;
        let stored_text: String = row.get(1)?;
        let stored = CommentStatus::parse_db_str(&stored_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid comment status `{stored_text}` in posts.comment_status"
            ))
        })?;
        let actual = CommentStatus::from_count(row.get(2)?);
        if stored != actual {
            drifts.push(CounterDrift::CommentStatus {
                post_id,
                stored,
                actual,
            });
        }
    }

    Ok(drifts)
}
