//! Composite reads over the blog entity graph.

use crate::model::blog::{Comment, Post, PostId, User, UserId};
use crate::model::EntityKind;
use crate::repo::blog_repo::{
    load_user, parse_comment_row, parse_post_row, parse_user_row, POST_COLUMNS, USER_COLUMNS,
};
use crate::repo::{QueryContext, RepoError, RepoResult};
use rusqlite::Connection;
use std::collections::HashMap;

/// A post together with its comments, ordered by comment id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostWithComments {
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// A user with every owned post and each post's comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTree {
    pub user: User,
    pub posts: Vec<PostWithComments>,
}

/// Result of [`most_commented_post`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCommentCount {
    pub post: Post,
    pub comment_count: i64,
}

/// Snapshot of derived fields for every user and post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalStatus {
    pub users: Vec<User>,
    pub posts: Vec<Post>,
}

/// Eagerly loads a user, their posts and those posts' comments.
///
/// Issues exactly three queries regardless of how many posts exist.
pub fn user_with_posts_and_comments(conn: &Connection, user_id: UserId) -> RepoResult<UserTree> {
    let user = load_user(conn, user_id)?.ok_or(RepoError::NotFound {
        entity: EntityKind::User,
        id: user_id,
    })?;

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {POST_COLUMNS}
             FROM posts
             WHERE user_id = ?1
             ORDER BY id ASC;"
        ))
        .context("load posts for user")?;
    let mut rows = stmt.query([user_id]).context("load posts for user")?;
    let mut posts = Vec::new();
    while let Some(row) = rows.next().context("load posts for user")? {
        posts.push(parse_post_row(row)?);
    }

    let mut stmt = conn
        .prepare(
            "SELECT c.id, c.content, c.post_id, c.user_id, c.created_at, c.updated_at
             FROM comments c
             INNER JOIN posts p ON p.id = c.post_id
             WHERE p.user_id = ?1
             ORDER BY c.post_id ASC, c.id ASC;",
        )
        .context("load comments for user posts")?;
    let comments = stmt
        .query_map([user_id], parse_comment_row)
        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
        .context("load comments for user posts")?;

    let mut by_post: HashMap<PostId, Vec<Comment>> = HashMap::new();
    for comment in comments {
        by_post.entry(comment.post_id).or_default().push(comment);
    }

    let posts = posts
        .into_iter()
        .map(|post| {
            let comments = by_post.remove(&post.id).unwrap_or_default();
            PostWithComments { post, comments }
        })
        .collect();

    Ok(UserTree { user, posts })
}

/// The post with the most comments and its comment count.
///
/// Posts without comments count as zero. Ties are broken by the store's
/// row order. Returns `NoRows` when there are no posts.
pub fn most_commented_post(conn: &Connection) -> RepoResult<PostCommentCount> {
    let mut stmt = conn
        .prepare(
            "SELECT
                posts.id AS id,
                posts.title AS title,
                posts.content AS content,
                posts.comment_status AS comment_status,
                posts.user_id AS user_id,
                posts.created_at AS created_at,
                posts.updated_at AS updated_at,
                COALESCE(comment_counts.comment_count, 0) AS comment_count
             FROM posts
             LEFT JOIN (
                SELECT post_id, COUNT(*) AS comment_count
                FROM comments
                GROUP BY post_id
             ) AS comment_counts ON posts.id = comment_counts.post_id
             ORDER BY comment_count DESC
             LIMIT 1;",
        )
        .context("query most commented post")?;
    let mut rows = stmt.query([]).context("query most commented post")?;
    let row = rows
        .next()
        .context("query most commented post")?
        .ok_or_else(|| RepoError::NoRows("posts table is empty".to_string()))?;

    let post = parse_post_row(row)?;
    let comment_count = row.get("comment_count")?;
    Ok(PostCommentCount {
        post,
        comment_count,
    })
}

/// Every user with its article count and every post with its comment status.
pub fn final_status(conn: &Connection) -> RepoResult<FinalStatus> {
    let mut stmt = conn
        .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC;"))
        .context("load users")?;
    let users = stmt
        .query_map([], parse_user_row)
        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
        .context("load users")?;

    let mut stmt = conn
        .prepare(&format!("SELECT {POST_COLUMNS} FROM posts ORDER BY id ASC;"))
        .context("load posts")?;
    let mut rows = stmt.query([]).context("load posts")?;
    let mut posts = Vec::new();
    while let Some(row) = rows.next().context("load posts")? {
        posts.push(parse_post_row(row)?);
    }

    Ok(FinalStatus { users, posts })
}
