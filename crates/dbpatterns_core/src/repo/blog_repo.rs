//! Blog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `users`, `posts` and `comments`.
//! - Run create/delete mutations and their lifecycle hooks in one
//!   immediate transaction.
//!
//! # Invariants
//! - Derived fields are never written by this module directly; only hooks
//!   dispatched through [`HookRegistry`] touch them.
//! - A hook error drops the transaction, so the primary row change is
//!   rolled back with it.
//! - Deleting a referenced user or post fails with `Constraint`; nothing
//!   cascades.

use crate::hooks::{HookRegistry, HookTarget, LifecycleEvent};
use crate::model::blog::{
    Comment, CommentId, CommentPatch, CommentStatus, NewComment, NewPost, NewUser, Post, PostId,
    PostPatch, User, UserId, UserPatch,
};
use crate::model::EntityKind;
use crate::repo::{push_pagination, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::ops::Deref;

pub(crate) const USER_COLUMNS: &str =
    "id, name, email, password, article_count, created_at, updated_at";
pub(crate) const POST_COLUMNS: &str =
    "id, title, content, comment_status, user_id, created_at, updated_at";
pub(crate) const COMMENT_COLUMNS: &str = "id, content, post_id, user_id, created_at, updated_at";

/// Filters for listing users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserListQuery {
    pub name: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Filters for listing posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostListQuery {
    pub user_id: Option<UserId>,
    pub comment_status: Option<CommentStatus>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Filters for listing comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentListQuery {
    pub post_id: Option<PostId>,
    pub user_id: Option<UserId>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for blog entity CRUD.
pub trait BlogRepository {
    fn create_user(&mut self, user: &NewUser) -> RepoResult<UserId>;
    fn create_post(&mut self, post: &NewPost) -> RepoResult<PostId>;
    fn create_comment(&mut self, comment: &NewComment) -> RepoResult<CommentId>;

    fn get_user(&self, id: UserId) -> RepoResult<User>;
    fn get_post(&self, id: PostId) -> RepoResult<Post>;
    fn get_comment(&self, id: CommentId) -> RepoResult<Comment>;
    /// Comment with the lowest id.
    fn first_comment(&self) -> RepoResult<Comment>;

    fn list_users(&self, query: &UserListQuery) -> RepoResult<Vec<User>>;
    fn list_posts(&self, query: &PostListQuery) -> RepoResult<Vec<Post>>;
    fn list_comments(&self, query: &CommentListQuery) -> RepoResult<Vec<Comment>>;

    fn update_user(&self, id: UserId, patch: &UserPatch) -> RepoResult<()>;
    fn update_post(&self, id: PostId, patch: &PostPatch) -> RepoResult<()>;
    fn update_comment(&self, id: CommentId, patch: &CommentPatch) -> RepoResult<()>;

    fn delete_user(&mut self, id: UserId) -> RepoResult<()>;
    fn delete_post(&mut self, id: PostId) -> RepoResult<()>;
    fn delete_comment(&mut self, id: CommentId) -> RepoResult<()>;
}

/// SQLite-backed blog repository.
pub struct SqliteBlogRepository<'conn> {
    conn: &'conn mut Connection,
    hooks: HookRegistry,
}

impl<'conn> SqliteBlogRepository<'conn> {
    /// Creates a repository with the derived-counter hooks installed.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self::with_hooks(conn, HookRegistry::with_counter_maintenance())
    }

    /// Creates a repository dispatching the given hooks.
    pub fn with_hooks(conn: &'conn mut Connection, hooks: HookRegistry) -> Self {
        Self { conn, hooks }
    }

    /// Read access to the underlying connection for composite queries.
    pub fn conn(&self) -> &Connection {
        self.conn
    }

    /// Runs `insert` and the after-create hooks for its result in one
    /// transaction.
    fn create_with_hooks<E: HookTarget>(
        &mut self,
        insert: impl FnOnce(&Transaction<'_>) -> RepoResult<E>,
    ) -> RepoResult<E> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let created = insert(&tx)?;
        self.hooks
            .dispatch(LifecycleEvent::AfterCreate, &tx, &created)?;
        tx.commit()?;
        Ok(created)
    }

    /// Loads the row, deletes it, then runs after-delete hooks, all in one
    /// transaction.
    fn delete_with_hooks<E: HookTarget>(
        &mut self,
        id: i64,
        table: &'static str,
        load: impl FnOnce(&Connection, i64) -> RepoResult<Option<E>>,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let entity = load(tx.deref(), id)?.ok_or(RepoError::NotFound {
            entity: E::KIND,
            id,
        })?;
        tx.execute(&format!("DELETE FROM {table} WHERE id = ?1;"), [id])?;
        self.hooks
            .dispatch(LifecycleEvent::AfterDelete, &tx, &entity)?;
        tx.commit()?;
        Ok(())
    }
}

impl BlogRepository for SqliteBlogRepository<'_> {
    fn create_user(&mut self, user: &NewUser) -> RepoResult<UserId> {
        user.validate()?;
        let created = self.create_with_hooks(|tx| {
            Ok(tx.query_row(
                &format!(
                    "INSERT INTO users (name, email, password)
                     VALUES (?1, ?2, ?3)
                     RETURNING {USER_COLUMNS};"
                ),
                params![user.name, user.email, user.password],
                parse_user_row,
            )?)
        })?;
        Ok(created.id)
    }

    fn create_post(&mut self, post: &NewPost) -> RepoResult<PostId> {
        post.validate()?;
        let created = self.create_with_hooks(|tx| {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO posts (title, content, user_id)
                 VALUES (?1, ?2, ?3)
                 RETURNING {POST_COLUMNS};"
            ))?;
            let mut rows = stmt.query(params![post.title, post.content, post.user_id])?;
            let row = rows.next()?.ok_or_else(|| {
                RepoError::InvalidData("insert into posts returned no row".to_string())
            })?;
            parse_post_row(row)
        })?;
        Ok(created.id)
    }

    fn create_comment(&mut self, comment: &NewComment) -> RepoResult<CommentId> {
        comment.validate()?;
        let created = self.create_with_hooks(|tx| {
            Ok(tx.query_row(
                &format!(
                    "INSERT INTO comments (content, post_id, user_id)
                     VALUES (?1, ?2, ?3)
                     RETURNING {COMMENT_COLUMNS};"
                ),
                params![comment.content, comment.post_id, comment.user_id],
                parse_comment_row,
            )?)
        })?;
        Ok(created.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<User> {
        load_user(self.conn, id)?.ok_or(RepoError::NotFound {
            entity: EntityKind::User,
            id,
        })
    }

    fn get_post(&self, id: PostId) -> RepoResult<Post> {
        load_post(self.conn, id)?.ok_or(RepoError::NotFound {
            entity: EntityKind::Post,
            id,
        })
    }

    fn get_comment(&self, id: CommentId) -> RepoResult<Comment> {
        load_comment(self.conn, id)?.ok_or(RepoError::NotFound {
            entity: EntityKind::Comment,
            id,
        })
    }

    fn first_comment(&self) -> RepoResult<Comment> {
        self.conn
            .query_row(
                &format!("SELECT {COMMENT_COLUMNS} FROM comments ORDER BY id ASC LIMIT 1;"),
                [],
                parse_comment_row,
            )
            .optional()?
            .ok_or_else(|| RepoError::NoRows("comments table is empty".to_string()))
    }

    fn list_users(&self, query: &UserListQuery) -> RepoResult<Vec<User>> {
        let mut sql = format!("SELECT {USER_COLUMNS} FROM users WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(name) = query.name.as_ref() {
            sql.push_str(" AND name = ?");
            bind_values.push(Value::Text(name.clone()));
        }

        sql.push_str(" ORDER BY id ASC");
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn list_posts(&self, query: &PostListQuery) -> RepoResult<Vec<Post>> {
        let mut sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(user_id) = query.user_id {
            sql.push_str(" AND user_id = ?");
            bind_values.push(Value::Integer(user_id));
        }
        if let Some(status) = query.comment_status {
            sql.push_str(" AND comment_status = ?");
            bind_values.push(Value::Text(status.as_db_str().to_string()));
        }

        sql.push_str(" ORDER BY id ASC");
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(row)?);
        }
        Ok(posts)
    }

    fn list_comments(&self, query: &CommentListQuery) -> RepoResult<Vec<Comment>> {
        let mut sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(post_id) = query.post_id {
            sql.push_str(" AND post_id = ?");
            bind_values.push(Value::Integer(post_id));
        }
        if let Some(user_id) = query.user_id {
            sql.push_str(" AND user_id = ?");
            bind_values.push(Value::Integer(user_id));
        }

        sql.push_str(" ORDER BY id ASC");
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }

    fn update_user(&self, id: UserId, patch: &UserPatch) -> RepoResult<()> {
        patch.validate()?;
        let mut assignments = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        push_text_assignment(&mut assignments, &mut bind_values, "name", &patch.name);
        push_text_assignment(&mut assignments, &mut bind_values, "email", &patch.email);
        push_text_assignment(&mut assignments, &mut bind_values, "password", &patch.password);
        apply_update(self.conn, EntityKind::User, "users", id, assignments, bind_values)
    }

    fn update_post(&self, id: PostId, patch: &PostPatch) -> RepoResult<()> {
        patch.validate()?;
        let mut assignments = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        push_text_assignment(&mut assignments, &mut bind_values, "title", &patch.title);
        push_text_assignment(&mut assignments, &mut bind_values, "content", &patch.content);
        apply_update(self.conn, EntityKind::Post, "posts", id, assignments, bind_values)
    }

    fn update_comment(&self, id: CommentId, patch: &CommentPatch) -> RepoResult<()> {
        patch.validate()?;
        let mut assignments = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        push_text_assignment(&mut assignments, &mut bind_values, "content", &patch.content);
        apply_update(
            self.conn,
            EntityKind::Comment,
            "comments",
            id,
            assignments,
            bind_values,
        )
    }

    fn delete_user(&mut self, id: UserId) -> RepoResult<()> {
        self.delete_with_hooks::<User>(id, "users", load_user)
    }

    fn delete_post(&mut self, id: PostId) -> RepoResult<()> {
        self.delete_with_hooks::<Post>(id, "posts", load_post)
    }

    fn delete_comment(&mut self, id: CommentId) -> RepoResult<()> {
        self.delete_with_hooks::<Comment>(id, "comments", load_comment)
    }
}

pub(crate) fn load_user(conn: &Connection, id: UserId) -> RepoResult<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1;"),
        [id],
        parse_user_row,
    )
    .optional()
    .map_err(Into::into)
}

pub(crate) fn load_post(conn: &Connection, id: PostId) -> RepoResult<Option<Post>> {
    let mut stmt = conn.prepare(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_post_row(row)?)),
        None => Ok(None),
    }
}

pub(crate) fn load_comment(conn: &Connection, id: CommentId) -> RepoResult<Option<Comment>> {
    conn.query_row(
        &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1;"),
        [id],
        parse_comment_row,
    )
    .optional()
    .map_err(Into::into)
}

pub(crate) fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        password: row.get("password")?,
        article_count: row.get("article_count")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Post rows carry an enum column, so parsing can fail on data as well as
/// on transport.
pub(crate) fn parse_post_row(row: &Row<'_>) -> RepoResult<Post> {
    let status_text: String = row.get("comment_status")?;
    let comment_status = CommentStatus::parse_db_str(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid comment status `{status_text}` in posts.comment_status"
        ))
    })?;

    Ok(Post {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        comment_status,
        user_id: row.get("user_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn parse_comment_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get("id")?,
        content: row.get("content")?,
        post_id: row.get("post_id")?,
        user_id: row.get("user_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn push_text_assignment(
    assignments: &mut Vec<&'static str>,
    bind_values: &mut Vec<Value>,
    column: &'static str,
    value: &Option<String>,
) {
    if let Some(value) = value {
        assignments.push(column);
        bind_values.push(Value::Text(value.clone()));
    }
}

/// Writes the given columns plus `updated_at`. An empty assignment list
/// still touches `updated_at`, which doubles as an existence check.
pub(crate) fn apply_update(
    conn: &Connection,
    entity: EntityKind,
    table: &'static str,
    id: i64,
    assignments: Vec<&'static str>,
    mut bind_values: Vec<Value>,
) -> RepoResult<()> {
    let mut sql = format!("UPDATE {table} SET");
    for column in &assignments {
        sql.push_str(&format!(" {column} = ?,"));
    }
    sql.push_str(" updated_at = (strftime('%s', 'now') * 1000) WHERE id = ?;");
    bind_values.push(Value::Integer(id));

    let changed = conn.execute(&sql, params_from_iter(bind_values))?;
    if changed == 0 {
        return Err(RepoError::NotFound { entity, id });
    }
    Ok(())
}
