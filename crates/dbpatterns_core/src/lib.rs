//! Core data access for the dbpatterns demonstrations.
//!
//! The blog entity graph keeps two derived fields consistent through
//! lifecycle hooks that run inside the mutating transaction; the company
//! and school schemas exercise raw mapped queries and plain CRUD.

pub mod config;
pub mod db;
pub mod hooks;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;

pub use config::{ConnectionArgs, ConnectionSettings};
pub use hooks::counters::{
    audit_counters, recount_article_count, recount_comment_status, CounterDrift,
};
pub use hooks::{HookRegistry, HookTarget, Hooks, LifecycleEvent};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::blog::{
    Comment, CommentId, CommentPatch, CommentStatus, NewComment, NewPost, NewUser, Post, PostId,
    PostPatch, User, UserId, UserPatch,
};
pub use model::company::{Employee, EmployeeId, NewEmployee};
pub use model::school::{NewStudent, Student, StudentId, StudentPatch};
pub use model::{EntityKind, RowId, ValidationError};
pub use repo::blog_repo::{
    BlogRepository, CommentListQuery, PostListQuery, SqliteBlogRepository, UserListQuery,
};
pub use repo::employee_repo::{EmployeeRepository, SqliteEmployeeRepository};
pub use repo::student_repo::{SqliteStudentRepository, StudentQuery, StudentRepository};
pub use repo::{RepoError, RepoResult};
