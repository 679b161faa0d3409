//! Blog entity graph: users own posts, posts own comments.
//!
//! # Invariants
//! - `User::article_count` caches the number of posts owned by the user.
//! - `Post::comment_status` is `HasComments` iff at least one comment
//!   references the post.
//! - Both derived fields are written only by counter maintenance hooks.

use super::{require_text, RowId, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub type UserId = RowId;
pub type PostId = RowId;
pub type CommentId = RowId;

const NAME_MAX_CHARS: usize = 100;
const EMAIL_MAX_CHARS: usize = 100;
const PASSWORD_MAX_CHARS: usize = 255;
const TITLE_MAX_CHARS: usize = 200;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Whether a post currently has any comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    NoComments,
    HasComments,
}

impl CommentStatus {
    /// Status implied by a fresh comment count.
    pub fn from_count(count: i64) -> Self {
        if count > 0 {
            Self::HasComments
        } else {
            Self::NoComments
        }
    }

    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::NoComments => "no_comments",
            Self::HasComments => "has_comments",
        }
    }

    pub fn parse_db_str(value: &str) -> Option<Self> {
        match value {
            "no_comments" => Some(Self::NoComments),
            "has_comments" => Some(Self::HasComments),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    /// Derived: number of posts owned by this user.
    pub article_count: i64,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    /// Derived from the comments referencing this post.
    pub comment_status: CommentStatus,
    pub user_id: UserId,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub post_id: PostId,
    /// Author.
    pub user_id: UserId,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Insert model for [`User`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_user_fields(Some(&self.name), Some(&self.email), Some(&self.password))
    }
}

/// Insert model for [`Post`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub user_id: UserId,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>, user_id: UserId) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            user_id,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_post_fields(Some(&self.title), Some(&self.content))
    }
}

/// Insert model for [`Comment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub content: String,
    pub post_id: PostId,
    pub user_id: UserId,
}

impl NewComment {
    pub fn new(content: impl Into<String>, post_id: PostId, user_id: UserId) -> Self {
        Self {
            content: content.into(),
            post_id,
            user_id,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("content", &self.content, None)
    }
}

/// Partial update for [`User`]. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UserPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_user_fields(
            self.name.as_deref(),
            self.email.as_deref(),
            self.password.as_deref(),
        )
    }
}

/// Partial update for [`Post`]. Ownership and comment status are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl PostPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_post_fields(self.title.as_deref(), self.content.as_deref())
    }
}

/// Partial update for [`Comment`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentPatch {
    pub content: Option<String>,
}

impl CommentPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.content.as_deref() {
            Some(content) => require_text("content", content, None),
            None => Ok(()),
        }
    }
}

fn validate_user_fields(
    name: Option<&str>,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<(), ValidationError> {
    if let Some(name) = name {
        require_text("name", name, Some(NAME_MAX_CHARS))?;
    }
    if let Some(email) = email {
        require_text("email", email, Some(EMAIL_MAX_CHARS))?;
        if !EMAIL_RE.is_match(email) {
            return Err(ValidationError::InvalidEmail(email.to_string()));
        }
    }
    if let Some(password) = password {
        require_text("password", password, Some(PASSWORD_MAX_CHARS))?;
    }
    Ok(())
}

fn validate_post_fields(title: Option<&str>, content: Option<&str>) -> Result<(), ValidationError> {
    if let Some(title) = title {
        require_text("title", title, Some(TITLE_MAX_CHARS))?;
    }
    if let Some(content) = content {
        require_text("content", content, None)?;
    }
    Ok(())
}
