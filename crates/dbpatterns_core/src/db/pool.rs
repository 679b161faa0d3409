//! Bounded SQLite connection pool.
//!
//! # Responsibility
//! - Build an `r2d2` pool whose connections are configured like
//!   [`super::open_db`] connections.
//! - Migrate the schema once, before the pool is handed out.
//!
//! # Invariants
//! - Pool limits are fixed per demonstration and never taken from user input.

use super::migrations::apply_migrations;
use super::open::configure_connection;
use super::{DbError, DbResult};
use log::{error, info};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::time::{Duration, Instant};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Size and lifetime limits for one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    pub max_open: u32,
    pub max_idle: u32,
    pub max_lifetime: Duration,
}

impl PoolLimits {
    /// Limits used by the blog demonstration.
    pub const BLOG: Self = Self {
        max_open: 100,
        max_idle: 10,
        max_lifetime: Duration::from_secs(60 * 60),
    };

    /// Limits used by the company demonstration.
    pub const COMPANY: Self = Self {
        max_open: 25,
        max_idle: 10,
        max_lifetime: Duration::from_secs(5 * 60),
    };

    /// Limits used by the school demonstration.
    pub const SCHOOL: Self = Self {
        max_open: 10,
        max_idle: 1,
        max_lifetime: Duration::from_secs(60 * 60),
    };
}

/// Creates a pool over the SQLite file at `path` and migrates it.
///
/// # Errors
/// - `DbError::Io` when the parent directory cannot be created.
/// - `DbError::Pool` when the initial connections cannot be established.
/// - Migration errors from the first checked-out connection.
pub fn create_pool(path: impl AsRef<Path>, limits: PoolLimits) -> DbResult<DbPool> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!(
        "event=pool_open module=db status=start max_open={} max_idle={} max_lifetime_s={}",
        limits.max_open,
        limits.max_idle,
        limits.max_lifetime.as_secs()
    );

    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DbError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let manager = SqliteConnectionManager::file(path).with_init(|conn| configure_connection(conn));
    let pool = Pool::builder()
        .max_size(limits.max_open)
        .min_idle(Some(limits.max_idle))
        .max_lifetime(Some(limits.max_lifetime))
        .build(manager)
        .map_err(|err| {
            error!(
                "event=pool_open module=db status=error duration_ms={} error_code=pool_build_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            DbError::from(err)
        })?;

    let mut conn = pool.get()?;
    apply_migrations(&mut conn)?;
    drop(conn);

    info!(
        "event=pool_open module=db status=ok duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(pool)
}
