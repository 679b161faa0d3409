//! Single-connection bootstrap for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by the repositories.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.
//! - Every executed statement is logged at debug level, or at warn level
//!   once it runs longer than [`SLOW_STATEMENT_THRESHOLD`].

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info, log, Level};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

pub(crate) const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Statements running longer than this are logged as slow.
pub const SLOW_STATEMENT_THRESHOLD: Duration = Duration::from_secs(1);
const MAX_LOGGED_SQL_CHARS: usize = 240;

/// Opens a SQLite database file and applies all pending migrations.
///
/// Parent directories are created when missing.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DbError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    open_with("file", || Connection::open(path))
}

/// Opens an in-memory SQLite database and applies all pending migrations.
///
/// Every call yields an independent, empty database.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    opener: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match opener() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    let bootstrap = configure_connection(&mut conn)
        .map_err(DbError::from)
        .and_then(|()| apply_migrations(&mut conn));
    match bootstrap {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Applies per-connection pragmas and installs the statement profiler.
/// Shared with the pool's connection init.
pub(crate) fn configure_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.profile(Some(log_statement));
    Ok(())
}

/// Log level for a statement that took `elapsed`.
pub(crate) fn statement_log_level(elapsed: Duration) -> Level {
    if elapsed > SLOW_STATEMENT_THRESHOLD {
        Level::Warn
    } else {
        Level::Debug
    }
}

fn log_statement(sql: &str, elapsed: Duration) {
    let level = statement_log_level(elapsed);
    if !log::log_enabled!(level) {
        return;
    }
    let slow = level == Level::Warn;
    log!(
        level,
        "event=sql_exec module=db status=ok duration_ms={} slow={} sql={}",
        elapsed.as_millis(),
        slow,
        flatten_sql(sql)
    );
}

/// Collapses whitespace so a statement stays on one log line.
fn flatten_sql(sql: &str) -> String {
    let flattened = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= MAX_LOGGED_SQL_CHARS {
        return flattened;
    }
    let mut truncated = flattened
        .chars()
        .take(MAX_LOGGED_SQL_CHARS)
        .collect::<String>();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::{flatten_sql, statement_log_level, SLOW_STATEMENT_THRESHOLD};
    use log::Level;
    use std::time::Duration;

    #[test]
    fn statements_over_threshold_are_logged_as_slow() {
        assert_eq!(statement_log_level(Duration::from_millis(3)), Level::Debug);
        assert_eq!(statement_log_level(SLOW_STATEMENT_THRESHOLD), Level::Debug);
        assert_eq!(
            statement_log_level(SLOW_STATEMENT_THRESHOLD + Duration::from_millis(1)),
            Level::Warn
        );
        assert_eq!(statement_log_level(Duration::from_secs(30)), Level::Warn);
    }

    #[test]
    fn flatten_sql_keeps_one_line_and_caps_length() {
        let flattened = flatten_sql("SELECT id\n  FROM users\n  WHERE id = ?1;");
        assert_eq!(flattened, "SELECT id FROM users WHERE id = ?1;");

        let long = format!("SELECT {} FROM users;", "name, ".repeat(100));
        let capped = flatten_sql(&long);
        assert!(capped.ends_with("..."));
        assert_eq!(capped.chars().count(), 243);
    }
}
