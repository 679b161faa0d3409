//! Schema migrations for the blog, company and school tables.
//!
//! # Responsibility
//! - Keep the numbered schema steps in one ordered table.
//! - Bring a connection from its recorded version to the latest one.
//!
//! # Invariants
//! - Step versions start at 1 and increase by exactly one.
//! - Each step runs in its own transaction together with the
//!   `PRAGMA user_version` bump, so a failed step leaves the previous
//!   version recorded.
//! - A database newer than this binary is never touched.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "blog",
        sql: include_str!("0001_blog.sql"),
    },
    SchemaStep {
        version: 2,
        name: "company",
        sql: include_str!("0002_company.sql"),
    },
    SchemaStep {
        version: 3,
        name: "school",
        sql: include_str!("0003_school.sql"),
    },
];

/// Version of the newest schema step compiled into this binary.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Runs every step newer than the connection's recorded version.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let recorded = recorded_version(conn)?;
    let latest = latest_version();
    if recorded > latest {
        error!(
            "event=db_migrate module=db status=error error_code=schema_too_new db_version={recorded} latest_supported={latest}"
        );
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: recorded,
            latest_supported: latest,
        });
    }

    let pending = SCHEMA_STEPS.iter().filter(|step| step.version > recorded);
    for step in pending {
        let started_at = Instant::now();
        let tx = conn.transaction()?;
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        tx.commit()?;
        info!(
            "event=db_migrate module=db status=ok version={} name={} duration_ms={}",
            step.version,
            step.name,
            started_at.elapsed().as_millis()
        );
    }
    Ok(())
}

fn recorded_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
