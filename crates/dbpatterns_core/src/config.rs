//! Connection settings resolved from `DB_*` environment variables.
//!
//! # Responsibility
//! - Declare the `DB_*` variables as clap arguments with environment
//!   fallbacks, so command-line flags and the environment share one path.
//! - Render the network-style DSN used in logs and diagnostics.
//! - Map the logical database name onto an embedded SQLite file path.
//!
//! # Invariants
//! - User and password fall back together: when either is unset or empty
//!   both become the placeholder pair.
//! - Rendered DSNs always carry charset and time-parsing options.

use clap::Args;
use std::path::PathBuf;

pub const ENV_USER: &str = "DB_USER";
pub const ENV_PASS: &str = "DB_PASS";
pub const ENV_HOST: &str = "DB_HOST";
pub const ENV_PORT: &str = "DB_PORT";
pub const ENV_NAME: &str = "DB_NAME";
pub const ENV_DATA_DIR: &str = "DB_DATA_DIR";

const DEFAULT_USER: &str = "root";
const DEFAULT_PASSWORD: &str = "password";
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: &str = "3306";
const DEFAULT_DATA_DIR: &str = ".";
const DSN_OPTIONS: &str = "charset=utf8mb4&parseTime=True&loc=Local";
const DB_FILE_EXTENSION: &str = "sqlite3";

/// Default database names, one per demonstration.
pub const COMPANY_DB: &str = "company_db";
pub const BLOG_DB: &str = "blog_db";
pub const SCHOOL_DB: &str = "school_db";

/// Raw connection inputs. Each field is read from its flag, then from the
/// matching `DB_*` variable.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionArgs {
    /// Database user (paired with the password)
    #[arg(long = "db-user", env = "DB_USER", global = true)]
    pub user: Option<String>,

    /// Database password (paired with the user)
    #[arg(long = "db-pass", env = "DB_PASS", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Database host, rendered into the DSN
    #[arg(long = "db-host", env = "DB_HOST", global = true)]
    pub host: Option<String>,

    /// Database port, rendered into the DSN
    #[arg(long = "db-port", env = "DB_PORT", global = true)]
    pub port: Option<String>,

    /// Logical database name; selects `<data dir>/<name>.sqlite3`
    #[arg(long = "db-name", env = "DB_NAME", global = true)]
    pub database: Option<String>,

    /// Directory holding the SQLite database files
    #[arg(long = "db-data-dir", env = "DB_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,
}

impl ConnectionArgs {
    /// Applies fallbacks and returns the resolved settings.
    ///
    /// Empty values are treated the same as missing ones.
    pub fn resolve(&self, default_database: &str) -> ConnectionSettings {
        let non_blank =
            |value: &Option<String>| value.clone().filter(|value| !value.trim().is_empty());

        let (user, password) = match (non_blank(&self.user), non_blank(&self.password)) {
            (Some(user), Some(password)) => (user, password),
            _ => (DEFAULT_USER.to_string(), DEFAULT_PASSWORD.to_string()),
        };

        ConnectionSettings {
            user,
            password,
            host: non_blank(&self.host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: non_blank(&self.port).unwrap_or_else(|| DEFAULT_PORT.to_string()),
            database: non_blank(&self.database)
                .unwrap_or_else(|| default_database.to_string()),
            data_dir: self
                .data_dir
                .clone()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        }
    }
}

/// Fully resolved connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: String,
    pub database: String,
    pub data_dir: PathBuf,
}

impl ConnectionSettings {
    /// `user:password@tcp(host:port)/database?options`
    pub fn dsn(&self) -> String {
        self.render_dsn(self.password.as_str())
    }

    /// Same as [`Self::dsn`] with the password masked, safe for logs.
    pub fn redacted_dsn(&self) -> String {
        self.render_dsn("****")
    }

    /// Location of the embedded database file for this database name.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}.{DB_FILE_EXTENSION}", self.database))
    }

    fn render_dsn(&self, password: &str) -> String {
        format!(
            "{}:{}@tcp({}:{})/{}?{DSN_OPTIONS}",
            self.user, password, self.host, self.port, self.database
        )
    }
}
