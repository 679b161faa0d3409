//! `dbpatterns` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments, load `.env`, and start logging.
//! - Dispatch to one fixed demonstration script per subcommand.
//! - Map setup failures to exit code 1.

mod blog;
mod company;
mod school;

use clap::{Parser, Subcommand};
use dbpatterns_core::db::{create_pool, DbPool, PoolLimits};
use dbpatterns_core::{default_log_level, init_logging, ConnectionArgs};
use log::{error, info};
use std::error::Error;
use std::process::ExitCode;

pub(crate) type SetupResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(
    name = "dbpatterns",
    version,
    about = "Relational access pattern demonstrations over an embedded SQLite store"
)]
struct Cli {
    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true, default_value_t = default_log_level().to_string())]
    log_level: String,

    /// Absolute directory for rotating log files; logs go to stderr when omitted
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Commands {
    /// Raw mapped queries over the employees table
    Company,
    /// User/post/comment graph with hook-maintained counters
    Blog,
    /// Basic create/find/update/delete over the students table
    School,
}

impl Commands {
    fn name(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Blog => "blog",
            Self::School => "school",
        }
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli.log_level, cli.log_dir.as_deref()) {
        eprintln!("failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    let demo = cli.command.name();
    info!("event=demo_run module=cli status=start demo={demo}");
    let outcome = match cli.command {
        Commands::Company => company::run(&cli.connection),
        Commands::Blog => blog::run(&cli.connection),
        Commands::School => school::run(&cli.connection),
    };

    match outcome {
        Ok(()) => {
            info!("event=demo_run module=cli status=ok demo={demo}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=demo_run module=cli status=error demo={demo} error={err}");
            eprintln!("{demo}: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Resolves settings for `default_database` and opens a migrated pool.
pub(crate) fn connect(
    connection: &ConnectionArgs,
    default_database: &str,
    limits: PoolLimits,
) -> SetupResult<DbPool> {
    let settings = connection.resolve(default_database);
    info!(
        "event=db_connect module=cli status=start dsn={} path={}",
        settings.redacted_dsn(),
        settings.database_path().display()
    );
    let pool = create_pool(settings.database_path(), limits)?;
    println!("connected to {}", settings.database);
    Ok(pool)
}

/// Logs and prints a failed demonstration query; the script keeps going.
pub(crate) fn report(query: &str, err: &dyn Error) {
    error!("event=demo_query module=cli status=error query={query} error={err}");
    println!("query failed: {err}");
}
