//! Administrative lookup tool.
//!
//! # Responsibility
//! - Parse operator flags and hand them to `regquery_core::admin`.
//! - Print lookup output verbatim so scripts can depend on it.
//!
//! # Invariants
//! - The wall clock is read once, before anything else; every lookup in one
//!   invocation uses that instant as `now`.
//! - `--db` must name an existing database; lookups never create one.
//! - Buffered log records are flushed before the process exits.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use log::{error, info, Level};
use regquery_core::db::open_existing_db;
use regquery_core::{
    default_log_level, flush_logging, init_logging, lookup, lookup_by_handle, HandleLookupCommand,
    LookupCommand, ObjectKind, SqliteRevisionStore,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "regquery")]
#[command(about = "Show registry objects as of an instant", long_about = None)]
#[command(version)]
struct Cli {
    /// Existing SQLite revision database
    #[arg(long, env = "REGQUERY_DB")]
    db: PathBuf,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, env = "REGQUERY_LOG_LEVEL", default_value_t = default_log_level())]
    log_level: Level,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "REGQUERY_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ReadOptions {
    /// RFC 3339 timestamp to use when reading. May not be in the past.
    #[arg(long, value_parser = parse_timestamp)]
    read_timestamp: Option<DateTime<Utc>>,

    /// Fully expand the requested resources. NOTE: Output may be lengthy.
    #[arg(long)]
    expand: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show hosts by host name
    GetHost {
        #[arg(required = true)]
        host_names: Vec<String>,
        #[command(flatten)]
        read: ReadOptions,
    },
    /// Show domains by domain name
    GetDomain {
        #[arg(required = true)]
        domain_names: Vec<String>,
        #[command(flatten)]
        read: ReadOptions,
    },
    /// Show contacts by contact id
    GetContact {
        #[arg(required = true)]
        contact_ids: Vec<String>,
        #[command(flatten)]
        read: ReadOptions,
    },
    /// Show resources by websafe key
    GetResourceByKey {
        #[arg(required = true)]
        keys: Vec<String>,
        #[command(flatten)]
        read: ReadOptions,
    },
}

fn main() -> Result<()> {
    let now = Utc::now();
    let cli = Cli::parse();

    let result = run(cli, now);
    if let Err(err) = &result {
        error!("event=cli_exit module=cli status=error error={err:#}");
    }
    flush_logging();
    result
}

fn run(cli: Cli, now: DateTime<Utc>) -> Result<()> {
    if let Some(log_dir) = &cli.log_dir {
        init_logging(cli.log_level, log_dir).context("failed to initialize logging")?;
    }

    let conn = open_existing_db(&cli.db)
        .with_context(|| format!("failed to open revision database {}", cli.db.display()))?;
    let store = SqliteRevisionStore::try_new(&conn)?;

    let output = match cli.command {
        Command::GetHost { host_names, read } => {
            lookup(&store, &lookup_command(ObjectKind::Host, host_names, read), now)?
        }
        Command::GetDomain { domain_names, read } => {
            lookup(&store, &lookup_command(ObjectKind::Domain, domain_names, read), now)?
        }
        Command::GetContact { contact_ids, read } => {
            lookup(&store, &lookup_command(ObjectKind::Contact, contact_ids, read), now)?
        }
        Command::GetResourceByKey { keys, read } => lookup_by_handle(
            &store,
            &HandleLookupCommand {
                handles: keys,
                read_timestamp: read.read_timestamp,
                expand: read.expand,
            },
            now,
        )?,
    };

    print!("{output}");
    info!("event=cli_exit module=cli status=ok");
    Ok(())
}

fn lookup_command(kind: ObjectKind, unique_ids: Vec<String>, read: ReadOptions) -> LookupCommand {
    LookupCommand {
        kind,
        unique_ids,
        read_timestamp: read.read_timestamp,
        expand: read.expand,
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|err| format!("expected an RFC 3339 timestamp like 2026-01-01T00:00:00Z: {err}"))
}
