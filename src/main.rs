//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `fund_pipeline` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use fund_pipeline::config::{
    normalize_ticker, parse_ticker_list, Config, LogFormat, LogLevel, DB_PATH, DEFAULT_BATCH_SIZE,
    DEFAULT_TICKER_PAUSE_MS,
};
use fund_pipeline::initialization::init_logger_with;
use fund_pipeline::notify::LogNotifier;
use fund_pipeline::sources::DemoSource;
use fund_pipeline::storage::models::UserPreferences;
use fund_pipeline::storage::users::{
    add_to_watchlist, get_preferences, list_watchlist, remove_from_watchlist, upsert_preferences,
};
use fund_pipeline::storage::{
    import_jsonl, init_db_pool_with_path, query_job_history, run_migrations, BulkInsertOptions,
    ImportTable, SqliteWriter,
};
use fund_pipeline::{run_once, run_scheduler, JobContext};

#[derive(Debug, Parser)]
#[command(name = "fund_pipeline", version, about = "Market data pipeline with batched SQLite writes")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "FUND_PIPELINE_DB", default_value = DB_PATH)]
    db_path: PathBuf,

    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the polling jobs
    Run(RunArgs),
    /// Bulk-insert a JSONL file into a table
    Import(ImportArgs),
    /// Show completed job runs
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Manage watchlists
    #[command(subcommand)]
    Watch(WatchCommand),
    /// Manage alert preferences
    #[command(subcommand)]
    Prefs(PrefsCommand),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Run every job once and exit
    #[arg(long)]
    once: bool,

    /// Comma-separated tickers (defaults to TRACKED_TICKERS or the built-in list)
    #[arg(long)]
    tickers: Option<String>,

    /// Run jobs outside regular trading hours
    #[arg(long)]
    ignore_market_hours: bool,

    #[arg(long, default_value_t = DEFAULT_TICKER_PAUSE_MS)]
    ticker_pause_ms: u64,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Abort a bulk write at the first failed chunk
    #[arg(long)]
    stop_on_error: bool,
}

#[derive(Debug, Args)]
struct ImportArgs {
    /// JSONL file, one record per line
    file: PathBuf,

    #[arg(long, value_enum)]
    table: ImportTable,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Keep going when a chunk fails
    #[arg(long)]
    continue_on_error: bool,
}

#[derive(Debug, Subcommand)]
enum WatchCommand {
    Add { user: String, ticker: String },
    Remove { user: String, ticker: String },
    List { user: String },
}

#[derive(Debug, Subcommand)]
enum PrefsCommand {
    Set {
        user: String,
        #[arg(long)]
        email: String,
        #[arg(long, overrides_with = "no_alerts")]
        alerts: bool,
        #[arg(long, overrides_with = "alerts")]
        no_alerts: bool,
        #[arg(long, default_value_t = 0.0)]
        min_alert_premium: f64,
    },
    Show { user: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();
    init_logger_with(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    if let Err(e) = dispatch(cli).await {
        eprintln!("fund_pipeline error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn open_pool(cli: &Cli) -> Result<SqlitePool> {
    let pool = init_db_pool_with_path(&cli.db_path)
        .await
        .context("Failed to initialize database pool")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(pool.as_ref().clone())
}

async fn dispatch(cli: Cli) -> Result<()> {
    let pool = open_pool(&cli).await?;

    match cli.command {
        Command::Run(args) => {
            let config = Config {
                log_level: cli.log_level,
                log_format: cli.log_format,
                db_path: cli.db_path,
                tickers: match args.tickers.as_deref().map(parse_ticker_list) {
                    Some(list) if !list.is_empty() => list,
                    _ => Config::default().tickers,
                },
                batch_size: args.batch_size,
                continue_on_error: !args.stop_on_error,
                respect_market_hours: !args.ignore_market_hours,
                ticker_pause_ms: args.ticker_pause_ms,
            };
            run(pool, config, args.once).await
        }
        Command::Import(args) => {
            let writer = SqliteWriter::new(pool);
            let summary = import_jsonl(
                &writer,
                args.table,
                &args.file,
                BulkInsertOptions::new(args.batch_size, args.continue_on_error),
            )
            .await
            .with_context(|| format!("Failed to import {}", args.file.display()))?;

            println!(
                "Imported {} of {} records into {}",
                summary.inserted, summary.submitted, summary.table
            );
            for failure in &summary.failed_chunks {
                println!("  {}", failure);
            }
            Ok(())
        }
        Command::History { limit } => {
            let runs = query_job_history(&pool, Some(limit))
                .await
                .context("Failed to query job history")?;
            if runs.is_empty() {
                println!("No completed job runs");
            }
            for run in runs {
                let started = Utc
                    .timestamp_millis_opt(run.start_time_ms)
                    .single()
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| run.start_time_ms.to_string());
                println!(
                    "{}  {:<12} {}/{} tickers, {} rows in {:.1}s",
                    started,
                    run.job_name,
                    run.tickers_succeeded,
                    run.tickers_total,
                    run.rows_written,
                    run.elapsed_seconds.unwrap_or(0.0)
                );
            }
            Ok(())
        }
        Command::Watch(command) => watch(&pool, command).await,
        Command::Prefs(command) => prefs(&pool, command).await,
    }
}

async fn run(pool: SqlitePool, config: Config, once: bool) -> Result<()> {
    let cancel = CancellationToken::new();
    let ctx = JobContext::new(pool.clone(), DemoSource::new(), LogNotifier, config)
        .with_cancellation(cancel.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Received Ctrl-C, shutting down");
            cancel.cancel();
        }
    });

    if once {
        let reports = run_once(&ctx, Utc::now()).await?;
        for report in reports {
            if report.skipped {
                println!("{}: skipped (market closed)", report.job);
            } else {
                println!(
                    "{}: {}/{} tickers, {} rows, {} alerts in {:.1}s",
                    report.job,
                    report.tickers_succeeded,
                    report.tickers_total,
                    report.rows_written,
                    report.alerts_queued,
                    report.elapsed_seconds
                );
            }
        }
    } else {
        run_scheduler(&ctx).await?;
    }

    if let Err(e) = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
        .execute(&pool)
        .await
    {
        log::warn!("Failed to checkpoint WAL file (this is non-critical): {}", e);
    }
    Ok(())
}

async fn watch(pool: &SqlitePool, command: WatchCommand) -> Result<()> {
    match command {
        WatchCommand::Add { user, ticker } => {
            let added = add_to_watchlist(pool, &user, &ticker).await?;
            println!("{}", watch_message(&user, &ticker, true, added));
        }
        WatchCommand::Remove { user, ticker } => {
            let removed = remove_from_watchlist(pool, &user, &ticker).await?;
            println!("{}", watch_message(&user, &ticker, false, removed));
        }
        WatchCommand::List { user } => {
            let tickers = list_watchlist(pool, &user).await?;
            if tickers.is_empty() {
                println!("{} watches nothing", user);
            } else {
                println!("{}", tickers.join("\n"));
            }
        }
    }
    Ok(())
}

/// Reports a watchlist change using the ticker as storage normalized it.
fn watch_message(user: &str, ticker: &str, adding: bool, changed: bool) -> String {
    let ticker = normalize_ticker(ticker);
    match (adding, changed) {
        (true, true) => format!("{} now watches {}", user, ticker),
        (true, false) => format!("{} already watches {}", user, ticker),
        (false, true) => format!("{} no longer watches {}", user, ticker),
        (false, false) => format!("{} was not watching {}", user, ticker),
    }
}

async fn prefs(pool: &SqlitePool, command: PrefsCommand) -> Result<()> {
    match command {
        PrefsCommand::Set {
            user,
            email,
            alerts: _,
            no_alerts,
            min_alert_premium,
        } => {
            let prefs = UserPreferences {
                user_id: user,
                email,
                alerts_enabled: !no_alerts,
                min_alert_premium,
            };
            upsert_preferences(pool, &prefs).await?;
            println!(
                "Saved preferences for {} (alerts {}, min premium {:.2})",
                prefs.user_id,
                if prefs.alerts_enabled { "on" } else { "off" },
                prefs.min_alert_premium
            );
        }
        PrefsCommand::Show { user } => match get_preferences(pool, &user).await? {
            Some(prefs) => println!("{}", serde_json::to_string_pretty(&prefs)?),
            None => println!("No preferences for {}", user),
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_message_shows_stored_ticker() {
        assert_eq!(watch_message("alice", " aapl ", true, true), "alice now watches AAPL");
        assert_eq!(watch_message("alice", "msft\t", true, false), "alice already watches MSFT");
        assert_eq!(watch_message("bob", " nvda", false, true), "bob no longer watches NVDA");
        assert_eq!(watch_message("bob", "tsla", false, false), "bob was not watching TSLA");
    }
}
