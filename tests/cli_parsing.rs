//! Tests for CLI subcommand parsing.

use clap::{Args, Parser, Subcommand};
use fund_pipeline::config::{LogFormat, LogLevel};
use fund_pipeline::storage::ImportTable;
use std::path::PathBuf;

// We can't import the CLI types from main.rs, so this mirrors its structure.

#[derive(Debug, Parser)]
#[command(name = "fund_pipeline")]
struct TestCli {
    #[arg(long, global = true, default_value = "./fund_pipeline.db")]
    db_path: PathBuf,
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: TestCommand,
}

#[derive(Debug, Subcommand)]
enum TestCommand {
    Run(TestRunArgs),
    Import(TestImportArgs),
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    #[command(subcommand)]
    Watch(TestWatchCommand),
    #[command(subcommand)]
    Prefs(TestPrefsCommand),
}

#[derive(Debug, Args)]
struct TestRunArgs {
    #[arg(long)]
    once: bool,
    #[arg(long)]
    tickers: Option<String>,
    #[arg(long)]
    ignore_market_hours: bool,
    #[arg(long, default_value_t = 1000)]
    ticker_pause_ms: u64,
    #[arg(long, default_value_t = 100)]
    batch_size: usize,
    #[arg(long)]
    stop_on_error: bool,
}

#[derive(Debug, Args)]
struct TestImportArgs {
    file: PathBuf,
    #[arg(long, value_enum)]
    table: ImportTable,
    #[arg(long, default_value_t = 100)]
    batch_size: usize,
    #[arg(long)]
    continue_on_error: bool,
}

#[derive(Debug, Subcommand)]
enum TestWatchCommand {
    Add { user: String, ticker: String },
    Remove { user: String, ticker: String },
    List { user: String },
}

#[derive(Debug, Subcommand)]
enum TestPrefsCommand {
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

#[test]
fn test_cli_run_defaults() {
    let cli = TestCli::try_parse_from(["fund_pipeline", "run"]).expect("Should parse run");
    assert_eq!(cli.db_path, PathBuf::from("./fund_pipeline.db"));
    assert_eq!(
        log::LevelFilter::from(cli.log_level.clone()),
        log::LevelFilter::Info
    );
    match cli.log_format {
        LogFormat::Plain => {}
        _ => panic!("Should be Plain format"),
    }
    match cli.command {
        TestCommand::Run(args) => {
            assert!(!args.once);
            assert!(!args.ignore_market_hours);
            assert_eq!(args.tickers, None);
            assert_eq!(args.ticker_pause_ms, 1000);
            assert_eq!(args.batch_size, 100);
            assert!(!args.stop_on_error);
        }
        other => panic!("Should parse as Run, got {other:?}"),
    }
}

#[test]
fn test_cli_run_with_flags() {
    let cli = TestCli::try_parse_from([
        "fund_pipeline",
        "run",
        "--once",
        "--tickers",
        "aapl,msft",
        "--ignore-market-hours",
        "--ticker-pause-ms",
        "0",
        "--log-level",
        "debug",
    ])
    .expect("Should parse run flags");

    assert_eq!(
        log::LevelFilter::from(cli.log_level.clone()),
        log::LevelFilter::Debug
    );
    match cli.command {
        TestCommand::Run(args) => {
            assert!(args.once);
            assert!(args.ignore_market_hours);
            assert_eq!(args.tickers.as_deref(), Some("aapl,msft"));
            assert_eq!(args.ticker_pause_ms, 0);
        }
        other => panic!("Should parse as Run, got {other:?}"),
    }
}

#[test]
fn test_cli_import_requires_table() {
    assert!(TestCli::try_parse_from(["fund_pipeline", "import", "rows.jsonl"]).is_err());

    let cli = TestCli::try_parse_from([
        "fund_pipeline",
        "import",
        "rows.jsonl",
        "--table",
        "option-flow-trades",
        "--batch-size",
        "50",
        "--continue-on-error",
    ])
    .expect("Should parse import");

    match cli.command {
        TestCommand::Import(args) => {
            assert_eq!(args.file, PathBuf::from("rows.jsonl"));
            assert_eq!(args.table, ImportTable::OptionFlowTrades);
            assert_eq!(args.batch_size, 50);
            assert!(args.continue_on_error);
        }
        other => panic!("Should parse as Import, got {other:?}"),
    }
}

#[test]
fn test_cli_import_rejects_unknown_table() {
    let result = TestCli::try_parse_from([
        "fund_pipeline",
        "import",
        "rows.jsonl",
        "--table",
        "user_preferences",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_cli_history_and_global_db_path() {
    let cli = TestCli::try_parse_from([
        "fund_pipeline",
        "history",
        "--limit",
        "5",
        "--db-path",
        "/tmp/other.db",
    ])
    .expect("Should parse history");
    assert_eq!(cli.db_path, PathBuf::from("/tmp/other.db"));
    match cli.command {
        TestCommand::History { limit } => assert_eq!(limit, 5),
        other => panic!("Should parse as History, got {other:?}"),
    }
}

#[test]
fn test_cli_watch_subcommands() {
    let cli = TestCli::try_parse_from(["fund_pipeline", "watch", "add", "alice", "nvda"])
        .expect("Should parse watch add");
    match cli.command {
        TestCommand::Watch(TestWatchCommand::Add { user, ticker }) => {
            assert_eq!(user, "alice");
            assert_eq!(ticker, "nvda");
        }
        other => panic!("Should parse as Watch Add, got {other:?}"),
    }

    assert!(TestCli::try_parse_from(["fund_pipeline", "watch", "remove", "alice"]).is_err());
    assert!(TestCli::try_parse_from(["fund_pipeline", "watch", "list", "alice"]).is_ok());
}

#[test]
fn test_cli_prefs_alert_toggle_last_wins() {
    let cli = TestCli::try_parse_from([
        "fund_pipeline",
        "prefs",
        "set",
        "alice",
        "--email",
        "alice@example.com",
        "--alerts",
        "--no-alerts",
        "--min-alert-premium",
        "150000",
    ])
    .expect("Should parse prefs set");

    match cli.command {
        TestCommand::Prefs(TestPrefsCommand::Set {
            alerts,
            no_alerts,
            min_alert_premium,
            ..
        }) => {
            assert!(!alerts);
            assert!(no_alerts);
            assert_eq!(min_alert_premium, 150_000.0);
        }
        other => panic!("Should parse as Prefs Set, got {other:?}"),
    }

    assert!(
        TestCli::try_parse_from(["fund_pipeline", "prefs", "set", "alice"]).is_err(),
        "email is required"
    );
}
