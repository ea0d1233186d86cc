//! SQLite table handles.
//!
//! Each handle names a table, lists the columns a record binds to, and decodes
//! the rows `INSERT ... RETURNING *` hands back. Every table has an
//! `id INTEGER PRIMARY KEY` and a `created_at_ms` default.

use std::str::FromStr;

use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite};

use crate::config::SQLITE_MAX_VARIABLES;
use crate::storage::bulk::Table;
use crate::storage::models::{
    ContractType, NewDarkPoolPrint, NewNotification, NewOptionFlowTrade, NewStockUpdate,
    NewWatchlistEntry, Stored,
};

pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// A `Table` the SQLite writer can insert into.
pub trait SqliteTable: Table {
    /// Columns bound by `bind`, in bind order.
    fn columns(&self) -> &'static [&'static str];

    /// Binds one record's values, in `columns` order.
    fn bind<'q>(&self, query: SqliteQuery<'q>, record: &Self::Record) -> SqliteQuery<'q>;

    /// Decodes one returned row.
    fn decode(&self, row: &SqliteRow) -> Result<Self::Row, sqlx::Error>;

    /// Most records one statement can bind without exceeding SQLite's
    /// host parameter limit.
    fn max_rows_per_statement(&self) -> usize {
        (SQLITE_MAX_VARIABLES / self.columns().len().max(1)).max(1)
    }
}

fn stored<R>(row: &SqliteRow, record: R) -> Result<Stored<R>, sqlx::Error> {
    Ok(Stored {
        id: row.try_get("id")?,
        created_at_ms: row.try_get("created_at_ms")?,
        record,
    })
}

/// `stock_updates`
#[derive(Debug, Clone, Copy, Default)]
pub struct StockUpdatesTable;

impl Table for StockUpdatesTable {
    type Record = NewStockUpdate;
    type Row = Stored<NewStockUpdate>;

    fn name(&self) -> &str {
        "stock_updates"
    }
}

impl SqliteTable for StockUpdatesTable {
    fn columns(&self) -> &'static [&'static str] {
        &[
            "ticker",
            "price",
            "change_percent",
            "volume",
            "rsi",
            "macd",
            "macd_signal",
            "macd_histogram",
            "observed_at_ms",
        ]
    }

    fn bind<'q>(&self, query: SqliteQuery<'q>, record: &NewStockUpdate) -> SqliteQuery<'q> {
        query
            .bind(record.ticker.clone())
            .bind(record.price)
            .bind(record.change_percent)
            .bind(record.volume)
            .bind(record.rsi)
            .bind(record.macd)
            .bind(record.macd_signal)
            .bind(record.macd_histogram)
            .bind(record.observed_at_ms)
    }

    fn decode(&self, row: &SqliteRow) -> Result<Self::Row, sqlx::Error> {
        let record = NewStockUpdate {
            ticker: row.try_get("ticker")?,
            price: row.try_get("price")?,
            change_percent: row.try_get("change_percent")?,
            volume: row.try_get("volume")?,
            rsi: row.try_get("rsi")?,
            macd: row.try_get("macd")?,
            macd_signal: row.try_get("macd_signal")?,
            macd_histogram: row.try_get("macd_histogram")?,
            observed_at_ms: row.try_get("observed_at_ms")?,
        };
        stored(row, record)
    }
}

/// `option_flow_trades`
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionFlowTradesTable;

impl Table for OptionFlowTradesTable {
    type Record = NewOptionFlowTrade;
    type Row = Stored<NewOptionFlowTrade>;

    fn name(&self) -> &str {
        "option_flow_trades"
    }
}

impl SqliteTable for OptionFlowTradesTable {
    fn columns(&self) -> &'static [&'static str] {
        &[
            "ticker",
            "contract_type",
            "strike_price",
            "expiry_date",
            "premium",
            "contract_size",
            "implied_volatility",
            "traded_at_ms",
            "is_sweep",
            "is_opening_position",
        ]
    }

    fn bind<'q>(&self, query: SqliteQuery<'q>, record: &NewOptionFlowTrade) -> SqliteQuery<'q> {
        query
            .bind(record.ticker.clone())
            .bind(record.contract_type.as_ref().to_string())
            .bind(record.strike_price)
            .bind(record.expiry_date.clone())
            .bind(record.premium)
            .bind(record.contract_size)
            .bind(record.implied_volatility)
            .bind(record.traded_at_ms)
            .bind(record.is_sweep)
            .bind(record.is_opening_position)
    }

    fn decode(&self, row: &SqliteRow) -> Result<Self::Row, sqlx::Error> {
        let contract_type: String = row.try_get("contract_type")?;
        let record = NewOptionFlowTrade {
            ticker: row.try_get("ticker")?,
            contract_type: ContractType::from_str(&contract_type)
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            strike_price: row.try_get("strike_price")?,
            expiry_date: row.try_get("expiry_date")?,
            premium: row.try_get("premium")?,
            contract_size: row.try_get("contract_size")?,
            implied_volatility: row.try_get("implied_volatility")?,
            traded_at_ms: row.try_get("traded_at_ms")?,
            is_sweep: row.try_get("is_sweep")?,
            is_opening_position: row.try_get("is_opening_position")?,
        };
        stored(row, record)
    }
}

/// `dark_pool_prints`
#[derive(Debug, Clone, Copy, Default)]
pub struct DarkPoolPrintsTable;

impl Table for DarkPoolPrintsTable {
    type Record = NewDarkPoolPrint;
    type Row = Stored<NewDarkPoolPrint>;

    fn name(&self) -> &str {
        "dark_pool_prints"
    }
}

impl SqliteTable for DarkPoolPrintsTable {
    fn columns(&self) -> &'static [&'static str] {
        &["ticker", "date", "print_time", "price", "volume"]
    }

    fn bind<'q>(&self, query: SqliteQuery<'q>, record: &NewDarkPoolPrint) -> SqliteQuery<'q> {
        query
            .bind(record.ticker.clone())
            .bind(record.date.clone())
            .bind(record.print_time.clone())
            .bind(record.price)
            .bind(record.volume)
    }

    fn decode(&self, row: &SqliteRow) -> Result<Self::Row, sqlx::Error> {
        let record = NewDarkPoolPrint {
            ticker: row.try_get("ticker")?,
            date: row.try_get("date")?,
            print_time: row.try_get("print_time")?,
            price: row.try_get("price")?,
            volume: row.try_get("volume")?,
        };
        stored(row, record)
    }
}

/// `watchlists`
#[derive(Debug, Clone, Copy, Default)]
pub struct WatchlistTable;

impl Table for WatchlistTable {
    type Record = NewWatchlistEntry;
    type Row = Stored<NewWatchlistEntry>;

    fn name(&self) -> &str {
        "watchlists"
    }
}

impl SqliteTable for WatchlistTable {
    fn columns(&self) -> &'static [&'static str] {
        &["user_id", "ticker"]
    }

    fn bind<'q>(&self, query: SqliteQuery<'q>, record: &NewWatchlistEntry) -> SqliteQuery<'q> {
        query.bind(record.user_id.clone()).bind(record.ticker.clone())
    }

    fn decode(&self, row: &SqliteRow) -> Result<Self::Row, sqlx::Error> {
        let record = NewWatchlistEntry {
            user_id: row.try_get("user_id")?,
            ticker: row.try_get("ticker")?,
        };
        stored(row, record)
    }
}

/// `notifications`
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationsTable;

impl Table for NotificationsTable {
    type Record = NewNotification;
    type Row = Stored<NewNotification>;

    fn name(&self) -> &str {
        "notifications"
    }
}

impl SqliteTable for NotificationsTable {
    fn columns(&self) -> &'static [&'static str] {
        &["user_id", "ticker", "kind", "subject", "body", "alert_date"]
    }

    fn bind<'q>(&self, query: SqliteQuery<'q>, record: &NewNotification) -> SqliteQuery<'q> {
        query
            .bind(record.user_id.clone())
            .bind(record.ticker.clone())
            .bind(record.kind.clone())
            .bind(record.subject.clone())
            .bind(record.body.clone())
            .bind(record.alert_date.clone())
    }

    fn decode(&self, row: &SqliteRow) -> Result<Self::Row, sqlx::Error> {
        let record = NewNotification {
            user_id: row.try_get("user_id")?,
            ticker: row.try_get("ticker")?,
            kind: row.try_get("kind")?,
            subject: row.try_get("subject")?,
            body: row.try_get("body")?,
            alert_date: row.try_get("alert_date")?,
        };
        stored(row, record)
    }
}
