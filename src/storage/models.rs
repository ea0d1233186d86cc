// storage/models.rs
// Database records and rows

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::config::normalize_ticker;

/// A persisted record together with the columns storage assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stored<R> {
    pub id: i64,
    pub created_at_ms: i64,
    #[serde(flatten)]
    pub record: R,
}

/// Side of an options contract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContractType {
    Call,
    Put,
}

/// One market-data poll for a ticker (`stock_updates`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStockUpdate {
    pub ticker: String,
    pub price: f64,
    pub change_percent: f64,
    pub volume: i64,
    #[serde(default)]
    pub rsi: Option<f64>,
    #[serde(default)]
    pub macd: Option<f64>,
    #[serde(default)]
    pub macd_signal: Option<f64>,
    #[serde(default)]
    pub macd_histogram: Option<f64>,
    pub observed_at_ms: i64,
}

/// One options flow print (`option_flow_trades`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOptionFlowTrade {
    pub ticker: String,
    pub contract_type: ContractType,
    pub strike_price: f64,
    /// `YYYY-MM-DD`
    pub expiry_date: String,
    pub premium: f64,
    pub contract_size: i64,
    pub implied_volatility: f64,
    pub traded_at_ms: i64,
    pub is_sweep: bool,
    pub is_opening_position: bool,
}

/// One dark pool block print (`dark_pool_prints`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDarkPoolPrint {
    pub ticker: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM:SS`, exchange local time
    pub print_time: String,
    pub price: f64,
    pub volume: i64,
}

/// A ticker on a user's watchlist (`watchlists`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWatchlistEntry {
    pub user_id: String,
    pub ticker: String,
}

impl NewWatchlistEntry {
    pub fn new(user_id: &str, ticker: &str) -> Self {
        Self {
            user_id: user_id.trim().to_string(),
            ticker: normalize_ticker(ticker),
        }
    }
}

/// An alert waiting in the outbox (`notifications`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: String,
    pub ticker: String,
    pub kind: String,
    pub subject: String,
    pub body: String,
    /// Trading date (`YYYY-MM-DD`) of the analysis behind the alert.
    #[serde(default)]
    pub alert_date: String,
}

/// Alert settings for a user (`user_preferences`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: String,
    pub email: String,
    pub alerts_enabled: bool,
    /// Options flow alerts fire only when the flagged premium reaches this.
    pub min_alert_premium: f64,
}

pub type StockUpdate = Stored<NewStockUpdate>;
pub type OptionFlowTrade = Stored<NewOptionFlowTrade>;
pub type DarkPoolPrint = Stored<NewDarkPoolPrint>;
pub type WatchlistEntry = Stored<NewWatchlistEntry>;
pub type Notification = Stored<NewNotification>;
