use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::financials::frames::FrameWindow;

pub mod coin_market_cap;
pub mod edgar;
pub mod income_statement;
pub mod modeling_prep;

pub use income_statement::{IncomeStatementCorrection, IncomeStatementRecord, Metric, Scale};

/// Exchange a listed instrument trades on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeType {
    Etf,
    Index,
    Nasdaq,
    Nyse,
}

impl ExchangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeType::Etf => "etf",
            ExchangeType::Index => "index",
            ExchangeType::Nasdaq => "nasdaq",
            ExchangeType::Nyse => "nyse",
        }
    }

    /// Equities are the only instruments with income statements
    pub fn is_equity(&self) -> bool {
        matches!(self, ExchangeType::Nasdaq | ExchangeType::Nyse)
    }
}

impl std::fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the stock roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub exchange_type: ExchangeType,
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub central_index_key: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
}

/// High/low for one symbol on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StockPrice {
    pub exchange_type: String,
    pub symbol: String,
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
}

/// Crypto listing snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CryptoPrice {
    pub rank: u32,
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub market_cap: f64,
    pub last_day_change: f64,
    pub last_week_change: f64,
    pub last_month_change: f64,
    pub two_months_change: f64,
    pub three_months_change: f64,
}

/// Which upstream supplies income statements for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum IncomeSource {
    /// SEC company facts
    Filings,
    /// Financial Modeling Prep quarterly statements
    Vendor,
}

/// Column set of the `income_statements` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SchemaVariant {
    Reduced,
    Full,
}

impl SchemaVariant {
    pub fn metrics(&self) -> &'static [Metric] {
        match self {
            SchemaVariant::Reduced => &Metric::CORE,
            SchemaVariant::Full => &Metric::ALL,
        }
    }
}

/// How an undetermined value is written at the output boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SentinelPolicy {
    /// Write `0`, indistinguishable from a reported zero
    #[default]
    LegacyZero,
    /// Write SQL NULL / an empty cell
    Null,
}

impl SentinelPolicy {
    pub fn apply(&self, value: Option<f64>) -> Option<f64> {
        match (self, value) {
            (_, Some(value)) => Some(value),
            (SentinelPolicy::LegacyZero, None) => Some(0.0),
            (SentinelPolicy::Null, None) => None,
        }
    }

    pub fn render(&self, value: Option<f64>) -> String {
        self.apply(value).map(|v| v.to_string()).unwrap_or_default()
    }
}

/// Datasets to refresh on one pipeline run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub update_stock_list: bool,
    pub update_income_statements: bool,
    pub upsert_corrections: bool,
    pub update_stock_prices: bool,
    pub update_crypto: bool,
    pub income_source: IncomeSource,
    pub schema: SchemaVariant,
    pub sentinel: SentinelPolicy,
    /// When non-empty, only these symbols are seeded from upstream
    pub new_stocks: Vec<String>,
    pub frame_window: FrameWindow,
    pub recent_periods: usize,
    pub statements_start_year: i32,
    pub historic_prices_from: NaiveDate,
    pub crypto_count: u32,
}

impl RunConfig {
    pub fn new(frame_window: FrameWindow) -> Self {
        Self {
            update_stock_list: false,
            update_income_statements: true,
            upsert_corrections: false,
            update_stock_prices: false,
            update_crypto: false,
            income_source: IncomeSource::Filings,
            schema: SchemaVariant::Reduced,
            sentinel: SentinelPolicy::LegacyZero,
            new_stocks: Vec::new(),
            frame_window,
            recent_periods: 8,
            statements_start_year: 2018,
            historic_prices_from: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default(),
            crypto_count: 200,
        }
    }

    pub fn should_seed(&self, symbol: &str) -> bool {
        self.new_stocks.is_empty() || self.new_stocks.iter().any(|s| s == symbol)
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub edgar_user_agent: Option<String>,
    pub modeling_prep_api_key: Option<String>,
    pub coin_market_cap_api_key: Option<String>,
    pub database_url: String,
    pub database_max_connections: u32,
    pub stock_list_csv: PathBuf,
    pub recent_financials_csv: PathBuf,
    pub income_statement_corrections_csv: PathBuf,
    pub stock_prices_csv: PathBuf,
    pub crypto_prices_csv: PathBuf,
    pub fetch_delay_ms: u64,
    pub edgar_delay_ms: u64,
    pub postgres_delay_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let path_or = |key: &str, default: &str| PathBuf::from(non_empty(key).unwrap_or_else(|| default.to_string()));
        let number_or = |key: &str, default: u64| -> Result<u64> {
            match non_empty(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("{} must be a non-negative integer, got {:?}", key, raw)),
                None => Ok(default),
            }
        };

        let database_url = match non_empty("DATABASE_URL") {
            Some(url) => url,
            None => {
                let host = non_empty("POSTGRES_HOST").unwrap_or_else(|| "localhost".to_string());
                let port = non_empty("POSTGRES_PORT").unwrap_or_else(|| "5432".to_string());
                let user = non_empty("POSTGRES_USER").unwrap_or_else(|| "postgres".to_string());
                let database = non_empty("POSTGRES_DB").unwrap_or_else(|| "stocks".to_string());
                match non_empty("POSTGRES_PASSWORD") {
                    Some(password) => format!("postgres://{}:{}@{}:{}/{}", user, password, host, port, database),
                    None => format!("postgres://{}@{}:{}/{}", user, host, port, database),
                }
            }
        };

        Ok(Config {
            edgar_user_agent: non_empty("EDGAR_SEC_USER_AGENT"),
            modeling_prep_api_key: non_empty("FINANCIAL_MODELING_PREP_API_KEY"),
            coin_market_cap_api_key: non_empty("COIN_MARKET_CAP_API_KEY"),
            database_url,
            database_max_connections: number_or("POSTGRES_MAX_CONNECTIONS", 5)? as u32,
            stock_list_csv: path_or("PATH_TO_STOCK_LIST_CSV", "data/stocks.csv"),
            recent_financials_csv: path_or("PATH_TO_RECENT_FINANCIALS_CSV", "data/recent_financials.csv"),
            income_statement_corrections_csv: path_or(
                "PATH_TO_INCOME_STATEMENT_CORRECTIONS_CSV",
                "data/income_statement_corrections.csv",
            ),
            stock_prices_csv: path_or("PATH_TO_STOCK_PRICES_CSV", "data/stock_prices.csv"),
            crypto_prices_csv: path_or("PATH_TO_CRYPTO_PRICES_CSV", "data/crypto_prices.csv"),
            fetch_delay_ms: number_or("FETCH_SLEEP_TIMEOUT_MS", 50)?,
            edgar_delay_ms: number_or("EDGAR_SLEEP_TIMEOUT_MS", 150)?,
            postgres_delay_ms: number_or("POSTGRES_SLEEP_TIMEOUT_MS", 50)?,
        })
    }

    /// Fail before any work when an enabled dataset lacks its credential
    pub fn require_credentials(&self, run: &RunConfig) -> Result<()> {
        if run.update_income_statements {
            match run.income_source {
                IncomeSource::Filings if self.edgar_user_agent.is_none() => {
                    return Err(anyhow!("EDGAR_SEC_USER_AGENT environment variable required for filings data"));
                }
                IncomeSource::Vendor if self.modeling_prep_api_key.is_none() => {
                    return Err(anyhow!(
                        "FINANCIAL_MODELING_PREP_API_KEY environment variable required for vendor statements"
                    ));
                }
                _ => {}
            }
        }
        if run.update_stock_prices && self.modeling_prep_api_key.is_none() {
            return Err(anyhow!("FINANCIAL_MODELING_PREP_API_KEY environment variable required for stock prices"));
        }
        if run.update_crypto && self.coin_market_cap_api_key.is_none() {
            return Err(anyhow!("COIN_MARKET_CAP_API_KEY environment variable required for crypto listings"));
        }
        Ok(())
    }
}
