//! Flat-file inputs (stock roster, manual corrections) and report outputs.

use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use thiserror::Error;
use tracing::{info, warn};

use crate::financials::prices::{StockPriceSummary, STOCK_PRICES_HEADERS};
use crate::financials::RecentFinancialsRow;
use crate::models::{Config, CryptoPrice, IncomeStatementCorrection, Stock};

pub const CRYPTO_PRICES_HEADERS: [&str; 10] = [
    "rank",
    "symbol",
    "name",
    "price",
    "market_cap",
    "last_day_change",
    "last_week_change",
    "last_month_change",
    "two_months_change",
    "three_months_change",
];

const CORRECTION_FIELDS: usize = 6;

#[derive(Debug, Error)]
pub enum CsvStoreError {
    #[error("could not read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("could not write {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("could not create {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} line {line}: stock has no symbol", .path.display())]
    MissingSymbol { path: PathBuf, line: u64 },
}

/// A report row that can be rendered cell by cell; unknown cells are empty
pub trait TabularRow {
    fn cell(&self, header: &str) -> Option<String>;
}

/// The stock roster
pub fn read_stocks(path: &Path) -> Result<Vec<Stock>, CsvStoreError> {
    let read_error = |source| CsvStoreError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_path(path).map_err(read_error)?;

    let mut stocks = Vec::new();
    for result in reader.deserialize::<Stock>() {
        let stock = result.map_err(read_error)?;
        if stock.symbol.is_empty() {
            return Err(CsvStoreError::MissingSymbol {
                path: path.to_path_buf(),
                line: stocks.len() as u64 + 2,
            });
        }
        stocks.push(stock);
    }

    info!("📋 Read {} stocks from {}", stocks.len(), path.display());
    Ok(stocks)
}

/// Manual corrections, up to the first row with an empty field
pub fn read_corrections(path: &Path) -> Result<Vec<IncomeStatementCorrection>, CsvStoreError> {
    let read_error = |source| CsvStoreError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(read_error)?;
    let headers = reader.headers().map_err(read_error)?.clone();

    let mut corrections = Vec::new();
    for result in reader.records() {
        let record: StringRecord = result.map_err(read_error)?;
        if record.len() < CORRECTION_FIELDS || record.iter().take(CORRECTION_FIELDS).any(str::is_empty) {
            warn!("⚠️ Stopping at incomplete correction row {}", corrections.len() + 2);
            break;
        }
        corrections.push(record.deserialize(Some(&headers)).map_err(read_error)?);
    }

    info!("📋 Read {} income statement corrections", corrections.len());
    Ok(corrections)
}

/// One header line, then one line per row; cells a row lacks are empty
pub fn write_rows<R, H>(path: &Path, headers: &[H], rows: &[R]) -> Result<(), CsvStoreError>
where
    R: TabularRow,
    H: AsRef<str>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| CsvStoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let write_error = |source| CsvStoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = WriterBuilder::new().from_path(path).map_err(write_error)?;
    writer
        .write_record(headers.iter().map(|h| h.as_ref()))
        .map_err(write_error)?;
    for row in rows {
        let cells: Vec<String> = headers.iter().map(|h| row.cell(h.as_ref()).unwrap_or_default()).collect();
        writer.write_record(&cells).map_err(write_error)?;
    }
    writer.flush().map_err(|source| write_error(csv::Error::from(source)))?;

    info!("📝 Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Configured file locations
#[derive(Debug, Clone)]
pub struct CsvStore {
    pub stock_list: PathBuf,
    pub recent_financials: PathBuf,
    pub corrections: PathBuf,
    pub stock_prices: PathBuf,
    pub crypto_prices: PathBuf,
}

impl CsvStore {
    pub fn from_config(config: &Config) -> Self {
        Self {
            stock_list: config.stock_list_csv.clone(),
            recent_financials: config.recent_financials_csv.clone(),
            corrections: config.income_statement_corrections_csv.clone(),
            stock_prices: config.stock_prices_csv.clone(),
            crypto_prices: config.crypto_prices_csv.clone(),
        }
    }

    pub fn read_stocks(&self) -> Result<Vec<Stock>, CsvStoreError> {
        read_stocks(&self.stock_list)
    }

    pub fn read_corrections(&self) -> Result<Vec<IncomeStatementCorrection>, CsvStoreError> {
        read_corrections(&self.corrections)
    }

    pub fn write_recent_financials(&self, headers: &[String], rows: &[RecentFinancialsRow]) -> Result<(), CsvStoreError> {
        write_rows(&self.recent_financials, headers, rows)
    }

    pub fn write_stock_prices(&self, rows: &[StockPriceSummary]) -> Result<(), CsvStoreError> {
        write_rows(&self.stock_prices, &STOCK_PRICES_HEADERS, rows)
    }

    pub fn write_crypto_prices(&self, rows: &[CryptoPrice]) -> Result<(), CsvStoreError> {
        write_rows(&self.crypto_prices, &CRYPTO_PRICES_HEADERS, rows)
    }
}

impl TabularRow for RecentFinancialsRow {
    fn cell(&self, header: &str) -> Option<String> {
        match header {
            "exchange_type" => Some(self.exchange_type.to_string()),
            "symbol" => Some(self.symbol.clone()),
            "as_of" => self.as_of.map(|d| d.format("%Y-%m-%d").to_string()),
            column => self.value(column).flatten().map(|v| v.to_string()),
        }
    }
}

impl TabularRow for StockPriceSummary {
    fn cell(&self, header: &str) -> Option<String> {
        match header {
            "exchange_type" => Some(self.stock.exchange_type.to_string()),
            "symbol" => Some(self.stock.symbol.clone()),
            "name" => Some(self.stock.name.clone()),
            "sector" => self.stock.sector.clone(),
            "industry" => self.stock.industry.clone(),
            "price" => self.price.map(|v| v.to_string()),
            "shares" => self.shares.map(|v| v.to_string()),
            "mkt_cap" => self.market_cap.map(|v| v.to_string()),
            column => STOCK_PRICES_HEADERS[8..]
                .iter()
                .position(|h| *h == column)
                .map(|i| self.lookbacks[i].to_string()),
        }
    }
}

impl TabularRow for CryptoPrice {
    fn cell(&self, header: &str) -> Option<String> {
        let value = match header {
            "rank" => self.rank.to_string(),
            "symbol" => self.symbol.clone(),
            "name" => self.name.clone(),
            "price" => self.price.to_string(),
            "market_cap" => self.market_cap.to_string(),
            "last_day_change" => self.last_day_change.to_string(),
            "last_week_change" => self.last_week_change.to_string(),
            "last_month_change" => self.last_month_change.to_string(),
            "two_months_change" => self.two_months_change.to_string(),
            "three_months_change" => self.three_months_change.to_string(),
            _ => return None,
        };
        Some(value)
    }
}
