//! Financial Modeling Prep payloads

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `financials/income-statement` returns a list envelope for several symbols
/// and a bare object for one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FinancialsResponse {
    Many {
        #[serde(rename = "financialStatementList")]
        financial_statement_list: Vec<VendorIncomeStatements>,
    },
    One(VendorIncomeStatements),
    Empty {},
}

impl FinancialsResponse {
    pub fn into_statements(self) -> Vec<VendorIncomeStatements> {
        match self {
            FinancialsResponse::Many { financial_statement_list } => financial_statement_list,
            FinancialsResponse::One(statements) => vec![statements],
            FinancialsResponse::Empty {} => Vec::new(),
        }
    }
}

/// Quarterly statements of one symbol
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VendorIncomeStatements {
    pub symbol: String,
    #[serde(default)]
    pub financials: Vec<VendorStatementRow>,
}

/// One reported quarter: a date plus field name -> value pairs such as
/// `"Net Income Com": "14125000000.0"`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VendorStatementRow {
    pub date: String,
    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
}

impl VendorStatementRow {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }
}

/// `historical-price-full` response, list envelope or single symbol
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HistoricPriceResponse {
    Many {
        #[serde(rename = "historicalStockList")]
        historical_stock_list: Vec<HistoricPrices>,
    },
    One(HistoricPrices),
    Empty {},
}

impl HistoricPriceResponse {
    pub fn into_prices(self) -> Vec<HistoricPrices> {
        match self {
            HistoricPriceResponse::Many { historical_stock_list } => historical_stock_list,
            HistoricPriceResponse::One(prices) => vec![prices],
            HistoricPriceResponse::Empty {} => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoricPrices {
    pub symbol: String,
    #[serde(default)]
    pub historical: Vec<HistoricBar>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HistoricBar {
    pub date: chrono::NaiveDate,
    pub high: f64,
    pub low: f64,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
}

/// Current quote of one symbol from `quote/{a,b,…}`. Indexes carry no
/// market cap or share count.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub shares_outstanding: Option<f64>,
}
