//! Wide "recent financials" report: one row per stock, one column per
//! metric and period, `_1` being the most recent period.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{ExchangeType, IncomeStatementRecord, Metric, Stock};

/// Report column prefix of each pivoted metric
pub const PIVOT_COLUMNS: [(Metric, &str); 4] = [
    (Metric::Revenue, "revenue"),
    (Metric::GrossProfit, "gross_profit"),
    (Metric::OperatingIncome, "op_income"),
    (Metric::NetIncomeCom, "net_income"),
];

/// `exchange_type, symbol, as_of`, then every metric from the oldest period down to `_1`
pub fn recent_financials_headers(periods: usize) -> Vec<String> {
    let mut headers = vec!["exchange_type".to_string(), "symbol".to_string(), "as_of".to_string()];
    for (_, prefix) in PIVOT_COLUMNS {
        headers.extend((1..=periods).rev().map(|i| format!("{}_{}", prefix, i)));
    }
    headers
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentFinancialsRow {
    pub exchange_type: ExchangeType,
    pub symbol: String,
    /// End date of the newest period, absent when the stock has no statements
    pub as_of: Option<NaiveDate>,
    /// Populated columns only; a value of `None` was stored as undetermined
    values: BTreeMap<String, Option<f64>>,
}

impl RecentFinancialsRow {
    pub fn value(&self, column: &str) -> Option<Option<f64>> {
        self.values.get(column).copied()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn column_count(&self) -> usize {
        self.values.len()
    }
}

/// Pivot each stock's statements (newest first) into a report row.
///
/// Only the first `periods` statements of a stock are used. Columns for
/// periods a stock lacks are left out rather than zero-filled. Rows come back
/// sorted by symbol.
pub fn pivot(stocks: &[Stock], statements: &[IncomeStatementRecord], periods: usize) -> Vec<RecentFinancialsRow> {
    let mut rows: Vec<RecentFinancialsRow> = stocks
        .iter()
        .map(|stock| {
            let own: Vec<&IncomeStatementRecord> = statements
                .iter()
                .filter(|s| s.symbol == stock.symbol)
                .take(periods)
                .collect();

            let mut values = BTreeMap::new();
            for (index, statement) in own.iter().enumerate() {
                for (metric, prefix) in PIVOT_COLUMNS {
                    values.insert(format!("{}_{}", prefix, index + 1), statement.get(metric));
                }
            }

            RecentFinancialsRow {
                exchange_type: stock.exchange_type,
                symbol: stock.symbol.clone(),
                as_of: own.first().map(|s| s.date),
                values,
            }
        })
        .collect();

    rows.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    rows
}
