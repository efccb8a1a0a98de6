//! Shape of the recent financials report

use std::fs;

use chrono::Duration;
use pretty_assertions::assert_eq;
use stock_financials::csv_store::CsvStore;
use stock_financials::financials::{pivot, recent_financials_headers};
use stock_financials::models::{ExchangeType, IncomeStatementRecord, Metric};
use tempfile::TempDir;

use crate::common::test_data::{create_test_stock, date};

/// `count` quarterly statements, newest first, revenue counting down from `count`
fn statements(symbol: &str, count: usize) -> Vec<IncomeStatementRecord> {
    (0..count)
        .map(|i| {
            IncomeStatementRecord::new(symbol, date("2024-03-31") - Duration::days(91 * i as i64))
                .with(Metric::Revenue, (count - i) as f64)
                .with(Metric::NetIncomeCom, 1.5)
        })
        .collect()
}

#[test]
fn test_only_recent_periods_are_pivoted() {
    let stocks = vec![
        create_test_stock(ExchangeType::Nyse, "MSFT", None),
        create_test_stock(ExchangeType::Nasdaq, "AAPL", None),
        create_test_stock(ExchangeType::Etf, "SPY", None),
    ];
    let mut all = statements("AAPL", 10);
    all.extend(statements("MSFT", 3));

    let rows = pivot(&stocks, &all, 8);
    let symbols: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAPL", "MSFT", "SPY"]);

    let aapl = &rows[0];
    assert_eq!(aapl.as_of, Some(date("2024-03-31")));
    assert_eq!(aapl.column_count(), 32);
    assert_eq!(aapl.value("revenue_1"), Some(Some(10.0)));
    assert_eq!(aapl.value("revenue_8"), Some(Some(3.0)));
    assert_eq!(aapl.value("revenue_9"), None);
    assert_eq!(aapl.value("gross_profit_1"), Some(None));

    assert_eq!(rows[1].column_count(), 12);
    assert_eq!(rows[2].as_of, None);
    assert_eq!(rows[2].column_count(), 0);
}

#[test]
fn test_report_has_one_cell_per_header() {
    let dir = TempDir::new().unwrap();
    let store = CsvStore {
        stock_list: dir.path().join("stocks.csv"),
        recent_financials: dir.path().join("recent_financials.csv"),
        corrections: dir.path().join("corrections.csv"),
        stock_prices: dir.path().join("stock_prices.csv"),
        crypto_prices: dir.path().join("crypto_prices.csv"),
    };
    let stocks = vec![create_test_stock(ExchangeType::Nasdaq, "AAPL", None)];
    let headers = recent_financials_headers(8);
    assert_eq!(headers.len(), 35);

    store
        .write_recent_financials(&headers, &pivot(&stocks, &statements("AAPL", 2), 8))
        .unwrap();

    let written = fs::read_to_string(&store.recent_financials).unwrap();
    let mut reader = csv::Reader::from_reader(written.as_bytes());
    let header_row = reader.headers().unwrap().clone();
    assert_eq!(header_row.len(), 35);
    assert_eq!(&header_row[3], "revenue_8");
    assert_eq!(&header_row[10], "revenue_1");

    let row = reader.records().next().unwrap().unwrap();
    assert_eq!(row.len(), 35);
    assert_eq!(&row[0], "nasdaq");
    assert_eq!(&row[2], "2024-03-31");
    assert_eq!(&row[3], "");
    assert_eq!(&row[9], "1");
    assert_eq!(&row[10], "2");
    assert_eq!(&row[34], "1.5");
}
