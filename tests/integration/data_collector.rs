//! Collector against in-process providers

use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use tempfile::TempDir;

use stock_financials::api::{ApiError, CryptoProvider, FilingsProvider, StatementsProvider};
use stock_financials::csv_store::CsvStore;
use stock_financials::data_collector::DataCollector;
use stock_financials::database::DatabaseManager;
use stock_financials::financials::{FrameWindow, QuarterFrame};
use stock_financials::models::edgar::CompanyFacts;
use stock_financials::models::modeling_prep::{HistoricBar, HistoricPrices, Quote, VendorIncomeStatements};
use stock_financials::models::{CryptoPrice, ExchangeType, Metric, RunConfig};

use crate::common::test_data::{company_facts, create_test_stock, quarterly_series};
use crate::common::logging;

/// Company facts by CIK; unknown CIKs fail like an unavailable upstream
struct FakeFilings {
    companies: HashMap<String, CompanyFacts>,
    calls: AtomicUsize,
}

#[async_trait]
impl FilingsProvider for FakeFilings {
    async fn fetch_company_facts(&self, central_index_key: &str) -> Result<CompanyFacts, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.companies.get(central_index_key).cloned().ok_or(ApiError::Status {
            endpoint: format!("https://data.sec.gov/api/xbrl/companyfacts/CIK{:0>10}.json", central_index_key),
            status: StatusCode::NOT_FOUND,
        })
    }
}

struct FakeVendor;

#[async_trait]
impl StatementsProvider for FakeVendor {
    async fn fetch_income_statements(&self, _symbols: &[String]) -> Result<Vec<VendorIncomeStatements>, ApiError> {
        Ok(Vec::new())
    }

    async fn fetch_historic_prices(&self, symbols: &[String], _from: NaiveDate) -> Result<Vec<HistoricPrices>, ApiError> {
        Ok(symbols
            .iter()
            .map(|symbol| HistoricPrices {
                symbol: symbol.clone(),
                historical: vec![HistoricBar {
                    date: NaiveDate::from_ymd_opt(2024, 3, 28).unwrap(),
                    high: 101.0,
                    low: 99.0,
                    open: None,
                    close: None,
                    volume: None,
                }],
            })
            .collect())
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, ApiError> {
        Ok(symbols
            .iter()
            .filter(|symbol| symbol.as_str() == "AAPL")
            .map(|symbol| Quote {
                symbol: symbol.clone(),
                price: Some(170.5),
                market_cap: Some(2_632_845_000_000.0),
                shares_outstanding: Some(15_441_900_000.0),
            })
            .collect())
    }
}

struct FakeCrypto;

#[async_trait]
impl CryptoProvider for FakeCrypto {
    async fn fetch_listings(&self, limit: u32) -> Result<Vec<CryptoPrice>, ApiError> {
        Ok((1..=limit)
            .rev()
            .map(|rank| CryptoPrice {
                rank,
                symbol: format!("C{}", rank),
                name: format!("Coin {}", rank),
                price: 1.0,
                market_cap: 1.0,
                last_day_change: 0.0,
                last_week_change: 0.0,
                last_month_change: 0.0,
                two_months_change: 0.0,
                three_months_change: 0.0,
            })
            .collect())
    }
}

fn store(dir: &TempDir) -> CsvStore {
    CsvStore {
        stock_list: dir.path().join("stocks.csv"),
        recent_financials: dir.path().join("recent_financials.csv"),
        corrections: dir.path().join("corrections.csv"),
        stock_prices: dir.path().join("stock_prices.csv"),
        crypto_prices: dir.path().join("crypto_prices.csv"),
    }
}

fn filings() -> FakeFilings {
    let mut companies = HashMap::new();
    companies.insert(
        "320193".to_string(),
        company_facts(vec![("Revenues", quarterly_series(2024, 1, 8, 90_753_000_000.0))]),
    );
    companies.insert(
        "789019".to_string(),
        company_facts(vec![("NetIncomeLoss", quarterly_series(2024, 1, 8, 21_939_000_000.0))]),
    );
    FakeFilings {
        companies,
        calls: AtomicUsize::new(0),
    }
}

#[tokio::test]
async fn test_collect_filings_skips_failed_companies() {
    logging::init_test_logging();
    logging::log_test_step("Collecting statements with one unavailable company");

    let dir = TempDir::new().unwrap();
    let provider = Arc::new(filings());
    let collector = DataCollector::new(DatabaseManager::new("postgres://unused", 1, 0), store(&dir))
        .with_filings(provider.clone());

    let stocks = vec![
        create_test_stock(ExchangeType::Nasdaq, "AAPL", Some("320193")),
        create_test_stock(ExchangeType::Nasdaq, "MSFT", Some("789019")),
        create_test_stock(ExchangeType::Nyse, "GONE", Some("1")),
        create_test_stock(ExchangeType::Nyse, "NOCIK", None),
        create_test_stock(ExchangeType::Index, "^GSPC", None),
    ];
    let run = RunConfig::new(FrameWindow::new(QuarterFrame::new(2024, 1), 8));

    let collection = collector.collect_income_statements(&stocks, &run).await.unwrap();
    logging::log_test_data("Skipped", &collection.skipped);

    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    assert_eq!(collection.records.len(), 16);
    assert_eq!(collection.skipped, vec!["GONE".to_string(), "NOCIK".to_string()]);

    let aapl: Vec<_> = collection.records.iter().filter(|r| r.symbol == "AAPL").collect();
    assert_eq!(aapl.len(), 8);
    assert!(aapl.iter().all(|r| r.get(Metric::Revenue) == Some(90_753.0)));
    assert!(aapl.iter().all(|r| r.get(Metric::NetIncomeCom).is_none()));

    let msft: Vec<_> = collection.records.iter().filter(|r| r.symbol == "MSFT").collect();
    assert_eq!(msft[0].get(Metric::NetIncomeCom), Some(21_939.0));
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL pointing at a disposable Postgres database"]
async fn test_full_run_writes_reports() {
    logging::init_test_logging();
    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        return;
    };

    let dir = TempDir::new().unwrap();
    let csv = store(&dir);
    fs::write(
        &csv.stock_list,
        "exchange_type,symbol,name,central_index_key,sector,industry\n\
         nasdaq,AAPL,Apple Inc.,320193,Technology,Consumer Electronics\n\
         nasdaq,MSFT,Microsoft Corp,789019,Technology,Software\n\
         index,^GSPC,S&P 500,,,\n",
    )
    .unwrap();

    let collector = DataCollector::new(DatabaseManager::new(database_url, 2, 0), csv.clone())
        .with_filings(Arc::new(filings()))
        .with_statements(Arc::new(FakeVendor))
        .with_crypto(Arc::new(FakeCrypto));

    let mut run = RunConfig::new(FrameWindow::new(QuarterFrame::new(2024, 1), 8));
    run.update_stock_list = true;
    run.update_stock_prices = true;
    run.update_crypto = true;
    run.crypto_count = 3;

    let summary = collector.run(&run).await.unwrap();
    logging::log_test_data("Summary", &summary);

    assert!(summary.failed_stages.is_empty());
    assert_eq!(summary.stocks_read, 3);
    assert_eq!(summary.statements_collected, 16);
    assert_eq!(summary.recent_financials_rows, 3);
    assert_eq!(summary.price_summaries, 3);
    assert_eq!(summary.crypto_listings, 3);

    let recent = fs::read_to_string(&csv.recent_financials).unwrap();
    assert_eq!(recent.lines().count(), 4);
    assert!(recent.lines().nth(1).unwrap().starts_with("nasdaq,AAPL,2024-03-31,"));

    let prices = fs::read_to_string(&csv.stock_prices).unwrap();
    assert!(prices
        .lines()
        .any(|line| line.starts_with("nasdaq,AAPL,Apple Inc.,Technology,Consumer Electronics,170.5,15441.9,2632845,100,")));
    assert!(prices.lines().any(|line| line.starts_with("nasdaq,MSFT,Microsoft Corp,Technology,Software,,,,100,")));

    let crypto = fs::read_to_string(&csv.crypto_prices).unwrap();
    let ranks: Vec<&str> = crypto.lines().skip(1).map(|l| &l[..1]).collect();
    assert_eq!(ranks, vec!["1", "2", "3"]);
}
