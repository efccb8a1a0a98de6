use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{error, info, warn};

use crate::api::modeling_prep_client::{HISTORIC_PRICES_CHUNK_SIZE, INCOME_STATEMENT_CHUNK_SIZE, QUOTE_CHUNK_SIZE};
use crate::api::{
    CoinMarketCapClient, CryptoProvider, EdgarClient, FilingsProvider, ModelingPrepClient, StatementsProvider,
};
use crate::csv_store::CsvStore;
use crate::database::{DatabaseManager, PersistSummary};
use crate::financials::prices::{lookback_dates, quarter_ends_since, select_quarter_end_prices, summarize_prices};
use crate::financials::{assemble_vendor, pivot, recent_financials_headers, FallbackPolicy, FilingsAssembler};
use crate::models::{Config, ExchangeType, IncomeSource, IncomeStatementRecord, RunConfig, Stock, StockPrice};

/// Statements gathered from an upstream, plus the units that had to be skipped
#[derive(Debug, Clone, Default)]
pub struct StatementCollection {
    pub records: Vec<IncomeStatementRecord>,
    pub skipped: Vec<String>,
}

/// What one pipeline run did
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub stocks_read: usize,
    pub stocks: PersistSummary,
    pub statements_collected: usize,
    pub statements: PersistSummary,
    pub corrections: PersistSummary,
    pub recent_financials_rows: usize,
    pub stock_prices: PersistSummary,
    pub price_summaries: usize,
    pub crypto_listings: usize,
    /// Symbols or symbol chunks dropped after their fetch failed
    pub skipped_units: Vec<String>,
    pub failed_stages: Vec<String>,
}

impl RunSummary {
    fn stage<T>(&mut self, name: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                error!("❌ {} failed: {:#}", name, e);
                self.failed_stages.push(name.to_string());
                None
            }
        }
    }
}

/// Runs the refresh pipeline against the configured upstreams and stores
pub struct DataCollector {
    filings: Option<Arc<dyn FilingsProvider>>,
    statements: Option<Arc<dyn StatementsProvider>>,
    crypto: Option<Arc<dyn CryptoProvider>>,
    database: Arc<DatabaseManager>,
    csv: CsvStore,
    policy: FallbackPolicy,
}

impl DataCollector {
    pub fn new(database: DatabaseManager, csv: CsvStore) -> Self {
        Self {
            filings: None,
            statements: None,
            crypto: None,
            database: Arc::new(database),
            csv,
            policy: FallbackPolicy::default(),
        }
    }

    /// Wire up the clients whose credentials are configured
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut collector = Self::new(DatabaseManager::from_config(config), CsvStore::from_config(config));
        if config.edgar_user_agent.is_some() {
            collector = collector.with_filings(Arc::new(EdgarClient::new(config)?));
        }
        if config.modeling_prep_api_key.is_some() {
            collector = collector.with_statements(Arc::new(ModelingPrepClient::new(config)?));
        }
        if config.coin_market_cap_api_key.is_some() {
            collector = collector.with_crypto(Arc::new(CoinMarketCapClient::new(config)?));
        }
        Ok(collector)
    }

    pub fn with_filings(mut self, provider: Arc<dyn FilingsProvider>) -> Self {
        self.filings = Some(provider);
        self
    }

    pub fn with_statements(mut self, provider: Arc<dyn StatementsProvider>) -> Self {
        self.statements = Some(provider);
        self
    }

    pub fn with_crypto(mut self, provider: Arc<dyn CryptoProvider>) -> Self {
        self.crypto = Some(provider);
        self
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fetch and assemble statements for the equities among `stocks`.
    /// A failed fetch skips that unit; the rest are still collected.
    pub async fn collect_income_statements(&self, stocks: &[Stock], run: &RunConfig) -> Result<StatementCollection> {
        let equities: Vec<&Stock> = stocks
            .iter()
            .filter(|s| s.exchange_type.is_equity() && run.should_seed(&s.symbol))
            .collect();
        info!("📊 Collecting income statements for {} equities", equities.len());

        let collection = match run.income_source {
            IncomeSource::Filings => self.collect_from_filings(&equities, run).await?,
            IncomeSource::Vendor => self.collect_from_vendor(&equities, run).await?,
        };

        info!(
            "✅ Collected {} income statements ({} units skipped)",
            collection.records.len(),
            collection.skipped.len()
        );
        Ok(collection)
    }

    async fn collect_from_filings(&self, equities: &[&Stock], run: &RunConfig) -> Result<StatementCollection> {
        let provider = self
            .filings
            .as_ref()
            .ok_or_else(|| anyhow!("no filings client configured"))?;
        let assembler = FilingsAssembler::new(self.policy.clone(), run.frame_window);
        let mut collection = StatementCollection::default();

        for stock in equities {
            let Some(cik) = stock.central_index_key.as_deref().filter(|c| !c.trim().is_empty()) else {
                warn!("⚠️ {} has no central index key, skipping", stock.symbol);
                collection.skipped.push(stock.symbol.clone());
                continue;
            };

            match provider.fetch_company_facts(cik).await {
                Ok(facts) => {
                    let records = assembler.assemble(&stock.symbol, &facts);
                    info!("📈 {}: {} periods", stock.symbol, records.len());
                    collection.records.extend(records);
                }
                Err(e) => {
                    warn!("⚠️ Unable to get financials for {}: {}", stock.symbol, e);
                    collection.skipped.push(stock.symbol.clone());
                }
            }
        }
        Ok(collection)
    }

    async fn collect_from_vendor(&self, equities: &[&Stock], run: &RunConfig) -> Result<StatementCollection> {
        let provider = self
            .statements
            .as_ref()
            .ok_or_else(|| anyhow!("no vendor statements client configured"))?;
        let symbols: Vec<String> = equities.iter().map(|s| s.symbol.clone()).collect();
        let mut collection = StatementCollection::default();

        for chunk in symbols.chunks(INCOME_STATEMENT_CHUNK_SIZE) {
            match provider.fetch_income_statements(chunk).await {
                Ok(statements) => {
                    for symbol in chunk {
                        match statements.iter().find(|s| &s.symbol == symbol) {
                            Some(statements) => collection.records.extend(assemble_vendor(
                                statements,
                                run.schema.metrics(),
                                run.statements_start_year,
                            )),
                            None => {
                                warn!("⚠️ No statements returned for {}", symbol);
                                collection.skipped.push(symbol.clone());
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("⚠️ Unable to get financials for {}: {}", chunk.join(","), e);
                    collection.skipped.push(chunk.join(","));
                }
            }
        }
        Ok(collection)
    }

    /// Run every stage enabled in `run`. Stage failures are recorded in the
    /// summary and later stages still run; only an unreadable roster aborts.
    pub async fn run(&self, run: &RunConfig) -> Result<RunSummary> {
        info!("🚀 Starting data refresh");
        let mut summary = RunSummary::default();

        let stocks = self.csv.read_stocks()?;
        summary.stocks_read = stocks.len();

        let schema = self.database.ensure_schema(run.schema).await;
        summary.stage("schema", schema);

        if run.update_stock_list {
            let result = self.database.upsert_stocks(&stocks).await;
            if let Some(persisted) = summary.stage("stock list", result) {
                summary.stocks = persisted;
            }
        }

        if run.update_income_statements {
            let result = self.refresh_income_statements(&stocks, run, &mut summary).await;
            summary.stage("income statements", result);
        }

        if run.upsert_corrections {
            let result = self.apply_corrections().await;
            if let Some(persisted) = summary.stage("income statement corrections", result) {
                summary.corrections = persisted;
            }
        }

        let result = self.write_recent_financials(&stocks, run).await;
        if let Some(rows) = summary.stage("recent financials", result) {
            summary.recent_financials_rows = rows;
        }

        if run.update_stock_prices {
            let result = self.refresh_stock_prices(&stocks, run, &mut summary).await;
            summary.stage("stock prices", result);
        }

        if run.update_crypto {
            let result = self.refresh_crypto(run).await;
            if let Some(listings) = summary.stage("crypto", result) {
                summary.crypto_listings = listings;
            }
        }

        info!("🏁 Data refresh finished: {:?}", summary);
        Ok(summary)
    }

    async fn refresh_income_statements(&self, stocks: &[Stock], run: &RunConfig, summary: &mut RunSummary) -> Result<()> {
        let collection = self.collect_income_statements(stocks, run).await?;
        summary.statements_collected = collection.records.len();
        summary.skipped_units.extend(collection.skipped);

        summary.statements = self
            .database
            .insert_income_statements(&collection.records, run.schema, run.sentinel)
            .await?;
        Ok(())
    }

    async fn apply_corrections(&self) -> Result<PersistSummary> {
        let corrections = self.csv.read_corrections()?;
        self.database.upsert_income_statement_corrections(&corrections).await
    }

    async fn write_recent_financials(&self, stocks: &[Stock], run: &RunConfig) -> Result<usize> {
        let statements = self.database.read_recent_income_statements(run.recent_periods).await?;
        let rows = pivot(stocks, &statements, run.recent_periods);
        self.csv
            .write_recent_financials(&recent_financials_headers(run.recent_periods), &rows)?;
        Ok(rows.len())
    }

    async fn refresh_stock_prices(&self, stocks: &[Stock], run: &RunConfig, summary: &mut RunSummary) -> Result<()> {
        let provider = self
            .statements
            .as_ref()
            .ok_or_else(|| anyhow!("no vendor prices client configured"))?;
        let newest = run.frame_window.newest;
        let quarter_ends = quarter_ends_since(newest, run.historic_prices_from);

        // Indexes are requested one at a time, equities in chunks
        let to_seed: Vec<&Stock> = stocks.iter().filter(|s| run.should_seed(&s.symbol)).collect();
        let mut units: Vec<Vec<String>> = to_seed
            .iter()
            .filter(|s| s.exchange_type == ExchangeType::Index)
            .map(|s| vec![s.symbol.clone()])
            .collect();
        let equities: Vec<String> = to_seed
            .iter()
            .filter(|s| s.exchange_type.is_equity())
            .map(|s| s.symbol.clone())
            .collect();
        units.extend(equities.chunks(HISTORIC_PRICES_CHUNK_SIZE).map(<[String]>::to_vec));

        let mut prices: Vec<StockPrice> = Vec::new();
        for unit in &units {
            match provider.fetch_historic_prices(unit, run.historic_prices_from).await {
                Ok(history) => {
                    for series in history {
                        if let Some(stock) = stocks.iter().find(|s| s.symbol == series.symbol) {
                            prices.extend(select_quarter_end_prices(stock, &series.historical, &quarter_ends));
                        }
                    }
                }
                Err(e) => {
                    warn!("⚠️ Unable to get historic prices for {}: {}", unit.join(","), e);
                    summary.skipped_units.push(unit.join(","));
                }
            }
        }

        summary.stock_prices = self.database.upsert_stock_prices(&prices).await?;

        let lookback = lookback_dates(newest);
        let symbols: Vec<String> = stocks.iter().map(|s| s.symbol.clone()).collect();
        let stored = self.database.read_stock_prices(&lookback, &symbols).await?;

        let mut quotes = Vec::new();
        for chunk in symbols.chunks(QUOTE_CHUNK_SIZE) {
            match provider.fetch_quotes(chunk).await {
                Ok(fetched) => quotes.extend(fetched),
                Err(e) => {
                    warn!("⚠️ Unable to get quotes for {}: {}", chunk.join(","), e);
                    summary.skipped_units.push(chunk.join(","));
                }
            }
        }

        let summaries = summarize_prices(stocks, &stored, &quotes, &lookback);
        self.csv.write_stock_prices(&summaries)?;
        summary.price_summaries = summaries.len();
        Ok(())
    }

    async fn refresh_crypto(&self, run: &RunConfig) -> Result<usize> {
        let provider = self
            .crypto
            .as_ref()
            .ok_or_else(|| anyhow!("no crypto client configured"))?;
        let mut listings = provider.fetch_listings(run.crypto_count).await?;
        listings.sort_by_key(|listing| listing.rank);
        self.csv.write_crypto_prices(&listings)?;
        Ok(listings.len())
    }
}
