use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use tracing::info;
use url::Url;

use super::{fetch_json, ApiError, ApiRateLimiter, RetryPolicy, StatementsProvider};
use crate::models::modeling_prep::{FinancialsResponse, HistoricPriceResponse, HistoricPrices, Quote, VendorIncomeStatements};
use crate::models::Config;

/// The API accepts at most this many symbols per income statement request
pub const INCOME_STATEMENT_CHUNK_SIZE: usize = 3;
/// The API accepts at most this many symbols per historic price request
pub const HISTORIC_PRICES_CHUNK_SIZE: usize = 5;
/// Symbols per quote request
pub const QUOTE_CHUNK_SIZE: usize = 30;

/// Financial Modeling Prep client
pub struct ModelingPrepClient {
    client: Client,
    base_url: Url,
    api_key: String,
    rate_limiter: ApiRateLimiter,
    retry: RetryPolicy,
}

impl ModelingPrepClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://financialmodelingprep.com/api/v3/";

    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .modeling_prep_api_key
            .clone()
            .ok_or_else(|| anyhow!("FINANCIAL_MODELING_PREP_API_KEY environment variable required"))?;
        Self::with_base_url(Self::DEFAULT_BASE_URL, api_key, config.fetch_delay_ms)
    }

    pub fn with_base_url(base_url: &str, api_key: impl Into<String>, delay_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("stock-financials/1.0")
            .build()?;
        let rate_limiter = ApiRateLimiter::new(delay_ms);
        let retry = RetryPolicy::once(rate_limiter.delay());

        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            api_key: api_key.into(),
            rate_limiter,
            retry,
        })
    }

    pub fn income_statements_url(&self, symbols: &[String]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(&format!("financials/income-statement/{}", symbols.join(",")))?;
        url.query_pairs_mut()
            .append_pair("period", "quarter")
            .append_pair("apikey", &self.api_key);
        Ok(url)
    }

    pub fn historic_prices_url(&self, symbols: &[String], from: NaiveDate) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(&format!("historical-price-full/{}", symbols.join(",")))?;
        url.query_pairs_mut()
            .append_pair("from", &from.format("%Y-%m-%d").to_string())
            .append_pair("apikey", &self.api_key);
        Ok(url)
    }

    pub fn quotes_url(&self, symbols: &[String]) -> Result<Url, ApiError> {
        let mut url = self.base_url.join(&format!("quote/{}", symbols.join(",")))?;
        url.query_pairs_mut().append_pair("apikey", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl StatementsProvider for ModelingPrepClient {
    async fn fetch_income_statements(&self, symbols: &[String]) -> Result<Vec<VendorIncomeStatements>, ApiError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let url = &self.income_statements_url(symbols)?;
        info!("📡 Fetching income statements for {}", symbols.join(","));

        let response: FinancialsResponse = self
            .retry
            .run(&symbols.join(","), move || async move {
                self.rate_limiter.wait().await;
                fetch_json(self.client.get(url.clone()), url).await
            })
            .await?;
        Ok(response.into_statements())
    }

    async fn fetch_historic_prices(&self, symbols: &[String], from: NaiveDate) -> Result<Vec<HistoricPrices>, ApiError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let url = &self.historic_prices_url(symbols, from)?;
        info!("📡 Fetching historic prices for {} from {}", symbols.join(","), from);

        let response: HistoricPriceResponse = self
            .retry
            .run(&symbols.join(","), move || async move {
                self.rate_limiter.wait().await;
                fetch_json(self.client.get(url.clone()), url).await
            })
            .await?;
        Ok(response.into_prices())
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, ApiError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let url = &self.quotes_url(symbols)?;
        info!("📡 Fetching quotes for {}", symbols.join(","));

        self.retry
            .run(&symbols.join(","), move || async move {
                self.rate_limiter.wait().await;
                fetch_json(self.client.get(url.clone()), url).await
            })
            .await
    }
}
