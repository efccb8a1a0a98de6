use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::models::edgar::CompanyFacts;
use crate::models::modeling_prep::{HistoricPrices, Quote, VendorIncomeStatements};
use crate::models::CryptoPrice;

pub mod coin_market_cap_client;
pub mod edgar_client;
pub mod modeling_prep_client;

pub use coin_market_cap_client::CoinMarketCapClient;
pub use edgar_client::EdgarClient;
pub use modeling_prep_client::ModelingPrepClient;

/// Failure of one upstream request. Endpoints never include the query string,
/// which may carry an API key.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned {status}")]
    Status { endpoint: String, status: StatusCode },
    #[error("could not decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Malformed URLs fail the same way every time
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ApiError::Url(_))
    }
}

/// Fixed pause before every request to one upstream
#[derive(Debug, Clone)]
pub struct ApiRateLimiter {
    delay: Duration,
}

impl ApiRateLimiter {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Bounded retry shared by every client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// One retry after `delay`
    pub fn once(delay: Duration) -> Self {
        Self::new(2, delay)
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempts < self.max_attempts && e.is_retryable() => {
                    warn!("Attempt {} failed for {}: {}. Retrying...", attempts, label, e);
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Send one request and decode its JSON body
pub(crate) async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder, url: &Url) -> Result<T, ApiError> {
    let endpoint = endpoint(url);
    debug!("Making request to: {}", endpoint);

    let response = request.send().await.map_err(|source| ApiError::Transport {
        endpoint: endpoint.clone(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status { endpoint, status });
    }

    let body = response.bytes().await.map_err(|source| ApiError::Transport {
        endpoint: endpoint.clone(),
        source,
    })?;
    serde_json::from_slice(&body).map_err(|source| ApiError::Decode { endpoint, source })
}

fn endpoint(url: &Url) -> String {
    let mut endpoint = url.clone();
    endpoint.set_query(None);
    endpoint.to_string()
}

/// SEC company facts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FilingsProvider: Send + Sync {
    async fn fetch_company_facts(&self, central_index_key: &str) -> Result<CompanyFacts, ApiError>;
}

/// Vendor aggregator statements and prices, several symbols per request
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatementsProvider: Send + Sync {
    async fn fetch_income_statements(&self, symbols: &[String]) -> Result<Vec<VendorIncomeStatements>, ApiError>;

    async fn fetch_historic_prices(&self, symbols: &[String], from: NaiveDate) -> Result<Vec<HistoricPrices>, ApiError>;

    /// Current price, market cap and share count
    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, ApiError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CryptoProvider: Send + Sync {
    async fn fetch_listings(&self, limit: u32) -> Result<Vec<CryptoPrice>, ApiError>;
}
