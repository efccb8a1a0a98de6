use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;
use url::Url;

use super::{fetch_json, ApiError, ApiRateLimiter, CryptoProvider, RetryPolicy};
use crate::models::coin_market_cap::ListingsResponse;
use crate::models::{Config, CryptoPrice};

const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

/// CoinMarketCap listings client
pub struct CoinMarketCapClient {
    client: Client,
    base_url: Url,
    api_key: String,
    rate_limiter: ApiRateLimiter,
    retry: RetryPolicy,
}

impl CoinMarketCapClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://pro-api.coinmarketcap.com/";

    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .coin_market_cap_api_key
            .clone()
            .ok_or_else(|| anyhow!("COIN_MARKET_CAP_API_KEY environment variable required"))?;
        Self::with_base_url(Self::DEFAULT_BASE_URL, api_key, config.fetch_delay_ms)
    }

    pub fn with_base_url(base_url: &str, api_key: impl Into<String>, delay_ms: u64) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
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

    pub fn listings_url(&self, limit: u32) -> Result<Url, ApiError> {
        let mut url = self.base_url.join("v1/cryptocurrency/listings/latest")?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        Ok(url)
    }
}

#[async_trait]
impl CryptoProvider for CoinMarketCapClient {
    async fn fetch_listings(&self, limit: u32) -> Result<Vec<CryptoPrice>, ApiError> {
        let url = &self.listings_url(limit)?;
        info!("📡 Fetching top {} crypto listings", limit);

        let response: ListingsResponse = self
            .retry
            .run("crypto listings", move || async move {
                self.rate_limiter.wait().await;
                let request = self.client.get(url.clone()).header(API_KEY_HEADER, &self.api_key);
                fetch_json(request, url).await
            })
            .await?;

        let mut listings: Vec<CryptoPrice> = response.data.into_iter().map(CryptoPrice::from).collect();
        listings.sort_by_key(|listing| listing.rank);
        Ok(listings)
    }
}
