use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use tracing::info;
use url::Url;

use super::{fetch_json, ApiError, ApiRateLimiter, FilingsProvider, RetryPolicy};
use crate::models::edgar::CompanyFacts;
use crate::models::Config;

const CENTRAL_INDEX_KEY_LENGTH: usize = 10;

/// SEC EDGAR XBRL API client. The SEC rejects requests without a
/// `User-Agent` naming the caller.
pub struct EdgarClient {
    client: Client,
    base_url: Url,
    user_agent: String,
    rate_limiter: ApiRateLimiter,
    retry: RetryPolicy,
}

impl EdgarClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://data.sec.gov/";

    pub fn new(config: &Config) -> Result<Self> {
        let user_agent = config
            .edgar_user_agent
            .clone()
            .ok_or_else(|| anyhow!("EDGAR_SEC_USER_AGENT environment variable required"))?;
        Self::with_base_url(Self::DEFAULT_BASE_URL, user_agent, config.edgar_delay_ms)
    }

    pub fn with_base_url(base_url: &str, user_agent: impl Into<String>, delay_ms: u64) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let rate_limiter = ApiRateLimiter::new(delay_ms);
        let retry = RetryPolicy::once(rate_limiter.delay());

        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            user_agent: user_agent.into(),
            rate_limiter,
            retry,
        })
    }

    /// `api/xbrl/companyfacts/CIK0000320193.json` for CIK `320193`
    pub fn company_facts_url(&self, central_index_key: &str) -> Result<Url, ApiError> {
        let padded = format!("{:0>width$}", central_index_key.trim(), width = CENTRAL_INDEX_KEY_LENGTH);
        Ok(self.base_url.join(&format!("api/xbrl/companyfacts/CIK{}.json", padded))?)
    }
}

#[async_trait]
impl FilingsProvider for EdgarClient {
    async fn fetch_company_facts(&self, central_index_key: &str) -> Result<CompanyFacts, ApiError> {
        let url = &self.company_facts_url(central_index_key)?;
        info!("📡 Fetching company facts for CIK {}", central_index_key);

        self.retry
            .run(&format!("CIK {}", central_index_key), move || async move {
                self.rate_limiter.wait().await;
                let request = self.client.get(url.clone()).header(USER_AGENT, &self.user_agent);
                fetch_json(request, url).await
            })
            .await
    }
}
