use serde::Deserialize;

use super::CryptoPrice;

#[derive(Debug, Clone, Deserialize)]
pub struct ListingsResponse {
    #[serde(default)]
    pub data: Vec<CryptoListing>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CryptoListing {
    pub name: String,
    pub symbol: String,
    pub cmc_rank: u32,
    pub quote: ListingQuotes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingQuotes {
    #[serde(rename = "USD")]
    pub usd: UsdQuote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsdQuote {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub percent_change_24h: Option<f64>,
    #[serde(default)]
    pub percent_change_7d: Option<f64>,
    #[serde(default)]
    pub percent_change_30d: Option<f64>,
    #[serde(default)]
    pub percent_change_60d: Option<f64>,
    #[serde(default)]
    pub percent_change_90d: Option<f64>,
}

impl From<CryptoListing> for CryptoPrice {
    fn from(listing: CryptoListing) -> Self {
        let quote = listing.quote.usd;
        CryptoPrice {
            rank: listing.cmc_rank,
            symbol: listing.symbol,
            name: listing.name,
            price: quote.price.unwrap_or_default(),
            market_cap: quote.market_cap.unwrap_or_default(),
            last_day_change: quote.percent_change_24h.unwrap_or_default(),
            last_week_change: quote.percent_change_7d.unwrap_or_default(),
            last_month_change: quote.percent_change_30d.unwrap_or_default(),
            two_months_change: quote.percent_change_60d.unwrap_or_default(),
            three_months_change: quote.percent_change_90d.unwrap_or_default(),
        }
    }
}
