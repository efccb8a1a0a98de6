//! Quarter-end price history and the lookback summary written to the prices CSV.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use super::frames::QuarterFrame;
use super::normalize::round_to_millions;
use crate::models::modeling_prep::{HistoricBar, Quote};
use crate::models::{Stock, StockPrice};

/// Bars older than this before a quarter end do not stand in for it
const MAX_STALENESS_DAYS: i64 = 7;

/// Quarters back from the newest completed quarter: 1-6 quarters, 2 years, 5 years
pub const LOOKBACK_QUARTERS: [usize; 8] = [0, 1, 2, 3, 4, 5, 7, 19];

pub const STOCK_PRICES_HEADERS: [&str; 16] = [
    "exchange_type",
    "symbol",
    "name",
    "sector",
    "industry",
    "price",
    "shares",
    "mkt_cap",
    "last_qt_price",
    "two_qt_price",
    "three_qt_price",
    "last_yr_price",
    "five_qt_price",
    "six_qt_price",
    "two_yr_price",
    "five_yr_price",
];

/// Calendar quarter ends, newest first
pub fn quarter_end_dates(newest: QuarterFrame, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut quarter = newest;
    for _ in 0..count {
        dates.push(quarter.calendar_end());
        quarter = quarter.previous();
    }
    dates
}

/// Quarter ends from `newest` back to the first one on or after `from`
pub fn quarter_ends_since(newest: QuarterFrame, from: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut quarter = newest;
    while quarter.calendar_end() >= from {
        dates.push(quarter.calendar_end());
        quarter = quarter.previous();
    }
    dates
}

/// The quarter ends the price summary reads
pub fn lookback_dates(newest: QuarterFrame) -> Vec<NaiveDate> {
    let dates = quarter_end_dates(newest, LOOKBACK_QUARTERS[LOOKBACK_QUARTERS.len() - 1] + 1);
    LOOKBACK_QUARTERS.iter().map(|i| dates[*i]).collect()
}

/// One price per quarter end: the last bar on or before it, at most a week
/// stale. Rows are keyed by the quarter end, not the trading day.
pub fn select_quarter_end_prices(stock: &Stock, bars: &[HistoricBar], quarter_ends: &[NaiveDate]) -> Vec<StockPrice> {
    quarter_ends
        .iter()
        .filter_map(|quarter_end| {
            let earliest = *quarter_end - Duration::days(MAX_STALENESS_DAYS);
            bars.iter()
                .filter(|bar| bar.date <= *quarter_end && bar.date >= earliest)
                .max_by_key(|bar| bar.date)
                .map(|bar| StockPrice {
                    exchange_type: stock.exchange_type.to_string(),
                    symbol: stock.symbol.clone(),
                    date: *quarter_end,
                    high: bar.high,
                    low: bar.low,
                })
        })
        .collect()
}

/// Whole-dollar midpoint of the day's range, 0 when no price is known
pub fn mid_price(price: Option<&StockPrice>) -> i64 {
    price.map(|p| ((p.high + p.low) / 2.0).floor() as i64).unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockPriceSummary {
    pub stock: Stock,
    /// Latest quoted price
    pub price: Option<f64>,
    /// Shares outstanding, millions
    pub shares: Option<f64>,
    /// Market capitalisation, millions
    pub market_cap: Option<f64>,
    /// Mid prices in `LOOKBACK_QUARTERS` order
    pub lookbacks: [i64; 8],
}

/// Price summary per stock, sorted by symbol. Stocks without a quote keep
/// their lookbacks and leave the current figures empty.
pub fn summarize_prices(
    stocks: &[Stock],
    prices: &[StockPrice],
    quotes: &[Quote],
    lookback: &[NaiveDate],
) -> Vec<StockPriceSummary> {
    let by_key: HashMap<(&str, NaiveDate), &StockPrice> = prices.iter().map(|p| ((p.symbol.as_str(), p.date), p)).collect();
    let quotes: HashMap<&str, &Quote> = quotes.iter().map(|q| (q.symbol.as_str(), q)).collect();

    let mut summaries: Vec<StockPriceSummary> = stocks
        .iter()
        .map(|stock| {
            let mut lookbacks = [0i64; 8];
            for (slot, date) in lookbacks.iter_mut().zip(lookback) {
                *slot = mid_price(by_key.get(&(stock.symbol.as_str(), *date)).copied());
            }
            let quote = quotes.get(stock.symbol.as_str());
            StockPriceSummary {
                stock: stock.clone(),
                price: quote.and_then(|q| q.price),
                shares: quote.and_then(|q| q.shares_outstanding).map(round_to_millions),
                market_cap: quote.and_then(|q| q.market_cap).map(round_to_millions),
                lookbacks,
            }
        })
        .collect();

    summaries.sort_by(|a, b| a.stock.symbol.cmp(&b.stock.symbol));
    summaries
}
