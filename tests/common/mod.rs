//! Common test utilities and helpers

/// Test data utilities
pub mod test_data {
    use chrono::NaiveDate;
    use stock_financials::models::edgar::{CompanyFacts, Concept, Observation};
    use stock_financials::models::{ExchangeType, Stock};

    pub fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// Create a test stock
    pub fn create_test_stock(exchange_type: ExchangeType, symbol: &str, cik: Option<&str>) -> Stock {
        Stock {
            exchange_type,
            symbol: symbol.to_string(),
            name: format!("{} Corp", symbol),
            central_index_key: cik.map(str::to_string),
            sector: Some("Technology".to_string()),
            industry: Some("Software".to_string()),
        }
    }

    /// A framed USD observation as the SEC reports it
    pub fn observation(frame: &str, end: &str, val: f64) -> Observation {
        Observation {
            end: date(end),
            val,
            start: None,
            frame: Some(frame.to_string()),
            filed: None,
            form: Some("10-Q".to_string()),
            fy: None,
            fp: None,
            accn: None,
        }
    }

    /// Company facts with the given us-gaap concepts
    pub fn company_facts(concepts: Vec<(&str, Vec<Observation>)>) -> CompanyFacts {
        let mut facts = CompanyFacts {
            cik: Some(320193),
            entity_name: Some("Test Company".to_string()),
            ..CompanyFacts::default()
        };
        for (name, observations) in concepts {
            let mut concept = Concept::default();
            concept.units.insert("USD".to_string(), observations);
            facts.facts.us_gaap.insert(name.to_string(), concept);
        }
        facts
    }

    /// Quarterly observations from `newest` backwards, all with the same value
    pub fn quarterly_series(newest_year: i32, newest_quarter: u8, count: usize, val: f64) -> Vec<Observation> {
        let (mut year, mut quarter) = (newest_year, newest_quarter);
        let mut observations = Vec::with_capacity(count);
        for _ in 0..count {
            let end = match quarter {
                1 => format!("{}-03-31", year),
                2 => format!("{}-06-30", year),
                3 => format!("{}-09-30", year),
                _ => format!("{}-12-31", year),
            };
            observations.push(observation(&format!("CY{}Q{}", year, quarter), &end, val));
            if quarter == 1 {
                year -= 1;
                quarter = 4;
            } else {
                quarter -= 1;
            }
        }
        observations
    }
}

/// Logging utilities for tests
pub mod logging {
    use std::sync::Once;
    use tracing::{debug, info};

    static INIT: Once = Once::new();

    /// Initialize test logging
    pub fn init_test_logging() {
        INIT.call_once(|| {
            // Another test harness may already own the global subscriber
            let _ = tracing::subscriber::set_global_default(
                tracing_subscriber::fmt()
                    .with_env_filter("stock_financials=debug,test=debug")
                    .with_test_writer()
                    .finish(),
            );
        });
    }

    /// Log test step
    pub fn log_test_step(step: &str) {
        info!("🧪 Test Step: {}", step);
    }

    /// Log test data
    pub fn log_test_data<T: std::fmt::Debug>(label: &str, data: &T) {
        debug!("📊 {}: {:?}", label, data);
    }
}
