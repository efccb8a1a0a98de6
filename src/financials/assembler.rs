//! Builds canonical income statements from either upstream schema.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use super::frames::{derive_periods, CanonicalPeriod, FrameWindow};
use super::normalize::{normalize, numeric_value};
use super::quarters::{quarterly_value, ConceptSeries};
use super::resolver::{first_reported, FallbackPolicy};
use crate::models::edgar::CompanyFacts;
use crate::models::modeling_prep::VendorIncomeStatements;
use crate::models::{IncomeStatementRecord, Metric};

/// Assembles statements from SEC company facts
#[derive(Debug, Clone)]
pub struct FilingsAssembler {
    policy: FallbackPolicy,
    window: FrameWindow,
}

impl FilingsAssembler {
    pub fn new(policy: FallbackPolicy, window: FrameWindow) -> Self {
        Self { policy, window }
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    pub fn window(&self) -> &FrameWindow {
        &self.window
    }

    /// Canonical periods of one company, derived from the concepts the policy uses
    pub fn periods(&self, facts: &CompanyFacts) -> Vec<CanonicalPeriod> {
        let concepts = self.policy.concepts();
        derive_periods(concepts.iter().flat_map(|c| facts.usd(c)), &self.window)
    }

    /// Statements newest period first. Every policy metric is set on every
    /// record when it could be determined, otherwise left absent.
    pub fn assemble(&self, symbol: &str, facts: &CompanyFacts) -> Vec<IncomeStatementRecord> {
        let series: HashMap<&str, ConceptSeries> = self
            .policy
            .concepts()
            .into_iter()
            .map(|concept| (concept, ConceptSeries::from_observations(facts.usd(concept))))
            .collect();

        if series.values().all(ConceptSeries::is_empty) {
            warn!("⚠️ {} has none of the income statement concepts tagged", symbol);
        }

        self.periods(facts)
            .iter()
            .map(|period| {
                let mut record = IncomeStatementRecord::new(symbol, period.end);
                for metric in self.policy.metrics() {
                    let raw = self.resolve(metric, period, &series);
                    record.set(metric, raw.map(|value| normalize(value, metric.scale())));
                }
                debug!("{} {} ({:?}): {:?}", symbol, period.end, period.frame, record);
                record
            })
            .collect()
    }

    fn resolve(&self, metric: Metric, period: &CanonicalPeriod, series: &HashMap<&str, ConceptSeries>) -> Option<f64> {
        let raw = |metric: Metric| {
            first_reported(self.policy.candidates(metric), |concept| {
                series.get(concept).and_then(|s| quarterly_value(period, s))
            })
        };

        let direct = raw(metric);
        if metric != Metric::GrossProfit || direct.is_some_and(|v| v != 0.0) {
            return direct;
        }

        // Filers that never tag GrossProfit still report revenue and cost.
        // A zero revenue or cost is not a usable basis for the difference.
        match (raw(Metric::Revenue), raw(Metric::CostOfRevenue)) {
            (Some(revenue), Some(cost)) if revenue != 0.0 && cost != 0.0 => Some(revenue - cost),
            _ => direct,
        }
    }
}

/// Statements from vendor rows dated in or after `start_year`, newest first
pub fn assemble_vendor(statements: &VendorIncomeStatements, metrics: &[Metric], start_year: i32) -> Vec<IncomeStatementRecord> {
    let mut records: Vec<IncomeStatementRecord> = statements
        .financials
        .iter()
        .filter_map(|row| {
            let date = match NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d") {
                Ok(date) => date,
                Err(_) => {
                    warn!("⚠️ Skipping {} row with unreadable date {:?}", statements.symbol, row.date);
                    return None;
                }
            };
            if date.year() < start_year {
                return None;
            }

            let mut record = IncomeStatementRecord::new(statements.symbol.as_str(), date);
            for metric in metrics {
                let value = row
                    .field(metric.vendor_field())
                    .map(|raw| normalize(numeric_value(raw), metric.scale()));
                record.set(*metric, value);
            }
            Some(record)
        })
        .collect();

    records.sort_by(|a, b| b.date.cmp(&a.date));
    records
}
