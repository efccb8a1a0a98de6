//! Alternate-concept resolution: filers tag the same line item under
//! different us-gaap concepts, so each metric carries an ordered preference list.

use std::collections::BTreeMap;

use crate::models::Metric;

/// Per-metric preference lists of us-gaap concepts, most preferred first
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackPolicy {
    candidates: BTreeMap<Metric, Vec<String>>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        let defaults: [(Metric, &[&str]); 8] = [
            (
                Metric::Revenue,
                &[
                    "Revenues",
                    "RevenueFromContractWithCustomerExcludingAssessedTax",
                    "RevenueFromContractWithCustomerIncludingAssessedTax",
                    "OperatingLeaseLeaseIncome",
                ],
            ),
            (Metric::CostOfRevenue, &["CostOfGoodsAndServicesSold", "CostOfRevenue"]),
            (Metric::GrossProfit, &["GrossProfit"]),
            (Metric::OperatingExpense, &["OperatingExpenses"]),
            (Metric::RdExpense, &["ResearchAndDevelopmentExpense"]),
            (Metric::SgaExpense, &["SellingGeneralAndAdministrativeExpense"]),
            (Metric::OperatingIncome, &["OperatingIncomeLoss"]),
            (
                Metric::NetIncomeCom,
                &["NetIncomeLoss", "NetIncomeLossAvailableToCommonStockholdersBasic", "ProfitLoss"],
            ),
        ];

        let mut policy = Self::empty();
        for (metric, concepts) in defaults {
            policy = policy.with_candidates(metric, concepts.iter().map(|c| c.to_string()).collect());
        }
        policy
    }
}

impl FallbackPolicy {
    pub fn empty() -> Self {
        Self {
            candidates: BTreeMap::new(),
        }
    }

    /// Replace the preference list of one metric
    pub fn with_candidates(mut self, metric: Metric, concepts: Vec<String>) -> Self {
        if concepts.is_empty() {
            self.candidates.remove(&metric);
        } else {
            self.candidates.insert(metric, concepts);
        }
        self
    }

    pub fn candidates(&self, metric: Metric) -> &[String] {
        self.candidates.get(&metric).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Metrics this policy can resolve from filings
    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        self.candidates.keys().copied()
    }

    /// Every concept named by the policy, each once
    pub fn concepts(&self) -> Vec<&str> {
        let mut concepts: Vec<&str> = Vec::new();
        for concept in self.candidates.values().flatten() {
            if !concepts.contains(&concept.as_str()) {
                concepts.push(concept);
            }
        }
        concepts
    }
}

/// Value of the first candidate that reports a non-zero figure.
///
/// Later candidates are never looked up once one is non-zero. When nothing is
/// non-zero the result is `Some(0.0)` if some candidate genuinely reported
/// zero, otherwise `None`.
pub fn first_reported<S, F>(candidates: &[S], mut lookup: F) -> Option<f64>
where
    S: AsRef<str>,
    F: FnMut(&str) -> Option<f64>,
{
    let mut saw_zero = false;
    for candidate in candidates {
        match lookup(candidate.as_ref()) {
            Some(value) if value != 0.0 => return Some(value),
            Some(_) => saw_zero = true,
            None => {}
        }
    }
    saw_zero.then_some(0.0)
}
