//! SEC company facts payloads (`/api/xbrl/companyfacts/CIK##########.json`)

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Company facts response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CompanyFacts {
    #[serde(default)]
    pub cik: Option<u64>,
    #[serde(rename = "entityName", default)]
    pub entity_name: Option<String>,
    #[serde(default)]
    pub facts: Facts,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Facts {
    #[serde(rename = "us-gaap", default)]
    pub us_gaap: HashMap<String, Concept>,
}

/// One taxonomy concept, e.g. `Revenues`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Concept {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub units: HashMap<String, Vec<Observation>>,
}

impl Concept {
    pub fn usd(&self) -> &[Observation] {
        self.units.get("USD").map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One reported value of a concept
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Observation {
    pub end: NaiveDate,
    pub val: f64,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub frame: Option<String>,
    #[serde(default)]
    pub filed: Option<NaiveDate>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub fy: Option<i32>,
    #[serde(default)]
    pub fp: Option<String>,
    #[serde(default)]
    pub accn: Option<String>,
}

impl Observation {
    /// Frame tag, if the filer's value was assigned one
    pub fn frame(&self) -> Option<&str> {
        self.frame.as_deref().filter(|f| !f.is_empty())
    }
}

impl CompanyFacts {
    /// USD observations of a us-gaap concept; empty when the concept is absent
    pub fn usd(&self, concept: &str) -> &[Observation] {
        self.facts.us_gaap.get(concept).map(Concept::usd).unwrap_or(&[])
    }

    pub fn has_gaap(&self) -> bool {
        !self.facts.us_gaap.is_empty()
    }
}
