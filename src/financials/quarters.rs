//! Single-quarter values of one concept, deriving a missing quarter from the
//! annual total when only the annual figure was tagged.

use std::collections::HashMap;

use tracing::debug;

use super::frames::{CanonicalPeriod, FrameKind};
use crate::models::edgar::Observation;

/// Observations of one concept keyed by frame tag
#[derive(Debug, Clone, Default)]
pub struct ConceptSeries {
    by_frame: HashMap<String, f64>,
}

impl ConceptSeries {
    /// Revisions of the same frame resolve to the latest period end, then the latest filing
    pub fn from_observations(observations: &[Observation]) -> Self {
        let mut tagged: Vec<&Observation> = observations.iter().filter(|o| o.frame().is_some()).collect();
        tagged.sort_by(|a, b| b.end.cmp(&a.end).then_with(|| b.filed.cmp(&a.filed)));

        let mut by_frame = HashMap::new();
        for observation in tagged {
            if let Some(frame) = observation.frame() {
                by_frame.entry(frame.to_string()).or_insert(observation.val);
            }
        }
        Self { by_frame }
    }

    pub fn value(&self, frame: &str) -> Option<f64> {
        self.by_frame.get(frame).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.by_frame.is_empty()
    }
}

/// Raw single-quarter value of `series` for `period`.
///
/// An annual-tagged period yields `annual - (sum of the three quarters before
/// it)`, so a fiscal year ending in any quarter is handled. Preceding quarters
/// that were never tagged count as zero, so the result then overstates the
/// quarter; the annual total itself must exist.
pub fn quarterly_value(period: &CanonicalPeriod, series: &ConceptSeries) -> Option<f64> {
    let frame = period.frame.as_deref()?;

    match period.kind() {
        FrameKind::Quarterly => series.value(frame),
        FrameKind::Annual => {
            let annual = series.value(frame)?;
            let preceding: f64 = period
                .slot
                .preceding_quarters()
                .iter()
                .map(|quarter| {
                    series.value(&quarter.token()).unwrap_or_else(|| {
                        debug!("{} missing while deriving {} from {}", quarter, period.slot, frame);
                        0.0
                    })
                })
                .sum();
            Some(annual - preceding)
        }
        FrameKind::Other => None,
    }
}
