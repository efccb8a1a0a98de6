//! Reporting-period derivation for SEC company facts.
//!
//! Filers tag duration facts with a calendar frame: `CY2023Q4` for a single
//! quarter, `CY2023` for a full year. Instant facts carry a trailing `I`
//! (`CY2023Q4I`) and never describe an income statement period.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::models::edgar::Observation;

/// A calendar quarter, e.g. `CY2023Q4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuarterFrame {
    year: i32,
    quarter: u8,
}

impl QuarterFrame {
    pub fn new(year: i32, quarter: u8) -> Self {
        debug_assert!((1..=4).contains(&quarter), "quarter out of range: {}", quarter);
        Self {
            year,
            quarter: quarter.clamp(1, 4),
        }
    }

    /// The calendar quarter `date` falls in
    pub fn containing(date: NaiveDate) -> Self {
        Self::new(date.year(), ((date.month() - 1) / 3 + 1) as u8)
    }

    /// The last quarter that ended strictly before `date`'s quarter began
    pub fn last_completed_before(date: NaiveDate) -> Self {
        Self::containing(date).previous()
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    pub fn token(&self) -> String {
        format!("CY{}Q{}", self.year, self.quarter)
    }

    pub fn annual_token(&self) -> String {
        format!("CY{}", self.year)
    }

    pub fn previous(&self) -> Self {
        if self.quarter == 1 {
            Self::new(self.year - 1, 4)
        } else {
            Self::new(self.year, self.quarter - 1)
        }
    }

    /// The three quarters before this one, latest first. With this quarter
    /// they make up the fiscal year an annual figure ending here covers.
    pub fn preceding_quarters(&self) -> [QuarterFrame; 3] {
        let first = self.previous();
        let second = first.previous();
        [first, second, second.previous()]
    }

    /// Calendar quarter-end, used when no filing covers the quarter
    pub fn calendar_end(&self) -> NaiveDate {
        let (month, day) = match self.quarter {
            1 => (3, 31),
            2 => (6, 30),
            3 => (9, 30),
            _ => (12, 31),
        };
        NaiveDate::from_ymd_opt(self.year, month, day).unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for QuarterFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CY{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for QuarterFrame {
    type Err = anyhow::Error;

    fn from_str(token: &str) -> Result<Self> {
        let rest = token
            .strip_prefix("CY")
            .ok_or_else(|| anyhow!("frame {:?} must start with CY", token))?;
        let (year, quarter) = rest
            .split_once('Q')
            .ok_or_else(|| anyhow!("frame {:?} has no quarter", token))?;
        let year: i32 = year.parse().map_err(|_| anyhow!("bad year in frame {:?}", token))?;
        let quarter: u8 = quarter.parse().map_err(|_| anyhow!("bad quarter in frame {:?}", token))?;
        if !(1..=4).contains(&quarter) {
            return Err(anyhow!("quarter must be 1-4 in frame {:?}", token));
        }
        Ok(Self::new(year, quarter))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Quarterly,
    Annual,
    Other,
}

pub fn frame_kind(frame: &str) -> FrameKind {
    match frame.len() {
        8 => FrameKind::Quarterly,
        6 => FrameKind::Annual,
        _ => FrameKind::Other,
    }
}

/// Which quarters a company's statements are derived for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameWindow {
    /// Newest quarter that might have been reported
    pub newest: QuarterFrame,
    /// Number of periods kept after unpublished quarters are dropped
    pub periods: usize,
}

impl FrameWindow {
    /// Extra slots generated so that dropping unpublished quarters still fills the window
    const LEAD_SLOTS: usize = 4;

    pub fn new(newest: QuarterFrame, periods: usize) -> Self {
        Self { newest, periods }
    }

    /// Command-line window size; only the 12 and 8 quarter layouts exist
    pub fn parse_periods(raw: &str) -> std::result::Result<usize, String> {
        match raw.trim().parse::<usize>() {
            Ok(periods @ (8 | 12)) => Ok(periods),
            _ => Err(format!("window must be 12 or 8, got {:?}", raw)),
        }
    }

    /// Expected quarters, newest first
    pub fn expected_slots(&self) -> Vec<QuarterFrame> {
        let mut slots = Vec::with_capacity(self.periods + Self::LEAD_SLOTS);
        let mut slot = self.newest;
        for _ in 0..self.periods + Self::LEAD_SLOTS {
            slots.push(slot);
            slot = slot.previous();
        }
        slots
    }
}

/// A derived reporting period, newest = rank 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPeriod {
    pub rank: usize,
    /// Quarter this period stands for
    pub slot: QuarterFrame,
    /// Frame tag of the matching observation, quarterly or annual
    pub frame: Option<String>,
    pub end: NaiveDate,
}

impl CanonicalPeriod {
    pub fn kind(&self) -> FrameKind {
        self.frame.as_deref().map(frame_kind).unwrap_or(FrameKind::Other)
    }
}

/// Derive the canonical periods of one company from every observation of the
/// concepts used to build its statements.
pub fn derive_periods<'a, I>(observations: I, window: &FrameWindow) -> Vec<CanonicalPeriod>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut tagged: Vec<&Observation> = observations.into_iter().filter(|o| o.frame().is_some()).collect();
    tagged.sort_by(|a, b| b.end.cmp(&a.end).then_with(|| b.filed.cmp(&a.filed)));

    let mut by_frame: HashMap<&str, &Observation> = HashMap::new();
    for observation in tagged {
        if let Some(frame) = observation.frame() {
            by_frame.entry(frame).or_insert(observation);
        }
    }

    let mut claimed_years: HashSet<i32> = HashSet::new();
    let mut periods: Vec<CanonicalPeriod> = window
        .expected_slots()
        .into_iter()
        .map(|slot| {
            if let Some(observation) = by_frame.get(slot.token().as_str()) {
                return (slot, Some(slot.token()), observation.end);
            }

            // Quarterly frame is sometimes missing; the annual figure covers it once per year
            let annual = slot.annual_token();
            if !claimed_years.contains(&slot.year()) {
                if let Some(observation) = by_frame.get(annual.as_str()) {
                    claimed_years.insert(slot.year());
                    debug!("{} has no quarterly frame, using {}", slot, annual);
                    // The annual end date only belongs to the quarter that closes the fiscal year
                    let end = if QuarterFrame::containing(observation.end) == slot {
                        observation.end
                    } else {
                        slot.calendar_end()
                    };
                    return (slot, Some(annual), end);
                }
            }

            (slot, None, slot.calendar_end())
        })
        .map(|(slot, frame, end)| CanonicalPeriod { rank: 0, slot, frame, end })
        .collect();

    // Latest quarter data may not yet be available
    if periods.iter().any(|p| p.frame.is_some()) {
        let leading = periods.iter().take_while(|p| p.frame.is_none()).count();
        periods.drain(..leading);
    }

    periods.truncate(window.periods);
    for (rank, period) in periods.iter_mut().enumerate() {
        period.rank = rank;
    }
    periods
}
