//! Twelve quarters of one company where a single quarter was only ever
//! tagged as part of its annual total, plus fiscal years that do not end
//! in December.

use std::collections::HashSet;

use pretty_assertions::assert_eq;
use stock_financials::financials::frames::FrameKind;
use stock_financials::financials::{FallbackPolicy, FilingsAssembler, FrameWindow, QuarterFrame};
use stock_financials::models::edgar::{CompanyFacts, Observation};
use stock_financials::models::{IncomeStatementRecord, Metric};

use crate::common::logging;
use crate::common::test_data::{company_facts, date, observation, quarterly_series};

/// 2021Q1..2023Q4 framed quarterly, except CY2022Q4 which only appears in CY2022
fn series_with_annual_gap(regular: f64, year_2022: f64, annual_2022: f64) -> Vec<Observation> {
    let mut observations: Vec<Observation> = quarterly_series(2023, 4, 12, regular)
        .into_iter()
        .filter(|o| o.frame.as_deref() != Some("CY2022Q4"))
        .map(|mut o| {
            if o.frame.as_deref().is_some_and(|f| f.starts_with("CY2022")) {
                o.val = year_2022;
            }
            o
        })
        .collect();
    observations.push(observation("CY2022", "2022-12-31", annual_2022));
    observations
}

fn company() -> CompanyFacts {
    company_facts(vec![
        ("Revenues", series_with_annual_gap(200_000_000.0, 250_000_000.0, 1_100_000_000.0)),
        ("CostOfRevenue", series_with_annual_gap(100_000_000.0, 100_000_000.0, 400_000_000.0)),
        ("NetIncomeLoss", series_with_annual_gap(50_000_000.0, 40_000_000.0, 170_000_000.0)),
    ])
}

#[test]
fn test_twelve_quarters_with_one_annual_substitution() {
    logging::init_test_logging();
    logging::log_test_step("Deriving 12 quarters with CY2022Q4 only in the annual total");

    let assembler = FilingsAssembler::new(FallbackPolicy::default(), FrameWindow::new(QuarterFrame::new(2024, 1), 12));
    let facts = company();

    let periods = assembler.periods(&facts);
    logging::log_test_data("Periods", &periods);

    // CY2024Q1 is not published yet and is dropped from the front
    assert_eq!(periods.len(), 12);
    assert_eq!(periods[0].slot, QuarterFrame::new(2023, 4));
    assert_eq!(periods[11].slot, QuarterFrame::new(2021, 1));
    assert!(periods.iter().enumerate().all(|(i, p)| p.rank == i));

    let substituted: Vec<_> = periods.iter().filter(|p| p.kind() == FrameKind::Annual).collect();
    assert_eq!(substituted.len(), 1);
    assert_eq!(substituted[0].slot, QuarterFrame::new(2022, 4));
    assert_eq!(substituted[0].frame.as_deref(), Some("CY2022"));
    assert_eq!(substituted[0].end, date("2022-12-31"));

    let records = assembler.assemble("TEST", &facts);
    assert_eq!(records.len(), 12);
    assert_eq!(records[0].date, date("2023-12-31"));

    let q4_2022 = &records[4];
    assert_eq!(q4_2022.date, date("2022-12-31"));
    assert_eq!(q4_2022.get(Metric::Revenue), Some(350.0));
    assert_eq!(q4_2022.get(Metric::CostOfRevenue), Some(100.0));
    assert_eq!(q4_2022.get(Metric::GrossProfit), Some(250.0));
    assert_eq!(q4_2022.get(Metric::NetIncomeCom), Some(50.0));

    let q3_2022 = &records[5];
    assert_eq!(q3_2022.get(Metric::Revenue), Some(250.0));
    assert_eq!(q3_2022.get(Metric::GrossProfit), Some(150.0));
    assert_eq!(q3_2022.get(Metric::NetIncomeCom), Some(40.0));

    assert_eq!(records[0].get(Metric::Revenue), Some(200.0));
    assert_eq!(records[0].get(Metric::OperatingIncome), None);
}

#[test]
fn test_short_window_truncates_oldest() {
    let assembler = FilingsAssembler::new(FallbackPolicy::default(), FrameWindow::new(QuarterFrame::new(2024, 1), 8));
    let periods = assembler.periods(&company());

    assert_eq!(periods.len(), 8);
    assert_eq!(periods[7].slot, QuarterFrame::new(2022, 1));
    assert_eq!(periods[7].frame.as_deref(), Some("CY2022Q1"));
}

#[test]
fn test_instant_frames_do_not_create_periods() {
    let facts = company_facts(vec![(
        "Revenues",
        vec![
            observation("CY2023Q4I", "2023-12-31", 5.0),
            observation("CY2023Q3", "2023-09-30", 7_000_000.0),
        ],
    )]);
    let assembler = FilingsAssembler::new(FallbackPolicy::default(), FrameWindow::new(QuarterFrame::new(2023, 4), 4));

    let records = assembler.assemble("TEST", &facts);
    assert_eq!(records[0].date, date("2023-09-30"));
    assert_eq!(records[0].get(Metric::Revenue), Some(7.0));
    assert_eq!(records[1].get(Metric::Revenue), None);
}

#[test]
fn test_custom_policy_changes_preference() {
    let facts = company_facts(vec![
        ("Revenues", quarterly_series(2023, 4, 4, 10_000_000.0)),
        ("SalesRevenueNet", quarterly_series(2023, 4, 4, 12_000_000.0)),
    ]);
    let policy = FallbackPolicy::empty().with_candidates(
        Metric::Revenue,
        vec!["SalesRevenueNet".to_string(), "Revenues".to_string()],
    );
    let assembler = FilingsAssembler::new(policy, FrameWindow::new(QuarterFrame::new(2023, 4), 4));

    let records = assembler.assemble("TEST", &facts);
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r.get(Metric::Revenue) == Some(12.0)));
    assert_eq!(records[0].get(Metric::NetIncomeCom), None);
}

fn assert_distinct_dates(records: &[IncomeStatementRecord]) {
    let dates: HashSet<_> = records.iter().map(|r| r.date).collect();
    assert_eq!(dates.len(), records.len(), "duplicate statement dates: {:?}", records);
}

#[test]
fn test_september_fiscal_year_derives_from_preceding_quarters() {
    logging::init_test_logging();
    logging::log_test_step("Fiscal year ending in September with its closing quarter untagged");

    let facts = company_facts(vec![(
        "Revenues",
        vec![
            observation("CY2023Q4", "2023-12-30", 119_575_000_000.0),
            observation("CY2023", "2023-09-30", 383_285_000_000.0),
            observation("CY2023Q2", "2023-07-01", 81_797_000_000.0),
            observation("CY2023Q1", "2023-04-01", 94_836_000_000.0),
            observation("CY2022Q4", "2022-12-31", 117_154_000_000.0),
            observation("CY2022Q3", "2022-09-24", 90_146_000_000.0),
        ],
    )]);
    let assembler = FilingsAssembler::new(FallbackPolicy::default(), FrameWindow::new(QuarterFrame::new(2023, 4), 8));

    let records = assembler.assemble("AAPL", &facts);
    logging::log_test_data("Records", &records);

    assert_eq!(records.len(), 8);
    assert_eq!(records[1].date, date("2023-09-30"));
    assert_eq!(records[1].get(Metric::Revenue), Some(89_498.0));
    assert_eq!(records[0].get(Metric::Revenue), Some(119_575.0));
    assert_distinct_dates(&records);
}

#[test]
fn test_mid_year_gap_filled_by_annual_gets_its_own_date() {
    let mut revenue: Vec<Observation> = quarterly_series(2023, 4, 8, 100_000_000.0)
        .into_iter()
        .filter(|o| o.frame.as_deref() != Some("CY2023Q2"))
        .collect();
    revenue.push(observation("CY2023", "2023-12-31", 400_000_000.0));
    let facts = company_facts(vec![("Revenues", revenue)]);
    let assembler = FilingsAssembler::new(FallbackPolicy::default(), FrameWindow::new(QuarterFrame::new(2023, 4), 8));

    let periods = assembler.periods(&facts);
    assert_eq!(periods[2].slot, QuarterFrame::new(2023, 2));
    assert_eq!(periods[2].kind(), FrameKind::Annual);

    let records = assembler.assemble("TEST", &facts);
    assert_eq!(records[0].date, date("2023-12-31"));
    assert_eq!(records[2].date, date("2023-06-30"));
    assert_eq!(records[2].get(Metric::Revenue), Some(100.0));
    assert!(records.iter().all(|r| r.get(Metric::Revenue) == Some(100.0)));
    assert_distinct_dates(&records);
}

#[test]
fn test_annual_substitution_never_repeats_a_date() {
    let assembler = FilingsAssembler::new(FallbackPolicy::default(), FrameWindow::new(QuarterFrame::new(2024, 1), 12));
    assert_distinct_dates(&assembler.assemble("TEST", &company()));
}
