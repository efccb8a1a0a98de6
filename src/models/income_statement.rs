use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Unit scale applied when a raw upstream value is normalised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// Currency amounts and share counts, stored in millions
    Millions,
    /// Growth rates, per-share figures and margins, stored to 3 decimals
    Ratio,
}

/// Canonical income statement line items
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Revenue,
    RevenueGrowth,
    CostOfRevenue,
    GrossProfit,
    RdExpense,
    SgaExpense,
    OperatingExpense,
    OperatingIncome,
    InterestExpense,
    Ebt,
    IncomeTaxExpense,
    NetIncomeNonControlling,
    NetIncomeDiscontinued,
    NetIncome,
    PreferredDividends,
    NetIncomeCom,
    Eps,
    EpsDiluted,
    SharesOutstanding,
    SharesOutstandingDiluted,
    DividendPerShare,
    GrossMargin,
    EbitdaMargin,
    EbitMargin,
    ProfitMargin,
    FreeCashFlowMargin,
    Ebitda,
    Ebit,
    ConsolidatedIncome,
    EbtMargin,
    NetProfitMargin,
}

impl Metric {
    /// Metrics of the reduced `income_statements` schema and the recent financials report
    pub const CORE: [Metric; 4] = [
        Metric::Revenue,
        Metric::GrossProfit,
        Metric::OperatingIncome,
        Metric::NetIncomeCom,
    ];

    pub const ALL: [Metric; 31] = [
        Metric::Revenue,
        Metric::RevenueGrowth,
        Metric::CostOfRevenue,
        Metric::GrossProfit,
        Metric::RdExpense,
        Metric::SgaExpense,
        Metric::OperatingExpense,
        Metric::OperatingIncome,
        Metric::InterestExpense,
        Metric::Ebt,
        Metric::IncomeTaxExpense,
        Metric::NetIncomeNonControlling,
        Metric::NetIncomeDiscontinued,
        Metric::NetIncome,
        Metric::PreferredDividends,
        Metric::NetIncomeCom,
        Metric::Eps,
        Metric::EpsDiluted,
        Metric::SharesOutstanding,
        Metric::SharesOutstandingDiluted,
        Metric::DividendPerShare,
        Metric::GrossMargin,
        Metric::EbitdaMargin,
        Metric::EbitMargin,
        Metric::ProfitMargin,
        Metric::FreeCashFlowMargin,
        Metric::Ebitda,
        Metric::Ebit,
        Metric::ConsolidatedIncome,
        Metric::EbtMargin,
        Metric::NetProfitMargin,
    ];

    /// Column name in `income_statements`
    pub fn column(&self) -> &'static str {
        match self {
            Metric::Revenue => "revenue",
            Metric::RevenueGrowth => "revenue_growth",
            Metric::CostOfRevenue => "cost_of_revenue",
            Metric::GrossProfit => "gross_profit",
            Metric::RdExpense => "rd_expense",
            Metric::SgaExpense => "sga_expense",
            Metric::OperatingExpense => "operating_expense",
            Metric::OperatingIncome => "operating_income",
            Metric::InterestExpense => "interest_expense",
            Metric::Ebt => "ebt",
            Metric::IncomeTaxExpense => "income_tax_expense",
            Metric::NetIncomeNonControlling => "net_income_non_controlling",
            Metric::NetIncomeDiscontinued => "net_income_discontinued",
            Metric::NetIncome => "net_income",
            Metric::PreferredDividends => "preferred_dividends",
            Metric::NetIncomeCom => "net_income_com",
            Metric::Eps => "eps",
            Metric::EpsDiluted => "eps_diluted",
            Metric::SharesOutstanding => "shares_outstanding",
            Metric::SharesOutstandingDiluted => "shares_outstanding_diluted",
            Metric::DividendPerShare => "dividend_per_share",
            Metric::GrossMargin => "gross_margin",
            Metric::EbitdaMargin => "ebitda_margin",
            Metric::EbitMargin => "ebit_margin",
            Metric::ProfitMargin => "profit_margin",
            Metric::FreeCashFlowMargin => "free_cash_flow_margin",
            Metric::Ebitda => "ebitda",
            Metric::Ebit => "ebit",
            Metric::ConsolidatedIncome => "consolidated_income",
            Metric::EbtMargin => "ebt_margin",
            Metric::NetProfitMargin => "net_profit_margin",
        }
    }

    /// Field name in a Financial Modeling Prep statement row
    pub fn vendor_field(&self) -> &'static str {
        match self {
            Metric::Revenue => "Revenue",
            Metric::RevenueGrowth => "Revenue Growth",
            Metric::CostOfRevenue => "Cost of Revenue",
            Metric::GrossProfit => "Gross Profit",
            Metric::RdExpense => "R&D Expenses",
            Metric::SgaExpense => "SG&A Expense",
            Metric::OperatingExpense => "Operating Expenses",
            Metric::OperatingIncome => "Operating Income",
            Metric::InterestExpense => "Interest Expense",
            Metric::Ebt => "Earnings before Tax",
            Metric::IncomeTaxExpense => "Income Tax Expense",
            Metric::NetIncomeNonControlling => "Net Income - Non-Controlling int",
            Metric::NetIncomeDiscontinued => "Net Income - Discontinued ops",
            Metric::NetIncome => "Net Income",
            Metric::PreferredDividends => "Preferred Dividends",
            Metric::NetIncomeCom => "Net Income Com",
            Metric::Eps => "EPS",
            Metric::EpsDiluted => "EPS Diluted",
            Metric::SharesOutstanding => "Weighted Average Shs Out",
            Metric::SharesOutstandingDiluted => "Weighted Average Shs Out (Dil)",
            Metric::DividendPerShare => "Dividend per Share",
            Metric::GrossMargin => "Gross Margin",
            Metric::EbitdaMargin => "EBITDA Margin",
            Metric::EbitMargin => "EBIT Margin",
            Metric::ProfitMargin => "Profit Margin",
            Metric::FreeCashFlowMargin => "Free Cash Flow margin",
            Metric::Ebitda => "EBITDA",
            Metric::Ebit => "EBIT",
            Metric::ConsolidatedIncome => "Consolidated Income",
            Metric::EbtMargin => "Earnings Before Tax Margin",
            Metric::NetProfitMargin => "Net Profit Margin",
        }
    }

    pub fn scale(&self) -> Scale {
        match self {
            Metric::RevenueGrowth
            | Metric::Eps
            | Metric::EpsDiluted
            | Metric::DividendPerShare
            | Metric::GrossMargin
            | Metric::EbitdaMargin
            | Metric::EbitMargin
            | Metric::ProfitMargin
            | Metric::FreeCashFlowMargin
            | Metric::EbtMargin
            | Metric::NetProfitMargin => Scale::Ratio,
            _ => Scale::Millions,
        }
    }

    pub fn from_column(column: &str) -> Option<Metric> {
        Metric::ALL.iter().copied().find(|m| m.column() == column)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// One company, one reporting period. A metric missing from `values` could
/// not be determined from upstream data.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeStatementRecord {
    pub symbol: String,
    pub date: NaiveDate,
    values: BTreeMap<Metric, f64>,
}

impl IncomeStatementRecord {
    pub fn new(symbol: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        match value {
            Some(value) => {
                self.values.insert(metric, value);
            }
            None => {
                self.values.remove(&metric);
            }
        }
    }

    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.values.insert(metric, value);
        self
    }

    pub fn metrics(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.values.iter().map(|(m, v)| (*m, *v))
    }
}

/// A manual override row from the corrections file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IncomeStatementCorrection {
    pub symbol: String,
    pub date: NaiveDate,
    pub revenue: f64,
    pub gross_profit: f64,
    pub operating_income: f64,
    pub net_income_com: f64,
}
