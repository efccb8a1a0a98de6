//! Unit tests across the reconciliation engine

mod period_derivation;
mod recent_financials;
