//! Income statement reconciliation: periods, per-quarter values, fallback
//! concepts and the reports built from them.

pub mod assembler;
pub mod frames;
pub mod normalize;
pub mod prices;
pub mod quarters;
pub mod recent;
pub mod resolver;

pub use assembler::{assemble_vendor, FilingsAssembler};
pub use frames::{derive_periods, CanonicalPeriod, FrameWindow, QuarterFrame};
pub use recent::{pivot, recent_financials_headers, RecentFinancialsRow};
pub use resolver::{first_reported, FallbackPolicy};
