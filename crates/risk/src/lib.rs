//! # Trendbot Risk
//!
//! Everything between a raw buy/sell signal and an order: the equity-scaled risk
//! parameters, the ordered buy checks, position sizing, and the trade outcome
//! bookkeeping that feeds back into sizing.
//!
//! All functions here are pure or mutate only state passed in by the caller; one
//! `TradeMemory` and one `OutcomeTracker` exist per traded asset.

pub mod error;
pub mod gate;
pub mod memory;
pub mod outcome;
pub mod params;
pub mod sizer;

pub use error::RiskError;
pub use gate::{can_buy, BuyContext, RejectReason};
pub use memory::TradeMemory;
pub use outcome::{
    OutcomeCounters, OutcomeKind, OutcomeTracker, PerformanceSummary, StreakLabel, TradeOutcome,
};
pub use params::RiskParameters;
pub use sizer::size_usd;
