//! # Trendbot Strategy Library
//!
//! This crate turns a raw price stream into a directional signal. It contains the
//! price buffer, the EMA trend smoother, the deviation calculation and the adaptive
//! threshold engine, tied together by `EmaVarianceStrategy`.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of exchanges,
//!   balances, or execution. It depends only on `core-types` and `configuration`.
//! - **Strategy Agnostic Engine:** The engine drives any `Strategy` implementation and
//!   applies risk rules to the signals it emits.
//!
//! ## Public API
//!
//! - `Strategy`: The core trait all strategies implement.
//! - `EmaVarianceStrategy`: EMA deviation strategy with volatility-scaled thresholds.
//! - `compute_ema` / `deviation`: the pure signal math, usable on their own.
//! - `ThresholdEngine`: the self-tuning buy/sell trigger model.

// Declare all the modules that constitute this crate.
pub mod ema_variance;
pub mod error;
pub mod price_buffer;
pub mod thresholds;
pub mod trend;

// Re-export the key components to create a clean, public-facing API.
pub use ema_variance::{EmaVarianceStrategy, Evaluation, SignalReport};
pub use error::StrategyError;
pub use price_buffer::PriceBuffer;
pub use thresholds::{DeviationHistory, Direction, ThresholdEngine, Thresholds};
pub use trend::{compute_ema, deviation};

use core_types::PriceSample;

/// The core trait that all trading strategies must implement.
///
/// The `&mut self` in `evaluate` is crucial, as strategies keep rolling state
/// (the price window and the deviation history) between calls.
pub trait Strategy: Send + Sync {
    /// Feeds the latest price into the strategy.
    ///
    /// # Arguments
    ///
    /// * `sample` - The price observed this cycle.
    /// * `exposure_fraction` - Share of total equity currently held in the asset.
    ///
    /// # Returns
    ///
    /// * `Ok(Evaluation::WarmingUp { .. })` - not enough prices have been collected yet.
    /// * `Ok(Evaluation::Ready(report))` - the signal state for this cycle.
    /// * `Err(StrategyError)` - if an error occurs during evaluation.
    fn evaluate(
        &mut self,
        sample: &PriceSample,
        exposure_fraction: f64,
    ) -> Result<Evaluation, StrategyError>;
}
