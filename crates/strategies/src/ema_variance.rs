use crate::error::StrategyError;
use crate::price_buffer::PriceBuffer;
use crate::thresholds::{ThresholdEngine, Thresholds};
use crate::trend::{compute_ema, deviation};
use crate::Strategy;
use configuration::ThresholdParams;
use core_types::{PriceSample, Signal};

/// Outcome of feeding one price into the strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// The price window is not full yet; no trend is defined.
    WarmingUp { collected: usize, required: usize },
    Ready(SignalReport),
}

/// Everything the strategy derived from the latest price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalReport {
    pub price: f64,
    pub ema: f64,
    pub deviation: f64,
    pub thresholds: Thresholds,
    pub signal: Option<Signal>,
}

/// EMA deviation strategy with adaptive thresholds.
///
/// Buys when the price dips far enough below its EMA and sells when it rises far
/// enough above it, where "far enough" is re-derived every cycle by the
/// `ThresholdEngine`.
pub struct EmaVarianceStrategy {
    window: usize,
    prices: PriceBuffer,
    thresholds: ThresholdEngine,
}

impl EmaVarianceStrategy {
    /// Creates a new `EmaVarianceStrategy` over an EMA of `window` prices.
    pub fn new(window: usize, params: ThresholdParams) -> Result<Self, StrategyError> {
        if window == 0 {
            return Err(StrategyError::InvalidParameters(
                "EMA window cannot be zero".to_string(),
            ));
        }
        if params.history_capacity == 0 {
            return Err(StrategyError::InvalidParameters(
                "Deviation history capacity cannot be zero".to_string(),
            ));
        }

        Ok(Self {
            window,
            prices: PriceBuffer::new(window),
            thresholds: ThresholdEngine::new(params),
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn prices(&self) -> &PriceBuffer {
        &self.prices
    }

    pub fn threshold_engine(&self) -> &ThresholdEngine {
        &self.thresholds
    }
}

impl Strategy for EmaVarianceStrategy {
    fn evaluate(
        &mut self,
        sample: &PriceSample,
        exposure_fraction: f64,
    ) -> Result<Evaluation, StrategyError> {
        self.prices.push(*sample);

        let Some(ema) = compute_ema(&self.prices.prices(), self.window) else {
            tracing::debug!(
                collected = self.prices.len(),
                required = self.window,
                "Collecting data for EMA"
            );
            return Ok(Evaluation::WarmingUp {
                collected: self.prices.len(),
                required: self.window,
            });
        };

        let deviation = deviation(sample.price, ema)?;
        let thresholds = self.thresholds.update(deviation, exposure_fraction);

        let signal = if deviation <= thresholds.buy {
            Some(Signal::Buy)
        } else if deviation >= thresholds.sell {
            Some(Signal::Sell)
        } else {
            None
        };

        tracing::debug!(
            price = sample.price,
            ema,
            deviation,
            buy_threshold = thresholds.buy,
            sell_threshold = thresholds.sell,
            ?signal,
            "EmaVariance: evaluated price"
        );

        Ok(Evaluation::Ready(SignalReport {
            price: sample.price,
            ema,
            deviation,
            thresholds,
            signal,
        }))
    }
}
