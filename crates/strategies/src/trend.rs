use crate::error::StrategyError;
use ta::indicators::ExponentialMovingAverage as Ema;
use ta::Next;

/// Exponential moving average of `prices`, oldest first.
///
/// Returns `None` while fewer than `window` prices are available. The first price
/// seeds the average and every later price is folded in with `k = 2 / (window + 1)`,
/// so the result depends only on the input sequence.
pub fn compute_ema(prices: &[f64], window: usize) -> Option<f64> {
    if window == 0 || prices.len() < window {
        return None;
    }

    let mut ema = Ema::new(window).ok()?;
    prices.iter().map(|&price| ema.next(price)).last()
}

/// Fractional distance of `price` from the trend: `(price - ema) / ema`.
pub fn deviation(price: f64, ema: f64) -> Result<f64, StrategyError> {
    if !ema.is_finite() || ema <= 0.0 {
        return Err(StrategyError::IndicatorError(format!(
            "cannot measure deviation against a trend value of {ema}"
        )));
    }
    Ok((price - ema) / ema)
}
