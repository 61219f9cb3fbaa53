const BASE_FRACTION: f64 = 0.10;
const MAX_FRACTION: f64 = 0.20;
const VOLATILITY_SENSITIVITY: f64 = 10.0;
const STREAK_STEP: f64 = 0.05;

/// USD amount to spend on a buy.
///
/// Starts at 10% of equity, shrinks when the deviation is large and grows
/// with recent wins. Never more than 20% of equity. There is no lower floor,
/// so callers must enforce the exchange's minimum order size.
pub fn size_usd(equity: f64, deviation: f64, recent_wins: u32, recent_losses: u32) -> f64 {
    if !equity.is_finite() || equity <= 0.0 {
        return 0.0;
    }

    let volatility_factor = (1.0 - deviation.abs() * VOLATILITY_SENSITIVITY).clamp(0.5, 1.5);
    let trend_factor = (1.0 + f64::from(recent_wins) * STREAK_STEP
        - f64::from(recent_losses) * STREAK_STEP)
        .clamp(0.7, 1.3);

    let fraction = (BASE_FRACTION * volatility_factor * trend_factor).min(MAX_FRACTION);
    equity * fraction
}
