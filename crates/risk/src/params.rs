use chrono::TimeDelta;

// Exposure cap: 30% of equity, never below $3 or above $25.
const EXPOSURE_PCT: f64 = 0.30;
const MIN_EXPOSURE_USD: f64 = 3.00;
const MAX_EXPOSURE_USD: f64 = 25.00;

// Cash buffer: 8% of equity, between $1 and $5.
const BUFFER_PCT: f64 = 0.08;
const MIN_BUFFER_USD: f64 = 1.00;
const MAX_BUFFER_USD: f64 = 5.00;

// Favorable move since the last buy: 0.4% to 1.0%.
const MIN_REQUIRED_DROP: f64 = 0.004;
const MAX_REQUIRED_DROP: f64 = 0.010;

// Equity-scaled base thresholds.
const SMALL_ACCOUNT_BUY: f64 = -0.003;
const LARGE_ACCOUNT_BUY: f64 = -0.010;
const SMALL_ACCOUNT_SELL: f64 = 0.008;
const LARGE_ACCOUNT_SELL: f64 = 0.020;

/// Equity at which the linear ramps saturate.
const RAMP_EQUITY_USD: f64 = 100.0;

/// Risk limits derived from total equity. Recomputed every cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskParameters {
    pub equity: f64,
    /// Maximum USD value of asset holdings before buys are refused.
    pub exposure_cap: f64,
    /// Cash that must remain after paying one unit of the asset.
    pub cash_buffer: f64,
    /// Minimum time between two buys.
    pub cooldown: TimeDelta,
    /// Fractional price drop since the last buy required before buying again.
    pub required_drop: f64,
    /// Equity-scaled buy trigger. Reported, not used for decisions.
    pub base_buy_threshold: f64,
    /// Equity-scaled sell trigger. Reported, not used for decisions.
    pub base_sell_threshold: f64,
}

impl RiskParameters {
    pub fn for_equity(equity: f64) -> Self {
        Self {
            equity,
            exposure_cap: exposure_cap(equity),
            cash_buffer: cash_buffer(equity),
            cooldown: cooldown(equity),
            required_drop: required_drop(equity),
            base_buy_threshold: base_buy_threshold(equity),
            base_sell_threshold: base_sell_threshold(equity),
        }
    }
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    min.max(value.min(max))
}

/// Position of `equity` on the ramp, capped at 1.
fn ramp(equity: f64) -> f64 {
    (equity / RAMP_EQUITY_USD).min(1.0)
}

pub fn exposure_cap(equity: f64) -> f64 {
    clamp(equity * EXPOSURE_PCT, MIN_EXPOSURE_USD, MAX_EXPOSURE_USD)
}

pub fn cash_buffer(equity: f64) -> f64 {
    clamp(equity * BUFFER_PCT, MIN_BUFFER_USD, MAX_BUFFER_USD)
}

/// Small accounts may trade more often than large ones.
pub fn cooldown(equity: f64) -> TimeDelta {
    if equity < 25.0 {
        TimeDelta::seconds(20)
    } else if equity < 100.0 {
        TimeDelta::seconds(45)
    } else {
        TimeDelta::seconds(90)
    }
}

pub fn required_drop(equity: f64) -> f64 {
    MIN_REQUIRED_DROP + (MAX_REQUIRED_DROP - MIN_REQUIRED_DROP) * ramp(equity)
}

pub fn base_buy_threshold(equity: f64) -> f64 {
    SMALL_ACCOUNT_BUY + (LARGE_ACCOUNT_BUY - SMALL_ACCOUNT_BUY) * ramp(equity)
}

pub fn base_sell_threshold(equity: f64) -> f64 {
    SMALL_ACCOUNT_SELL + (LARGE_ACCOUNT_SELL - SMALL_ACCOUNT_SELL) * ramp(equity)
}
