use crate::error::ConfigError;
use rust_decimal::Decimal;
use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub trading: TradingConfig,
    pub thresholds: ThresholdParams,
    pub outcomes: OutcomeConfig,
    pub exchange: ExchangeConfig,
    pub discord: DiscordConfig,
    pub logging: LoggingConfig,
}

/// Parameters of the polling loop and the traded product.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    /// The product to trade (e.g., "ETH-USD").
    pub product_id: String,
    /// Number of prices the trend EMA is computed over. Also the price buffer capacity.
    pub ema_window: usize,
    /// Delay between two decision cycles.
    pub poll_interval_secs: u64,
    /// Delay before re-checking when unresolved orders are found.
    pub open_order_pause_secs: u64,
    /// Delay after a failed cycle.
    pub error_backoff_secs: u64,
    /// When set, orders are logged but never sent to the exchange.
    pub dry_run: bool,
    /// Buys smaller than this (in USD) are skipped.
    pub min_order_usd: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            product_id: "ETH-USD".to_string(),
            ema_window: 20,
            poll_interval_secs: 15,
            open_order_pause_secs: 10,
            error_backoff_secs: 5,
            dry_run: true,
            min_order_usd: 1.0,
        }
    }
}

/// An inclusive `[min, max]` range used to bound a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ClampRange {
    pub min: f64,
    pub max: f64,
}

impl ClampRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `max(min, min(value, max))`. Callers must have validated `min <= max`.
    pub fn clamp(&self, value: f64) -> f64 {
        self.min.max(value.min(self.max))
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Static configuration of the adaptive threshold engine.
///
/// Rates are fractions: `-0.0065` is a 0.65% dip below the trend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThresholdParams {
    /// Bootstrap buy trigger. Must be negative.
    pub base_buy: f64,
    /// Bootstrap sell trigger. Must be positive.
    pub base_sell: f64,
    /// How many recent deviations are kept.
    pub history_capacity: usize,
    pub buy_multiplier: f64,
    pub sell_multiplier: f64,
    pub buy_clamp: ClampRange,
    pub sell_clamp: ClampRange,
    /// Applied to the side a trend makes harder to trigger.
    pub widen_factor: f64,
    /// Applied to the side a trend makes easier to trigger.
    pub tighten_factor: f64,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            base_buy: -0.0065,
            base_sell: 0.0075,
            history_capacity: 12,
            buy_multiplier: 14.0,
            sell_multiplier: 12.0,
            buy_clamp: ClampRange::new(-0.012, -0.005),
            sell_clamp: ClampRange::new(0.006, 0.014),
            widen_factor: 1.20,
            tighten_factor: 0.80,
        }
    }
}

/// When the "recent" win/loss counters that drive position sizing are cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum StreakReset {
    /// Recent counters only ever grow for the lifetime of the process.
    #[default]
    Never,
    /// A win clears recent losses and a loss clears recent wins.
    OnReversal,
    /// Both recent counters are cleared after every `trades` evaluated sells.
    Rolling { trades: u32 },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutcomeConfig {
    pub streak_reset: StreakReset,
}

/// Brokerage connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Base URL of the authenticated trading API.
    pub api_url: String,
    /// Base URL of the public spot price API.
    pub price_url: String,
    pub api_key: String,
    pub api_secret: String,
    /// When both stub balances are set they replace the account lookup.
    pub stub_cash_balance: Option<Decimal>,
    pub stub_asset_balance: Option<Decimal>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.coinbase.com".to_string(),
            price_url: "https://api.coinbase.com".to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            stub_cash_balance: None,
            stub_asset_balance: None,
        }
    }
}

impl ExchangeConfig {
    pub fn stub_balances(&self) -> Option<(Decimal, Decimal)> {
        self.stub_cash_balance.zip(self.stub_asset_balance)
    }
}

/// Discord webhooks. An empty URL disables that channel.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Routine status updates.
    pub logs_webhook: String,
    /// Trade signals, outcomes and errors.
    pub alerts_webhook: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory of the daily rolling log file.
    pub directory: String,
    pub file_prefix: String,
    /// Used when `RUST_LOG` is not set.
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_prefix: "trendbot.log".to_string(),
            default_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Rejects parameter combinations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

        let trading = &self.trading;
        if trading.product_id.trim().is_empty() {
            return invalid("trading.product_id must not be empty");
        }
        if trading.ema_window == 0 {
            return invalid("trading.ema_window must be at least 1");
        }
        for (name, secs) in [
            ("poll_interval_secs", trading.poll_interval_secs),
            ("open_order_pause_secs", trading.open_order_pause_secs),
            ("error_backoff_secs", trading.error_backoff_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "trading.{name} must be greater than 0"
                )));
            }
        }
        if !(trading.min_order_usd >= 0.0) {
            return invalid("trading.min_order_usd must not be negative");
        }

        let t = &self.thresholds;
        if t.history_capacity == 0 {
            return invalid("thresholds.history_capacity must be at least 1");
        }
        if !(t.base_buy < 0.0) {
            return invalid("thresholds.base_buy must be negative");
        }
        if !(t.base_sell > 0.0) {
            return invalid("thresholds.base_sell must be positive");
        }
        for (name, range) in [("buy_clamp", t.buy_clamp), ("sell_clamp", t.sell_clamp)] {
            if !(range.min <= range.max) {
                return Err(ConfigError::ValidationError(format!(
                    "thresholds.{name}: min ({}) must not exceed max ({})",
                    range.min, range.max
                )));
            }
        }

        if let StreakReset::Rolling { trades: 0 } = self.outcomes.streak_reset {
            return invalid("outcomes.streak_reset rolling window must be at least 1 trade");
        }

        Ok(())
    }
}
