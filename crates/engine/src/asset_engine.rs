use crate::error::EngineError;
use configuration::{Config, StreakReset};
use core_types::{AccountSnapshot, PriceSample, Signal};
use risk::{
    can_buy, size_usd, BuyContext, OutcomeCounters, OutcomeTracker, PerformanceSummary,
    RejectReason, RiskParameters, TradeMemory, TradeOutcome,
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use strategies::{EmaVarianceStrategy, Evaluation, SignalReport, Strategy};

/// What the engine wants done this cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleDecision {
    /// Not enough prices for an EMA yet.
    WarmingUp { collected: usize, required: usize },
    Hold,
    /// Spend `usd_amount` of cash on the asset.
    Buy { usd_amount: Decimal },
    BuyBlocked { reason: RejectReason },
    /// Sized below the minimum order amount.
    BuySkipped { usd_amount: Decimal },
    /// Sell the whole position.
    Sell { asset_amount: Decimal },
    /// Sell signal without anything to sell.
    NothingToSell,
}

/// Everything derived in one evaluation, for logging and execution.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub sample: PriceSample,
    pub equity: f64,
    pub exposure_fraction: f64,
    pub risk: RiskParameters,
    pub signal: Option<SignalReport>,
    pub decision: CycleDecision,
}

impl CycleReport {
    /// One-line market status, e.g.
    /// `ETH-USD Price: 2000.0000 | EMA: 2010.0000 | Var: -0.50% | BUY: -0.65% | SELL: 0.75% | Exposure: 10.0%`.
    pub fn status_line(&self, product_id: &str) -> Option<String> {
        let report = self.signal.as_ref()?;
        Some(format!(
            "{product_id} Price: {:.4} | EMA: {:.4} | Var: {:.2}% | BUY: {:.2}% | SELL: {:.2}% | Exposure: {:.1}%",
            report.price,
            report.ema,
            report.deviation * 100.0,
            report.thresholds.buy * 100.0,
            report.thresholds.sell * 100.0,
            self.exposure_fraction * 100.0,
        ))
    }
}

/// Decision state for one traded asset.
///
/// `evaluate` is synchronous and performs no I/O. State only changes through
/// `evaluate` (price window, deviation history) and the `record_*` methods, which
/// the caller invokes once an order is confirmed.
pub struct AssetEngine {
    strategy: Box<dyn Strategy>,
    memory: TradeMemory,
    outcomes: OutcomeTracker,
    min_order_usd: Decimal,
}

impl AssetEngine {
    pub fn new(
        strategy: Box<dyn Strategy>,
        streak_reset: StreakReset,
        min_order_usd: f64,
    ) -> Result<Self, EngineError> {
        let min_order_usd = Decimal::from_f64(min_order_usd).ok_or_else(|| {
            EngineError::Configuration(format!("min_order_usd {min_order_usd} is not a number"))
        })?;

        Ok(Self {
            strategy,
            memory: TradeMemory::new(),
            outcomes: OutcomeTracker::new(streak_reset)?,
            min_order_usd,
        })
    }

    /// Builds the EMA deviation engine described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let strategy =
            EmaVarianceStrategy::new(config.trading.ema_window, config.thresholds.clone())?;
        Self::new(
            Box::new(strategy),
            config.outcomes.streak_reset,
            config.trading.min_order_usd,
        )
    }

    pub fn memory(&self) -> &TradeMemory {
        &self.memory
    }

    pub fn counters(&self) -> OutcomeCounters {
        self.outcomes.counters()
    }

    /// Runs one decision cycle over the latest price and balances.
    pub fn evaluate(
        &mut self,
        sample: &PriceSample,
        account: &AccountSnapshot,
    ) -> Result<CycleReport, EngineError> {
        let equity = account.equity(sample.price);
        let exposure_fraction = account.exposure_fraction(sample.price);
        let risk = RiskParameters::for_equity(equity);

        let report = match self.strategy.evaluate(sample, exposure_fraction)? {
            Evaluation::WarmingUp {
                collected,
                required,
            } => {
                return Ok(CycleReport {
                    sample: *sample,
                    equity,
                    exposure_fraction,
                    risk,
                    signal: None,
                    decision: CycleDecision::WarmingUp {
                        collected,
                        required,
                    },
                });
            }
            Evaluation::Ready(report) => report,
        };

        let decision = match report.signal {
            Some(Signal::Buy) => self.decide_buy(sample, account, equity, report.deviation),
            Some(Signal::Sell) if account.holds_asset() => CycleDecision::Sell {
                asset_amount: account.asset_balance,
            },
            Some(Signal::Sell) => CycleDecision::NothingToSell,
            None => CycleDecision::Hold,
        };

        Ok(CycleReport {
            sample: *sample,
            equity,
            exposure_fraction,
            risk,
            signal: Some(report),
            decision,
        })
    }

    fn decide_buy(
        &self,
        sample: &PriceSample,
        account: &AccountSnapshot,
        equity: f64,
        deviation: f64,
    ) -> CycleDecision {
        let ctx = BuyContext::new(sample.price, account, sample.timestamp);
        if let Err(reason) = can_buy(&ctx, &self.memory) {
            return CycleDecision::BuyBlocked { reason };
        }

        let counters = self.outcomes.counters();
        let size = size_usd(
            equity,
            deviation,
            counters.recent_wins,
            counters.recent_losses,
        );
        // Cents, rounded down so the order never exceeds the sized amount.
        let usd_amount = Decimal::from_f64(size)
            .unwrap_or(Decimal::ZERO)
            .round_dp_with_strategy(2, RoundingStrategy::ToZero);

        if usd_amount <= Decimal::ZERO || usd_amount < self.min_order_usd {
            CycleDecision::BuySkipped { usd_amount }
        } else {
            CycleDecision::Buy { usd_amount }
        }
    }

    /// Remembers a confirmed buy for the cooldown and favorable-move checks.
    pub fn record_buy(&mut self, price: f64, at: chrono::DateTime<chrono::Utc>) {
        self.memory.record_buy(price, at);
    }

    /// Scores a confirmed sell against the last buy. `None` if there was no buy on record.
    pub fn record_sell(&mut self, price: f64) -> Option<TradeOutcome> {
        self.outcomes.record_sell(&mut self.memory, price)
    }

    pub fn performance_summary(&self, account: &AccountSnapshot, price: f64) -> PerformanceSummary {
        PerformanceSummary::new(account, price, &self.outcomes.counters())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};
    use rust_decimal_macros::dec;

    fn new_engine(window: usize) -> AssetEngine {
        let mut config = Config::default();
        config.trading.ema_window = window;
        AssetEngine::from_config(&config).unwrap()
    }

    fn sample(price: f64) -> PriceSample {
        PriceSample::new(price, Utc::now()).unwrap()
    }

    #[test]
    fn flat_market_at_fifty_equity_holds() {
        let mut engine = new_engine(20);
        let account = AccountSnapshot::new(dec!(50), dec!(0));

        let mut last = None;
        for _ in 0..20 {
            last = Some(engine.evaluate(&sample(100.0), &account).unwrap());
        }
        let report = last.unwrap();
        let signal = report.signal.unwrap();
        assert!((signal.ema - 100.0).abs() < 1e-9);
        assert!(signal.deviation.abs() < 1e-9);
        assert_eq!(report.decision, CycleDecision::Hold);
    }

    #[test]
    fn warm_up_cycles_report_progress() {
        let mut engine = new_engine(3);
        let account = AccountSnapshot::new(dec!(1000), dec!(0));
        let report = engine.evaluate(&sample(100.0), &account).unwrap();
        assert_eq!(
            report.decision,
            CycleDecision::WarmingUp {
                collected: 1,
                required: 3
            }
        );
        assert_eq!(report.status_line("ETH-USD"), None);
    }

    #[test]
    fn dip_with_room_sizes_a_buy() {
        let mut engine = new_engine(3);
        let account = AccountSnapshot::new(dec!(1000), dec!(0));
        engine.evaluate(&sample(100.0), &account).unwrap();
        engine.evaluate(&sample(100.0), &account).unwrap();
        let report = engine.evaluate(&sample(97.0), &account).unwrap();

        // deviation = (97 - 98.5) / 98.5, volatility factor = 1 - |deviation| * 10 ~ 0.8477
        assert_eq!(
            report.decision,
            CycleDecision::Buy {
                usd_amount: dec!(84.77)
            }
        );
        assert!(report.status_line("ETH-USD").unwrap().starts_with("ETH-USD Price: 97.0000"));
    }

    #[test]
    fn exposure_cap_blocks_buy_regardless_of_history() {
        let mut engine = new_engine(3);
        // asset value 50 * 0.5 = 25 at price 50: equity 100, cap 25
        let account = AccountSnapshot::new(dec!(75), dec!(0.5));
        engine.evaluate(&sample(51.5), &account).unwrap();
        engine.evaluate(&sample(51.5), &account).unwrap();
        let report = engine.evaluate(&sample(50.0), &account).unwrap();
        assert_eq!(report.signal.unwrap().signal, Some(Signal::Buy));
        assert_eq!(
            report.decision,
            CycleDecision::BuyBlocked {
                reason: RejectReason::ExposureCap
            }
        );
    }

    #[test]
    fn small_account_skips_orders_below_minimum() {
        let mut config = Config::default();
        config.trading.ema_window = 3;
        config.trading.min_order_usd = 10.0;
        let mut engine = AssetEngine::from_config(&config).unwrap();

        // equity 20 sizes roughly $1.70, below the $10 minimum
        let account = AccountSnapshot::new(dec!(20), dec!(0));
        engine.evaluate(&sample(10.0), &account).unwrap();
        engine.evaluate(&sample(10.0), &account).unwrap();
        let report = engine.evaluate(&sample(9.7), &account).unwrap();
        assert!(matches!(report.decision, CycleDecision::BuySkipped { .. }));
    }

    #[test]
    fn rise_sells_whole_position_or_reports_nothing_to_sell() {
        let mut engine = new_engine(3);
        let holding = AccountSnapshot::new(dec!(100), dec!(0.25));
        engine.evaluate(&sample(100.0), &holding).unwrap();
        engine.evaluate(&sample(100.0), &holding).unwrap();
        let report = engine.evaluate(&sample(103.0), &holding).unwrap();
        assert_eq!(
            report.decision,
            CycleDecision::Sell {
                asset_amount: dec!(0.25)
            }
        );

        let mut engine = new_engine(3);
        let flat = AccountSnapshot::new(dec!(100), dec!(0));
        engine.evaluate(&sample(100.0), &flat).unwrap();
        engine.evaluate(&sample(100.0), &flat).unwrap();
        let report = engine.evaluate(&sample(103.0), &flat).unwrap();
        assert_eq!(report.decision, CycleDecision::NothingToSell);
    }

    #[test]
    fn recorded_buy_starts_cooldown() {
        let mut engine = new_engine(3);
        let account = AccountSnapshot::new(dec!(1000), dec!(0));
        engine.evaluate(&sample(100.0), &account).unwrap();
        engine.evaluate(&sample(100.0), &account).unwrap();
        let first = engine.evaluate(&sample(97.0), &account).unwrap();
        assert!(matches!(first.decision, CycleDecision::Buy { .. }));
        engine.record_buy(97.0, first.sample.timestamp);

        let second = engine.evaluate(&sample(95.0), &account).unwrap();
        assert_eq!(
            second.decision,
            CycleDecision::BuyBlocked {
                reason: RejectReason::Cooldown
            }
        );
    }

    #[test]
    fn favorable_move_after_cooldown() {
        let mut engine = new_engine(3);
        let account = AccountSnapshot::new(dec!(1000), dec!(0));
        engine.record_buy(100.0, Utc::now() - TimeDelta::minutes(5));

        engine.evaluate(&sample(100.0), &account).unwrap();
        engine.evaluate(&sample(100.0), &account).unwrap();
        // 3% below the last buy clears the 1% required drop at equity 1000
        let report = engine.evaluate(&sample(97.0), &account).unwrap();
        assert!(matches!(report.decision, CycleDecision::Buy { .. }));
    }

    #[test]
    fn sell_outcome_feeds_counters_once() {
        let mut engine = new_engine(3);
        engine.record_buy(97.0, Utc::now());

        let outcome = engine.record_sell(101.0).unwrap();
        assert_eq!(outcome.to_string(), "WIN +$4.00 | Total: 1W / 0L");
        assert_eq!(engine.memory().last_buy_price(), None);

        assert!(engine.record_sell(105.0).is_none());
        assert_eq!(engine.counters().total_wins, 1);

        let summary = engine.performance_summary(&AccountSnapshot::new(dec!(50), dec!(0)), 101.0);
        assert_eq!(summary.total_wins, 1);
        assert!((summary.win_rate_pct - 100.0).abs() < 1e-9);
    }
}
