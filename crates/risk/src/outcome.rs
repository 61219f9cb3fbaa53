use crate::error::RiskError;
use crate::memory::TradeMemory;
use configuration::StreakReset;
use core_types::AccountSnapshot;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Win,
    Loss,
}

/// Win/loss tallies. "Recent" counters drive position sizing and are subject to
/// the configured reset policy; totals never reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounters {
    pub recent_wins: u32,
    pub recent_losses: u32,
    pub total_wins: u32,
    pub total_losses: u32,
}

impl OutcomeCounters {
    fn clear_recent(&mut self) {
        self.recent_wins = 0;
        self.recent_losses = 0;
    }
}

/// The evaluated result of one completed round trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeOutcome {
    pub kind: OutcomeKind,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
    pub counters: OutcomeCounters,
}

impl fmt::Display for TradeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OutcomeKind::Win => write!(f, "WIN +${:.2}", self.pnl)?,
            OutcomeKind::Loss => write!(f, "LOSS ${:.2}", self.pnl)?,
        }
        write!(
            f,
            " | Total: {}W / {}L",
            self.counters.total_wins, self.counters.total_losses
        )
    }
}

#[derive(Debug, Clone)]
pub struct OutcomeTracker {
    counters: OutcomeCounters,
    policy: StreakReset,
    trades_since_reset: u32,
}

impl OutcomeTracker {
    pub fn new(policy: StreakReset) -> Result<Self, RiskError> {
        if let StreakReset::Rolling { trades: 0 } = policy {
            return Err(RiskError::InvalidParameters(
                "rolling streak window must be at least one trade".to_string(),
            ));
        }
        Ok(Self {
            counters: OutcomeCounters::default(),
            policy,
            trades_since_reset: 0,
        })
    }

    pub fn counters(&self) -> OutcomeCounters {
        self.counters
    }

    pub fn policy(&self) -> StreakReset {
        self.policy
    }

    /// Scores a sell at `price` against the remembered buy price.
    ///
    /// Returns `None` and changes nothing when no buy price is on record.
    /// Otherwise the buy price is cleared so the same entry is never scored twice.
    pub fn record_sell(&mut self, memory: &mut TradeMemory, price: f64) -> Option<TradeOutcome> {
        let entry_price = memory.last_buy_price()?;
        memory.clear_last_buy_price();

        let pnl = price - entry_price;
        let kind = if pnl > 0.0 {
            OutcomeKind::Win
        } else {
            OutcomeKind::Loss
        };

        self.apply_reset_policy(kind);
        match kind {
            OutcomeKind::Win => {
                self.counters.recent_wins += 1;
                self.counters.total_wins += 1;
            }
            OutcomeKind::Loss => {
                self.counters.recent_losses += 1;
                self.counters.total_losses += 1;
            }
        }

        let outcome = TradeOutcome {
            kind,
            entry_price,
            exit_price: price,
            pnl,
            counters: self.counters,
        };
        tracing::info!(%outcome, entry_price, exit_price = price, "Trade outcome recorded");
        Some(outcome)
    }

    fn apply_reset_policy(&mut self, kind: OutcomeKind) {
        match self.policy {
            StreakReset::Never => {}
            StreakReset::OnReversal => match kind {
                OutcomeKind::Win => self.counters.recent_losses = 0,
                OutcomeKind::Loss => self.counters.recent_wins = 0,
            },
            StreakReset::Rolling { trades } => {
                if self.trades_since_reset >= trades {
                    self.counters.clear_recent();
                    self.trades_since_reset = 0;
                }
                self.trades_since_reset += 1;
            }
        }
    }
}

/// Recent streak label, e.g. `3W`. Recent wins take precedence over recent losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakLabel {
    Wins(u32),
    Losses(u32),
    None,
}

impl StreakLabel {
    fn from_counters(counters: &OutcomeCounters) -> Self {
        if counters.recent_wins > 0 {
            Self::Wins(counters.recent_wins)
        } else if counters.recent_losses > 0 {
            Self::Losses(counters.recent_losses)
        } else {
            Self::None
        }
    }
}

impl fmt::Display for StreakLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wins(n) => write!(f, "{n}W"),
            Self::Losses(n) => write!(f, "{n}L"),
            Self::None => f.write_str("None"),
        }
    }
}

/// Account and track-record snapshot posted after every sell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSummary {
    pub equity: f64,
    pub cash: f64,
    pub asset_value: f64,
    pub exposure_pct: f64,
    pub total_wins: u32,
    pub total_losses: u32,
    pub win_rate_pct: f64,
    pub streak: StreakLabel,
}

impl PerformanceSummary {
    pub fn new(account: &AccountSnapshot, price: f64, counters: &OutcomeCounters) -> Self {
        let total_trades = counters.total_wins + counters.total_losses;
        let win_rate_pct = if total_trades > 0 {
            f64::from(counters.total_wins) / f64::from(total_trades) * 100.0
        } else {
            0.0
        };

        Self {
            equity: account.equity(price),
            cash: account.cash(),
            asset_value: account.asset_value(price),
            exposure_pct: account.exposure_fraction(price) * 100.0,
            total_wins: counters.total_wins,
            total_losses: counters.total_losses,
            win_rate_pct,
            streak: StreakLabel::from_counters(counters),
        }
    }
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📊 **Performance Update**")?;
        writeln!(f, "Equity: ${:.2}", self.equity)?;
        writeln!(f, "USD: ${:.2} | Asset Value: ${:.2}", self.cash, self.asset_value)?;
        writeln!(f, "Exposure: {:.1}%", self.exposure_pct)?;
        writeln!(
            f,
            "Trades: {}W / {}L | Win Rate: {:.1}%",
            self.total_wins, self.total_losses, self.win_rate_pct
        )?;
        write!(f, "Streak: {}", self.streak)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn bought_at(price: f64) -> TradeMemory {
        let mut memory = TradeMemory::new();
        memory.record_buy(price, Utc::now());
        memory
    }

    #[test]
    fn profitable_sell_is_a_win() {
        let mut tracker = OutcomeTracker::new(StreakReset::Never).unwrap();
        let mut memory = bought_at(100.0);

        let outcome = tracker.record_sell(&mut memory, 101.23).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Win);
        assert_eq!(outcome.to_string(), "WIN +$1.23 | Total: 1W / 0L");
        assert_eq!(memory.last_buy_price(), None);
    }

    #[test]
    fn flat_sell_counts_as_loss() {
        let mut tracker = OutcomeTracker::new(StreakReset::Never).unwrap();
        let mut memory = bought_at(100.0);
        let outcome = tracker.record_sell(&mut memory, 100.0).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Loss);

        let mut memory = bought_at(100.0);
        let outcome = tracker.record_sell(&mut memory, 99.5).unwrap();
        assert_eq!(outcome.to_string(), "LOSS $-0.50 | Total: 0W / 2L");
    }

    #[test]
    fn second_sell_without_buy_is_noop() {
        let mut tracker = OutcomeTracker::new(StreakReset::Never).unwrap();
        let mut memory = bought_at(100.0);
        assert!(tracker.record_sell(&mut memory, 110.0).is_some());
        let before = tracker.counters();

        assert!(tracker.record_sell(&mut memory, 120.0).is_none());
        assert_eq!(tracker.counters(), before);
    }

    #[test]
    fn never_policy_keeps_growing() {
        let mut tracker = OutcomeTracker::new(StreakReset::Never).unwrap();
        for exit in [110.0, 90.0, 110.0] {
            tracker.record_sell(&mut bought_at(100.0), exit);
        }
        let c = tracker.counters();
        assert_eq!((c.recent_wins, c.recent_losses), (2, 1));
        assert_eq!((c.total_wins, c.total_losses), (2, 1));
    }

    #[test]
    fn reversal_policy_clears_opposite_streak() {
        let mut tracker = OutcomeTracker::new(StreakReset::OnReversal).unwrap();
        for exit in [110.0, 110.0, 90.0] {
            tracker.record_sell(&mut bought_at(100.0), exit);
        }
        let c = tracker.counters();
        assert_eq!((c.recent_wins, c.recent_losses), (0, 1));
        assert_eq!((c.total_wins, c.total_losses), (2, 1));
    }

    #[test]
    fn rolling_policy_clears_after_window() {
        let mut tracker = OutcomeTracker::new(StreakReset::Rolling { trades: 2 }).unwrap();
        for exit in [110.0, 110.0] {
            tracker.record_sell(&mut bought_at(100.0), exit);
        }
        assert_eq!(tracker.counters().recent_wins, 2);

        tracker.record_sell(&mut bought_at(100.0), 90.0);
        let c = tracker.counters();
        assert_eq!((c.recent_wins, c.recent_losses), (0, 1));
        assert_eq!(c.total_wins, 2);
    }

    #[test]
    fn zero_rolling_window_is_rejected() {
        assert!(OutcomeTracker::new(StreakReset::Rolling { trades: 0 }).is_err());
    }

    #[test]
    fn summary_reports_exposure_and_streak() {
        let account = AccountSnapshot::new(dec!(40.00), dec!(0.05));
        let counters = OutcomeCounters {
            recent_wins: 3,
            recent_losses: 1,
            total_wins: 3,
            total_losses: 1,
        };
        let summary = PerformanceSummary::new(&account, 200.0, &counters);

        assert!((summary.equity - 50.0).abs() < 1e-9);
        assert!((summary.exposure_pct - 20.0).abs() < 1e-9);
        assert!((summary.win_rate_pct - 75.0).abs() < 1e-9);
        assert_eq!(summary.streak, StreakLabel::Wins(3));

        let text = summary.to_string();
        assert!(text.contains("Equity: $50.00"));
        assert!(text.contains("Trades: 3W / 1L | Win Rate: 75.0%"));
        assert!(text.ends_with("Streak: 3W"));
    }

    #[test]
    fn summary_without_trades() {
        let account = AccountSnapshot::new(dec!(0), dec!(0));
        let summary = PerformanceSummary::new(&account, 200.0, &OutcomeCounters::default());
        assert_eq!(summary.win_rate_pct, 0.0);
        assert_eq!(summary.exposure_pct, 0.0);
        assert_eq!(summary.streak.to_string(), "None");
    }

    #[test]
    fn streak_prefers_recent_wins() {
        let streak = |recent_wins, recent_losses| {
            StreakLabel::from_counters(&OutcomeCounters {
                recent_wins,
                recent_losses,
                ..OutcomeCounters::default()
            })
        };
        assert_eq!(streak(1, 3), StreakLabel::Wins(1));
        assert_eq!(streak(2, 2), StreakLabel::Wins(2));
        assert_eq!(streak(0, 2), StreakLabel::Losses(2));
        assert_eq!(streak(0, 0), StreakLabel::None);
    }
}
