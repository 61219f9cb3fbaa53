use chrono::{DateTime, TimeDelta, Utc};

/// What the risk checks remember about the most recent buy of one asset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TradeMemory {
    last_buy_at: Option<DateTime<Utc>>,
    last_buy_price: Option<f64>,
}

impl TradeMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a confirmed buy.
    pub fn record_buy(&mut self, price: f64, at: DateTime<Utc>) {
        self.last_buy_at = Some(at);
        self.last_buy_price = Some(price);
    }

    pub fn last_buy_at(&self) -> Option<DateTime<Utc>> {
        self.last_buy_at
    }

    pub fn last_buy_price(&self) -> Option<f64> {
        self.last_buy_price
    }

    /// Forgets the entry price once a sell has been evaluated.
    /// The buy time is kept so the cooldown still applies.
    pub fn clear_last_buy_price(&mut self) {
        self.last_buy_price = None;
    }

    /// Time since the last buy, or `None` if nothing was bought yet.
    pub fn elapsed_since_buy(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.last_buy_at.map(|at| now - at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clearing_price_keeps_buy_time() {
        let at = Utc::now();
        let mut memory = TradeMemory::new();
        assert_eq!(memory.elapsed_since_buy(at), None);

        memory.record_buy(2_000.0, at);
        assert_eq!(memory.last_buy_price(), Some(2_000.0));

        memory.clear_last_buy_price();
        assert_eq!(memory.last_buy_price(), None);
        assert_eq!(
            memory.elapsed_since_buy(at + TimeDelta::seconds(30)),
            Some(TimeDelta::seconds(30))
        );
    }
}
