use configuration::ThresholdParams;
use std::collections::VecDeque;

/// Samples needed before volatility scaling replaces the base rates.
const MIN_SAMPLES_FOR_SCALING: usize = 3;

/// The latest deviation is compared against the fourth-most-recent one.
const DIRECTION_SPAN: usize = 4;

/// Buy and sell triggers for a single cycle, as fractional deviations from the trend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Negative; a deviation at or below it is a buy signal.
    pub buy: f64,
    /// Positive; a deviation at or above it is a sell signal.
    pub sell: f64,
}

/// Short-term drift of the deviation series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Shrinking,
    Flat,
}

/// Bounded rolling window of recent deviations, most recent last.
#[derive(Debug, Clone)]
pub struct DeviationHistory {
    values: VecDeque<f64>,
    capacity: usize,
}

impl DeviationHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Appends a deviation, evicting the oldest past capacity.
    pub fn push(&mut self, deviation: f64) {
        self.values.push_back(deviation);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    /// Mean of the absolute deviations in the window.
    pub fn mean_abs(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().map(|v| v.abs()).sum::<f64>() / self.values.len() as f64
    }

    /// Compares the newest value with the one `DIRECTION_SPAN - 1` places before it.
    pub fn direction(&self) -> Direction {
        let len = self.values.len();
        if len < DIRECTION_SPAN {
            return Direction::Flat;
        }
        let latest = self.values[len - 1];
        let lagged = self.values[len - DIRECTION_SPAN];

        if latest > lagged {
            Direction::Rising
        } else if latest < lagged {
            Direction::Shrinking
        } else {
            Direction::Flat
        }
    }
}

/// Self-tuning buy/sell trigger model.
///
/// Thresholds widen with the average absolute deviation of recent cycles, lean
/// with the short-term direction of the deviation series, and the buy side is
/// weighted by current exposure. Both are clamped into their configured bands.
#[derive(Debug, Clone)]
pub struct ThresholdEngine {
    params: ThresholdParams,
    history: DeviationHistory,
}

impl ThresholdEngine {
    pub fn new(params: ThresholdParams) -> Self {
        let history = DeviationHistory::new(params.history_capacity);
        Self { params, history }
    }

    pub fn base(&self) -> Thresholds {
        Thresholds {
            buy: self.params.base_buy,
            sell: self.params.base_sell,
        }
    }

    pub fn history(&self) -> &DeviationHistory {
        &self.history
    }

    /// Records `deviation` and derives this cycle's thresholds.
    ///
    /// With fewer than three recorded deviations the base rates are returned as-is.
    pub fn update(&mut self, deviation: f64, exposure_fraction: f64) -> Thresholds {
        self.history.push(deviation);

        if self.history.len() < MIN_SAMPLES_FOR_SCALING {
            return self.base();
        }

        let p = &self.params;

        // 1. Volatility scaling
        let avg_abs = self.history.mean_abs();
        let mut buy = p.base_buy * (1.0 + avg_abs * p.buy_multiplier);
        let mut sell = p.base_sell * (1.0 + avg_abs * p.sell_multiplier);

        // 2. Direction: a rising deviation makes selling easier and buying harder.
        match self.history.direction() {
            Direction::Rising => {
                buy *= p.widen_factor;
                sell *= p.tighten_factor;
            }
            Direction::Shrinking => {
                buy *= p.tighten_factor;
                sell *= p.widen_factor;
            }
            Direction::Flat => {}
        }

        // 3. Exposure weighting
        buy *= 1.0 + exposure_fraction;

        // 4. Final clamp
        Thresholds {
            buy: p.buy_clamp.clamp(buy),
            sell: p.sell_clamp.clamp(sell),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use configuration::ClampRange;
    use proptest::prelude::*;

    /// Wide clamps so the unclamped arithmetic is observable.
    fn open_params() -> ThresholdParams {
        ThresholdParams {
            buy_clamp: ClampRange::new(-1.0, 0.0),
            sell_clamp: ClampRange::new(0.0, 1.0),
            ..ThresholdParams::default()
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn bootstrap_returns_base_rates() {
        let mut engine = ThresholdEngine::new(ThresholdParams::default());
        let base = engine.base();
        assert_eq!(engine.update(0.05, 0.9), base);
        assert_eq!(engine.update(-0.05, 0.9), base);
        assert_ne!(engine.update(0.0, 0.9), base);
    }

    #[test]
    fn scales_with_average_absolute_deviation() {
        let mut engine = ThresholdEngine::new(open_params());
        engine.update(0.01, 0.0);
        engine.update(-0.01, 0.0);
        let t = engine.update(0.01, 0.0);

        // Three samples: no direction yet, avg |dev| = 0.01.
        assert!(close(t.buy, -0.0065 * (1.0 + 0.01 * 14.0)));
        assert!(close(t.sell, 0.0075 * (1.0 + 0.01 * 12.0)));
    }

    #[test]
    fn rising_deviation_favours_selling() {
        let mut engine = ThresholdEngine::new(open_params());
        let mut t = engine.base();
        for d in [0.0, 0.0, 0.0, 0.004] {
            t = engine.update(d, 0.0);
        }
        assert_eq!(engine.history().direction(), Direction::Rising);
        let avg = 0.001;
        assert!(close(t.buy, -0.0065 * (1.0 + avg * 14.0) * 1.20));
        assert!(close(t.sell, 0.0075 * (1.0 + avg * 12.0) * 0.80));
    }

    #[test]
    fn shrinking_deviation_favours_buying() {
        let mut engine = ThresholdEngine::new(open_params());
        let mut t = engine.base();
        for d in [0.0, 0.0, 0.0, -0.004] {
            t = engine.update(d, 0.0);
        }
        assert_eq!(engine.history().direction(), Direction::Shrinking);
        let avg = 0.001;
        assert!(close(t.buy, -0.0065 * (1.0 + avg * 14.0) * 0.80));
        assert!(close(t.sell, 0.0075 * (1.0 + avg * 12.0) * 1.20));
    }

    #[test]
    fn direction_needs_four_samples() {
        let mut history = DeviationHistory::new(12);
        for d in [0.0, 0.0, 0.5] {
            history.push(d);
        }
        assert_eq!(history.direction(), Direction::Flat);
        history.push(0.5);
        // Fourth-most-recent is 0.0.
        assert_eq!(history.direction(), Direction::Rising);
    }

    #[test]
    fn exposure_multiplies_buy_side_only() {
        let mut flat = ThresholdEngine::new(open_params());
        let mut exposed = ThresholdEngine::new(open_params());
        let (mut a, mut b) = (flat.base(), exposed.base());
        for d in [0.002, 0.002, 0.002] {
            a = flat.update(d, 0.0);
            b = exposed.update(d, 0.5);
        }
        assert!(close(b.buy, a.buy * 1.5));
        assert_eq!(a.sell, b.sell);
    }

    #[test]
    fn results_are_clamped() {
        let mut engine = ThresholdEngine::new(ThresholdParams::default());
        let mut t = engine.base();
        for _ in 0..5 {
            t = engine.update(0.2, 1.0);
        }
        assert_eq!(t.buy, -0.012);
        assert_eq!(t.sell, 0.014);
    }

    #[test]
    fn history_evicts_oldest() {
        let mut history = DeviationHistory::new(3);
        for d in [0.1, 0.2, 0.3, 0.4] {
            history.push(d);
        }
        let values: Vec<f64> = history.iter().copied().collect();
        assert_eq!(values, vec![0.2, 0.3, 0.4]);
        assert!(!values.contains(&0.1));
    }

    proptest! {
        #[test]
        fn history_never_exceeds_capacity(
            capacity in 1usize..50,
            values in prop::collection::vec(-0.1..0.1_f64, 0..200),
        ) {
            let mut history = DeviationHistory::new(capacity);
            for v in &values {
                history.push(*v);
                prop_assert!(history.len() <= capacity);
            }
            let kept: Vec<f64> = history.iter().copied().collect();
            let start = values.len().saturating_sub(capacity);
            prop_assert_eq!(kept, values[start..].to_vec());
        }

        #[test]
        fn thresholds_stay_in_band(
            deviations in prop::collection::vec(-0.2..0.2_f64, 3..60),
            exposure in 0.0..1.0_f64,
        ) {
            let params = ThresholdParams::default();
            let mut engine = ThresholdEngine::new(params.clone());
            for d in deviations {
                let t = engine.update(d, exposure);
                prop_assert!(params.buy_clamp.contains(t.buy));
                prop_assert!(params.sell_clamp.contains(t.sell));
            }
        }
    }
}
