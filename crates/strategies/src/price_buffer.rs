use core_types::PriceSample;
use std::collections::VecDeque;

/// Fixed-capacity window of the most recent prices, oldest first.
#[derive(Debug, Clone)]
pub struct PriceBuffer {
    samples: VecDeque<PriceSample>,
    capacity: usize,
}

impl PriceBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Appends a sample, evicting the oldest once the window is over capacity.
    pub fn push(&mut self, sample: PriceSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Prices in arrival order.
    pub fn prices(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.price).collect()
    }

    pub fn latest(&self) -> Option<&PriceSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(price: f64) -> PriceSample {
        PriceSample::new(price, Utc::now()).unwrap()
    }

    #[test]
    fn evicts_oldest_first() {
        let mut buffer = PriceBuffer::new(3);
        for p in [1.0, 2.0, 3.0, 4.0, 5.0] {
            buffer.push(sample(p));
        }
        assert_eq!(buffer.len(), 3);
        assert!(buffer.is_full());
        assert_eq!(buffer.prices(), vec![3.0, 4.0, 5.0]);
        assert_eq!(buffer.latest().map(|s| s.price), Some(5.0));
    }

    #[test]
    fn fills_up_before_reporting_full() {
        let mut buffer = PriceBuffer::new(2);
        assert!(buffer.is_empty());
        buffer.push(sample(10.0));
        assert!(!buffer.is_full());
        buffer.push(sample(11.0));
        assert!(buffer.is_full());
    }
}
