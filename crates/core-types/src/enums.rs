use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Lifecycle state of an order as reported by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,
    Pending,
    PartiallyFilled,
    Filled,
    Cancelled,
    Expired,
    Failed,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// True while the exchange may still fill (part of) the order.
    /// The trading loop refuses to act while any such order exists.
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            OrderStatus::Open | OrderStatus::Pending | OrderStatus::PartiallyFilled
        )
    }
}

/// The raw directional output of the signal engine, before any risk checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
}
