use crate::enums::{OrderSide, OrderStatus};
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// A single observation of the traded asset's price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl PriceSample {
    /// Creates a sample, rejecting prices the signal math cannot divide by.
    pub fn new(price: f64, timestamp: DateTime<Utc>) -> Result<Self, CoreError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(CoreError::InvalidInput(
                "price".to_string(),
                format!("{price} is not a positive finite number"),
            ));
        }
        Ok(Self { price, timestamp })
    }

    /// Converts an exchange quote into a sample.
    pub fn from_decimal(price: Decimal, timestamp: DateTime<Utc>) -> Result<Self, CoreError> {
        let price_f64 = price.to_f64().ok_or_else(|| {
            CoreError::InvalidInput("price".to_string(), format!("{price} does not fit in f64"))
        })?;
        Self::new(price_f64, timestamp)
    }
}

/// Cash and asset holdings at the start of a decision cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Quote currency (USD) available for buying.
    pub cash_balance: Decimal,
    /// Units of the traded asset held.
    pub asset_balance: Decimal,
}

impl AccountSnapshot {
    pub fn new(cash_balance: Decimal, asset_balance: Decimal) -> Self {
        Self {
            cash_balance,
            asset_balance,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash_balance.to_f64().unwrap_or(0.0)
    }

    pub fn asset(&self) -> f64 {
        self.asset_balance.to_f64().unwrap_or(0.0)
    }

    /// USD value of the asset holdings at `price`.
    pub fn asset_value(&self, price: f64) -> f64 {
        self.asset() * price
    }

    /// Cash plus marked-to-market asset holdings.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash() + self.asset_value(price)
    }

    /// Share of equity held in the asset, in [0, 1]. Zero when equity is not positive.
    pub fn exposure_fraction(&self, price: f64) -> f64 {
        let equity = self.equity(price);
        if equity > 0.0 {
            self.asset_value(price) / equity
        } else {
            0.0
        }
    }

    pub fn holds_asset(&self) -> bool {
        self.asset_balance > Decimal::ZERO
    }
}

/// An order known to the exchange for the traded product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub order_id: String,
    pub product_id: String,
    pub side: OrderSide,
    pub status: OrderStatus,
}
