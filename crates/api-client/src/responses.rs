//! Wire types for the Coinbase REST APIs.

use core_types::{OpenOrder, OrderSide, OrderStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `GET /v2/prices/{product}/spot`
#[derive(Debug, Clone, Deserialize)]
pub struct SpotPriceResponse {
    pub data: SpotPrice,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotPrice {
    pub amount: Decimal,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub currency: String,
}

/// `GET /api/v3/brokerage/accounts`
#[derive(Debug, Clone, Deserialize)]
pub struct AccountsResponse {
    pub accounts: Vec<Account>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub currency: String,
    pub available_balance: Balance,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Balance {
    pub value: Decimal,
    pub currency: String,
}

/// `GET /api/v3/brokerage/orders/historical/batch`
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderEntry {
    pub order_id: String,
    pub product_id: String,
    pub side: OrderSide,
    pub status: OrderStatus,
}

impl From<OrderEntry> for OpenOrder {
    fn from(entry: OrderEntry) -> Self {
        OpenOrder {
            order_id: entry.order_id,
            product_id: entry.product_id,
            side: entry.side,
            status: entry.status,
        }
    }
}

/// Body of `POST /api/v3/brokerage/orders` for an immediate-or-cancel market order.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    pub client_order_id: String,
    pub product_id: String,
    pub side: OrderSide,
    pub order_configuration: OrderConfiguration,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderConfiguration {
    pub market_market_ioc: MarketIoc,
}

/// Buys are sized in quote currency, sells in base currency.
#[derive(Debug, Clone, Serialize)]
pub struct MarketIoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_size: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_size: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderResponse {
    pub success: bool,
    #[serde(default)]
    pub success_response: Option<OrderSuccess>,
    #[serde(default)]
    pub error_response: Option<OrderFailure>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderSuccess {
    pub order_id: String,
    #[serde(default)]
    pub client_order_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFailure {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error_details: String,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}
