use crate::auth::JwtSigner;
use async_trait::async_trait;
use configuration::ExchangeConfig;
use core_types::{AccountSnapshot, OpenOrder, OrderSide};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use uuid::Uuid;

mod auth;
pub mod error;
pub mod responses;

// --- Public API ---
pub use error::ApiError;
pub use responses::{
    AccountsResponse, ApiErrorResponse, CreateOrderRequest, CreateOrderResponse, OrdersResponse,
    SpotPriceResponse,
};

const ACCOUNTS_PATH: &str = "/api/v3/brokerage/accounts";
const ORDERS_PATH: &str = "/api/v3/brokerage/orders";
const ORDERS_BATCH_PATH: &str = "/api/v3/brokerage/orders/historical/batch";

/// Exchange acknowledgement of a submitted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    pub order_id: String,
    pub client_order_id: String,
}

/// The exchange as seen by the trading loop.
///
/// The live engine only talks to this trait, so tests and dry runs can swap the
/// implementation out.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Current spot price of the product, in quote currency.
    async fn fetch_spot_price(&self, product_id: &str) -> Result<Decimal, ApiError>;

    /// Available quote (cash) and base (asset) balances. (Authenticated)
    async fn fetch_balances(&self, product_id: &str) -> Result<AccountSnapshot, ApiError>;

    /// Orders the exchange reports for the product. (Authenticated)
    async fn fetch_open_orders(&self, product_id: &str) -> Result<Vec<OpenOrder>, ApiError>;

    /// Market buy spending `quote_size` of the quote currency. (Authenticated)
    async fn submit_market_buy(
        &self,
        product_id: &str,
        quote_size: Decimal,
    ) -> Result<OrderAck, ApiError>;

    /// Market sell of `base_size` units of the asset. (Authenticated)
    async fn submit_market_sell(
        &self,
        product_id: &str,
        base_size: Decimal,
    ) -> Result<OrderAck, ApiError>;
}

/// Splits `ETH-USD` into `("ETH", "USD")`.
pub fn split_product(product_id: &str) -> Result<(&str, &str), ApiError> {
    match product_id.split_once('-') {
        Some((base, quote)) if !base.is_empty() && !quote.is_empty() => Ok((base, quote)),
        _ => Err(ApiError::InvalidData(format!(
            "product id '{product_id}' is not of the form BASE-QUOTE"
        ))),
    }
}

/// Coinbase Advanced Trade client authenticated with a CDP API key.
#[derive(Clone)]
pub struct CoinbaseClient {
    client: reqwest::Client,
    api_url: String,
    api_host: String,
    price_url: String,
    signer: Option<JwtSigner>,
    stub_balances: Option<(Decimal, Decimal)>,
}

impl CoinbaseClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        let api_url = config.api_url.trim_end_matches('/').to_string();
        let api_host = reqwest::Url::parse(&api_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .ok_or_else(|| ApiError::InvalidData(format!("invalid api_url '{api_url}'")))?;

        // Without credentials only public and stubbed endpoints work.
        let signer = if config.api_key.is_empty() || config.api_secret.is_empty() {
            None
        } else {
            Some(JwtSigner::new(&config.api_key, &config.api_secret)?)
        };

        Ok(Self {
            client,
            api_url,
            api_host,
            price_url: config.price_url.trim_end_matches('/').to_string(),
            signer,
            stub_balances: config.stub_balances(),
        })
    }

    async fn _send_signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<String>,
    ) -> Result<T, ApiError> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            ApiError::Signing("exchange api_key and api_secret are not configured".to_string())
        })?;
        let token = signer.token(
            method.as_str(),
            &self.api_host,
            path,
            chrono::Utc::now().timestamp(),
        )?;

        let url = format!("{}{}", self.api_url, path);
        let body = body.unwrap_or_default();
        let mut request = self
            .client
            .request(method, &url)
            .query(query)
            .bearer_auth(token);
        if !body.is_empty() {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        Self::_read_response(request.send().await?).await
    }

    async fn _read_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
        } else {
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .map(|err| format!("{}: {}", err.error, err.message))
                .unwrap_or(text);
            Err(ApiError::ApiError {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn _submit_order(
        &self,
        product_id: &str,
        side: OrderSide,
        quote_size: Option<Decimal>,
        base_size: Option<Decimal>,
    ) -> Result<OrderAck, ApiError> {
        let client_order_id = Uuid::new_v4().to_string();
        let order = CreateOrderRequest {
            client_order_id: client_order_id.clone(),
            product_id: product_id.to_string(),
            side,
            order_configuration: responses::OrderConfiguration {
                market_market_ioc: responses::MarketIoc {
                    quote_size,
                    base_size,
                },
            },
        };
        let body =
            serde_json::to_string(&order).map_err(|e| ApiError::InvalidData(e.to_string()))?;

        tracing::debug!(%client_order_id, ?side, product_id, "Submitting market order");
        let response: CreateOrderResponse = self
            ._send_signed(Method::POST, ORDERS_PATH, &[], Some(body))
            .await?;

        match response {
            CreateOrderResponse {
                success: true,
                success_response: Some(ok),
                ..
            } => Ok(OrderAck {
                order_id: ok.order_id,
                client_order_id,
            }),
            CreateOrderResponse {
                error_response,
                failure_reason,
                ..
            } => {
                let failure = error_response.unwrap_or_default();
                let reason = [failure.error, failure.message, failure.error_details]
                    .into_iter()
                    .chain(failure_reason)
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(": ");
                Err(ApiError::OrderRejected(if reason.is_empty() {
                    "no reason given".to_string()
                } else {
                    reason
                }))
            }
        }
    }
}

#[async_trait]
impl ApiClient for CoinbaseClient {
    async fn fetch_spot_price(&self, product_id: &str) -> Result<Decimal, ApiError> {
        let url = format!("{}/v2/prices/{}/spot", self.price_url, product_id);
        let response = self.client.get(&url).send().await?;
        let spot: SpotPriceResponse = Self::_read_response(response).await?;

        if spot.data.amount <= Decimal::ZERO {
            return Err(ApiError::InvalidData(format!(
                "non-positive spot price {} for {product_id}",
                spot.data.amount
            )));
        }
        Ok(spot.data.amount)
    }

    async fn fetch_balances(&self, product_id: &str) -> Result<AccountSnapshot, ApiError> {
        if let Some((cash, asset)) = self.stub_balances {
            return Ok(AccountSnapshot::new(cash, asset));
        }

        let (base, quote) = split_product(product_id)?;
        let response: AccountsResponse = self
            ._send_signed(Method::GET, ACCOUNTS_PATH, &[], None)
            .await?;

        let available = |currency: &str| {
            response
                .accounts
                .iter()
                .filter(|account| account.currency == currency)
                .map(|account| account.available_balance.value)
                .sum::<Decimal>()
        };

        Ok(AccountSnapshot::new(available(quote), available(base)))
    }

    async fn fetch_open_orders(&self, product_id: &str) -> Result<Vec<OpenOrder>, ApiError> {
        let response: OrdersResponse = self
            ._send_signed(
                Method::GET,
                ORDERS_BATCH_PATH,
                &[("product_id", product_id)],
                None,
            )
            .await?;

        Ok(response.orders.into_iter().map(OpenOrder::from).collect())
    }

    async fn submit_market_buy(
        &self,
        product_id: &str,
        quote_size: Decimal,
    ) -> Result<OrderAck, ApiError> {
        self._submit_order(product_id, OrderSide::Buy, Some(quote_size), None)
            .await
    }

    async fn submit_market_sell(
        &self,
        product_id: &str,
        base_size: Decimal,
    ) -> Result<OrderAck, ApiError> {
        self._submit_order(product_id, OrderSide::Sell, None, Some(base_size))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn splits_product_ids() {
        assert_eq!(split_product("ETH-USD").unwrap(), ("ETH", "USD"));
        assert!(split_product("ETHUSD").is_err());
        assert!(split_product("-USD").is_err());
    }

    #[tokio::test]
    async fn stub_balances_skip_the_network() {
        let config = ExchangeConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            stub_cash_balance: Some(dec!(50.00)),
            stub_asset_balance: Some(dec!(0.05)),
            ..ExchangeConfig::default()
        };
        let client = CoinbaseClient::new(&config).unwrap();

        let account = client.fetch_balances("ETH-USD").await.unwrap();
        assert_eq!(account.cash_balance, dec!(50.00));
        assert_eq!(account.asset_balance, dec!(0.05));
    }

    #[tokio::test]
    async fn private_calls_without_credentials_fail_before_sending() {
        let config = ExchangeConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            ..ExchangeConfig::default()
        };
        let client = CoinbaseClient::new(&config).unwrap();

        let err = client.fetch_open_orders("ETH-USD").await.unwrap_err();
        assert!(matches!(err, ApiError::Signing(_)));
    }

    #[test]
    fn rejects_unparseable_api_url() {
        let config = ExchangeConfig {
            api_url: "not a url".to_string(),
            ..ExchangeConfig::default()
        };
        assert!(matches!(
            CoinbaseClient::new(&config).err(),
            Some(ApiError::InvalidData(_))
        ));
    }
}
