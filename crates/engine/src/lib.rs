use crate::error::EngineError;
use alerter::Notifier;
use api_client::{split_product, ApiClient};
use chrono::Utc;
use configuration::{Config, TradingConfig};
use core_types::{AccountSnapshot, PriceSample};
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub mod asset_engine;
pub mod error;

pub use asset_engine::{AssetEngine, CycleDecision, CycleReport};

/// How a single cycle of the live loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Unresolved orders exist on the exchange; nothing was evaluated.
    Paused { unresolved_orders: usize },
    Evaluated(CycleReport),
}

/// The supervising polling loop for one traded asset.
///
/// Each cycle fetches open orders, the spot price and balances, lets the
/// `AssetEngine` decide, and executes at most one order. A failing cycle is logged,
/// announced, and retried after a short backoff.
pub struct LiveEngine {
    trading: TradingConfig,
    base_currency: String,
    base_buy: f64,
    base_sell: f64,
    api_client: Arc<dyn ApiClient>,
    notifier: Notifier,
    asset: AssetEngine,
}

impl LiveEngine {
    pub fn new(
        config: &Config,
        api_client: Arc<dyn ApiClient>,
        notifier: Notifier,
    ) -> Result<Self, EngineError> {
        let (base, _) = split_product(&config.trading.product_id)
            .map_err(|e| EngineError::Configuration(e.to_string()))?;

        Ok(Self {
            trading: config.trading.clone(),
            base_currency: base.to_string(),
            base_buy: config.thresholds.base_buy,
            base_sell: config.thresholds.base_sell,
            api_client,
            notifier,
            asset: AssetEngine::from_config(config)?,
        })
    }

    pub fn asset_engine(&self) -> &AssetEngine {
        &self.asset
    }

    /// Runs cycles until `shutdown` resolves. A cycle in progress always completes.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        self.announce_start();
        tokio::pin!(shutdown);

        loop {
            let delay = match self.run_cycle().await {
                Ok(CycleOutcome::Paused { .. }) => self.trading.open_order_pause_secs,
                Ok(CycleOutcome::Evaluated(_)) => self.trading.poll_interval_secs,
                Err(e) => {
                    tracing::error!(error = %e, "Cycle failed");
                    self.notifier.alert(format!("[ERROR] {e}"));
                    self.trading.error_backoff_secs
                }
            };

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(Duration::from_secs(delay)) => {}
            }
        }

        tracing::info!(product = %self.trading.product_id, "Shutdown requested. Engine stopped.");
        self.notifier
            .log(format!("{} bot stopped.", self.trading.product_id));
    }

    fn announce_start(&self) {
        tracing::info!(
            product = %self.trading.product_id,
            ema_window = self.trading.ema_window,
            base_buy_pct = self.base_buy * 100.0,
            base_sell_pct = self.base_sell * 100.0,
            dry_run = self.trading.dry_run,
            "Starting EMA-variance trading engine"
        );
        self.notifier
            .log(format!("{} bot started successfully.", self.trading.product_id));
    }

    /// Performs one full decision cycle.
    ///
    /// Price and balance fetch failures abort the cycle before any engine state is
    /// touched and are returned to the caller. A failed open-order lookup is
    /// alerted and treated as no open orders. Order failures are handled here.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, EngineError> {
        let product = self.trading.product_id.clone();

        let orders = match self.api_client.fetch_open_orders(&product).await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::warn!(error = %e, "Open order lookup failed. Continuing without it.");
                self.notifier
                    .alert(format!("[ERROR] Failed to fetch open orders: {e}"));
                Vec::new()
            }
        };
        let unresolved_orders = orders.iter().filter(|o| o.status.is_unresolved()).count();
        if unresolved_orders > 0 {
            tracing::info!(unresolved_orders, "Unprocessed orders detected. Pausing.");
            self.notifier
                .log("[WAIT] Unprocessed orders detected. Bot pausing.");
            return Ok(CycleOutcome::Paused { unresolved_orders });
        }

        let spot = self.api_client.fetch_spot_price(&product).await?;
        let sample = PriceSample::from_decimal(spot, Utc::now())?;
        let account = self.api_client.fetch_balances(&product).await?;

        let report = self.asset.evaluate(&sample, &account)?;

        match report.status_line(&product) {
            Some(line) => {
                tracing::info!("{line}");
                self.notifier.log(line);
            }
            None => {
                if let CycleDecision::WarmingUp {
                    collected,
                    required,
                } = report.decision
                {
                    tracing::info!(collected, required, "Collecting data for EMA...");
                }
            }
        }

        self.execute(&report, &account, spot).await;
        Ok(CycleOutcome::Evaluated(report))
    }

    async fn execute(&mut self, report: &CycleReport, account: &AccountSnapshot, spot: Decimal) {
        let product = self.trading.product_id.as_str();
        let price = report.sample.price;

        match &report.decision {
            CycleDecision::WarmingUp { .. } | CycleDecision::Hold => {}
            CycleDecision::BuyBlocked { reason } => {
                tracing::info!(%reason, price, "BUY blocked");
                self.notifier.log(format!("BUY blocked: {reason}"));
            }
            CycleDecision::BuySkipped { usd_amount } => {
                tracing::info!(%usd_amount, min_order_usd = self.trading.min_order_usd, "BUY skipped: size below minimum order");
                self.notifier.log(format!(
                    "BUY skipped: ${usd_amount} is below the ${:.2} minimum order",
                    self.trading.min_order_usd
                ));
            }
            CycleDecision::NothingToSell => {
                tracing::info!(price, "SELL signal without holdings");
                self.notifier
                    .log(format!("[SELL BLOCKED] No {} to sell.", self.base_currency));
            }
            CycleDecision::Buy { usd_amount } => {
                self.notifier
                    .alert(format!("BUY signal triggered at {price}"));

                if self.trading.dry_run {
                    let msg = format!("[DRY RUN] BUY ${usd_amount} of {product} at {price}");
                    tracing::info!("{msg}");
                    self.notifier.log(msg);
                } else {
                    match self.api_client.submit_market_buy(product, *usd_amount).await {
                        Ok(ack) => {
                            tracing::info!(order_id = %ack.order_id, client_order_id = %ack.client_order_id, %usd_amount, "Market buy placed");
                            self.notifier
                                .log(format!("[BUY] ${usd_amount} market buy placed."));
                        }
                        Err(e) => {
                            tracing::error!(error = %e, %usd_amount, "Buy order failed");
                            self.notifier
                                .alert(format!("[ERROR] Buy order failed: {e}"));
                            return;
                        }
                    }
                }
                self.asset.record_buy(price, report.sample.timestamp);
            }
            CycleDecision::Sell { asset_amount } => {
                self.notifier
                    .alert(format!("SELL signal triggered at {price}"));

                if self.trading.dry_run {
                    let msg = format!("[DRY RUN] SELL {asset_amount} {} at {price}", self.base_currency);
                    tracing::info!("{msg}");
                    self.notifier.log(msg);
                } else {
                    match self.api_client.submit_market_sell(product, *asset_amount).await {
                        Ok(ack) => {
                            tracing::info!(order_id = %ack.order_id, client_order_id = %ack.client_order_id, %asset_amount, "Market sell placed");
                            self.notifier.log(format!(
                                "[SELL] {asset_amount} {} market sell placed.",
                                self.base_currency
                            ));
                        }
                        Err(e) => {
                            tracing::error!(error = %e, %asset_amount, "Sell order failed");
                            self.notifier.alert(format!("[SELL ERROR] {e}"));
                            return;
                        }
                    }
                }

                if let Some(outcome) = self.asset.record_sell(price) {
                    self.notifier.alert(outcome.to_string());
                }

                let settled = AccountSnapshot::new(
                    account.cash_balance + *asset_amount * spot,
                    account.asset_balance - *asset_amount,
                );
                let summary = self.asset.performance_summary(&settled, price);
                tracing::info!(
                    equity = summary.equity,
                    win_rate_pct = summary.win_rate_pct,
                    streak = %summary.streak,
                    "Performance update"
                );
                self.notifier.alert(summary.to_string());
            }
        }
    }
}
