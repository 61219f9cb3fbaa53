//! Ordered protection checks a candidate buy must pass.
//!
//! Checks run in a fixed order and the first failure wins: exposure cap, cash
//! buffer, cooldown, then the favorable move since the last buy.

use crate::memory::TradeMemory;
use crate::params::RiskParameters;
use chrono::{DateTime, Utc};
use core_types::AccountSnapshot;
use std::fmt;

/// Why a buy was refused. Rejections are decisions, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    ExposureCap,
    CashBuffer,
    Cooldown,
    InsufficientDrop,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ExposureCap => "exposure cap reached",
            Self::CashBuffer => "buffer protection triggered",
            Self::Cooldown => "cooldown active",
            Self::InsufficientDrop => "variance drop not enough",
        };
        f.write_str(text)
    }
}

/// Market and account state a buy is judged against.
#[derive(Debug, Clone, Copy)]
pub struct BuyContext {
    pub price: f64,
    pub cash_balance: f64,
    pub asset_balance: f64,
    pub now: DateTime<Utc>,
}

impl BuyContext {
    pub fn new(price: f64, account: &AccountSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            price,
            cash_balance: account.cash(),
            asset_balance: account.asset(),
            now,
        }
    }

    pub fn asset_value(&self) -> f64 {
        self.asset_balance * self.price
    }

    pub fn equity(&self) -> f64 {
        self.cash_balance + self.asset_value()
    }
}

/// Runs every check in order against parameters derived from the context's equity.
pub fn can_buy(ctx: &BuyContext, memory: &TradeMemory) -> Result<(), RejectReason> {
    let params = RiskParameters::for_equity(ctx.equity());

    check_exposure(ctx, &params)?;
    check_cash_buffer(ctx, &params)?;
    check_cooldown(ctx, &params, memory)?;
    check_favorable_move(ctx, &params, memory)?;
    Ok(())
}

pub fn check_exposure(ctx: &BuyContext, params: &RiskParameters) -> Result<(), RejectReason> {
    if ctx.asset_value() >= params.exposure_cap {
        return Err(RejectReason::ExposureCap);
    }
    Ok(())
}

/// Uses one unit of the asset at `price` as the cost proxy, not the sized order.
pub fn check_cash_buffer(ctx: &BuyContext, params: &RiskParameters) -> Result<(), RejectReason> {
    if ctx.cash_balance - ctx.price < params.cash_buffer {
        return Err(RejectReason::CashBuffer);
    }
    Ok(())
}

pub fn check_cooldown(
    ctx: &BuyContext,
    params: &RiskParameters,
    memory: &TradeMemory,
) -> Result<(), RejectReason> {
    match memory.elapsed_since_buy(ctx.now) {
        Some(elapsed) if elapsed < params.cooldown => Err(RejectReason::Cooldown),
        _ => Ok(()),
    }
}

/// Skipped when no buy price is on record.
pub fn check_favorable_move(
    ctx: &BuyContext,
    params: &RiskParameters,
    memory: &TradeMemory,
) -> Result<(), RejectReason> {
    let Some(last_price) = memory.last_buy_price() else {
        return Ok(());
    };
    let drop = (last_price - ctx.price) / last_price;
    if drop < params.required_drop {
        return Err(RejectReason::InsufficientDrop);
    }
    Ok(())
}
