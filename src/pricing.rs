//! Execution-price and share-count resolution for incoming orders

use crate::error::{Result, TradeError};
use crate::order::{OrderSizing, OrderType};
use crate::types::{Price, Quantity};

/// Resolved execution terms for a candidate order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Execution {
    /// Price the order will execute at
    pub price: Price,
    /// Whole number of shares the order is for
    pub size: Quantity,
}

/// Resolve execution price and share count from the requested terms
///
/// Market orders execute at the current market price; limit orders at the
/// caller's limit price. A notional request converts to whole shares by
/// truncation, so the spent amount never exceeds what was asked for.
pub fn resolve_execution(
    order_type: OrderType,
    market_price: Price,
    sizing: OrderSizing,
    limit_price: Option<Price>,
) -> Result<Execution> {
    let price = match order_type {
        OrderType::Market => market_price,
        OrderType::Limit => limit_price.ok_or_else(|| {
            TradeError::InvalidOrder("limit order requires a limit price".into())
        })?,
    };

    let size = match sizing {
        OrderSizing::Shares(shares) => {
            if shares.fract() != 0.0 {
                return Err(TradeError::InvalidOrder(format!(
                    "share count must be a whole number, got {}",
                    shares
                )));
            }
            shares
        }
        OrderSizing::Notional(amount) => {
            if price <= 0.0 {
                return Err(TradeError::InvalidOrder(
                    "cannot size a notional order without a tradable price".into(),
                ));
            }
            (amount / price).floor()
        }
    };

    if size <= 0.0 {
        return Err(TradeError::InvalidOrder(format!(
            "order resolves to {} shares",
            size
        )));
    }

    Ok(Execution { price, size })
}
