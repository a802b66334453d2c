//! Position ledger - weighted-average-cost replay and valuation
//!
//! A position is never stored: it is recomputed from the instrument's
//! filled order history every time it is needed, with pending sell orders
//! layered on top as share reservations.

use crate::order::{Order, OrderSide, OrderStatus};
use crate::types::{Cash, InstrumentId, Price, Quantity};
use serde::{Deserialize, Serialize};

/// Share-count breakdown for a position
///
/// Invariant: `available = total - reserved` and `reserved >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantityBreakdown {
    /// Shares held (from filled orders)
    pub total: Quantity,
    /// Shares not committed to pending sell orders
    pub available: Quantity,
    /// Shares committed by pending sell orders
    pub reserved: Quantity,
}

/// Derived position in a single instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Instrument this position is in
    pub instrument_id: InstrumentId,
    /// Share counts
    pub quantity: QuantityBreakdown,
    /// Weighted-average cost per share of the holding
    pub average_cost: Price,
    /// Price the position was valued at
    pub current_price: Price,
    /// Market value of the holding at `current_price`
    pub market_value: Cash,
    /// Profit booked by fills of sell orders, against average cost at fill time
    pub realized_gains: Cash,
    /// (realized + market value) / invested, as a percentage
    pub total_return_pct: f64,
}

impl Position {
    /// Whether the position carries any state worth reporting
    pub fn is_empty(&self) -> bool {
        self.quantity.total == 0.0
            && self.quantity.reserved == 0.0
            && self.realized_gains == 0.0
    }
}

/// Compute the position for one instrument from a user's trading orders
///
/// Orders must already be in ascending chronological order: the
/// weighted-average cost depends on replay order. Orders for other
/// instruments (and cash movements) are ignored, so the caller may pass
/// the full order history.
///
/// A filled sell replayed against a non-positive quantity is skipped
/// rather than driving the position negative. Admission makes that
/// unreachable through the engine; it can only appear in imported data.
pub fn position(instrument_id: InstrumentId, orders: &[Order], current_price: Price) -> Position {
    let mut quantity: Quantity = 0.0;
    let mut average_cost: Price = 0.0;
    let mut invested: Cash = 0.0;
    let mut realized_gains: Cash = 0.0;
    let mut reserved: Quantity = 0.0;

    for order in orders {
        if order.instrument_id != Some(instrument_id) {
            continue;
        }
        match (order.status, order.side) {
            (OrderStatus::Filled, OrderSide::Buy) => {
                average_cost = (quantity * average_cost + order.notional())
                    / (quantity + order.size);
                quantity += order.size;
                invested += order.notional();
            }
            (OrderStatus::Filled, OrderSide::Sell) => {
                if quantity <= 0.0 {
                    continue;
                }
                // Average cost is deliberately untouched: selling does not
                // change the basis of the remaining shares.
                realized_gains += (order.price - average_cost) * order.size;
                quantity -= order.size;
            }
            (OrderStatus::New, OrderSide::Sell) => reserved += order.size,
            _ => {}
        }
    }

    let market_value = quantity * current_price;
    let total_return_pct = if invested > 0.0 {
        (realized_gains + market_value) / invested * 100.0
    } else {
        0.0
    };

    Position {
        instrument_id,
        quantity: QuantityBreakdown {
            total: quantity,
            available: quantity - reserved,
            reserved,
        },
        average_cost,
        current_price,
        market_value,
        realized_gains,
        total_return_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderType;
    use approx::assert_relative_eq;
    use chrono::{Duration, Utc};

    fn fills(specs: &[(OrderSide, OrderStatus, f64, f64)]) -> Vec<Order> {
        let start = Utc::now();
        specs
            .iter()
            .enumerate()
            .map(|(i, &(side, status, size, price))| {
                Order::new(
                    1,
                    Some(7),
                    side,
                    OrderType::Market,
                    size,
                    price,
                    status,
                    start + Duration::seconds(i as i64),
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_position() {
        let position = position(7, &[], 100.0);

        assert_eq!(position.quantity.total, 0.0);
        assert_eq!(position.average_cost, 0.0);
        assert_eq!(position.market_value, 0.0);
        assert_eq!(position.total_return_pct, 0.0);
        assert!(position.is_empty());
    }

    #[test]
    fn test_average_cost_is_quantity_weighted() {
        let orders = fills(&[
            (OrderSide::Buy, OrderStatus::Filled, 10.0, 40.0),
            (OrderSide::Buy, OrderStatus::Filled, 10.0, 60.0),
        ]);

        let position = position(7, &orders, 50.0);
        assert_eq!(position.quantity.total, 20.0);
        assert_eq!(position.average_cost, 50.0);
    }

    #[test]
    fn test_sell_books_realized_gains_and_keeps_basis() {
        let orders = fills(&[
            (OrderSide::Buy, OrderStatus::Filled, 10.0, 50.0),
            (OrderSide::Sell, OrderStatus::Filled, 4.0, 70.0),
        ]);

        let position = position(7, &orders, 70.0);
        assert_eq!(position.quantity.total, 6.0);
        assert_eq!(position.average_cost, 50.0);
        assert_eq!(position.realized_gains, 80.0);
    }

    #[test]
    fn test_oversell_is_skipped() {
        let orders = fills(&[
            (OrderSide::Sell, OrderStatus::Filled, 5.0, 70.0),
            (OrderSide::Buy, OrderStatus::Filled, 10.0, 50.0),
        ]);

        let position = position(7, &orders, 70.0);
        assert_eq!(position.quantity.total, 10.0);
        assert_eq!(position.realized_gains, 0.0);
    }

    #[test]
    fn test_pending_sells_reserve_shares() {
        let orders = fills(&[
            (OrderSide::Buy, OrderStatus::Filled, 10.0, 50.0),
            (OrderSide::Sell, OrderStatus::New, 4.0, 60.0),
        ]);

        let position = position(7, &orders, 50.0);
        assert_eq!(position.quantity.total, 10.0);
        assert_eq!(position.quantity.reserved, 4.0);
        assert_eq!(position.quantity.available, 6.0);
    }

    #[test]
    fn test_pending_buys_do_not_add_shares() {
        let orders = fills(&[(OrderSide::Buy, OrderStatus::New, 10.0, 50.0)]);

        let position = position(7, &orders, 50.0);
        assert_eq!(position.quantity.total, 0.0);
        assert_eq!(position.quantity.reserved, 0.0);
    }

    #[test]
    fn test_other_instruments_are_ignored() {
        let mut orders = fills(&[(OrderSide::Buy, OrderStatus::Filled, 10.0, 50.0)]);
        orders[0].instrument_id = Some(99);

        assert!(position(7, &orders, 50.0).is_empty());
    }

    #[test]
    fn test_return_percent_consistency() {
        let orders = fills(&[
            (OrderSide::Buy, OrderStatus::Filled, 10.0, 40.0),
            (OrderSide::Buy, OrderStatus::Filled, 10.0, 60.0),
            (OrderSide::Sell, OrderStatus::Filled, 5.0, 80.0),
        ]);

        let position = position(7, &orders, 55.0);
        let invested = 10.0 * 40.0 + 10.0 * 60.0;
        assert_relative_eq!(
            position.total_return_pct,
            (position.realized_gains + position.market_value) / invested * 100.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_replay_order_is_load_bearing() {
        // Same fills, different order: the basis the sell executes against
        // differs, so realized gains differ.
        let chronological = fills(&[
            (OrderSide::Buy, OrderStatus::Filled, 10.0, 40.0),
            (OrderSide::Sell, OrderStatus::Filled, 5.0, 50.0),
            (OrderSide::Buy, OrderStatus::Filled, 10.0, 60.0),
        ]);
        let shuffled = fills(&[
            (OrderSide::Buy, OrderStatus::Filled, 10.0, 40.0),
            (OrderSide::Buy, OrderStatus::Filled, 10.0, 60.0),
            (OrderSide::Sell, OrderStatus::Filled, 5.0, 50.0),
        ]);

        let a = position(7, &chronological, 50.0);
        let b = position(7, &shuffled, 50.0);
        assert_eq!(a.realized_gains, 50.0); // basis 40
        assert_eq!(b.realized_gains, 0.0); // basis 50
    }
}
