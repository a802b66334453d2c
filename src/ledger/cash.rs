//! Cash ledger - total, available and reserved cash from the order history

use crate::order::{Order, OrderSide, OrderStatus};
use crate::types::Cash;
use serde::{Deserialize, Serialize};

/// Derived cash balances for one account
///
/// Invariant: `available = total - reserved` and `reserved >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashBalance {
    /// Settled cash from filled orders
    pub total: Cash,
    /// Cash not committed to pending orders
    pub available: Cash,
    /// Cash committed by pending buy orders
    pub reserved: Cash,
}

impl CashBalance {
    /// An empty balance
    pub fn zero() -> Self {
        Self {
            total: 0.0,
            available: 0.0,
            reserved: 0.0,
        }
    }
}

/// Compute cash balances from a user's orders
///
/// Only Filled orders move `total`; only New buy orders contribute to
/// `reserved`. Rejected and cancelled orders fall out of both, which is
/// what releases a reservation on cancel. Iteration order is irrelevant
/// here (unlike positions): cash deltas commute.
///
/// Trading orders with a zero price move no cash - shares granted for
/// nothing are treated as a gift. Cash movements ignore `price` entirely
/// (always 1:1).
pub fn cash_balance(orders: &[Order]) -> CashBalance {
    let mut total: Cash = 0.0;
    let mut reserved: Cash = 0.0;

    for order in orders {
        match order.status {
            OrderStatus::Filled => match order.side {
                OrderSide::CashIn => total += order.size,
                OrderSide::CashOut => total -= order.size,
                OrderSide::Buy => total -= order.notional(),
                OrderSide::Sell => total += order.notional(),
            },
            OrderStatus::New => {
                if order.side == OrderSide::Buy {
                    reserved += order.notional();
                }
            }
            OrderStatus::Rejected | OrderStatus::Cancelled => {}
        }
    }

    CashBalance {
        total,
        available: total - reserved,
        reserved,
    }
}
