//! Pre-trade admission checks against available cash and shares
//!
//! Admission is a read-only decision recomputed from the live order set on
//! every call - there is no cached reservation counter to drift out of
//! sync. The caller owns side effects: a denied trading order becomes a
//! persisted Rejected record, a denied withdrawal becomes an error.

use crate::error::TradeError;
use crate::ledger::{cash_balance, position};
use crate::order::{Order, OrderSide};
use crate::types::{Cash, InstrumentId, Price, Quantity};

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    /// The order fits within available resources
    Admitted,
    /// The order over-commits a resource
    Denied(DenialReason),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Why an order was denied
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DenialReason {
    InsufficientFunds { required: Cash, available: Cash },
    InsufficientShares { requested: Quantity, available: Quantity },
}

impl From<DenialReason> for TradeError {
    fn from(reason: DenialReason) -> Self {
        match reason {
            DenialReason::InsufficientFunds {
                required,
                available,
            } => TradeError::InsufficientFunds {
                required,
                available,
            },
            DenialReason::InsufficientShares {
                requested,
                available,
            } => TradeError::InsufficientShares {
                requested,
                available,
            },
        }
    }
}

/// Decide whether a candidate order fits the user's available resources
///
/// `orders` is the user's current order set. For re-validation of an
/// already-persisted order, the caller must filter that order's id out
/// first so the check does not trip over its own reservation.
pub fn admit(
    orders: &[Order],
    side: OrderSide,
    instrument_id: Option<InstrumentId>,
    size: Quantity,
    price: Price,
) -> Admission {
    match side {
        OrderSide::Buy => {
            let required = size * price;
            let available = cash_balance(orders).available;
            if required <= available {
                Admission::Admitted
            } else {
                Admission::Denied(DenialReason::InsufficientFunds {
                    required,
                    available,
                })
            }
        }
        OrderSide::Sell => {
            let available = instrument_id
                .map(|id| position(id, orders, 0.0).quantity.available)
                .unwrap_or(0.0);
            if size <= available {
                Admission::Admitted
            } else {
                Admission::Denied(DenialReason::InsufficientShares {
                    requested: size,
                    available,
                })
            }
        }
        OrderSide::CashIn => Admission::Admitted,
        OrderSide::CashOut => {
            let available = cash_balance(orders).available;
            if size <= available {
                Admission::Admitted
            } else {
                Admission::Denied(DenialReason::InsufficientFunds {
                    required: size,
                    available,
                })
            }
        }
    }
}
