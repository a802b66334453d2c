//! Derived ledgers - cash and position balances recomputed from the order set
//!
//! Nothing in this module is persisted or cached: every balance is a pure
//! view over the live set of orders, so pending-order reservations appear
//! and disappear purely by orders changing status.

pub mod cash;
pub mod position;

pub use cash::{cash_balance, CashBalance};
pub use position::{position, Position, QuantityBreakdown};
