//! Order record, sides, types and lifecycle states

use crate::error::{Result, TradeError};
use crate::types::{Cash, InstrumentId, OrderId, Price, Quantity, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    /// Buy shares of an instrument
    Buy,
    /// Sell shares of an instrument
    Sell,
    /// Deposit cash into the account
    CashIn,
    /// Withdraw cash from the account
    CashOut,
}

impl OrderSide {
    /// Whether this side trades an instrument (as opposed to moving cash)
    pub fn is_trading(&self) -> bool {
        matches!(self, OrderSide::Buy | OrderSide::Sell)
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Market order - execute at current market price
    Market,
    /// Limit order - execute at caller-specified price
    Limit,
}

/// Order status
///
/// `New` is the only state from which transitions are allowed; the other
/// three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Admitted and pending execution
    New,
    /// Executed
    Filled,
    /// Denied at admission or re-validation
    Rejected,
    /// Cancelled by its owner
    Cancelled,
}

/// Requested order size: exactly one of a share count or a cash amount
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderSizing {
    /// Explicit share count
    Shares(Quantity),
    /// Cash amount to convert into whole shares at the execution price
    Notional(Cash),
}

/// Trading order (persisted source of truth for all derived balances)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier
    pub id: OrderId,
    /// Account holder that placed the order
    pub user_id: UserId,
    /// Instrument traded; `None` for cash movements
    pub instrument_id: Option<InstrumentId>,
    /// Order side
    pub side: OrderSide,
    /// Order type
    pub order_type: OrderType,
    /// Share count, or cash amount for CashIn/CashOut
    pub size: Quantity,
    /// Resolved execution price (1.0 for cash movements, may be 0 for gifts)
    pub price: Price,
    /// Lifecycle state
    pub status: OrderStatus,
    /// Creation timestamp
    pub placed_at: Timestamp,
    /// Last update timestamp
    pub updated_at: Timestamp,
}

impl Order {
    /// Create a new order in the given initial status (`New` or `Rejected`)
    pub fn new(
        user_id: UserId,
        instrument_id: Option<InstrumentId>,
        side: OrderSide,
        order_type: OrderType,
        size: Quantity,
        price: Price,
        status: OrderStatus,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: OrderId::new_v4(),
            user_id,
            instrument_id,
            side,
            order_type,
            size,
            price,
            status,
            placed_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Cash value of the order (size x price)
    pub fn notional(&self) -> Cash {
        self.size * self.price
    }

    /// Check if the order is still pending execution
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::New
    }

    /// Check if the order is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Filled | OrderStatus::Rejected | OrderStatus::Cancelled
        )
    }

    /// Mark the order filled
    pub fn fill(&mut self, timestamp: Timestamp) -> Result<()> {
        self.transition(OrderStatus::Filled, timestamp)
    }

    /// Mark the order rejected
    pub fn reject(&mut self, timestamp: Timestamp) -> Result<()> {
        self.transition(OrderStatus::Rejected, timestamp)
    }

    /// Mark the order cancelled
    pub fn cancel(&mut self, timestamp: Timestamp) -> Result<()> {
        self.transition(OrderStatus::Cancelled, timestamp)
    }

    fn transition(&mut self, next: OrderStatus, timestamp: Timestamp) -> Result<()> {
        if self.is_terminal() {
            return Err(TradeError::InvalidStateTransition {
                status: self.status,
            });
        }
        self.status = next;
        self.updated_at = timestamp;
        Ok(())
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order({:?}, {:?}, user {}, {} @ {}, {:?})",
            self.side, self.order_type, self.user_id, self.size, self.price, self.status
        )
    }
}
