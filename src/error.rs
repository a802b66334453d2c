//! Error types for the trading backend

use crate::order::OrderStatus;
use crate::types::{Cash, InstrumentId, OrderId, Quantity, UserId};
use thiserror::Error;

/// Main error type for trading operations
#[derive(Error, Debug)]
pub enum TradeError {
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Instrument not found: {0}")]
    InstrumentNotFound(InstrumentId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Insufficient funds: required {required:.2}, available {available:.2}")]
    InsufficientFunds { required: Cash, available: Cash },

    #[error("Insufficient shares: requested {requested}, available {available}")]
    InsufficientShares {
        requested: Quantity,
        available: Quantity,
    },

    #[error("Invalid state transition: order is already {status:?}")]
    InvalidStateTransition { status: OrderStatus },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias for trading operations
pub type Result<T> = std::result::Result<T, TradeError>;
