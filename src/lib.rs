//! # Papertrade
//!
//! Order ledger and portfolio valuation engine for a simulated
//! securities-trading account.
//!
//! Orders are the single source of truth: cash and position balances are
//! never stored, only recomputed from the order history, so pending-order
//! reservations can never drift out of sync with the orders that created
//! them.
//!
//! ## Example
//!
//! ```rust
//! use papertrade::prelude::*;
//! use std::sync::Arc;
//!
//! let mut market = StaticMarketData::default();
//! market.quote(Instrument::new(1, "AAPL", "Apple Inc."), 150.0);
//!
//! let mut engine = TradingEngine::new(
//!     Box::new(MemoryOrderStore::new()),
//!     Arc::new(market),
//!     Arc::new(MemoryUserDirectory::with_users([42])),
//! );
//!
//! engine.create_order(OrderRequest::deposit(42, 10_000.0)).unwrap();
//! let order = engine
//!     .create_order(OrderRequest::market(42, 1, OrderSide::Buy, OrderSizing::Shares(10.0)))
//!     .unwrap();
//! assert_eq!(order.status, OrderStatus::Filled);
//! ```

pub mod admission;
pub mod engine;
pub mod error;
pub mod instrument;
pub mod ledger;
pub mod market;
pub mod order;
pub mod pricing;
pub mod store;
pub mod types;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::admission::{Admission, DenialReason};
    pub use crate::engine::{OrderRequest, Portfolio, TradingEngine};
    pub use crate::error::{Result, TradeError};
    pub use crate::instrument::{Instrument, InstrumentCatalog};
    pub use crate::ledger::{CashBalance, Position};
    pub use crate::market::{MarketData, MemoryUserDirectory, StaticMarketData, UserDirectory};
    pub use crate::order::{Order, OrderSide, OrderSizing, OrderStatus, OrderType};
    pub use crate::store::{MemoryOrderStore, OrderStore};
    #[cfg(feature = "sqlite-store")]
    pub use crate::store::SqliteOrderStore;
    pub use crate::types::*;
}
