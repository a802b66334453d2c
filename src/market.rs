//! Collaborator seams: market data and account-holder directory
//!
//! The engine consumes prices and existence checks through these traits so
//! that the surrounding service can plug in its own market-data feed and
//! user registry. The reference implementations below back the demo binary
//! and the test suite.

use crate::instrument::{Instrument, InstrumentCatalog};
use crate::types::{InstrumentId, Price, UserId};
use hashbrown::{HashMap, HashSet};
use std::sync::RwLock;

/// Market-data lookup
pub trait MarketData: Send + Sync {
    /// Current market price for an instrument
    ///
    /// `None` (or a zero price) signals that the instrument has no tradable
    /// price right now.
    fn current_price(&self, instrument_id: InstrumentId) -> Option<Price>;

    /// Check whether an instrument exists
    fn instrument_exists(&self, instrument_id: InstrumentId) -> bool;
}

/// Account-holder existence checks
pub trait UserDirectory: Send + Sync {
    /// Check whether a user exists
    fn user_exists(&self, user_id: UserId) -> bool;
}

/// Static market data over an instrument catalog and a quoted-price map
///
/// Prices sit behind a lock so tests and demos can move the market while
/// the engine holds a shared handle.
#[derive(Debug, Default)]
pub struct StaticMarketData {
    catalog: InstrumentCatalog,
    prices: RwLock<HashMap<InstrumentId, Price>>,
}

impl StaticMarketData {
    pub fn new(catalog: InstrumentCatalog) -> Self {
        Self {
            catalog,
            prices: RwLock::new(HashMap::new()),
        }
    }

    /// Register an instrument and its current quote in one step
    pub fn quote(&mut self, instrument: Instrument, price: Price) {
        let id = instrument.id;
        self.catalog.register(instrument);
        self.set_price(id, price);
    }

    /// Update the quoted price for an instrument
    pub fn set_price(&self, instrument_id: InstrumentId, price: Price) {
        self.prices
            .write()
            .expect("price map lock poisoned")
            .insert(instrument_id, price);
    }

    /// The wrapped instrument catalog
    pub fn catalog(&self) -> &InstrumentCatalog {
        &self.catalog
    }
}

impl MarketData for StaticMarketData {
    fn current_price(&self, instrument_id: InstrumentId) -> Option<Price> {
        self.prices
            .read()
            .expect("price map lock poisoned")
            .get(&instrument_id)
            .copied()
    }

    fn instrument_exists(&self, instrument_id: InstrumentId) -> bool {
        self.catalog.exists(instrument_id)
    }
}

/// In-memory user directory
#[derive(Debug, Clone, Default)]
pub struct MemoryUserDirectory {
    users: HashSet<UserId>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from a list of known users
    pub fn with_users(users: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            users: users.into_iter().collect(),
        }
    }

    /// Register a user
    pub fn add_user(&mut self, user_id: UserId) {
        self.users.insert(user_id);
    }
}

impl UserDirectory for MemoryUserDirectory {
    fn user_exists(&self, user_id: UserId) -> bool {
        self.users.contains(&user_id)
    }
}
