//! Tradable instruments and the in-memory instrument catalog

use crate::types::InstrumentId;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tradable instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Unique instrument identifier
    pub id: InstrumentId,
    /// Ticker symbol (e.g. "AAPL")
    pub symbol: String,
    /// Human-readable name
    pub name: String,
}

impl Instrument {
    /// Create a new instrument
    pub fn new(id: InstrumentId, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.id)
    }
}

/// In-memory instrument registry
#[derive(Debug, Clone, Default)]
pub struct InstrumentCatalog {
    instruments: HashMap<InstrumentId, Instrument>,
}

impl InstrumentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instrument, replacing any previous entry with the same id
    pub fn register(&mut self, instrument: Instrument) {
        self.instruments.insert(instrument.id, instrument);
    }

    /// Get an instrument by id
    pub fn get(&self, id: InstrumentId) -> Option<&Instrument> {
        self.instruments.get(&id)
    }

    /// Check whether an instrument is registered
    pub fn exists(&self, id: InstrumentId) -> bool {
        self.instruments.contains_key(&id)
    }

    /// Look up an instrument by exact ticker symbol
    pub fn by_symbol(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.values().find(|i| i.symbol == symbol)
    }

    /// Number of registered instruments
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}
