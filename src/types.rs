//! Core types and constants

use chrono::{DateTime, Utc};

/// Timestamp type used throughout the library
pub type Timestamp = DateTime<Utc>;

/// Price type (per-share, in account currency)
pub type Price = f64;

/// Quantity/share-count type (integral by convention)
pub type Quantity = f64;

/// Money/cash type
pub type Cash = f64;

/// Unique identifier for orders
pub type OrderId = uuid::Uuid;

/// Unique identifier for tradable instruments
pub type InstrumentId = u64;

/// Unique identifier for account holders
pub type UserId = u64;
