//! SQLite-backed order store

use crate::error::{Result, TradeError};
use crate::order::{Order, OrderSide, OrderStatus, OrderType};
use crate::store::OrderStore;
use crate::types::{OrderId, Timestamp, UserId};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// Order store with SQLite backend
pub struct SqliteOrderStore {
    conn: Connection,
}

impl SqliteOrderStore {
    /// Create or open database at path
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .map_err(|e| TradeError::Storage(format!("Failed to open database: {}", e)))?;

        let store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    /// Create in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            TradeError::Storage(format!("Failed to create in-memory database: {}", e))
        })?;

        let store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS orders (
                    id BLOB PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    instrument_id INTEGER,
                    side INTEGER NOT NULL,
                    order_type INTEGER NOT NULL,
                    size REAL NOT NULL,
                    price REAL NOT NULL,
                    status INTEGER NOT NULL,
                    placed_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )",
                [],
            )
            .map_err(|e| TradeError::Storage(format!("Failed to create orders table: {}", e)))?;

        self.conn
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id)",
                [],
            )
            .map_err(|e| TradeError::Storage(format!("Failed to create user index: {}", e)))?;

        self.conn
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status)",
                [],
            )
            .map_err(|e| TradeError::Storage(format!("Failed to create status index: {}", e)))?;

        Ok(())
    }

    fn side_to_int(side: OrderSide) -> i64 {
        match side {
            OrderSide::Buy => 0,
            OrderSide::Sell => 1,
            OrderSide::CashIn => 2,
            OrderSide::CashOut => 3,
        }
    }

    fn int_to_side(value: i64) -> Option<OrderSide> {
        match value {
            0 => Some(OrderSide::Buy),
            1 => Some(OrderSide::Sell),
            2 => Some(OrderSide::CashIn),
            3 => Some(OrderSide::CashOut),
            _ => None,
        }
    }

    fn type_to_int(order_type: OrderType) -> i64 {
        match order_type {
            OrderType::Market => 0,
            OrderType::Limit => 1,
        }
    }

    fn int_to_type(value: i64) -> Option<OrderType> {
        match value {
            0 => Some(OrderType::Market),
            1 => Some(OrderType::Limit),
            _ => None,
        }
    }

    fn status_to_int(status: OrderStatus) -> i64 {
        match status {
            OrderStatus::New => 0,
            OrderStatus::Filled => 1,
            OrderStatus::Rejected => 2,
            OrderStatus::Cancelled => 3,
        }
    }

    fn int_to_status(value: i64) -> Option<OrderStatus> {
        match value {
            0 => Some(OrderStatus::New),
            1 => Some(OrderStatus::Filled),
            2 => Some(OrderStatus::Rejected),
            3 => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    fn row_to_order(row: &Row<'_>) -> rusqlite::Result<Order> {
        let decode = |col: usize, what: &str| {
            rusqlite::Error::FromSqlConversionFailure(
                col,
                Type::Integer,
                format!("unknown {} code", what).into(),
            )
        };

        Ok(Order {
            id: row.get::<_, OrderId>(0)?,
            user_id: row.get::<_, i64>(1)? as UserId,
            instrument_id: row.get::<_, Option<i64>>(2)?.map(|v| v as u64),
            side: Self::int_to_side(row.get(3)?).ok_or_else(|| decode(3, "side"))?,
            order_type: Self::int_to_type(row.get(4)?).ok_or_else(|| decode(4, "order type"))?,
            size: row.get(5)?,
            price: row.get(6)?,
            status: Self::int_to_status(row.get(7)?).ok_or_else(|| decode(7, "status"))?,
            placed_at: row.get::<_, Timestamp>(8)?,
            updated_at: row.get::<_, Timestamp>(9)?,
        })
    }

    const SELECT: &'static str = "SELECT id, user_id, instrument_id, side, order_type, \
         size, price, status, placed_at, updated_at FROM orders";

    fn query_orders<P: rusqlite::Params>(&self, query: &str, params: P) -> Result<Vec<Order>> {
        let mut stmt = self
            .conn
            .prepare(query)
            .map_err(|e| TradeError::Storage(format!("Failed to prepare query: {}", e)))?;

        let orders = stmt
            .query_map(params, Self::row_to_order)
            .map_err(|e| TradeError::Storage(format!("Failed to query orders: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TradeError::Storage(format!("Failed to read orders: {}", e)))?;

        Ok(orders)
    }
}

impl OrderStore for SqliteOrderStore {
    fn save(&mut self, order: &Order) -> Result<()> {
        // Upsert keeps the original rowid, preserving insertion order for
        // the timestamp tiebreak below
        self.conn
            .execute(
                "INSERT INTO orders (id, user_id, instrument_id, side, order_type, \
                 size, price, status, placed_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET
                    size = excluded.size,
                    price = excluded.price,
                    status = excluded.status,
                    updated_at = excluded.updated_at",
                params![
                    order.id,
                    order.user_id as i64,
                    order.instrument_id.map(|v| v as i64),
                    Self::side_to_int(order.side),
                    Self::type_to_int(order.order_type),
                    order.size,
                    order.price,
                    Self::status_to_int(order.status),
                    order.placed_at,
                    order.updated_at,
                ],
            )
            .map_err(|e| TradeError::Storage(format!("Failed to save order: {}", e)))?;

        Ok(())
    }

    fn order(&self, id: OrderId) -> Result<Option<Order>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?1", Self::SELECT),
                params![id],
                Self::row_to_order,
            )
            .optional()
            .map_err(|e| TradeError::Storage(format!("Failed to get order: {}", e)))
    }

    fn orders_for_user(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        match status {
            Some(status) => self.query_orders(
                &format!(
                    "{} WHERE user_id = ?1 AND status = ?2 ORDER BY placed_at, rowid",
                    Self::SELECT
                ),
                params![user_id as i64, Self::status_to_int(status)],
            ),
            None => self.query_orders(
                &format!(
                    "{} WHERE user_id = ?1 ORDER BY placed_at, rowid",
                    Self::SELECT
                ),
                params![user_id as i64],
            ),
        }
    }

    fn open_orders(&self) -> Result<Vec<Order>> {
        self.query_orders(
            &format!("{} WHERE status = ?1 ORDER BY placed_at, rowid", Self::SELECT),
            params![Self::status_to_int(OrderStatus::New)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn order_at(user_id: UserId, status: OrderStatus, offset_secs: i64) -> Order {
        Order::new(
            user_id,
            Some(1),
            OrderSide::Buy,
            OrderType::Limit,
            10.0,
            50.0,
            status,
            Utc::now() + Duration::seconds(offset_secs),
        )
    }

    #[test]
    fn test_round_trip() {
        let mut store = SqliteOrderStore::new_in_memory().unwrap();
        let order = order_at(1, OrderStatus::New, 0);
        store.save(&order).unwrap();

        let loaded = store.order(order.id).unwrap().unwrap();
        assert_eq!(loaded.id, order.id);
        assert_eq!(loaded.user_id, order.user_id);
        assert_eq!(loaded.instrument_id, order.instrument_id);
        assert_eq!(loaded.side, order.side);
        assert_eq!(loaded.order_type, order.order_type);
        assert_eq!(loaded.status, order.status);
        assert_eq!(loaded.placed_at, order.placed_at);
    }

    #[test]
    fn test_cash_order_round_trip() {
        let mut store = SqliteOrderStore::new_in_memory().unwrap();
        let order = Order::new(
            1,
            None,
            OrderSide::CashIn,
            OrderType::Market,
            1_000.0,
            1.0,
            OrderStatus::Filled,
            Utc::now(),
        );
        store.save(&order).unwrap();

        let loaded = store.order(order.id).unwrap().unwrap();
        assert_eq!(loaded.instrument_id, None);
        assert_eq!(loaded.side, OrderSide::CashIn);
    }

    #[test]
    fn test_save_updates_in_place() {
        let mut store = SqliteOrderStore::new_in_memory().unwrap();
        let mut order = order_at(1, OrderStatus::New, 0);
        store.save(&order).unwrap();

        order.cancel(Utc::now()).unwrap();
        store.save(&order).unwrap();

        let loaded = store.order(order.id).unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Cancelled);
        assert_eq!(store.orders_for_user(1, None).unwrap().len(), 1);
    }

    #[test]
    fn test_orders_for_user_sorted_and_filtered() {
        let mut store = SqliteOrderStore::new_in_memory().unwrap();
        let late = order_at(1, OrderStatus::New, 10);
        let early = order_at(1, OrderStatus::Filled, -10);
        store.save(&late).unwrap();
        store.save(&early).unwrap();
        store.save(&order_at(2, OrderStatus::New, 0)).unwrap();

        let orders = store.orders_for_user(1, None).unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, early.id);
        assert_eq!(orders[1].id, late.id);

        let pending = store.orders_for_user(1, Some(OrderStatus::New)).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, late.id);
    }

    #[test]
    fn test_open_orders() {
        let mut store = SqliteOrderStore::new_in_memory().unwrap();
        store.save(&order_at(1, OrderStatus::New, 0)).unwrap();
        store.save(&order_at(2, OrderStatus::New, 1)).unwrap();
        store.save(&order_at(1, OrderStatus::Filled, 2)).unwrap();

        assert_eq!(store.open_orders().unwrap().len(), 2);
    }
}
