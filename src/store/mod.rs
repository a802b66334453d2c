//! Order persistence
//!
//! The engine reads and writes orders through the [`OrderStore`] trait.
//! Reads come back in ascending `placed_at` order with ties broken by
//! insertion order - the calculators replay histories and depend on it.

use crate::error::Result;
use crate::order::{Order, OrderStatus};
use crate::types::{OrderId, UserId};
use hashbrown::HashMap;

#[cfg(feature = "sqlite-store")]
pub mod sqlite;

#[cfg(feature = "sqlite-store")]
pub use sqlite::SqliteOrderStore;

/// Persistence collaborator for order records
pub trait OrderStore: Send {
    /// Insert a new order or update an existing one by id
    fn save(&mut self, order: &Order) -> Result<()>;

    /// Fetch one order by id
    fn order(&self, id: OrderId) -> Result<Option<Order>>;

    /// A user's orders, ascending by `placed_at` (insertion order on ties),
    /// optionally restricted to one status
    fn orders_for_user(&self, user_id: UserId, status: Option<OrderStatus>)
        -> Result<Vec<Order>>;

    /// All pending orders across users, in the same ordering
    fn open_orders(&self) -> Result<Vec<Order>>;
}

/// In-memory order store
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    /// Orders in insertion order
    orders: Vec<Order>,
    /// Index from order id into `orders`
    index: HashMap<OrderId, usize>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    fn sorted(&self, mut orders: Vec<Order>) -> Vec<Order> {
        // Stable sort: equal timestamps keep insertion order
        orders.sort_by_key(|o| o.placed_at);
        orders
    }
}

impl OrderStore for MemoryOrderStore {
    fn save(&mut self, order: &Order) -> Result<()> {
        match self.index.get(&order.id) {
            Some(&i) => self.orders[i] = order.clone(),
            None => {
                self.index.insert(order.id, self.orders.len());
                self.orders.push(order.clone());
            }
        }
        Ok(())
    }

    fn order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.index.get(&id).map(|&i| self.orders[i].clone()))
    }

    fn orders_for_user(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        let orders = self
            .orders
            .iter()
            .filter(|o| o.user_id == user_id && status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        Ok(self.sorted(orders))
    }

    fn open_orders(&self) -> Result<Vec<Order>> {
        let orders = self
            .orders
            .iter()
            .filter(|o| o.status == OrderStatus::New)
            .cloned()
            .collect();
        Ok(self.sorted(orders))
    }
}
