//! Order lifecycle controller and portfolio reporting
//!
//! [`TradingEngine`] owns the collaborator seams and drives every order
//! through its lifecycle: admission at creation, synchronous execution for
//! market orders, re-validation and execution for pending limit orders,
//! and owner-only cancellation. Portfolio reads recompute both ledgers
//! from the order history - the engine keeps no running balances.

use crate::admission::{admit, Admission};
use crate::error::{Result, TradeError};
use crate::ledger::{cash_balance, position, CashBalance, Position};
use crate::market::{MarketData, UserDirectory};
use crate::order::{Order, OrderSide, OrderSizing, OrderStatus, OrderType};
use crate::pricing::resolve_execution;
use crate::store::OrderStore;
use crate::types::{Cash, InstrumentId, OrderId, Price, UserId};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// A request to create an order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderRequest {
    pub user_id: UserId,
    /// Required for Buy/Sell, ignored for cash movements
    pub instrument_id: Option<InstrumentId>,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub sizing: OrderSizing,
    /// Required for limit orders
    pub limit_price: Option<Price>,
}

impl OrderRequest {
    /// Market order for an instrument
    pub fn market(
        user_id: UserId,
        instrument_id: InstrumentId,
        side: OrderSide,
        sizing: OrderSizing,
    ) -> Self {
        Self {
            user_id,
            instrument_id: Some(instrument_id),
            side,
            order_type: OrderType::Market,
            sizing,
            limit_price: None,
        }
    }

    /// Limit order for an instrument
    pub fn limit(
        user_id: UserId,
        instrument_id: InstrumentId,
        side: OrderSide,
        sizing: OrderSizing,
        limit_price: Price,
    ) -> Self {
        Self {
            user_id,
            instrument_id: Some(instrument_id),
            side,
            order_type: OrderType::Limit,
            sizing,
            limit_price: Some(limit_price),
        }
    }

    /// Cash deposit
    pub fn deposit(user_id: UserId, amount: Cash) -> Self {
        Self {
            user_id,
            instrument_id: None,
            side: OrderSide::CashIn,
            order_type: OrderType::Market,
            sizing: OrderSizing::Notional(amount),
            limit_price: None,
        }
    }

    /// Cash withdrawal
    pub fn withdrawal(user_id: UserId, amount: Cash) -> Self {
        Self {
            user_id,
            instrument_id: None,
            side: OrderSide::CashOut,
            order_type: OrderType::Market,
            sizing: OrderSizing::Notional(amount),
            limit_price: None,
        }
    }
}

/// Point-in-time account snapshot: cash plus valued positions
#[derive(Debug, Clone, Serialize)]
pub struct Portfolio {
    pub user_id: UserId,
    pub cash: CashBalance,
    pub positions: Vec<Position>,
    /// Settled cash plus market value of all holdings
    pub total_value: Cash,
}

/// Order lifecycle controller
pub struct TradingEngine {
    store: Box<dyn OrderStore>,
    market: Arc<dyn MarketData>,
    users: Arc<dyn UserDirectory>,
}

impl TradingEngine {
    pub fn new(
        store: Box<dyn OrderStore>,
        market: Arc<dyn MarketData>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            store,
            market,
            users,
        }
    }

    /// Create an order and drive it as far as its type allows
    ///
    /// Market orders execute synchronously. Limit orders stay `New` until
    /// [`process_order`](Self::process_order). A denied trading order is
    /// persisted as `Rejected` and returned; a denied withdrawal is an
    /// error and leaves no record.
    pub fn create_order(&mut self, request: OrderRequest) -> Result<Order> {
        if !self.users.user_exists(request.user_id) {
            return Err(TradeError::UserNotFound(request.user_id));
        }

        match request.side {
            OrderSide::CashIn | OrderSide::CashOut => self.create_cash_movement(request),
            OrderSide::Buy | OrderSide::Sell => self.create_trading_order(request),
        }
    }

    fn create_cash_movement(&mut self, request: OrderRequest) -> Result<Order> {
        if request.order_type != OrderType::Market {
            return Err(TradeError::InvalidOrder(
                "cash movements cannot be limit orders".into(),
            ));
        }
        let amount = match request.sizing {
            OrderSizing::Notional(amount) if amount > 0.0 => amount,
            OrderSizing::Notional(amount) => {
                return Err(TradeError::InvalidOrder(format!(
                    "cash amount must be positive, got {}",
                    amount
                )))
            }
            OrderSizing::Shares(_) => {
                return Err(TradeError::InvalidOrder(
                    "cash movements take a notional amount, not a share count".into(),
                ))
            }
        };

        if request.side == OrderSide::CashOut {
            let orders = self.store.orders_for_user(request.user_id, None)?;
            if let Admission::Denied(reason) =
                admit(&orders, OrderSide::CashOut, None, amount, 1.0)
            {
                // Unlike trading orders, a denied withdrawal leaves no
                // Rejected record behind
                return Err(reason.into());
            }
        }

        let now = Utc::now();
        let mut order = Order::new(
            request.user_id,
            None,
            request.side,
            OrderType::Market,
            amount,
            1.0,
            OrderStatus::New,
            now,
        );
        self.store.save(&order)?;
        order.fill(now)?;
        self.store.save(&order)?;
        log::info!(
            "{:?} of {:.2} filled for user {}",
            order.side,
            amount,
            order.user_id
        );
        Ok(order)
    }

    fn create_trading_order(&mut self, request: OrderRequest) -> Result<Order> {
        let instrument_id = request.instrument_id.ok_or_else(|| {
            TradeError::InvalidOrder("trading order requires an instrument".into())
        })?;
        if !self.market.instrument_exists(instrument_id) {
            return Err(TradeError::InstrumentNotFound(instrument_id));
        }

        let market_price = self.market.current_price(instrument_id).unwrap_or(0.0);
        let execution = resolve_execution(
            request.order_type,
            market_price,
            request.sizing,
            request.limit_price,
        )?;

        let orders = self.store.orders_for_user(request.user_id, None)?;
        let now = Utc::now();

        match admit(
            &orders,
            request.side,
            Some(instrument_id),
            execution.size,
            execution.price,
        ) {
            Admission::Denied(reason) => {
                // Persisted for audit; no further transitions
                let order = Order::new(
                    request.user_id,
                    Some(instrument_id),
                    request.side,
                    request.order_type,
                    execution.size,
                    execution.price,
                    OrderStatus::Rejected,
                    now,
                );
                self.store.save(&order)?;
                log::warn!("Order {} rejected: {}", order.id, TradeError::from(reason));
                Ok(order)
            }
            Admission::Admitted => {
                let mut order = Order::new(
                    request.user_id,
                    Some(instrument_id),
                    request.side,
                    request.order_type,
                    execution.size,
                    execution.price,
                    OrderStatus::New,
                    now,
                );
                self.store.save(&order)?;

                if request.order_type == OrderType::Market {
                    // Admission was checked immediately above, so no
                    // re-validation on the synchronous fill
                    order.fill(Utc::now())?;
                    self.store.save(&order)?;
                    log::info!(
                        "Order {} filled: {:?} {} @ {:.2}",
                        order.id,
                        order.side,
                        order.size,
                        order.price
                    );
                }
                Ok(order)
            }
        }
    }

    /// Execute or reject a pending order
    ///
    /// Re-runs admission with the order's own reservation excluded, so a
    /// pending order never blocks on the resources it reserved for itself.
    /// Always leaves the order terminal: `Filled` or `Rejected`.
    pub fn process_order(&mut self, order_id: OrderId) -> Result<Order> {
        let mut order = self
            .store
            .order(order_id)?
            .ok_or(TradeError::OrderNotFound(order_id))?;
        if order.is_terminal() {
            return Err(TradeError::InvalidStateTransition {
                status: order.status,
            });
        }

        let others: Vec<Order> = self
            .store
            .orders_for_user(order.user_id, None)?
            .into_iter()
            .filter(|o| o.id != order.id)
            .collect();

        let admission = admit(
            &others,
            order.side,
            order.instrument_id,
            order.size,
            order.price,
        );

        let now = Utc::now();
        match admission {
            Admission::Admitted => {
                order.fill(now)?;
                log::info!(
                    "Order {} filled: {:?} {} @ {:.2}",
                    order.id,
                    order.side,
                    order.size,
                    order.price
                );
            }
            Admission::Denied(reason) => {
                order.reject(now)?;
                log::warn!(
                    "Order {} rejected at execution: {}",
                    order.id,
                    TradeError::from(reason)
                );
            }
        }
        self.store.save(&order)?;
        Ok(order)
    }

    /// Process every pending order, sequentially, oldest first
    ///
    /// A failure on one order is logged and does not stop the batch.
    pub fn process_pending(&mut self) -> Result<Vec<Order>> {
        let pending = self.store.open_orders()?;
        log::info!("Processing {} pending orders", pending.len());

        let mut processed = Vec::with_capacity(pending.len());
        for order in pending {
            match self.process_order(order.id) {
                Ok(order) => processed.push(order),
                Err(e) => log::warn!("Failed to process order {}: {}", order.id, e),
            }
        }
        Ok(processed)
    }

    /// Cancel a pending order on behalf of its owner
    ///
    /// The reservation is released implicitly: the ledgers simply stop
    /// counting a cancelled order.
    pub fn cancel_order(&mut self, order_id: OrderId, user_id: UserId) -> Result<Order> {
        let mut order = self
            .store
            .order(order_id)?
            .ok_or(TradeError::OrderNotFound(order_id))?;
        if order.user_id != user_id {
            return Err(TradeError::Unauthorized(format!(
                "order {} does not belong to user {}",
                order_id, user_id
            )));
        }

        order.cancel(Utc::now())?;
        self.store.save(&order)?;
        log::info!("Order {} cancelled by user {}", order_id, user_id);
        Ok(order)
    }

    /// Current portfolio: cash balances plus every active position
    pub fn get_portfolio(&self, user_id: UserId) -> Result<Portfolio> {
        if !self.users.user_exists(user_id) {
            return Err(TradeError::UserNotFound(user_id));
        }

        let orders = self.store.orders_for_user(user_id, None)?;
        let cash = cash_balance(&orders);

        let mut instrument_ids: Vec<InstrumentId> = Vec::new();
        for order in &orders {
            if let Some(id) = order.instrument_id {
                if !instrument_ids.contains(&id) {
                    instrument_ids.push(id);
                }
            }
        }

        let mut positions = Vec::new();
        for id in instrument_ids {
            let price = self.market.current_price(id).unwrap_or(0.0);
            let pos = position(id, &orders, price);
            if !pos.is_empty() {
                positions.push(pos);
            }
        }

        let total_value = cash.total + positions.iter().map(|p| p.market_value).sum::<Cash>();
        Ok(Portfolio {
            user_id,
            cash,
            positions,
            total_value,
        })
    }

    /// Fetch one order by id
    pub fn order(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .order(order_id)?
            .ok_or(TradeError::OrderNotFound(order_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Instrument;
    use crate::market::{MemoryUserDirectory, StaticMarketData};
    use crate::store::MemoryOrderStore;

    const USER: UserId = 1;
    const ACME: InstrumentId = 10;

    fn engine() -> (TradingEngine, Arc<StaticMarketData>) {
        let mut market = StaticMarketData::default();
        market.quote(Instrument::new(ACME, "ACME", "Acme Corp."), 50.0);
        let market = Arc::new(market);
        let users = Arc::new(MemoryUserDirectory::with_users([USER]));
        let engine = TradingEngine::new(
            Box::new(MemoryOrderStore::new()),
            market.clone(),
            users,
        );
        (engine, market)
    }

    fn funded_engine(amount: Cash) -> (TradingEngine, Arc<StaticMarketData>) {
        let (mut engine, market) = engine();
        engine
            .create_order(OrderRequest::deposit(USER, amount))
            .unwrap();
        (engine, market)
    }

    #[test]
    fn test_deposit_fills_immediately() {
        let (mut engine, _) = engine();

        let order = engine
            .create_order(OrderRequest::deposit(USER, 1_000.0))
            .unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.size, 1_000.0);

        let portfolio = engine.get_portfolio(USER).unwrap();
        assert_eq!(portfolio.cash.total, 1_000.0);
    }

    #[test]
    fn test_denied_withdrawal_is_an_error_with_no_record() {
        let (mut engine, _) = funded_engine(100.0);

        let err = engine
            .create_order(OrderRequest::withdrawal(USER, 500.0))
            .unwrap_err();
        assert!(matches!(err, TradeError::InsufficientFunds { .. }));

        // Only the deposit is on file
        let portfolio = engine.get_portfolio(USER).unwrap();
        assert_eq!(portfolio.cash.total, 100.0);
    }

    #[test]
    fn test_market_buy_fills_and_debits_cash() {
        let (mut engine, _) = funded_engine(10_000.0);

        let order = engine
            .create_order(OrderRequest::market(
                USER,
                ACME,
                OrderSide::Buy,
                OrderSizing::Shares(10.0),
            ))
            .unwrap();

        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.price, 50.0);
        assert_eq!(order.size, 10.0);

        let portfolio = engine.get_portfolio(USER).unwrap();
        assert_eq!(portfolio.cash.available, 9_500.0);
        assert_eq!(portfolio.positions[0].quantity.total, 10.0);
    }

    #[test]
    fn test_unfunded_market_buy_is_persisted_rejected() {
        let (mut engine, _) = engine();

        let order = engine
            .create_order(OrderRequest::market(
                USER,
                ACME,
                OrderSide::Buy,
                OrderSizing::Shares(10.0),
            ))
            .unwrap();

        assert_eq!(order.status, OrderStatus::Rejected);
        // The rejection is auditable
        assert_eq!(engine.order(order.id).unwrap().status, OrderStatus::Rejected);
    }

    #[test]
    fn test_limit_order_stays_new_and_reserves() {
        let (mut engine, _) = funded_engine(1_000.0);

        let order = engine
            .create_order(OrderRequest::limit(
                USER,
                ACME,
                OrderSide::Buy,
                OrderSizing::Shares(10.0),
                45.0,
            ))
            .unwrap();

        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.price, 45.0);

        let portfolio = engine.get_portfolio(USER).unwrap();
        assert_eq!(portfolio.cash.reserved, 450.0);
        assert_eq!(portfolio.cash.available, 550.0);
    }

    #[test]
    fn test_process_order_does_not_block_on_own_reservation() {
        let (mut engine, _) = funded_engine(500.0);

        // Reserves the entire balance
        let order = engine
            .create_order(OrderRequest::limit(
                USER,
                ACME,
                OrderSide::Buy,
                OrderSizing::Shares(10.0),
                50.0,
            ))
            .unwrap();
        assert_eq!(engine.get_portfolio(USER).unwrap().cash.available, 0.0);

        let processed = engine.process_order(order.id).unwrap();
        assert_eq!(processed.status, OrderStatus::Filled);
        assert_eq!(engine.get_portfolio(USER).unwrap().cash.total, 0.0);
    }

    #[test]
    fn test_process_order_rejects_when_resources_are_gone() {
        // A pending order written by another backend instance can name
        // shares this instance never saw filled; re-validation must reject
        // it rather than leave it pending
        let mut store = MemoryOrderStore::new();
        let stale_sell = Order::new(
            USER,
            Some(ACME),
            OrderSide::Sell,
            OrderType::Limit,
            5.0,
            100.0,
            OrderStatus::New,
            Utc::now(),
        );
        store.save(&stale_sell).unwrap();

        let mut market = StaticMarketData::default();
        market.quote(Instrument::new(ACME, "ACME", "Acme Corp."), 50.0);
        let mut engine = TradingEngine::new(
            Box::new(store),
            Arc::new(market),
            Arc::new(MemoryUserDirectory::with_users([USER])),
        );

        let processed = engine.process_order(stale_sell.id).unwrap();
        assert_eq!(processed.status, OrderStatus::Rejected);
    }

    #[test]
    fn test_process_order_terminal_fails() {
        let (mut engine, _) = funded_engine(10_000.0);

        let order = engine
            .create_order(OrderRequest::market(
                USER,
                ACME,
                OrderSide::Buy,
                OrderSizing::Shares(10.0),
            ))
            .unwrap();

        let err = engine.process_order(order.id).unwrap_err();
        assert!(matches!(err, TradeError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_cancel_requires_owner() {
        let (mut engine, _) = funded_engine(1_000.0);

        let order = engine
            .create_order(OrderRequest::limit(
                USER,
                ACME,
                OrderSide::Buy,
                OrderSizing::Shares(10.0),
                45.0,
            ))
            .unwrap();

        let err = engine.cancel_order(order.id, 999).unwrap_err();
        assert!(matches!(err, TradeError::Unauthorized(_)));

        let cancelled = engine.cancel_order(order.id, USER).unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancel_releases_reservation() {
        let (mut engine, _) = funded_engine(1_000.0);

        let order = engine
            .create_order(OrderRequest::limit(
                USER,
                ACME,
                OrderSide::Buy,
                OrderSizing::Shares(10.0),
                45.0,
            ))
            .unwrap();
        assert_eq!(engine.get_portfolio(USER).unwrap().cash.reserved, 450.0);

        engine.cancel_order(order.id, USER).unwrap();
        let portfolio = engine.get_portfolio(USER).unwrap();
        assert_eq!(portfolio.cash.reserved, 0.0);
        assert_eq!(portfolio.cash.available, 1_000.0);
    }

    #[test]
    fn test_unknown_user_and_instrument() {
        let (mut engine, _) = engine();

        let err = engine
            .create_order(OrderRequest::deposit(999, 100.0))
            .unwrap_err();
        assert!(matches!(err, TradeError::UserNotFound(999)));

        let err = engine
            .create_order(OrderRequest::market(
                USER,
                999,
                OrderSide::Buy,
                OrderSizing::Shares(1.0),
            ))
            .unwrap_err();
        assert!(matches!(err, TradeError::InstrumentNotFound(999)));
    }

    #[test]
    fn test_portfolio_values_positions_at_market() {
        let (mut engine, market) = funded_engine(10_000.0);

        engine
            .create_order(OrderRequest::market(
                USER,
                ACME,
                OrderSide::Buy,
                OrderSizing::Shares(10.0),
            ))
            .unwrap();

        market.set_price(ACME, 60.0);
        let portfolio = engine.get_portfolio(USER).unwrap();
        let position = &portfolio.positions[0];
        assert_eq!(position.market_value, 600.0);
        assert_eq!(position.average_cost, 50.0);
        assert_eq!(portfolio.total_value, 9_500.0 + 600.0);
    }

    #[test]
    fn test_notional_buy_truncates_shares() {
        let (mut engine, _) = funded_engine(10_000.0);

        let order = engine
            .create_order(OrderRequest::market(
                USER,
                ACME,
                OrderSide::Buy,
                OrderSizing::Notional(120.0),
            ))
            .unwrap();

        // 120 / 50 -> 2 whole shares
        assert_eq!(order.size, 2.0);
        assert_eq!(order.status, OrderStatus::Filled);
    }
}
