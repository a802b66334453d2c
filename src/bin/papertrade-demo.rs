//! Demo session against an in-memory trading account
//!
//! Run with `RUST_LOG=info cargo run --bin papertrade-demo` to see the
//! engine's decisions alongside the final portfolio.

use anyhow::Result;
use papertrade::prelude::*;
use std::sync::Arc;

const ALICE: UserId = 1;

fn main() -> Result<()> {
    env_logger::init();

    let mut market = StaticMarketData::default();
    market.quote(Instrument::new(1, "AAPL", "Apple Inc."), 150.0);
    market.quote(Instrument::new(2, "MSFT", "Microsoft Corp."), 300.0);
    let market = Arc::new(market);

    let mut engine = TradingEngine::new(
        Box::new(MemoryOrderStore::new()),
        market.clone(),
        Arc::new(MemoryUserDirectory::with_users([ALICE])),
    );

    // Fund the account, then trade against it
    engine.create_order(OrderRequest::deposit(ALICE, 25_000.0))?;
    engine.create_order(OrderRequest::market(
        ALICE,
        1,
        OrderSide::Buy,
        OrderSizing::Shares(50.0),
    ))?;
    engine.create_order(OrderRequest::market(
        ALICE,
        2,
        OrderSide::Buy,
        OrderSizing::Notional(5_000.0),
    ))?;

    // A resting limit sell, cancelled before it executes
    let resting = engine.create_order(OrderRequest::limit(
        ALICE,
        1,
        OrderSide::Sell,
        OrderSizing::Shares(20.0),
        170.0,
    ))?;
    engine.cancel_order(resting.id, ALICE)?;

    // A second limit sell that fills once the batch runs
    engine.create_order(OrderRequest::limit(
        ALICE,
        1,
        OrderSide::Sell,
        OrderSizing::Shares(10.0),
        160.0,
    ))?;
    engine.process_pending()?;

    // Mark the book to a moved market before reporting
    market.set_price(1, 165.0);

    let portfolio = engine.get_portfolio(ALICE)?;
    println!("{}", serde_json::to_string_pretty(&portfolio)?);
    Ok(())
}
