//! Broker connectors
//!
//! Abstractions for broker access. Two variants: the live MT5 bridge
//! and a synthetic simulation. The engine depends only on this trait
//! and treats both identically; connector-specific failures surface as
//! plain errors, never as broker error types.

pub mod mt5;
pub mod sim;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::core::series::CandleSeries;
use crate::core::types::{AccountInfo, Direction, Position};

/// Broker capability interface - all connectors implement this
#[async_trait]
pub trait Broker: Send + Sync {
    /// Connect to the broker
    async fn connect(&mut self) -> Result<()>;

    /// Disconnect from the broker
    async fn disconnect(&mut self) -> Result<()>;

    /// Fetch the most recent candles for a symbol, oldest first
    async fn get_candles(&self, symbol: &str, timeframe: &str, count: usize)
        -> Result<CandleSeries>;

    /// Get account balance and equity
    async fn get_account(&self) -> Result<AccountInfo>;

    /// Get open positions, optionally filtered by symbol
    async fn get_positions(&self, symbol: Option<&str>) -> Result<Vec<Position>>;

    /// Place a market order with attached stop loss and take profit
    async fn place_order(&self, order: OrderRequest) -> Result<OrderResult>;
}

/// Order request
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub symbol: String,
    pub direction: Direction,
    pub lots: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

/// Order result
#[derive(Debug, Clone)]
pub struct OrderResult {
    pub ticket: u64,
    pub fill_price: Decimal,
}
