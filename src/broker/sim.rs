//! Simulation broker
//!
//! Virtual broker used when no live bridge is reachable. Each symbol
//! gets a synthetic random-walk candle history with a slow sine drift;
//! one new candle is appended (and the oldest dropped) per poll, so the
//! engine drives simulated time forward through the same trait calls it
//! makes against the live connector. Equity drifts only while positions
//! are open, which makes the risk gate observable without a market.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use crate::broker::{Broker, OrderRequest, OrderResult};
use crate::core::series::CandleSeries;
use crate::core::types::{AccountInfo, Candle, Position};

const HISTORY_LEN: usize = 500;
const WALK_STEP: f64 = 0.0005;

/// Candle interval for a timeframe tag like "M15" or "H1"
fn timeframe_minutes(timeframe: &str) -> i64 {
    match timeframe {
        "M1" => 1,
        "M5" => 5,
        "M30" => 30,
        "H1" => 60,
        "H4" => 240,
        "D1" => 1440,
        _ => 15,
    }
}

struct SimState {
    rng: StdRng,
    history: HashMap<String, Vec<Candle>>,
    balance: Decimal,
    equity: Decimal,
    positions: Vec<Position>,
    next_ticket: u64,
}

/// Virtual broker advancing a synthetic price path per poll
pub struct SimBroker {
    state: Mutex<SimState>,
}

impl SimBroker {
    pub fn new(symbols: &[String], initial_balance: Decimal, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut history = HashMap::new();
        for symbol in symbols {
            let candles = generate_history(&mut rng, HISTORY_LEN, 15);
            history.insert(symbol.clone(), candles);
        }

        Self {
            state: Mutex::new(SimState {
                rng,
                history,
                balance: initial_balance,
                equity: initial_balance,
                positions: Vec::new(),
                next_ticket: 1,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        // Lock poisoning only happens after a panic in this module
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Seeded random-walk history: increments around zero plus a slow sine
/// drift, highs and lows padded around the open/close body
fn generate_history(rng: &mut StdRng, count: usize, interval_min: i64) -> Vec<Candle> {
    let mut candles = Vec::with_capacity(count);
    let end = Utc::now();
    let mut close = 1.1000_f64;

    for i in 0..count {
        let time = end - Duration::minutes(interval_min * (count - i) as i64);
        let t = i as f64 / count as f64 * 10.0;
        let step = rng.gen_range(-WALK_STEP..WALK_STEP) + (t * PI / 5.0).sin() * 0.00005;

        let open = close;
        close += step;
        candles.push(make_candle(time, open, close, 0.0002, rng));
    }

    candles
}

fn make_candle(
    time: DateTime<Utc>,
    open: f64,
    close: f64,
    pad: f64,
    rng: &mut StdRng,
) -> Candle {
    let high = open.max(close) + pad;
    let low = open.min(close) - pad;
    let volume = rng.gen_range(100..1000);

    Candle::new(
        time,
        decimal(open),
        decimal(high),
        decimal(low),
        decimal(close),
        Decimal::from(volume),
    )
}

fn decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO).round_dp(5)
}

/// Advance one symbol's walk by a single candle
fn advance(state: &mut SimState, symbol: &str, interval_min: i64) {
    let has_positions = !state.positions.is_empty();

    if let Some(candles) = state.history.get_mut(symbol) {
        if let Some(last) = candles.last() {
            let open = last.close;
            let time = last.time + Duration::minutes(interval_min);
            let step = state.rng.gen_range(-WALK_STEP..WALK_STEP);
            let close = open
                + Decimal::from_f64(step).unwrap_or(Decimal::ZERO).round_dp(7);

            let high = open.max(close) + dec!(0.0001);
            let low = open.min(close) - dec!(0.0001);
            candles.push(Candle::new(time, open, high, low, close, dec!(500)));
            if candles.len() > HISTORY_LEN {
                candles.remove(0);
            }
        }
    }

    // Floating PnL only moves the account while something is open
    if has_positions {
        let drift = state.rng.gen_range(-10.0..20.0);
        state.equity += Decimal::from_f64(drift).unwrap_or(Decimal::ZERO).round_dp(2);
    }
}

#[async_trait]
impl Broker for SimBroker {
    async fn connect(&mut self) -> Result<()> {
        info!("[sim] virtual broker initialized");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        info!("[sim] virtual broker shut down");
        Ok(())
    }

    async fn get_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        count: usize,
    ) -> Result<CandleSeries> {
        let mut state = self.lock();
        let interval = timeframe_minutes(timeframe);
        advance(&mut state, symbol, interval);

        let candles = state
            .history
            .get(symbol)
            .ok_or_else(|| anyhow::anyhow!("unknown symbol {symbol}"))?;

        Ok(CandleSeries::from_candles(count, candles.clone()))
    }

    async fn get_account(&self) -> Result<AccountInfo> {
        let state = self.lock();
        Ok(AccountInfo {
            balance: state.balance,
            equity: state.equity,
        })
    }

    async fn get_positions(&self, symbol: Option<&str>) -> Result<Vec<Position>> {
        let state = self.lock();
        Ok(state
            .positions
            .iter()
            .filter(|p| symbol.map_or(true, |s| p.symbol == s))
            .cloned()
            .collect())
    }

    async fn place_order(&self, order: OrderRequest) -> Result<OrderResult> {
        let mut state = self.lock();
        let fill_price = state
            .history
            .get(&order.symbol)
            .and_then(|c| c.last())
            .map(|c| c.close)
            .unwrap_or(Decimal::ZERO);

        let ticket = state.next_ticket;
        state.next_ticket += 1;

        info!(
            "[sim] {} {} | lots: {} | sl: {} | tp: {}",
            order.direction, order.symbol, order.lots, order.stop_loss, order.take_profit
        );

        state.positions.push(Position {
            symbol: order.symbol,
            direction: order.direction,
            entry_time: Utc::now(),
        });

        Ok(OrderResult { ticket, fill_price })
    }
}
