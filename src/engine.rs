//! Control loop
//!
//! One sequential cycle: sync the account, feed the risk guardian,
//! render the dashboard, then walk the configured symbols in order.
//! The guardian is consulted once per cycle, so every symbol in a
//! cycle shares the same gate decision. All broker failures are
//! transient here; the next scheduled cycle is the only retry.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::broker::{Broker, OrderRequest};
use crate::core::guardian::{RiskGuardian, RiskStatus};
use crate::core::strategy::Strategy;
use crate::core::structure::trend_filter;
use crate::core::types::{AccountInfo, Direction, Trend};
use crate::status::SystemStatus;

const SEP: &str = "-------------------------------------------------------";

/// Engine settings carved out of the main configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub symbols: Vec<String>,
    pub timeframe: String,
    pub history_len: usize,
    pub sma_period: usize,
    /// Pause between cycles
    pub poll_interval: Duration,
    /// Pause before re-polling after a failed account fetch
    pub account_retry: Duration,
    /// Status snapshot path; `None` disables the file
    pub status_path: Option<PathBuf>,
}

/// What happened for one symbol during a cycle
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolAction {
    /// No entry conditions met
    NoSignal,
    /// An open position suppressed a fresh entry
    Holding,
    /// Candle fetch failed; skipped until next cycle
    NoData,
    /// Order dispatched
    Entered { direction: Direction, lots: Decimal },
    /// Signal fired but the broker rejected the order
    OrderRejected,
}

/// Per-symbol slice of the cycle report
#[derive(Debug, Clone)]
pub struct SymbolReport {
    pub symbol: String,
    pub price: Option<Decimal>,
    pub trend: Option<Trend>,
    pub action: SymbolAction,
}

/// Outcome of one full cycle
#[derive(Debug, Clone)]
pub enum CycleReport {
    /// Account info unavailable; nothing evaluated
    NoAccount,
    /// Risk gate closed; no symbol evaluated
    Halted { status: RiskStatus },
    /// Normal pass over all symbols
    Evaluated {
        status: RiskStatus,
        symbols: Vec<SymbolReport>,
    },
}

/// The trading engine: broker + guardian + strategy behind one loop
pub struct Engine {
    broker: Box<dyn Broker>,
    guardian: RiskGuardian,
    strategy: Strategy,
    config: EngineConfig,
    last_signal: String,
}

impl Engine {
    pub fn new(
        broker: Box<dyn Broker>,
        guardian: RiskGuardian,
        strategy: Strategy,
        config: EngineConfig,
    ) -> Self {
        Self {
            broker,
            guardian,
            strategy,
            config,
            last_signal: String::new(),
        }
    }

    /// Run until the process is terminated
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match self.run_cycle().await {
                CycleReport::NoAccount => sleep(self.config.account_retry).await,
                _ => sleep(self.config.poll_interval).await,
            }
        }
    }

    /// One full pass: account, guardian, dashboard, symbols
    pub async fn run_cycle(&mut self) -> CycleReport {
        let account = match self.broker.get_account().await {
            Ok(account) => account,
            Err(e) => {
                warn!("Account fetch failed: {e:#}");
                return CycleReport::NoAccount;
            }
        };

        let status = self.guardian.update(&account);
        self.render_dashboard(&account, status);

        if !self.guardian.can_trade() {
            info!("Trading stopped by risk rules: {status}");
            self.write_status(&account, status, true);
            return CycleReport::Halted { status };
        }

        let mut reports = Vec::with_capacity(self.config.symbols.len());
        let symbols = self.config.symbols.clone();
        for symbol in &symbols {
            let report = self.evaluate_symbol(symbol).await;
            info!(
                "{:<10} {:<10} {:<6} {}",
                report.symbol,
                report
                    .price
                    .map_or_else(|| "-".to_string(), |p| format!("{p:.5}")),
                report
                    .trend
                    .map_or_else(|| "-".to_string(), |t| t.to_string()),
                describe(&report.action),
            );
            reports.push(report);
        }
        info!("{SEP}");

        self.write_status(&account, status, false);
        CycleReport::Evaluated { status, symbols: reports }
    }

    async fn evaluate_symbol(&mut self, symbol: &str) -> SymbolReport {
        let series = match self
            .broker
            .get_candles(symbol, &self.config.timeframe, self.config.history_len)
            .await
        {
            Ok(series) => series,
            Err(e) => {
                warn!("{symbol}: candle fetch failed: {e:#}");
                return SymbolReport {
                    symbol: symbol.to_string(),
                    price: None,
                    trend: None,
                    action: SymbolAction::NoData,
                };
            }
        };

        let price = series.last_close();
        let trend = trend_filter(&series, self.config.sma_period);

        // Never stack entries on a symbol that already has one open
        match self.broker.get_positions(Some(symbol)).await {
            Ok(open) if !open.is_empty() => {
                return SymbolReport {
                    symbol: symbol.to_string(),
                    price,
                    trend,
                    action: SymbolAction::Holding,
                };
            }
            Ok(_) => {}
            Err(e) => {
                warn!("{symbol}: position fetch failed: {e:#}");
                return SymbolReport {
                    symbol: symbol.to_string(),
                    price,
                    trend,
                    action: SymbolAction::NoData,
                };
            }
        }

        let signal = match self.strategy.check_signal(&series) {
            Some(signal) => signal,
            None => {
                return SymbolReport {
                    symbol: symbol.to_string(),
                    price,
                    trend,
                    action: SymbolAction::NoSignal,
                };
            }
        };

        info!("SIGNAL: {} {symbol} | {}", signal.direction, signal.reason);

        let lots = self
            .guardian
            .position_size(signal.entry_price, signal.stop_loss);
        let order = OrderRequest {
            symbol: symbol.to_string(),
            direction: signal.direction,
            lots,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit_1,
        };

        let action = match self.broker.place_order(order).await {
            Ok(result) => {
                info!(
                    "Trade executed: {} {symbol} | ticket {} @ {} | lots {lots}",
                    signal.direction, result.ticket, result.fill_price
                );
                self.last_signal = format!("{} {symbol}", signal.direction);
                SymbolAction::Entered {
                    direction: signal.direction,
                    lots,
                }
            }
            Err(e) => {
                warn!("{symbol}: order failed: {e:#}");
                SymbolAction::OrderRejected
            }
        };

        SymbolReport {
            symbol: symbol.to_string(),
            price,
            trend,
            action,
        }
    }

    fn render_dashboard(&self, account: &AccountInfo, status: RiskStatus) {
        let report = self.guardian.progress_report();

        info!("{SEP}");
        info!("Balance: ${:.2} | Equity: ${:.2}", account.balance, account.equity);
        info!(
            "Daily PnL: ${:.2} ({:.2}%) | Target remaining: ${:.2}",
            report.daily_pnl, report.daily_pnl_pct, report.target_remaining
        );
        info!(
            "Status: {} | {status}",
            if report.trading { "TRADING" } else { "STOPPED" }
        );
        info!("{SEP}");
    }

    fn write_status(&self, account: &AccountInfo, status: RiskStatus, halted: bool) {
        let Some(path) = &self.config.status_path else {
            return;
        };

        let report = self.guardian.progress_report();
        let snapshot = SystemStatus {
            running: true,
            timestamp: Utc::now().timestamp(),
            balance: account.balance.to_f64().unwrap_or(0.0),
            equity: account.equity.to_f64().unwrap_or(0.0),
            daily_pnl: report.daily_pnl.to_f64().unwrap_or(0.0),
            risk_status: status.to_string(),
            trading: !halted && report.trading,
            last_signal: self.last_signal.clone(),
        };

        if let Err(e) = snapshot.save(path) {
            warn!("Status snapshot write failed: {e}");
        }
    }
}

fn describe(action: &SymbolAction) -> String {
    match action {
        SymbolAction::NoSignal => "-".to_string(),
        SymbolAction::Holding => "HOLDING".to_string(),
        SymbolAction::NoData => "NO DATA".to_string(),
        SymbolAction::Entered { direction, lots } => format!("{direction} ({lots} lots)"),
        SymbolAction::OrderRejected => "REJECTED".to_string(),
    }
}
