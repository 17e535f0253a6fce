//! Risk Guardian
//!
//! Account protection layer. The gatekeeper: no order is sized or
//! dispatched without its approval, and once a hard limit fires the
//! gate stays shut until the next trading day.
//!
//! Tracks a prop-firm style rule set: a hard daily loss stop, a soft
//! daily profit target, and an overall phase target that ends the
//! evaluation phase when reached.

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core::types::AccountInfo;

/// Risk limits, fixed at construction
#[derive(Debug, Clone)]
pub struct RiskConfig {
    /// Hard stop: daily loss as a fraction of the day-start balance
    pub max_daily_loss_pct: Decimal,
    /// Soft flag: daily profit target as a fraction of the day-start balance
    pub daily_target_pct: Decimal,
    /// Phase profit target as a fraction of the initial balance
    pub phase_target_pct: Decimal,
    /// Fraction of balance risked per trade
    pub risk_per_trade_pct: Decimal,
    /// Units per lot (standard forex lot = 100 000)
    pub contract_size: Decimal,
    /// Smallest tradable lot size
    pub min_lot: Decimal,
    /// Substitute stop distance when entry == stop
    pub min_stop_distance: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_daily_loss_pct: dec!(0.04),
            daily_target_pct: dec!(0.02),
            phase_target_pct: dec!(0.10),
            risk_per_trade_pct: dec!(0.01),
            contract_size: dec!(100000),
            min_lot: dec!(0.01),
            min_stop_distance: dec!(0.0001),
        }
    }
}

/// Outcome of a guardian update
///
/// The loss check runs first; the phase check runs last and may
/// override the reported status while also closing the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskStatus {
    Ok,
    DailyLossHit,
    DailyTargetHit,
    PhaseTargetHit,
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskStatus::Ok => write!(f, "OK"),
            RiskStatus::DailyLossHit => write!(f, "DAILY_LOSS_HIT"),
            RiskStatus::DailyTargetHit => write!(f, "DAILY_TARGET_HIT"),
            RiskStatus::PhaseTargetHit => write!(f, "PHASE_TARGET_HIT"),
        }
    }
}

/// Snapshot of progress toward the phase target
#[derive(Debug, Clone)]
pub struct ProgressReport {
    pub daily_pnl: Decimal,
    /// Daily PnL as a percentage of the day-start balance
    pub daily_pnl_pct: Decimal,
    pub total_profit: Decimal,
    /// Amount still needed to reach the phase target, clamped at zero
    pub target_remaining: Decimal,
    pub trading: bool,
}

/// Risk state machine gating all trading activity
#[derive(Debug)]
pub struct RiskGuardian {
    config: RiskConfig,
    initial_balance: Decimal,
    current_balance: Decimal,
    daily_start_balance: Decimal,
    daily_pnl: Decimal,
    /// Phase target in account currency
    phase_target_amount: Decimal,
    /// TRADING (true) / STOPPED (false); re-opened only by a day reset
    trading_enabled: bool,
    /// Day-of-month of the last reset, for rollover detection
    current_day: u32,
}

impl RiskGuardian {
    pub fn new(config: RiskConfig, initial_balance: Decimal) -> Self {
        let phase_target_amount = initial_balance * config.phase_target_pct;
        Self {
            config,
            initial_balance,
            current_balance: initial_balance,
            daily_start_balance: initial_balance,
            daily_pnl: Decimal::ZERO,
            phase_target_amount,
            trading_enabled: true,
            current_day: Utc::now().day(),
        }
    }

    /// Start a new trading day: rebase the daily ledger and re-open the gate
    pub fn reset_day(&mut self, current_balance: Decimal) {
        self.daily_start_balance = current_balance;
        self.daily_pnl = Decimal::ZERO;
        self.trading_enabled = true;
    }

    /// Roll the daily ledger over when the calendar day changes
    pub fn check_daily_reset(&mut self, today: u32, current_balance: Decimal) {
        if today != self.current_day {
            self.current_day = today;
            self.reset_day(current_balance);
        }
    }

    /// Feed the latest account snapshot through the state machine
    ///
    /// Daily PnL is equity-based so floating losses count against the
    /// hard stop before they are realized.
    pub fn update(&mut self, account: &AccountInfo) -> RiskStatus {
        self.check_daily_reset(Utc::now().day(), account.balance);
        self.current_balance = account.balance;
        self.daily_pnl = account.equity - self.daily_start_balance;

        let mut status = RiskStatus::Ok;

        // 1. Daily loss limit: hard stop, boundary inclusive
        let max_loss = self.daily_start_balance * self.config.max_daily_loss_pct;
        if self.daily_pnl <= -max_loss {
            self.trading_enabled = false;
            status = RiskStatus::DailyLossHit;
        }

        // 2. Daily target: informational only, trading continues
        let daily_target = self.daily_start_balance * self.config.daily_target_pct;
        if self.daily_pnl >= daily_target {
            status = RiskStatus::DailyTargetHit;
        }

        // 3. Phase target: evaluated last, overrides the reported status
        //    and stops trading for the phase
        let total_profit = account.balance - self.initial_balance;
        if total_profit >= self.phase_target_amount {
            self.trading_enabled = false;
            status = RiskStatus::PhaseTargetHit;
        }

        status
    }

    /// Whether the gate is open; reflects only TRADING/STOPPED
    pub fn can_trade(&self) -> bool {
        self.trading_enabled
    }

    /// Lot size risking `risk_per_trade_pct` of balance on the stop distance
    pub fn position_size(&self, entry_price: Decimal, stop_loss: Decimal) -> Decimal {
        let risk_amount = self.current_balance * self.config.risk_per_trade_pct;

        let mut distance = (entry_price - stop_loss).abs();
        if distance.is_zero() {
            distance = self.config.min_stop_distance;
        }

        let lots = (risk_amount / (distance * self.config.contract_size)).round_dp(2);
        lots.max(self.config.min_lot)
    }

    pub fn progress_report(&self) -> ProgressReport {
        let total_profit = self.current_balance - self.initial_balance;
        let remaining = self.phase_target_amount - total_profit;

        let daily_pnl_pct = if self.daily_start_balance.is_zero() {
            Decimal::ZERO
        } else {
            self.daily_pnl / self.daily_start_balance * dec!(100)
        };

        ProgressReport {
            daily_pnl: self.daily_pnl,
            daily_pnl_pct,
            total_profit,
            target_remaining: remaining.max(Decimal::ZERO),
            trading: self.trading_enabled,
        }
    }
}
