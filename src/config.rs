//! Configuration loader
//!
//! All tunables live in `config.toml`; every field has a default so a
//! minimal file (or an empty one) still yields a runnable simulation
//! setup. Percentages are stored as fractions (0.04 = 4%).

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::core::guardian::RiskConfig;
use crate::engine::EngineConfig;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub risk: RiskSettings,
    #[serde(default)]
    pub broker: BrokerConfig,
}

#[derive(Debug, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Status snapshot file; empty string disables it
    #[serde(default = "default_status_file")]
    pub status_file: String,
}

fn default_name() -> String {
    "bastion".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_status_file() -> String {
    "bastion_status.json".to_string()
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            status_file: default_status_file(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TradingConfig {
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// M1, M5, M15, M30, H1, H4 or D1
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    /// Candles retained per symbol
    #[serde(default = "default_history_len")]
    pub history_len: usize,
    #[serde(default = "default_sma_period")]
    pub sma_period: usize,
    #[serde(default = "default_swing_window")]
    pub swing_window: usize,
    /// Minimum reward-to-risk aimed for by the fib targets
    #[serde(default = "default_risk_reward")]
    pub risk_reward: f64,
}

fn default_symbols() -> Vec<String> {
    ["EURUSD", "GBPUSD", "USDJPY", "XAUUSD"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_timeframe() -> String {
    "M15".to_string()
}

fn default_history_len() -> usize {
    500
}

fn default_sma_period() -> usize {
    200
}

fn default_swing_window() -> usize {
    5
}

fn default_risk_reward() -> f64 {
    2.0
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            timeframe: default_timeframe(),
            history_len: default_history_len(),
            sma_period: default_sma_period(),
            swing_window: default_swing_window(),
            risk_reward: default_risk_reward(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RiskSettings {
    #[serde(default = "default_initial_balance")]
    pub initial_balance: f64,
    /// Evaluation phase, 1 or 2
    #[serde(default = "default_phase")]
    pub phase: u8,
    #[serde(default = "default_target_phase_1")]
    pub target_phase_1: f64,
    #[serde(default = "default_target_phase_2")]
    pub target_phase_2: f64,
    #[serde(default = "default_max_daily_loss_pct")]
    pub max_daily_loss_pct: f64,
    #[serde(default = "default_daily_target_pct")]
    pub daily_target_pct: f64,
    #[serde(default = "default_risk_per_trade_pct")]
    pub risk_per_trade_pct: f64,
    #[serde(default = "default_contract_size")]
    pub contract_size: f64,
    #[serde(default = "default_min_lot")]
    pub min_lot: f64,
    #[serde(default = "default_min_stop_distance")]
    pub min_stop_distance: f64,
}

fn default_initial_balance() -> f64 {
    100000.0
}

fn default_phase() -> u8 {
    1
}

fn default_target_phase_1() -> f64 {
    0.10
}

fn default_target_phase_2() -> f64 {
    0.05
}

fn default_max_daily_loss_pct() -> f64 {
    0.04
}

fn default_daily_target_pct() -> f64 {
    0.02
}

fn default_risk_per_trade_pct() -> f64 {
    0.01
}

fn default_contract_size() -> f64 {
    100000.0
}

fn default_min_lot() -> f64 {
    0.01
}

fn default_min_stop_distance() -> f64 {
    0.0001
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            initial_balance: default_initial_balance(),
            phase: default_phase(),
            target_phase_1: default_target_phase_1(),
            target_phase_2: default_target_phase_2(),
            max_daily_loss_pct: default_max_daily_loss_pct(),
            daily_target_pct: default_daily_target_pct(),
            risk_per_trade_pct: default_risk_per_trade_pct(),
            contract_size: default_contract_size(),
            min_lot: default_min_lot(),
            min_stop_distance: default_min_stop_distance(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BrokerConfig {
    /// "live" tries the MT5 bridge and falls back to simulation;
    /// "sim" goes straight to the virtual broker
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_bridge_host")]
    pub bridge_host: String,
    #[serde(default = "default_bridge_port")]
    pub bridge_port: u16,
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,
    #[serde(default = "default_live_poll_secs")]
    pub live_poll_secs: u64,
    #[serde(default = "default_sim_poll_secs")]
    pub sim_poll_secs: u64,
    #[serde(default = "default_sim_seed")]
    pub sim_seed: u64,
}

fn default_mode() -> String {
    "sim".to_string()
}

fn default_bridge_host() -> String {
    "127.0.0.1".to_string()
}

fn default_bridge_port() -> u16 {
    9090
}

fn default_io_timeout_secs() -> u64 {
    5
}

fn default_live_poll_secs() -> u64 {
    10
}

fn default_sim_poll_secs() -> u64 {
    2
}

fn default_sim_seed() -> u64 {
    0
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            bridge_host: default_bridge_host(),
            bridge_port: default_bridge_port(),
            io_timeout_secs: default_io_timeout_secs(),
            live_poll_secs: default_live_poll_secs(),
            sim_poll_secs: default_sim_poll_secs(),
            sim_seed: default_sim_seed(),
        }
    }
}

/// TOML floats come in as f64; money goes through the string route so
/// 0.04 stays exactly 0.04
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_str(&value.to_string()).unwrap_or(Decimal::ZERO)
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Phase target fraction for the configured phase
    pub fn phase_target_pct(&self) -> Decimal {
        if self.risk.phase == 1 {
            to_decimal(self.risk.target_phase_1)
        } else {
            to_decimal(self.risk.target_phase_2)
        }
    }

    pub fn initial_balance(&self) -> Decimal {
        to_decimal(self.risk.initial_balance)
    }

    pub fn risk_config(&self) -> RiskConfig {
        RiskConfig {
            max_daily_loss_pct: to_decimal(self.risk.max_daily_loss_pct),
            daily_target_pct: to_decimal(self.risk.daily_target_pct),
            phase_target_pct: self.phase_target_pct(),
            risk_per_trade_pct: to_decimal(self.risk.risk_per_trade_pct),
            contract_size: to_decimal(self.risk.contract_size),
            min_lot: to_decimal(self.risk.min_lot),
            min_stop_distance: to_decimal(self.risk.min_stop_distance),
        }
    }

    pub fn engine_config(&self, simulation: bool) -> EngineConfig {
        let poll_secs = if simulation {
            self.broker.sim_poll_secs
        } else {
            self.broker.live_poll_secs
        };

        let status_path = if self.system.status_file.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.system.status_file))
        };

        EngineConfig {
            symbols: self.trading.symbols.clone(),
            timeframe: self.trading.timeframe.clone(),
            history_len: self.trading.history_len,
            sma_period: self.trading.sma_period,
            poll_interval: Duration::from_secs(poll_secs),
            account_retry: Duration::from_secs(5),
            status_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.trading.sma_period, 200);
        assert_eq!(config.trading.swing_window, 5);
        assert_eq!(config.trading.symbols.len(), 4);
        assert_eq!(config.risk.phase, 1);
        assert_eq!(config.broker.mode, "sim");
    }

    #[test]
    fn test_phase_selects_target() {
        let mut config = Config::default();
        assert_eq!(config.phase_target_pct(), dec!(0.10));

        config.risk.phase = 2;
        assert_eq!(config.phase_target_pct(), dec!(0.05));
    }

    #[test]
    fn test_risk_config_is_exact() {
        let config = Config::default();
        let risk = config.risk_config();

        assert_eq!(risk.max_daily_loss_pct, dec!(0.04));
        assert_eq!(risk.risk_per_trade_pct, dec!(0.01));
        assert_eq!(risk.min_stop_distance, dec!(0.0001));
        assert_eq!(risk.contract_size, dec!(100000));
    }

    #[test]
    fn test_partial_toml_overrides() {
        let toml = r#"
            [trading]
            symbols = ["EURUSD"]
            sma_period = 50

            [broker]
            mode = "live"
            bridge_port = 9191
        "#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.trading.symbols, vec!["EURUSD".to_string()]);
        assert_eq!(config.trading.sma_period, 50);
        assert_eq!(config.broker.mode, "live");
        assert_eq!(config.broker.bridge_port, 9191);
        // Untouched sections keep their defaults
        assert_eq!(config.risk.initial_balance, 100000.0);
    }
}
