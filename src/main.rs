//! Bastion - prop-firm evaluation trading system
//!
//! Trend-following fib retracement entries with a hard daily-loss
//! gate. One sequential poll loop over all configured symbols; the
//! broker is either a live MT5 bridge or a seeded simulation.

use std::time::Duration;

use anyhow::Result;
use rust_decimal_macros::dec;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use bastion::broker::mt5::Mt5Bridge;
use bastion::broker::sim::SimBroker;
use bastion::broker::Broker;
use bastion::config::Config;
use bastion::core::{RiskGuardian, Strategy};
use bastion::engine::{Engine, EngineConfig};

const SEP: &str = "===========================================================";

/// Live mode first, simulation as the fallback path
async fn select_broker(cfg: &Config) -> (Box<dyn Broker>, bool) {
    if cfg.broker.mode == "live" {
        let mut bridge = Mt5Bridge::new(
            cfg.broker.bridge_host.clone(),
            cfg.broker.bridge_port,
            Duration::from_secs(cfg.broker.io_timeout_secs),
        );
        match bridge.connect().await {
            Ok(()) => {
                info!(
                    "Broker: MT5 bridge at {}:{}",
                    cfg.broker.bridge_host, cfg.broker.bridge_port
                );
                return (Box::new(bridge), false);
            }
            Err(e) => {
                warn!("MT5 bridge unavailable: {e:#}. Falling back to simulation.");
            }
        }
    }

    let sim = SimBroker::new(
        &cfg.trading.symbols,
        cfg.initial_balance(),
        cfg.broker.sim_seed,
    );
    info!("Broker: simulation (seed {})", cfg.broker.sim_seed);
    (Box::new(sim), true)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::load("config.toml").unwrap_or_else(|e| {
        eprintln!("Failed to load config.toml: {}. Using defaults.", e);
        Config::default()
    });

    let level = match cfg.system.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{}", SEP);
    info!("  {} - Prop-Firm Evaluation Trading System", cfg.system.name);
    info!(
        "  Phase {} | target {:.0}% | daily loss limit {:.0}%",
        cfg.risk.phase,
        cfg.phase_target_pct() * dec!(100),
        cfg.risk.max_daily_loss_pct * 100.0
    );
    info!("{}", SEP);

    let (broker, simulation) = select_broker(&cfg).await;

    let mut guardian = RiskGuardian::new(cfg.risk_config(), cfg.initial_balance());
    match broker.get_account().await {
        Ok(account) => {
            info!(
                "Account: ${:.2} balance, ${:.2} equity",
                account.balance, account.equity
            );
            guardian.reset_day(account.balance);
        }
        Err(e) => {
            warn!("Initial account fetch failed: {e:#}. Starting from configured balance.");
            guardian.reset_day(cfg.initial_balance());
        }
    }

    let strategy = Strategy::new(cfg.trading.sma_period, cfg.trading.swing_window);
    let engine_cfg: EngineConfig = cfg.engine_config(simulation);

    info!(
        "Symbols: {} | timeframe {} | SMA {} | swing window {}",
        cfg.trading.symbols.join(", "),
        cfg.trading.timeframe,
        cfg.trading.sma_period,
        cfg.trading.swing_window
    );

    let mut engine = Engine::new(broker, guardian, strategy, engine_cfg);

    tokio::select! {
        result = engine.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
    }
}
