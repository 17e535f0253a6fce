pub mod fib;
pub mod guardian;
pub mod series;
pub mod strategy;
pub mod structure;
pub mod types;

pub use fib::FibLevels;
pub use guardian::{ProgressReport, RiskConfig, RiskGuardian, RiskStatus};
pub use series::CandleSeries;
pub use strategy::Strategy;
pub use types::{AccountInfo, Candle, Direction, Position, Swing, SwingKind, TradeSignal, Trend};
