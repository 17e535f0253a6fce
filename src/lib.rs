//! Bastion: automated trading for funded-account evaluations.
//!
//! The crate splits into three layers. `core` holds the pure market
//! logic: candle series, trend and swing detection, fib retracements,
//! the signal strategy and the risk guardian. `broker` abstracts order
//! routing behind an async trait with a live MT5 bridge client and a
//! deterministic simulator. `engine` drives the poll cycle that ties
//! them together.

pub mod broker;
pub mod config;
pub mod core;
pub mod engine;
pub mod status;
