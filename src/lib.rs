//! btscreener: breakout screener and trade-lifecycle driver.
//!
//! Hexagonal architecture: indicators, the trade state machine and the
//! per-symbol pipeline live in [`domain`], port traits in [`ports`], concrete
//! implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
