//! Core domain types and logic.

pub mod config_validation;
pub mod driver;
pub mod error;
pub mod execution;
pub mod gate;
pub mod indicator;
pub mod indicator_helpers;
pub mod ohlcv;
pub mod order;
pub mod pipeline;
pub mod position;
pub mod strategy;
pub mod summary;
pub mod universe;
