//! Core domain types and logic.

pub mod breakout;
pub mod config;
pub mod config_validation;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod news;
pub mod ohlcv;
pub mod pipeline;
pub mod position;
pub mod regime;
pub mod risk;
pub mod universe;
