//! Port traits implemented by the adapters.

pub mod config_port;
pub mod data_port;
pub mod news_port;
pub mod position_port;
pub mod signal_port;
