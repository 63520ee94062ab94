//! Chat-gateway abstractions (Discord today).

pub mod filter;
pub mod port;
pub mod types;
