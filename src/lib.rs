//! PolyArb Library
//!
//! Arbitrage scanner and trader-performance tracker for Polymarket

pub mod client;
pub mod config;
pub mod feed;
pub mod markets;
pub mod performance;
pub mod persistence;
pub mod positions;
pub mod scanner;
pub mod types;
pub mod volume;

#[cfg(feature = "dashboard")]
pub mod dashboard;
