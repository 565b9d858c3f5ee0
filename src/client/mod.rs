//! Upstream API clients
//!
//! HTTP access to the Polymarket CLOB plus normalization of its payload
//! shapes into the canonical `types::Market` record.

pub mod rest;
pub mod types;

pub use rest::RestClient;
pub use types::{BookLevel, MarketResponse, OrderBook};

use thiserror::Error;

/// Client-side error taxonomy.
///
/// `Transport`, `RateLimited` and `NotFound` are transient: the scanner
/// treats the affected market as "no price available" and moves on.
/// `Malformed` covers unparseable upstream data and gets the same
/// skip-and-continue handling.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rate limited by upstream")]
    RateLimited,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ClientError {
    /// Transient failures are recovered locally by skipping the market.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(_) | ClientError::RateLimited | ClientError::NotFound(_)
        )
    }
}
