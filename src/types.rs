//! Core types used throughout PolyArb
//!
//! Canonical data model shared by the scanner and the trader-performance
//! pipeline. Upstream payload shapes live in `client::types` and are
//! normalized into these records at the API boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single outcome token of a market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Opaque CLOB token ID
    pub token_id: String,
    /// Outcome label ("Yes"/"No", "Up"/"Down", or arbitrary names)
    pub outcome: String,
    /// Last known price in [0, 1]; `None` means unknown, resolve from the
    /// order book or skip the market
    pub price: Option<f64>,
}

/// Canonical market record, normalized from upstream payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Condition/question ID
    pub id: String,
    /// Question/title
    pub question: String,
    /// Active status
    pub active: bool,
    /// Closed status
    pub closed: bool,
    /// Whether the CLOB is accepting orders
    pub accepting_orders: bool,
    /// Ordered outcome tokens; arbitrage scoring applies only when len == 2
    pub tokens: Vec<Token>,
    /// 24-hour traded volume in USD, when the API reports it
    pub volume_24h: Option<f64>,
    /// 7-day traded volume in USD, when the API reports it
    pub volume_1wk: Option<f64>,
}

impl Market {
    /// A market can be scanned only while it is live on the book.
    pub fn is_tradeable(&self) -> bool {
        self.active && !self.closed && self.accepting_orders
    }

    /// Both outcome token prices, when the market is binary and both resolve.
    pub fn outcome_prices(&self) -> Option<(f64, f64)> {
        if self.tokens.len() != 2 {
            return None;
        }
        match (self.tokens[0].price, self.tokens[1].price) {
            (Some(p1), Some(p2)) if p1.is_finite() && p2.is_finite() => Some((p1, p2)),
            _ => None,
        }
    }
}

/// One market examined by the scanner, threshold applied or not.
///
/// Kept for every successfully priced market so the loop can report the
/// markets closest to arbitrage even when nothing qualifies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketCheck {
    pub market_id: String,
    pub question: String,
    pub price_1: f64,
    pub price_2: f64,
    pub combined_price: f64,
    pub profit_per_share: f64,
    pub profit_percent: f64,
    pub timestamp: DateTime<Utc>,
}

/// A market whose combined outcome price clears the profit threshold.
///
/// Immutable once created; only materialized when
/// `combined_price < 1.0` and `profit_percent >= min_profit_percent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    pub market_id: String,
    pub question: String,
    pub price_1: f64,
    pub price_2: f64,
    pub combined_price: f64,
    pub profit_per_share: f64,
    pub profit_percent: f64,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for ArbitrageOpportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.4} + {:.4} = {:.4} (profit {:.4}/share, {:.2}%)",
            self.market_id,
            self.price_1,
            self.price_2,
            self.combined_price,
            self.profit_per_share,
            self.profit_percent
        )
    }
}

/// Trade side from the public trade feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Raw trade from the public feed.
///
/// No ordering guarantee on ingestion; the position builder sorts by
/// timestamp before replay. Trader addresses are compared case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTrade {
    /// Unique trade ID (dedup key in the store)
    pub id: String,
    /// Wallet address of the trader
    pub trader: String,
    /// Market (condition) ID
    pub market_id: String,
    /// BUY or SELL
    pub side: TradeSide,
    /// Fill price in [0, 1]
    pub price: f64,
    /// Trade size in USD notional
    pub size_usd: f64,
    /// Unix timestamp in seconds
    pub timestamp: i64,
}
