//! Client Types - Data structures for Polymarket API responses
//!
//! Two upstream shapes are normalized here: CLOB `/markets` entries carrying
//! a `tokens` array with embedded prices, and Gamma-style entries where
//! outcomes, token IDs and prices arrive as JSON-encoded string arrays.
//! Both collapse into the canonical `types::Market`.

use crate::types::{Market, Token};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Order book level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub size: f64,
}

/// Order book for one outcome token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    pub token_id: String,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub timestamp: i64,
}

impl OrderBook {
    /// Normalize raw book levels from a REST snapshot:
    /// - keep only finite positive price/size
    /// - sort bids descending (best first)
    /// - sort asks ascending (best first)
    pub fn normalize_levels(&mut self) {
        self.bids.retain(|level| {
            level.price.is_finite()
                && level.size.is_finite()
                && level.price > 0.0
                && level.size > 0.0
        });
        self.asks.retain(|level| {
            level.price.is_finite()
                && level.size.is_finite()
                && level.price > 0.0
                && level.size > 0.0
        });

        self.bids
            .sort_by(|a, b| b.price.partial_cmp(&a.price).unwrap_or(Ordering::Equal));
        self.asks
            .sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal));
    }

    /// Get best bid (highest price), if the bid side is non-empty.
    pub fn best_bid(&self) -> Option<f64> {
        self.bids
            .iter()
            .map(|level| level.price)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    }

    /// Get best ask (lowest price), if the ask side is non-empty.
    pub fn best_ask(&self) -> Option<f64> {
        self.asks
            .iter()
            .map(|level| level.price)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    }

    /// Midpoint of best bid/ask. An empty side means no price is available.
    pub fn midpoint(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / 2.0),
            _ => None,
        }
    }
}

/// Raw book level as returned by the CLOB (`{"price": "0.45", "size": "100"}`)
#[derive(Debug, Clone, Deserialize)]
pub struct RawBookLevel {
    pub price: String,
    pub size: String,
}

/// CLOB order book response
#[derive(Debug, Clone, Deserialize)]
pub struct OrderBookResponse {
    #[serde(default)]
    pub market: Option<String>,
    pub asset_id: String,
    #[serde(default)]
    pub bids: Vec<RawBookLevel>,
    #[serde(default)]
    pub asks: Vec<RawBookLevel>,
}

fn parse_book_level(price: &str, size: &str) -> Option<BookLevel> {
    let price = price.parse::<f64>().ok()?;
    let size = size.parse::<f64>().ok()?;
    if !price.is_finite() || !size.is_finite() || price <= 0.0 || size <= 0.0 {
        return None;
    }
    Some(BookLevel { price, size })
}

impl OrderBookResponse {
    /// Parse and normalize into an `OrderBook`, dropping unparseable levels.
    pub fn normalize(self, timestamp: i64) -> OrderBook {
        let mut book = OrderBook {
            token_id: self.asset_id,
            bids: self
                .bids
                .into_iter()
                .filter_map(|l| parse_book_level(&l.price, &l.size))
                .collect(),
            asks: self
                .asks
                .into_iter()
                .filter_map(|l| parse_book_level(&l.price, &l.size))
                .collect(),
            timestamp,
        };
        book.normalize_levels();
        book
    }
}

/// Outcome token as embedded in CLOB market responses
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token_id: String,
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Market entry from the CLOB or Gamma APIs.
///
/// The two APIs disagree on field layout; everything is optional or
/// defaulted so one shape deserializes either payload.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketResponse {
    /// Condition ID (CLOB) or market ID (Gamma)
    #[serde(default, alias = "condition_id")]
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub closed: Option<bool>,
    #[serde(default)]
    pub accepting_orders: Option<bool>,
    /// CLOB shape: tokens with embedded prices
    #[serde(default)]
    pub tokens: Vec<TokenResponse>,
    /// Gamma shape: JSON string like "[\"Yes\", \"No\"]"
    #[serde(default, deserialize_with = "deserialize_json_string_opt")]
    pub outcomes: Vec<String>,
    /// Gamma shape: JSON string with token IDs
    #[serde(default, deserialize_with = "deserialize_json_string_opt")]
    pub clob_token_ids: Vec<String>,
    /// Gamma shape: JSON string with outcome prices like "[\"0.12\", \"0.88\"]"
    #[serde(default, deserialize_with = "deserialize_json_string_opt")]
    pub outcome_prices: Vec<String>,
    /// 24h volume; Gamma reports it as a string, CLOB as a number
    #[serde(default, alias = "volume24hr", deserialize_with = "deserialize_f64_opt")]
    pub volume_24hr: Option<f64>,
    /// 7-day volume, same dual encoding
    #[serde(default, alias = "volume1wk", deserialize_with = "deserialize_f64_opt")]
    pub volume_1wk: Option<f64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date_iso: Option<String>,
}

/// Helper to deserialize optional JSON string arrays
fn deserialize_json_string_opt<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) => serde_json::from_str(&s).map_err(serde::de::Error::custom),
        None => Ok(Vec::new()),
    }
}

/// Helper to deserialize a number that may arrive as a JSON string
fn deserialize_f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match opt {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.parse::<f64>().ok(),
        _ => None,
    })
}

impl MarketResponse {
    /// Normalize into the canonical market record.
    ///
    /// Prefers the CLOB token array; falls back to zipping the Gamma-style
    /// parallel arrays. Prices that fail to parse stay `None` so the
    /// scanner resolves them from the order book or skips the market.
    pub fn normalize(self) -> Market {
        let tokens: Vec<Token> = if !self.tokens.is_empty() {
            self.tokens
                .into_iter()
                .map(|t| Token {
                    token_id: t.token_id,
                    outcome: t.outcome,
                    price: t.price.filter(|p| p.is_finite()),
                })
                .collect()
        } else {
            self.outcomes
                .iter()
                .enumerate()
                .map(|(idx, outcome)| Token {
                    token_id: self.clob_token_ids.get(idx).cloned().unwrap_or_default(),
                    outcome: outcome.clone(),
                    price: self
                        .outcome_prices
                        .get(idx)
                        .and_then(|p| p.parse::<f64>().ok())
                        .filter(|p| p.is_finite()),
                })
                .collect()
        };

        Market {
            id: self.id,
            question: self.question,
            active: self.active,
            closed: self.closed.unwrap_or(false),
            accepting_orders: self.accepting_orders.unwrap_or(true),
            tokens,
            volume_24h: self.volume_24hr.filter(|v| v.is_finite()),
            volume_1wk: self.volume_1wk.filter(|v| v.is_finite()),
        }
    }
}

/// Paged CLOB markets response
#[derive(Debug, Clone, Deserialize)]
pub struct MarketsPage {
    #[serde(default)]
    pub data: Vec<MarketResponse>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}
