//! Trade Feed Client
//!
//! Polls the public data API for recent fills across the whole exchange.
//! The feed guarantees nothing about ordering; the position builder sorts
//! before replay, and the store deduplicates by trade ID, so polling
//! overlap is harmless.

use crate::types::{RawTrade, TradeSide};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Wire shape of one feed entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TradeEntry {
    #[serde(alias = "transactionHash")]
    id: String,
    #[serde(alias = "proxyWallet")]
    trader: String,
    #[serde(alias = "conditionId")]
    market_id: String,
    side: TradeSide,
    price: f64,
    #[serde(alias = "size")]
    size_usd: f64,
    timestamp: i64,
}

impl TradeEntry {
    fn into_raw(self) -> RawTrade {
        RawTrade {
            id: self.id,
            trader: self.trader,
            market_id: self.market_id,
            side: self.side,
            price: self.price,
            size_usd: self.size_usd,
            timestamp: self.timestamp,
        }
    }
}

/// Client for the public trade feed.
pub struct TradeFeedClient {
    client: Client,
    base_url: String,
    page_limit: usize,
}

impl TradeFeedClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_limit: 500,
        }
    }

    /// Fetch recent trades, optionally only those at or after `since`
    /// (unix seconds).
    pub async fn get_trades(&self, since: Option<i64>) -> Result<Vec<RawTrade>> {
        let mut url = format!("{}/trades?limit={}", self.base_url, self.page_limit);
        if let Some(ts) = since {
            url.push_str(&format!("&timestamp_gte={}", ts));
        }

        let entries: Vec<TradeEntry> = self
            .client
            .get(&url)
            .send()
            .await
            .context("Trade feed request failed")?
            .error_for_status()
            .context("Trade feed returned error status")?
            .json()
            .await
            .context("Failed to parse trade feed response")?;

        debug!(count = entries.len(), since = ?since, "Fetched trades");
        Ok(entries.into_iter().map(TradeEntry::into_raw).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feed_entry() {
        let raw = r#"[{
            "transactionHash": "0xt1",
            "proxyWallet": "0xAbC",
            "conditionId": "m1",
            "side": "BUY",
            "size": 150.5,
            "price": 0.42,
            "timestamp": 1700000000
        }]"#;
        let entries: Vec<TradeEntry> = serde_json::from_str(raw).unwrap();
        let trade = entries.into_iter().next().unwrap().into_raw();

        assert_eq!(trade.id, "0xt1");
        assert_eq!(trade.trader, "0xAbC");
        assert_eq!(trade.side, TradeSide::Buy);
        assert!((trade.size_usd - 150.5).abs() < 1e-9);
        assert_eq!(trade.timestamp, 1_700_000_000);
    }
}
