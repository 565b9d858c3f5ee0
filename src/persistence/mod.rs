//! CSV Persistence Module
//!
//! Append-only trade cache keyed by trade ID. This store sits in front of
//! the trade feed so restarts don't lose history; it is never the source of
//! truth for business logic, which always recomputes from the full trade
//! set in memory.

use crate::types::{RawTrade, TradeSide};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Trade row as persisted to CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TradeRow {
    id: String,
    trader: String,
    market_id: String,
    side: String,
    price: f64,
    size_usd: f64,
    timestamp: i64,
}

impl From<&RawTrade> for TradeRow {
    fn from(t: &RawTrade) -> Self {
        Self {
            id: t.id.clone(),
            trader: t.trader.clone(),
            market_id: t.market_id.clone(),
            side: t.side.to_string(),
            price: t.price,
            size_usd: t.size_usd,
            timestamp: t.timestamp,
        }
    }
}

impl TradeRow {
    fn into_trade(self) -> Option<RawTrade> {
        let side = match self.side.as_str() {
            "BUY" => TradeSide::Buy,
            "SELL" => TradeSide::Sell,
            other => {
                warn!(side = other, "Dropping trade row with unknown side");
                return None;
            }
        };
        Some(RawTrade {
            id: self.id,
            trader: self.trader,
            market_id: self.market_id,
            side,
            price: self.price,
            size_usd: self.size_usd,
            timestamp: self.timestamp,
        })
    }
}

/// File-backed trade store.
pub struct TradeStore {
    path: PathBuf,
    /// IDs already on disk, so re-appending the same feed page is a no-op
    known_ids: HashSet<String>,
    /// Trades below this USD size are not persisted (0 disables)
    min_size_usd: f64,
}

impl TradeStore {
    /// Open (or create) a store under `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>, min_size_usd: f64) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;
        let path = data_dir.join("trades.csv");

        let mut store = Self {
            path,
            known_ids: HashSet::new(),
            min_size_usd,
        };
        let existing = store.load_trades()?;
        store.known_ids = existing.into_iter().map(|t| t.id).collect();
        info!(known = store.known_ids.len(), path = %store.path.display(), "Trade store opened");
        Ok(store)
    }

    /// Append trades, skipping duplicates and sub-threshold sizes.
    /// Returns how many rows were written.
    pub fn append_trades(&mut self, trades: &[RawTrade]) -> Result<usize> {
        let fresh: Vec<&RawTrade> = trades
            .iter()
            .filter(|t| t.size_usd >= self.min_size_usd)
            .filter(|t| !self.known_ids.contains(&t.id))
            .collect();

        if fresh.is_empty() {
            return Ok(0);
        }

        let write_header = !self.path.exists()
            || fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let mut writer = WriterBuilder::new().has_headers(write_header).from_writer(file);
        for trade in &fresh {
            writer.serialize(TradeRow::from(*trade))?;
        }
        writer.flush().context("Failed to flush trade store")?;

        for trade in &fresh {
            self.known_ids.insert(trade.id.clone());
        }
        Ok(fresh.len())
    }

    /// Load every stored trade. Unreadable rows are skipped, not fatal.
    pub fn load_trades(&self) -> Result<Vec<RawTrade>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let mut trades = Vec::new();
        for result in reader.deserialize::<TradeRow>() {
            match result {
                Ok(row) => {
                    if let Some(trade) = row.into_trade() {
                        trades.push(trade);
                    }
                }
                Err(e) => warn!(error = %e, "Skipping unreadable trade row"),
            }
        }
        Ok(trades)
    }

    /// Trades of one wallet, case-insensitive.
    pub fn wallet_trades(&self, wallet: &str) -> Result<Vec<RawTrade>> {
        let wallet = wallet.to_lowercase();
        Ok(self
            .load_trades()?
            .into_iter()
            .filter(|t| t.trader.to_lowercase() == wallet)
            .collect())
    }

    /// Trades in one market.
    pub fn market_trades(&self, market_id: &str) -> Result<Vec<RawTrade>> {
        Ok(self
            .load_trades()?
            .into_iter()
            .filter(|t| t.market_id == market_id)
            .collect())
    }

    /// Trades at or above a USD size.
    pub fn trades_above(&self, min_size_usd: f64) -> Result<Vec<RawTrade>> {
        Ok(self
            .load_trades()?
            .into_iter()
            .filter(|t| t.size_usd >= min_size_usd)
            .collect())
    }

    /// Latest stored trade timestamp, used as the feed "since" cursor.
    pub fn latest_timestamp(&self) -> Result<Option<i64>> {
        Ok(self.load_trades()?.iter().map(|t| t.timestamp).max())
    }
}
