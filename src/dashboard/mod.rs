//! Dashboard Module
//!
//! Provides a polling HTTP API for monitoring scan results and trader
//! leaderboards. Only compiled when the `dashboard` feature is enabled.
//! The dashboard consumes the core's output structures as plain data;
//! nothing here feeds back into scoring or aggregation.

mod api;
mod types;

pub use api::create_router;
pub use types::*;

use crate::performance::WalletPerformance;
use crate::scanner::ScanOutcome;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// In-memory state for the dashboard API, written by the scan loop.
#[derive(Debug, Default)]
pub struct DashboardState {
    /// Latest scan results
    pub scan: RwLock<ScanSnapshot>,
    /// Latest wallet leaderboards
    pub traders: RwLock<TradersSnapshot>,
}

#[derive(Debug, Clone, Default)]
pub struct ScanSnapshot {
    pub outcome: ScanOutcome,
    pub scan_count: u64,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct TradersSnapshot {
    pub by_pnl: Vec<WalletPerformance>,
    pub by_roi: Vec<WalletPerformance>,
    pub by_win_rate: Vec<WalletPerformance>,
    pub wallets_tracked: usize,
    pub last_update: Option<DateTime<Utc>>,
}

impl DashboardState {
    /// Record a completed scan cycle.
    pub async fn record_scan(&self, outcome: ScanOutcome) {
        let mut scan = self.scan.write().await;
        scan.scan_count += 1;
        scan.outcome = outcome;
        scan.last_update = Some(Utc::now());
    }

    /// Record refreshed leaderboards.
    pub async fn record_traders(
        &self,
        by_pnl: Vec<WalletPerformance>,
        by_roi: Vec<WalletPerformance>,
        by_win_rate: Vec<WalletPerformance>,
        wallets_tracked: usize,
    ) {
        let mut traders = self.traders.write().await;
        traders.by_pnl = by_pnl;
        traders.by_roi = by_roi;
        traders.by_win_rate = by_win_rate;
        traders.wallets_tracked = wallets_tracked;
        traders.last_update = Some(Utc::now());
    }
}
