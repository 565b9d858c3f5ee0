//! Performance Aggregator
//!
//! Rolls per-position state up to per-wallet metrics: volume, trade counts,
//! realized and unrealized P&L, win rate, ROI. Pure over its inputs; each
//! wallet's stats come only from that wallet's own trades and positions.

use crate::positions::{Position, PositionKey};
use crate::types::RawTrade;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Aggregated performance of one wallet.
#[derive(Debug, Clone, Serialize)]
pub struct WalletPerformance {
    pub wallet: String,
    pub total_volume: f64,
    pub total_trades: u64,
    pub active_positions: u64,
    pub closed_positions: u64,
    pub winning_positions: u64,
    pub unrealized_pnl: f64,
    pub realized_pnl: f64,
    pub total_pnl: f64,
    /// Percent of closed positions that were profitable
    pub win_rate: f64,
    pub avg_trade_size: f64,
    /// Largest open position by absolute net shares
    pub largest_position: f64,
    pub last_activity_timestamp: i64,
    pub profit_per_trade: f64,
    /// total_pnl / total_volume as a percentage
    pub roi: f64,
}

/// Compute wallet performance from trades and their derived positions.
///
/// `current_prices` maps market ID to a live mark for valuing open
/// positions. When a market has no mark, the position's own entry price is
/// used, which makes its unrealized contribution zero; that conservative
/// fallback is intentional.
pub fn aggregate_performance(
    trades: &[RawTrade],
    positions: &HashMap<PositionKey, Position>,
    current_prices: Option<&HashMap<String, f64>>,
) -> Vec<WalletPerformance> {
    // Group positions by wallet (keys are already lowercased)
    let mut wallet_positions: HashMap<&str, Vec<&Position>> = HashMap::new();
    for position in positions.values() {
        wallet_positions
            .entry(position.wallet.as_str())
            .or_default()
            .push(position);
    }

    let mut performance = Vec::with_capacity(wallet_positions.len());

    for (wallet, positions) in wallet_positions {
        let wallet_trades: Vec<&RawTrade> = trades
            .iter()
            .filter(|t| t.trader.to_lowercase() == wallet)
            .collect();

        let total_volume: f64 = wallet_trades.iter().map(|t| t.size_usd).sum();
        let total_trades = wallet_trades.len() as u64;
        let avg_trade_size = if total_trades > 0 {
            total_volume / total_trades as f64
        } else {
            0.0
        };
        let last_activity_timestamp = wallet_trades
            .iter()
            .map(|t| t.timestamp)
            .max()
            .unwrap_or(0);

        let mut unrealized_pnl = 0.0;
        let mut realized_pnl = 0.0;
        let mut active_positions = 0u64;
        let mut closed_positions = 0u64;
        let mut winning_positions = 0u64;
        let mut largest_position = 0.0f64;

        for position in positions {
            if position.is_open() {
                active_positions += 1;
                largest_position = largest_position.max(position.net_shares.abs());

                let mark = current_prices
                    .and_then(|prices| prices.get(&position.market_id).copied())
                    .unwrap_or(position.avg_entry_price);
                unrealized_pnl += (mark - position.avg_entry_price) * position.net_shares;
            } else {
                closed_positions += 1;
                let pnl = position.realized_pnl();
                realized_pnl += pnl;
                if pnl > 0.0 {
                    winning_positions += 1;
                }
            }
        }

        let total_pnl = unrealized_pnl + realized_pnl;
        let win_rate = if closed_positions > 0 {
            (winning_positions as f64 / closed_positions as f64) * 100.0
        } else {
            0.0
        };
        let roi = if total_volume > 0.0 {
            (total_pnl / total_volume) * 100.0
        } else {
            0.0
        };
        let profit_per_trade = if total_trades > 0 {
            total_pnl / total_trades as f64
        } else {
            0.0
        };

        performance.push(WalletPerformance {
            wallet: wallet.to_string(),
            total_volume,
            total_trades,
            active_positions,
            closed_positions,
            winning_positions,
            unrealized_pnl,
            realized_pnl,
            total_pnl,
            win_rate,
            avg_trade_size,
            largest_position,
            last_activity_timestamp,
            profit_per_trade,
            roi,
        });
    }

    performance
}

fn sort_desc_by<F>(mut wallets: Vec<WalletPerformance>, key: F) -> Vec<WalletPerformance>
where
    F: Fn(&WalletPerformance) -> f64,
{
    wallets.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
    wallets
}

/// Top traders by total P&L.
///
/// Wallets with nothing to show (zero P&L and no closed positions) are
/// filtered out along with low-activity wallets.
pub fn top_traders_by_pnl(
    performance: &[WalletPerformance],
    min_trades: u64,
    limit: usize,
) -> Vec<WalletPerformance> {
    let eligible: Vec<WalletPerformance> = performance
        .iter()
        .filter(|p| p.total_trades >= min_trades)
        .filter(|p| p.total_pnl != 0.0 || p.closed_positions > 0)
        .cloned()
        .collect();

    let mut ranked = sort_desc_by(eligible, |p| p.total_pnl);
    ranked.truncate(limit);
    ranked
}

/// Top traders by ROI.
pub fn top_traders_by_roi(
    performance: &[WalletPerformance],
    min_trades: u64,
    limit: usize,
) -> Vec<WalletPerformance> {
    let eligible: Vec<WalletPerformance> = performance
        .iter()
        .filter(|p| p.total_trades >= min_trades)
        .cloned()
        .collect();

    let mut ranked = sort_desc_by(eligible, |p| p.roi);
    ranked.truncate(limit);
    ranked
}

/// Top traders by win rate; also requires a minimum number of closed
/// positions so a single lucky exit doesn't top the board.
pub fn top_traders_by_win_rate(
    performance: &[WalletPerformance],
    min_trades: u64,
    min_closed_positions: u64,
    limit: usize,
) -> Vec<WalletPerformance> {
    let eligible: Vec<WalletPerformance> = performance
        .iter()
        .filter(|p| p.total_trades >= min_trades && p.closed_positions >= min_closed_positions)
        .cloned()
        .collect();

    let mut ranked = sort_desc_by(eligible, |p| p.win_rate);
    ranked.truncate(limit);
    ranked
}
