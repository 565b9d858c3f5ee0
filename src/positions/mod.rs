//! Position Builder
//!
//! Replays a raw trade stream chronologically into per-(wallet, market)
//! net positions with a volume-weighted average entry price. Positions are
//! recomputed from scratch on every call; nothing here persists state.
//!
//! Share counts are tracked in USD notional (BUY adds, SELL subtracts),
//! matching the upstream feed which reports dollar size per fill. P&L math
//! downstream relies on that unit convention.

use crate::types::{RawTrade, TradeSide};
use std::collections::HashMap;

/// Position key: lowercased wallet + market ID.
///
/// Trader identity is case-insensitive; folding happens here so trades
/// whose addresses differ only in case collapse into one position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionKey {
    pub wallet: String,
    pub market_id: String,
}

impl PositionKey {
    pub fn new(trader: &str, market_id: &str) -> Self {
        Self {
            wallet: trader.to_lowercase(),
            market_id: market_id.to_string(),
        }
    }
}

/// Net position of one wallet in one market.
#[derive(Debug, Clone)]
pub struct Position {
    /// Lowercased wallet address
    pub wallet: String,
    pub market_id: String,
    /// Positive = net long, negative = net short, in USD notional
    pub net_shares: f64,
    pub total_buy_volume: f64,
    pub total_sell_volume: f64,
    /// Volume-weighted average of BUY fills; SELLs never move it.
    /// Initialized from the first trade's price regardless of side, so a
    /// position opened by a SELL carries that SELL's price as its entry.
    pub avg_entry_price: f64,
    pub last_trade_timestamp: i64,
    pub trade_count: u64,
}

impl Position {
    /// Open positions use a small dead zone so round-tripped positions
    /// with float residue count as closed.
    pub fn is_open(&self) -> bool {
        self.net_shares.abs() > 0.01
    }

    /// Realized P&L of a closed position: sell proceeds minus buy cost.
    pub fn realized_pnl(&self) -> f64 {
        self.total_sell_volume - self.total_buy_volume
    }

    fn open_from(trade: &RawTrade) -> Self {
        let (net, buy, sell) = match trade.side {
            TradeSide::Buy => (trade.size_usd, trade.size_usd, 0.0),
            TradeSide::Sell => (-trade.size_usd, 0.0, trade.size_usd),
        };
        Self {
            wallet: trade.trader.to_lowercase(),
            market_id: trade.market_id.clone(),
            net_shares: net,
            total_buy_volume: buy,
            total_sell_volume: sell,
            avg_entry_price: trade.price,
            last_trade_timestamp: trade.timestamp,
            trade_count: 1,
        }
    }

    fn apply(&mut self, trade: &RawTrade) {
        match trade.side {
            TradeSide::Buy => {
                let new_total = self.total_buy_volume + trade.size_usd;
                self.avg_entry_price = (self.avg_entry_price * self.total_buy_volume
                    + trade.price * trade.size_usd)
                    / new_total;
                self.total_buy_volume = new_total;
                self.net_shares += trade.size_usd;
            }
            TradeSide::Sell => {
                self.total_sell_volume += trade.size_usd;
                self.net_shares -= trade.size_usd;
            }
        }
        self.last_trade_timestamp = trade.timestamp;
        self.trade_count += 1;
    }
}

/// Build positions from a trade history.
///
/// Input order does not matter: trades are stable-sorted ascending by
/// timestamp before replay, so rebuilding from a shuffled feed yields
/// identical positions. Sizes are not validated; the feed collaborator owns
/// that.
pub fn build_positions(trades: &[RawTrade]) -> HashMap<PositionKey, Position> {
    let mut chronological: Vec<&RawTrade> = trades.iter().collect();
    chronological.sort_by_key(|t| t.timestamp);

    let mut positions: HashMap<PositionKey, Position> = HashMap::new();

    for trade in chronological {
        let key = PositionKey::new(&trade.trader, &trade.market_id);
        match positions.get_mut(&key) {
            Some(position) => position.apply(trade),
            None => {
                positions.insert(key, Position::open_from(trade));
            }
        }
    }

    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(id: &str, trader: &str, market: &str, side: TradeSide, price: f64, size: f64, ts: i64) -> RawTrade {
        RawTrade {
            id: id.to_string(),
            trader: trader.to_string(),
            market_id: market.to_string(),
            side,
            price,
            size_usd: size,
            timestamp: ts,
        }
    }

    #[test]
    fn test_weighted_average_entry() {
        let trades = vec![
            trade("t1", "0xA", "m1", TradeSide::Buy, 0.40, 100.0, 1),
            trade("t2", "0xA", "m1", TradeSide::Buy, 0.60, 100.0, 2),
        ];
        let positions = build_positions(&trades);
        let pos = &positions[&PositionKey::new("0xA", "m1")];

        assert!((pos.avg_entry_price - 0.50).abs() < 1e-9);
        assert!((pos.net_shares - 200.0).abs() < 1e-9);
        assert_eq!(pos.trade_count, 2);
    }

    #[test]
    fn test_sell_leaves_entry_price_untouched() {
        let trades = vec![
            trade("t1", "0xA", "m1", TradeSide::Buy, 0.50, 100.0, 1),
            trade("t2", "0xA", "m1", TradeSide::Sell, 0.70, 40.0, 2),
        ];
        let positions = build_positions(&trades);
        let pos = &positions[&PositionKey::new("0xa", "m1")];

        assert!((pos.avg_entry_price - 0.50).abs() < 1e-9);
        assert!((pos.net_shares - 60.0).abs() < 1e-9);
        assert!((pos.total_sell_volume - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_case_insensitive_trader_identity() {
        let trades = vec![
            trade("t1", "0xAbC", "m1", TradeSide::Buy, 0.5, 100.0, 1),
            trade("t2", "0xabc", "m1", TradeSide::Sell, 0.6, 50.0, 2),
        ];
        let positions = build_positions(&trades);

        assert_eq!(positions.len(), 1);
        let pos = &positions[&PositionKey::new("0xABC", "m1")];
        assert!((pos.net_shares - 50.0).abs() < 1e-9);
        assert!((pos.avg_entry_price - 0.5).abs() < 1e-9);
        assert!((pos.total_sell_volume - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_order_invariant_replay() {
        let forward = vec![
            trade("t1", "0xA", "m1", TradeSide::Buy, 0.40, 100.0, 1),
            trade("t2", "0xA", "m1", TradeSide::Buy, 0.60, 50.0, 2),
            trade("t3", "0xA", "m1", TradeSide::Sell, 0.70, 80.0, 3),
        ];
        let mut shuffled = forward.clone();
        shuffled.swap(0, 2);
        shuffled.swap(1, 2);

        let a = build_positions(&forward);
        let b = build_positions(&shuffled);
        let key = PositionKey::new("0xa", "m1");

        assert!((a[&key].avg_entry_price - b[&key].avg_entry_price).abs() < 1e-12);
        assert!((a[&key].net_shares - b[&key].net_shares).abs() < 1e-12);
        assert_eq!(a[&key].trade_count, b[&key].trade_count);
    }

    #[test]
    fn test_sell_first_opens_short_with_sell_price() {
        let trades = vec![trade("t1", "0xA", "m1", TradeSide::Sell, 0.65, 100.0, 1)];
        let positions = build_positions(&trades);
        let pos = &positions[&PositionKey::new("0xa", "m1")];

        assert!((pos.net_shares + 100.0).abs() < 1e-9);
        // Entry price comes from the opening trade even on the SELL side
        assert!((pos.avg_entry_price - 0.65).abs() < 1e-9);
        assert!((pos.total_sell_volume - 100.0).abs() < 1e-9);
        assert_eq!(pos.total_buy_volume, 0.0);
    }

    #[test]
    fn test_positions_split_per_market() {
        let trades = vec![
            trade("t1", "0xA", "m1", TradeSide::Buy, 0.5, 100.0, 1),
            trade("t2", "0xA", "m2", TradeSide::Buy, 0.3, 200.0, 2),
        ];
        let positions = build_positions(&trades);
        assert_eq!(positions.len(), 2);
    }
}
