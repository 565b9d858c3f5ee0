//! Opportunity Scorer
//!
//! Pure arbitrage math over a resolved two-outcome price pair. Under
//! efficient pricing the two outcomes sum to 1.0; a combined price below
//! 1.0 pays the gap once per share at resolution.
//!
//! No I/O and no logging here; narration belongs to the scanning loop.

use crate::types::{ArbitrageOpportunity, MarketCheck};
use chrono::{DateTime, Utc};

/// Build the per-market check record from a resolved price pair.
///
/// Returns `None` when the pair cannot be scored at all: non-finite input
/// or a combined price of zero, where profit percent is undefined.
pub fn check_market(
    market_id: &str,
    question: &str,
    price_1: f64,
    price_2: f64,
    now: DateTime<Utc>,
) -> Option<MarketCheck> {
    if !price_1.is_finite() || !price_2.is_finite() {
        return None;
    }

    let combined_price = price_1 + price_2;
    if combined_price <= 0.0 {
        return None;
    }

    let profit_per_share = 1.0 - combined_price;
    let profit_percent = (profit_per_share / combined_price) * 100.0;

    Some(MarketCheck {
        market_id: market_id.to_string(),
        question: question.to_string(),
        price_1,
        price_2,
        combined_price,
        profit_per_share,
        profit_percent,
        timestamp: now,
    })
}

/// Apply the profit threshold to a check.
///
/// A combined price below 1.0 is necessary but not sufficient; the implied
/// profit percent must also clear `min_profit_percent`.
pub fn score(check: &MarketCheck, min_profit_percent: f64) -> Option<ArbitrageOpportunity> {
    if check.combined_price >= 1.0 {
        return None;
    }
    if check.profit_percent < min_profit_percent {
        return None;
    }

    Some(ArbitrageOpportunity {
        market_id: check.market_id.clone(),
        question: check.question.clone(),
        price_1: check.price_1,
        price_2: check.price_2,
        combined_price: check.combined_price,
        profit_per_share: check.profit_per_share,
        profit_percent: check.profit_percent,
        timestamp: check.timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(p1: f64, p2: f64) -> Option<MarketCheck> {
        check_market("m1", "Will it rain?", p1, p2, Utc::now())
    }

    #[test]
    fn test_opportunity_below_one() {
        let c = check(0.45, 0.50).unwrap();
        let opp = score(&c, 0.5).expect("5.26% should clear 0.5% threshold");

        assert!((opp.combined_price - 0.95).abs() < 1e-9);
        assert!((opp.profit_per_share - 0.05).abs() < 1e-9);
        assert!((opp.profit_percent - 5.263157).abs() < 1e-3);
    }

    #[test]
    fn test_no_opportunity_at_or_above_one() {
        let c = check(0.50, 0.50).unwrap();
        assert!(score(&c, 0.5).is_none());

        let c = check(0.60, 0.55).unwrap();
        assert!(score(&c, 0.5).is_none());
        // The check itself still carries the combined price for ranking
        assert!((c.combined_price - 1.15).abs() < 1e-9);
    }

    #[test]
    fn test_below_one_but_under_threshold() {
        // combined 0.999 -> ~0.1% profit, below a 0.5% threshold
        let c = check(0.499, 0.500).unwrap();
        assert!(c.combined_price < 1.0);
        assert!(score(&c, 0.5).is_none());
        // A zero threshold accepts it
        assert!(score(&c, 0.0).is_some());
    }

    #[test]
    fn test_zero_combined_price_rejected() {
        assert!(check(0.0, 0.0).is_none());
    }

    #[test]
    fn test_non_finite_prices_rejected() {
        assert!(check(f64::NAN, 0.5).is_none());
        assert!(check(0.5, f64::INFINITY).is_none());
    }
}
