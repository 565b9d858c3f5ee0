//! Market Scanner
//!
//! Iterates the market universe in fixed-size batches, resolves the
//! two-outcome price pair per market, and scores each against the profit
//! threshold. All checks within one batch run as concurrent tasks so the
//! network round-trips overlap; the inter-batch delay exists purely to be
//! polite to upstream rate limits and can be zeroed for tests.

pub mod score;

use crate::client::{ClientError, RestClient};
use crate::types::{ArbitrageOpportunity, Market, MarketCheck};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Number of "closest to arbitrage" markets reported per scan.
const CLOSEST_LIMIT: usize = 5;

/// Price source seam for the scanner.
///
/// Implemented by `RestClient` in production; tests supply stubs.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Midpoint price for a token; `Ok(None)` when no price is available.
    async fn token_price(&self, token_id: &str) -> Result<Option<f64>, ClientError>;
}

#[async_trait]
impl MarketDataSource for RestClient {
    async fn token_price(&self, token_id: &str) -> Result<Option<f64>, ClientError> {
        self.get_token_price(token_id).await
    }
}

/// Scanner tuning knobs.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Minimum profit percent for an opportunity (default 0.5)
    pub min_profit_percent: f64,
    /// Markets checked concurrently per batch
    pub batch_size: usize,
    /// Politeness delay between batches; not a correctness requirement
    pub inter_batch_delay: Duration,
    /// When set, only the first N tradeable markets are examined
    pub sample_size: Option<usize>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_profit_percent: 0.5,
            batch_size: 10,
            inter_batch_delay: Duration::from_millis(100),
            sample_size: None,
        }
    }
}

/// Result of one scan cycle.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Markets clearing the threshold, in encounter order (caller may re-sort)
    pub opportunities: Vec<ArbitrageOpportunity>,
    /// Up to 5 checks with the lowest combined price, sorted ascending
    pub closest: Vec<MarketCheck>,
    /// Markets that produced a check
    pub markets_checked: usize,
    /// Non-tradeable, malformed, or unpriceable markets
    pub markets_skipped: usize,
}

/// Batch scanner over a market universe.
pub struct MarketScanner<S: MarketDataSource> {
    source: S,
    config: ScannerConfig,
}

impl<S: MarketDataSource> MarketScanner<S> {
    pub fn new(source: S, config: ScannerConfig) -> Self {
        Self { source, config }
    }

    /// Scan the given markets for arbitrage.
    ///
    /// Non-tradeable or non-binary markets are excluded up front and only
    /// counted. A failure while pricing one market records no check for it
    /// and never aborts the batch or the scan.
    pub async fn scan(&self, markets: &[Market]) -> ScanOutcome {
        let total = markets.len();
        let mut eligible: Vec<&Market> = markets
            .iter()
            .filter(|m| m.is_tradeable() && m.tokens.len() == 2)
            .collect();

        if let Some(sample) = self.config.sample_size {
            // Debug/rate-limit mode: input order preserved, then truncated
            eligible.truncate(sample);
        }

        let mut skipped = total - eligible.len().min(total);
        let batch_count = eligible.len().div_ceil(self.config.batch_size.max(1));
        debug!(
            total,
            eligible = eligible.len(),
            batches = batch_count,
            "Starting scan"
        );

        let mut checks: Vec<MarketCheck> = Vec::new();
        let mut opportunities = Vec::new();

        let batches: Vec<&[&Market]> = eligible.chunks(self.config.batch_size.max(1)).collect();
        let last_batch = batches.len().saturating_sub(1);

        for (batch_idx, batch) in batches.iter().enumerate() {
            // Concurrent fan-out; results collected positionally
            let results = join_all(batch.iter().map(|m| self.check_market(m))).await;

            for check in results.into_iter() {
                match check {
                    Some(check) => {
                        if let Some(opp) = score::score(&check, self.config.min_profit_percent) {
                            info!(market_id = %opp.market_id, profit_percent = opp.profit_percent, "Arbitrage found");
                            opportunities.push(opp);
                        }
                        checks.push(check);
                    }
                    None => skipped += 1,
                }
            }

            if batch_idx < last_batch && !self.config.inter_batch_delay.is_zero() {
                tokio::time::sleep(self.config.inter_batch_delay).await;
            }
        }

        let markets_checked = checks.len();

        // Stable sort: ties keep encounter order
        checks.sort_by(|a, b| {
            a.combined_price
                .partial_cmp(&b.combined_price)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        checks.truncate(CLOSEST_LIMIT);

        ScanOutcome {
            opportunities,
            closest: checks,
            markets_checked,
            markets_skipped: skipped,
        }
    }

    /// Resolve both outcome prices for one market and build its check.
    ///
    /// Uses snapshot prices when present, otherwise the order book midpoint.
    async fn check_market(&self, market: &Market) -> Option<MarketCheck> {
        let (price_1, price_2) = match market.outcome_prices() {
            Some(pair) => pair,
            None => {
                let p1 = self.resolve_price(market, 0).await?;
                let p2 = self.resolve_price(market, 1).await?;
                (p1, p2)
            }
        };

        score::check_market(&market.id, &market.question, price_1, price_2, Utc::now())
    }

    async fn resolve_price(&self, market: &Market, idx: usize) -> Option<f64> {
        let token = market.tokens.get(idx)?;
        if let Some(price) = token.price {
            return Some(price);
        }
        match self.source.token_price(&token.token_id).await {
            Ok(Some(price)) => Some(price),
            Ok(None) => {
                debug!(market_id = %market.id, token_id = %token.token_id, "No price on book, skipping market");
                None
            }
            Err(e) => {
                warn!(market_id = %market.id, token_id = %token.token_id, error = %e, "Price lookup failed, skipping market");
                None
            }
        }
    }
}
