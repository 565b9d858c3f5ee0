//! Tests for the arbitrage scanning pipeline

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;
    use polyarb::client::ClientError;
    use polyarb::scanner::score::{check_market, score};
    use polyarb::scanner::{MarketDataSource, MarketScanner, ScannerConfig};
    use polyarb::types::{Market, Token};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Stub price source: canned prices, optional failures, call recording.
    /// Clones share state so tests can inspect calls after handing the
    /// source to the scanner.
    #[derive(Clone)]
    struct StubSource {
        inner: Arc<StubInner>,
    }

    struct StubInner {
        prices: HashMap<String, f64>,
        failing: Vec<String>,
        calls: AtomicUsize,
        call_log: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn new(prices: &[(&str, f64)], failing: &[&str]) -> Self {
            Self {
                inner: Arc::new(StubInner {
                    prices: prices.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                    failing: failing.iter().map(|s| s.to_string()).collect(),
                    calls: AtomicUsize::new(0),
                    call_log: Mutex::new(Vec::new()),
                }),
            }
        }

        fn calls(&self) -> usize {
            self.inner.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataSource for StubSource {
        async fn token_price(&self, token_id: &str) -> Result<Option<f64>, ClientError> {
            self.inner.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.call_log.lock().unwrap().push(token_id.to_string());
            if self.inner.failing.iter().any(|t| t == token_id) {
                return Err(ClientError::NotFound(token_id.to_string()));
            }
            Ok(self.inner.prices.get(token_id).copied())
        }
    }

    fn market(id: &str, p1: Option<f64>, p2: Option<f64>) -> Market {
        Market {
            id: id.to_string(),
            question: format!("Question {}?", id),
            active: true,
            closed: false,
            accepting_orders: true,
            tokens: vec![
                Token {
                    token_id: format!("{}-a", id),
                    outcome: "Yes".to_string(),
                    price: p1,
                },
                Token {
                    token_id: format!("{}-b", id),
                    outcome: "No".to_string(),
                    price: p2,
                },
            ],
            volume_24h: None,
            volume_1wk: None,
        }
    }

    fn config() -> ScannerConfig {
        ScannerConfig {
            inter_batch_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    // ========================================================================
    // Scorer properties
    // ========================================================================

    #[test]
    fn test_combined_at_or_above_one_never_scores() {
        for (p1, p2) in [(0.5, 0.5), (0.6, 0.55), (0.9, 0.4), (1.0, 0.0001)] {
            let check = check_market("m1", "q", p1, p2, Utc::now()).unwrap();
            assert!(
                score(&check, 0.0).is_none(),
                "{} + {} must not score",
                p1,
                p2
            );
        }
    }

    #[test]
    fn test_threshold_gates_thin_edges() {
        let check = check_market("m1", "q", 0.499, 0.500, Utc::now()).unwrap();
        assert!(score(&check, 0.5).is_none());
        assert!(score(&check, 0.05).is_some());
    }

    // ========================================================================
    // Batch scanner
    // ========================================================================

    #[tokio::test]
    async fn test_concrete_two_market_scenario() {
        // m1: 0.45 + 0.50 = 0.95 -> 5.26% opportunity
        // m2: 0.60 + 0.55 = 1.15 -> no opportunity, still ranked
        let scanner = MarketScanner::new(StubSource::new(&[], &[]), config());
        let markets = vec![
            market("m1", Some(0.45), Some(0.50)),
            market("m2", Some(0.60), Some(0.55)),
        ];

        let outcome = scanner.scan(&markets).await;

        assert_eq!(outcome.opportunities.len(), 1);
        let opp = &outcome.opportunities[0];
        assert_eq!(opp.market_id, "m1");
        assert!((opp.combined_price - 0.95).abs() < 1e-9);
        assert!((opp.profit_percent - 5.2632).abs() < 1e-3);

        // Both markets appear in closest, m1 first
        assert_eq!(outcome.closest.len(), 2);
        assert_eq!(outcome.closest[0].market_id, "m1");
        assert_eq!(outcome.closest[1].market_id, "m2");
    }

    #[tokio::test]
    async fn test_every_market_checked_exactly_once() {
        let n = 23;
        let prices: Vec<(String, f64)> = (0..n)
            .flat_map(|i| {
                [
                    (format!("m{}-a", i), 0.60),
                    (format!("m{}-b", i), 0.55),
                ]
            })
            .collect();
        let prices_ref: Vec<(&str, f64)> =
            prices.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        let source = StubSource::new(&prices_ref, &[]);
        let scanner = MarketScanner::new(
            source.clone(),
            ScannerConfig {
                batch_size: 5,
                ..config()
            },
        );
        let markets: Vec<Market> = (0..n)
            .map(|i| market(&format!("m{}", i), None, None))
            .collect();

        let outcome = scanner.scan(&markets).await;

        assert_eq!(outcome.markets_checked, n);
        // Two token lookups per market, each market in exactly one batch
        assert_eq!(source.calls(), 2 * n);

        // The first batch only ever touches the first five markets
        let log = source.inner.call_log.lock().unwrap();
        assert!(log
            .iter()
            .take(10)
            .all(|t| (0..5).any(|i| t.starts_with(&format!("m{}-", i)))));
    }

    #[tokio::test]
    async fn test_single_failure_keeps_the_rest_of_the_batch() {
        let scanner = MarketScanner::new(
            StubSource::new(
                &[
                    ("m0-a", 0.45),
                    ("m0-b", 0.50),
                    ("m2-a", 0.30),
                    ("m2-b", 0.40),
                ],
                &["m1-a"],
            ),
            ScannerConfig {
                batch_size: 3,
                ..config()
            },
        );
        let markets = vec![
            market("m0", None, None),
            market("m1", None, None),
            market("m2", None, None),
        ];

        let outcome = scanner.scan(&markets).await;

        assert_eq!(outcome.markets_checked, 2);
        assert_eq!(outcome.markets_skipped, 1);
        assert_eq!(outcome.opportunities.len(), 2);
        let ids: Vec<&str> = outcome
            .opportunities
            .iter()
            .map(|o| o.market_id.as_str())
            .collect();
        assert!(ids.contains(&"m0") && ids.contains(&"m2"));
    }

    #[tokio::test]
    async fn test_closest_length_and_ordering() {
        let scanner = MarketScanner::new(StubSource::new(&[], &[]), config());

        // 3 markets checked -> closest has 3 entries
        let markets = vec![
            market("m1", Some(0.60), Some(0.55)),
            market("m2", Some(0.50), Some(0.52)),
            market("m3", Some(0.70), Some(0.50)),
        ];
        let outcome = scanner.scan(&markets).await;
        assert_eq!(outcome.closest.len(), 3);
        assert_eq!(outcome.closest[0].market_id, "m2");

        // 7 markets -> capped at 5, ascending
        let markets: Vec<Market> = (0..7)
            .map(|i| market(&format!("m{}", i), Some(0.50 + 0.01 * i as f64), Some(0.55)))
            .collect();
        let outcome = scanner.scan(&markets).await;
        assert_eq!(outcome.closest.len(), 5);
        for pair in outcome.closest.windows(2) {
            assert!(pair[0].combined_price <= pair[1].combined_price);
        }
    }

    #[tokio::test]
    async fn test_below_threshold_market_still_ranked() {
        let scanner = MarketScanner::new(StubSource::new(&[], &[]), config());
        // 0.499 + 0.500 = 0.999: under 1.0 but ~0.1% profit misses 0.5%
        let markets = vec![market("m1", Some(0.499), Some(0.500))];

        let outcome = scanner.scan(&markets).await;
        assert!(outcome.opportunities.is_empty());
        assert_eq!(outcome.closest.len(), 1);
        assert_eq!(outcome.closest[0].market_id, "m1");
    }

    #[tokio::test]
    async fn test_scan_is_idempotent() {
        let scanner = MarketScanner::new(StubSource::new(&[], &[]), config());
        let markets = vec![
            market("m1", Some(0.45), Some(0.50)),
            market("m2", Some(0.60), Some(0.55)),
        ];

        let first = scanner.scan(&markets).await;
        let second = scanner.scan(&markets).await;

        assert_eq!(first.opportunities.len(), second.opportunities.len());
        assert_eq!(first.markets_checked, second.markets_checked);
        let ids = |o: &polyarb::scanner::ScanOutcome| {
            o.closest
                .iter()
                .map(|c| c.market_id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
    }
}
