//! PolyArb - Polymarket arbitrage scanner and trader performance tracker
//!
//! Two independent pipelines share one scheduling loop: the market scanner
//! looks for two-outcome markets priced below 1.0 combined, and the trade
//! feed poller maintains wallet positions and leaderboards. A cycle that
//! hits pervasive upstream failure logs and waits for the next tick; it
//! never takes the process down.

use anyhow::{Context, Result};
use polyarb::client::RestClient;
use polyarb::config::AppConfig;
use polyarb::feed::TradeFeedClient;
use polyarb::markets::KnownMarkets;
use polyarb::performance::{aggregate_performance, top_traders_by_pnl};
use polyarb::persistence::TradeStore;
use polyarb::positions::build_positions;
use polyarb::scanner::{MarketScanner, ScannerConfig};
use polyarb::volume::VolumeHistory;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(config = %config.digest(), "PolyArb starting");

    // Missing credentials are fatal here, before the loop ever starts
    config.validate_env()?;

    let rest = RestClient::new(&config.api.clob_url, None, None, None);
    let feed = TradeFeedClient::new(&config.api.data_url);
    let mut store = TradeStore::open(&config.persistence.data_dir, config.feed.min_trade_size_usd)?;
    let mut known_markets =
        KnownMarkets::load(Path::new(&config.persistence.data_dir).join("known_markets.json"));
    let mut volume_history =
        VolumeHistory::load(Path::new(&config.persistence.data_dir).join("volume_history.json"));

    let scanner = MarketScanner::new(
        RestClient::new(&config.api.clob_url, None, None, None),
        ScannerConfig {
            min_profit_percent: config.scanner.min_profit_percent,
            batch_size: config.scanner.batch_size,
            inter_batch_delay: config.inter_batch_delay(),
            sample_size: config.sample_size(),
        },
    );

    #[cfg(feature = "dashboard")]
    let dashboard = {
        use tracing::error;
        let state = std::sync::Arc::new(polyarb::dashboard::DashboardState::default());
        let router = polyarb::dashboard::create_router(state.clone());
        let addr = config.dashboard.bind_addr.clone();
        tokio::spawn(async move {
            match tokio::net::TcpListener::bind(&addr).await {
                Ok(listener) => {
                    info!(addr = %addr, "Dashboard listening");
                    if let Err(e) = axum::serve(listener, router).await {
                        error!(error = %e, "Dashboard server stopped");
                    }
                }
                Err(e) => error!(addr = %addr, error = %e, "Failed to bind dashboard"),
            }
        });
        state
    };

    let mut scan_tick = tokio::time::interval(Duration::from_secs(
        config.scanner.scan_interval_secs.max(1),
    ));
    let mut feed_tick =
        tokio::time::interval(Duration::from_secs(config.feed.poll_interval_secs.max(1)));
    let mut scan_count: u64 = 0;
    // Live marks per market, refreshed by the scanner for unrealized P&L
    let mut current_prices: HashMap<String, f64> = HashMap::new();

    info!(
        interval = config.scanner.scan_interval_secs,
        "Starting arbitrage scanner"
    );

    loop {
        tokio::select! {
            _ = scan_tick.tick() => {
                scan_count += 1;
                let started = std::time::Instant::now();

                let markets = match rest.get_markets().await {
                    Ok(markets) => markets,
                    Err(e) => {
                        warn!(scan = scan_count, error = %e, "Market fetch failed, retrying next interval");
                        continue;
                    }
                };

                let fresh = known_markets.observe(&markets);
                for market in &fresh {
                    info!(market_id = %market.market_id, question = %market.question, "New market discovered");
                }
                if let Err(e) = known_markets.save() {
                    warn!(error = %e, "Failed to save known markets");
                }

                let spikes = volume_history.observe(&markets, config.scanner.min_spike_multiplier);
                for spike in &spikes {
                    info!(
                        market_id = %spike.market_id,
                        question = %spike.question,
                        multiplier = spike.spike_multiplier,
                        volume_24h = spike.current_volume_24h,
                        average = spike.average_volume,
                        "Volume spike"
                    );
                }
                if let Err(e) = volume_history.save() {
                    warn!(error = %e, "Failed to save volume history");
                }

                let outcome = scanner.scan(&markets).await;

                // Refresh marks for unrealized P&L from the snapshot prices.
                // Positions are keyed by market, not outcome token, so the
                // first outcome's price stands in for the whole market; a
                // position held in the second outcome is marked with it too.
                for market in &markets {
                    if let Some((p1, _)) = market.outcome_prices() {
                        current_prices.insert(market.id.clone(), p1);
                    }
                }

                let mut ranked = outcome.opportunities.clone();
                ranked.sort_by(|a, b| {
                    b.profit_percent
                        .partial_cmp(&a.profit_percent)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                for opp in &ranked {
                    info!(opportunity = %opp, "Arbitrage opportunity");
                }

                info!(
                    scan = scan_count,
                    checked = outcome.markets_checked,
                    skipped = outcome.markets_skipped,
                    opportunities = outcome.opportunities.len(),
                    new_markets = fresh.len(),
                    volume_spikes = spikes.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Scan complete"
                );

                #[cfg(feature = "dashboard")]
                dashboard.record_scan(outcome).await;
            }

            _ = feed_tick.tick() => {
                let since = match store.latest_timestamp() {
                    Ok(ts) => ts,
                    Err(e) => {
                        warn!(error = %e, "Failed to read trade store cursor");
                        None
                    }
                };

                let trades = match feed.get_trades(since).await {
                    Ok(trades) => trades,
                    Err(e) => {
                        warn!(error = %e, "Trade feed poll failed, retrying next interval");
                        continue;
                    }
                };

                match store.append_trades(&trades) {
                    Ok(written) if written > 0 => info!(written, "Stored new trades"),
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "Failed to persist trades"),
                }

                let history = match store.load_trades() {
                    Ok(history) => history,
                    Err(e) => {
                        warn!(error = %e, "Failed to load trade history");
                        continue;
                    }
                };

                let positions = build_positions(&history);
                let performance =
                    aggregate_performance(&history, &positions, Some(&current_prices));

                let min_trades = config.dashboard.leaderboard_min_trades;
                let limit = config.dashboard.leaderboard_limit;
                let by_pnl = top_traders_by_pnl(&performance, min_trades, limit);
                info!(
                    trades = history.len(),
                    wallets = performance.len(),
                    leaders = by_pnl.len(),
                    "Rebuilt trader performance"
                );

                #[cfg(feature = "dashboard")]
                {
                    use polyarb::performance::{top_traders_by_roi, top_traders_by_win_rate};
                    let by_roi = top_traders_by_roi(&performance, min_trades, limit);
                    let by_win_rate = top_traders_by_win_rate(&performance, min_trades, 3, limit);
                    dashboard
                        .record_traders(by_pnl, by_roi, by_win_rate, performance.len())
                        .await;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                if let Err(e) = known_markets.save() {
                    warn!(error = %e, "Failed to save known markets on shutdown");
                }
                if let Err(e) = volume_history.save() {
                    warn!(error = %e, "Failed to save volume history on shutdown");
                }
                break;
            }
        }
    }

    Ok(())
}
