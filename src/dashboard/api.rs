//! Dashboard HTTP API
//!
//! REST endpoints plus a small auto-refreshing HTML page.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::types::*;
use super::DashboardState;

/// Create the API router with all endpoints
pub fn create_router(state: Arc<DashboardState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/signals", get(get_signals))
        .route("/api/traders", get(get_traders))
        .fallback(not_found)
        .with_state(state)
        // CORS so the page can be served from elsewhere during development
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// GET /api/signals - latest scan results
async fn get_signals(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    let scan = state.scan.read().await.clone();
    Json(ApiResponse::success(SignalsResponse {
        opportunities: scan.outcome.opportunities,
        closest: scan.outcome.closest,
        markets_checked: scan.outcome.markets_checked,
        markets_skipped: scan.outcome.markets_skipped,
        scan_count: scan.scan_count,
        last_update: scan.last_update.map(|t| t.to_rfc3339()),
    }))
}

/// GET /api/traders - latest leaderboards
async fn get_traders(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    let traders = state.traders.read().await.clone();
    Json(ApiResponse::success(TradersResponse {
        by_pnl: traders.by_pnl,
        by_roi: traders.by_roi,
        by_win_rate: traders.by_win_rate,
        wallets_tracked: traders.wallets_tracked,
        last_update: traders.last_update.map(|t| t.to_rfc3339()),
    }))
}

/// GET / - minimal polling dashboard
async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

/// Unknown routes get the same envelope as everything else
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("no such endpoint")),
    )
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>PolyArb Signals</title>
  <style>
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
           background: #0a0e27; color: #e0e0e0; padding: 20px; }
    .container { max-width: 1200px; margin: 0 auto; }
    h1 { margin-bottom: 10px; }
    h2 { margin: 24px 0 8px; font-size: 1.1em; color: #9aa4d2; }
    table { width: 100%; border-collapse: collapse; background: #1a1f3a;
            border: 1px solid #2a3154; border-radius: 8px; }
    th, td { padding: 8px 12px; text-align: left; border-bottom: 1px solid #2a3154; }
    th { color: #667eea; }
    .meta { color: #7a82ab; font-size: 0.9em; margin-bottom: 8px; }
  </style>
</head>
<body>
  <div class="container">
    <h1>PolyArb Signals</h1>
    <div class="meta" id="meta">loading…</div>
    <h2>Arbitrage opportunities</h2>
    <table><thead><tr><th>Market</th><th>Combined</th><th>Profit %</th></tr></thead>
      <tbody id="opps"></tbody></table>
    <h2>Closest to arbitrage</h2>
    <table><thead><tr><th>Market</th><th>Combined</th><th>Profit %</th></tr></thead>
      <tbody id="closest"></tbody></table>
    <h2>Top traders by P&amp;L</h2>
    <table><thead><tr><th>Wallet</th><th>P&amp;L</th><th>ROI %</th><th>Win %</th><th>Trades</th></tr></thead>
      <tbody id="traders"></tbody></table>
  </div>
  <script>
    function row(cells) {
      return '<tr>' + cells.map(c => '<td>' + c + '</td>').join('') + '</tr>';
    }
    async function refresh() {
      const signals = (await (await fetch('/api/signals')).json()).data;
      const traders = (await (await fetch('/api/traders')).json()).data;
      document.getElementById('meta').textContent =
        'scan #' + signals.scan_count + ' · checked ' + signals.markets_checked +
        ' · skipped ' + signals.markets_skipped + ' · ' + (signals.last_update || 'never');
      document.getElementById('opps').innerHTML = signals.opportunities.map(o =>
        row([o.question, o.combined_price.toFixed(4), o.profit_percent.toFixed(2)])).join('');
      document.getElementById('closest').innerHTML = signals.closest.map(c =>
        row([c.question, c.combined_price.toFixed(4), c.profit_percent.toFixed(2)])).join('');
      document.getElementById('traders').innerHTML = traders.by_pnl.map(t =>
        row([t.wallet, t.total_pnl.toFixed(2), t.roi.toFixed(2),
             t.win_rate.toFixed(1), t.total_trades])).join('');
    }
    refresh();
    setInterval(refresh, 10000);
  </script>
</body>
</html>
"#;
