//! CLOB REST API Client
//!
//! Handles HTTP communication with the Polymarket CLOB API. Public market
//! data endpoints work unauthenticated; when L2 API credentials are
//! configured every request is signed the way the CLOB expects
//! (HMAC-SHA256 over timestamp + method + path + body).

use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, StatusCode,
};
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{MarketsPage, OrderBook, OrderBookResponse};
use super::ClientError;
use crate::types::Market;

/// Cursor value the CLOB returns on the final page.
const END_CURSOR: &str = "LTE=";
/// Hard cap on pages per market listing, to bound a scan cycle.
const MAX_MARKET_PAGES: usize = 50;

/// REST API client for the Polymarket CLOB
pub struct RestClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    api_secret: Option<String>,
    api_passphrase: Option<String>,
}

impl RestClient {
    /// Create a new REST client
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        api_secret: Option<String>,
        api_passphrase: Option<String>,
    ) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            api_secret,
            api_passphrase,
        }
    }

    fn resolve_env(var_names: &[&str]) -> Option<String> {
        for var in var_names {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    return Some(value);
                }
            }
        }
        None
    }

    fn auth_tuple(&self) -> Result<(String, String, String)> {
        let api_key = self
            .api_key
            .clone()
            .or_else(|| Self::resolve_env(&["CLOB_API_KEY", "POLY_API_KEY"]))
            .context("CLOB_API_KEY not configured for authenticated CLOB requests")?;
        let api_secret = self
            .api_secret
            .clone()
            .or_else(|| Self::resolve_env(&["CLOB_API_SECRET", "POLY_API_SECRET"]))
            .context("CLOB_API_SECRET not configured for authenticated CLOB requests")?;
        let api_passphrase = self
            .api_passphrase
            .clone()
            .or_else(|| Self::resolve_env(&["CLOB_API_PASSPHRASE", "POLY_API_PASSPHRASE"]))
            .context("CLOB_API_PASSPHRASE not configured for authenticated CLOB requests")?;
        Ok((api_key, api_secret, api_passphrase))
    }

    /// Whether L2 credentials are available (constructor args or environment).
    pub fn has_credentials(&self) -> bool {
        self.auth_tuple().is_ok()
    }

    fn build_l2_headers(&self, method: &str, request_path: &str, body: &str) -> Result<HeaderMap> {
        let (api_key, api_secret, api_passphrase) = self.auth_tuple()?;

        let timestamp = Utc::now().timestamp().to_string();
        let message = format!(
            "{}{}{}{}",
            timestamp,
            method.to_uppercase(),
            request_path,
            body
        );

        let secret_bytes = general_purpose::URL_SAFE_NO_PAD
            .decode(&api_secret)
            .or_else(|_| general_purpose::URL_SAFE.decode(&api_secret))
            .context("Failed to decode CLOB_API_SECRET as url-safe base64")?;

        type HmacSha256 = Hmac<Sha256>;
        let mut mac = HmacSha256::new_from_slice(&secret_bytes)
            .context("Failed to initialize HMAC for CLOB signature")?;
        mac.update(message.as_bytes());
        let signature = general_purpose::URL_SAFE.encode(mac.finalize().into_bytes());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "POLY_SIGNATURE",
            HeaderValue::from_str(&signature).context("Invalid POLY_SIGNATURE header value")?,
        );
        headers.insert(
            "POLY_TIMESTAMP",
            HeaderValue::from_str(&timestamp).context("Invalid POLY_TIMESTAMP header value")?,
        );
        headers.insert(
            "POLY_API_KEY",
            HeaderValue::from_str(&api_key).context("Invalid POLY_API_KEY header value")?,
        );
        headers.insert(
            "POLY_PASSPHRASE",
            HeaderValue::from_str(&api_passphrase)
                .context("Invalid POLY_PASSPHRASE header value")?,
        );
        Ok(headers)
    }

    /// GET a CLOB path, signing the request when credentials are configured.
    async fn get(&self, path: &str) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url);

        if self.has_credentials() {
            match self.build_l2_headers("GET", path, "") {
                Ok(headers) => request = request.headers(headers),
                Err(e) => warn!(error = %e, "Failed to sign request, sending unauthenticated"),
            }
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => Err(ClientError::RateLimited),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(path.to_string())),
            status if status.is_success() => Ok(response),
            status => Err(ClientError::Malformed(format!(
                "unexpected status {} for {}",
                status, path
            ))),
        }
    }

    /// Fetch the full market universe, following pagination cursors.
    ///
    /// Individual page failures after the first page terminate pagination
    /// with whatever was collected so far; a scan over a partial universe
    /// beats a failed cycle.
    pub async fn get_markets(&self) -> Result<Vec<Market>, ClientError> {
        let mut markets = Vec::new();
        let mut cursor: Option<String> = None;

        for page_idx in 0..MAX_MARKET_PAGES {
            let path = match &cursor {
                Some(c) => format!("/markets?next_cursor={}", c),
                None => "/markets".to_string(),
            };

            let page: MarketsPage = match self.get(&path).await {
                Ok(response) => response
                    .json()
                    .await
                    .map_err(|e| ClientError::Malformed(e.to_string()))?,
                Err(e) if page_idx > 0 && e.is_transient() => {
                    warn!(page = page_idx, error = %e, "Market page fetch failed, stopping pagination");
                    break;
                }
                Err(e) => return Err(e),
            };

            let page_len = page.data.len();
            markets.extend(page.data.into_iter().map(|m| m.normalize()));
            debug!(page = page_idx, page_len, total = markets.len(), "Fetched market page");

            match page.next_cursor {
                Some(next) if next != END_CURSOR && page_len > 0 => cursor = Some(next),
                _ => break,
            }
        }

        Ok(markets)
    }

    /// Fetch the order book for one outcome token.
    pub async fn get_order_book(&self, token_id: &str) -> Result<OrderBook, ClientError> {
        let path = format!("/book?token_id={}", token_id);
        let response: OrderBookResponse = self
            .get(&path)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Malformed(e.to_string()))?;
        Ok(response.normalize(Utc::now().timestamp()))
    }

    /// Midpoint price for a token from its order book.
    ///
    /// `Ok(None)` means the book has an empty side, so no price exists;
    /// the caller skips the market rather than inventing a quote.
    pub async fn get_token_price(&self, token_id: &str) -> Result<Option<f64>, ClientError> {
        let book = self.get_order_book(token_id).await?;
        Ok(book.midpoint())
    }
}
