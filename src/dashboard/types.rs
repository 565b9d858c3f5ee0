//! Dashboard response types

use crate::performance::WalletPerformance;
use crate::types::{ArbitrageOpportunity, MarketCheck};
use serde::Serialize;

/// Generic API response envelope
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// GET /api/signals payload
#[derive(Debug, Clone, Serialize)]
pub struct SignalsResponse {
    pub opportunities: Vec<ArbitrageOpportunity>,
    pub closest: Vec<MarketCheck>,
    pub markets_checked: usize,
    pub markets_skipped: usize,
    pub scan_count: u64,
    pub last_update: Option<String>,
}

/// GET /api/traders payload
#[derive(Debug, Clone, Serialize)]
pub struct TradersResponse {
    pub by_pnl: Vec<WalletPerformance>,
    pub by_roi: Vec<WalletPerformance>,
    pub by_win_rate: Vec<WalletPerformance>,
    pub wallets_tracked: usize,
    pub last_update: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_carries_no_data() {
        let resp = ApiResponse::<()>::error("no such endpoint");
        assert!(!resp.success);
        assert!(resp.data.is_none());
        assert_eq!(resp.error.as_deref(), Some("no such endpoint"));
    }

    #[test]
    fn test_success_envelope_carries_no_error() {
        let resp = ApiResponse::success(42);
        assert!(resp.success);
        assert_eq!(resp.data, Some(42));
        assert!(resp.error.is_none());
    }
}
