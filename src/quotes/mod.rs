//! Quote aggregation
//!
//! Looks up a spot price from the primary provider and, for symbols with a
//! secondary address, falls back to the secondary provider. Failures never
//! leave this module: callers always get a `QuoteResult`.

use crate::models::QuoteResult;
use crate::symbols::TokenTable;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

pub mod birdeye;
pub mod coingecko;

pub use birdeye::BirdeyeClient;
pub use coingecko::CoinGeckoClient;

const MAX_ERROR_DETAIL: usize = 200;

/// Short failure detail from a price provider error body.
///
/// Known JSON message fields win; anything else is cut to a bounded snippet.
pub(crate) fn error_detail(body: &str, status: u16) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        [
            v.pointer("/error/message"),
            v.pointer("/status/error_message"),
            v.get("error"),
            v.get("message"),
        ]
        .into_iter()
        .flatten()
        .find_map(Value::as_str)
    });

    let detail = message.unwrap_or(body).trim();
    if detail.is_empty() {
        return format!("HTTP error! status: {}", status);
    }

    match detail.char_indices().nth(MAX_ERROR_DETAIL) {
        Some((cut, _)) => format!("{}...", &detail[..cut]),
        None => detail.to_string(),
    }
}

/// A usable spot price
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub usd: f64,
    pub change_24h: Option<f64>,
}

/// Trait for a single price provider
#[async_trait]
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// `asset_ref` is the provider's own identifier (coin id or token address)
    async fn spot_price(&self, asset_ref: &str) -> Result<PricePoint>;
}

pub struct QuoteAggregator {
    table: Arc<TokenTable>,
    primary: Arc<dyn PriceProvider>,
    secondary: Arc<dyn PriceProvider>,
}

impl QuoteAggregator {
    pub fn new(
        table: Arc<TokenTable>,
        primary: Arc<dyn PriceProvider>,
        secondary: Arc<dyn PriceProvider>,
    ) -> Self {
        Self {
            table,
            primary,
            secondary,
        }
    }

    pub fn table(&self) -> &TokenTable {
        &self.table
    }

    /// Resolve a quote for `symbol`. Primary first; secondary only after the
    /// primary call has failed.
    pub async fn quote(&self, symbol: &str) -> QuoteResult {
        let Some(mapping) = self.table.get(symbol) else {
            warn!(symbol, "Token not found in mapping");
            return QuoteResult::failed(symbol, format!("Token not found in mapping: {}", symbol));
        };

        info!(symbol = mapping.symbol, provider = self.primary.name(), "Fetching price");

        let primary_error = match self.primary.spot_price(mapping.primary_id).await {
            Ok(point) => {
                return QuoteResult::from_primary(mapping.symbol, point.usd, point.change_24h);
            }
            Err(e) => {
                warn!(
                    symbol = mapping.symbol,
                    provider = self.primary.name(),
                    "Primary price lookup failed: {}",
                    e
                );
                format!("{}: {}", self.primary.name(), e)
            }
        };

        let Some(address) = mapping.secondary_address else {
            return QuoteResult::failed(mapping.symbol, primary_error);
        };

        info!(symbol = mapping.symbol, provider = self.secondary.name(), "Falling back to secondary price provider");

        match self.secondary.spot_price(address).await {
            Ok(point) => QuoteResult::from_secondary(mapping.symbol, point.usd),
            Err(e) => {
                warn!(
                    symbol = mapping.symbol,
                    provider = self.secondary.name(),
                    "Secondary price lookup failed: {}",
                    e
                );
                QuoteResult::failed(
                    mapping.symbol,
                    format!(
                        "Failed to fetch price from both providers ({}; {}: {})",
                        primary_error,
                        self.secondary.name(),
                        e
                    ),
                )
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::error::GatewayError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Price provider returning a fixed answer and counting calls
    pub struct MockPriceProvider {
        pub name: &'static str,
        pub answer: Option<PricePoint>,
        pub calls: AtomicUsize,
    }

    impl MockPriceProvider {
        pub fn ok(name: &'static str, usd: f64, change_24h: Option<f64>) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer: Some(PricePoint { usd, change_24h }),
                calls: AtomicUsize::new(0),
            })
        }

        pub fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer: None,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceProvider for MockPriceProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn spot_price(&self, _asset_ref: &str) -> Result<PricePoint> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
                .ok_or_else(|| GatewayError::Quote(format!("{} unavailable", self.name)))
        }
    }
}
