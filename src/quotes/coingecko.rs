//! CoinGecko simple-price client (primary quotes)

use super::{error_detail, PricePoint, PriceProvider};
use crate::config::{require_credential, Provider};
use crate::error::GatewayError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

pub struct CoinGeckoClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoClient {
    fn name(&self) -> &'static str {
        "CoinGecko"
    }

    async fn spot_price(&self, coin_id: &str) -> Result<PricePoint> {
        let api_key = require_credential(self.api_key.as_deref(), Provider::CoinGecko)?;
        let url = format!("{}/simple/price", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ids", coin_id),
                ("vs_currencies", "usd"),
                ("include_24hr_change", "true"),
            ])
            .header("x-cg-pro-api-key", api_key)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                error!("CoinGecko request failed: {}", e);
                GatewayError::Quote(format!("CoinGecko request failed: {}", e))
            })?;

        let status = response.status();
        debug!(status = status.as_u16(), "CoinGecko response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Provider {
                provider: "CoinGecko",
                status: status.as_u16(),
                message: error_detail(&body, status.as_u16()),
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            GatewayError::Quote(format!("CoinGecko returned invalid JSON: {}", e))
        })?;

        parse_simple_price(&body, coin_id)
    }
}

/// `{"solana": {"usd": 172.3, "usd_24h_change": 2.1}}`
fn parse_simple_price(body: &Value, coin_id: &str) -> Result<PricePoint> {
    let entry = body.get(coin_id);
    let usd = entry
        .and_then(|e| e.get("usd"))
        .and_then(Value::as_f64)
        .ok_or_else(|| GatewayError::Quote(format!("CoinGecko has no USD price for {}", coin_id)))?;

    let change_24h = entry
        .and_then(|e| e.get("usd_24h_change"))
        .and_then(Value::as_f64);

    Ok(PricePoint { usd, change_24h })
}
