//! Birdeye token price client (secondary quotes)

use super::{error_detail, PricePoint, PriceProvider};
use crate::config::{require_credential, Provider};
use crate::error::GatewayError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

pub struct BirdeyeClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl BirdeyeClient {
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

#[derive(Debug, Deserialize)]
struct BirdeyeResponse {
    #[serde(default)]
    success: bool,
    data: Option<BirdeyeData>,
}

#[derive(Debug, Deserialize)]
struct BirdeyeData {
    value: Option<f64>,
}

#[async_trait]
impl PriceProvider for BirdeyeClient {
    fn name(&self) -> &'static str {
        "Birdeye"
    }

    async fn spot_price(&self, address: &str) -> Result<PricePoint> {
        let api_key = require_credential(self.api_key.as_deref(), Provider::Birdeye)?;
        let url = format!("{}/public/price", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("address", address)])
            .header("x-api-key", api_key)
            .send()
            .await
            .map_err(|e| {
                error!("Birdeye request failed: {}", e);
                GatewayError::Quote(format!("Birdeye request failed: {}", e))
            })?;

        let status = response.status();
        debug!(status = status.as_u16(), "Birdeye response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Provider {
                provider: "Birdeye",
                status: status.as_u16(),
                message: error_detail(&body, status.as_u16()),
            });
        }

        let body: BirdeyeResponse = response.json().await.map_err(|e| {
            GatewayError::Quote(format!("Birdeye returned invalid JSON: {}", e))
        })?;

        usable_price(body, address)
    }
}

fn usable_price(body: BirdeyeResponse, address: &str) -> Result<PricePoint> {
    match (body.success, body.data.and_then(|d| d.value)) {
        (true, Some(usd)) => Ok(PricePoint {
            usd,
            change_24h: None,
        }),
        _ => Err(GatewayError::Quote(format!(
            "Birdeye has no price for {}",
            address
        ))),
    }
}
