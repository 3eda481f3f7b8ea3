//! Image generation
//!
//! Prompts are screened against a static blocklist and wrapped in a fixed
//! photorealism template before being sent to the OpenAI images endpoint.

use crate::completion::ProviderErrorBody;
use crate::config::{require_credential, Provider};
use crate::error::{GatewayError, DEFAULT_RETRY_AFTER};
use crate::models::GeneratedImage;
use crate::Result;
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};

/// Any match replaces the whole prompt
const BLOCKED_TERMS: &[&str] = &[
    "nude", "naked", "nsfw", "porn", "explicit", "adult", "xxx", "sexual",
    "violence", "gore", "blood", "death",
];

pub const SAFE_FALLBACK_PROMPT: &str = "Generate a safe, creative artistic image";

const PROVIDER: &str = "OpenAI";

/// Replace blocked prompts wholesale, otherwise wrap in the style template
pub fn sanitize_prompt(input: &str) -> String {
    let lowered = input.to_lowercase();

    if BLOCKED_TERMS.iter().any(|term| lowered.contains(term)) {
        warn!("Image prompt matched blocklist, substituting safe prompt");
        return SAFE_FALLBACK_PROMPT.to_string();
    }

    format!(
        "Create a highly detailed, photorealistic image with the following description: {}.\n\
         Focus on creating a lifelike scene with natural lighting, accurate textures, and proper proportions.\n\
         Pay attention to subtle details that make the image feel authentic and real.\n\
         Avoid any artificial or computer-generated appearance.\n\
         Ensure the composition is visually appealing and the elements are well-balanced.",
        input.trim()
    )
}

/// Seam between request handlers and the image provider.
/// Receives the already-sanitized prompt and returns the hosted image URL.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Sanitize `user_input` and submit it
pub async fn generate_image(provider: &dyn ImageProvider, user_input: &str) -> Result<GeneratedImage> {
    let prompt = sanitize_prompt(user_input);
    let url = provider.generate(&prompt).await?;

    Ok(GeneratedImage {
        url,
        prompt_used: prompt,
    })
}

pub struct OpenAiImageClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiImageClient {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    quality: &'a str,
    style: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

#[async_trait]
impl ImageProvider for OpenAiImageClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = require_credential(self.api_key.as_deref(), Provider::OpenAi)?;
        let url = format!("{}/images/generations", self.base_url);

        let request = ImageRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: "1024x1024",
            quality: "hd",
            style: "natural",
        };

        info!(model = %self.model, "Calling OpenAI images API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI images request failed: {}", e);
                GatewayError::HttpError(e)
            })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            error!(status = status.as_u16(), "OpenAI images error response: {}", body);
            return Err(map_failure(status, retry_after, &body));
        }

        let parsed: ImageResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse OpenAI images response: {}", e);
            GatewayError::InvalidResponse(PROVIDER)
        })?;

        parsed
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .filter(|u| !u.is_empty())
            .ok_or(GatewayError::InvalidResponse(PROVIDER))
    }
}

/// Rate limit and content policy get their own variants; the rest is a
/// generic provider error
fn map_failure(status: StatusCode, retry_after: Option<String>, body: &str) -> GatewayError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return GatewayError::RateLimited {
            retry_after: retry_after.unwrap_or_else(|| DEFAULT_RETRY_AFTER.to_string()),
        };
    }

    let detail = serde_json::from_str::<ProviderErrorBody>(body)
        .ok()
        .and_then(|b| b.error);

    if detail.as_ref().and_then(|d| d.code.as_deref()) == Some("content_policy_violation") {
        return GatewayError::ContentPolicy;
    }

    let message = detail
        .and_then(|d| d.message)
        .or_else(|| {
            serde_json::from_str::<Value>(body)
                .ok()
                .map(|v| v.to_string())
        })
        .unwrap_or_else(|| format!("DALL·E API error: {}", status.as_u16()));

    GatewayError::Provider {
        provider: PROVIDER,
        status: status.as_u16(),
        message,
    }
}
