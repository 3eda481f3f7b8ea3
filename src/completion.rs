//! xAI chat-completions client
//!
//! Forwards a finalized message list to the language model and returns the
//! completion text. Uses a long-lived reqwest::Client for connection pooling.

use crate::config::{require_credential, Provider};
use crate::error::GatewayError;
use crate::models::{CompletionRequest, Role};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

const PROVIDER: &str = "xAI";

/// Seam between request handlers and the language-model provider
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Reusable xAI client (connection-pooled)
pub struct XaiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl XaiClient {
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

#[async_trait]
impl CompletionProvider for XaiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let api_key = require_credential(self.api_key.as_deref(), Provider::Xai)?;
        let url = format!("{}/chat/completions", self.base_url);

        let body = XaiRequest {
            model: &self.model,
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        info!(
            model = %self.model,
            messages = body.messages.len(),
            max_tokens = ?request.max_tokens,
            "Calling xAI API"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("xAI API request failed: {}", e);
                GatewayError::HttpError(e)
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "xAI API error response: {}", error_text);
            return Err(GatewayError::Provider {
                provider: PROVIDER,
                status: status.as_u16(),
                message: provider_error_message(&error_text, status.as_u16()),
            });
        }

        let xai_response: XaiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse xAI response: {}", e);
            GatewayError::InvalidResponse(PROVIDER)
        })?;

        let content = completion_text(xai_response).ok_or_else(|| {
            error!("xAI response has no completion content");
            GatewayError::InvalidResponse(PROVIDER)
        })?;

        info!(chars = content.len(), "xAI completion received");

        Ok(content)
    }
}

/// `error.message` from the provider body, else a status-only description
fn provider_error_message(body: &str, status: u16) -> String {
    serde_json::from_str::<ProviderErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP error! status: {}", status))
}

fn completion_text(response: XaiResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.is_empty())
}

#[derive(Debug, Serialize)]
struct XaiRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct XaiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderErrorBody {
    pub error: Option<ProviderErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderErrorDetail {
    pub message: Option<String>,
    pub code: Option<String>,
}
