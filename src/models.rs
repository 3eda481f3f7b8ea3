//! Core data models for the gateway

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Chat =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Finalized payload handed to the completion provider
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: f32,
}

//
// ================= Quotes =================
//

/// Static mapping of a symbol to its provider identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMapping {
    pub symbol: &'static str,
    pub primary_id: &'static str,
    pub secondary_address: Option<&'static str>,
}

/// Outcome of one price lookup. Built fresh per request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResult {
    pub symbol: String,
    pub primary_price: Option<f64>,
    pub primary_change_24h: Option<f64>,
    pub secondary_price: Option<f64>,
    pub succeeded: bool,
    pub error_detail: Option<String>,
}

impl QuoteResult {
    pub fn from_primary(symbol: &str, price: f64, change_24h: Option<f64>) -> Self {
        Self {
            symbol: symbol.to_lowercase(),
            primary_price: Some(price),
            primary_change_24h: change_24h,
            secondary_price: None,
            succeeded: true,
            error_detail: None,
        }
    }

    pub fn from_secondary(symbol: &str, price: f64) -> Self {
        Self {
            symbol: symbol.to_lowercase(),
            primary_price: None,
            primary_change_24h: None,
            secondary_price: Some(price),
            succeeded: true,
            error_detail: None,
        }
    }

    /// A failed result always carries its reason
    pub fn failed(symbol: &str, detail: impl Into<String>) -> Self {
        Self {
            symbol: symbol.to_lowercase(),
            primary_price: None,
            primary_change_24h: None,
            secondary_price: None,
            succeeded: false,
            error_detail: Some(detail.into()),
        }
    }

    /// Narrative string injected into prompts, `None` for failed lookups
    pub fn display(&self) -> Option<String> {
        if !self.succeeded {
            return None;
        }

        let symbol = self.symbol.to_uppercase();
        match (self.primary_price, self.secondary_price) {
            (Some(price), _) => Some(match self.primary_change_24h {
                Some(change) => format!(
                    "Current price of {}: {} ({}% 24h)",
                    symbol,
                    format_usd(price),
                    format_signed_percent(change)
                ),
                None => format!("Current price of {}: {}", symbol, format_usd(price)),
            }),
            (None, Some(price)) => Some(format!(
                "Current price of {}: {}",
                symbol,
                format_usd(price)
            )),
            (None, None) => None,
        }
    }
}

/// `$1234.50`
pub fn format_usd(value: f64) -> String {
    format!("${:.2}", value)
}

/// `+2.15` / `-0.40`
pub fn format_signed_percent(value: f64) -> String {
    if value >= 0.0 {
        format!("+{:.2}", value)
    } else {
        format!("{:.2}", value)
    }
}

//
// ================= Images =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub url: String,
    pub prompt_used: String,
}

//
// ================= Posts =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostTier {
    #[default]
    Standard,
    Premium,
}

impl PostTier {
    pub fn from_premium_flag(is_premium: bool) -> Self {
        if is_premium {
            PostTier::Premium
        } else {
            PostTier::Standard
        }
    }

    pub fn max_tokens(&self) -> u32 {
        match self {
            PostTier::Standard => 280,
            PostTier::Premium => 500,
        }
    }
}

impl fmt::Display for PostTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PostTier::Standard => "standard",
            PostTier::Premium => "premium",
        };
        write!(f, "{}", s)
    }
}
