//! Process-wide gateway configuration
//!
//! Read once from the environment (after `.env` is loaded). Credentials are
//! optional here and only checked when an endpoint needs them.

use crate::error::GatewayError;
use crate::Result;
use std::env;
use std::fmt;

const DEFAULT_PORT: u16 = 8080;

/// Third-party services the gateway talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Language-model completions (Grok)
    Xai,
    /// Image generation (DALL·E)
    OpenAi,
    /// Primary price quotes
    CoinGecko,
    /// Secondary price quotes
    Birdeye,
}

impl Provider {
    /// Environment variable holding the provider credential
    pub fn credential_var(&self) -> &'static str {
        match self {
            Provider::Xai => "GROK_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::CoinGecko => "COINGECKO_API_KEY",
            Provider::Birdeye => "BIRDEYE_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Provider::Xai => "xAI",
            Provider::OpenAi => "OpenAI",
            Provider::CoinGecko => "CoinGecko",
            Provider::Birdeye => "Birdeye",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,

    pub grok_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub coingecko_api_key: Option<String>,
    pub birdeye_api_key: Option<String>,

    pub xai_base_url: String,
    pub openai_base_url: String,
    pub coingecko_base_url: String,
    pub birdeye_base_url: String,

    pub chat_model: String,
    pub image_model: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            grok_api_key: None,
            openai_api_key: None,
            coingecko_api_key: None,
            birdeye_api_key: None,
            xai_base_url: "https://api.x.ai/v1".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            coingecko_base_url: "https://pro-api.coingecko.com/api/v3".to_string(),
            birdeye_base_url: "https://public-api.birdeye.so".to_string(),
            chat_model: "grok-2-latest".to_string(),
            image_model: "dall-e-3".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable              | Default                                 |
    /// |-----------------------|-----------------------------------------|
    /// | `PORT` / `API_PORT`   | `8080`                                  |
    /// | `GROK_API_KEY`        | unset                                   |
    /// | `OPENAI_API_KEY`      | unset                                   |
    /// | `COINGECKO_API_KEY`   | unset                                   |
    /// | `BIRDEYE_API_KEY`     | unset                                   |
    /// | `XAI_BASE_URL`        | `https://api.x.ai/v1`                   |
    /// | `OPENAI_BASE_URL`     | `https://api.openai.com/v1`             |
    /// | `COINGECKO_BASE_URL`  | `https://pro-api.coingecko.com/api/v3`  |
    /// | `BIRDEYE_BASE_URL`    | `https://public-api.birdeye.so`         |
    /// | `GROK_MODEL`          | `grok-2-latest`                         |
    /// | `IMAGE_MODEL`         | `dall-e-3`                              |
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = parse_port(env::var("PORT").or_else(|_| env::var("API_PORT")).ok())?;

        Ok(Self {
            port,
            grok_api_key: credential_from_env(Provider::Xai),
            openai_api_key: credential_from_env(Provider::OpenAi),
            coingecko_api_key: credential_from_env(Provider::CoinGecko),
            birdeye_api_key: credential_from_env(Provider::Birdeye),
            xai_base_url: var_or("XAI_BASE_URL", defaults.xai_base_url),
            openai_base_url: var_or("OPENAI_BASE_URL", defaults.openai_base_url),
            coingecko_base_url: var_or("COINGECKO_BASE_URL", defaults.coingecko_base_url),
            birdeye_base_url: var_or("BIRDEYE_BASE_URL", defaults.birdeye_base_url),
            chat_model: var_or("GROK_MODEL", defaults.chat_model),
            image_model: var_or("IMAGE_MODEL", defaults.image_model),
        })
    }

    pub fn credential(&self, provider: Provider) -> Option<&str> {
        let value = match provider {
            Provider::Xai => &self.grok_api_key,
            Provider::OpenAi => &self.openai_api_key,
            Provider::CoinGecko => &self.coingecko_api_key,
            Provider::Birdeye => &self.birdeye_api_key,
        };
        value.as_deref()
    }

    /// Single validation step run at the top of each handler.
    /// Fails with a configuration error naming the first missing credential.
    pub fn require(&self, providers: &[Provider]) -> Result<()> {
        for provider in providers {
            require_credential(self.credential(*provider), *provider)?;
        }
        Ok(())
    }
}

fn parse_port(raw: Option<String>) -> Result<u16> {
    match raw {
        Some(raw) => raw.trim().parse::<u16>().map_err(|_| GatewayError::InvalidSetting {
            name: "PORT",
            value: raw,
        }),
        None => Ok(DEFAULT_PORT),
    }
}

/// Unwrap a credential or produce the typed configuration error for it
pub fn require_credential(value: Option<&str>, provider: Provider) -> Result<&str> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(GatewayError::Configuration(
            provider.credential_var().to_string(),
        )),
    }
}

fn credential_from_env(provider: Provider) -> Option<String> {
    env::var(provider.credential_var())
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn var_or(name: &str, default: String) -> String {
    env::var(name)
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}
