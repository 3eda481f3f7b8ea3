//! Error types for the SnapyX gateway

use axum::http::StatusCode;
use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

pub const CONTENT_POLICY_MESSAGE: &str =
    "The image couldn't be generated due to content policy restrictions. Please try a different prompt.";

pub const DEFAULT_RETRY_AFTER: &str = "60";

#[derive(Error, Debug)]
pub enum GatewayError {

    // =============================
    // Configuration
    // =============================

    #[error("{0} not configured")]
    Configuration(String),

    #[error("Invalid {name}: {value:?}")]
    InvalidSetting { name: &'static str, value: String },

    // =============================
    // Input Validation
    // =============================

    #[error("{0}")]
    InvalidInput(String),

    #[error("Financial advice is strictly prohibited.")]
    AdviceBlocked,

    // =============================
    // Upstream Providers
    // =============================

    #[error("{provider} error ({status}): {message}")]
    Provider {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {0}")]
    InvalidResponse(&'static str),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited { retry_after: String },

    #[error("The image couldn't be generated due to content policy restrictions. Please try a different prompt.")]
    ContentPolicy,

    #[error("Price lookup failed: {0}")]
    Quote(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl GatewayError {
    /// HTTP status the API layer answers with for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidInput(_)
            | GatewayError::AdviceBlocked
            | GatewayError::ContentPolicy => StatusCode::BAD_REQUEST,
            GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Configuration(_)
            | GatewayError::InvalidSetting { .. }
            | GatewayError::Provider { .. }
            | GatewayError::InvalidResponse(_)
            | GatewayError::Quote(_)
            | GatewayError::HttpError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure originated at a third-party provider
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            GatewayError::Provider { .. }
                | GatewayError::InvalidResponse(_)
                | GatewayError::RateLimited { .. }
                | GatewayError::ContentPolicy
                | GatewayError::HttpError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatewayError::Configuration("GROK_API_KEY".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(GatewayError::AdviceBlocked.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(GatewayError::ContentPolicy.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GatewayError::RateLimited { retry_after: "60".into() }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            GatewayError::InvalidResponse("xAI").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_response_is_distinct_from_provider_error() {
        let invalid = GatewayError::InvalidResponse("xAI");
        let provider = GatewayError::Provider {
            provider: "xAI",
            status: 503,
            message: "overloaded".into(),
        };

        assert_eq!(invalid.to_string(), "Invalid response from xAI");
        assert!(provider.to_string().contains("503"));
        assert!(!matches!(invalid, GatewayError::Provider { .. }));
        assert!(invalid.is_upstream() && provider.is_upstream());
    }

    #[test]
    fn test_content_policy_message() {
        assert_eq!(GatewayError::ContentPolicy.to_string(), CONTENT_POLICY_MESSAGE);
    }

    #[test]
    fn test_configuration_message_names_the_variable() {
        let err = GatewayError::Configuration("OPENAI_API_KEY".into());
        assert_eq!(err.to_string(), "OPENAI_API_KEY not configured");
        assert!(!err.is_upstream());
    }
}
