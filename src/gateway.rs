//! Request orchestration
//!
//! Each operation runs strictly in sequence:
//! CONFIG CHECK → VALIDATE → (SYMBOL → QUOTE) → COMPOSE → PROVIDER CALL

use crate::completion::{CompletionProvider, XaiClient};
use crate::config::{GatewayConfig, Provider};
use crate::error::GatewayError;
use crate::image::{self, ImageProvider, OpenAiImageClient};
use crate::models::{ChatMessage, GeneratedImage, PostTier, QuoteResult, Role};
use crate::prompt;
use crate::quotes::{BirdeyeClient, CoinGeckoClient, QuoteAggregator};
use crate::symbols::{extract_symbol, TokenTable};
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Gateway {
    config: Arc<GatewayConfig>,
    quotes: QuoteAggregator,
    completions: Arc<dyn CompletionProvider>,
    images: Arc<dyn ImageProvider>,
}

impl Gateway {
    pub fn new(
        config: Arc<GatewayConfig>,
        quotes: QuoteAggregator,
        completions: Arc<dyn CompletionProvider>,
        images: Arc<dyn ImageProvider>,
    ) -> Self {
        Self {
            config,
            quotes,
            completions,
            images,
        }
    }

    /// Wire the HTTP-backed providers from configuration
    pub fn from_config(config: GatewayConfig) -> Result<Self> {
        let tokens = Arc::new(TokenTable::default());

        let quotes = QuoteAggregator::new(
            tokens,
            Arc::new(CoinGeckoClient::new(
                config.coingecko_api_key.clone(),
                config.coingecko_base_url.clone(),
            )?),
            Arc::new(BirdeyeClient::new(
                config.birdeye_api_key.clone(),
                config.birdeye_base_url.clone(),
            )?),
        );

        let completions = Arc::new(XaiClient::new(
            config.grok_api_key.clone(),
            config.xai_base_url.clone(),
            config.chat_model.clone(),
        )?);

        let images = Arc::new(OpenAiImageClient::new(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.image_model.clone(),
        )?);

        Ok(Self::new(Arc::new(config), quotes, completions, images))
    }

    /// Chat turn over the caller's full history
    pub async fn chat(&self, history: &[ChatMessage]) -> Result<String> {
        self.config.require(&[Provider::Xai])?;

        let last = match history.last() {
            Some(message) if message.role == Role::User => message,
            Some(_) => {
                return Err(GatewayError::InvalidInput(
                    "Conversation must end with a user message".to_string(),
                ))
            }
            None => return Err(GatewayError::InvalidInput("Missing messages".to_string())),
        };

        let quote = self.lookup_quote(&last.content).await;
        let request = prompt::chat_request(history, quote.as_ref());

        info!(turns = history.len(), with_quote = quote.is_some(), "Forwarding chat");
        self.completions.complete(&request).await
    }

    /// Post generator with advice guard and real-time quote data
    pub async fn generate_post(&self, user_input: &str, tier: PostTier) -> Result<String> {
        self.config.require(&[Provider::Xai])?;

        let user_input = required(user_input, "Missing user input")?;
        prompt::check_advice(user_input)?;

        let quote = self.lookup_quote(user_input).await;
        let request = prompt::post_request(user_input, tier, quote.as_ref());

        info!(%tier, with_quote = quote.is_some(), "Generating post");
        let post = self.completions.complete(&request).await?;
        Ok(post.trim().to_string())
    }

    /// Post generator without quote lookup
    pub async fn generate_simple_post(&self, topic: &str, tier: PostTier) -> Result<String> {
        self.config.require(&[Provider::Xai])?;

        let topic = required(topic, "Missing prompt")?;
        let request = prompt::simple_post_request(topic, tier);

        info!(%tier, "Generating simple post");
        let post = self.completions.complete(&request).await?;
        Ok(post.trim().to_string())
    }

    pub async fn generate_image(&self, user_input: &str) -> Result<GeneratedImage> {
        self.config.require(&[Provider::OpenAi])?;

        let user_input = required(user_input, "Missing user input")?;
        info!("Generating image");
        image::generate_image(self.images.as_ref(), user_input).await
    }

    /// Succeeded quotes only; failures are logged and dropped
    async fn lookup_quote(&self, text: &str) -> Option<QuoteResult> {
        let symbol = extract_symbol(text, self.quotes.table())?;
        debug!(symbol, "Detected token symbol");

        let quote = self.quotes.quote(symbol).await;
        if quote.succeeded {
            Some(quote)
        } else {
            info!(
                symbol,
                detail = quote.error_detail.as_deref().unwrap_or_default(),
                "Proceeding without price data"
            );
            None
        }
    }
}

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(GatewayError::InvalidInput(message.to_string()))
    } else {
        Ok(trimmed)
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockCompletionProvider;
    use super::*;
    use crate::image::mock::MockImageProvider;
    use crate::quotes::mock::MockPriceProvider;

    fn configured() -> GatewayConfig {
        GatewayConfig {
            grok_api_key: Some("xai".into()),
            openai_api_key: Some("openai".into()),
            ..GatewayConfig::default()
        }
    }

    struct Harness {
        gateway: Gateway,
        completions: Arc<MockCompletionProvider>,
        primary: Arc<MockPriceProvider>,
        images: Arc<MockImageProvider>,
    }

    fn harness(config: GatewayConfig, completions: Arc<MockCompletionProvider>) -> Harness {
        let primary = MockPriceProvider::ok("CoinGecko", 64000.0, Some(1.25));
        let quotes = QuoteAggregator::new(
            Arc::new(TokenTable::default()),
            primary.clone(),
            MockPriceProvider::failing("Birdeye"),
        );
        let images = Arc::new(MockImageProvider::new(|| Ok("https://img.example/x.png".into())));

        Harness {
            gateway: Gateway::new(Arc::new(config), quotes, completions.clone(), images.clone()),
            completions,
            primary,
            images,
        }
    }

    #[tokio::test]
    async fn test_advice_request_makes_no_outbound_calls() {
        let h = harness(configured(), MockCompletionProvider::answering("nope"));

        let err = h
            .gateway
            .generate_post("should I buy BTC", PostTier::Standard)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::AdviceBlocked));
        assert_eq!(h.completions.call_count(), 0);
        assert_eq!(h.primary.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_short_circuits() {
        let h = harness(GatewayConfig::default(), MockCompletionProvider::answering("hi"));

        let err = h.gateway.chat(&[ChatMessage::user("btc price")]).await.unwrap_err();

        assert!(matches!(err, GatewayError::Configuration(_)));
        assert_eq!(h.completions.call_count(), 0);
        assert_eq!(h.primary.call_count(), 0);

        let err = h.gateway.generate_image("a cat").await.unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(ref v) if v == "OPENAI_API_KEY"));
        assert!(h.images.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chat_injects_quote_and_keeps_history() {
        let h = harness(configured(), MockCompletionProvider::answering("BTC is at $64000.00"));
        let history = vec![
            ChatMessage::user("hi"),
            ChatMessage::new(Role::Assistant, "hello!"),
            ChatMessage::user("what's the btc price?"),
        ];

        let answer = h.gateway.chat(&history).await.unwrap();

        assert_eq!(answer, "BTC is at $64000.00");
        let sent = h.completions.last_request();
        assert_eq!(sent.messages.len(), 4);
        assert!(sent.messages[0]
            .content
            .contains("Current price of BTC: $64000.00 (+1.25% 24h)"));
        assert_eq!(&sent.messages[1..], &history[..]);
    }

    #[tokio::test]
    async fn test_chat_history_must_end_with_user() {
        let h = harness(configured(), MockCompletionProvider::answering("x"));

        let err = h
            .gateway
            .chat(&[ChatMessage::user("hi"), ChatMessage::new(Role::Assistant, "yo")])
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));

        let err = h.gateway.chat(&[]).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
        assert_eq!(h.completions.call_count(), 0);
    }

    #[tokio::test]
    async fn test_post_is_trimmed_and_budgeted() {
        let h = harness(configured(), MockCompletionProvider::answering("  shipping today  \n"));

        let post = h
            .gateway
            .generate_post("launching a new product", PostTier::Premium)
            .await
            .unwrap();

        assert_eq!(post, "shipping today");
        assert_eq!(h.completions.last_request().max_tokens, Some(500));
        assert_eq!(h.primary.call_count(), 0);
    }

    #[tokio::test]
    async fn test_simple_post_requires_topic() {
        let h = harness(configured(), MockCompletionProvider::answering("x"));

        let err = h
            .gateway
            .generate_simple_post("   ", PostTier::Standard)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Missing prompt");
        assert_eq!(h.completions.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_completion_surfaces_as_invalid_response() {
        let h = harness(configured(), MockCompletionProvider::invalid());

        let err = h
            .gateway
            .generate_simple_post("coffee", PostTier::Standard)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_image_uses_sanitized_prompt() {
        let h = harness(configured(), MockCompletionProvider::answering("x"));

        let image = h.gateway.generate_image("a sunset over mountains").await.unwrap();

        assert_eq!(image.url, "https://img.example/x.png");
        assert!(image.prompt_used.contains("a sunset over mountains"));
        assert!(image.prompt_used.contains("photorealistic"));
    }
}
