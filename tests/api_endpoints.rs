//! Router-level tests: build the app with mock providers, drive it with
//! `oneshot`, assert status codes and JSON shapes.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use snapyx_gateway::api::create_router;
use snapyx_gateway::completion::CompletionProvider;
use snapyx_gateway::error::GatewayError;
use snapyx_gateway::image::{ImageProvider, SAFE_FALLBACK_PROMPT};
use snapyx_gateway::quotes::{PricePoint, PriceProvider, QuoteAggregator};
use snapyx_gateway::symbols::TokenTable;
use snapyx_gateway::{CompletionRequest, Gateway, GatewayConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

struct FixedCompletion {
    text: String,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

#[async_trait]
impl CompletionProvider for FixedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> snapyx_gateway::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.text.clone())
    }
}

enum ImageOutcome {
    Url(&'static str),
    RateLimited,
    ContentPolicy,
    ProviderDown,
}

struct ScriptedImages {
    outcome: ImageOutcome,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageProvider for ScriptedImages {
    async fn generate(&self, prompt: &str) -> snapyx_gateway::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.outcome {
            ImageOutcome::Url(url) => Ok(url.to_string()),
            ImageOutcome::RateLimited => Err(GatewayError::RateLimited {
                retry_after: "60".to_string(),
            }),
            ImageOutcome::ContentPolicy => Err(GatewayError::ContentPolicy),
            ImageOutcome::ProviderDown => Err(GatewayError::Provider {
                provider: "OpenAI",
                status: 503,
                message: "service unavailable".to_string(),
            }),
        }
    }
}

struct CountingPrice {
    calls: AtomicUsize,
}

#[async_trait]
impl PriceProvider for CountingPrice {
    fn name(&self) -> &'static str {
        "CoinGecko"
    }

    async fn spot_price(&self, _asset_ref: &str) -> snapyx_gateway::Result<PricePoint> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PricePoint {
            usd: 150.0,
            change_24h: Some(3.0),
        })
    }
}

struct TestApp {
    router: axum::Router,
    completion: Arc<FixedCompletion>,
    images: Arc<ScriptedImages>,
    prices: Arc<CountingPrice>,
}

fn app(config: GatewayConfig, completion_text: &str, image: ImageOutcome) -> TestApp {
    let completion = Arc::new(FixedCompletion {
        text: completion_text.to_string(),
        calls: AtomicUsize::new(0),
        requests: Mutex::new(Vec::new()),
    });
    let images = Arc::new(ScriptedImages {
        outcome: image,
        prompts: Mutex::new(Vec::new()),
    });
    let prices = Arc::new(CountingPrice {
        calls: AtomicUsize::new(0),
    });

    let quotes = QuoteAggregator::new(
        Arc::new(TokenTable::default()),
        prices.clone(),
        prices.clone(),
    );
    let gateway = Gateway::new(Arc::new(config), quotes, completion.clone(), images.clone());

    TestApp {
        router: create_router(Arc::new(gateway)),
        completion,
        images,
        prices,
    }
}

fn configured() -> GatewayConfig {
    GatewayConfig {
        grok_api_key: Some("xai-test".into()),
        openai_api_key: Some("openai-test".into()),
        ..GatewayConfig::default()
    }
}

async fn post_json(
    router: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(
        router,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn send(router: axum::Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = router.oneshot(req).await.expect("request");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&bytes).expect("parse JSON");
    (status, json)
}

fn assert_iso_timestamp(json: &serde_json::Value) {
    let ts = json["timestamp"].as_str().expect("timestamp is string");
    assert!(
        chrono::DateTime::parse_from_rfc3339(ts).is_ok(),
        "timestamp not RFC 3339: {ts}"
    );
}

#[tokio::test]
async fn simple_post_end_to_end() {
    let completion = format!("{:<149}!", "Big day today. Launching something we're proud of");
    assert_eq!(completion.len(), 150);
    let t = app(configured(), &completion, ImageOutcome::Url("unused"));

    let (status, json) = post_json(
        t.router,
        "/api/tweet",
        serde_json::json!({"prompt": "launching a new product", "isPremium": false}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["tweet"], completion);
    assert_iso_timestamp(&json);
    assert_eq!(t.completion.calls.load(Ordering::SeqCst), 1);
    assert_eq!(t.completion.requests.lock().unwrap()[0].max_tokens, Some(280));
}

#[tokio::test]
async fn advice_request_is_rejected_before_any_call() {
    let t = app(configured(), "unused", ImageOutcome::Url("unused"));

    let (status, json) = post_json(
        t.router,
        "/api/grok",
        serde_json::json!({"userInput": "should I buy BTC", "isPremium": false}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Financial advice is strictly prohibited.");
    assert_eq!(t.completion.calls.load(Ordering::SeqCst), 0);
    assert_eq!(t.prices.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn post_generator_injects_price_data() {
    let t = app(configured(), "SOL looking lively today", ImageOutcome::Url("unused"));

    let (status, json) = post_json(
        t.router,
        "/api/grok",
        serde_json::json!({"userInput": "sol price update", "isPremium": true}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["tweet"], "SOL looking lively today");
    assert_eq!(t.prices.calls.load(Ordering::SeqCst), 1);

    let sent = t.completion.requests.lock().unwrap()[0].clone();
    assert_eq!(sent.max_tokens, Some(500));
    assert!(sent.messages[1]
        .content
        .contains("Current price of SOL: $150.00 (+3.00% 24h)"));
}

#[tokio::test]
async fn post_generator_requires_input() {
    let t = app(configured(), "unused", ImageOutcome::Url("unused"));

    let (status, json) = post_json(t.router, "/api/grok", serde_json::json!({"isPremium": true})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing user input");
    assert_iso_timestamp(&json);
}

#[tokio::test]
async fn chat_returns_result_envelope() {
    let t = app(configured(), "Hello there", ImageOutcome::Url("unused"));

    let (status, json) = post_json(
        t.router,
        "/api/chat",
        serde_json::json!({"messages": [{"role": "user", "content": "hi"}]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"], "Hello there");
    assert_eq!(json["usedWebSearch"], false);
    assert_iso_timestamp(&json);
}

#[tokio::test]
async fn chat_without_credential_is_configuration_error() {
    let t = app(GatewayConfig::default(), "unused", ImageOutcome::Url("unused"));

    let (status, json) = post_json(
        t.router,
        "/api/chat",
        serde_json::json!({"messages": [{"role": "user", "content": "eth price"}]}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "GROK_API_KEY not configured");
    assert_eq!(t.completion.calls.load(Ordering::SeqCst), 0);
    assert_eq!(t.prices.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn chat_history_ending_with_assistant_is_rejected() {
    let t = app(configured(), "unused", ImageOutcome::Url("unused"));

    let (status, _) = post_json(
        t.router,
        "/api/chat",
        serde_json::json!({"messages": [
            {"role": "user", "content": "hi"},
            {"role": "assistant", "content": "hello"}
        ]}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(t.completion.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_json_gets_json_error() {
    let t = app(configured(), "unused", ImageOutcome::Url("unused"));

    let (status, json) = send(
        t.router,
        Request::builder()
            .method("POST")
            .uri("/api/tweet")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn image_prompt_is_sanitized() {
    let t = app(configured(), "unused", ImageOutcome::Url("https://img.example/a.png"));

    let (status, json) = post_json(
        t.router.clone(),
        "/api/generateImage",
        serde_json::json!({"userInput": "a nude portrait"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["imageUrl"], "https://img.example/a.png");
    assert_eq!(json["prompt"], SAFE_FALLBACK_PROMPT);

    let (_, json) = post_json(
        t.router,
        "/api/generateImage",
        serde_json::json!({"userInput": "a sunset over mountains"}),
    )
    .await;

    let prompts = t.images.prompts.lock().unwrap();
    assert_eq!(prompts[0], SAFE_FALLBACK_PROMPT);
    assert!(prompts[1].contains("a sunset over mountains"));
    assert!(prompts[1].contains("photorealistic"));
    assert_eq!(json["prompt"], prompts[1].as_str());
}

#[tokio::test]
async fn image_rate_limit_passes_through() {
    let t = app(configured(), "unused", ImageOutcome::RateLimited);

    let (status, json) = post_json(
        t.router,
        "/api/generateImage",
        serde_json::json!({"userInput": "a cat"}),
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["retryAfter"], "60");
    assert_eq!(json["error"], "Rate limit exceeded. Please try again later.");
}

#[tokio::test]
async fn image_content_policy_is_bad_request() {
    let t = app(configured(), "unused", ImageOutcome::ContentPolicy);

    let (status, json) = post_json(
        t.router,
        "/api/generateImage",
        serde_json::json!({"userInput": "a cat"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], snapyx_gateway::error::CONTENT_POLICY_MESSAGE);
}

#[tokio::test]
async fn image_provider_failure_is_generic_500_with_details() {
    let t = app(configured(), "unused", ImageOutcome::ProviderDown);

    let (status, json) = post_json(
        t.router,
        "/api/generateImage",
        serde_json::json!({"userInput": "a cat"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json["error"],
        "An error occurred while generating the image. Please try again."
    );
    assert!(json["details"].as_str().unwrap().contains("service unavailable"));
}

#[tokio::test]
async fn share_link_endpoint() {
    let t = app(configured(), "unused", ImageOutcome::Url("unused"));

    let (status, json) = send(
        t.router.clone(),
        Request::builder()
            .uri("/api/share?text=hello%20world")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["url"], "https://twitter.com/intent/tweet?text=hello+world");

    let (status, json) = send(
        t.router,
        Request::builder().uri("/api/share").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn health_endpoint() {
    let t = app(configured(), "unused", ImageOutcome::Url("unused"));

    let (status, json) = send(
        t.router,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn image_without_credential_reports_configuration() {
    let config = GatewayConfig {
        grok_api_key: Some("xai-test".into()),
        ..GatewayConfig::default()
    };
    let t = app(config, "unused", ImageOutcome::Url("unused"));

    let (status, json) = post_json(
        t.router,
        "/api/generateImage",
        serde_json::json!({"userInput": "a cat"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "OPENAI_API_KEY not configured");
    assert!(json.get("details").is_none());
    assert!(json.get("retryAfter").is_none());
    assert!(t.images.prompts.lock().unwrap().is_empty());
}
