//! Prompt composition
//!
//! Builds the exact payloads sent to the language model. Every instruction
//! ends with the same safety clause; resolved quote data goes right before it.

use crate::error::GatewayError;
use crate::models::{ChatMessage, CompletionRequest, PostTier, QuoteResult};
use crate::Result;
use lazy_static::lazy_static;
use regex::Regex;

pub const SAFETY_CLAUSE: &str =
    "Remember, you must not provide any financial advice or investment recommendations.";

const CHAT_PERSONA: &str = "You are Grok, an AI assistant created by xAI.";

const POST_PERSONA: &str = "You are a tweet generator that creates natural, human-like tweets.";

const TEMPERATURE: f32 = 0.7;

lazy_static! {
    static ref ADVICE_PATTERN: Regex =
        Regex::new(r"(?i)financial advice|investment|should i buy|should i sell")
            .expect("advice pattern is valid");
}

/// Reject advice-seeking input before anything leaves the process
pub fn check_advice(input: &str) -> Result<()> {
    if ADVICE_PATTERN.is_match(input) {
        return Err(GatewayError::AdviceBlocked);
    }
    Ok(())
}

/// System message for the chat endpoint followed by the caller's history
pub fn chat_request(history: &[ChatMessage], quote: Option<&QuoteResult>) -> CompletionRequest {
    let mut system = String::from(CHAT_PERSONA);

    if let Some(data) = quote.and_then(QuoteResult::display) {
        system.push_str("\n\n");
        system.push_str(&data);
        system.push_str("\n\nWhen discussing this token, use only the price data provided above.");
    }

    system.push('\n');
    system.push_str(SAFETY_CLAUSE);

    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(system));
    messages.extend(history.iter().cloned());

    CompletionRequest {
        messages,
        max_tokens: None,
        temperature: TEMPERATURE,
    }
}

/// Post generator with optional real-time quote data
pub fn post_request(
    user_input: &str,
    tier: PostTier,
    quote: Option<&QuoteResult>,
) -> CompletionRequest {
    let mut prompt = match tier {
        PostTier::Premium => format!(
            "Generate a detailed, engaging tweet based on: \"{}\".\n\
             Since this is for X Premium, you can exceed 280 characters.\n\
             Make it natural and conversational, avoiding hashtags and excessive emojis.\n\
             Focus on providing value and engaging content.",
            user_input
        ),
        PostTier::Standard => format!(
            "Generate a natural, human-like tweet based on: \"{}\".\n\
             Keep it under 280 characters.\n\
             The tweet should sound like it's written by a real person, not AI.\n\
             Avoid hashtags, emojis, and robotic phrasing.",
            user_input
        ),
    };

    if let Some(data) = quote.and_then(QuoteResult::display) {
        prompt.push_str("\n\nInclude this real-time data in the tweet:\n");
        prompt.push_str(&data);
        prompt.push_str("\nUse only the price data provided above.");
    }

    prompt.push('\n');
    prompt.push_str(SAFETY_CLAUSE);

    post_messages(prompt, tier)
}

/// Simple post generator: fixed short framing, no quote lookup
pub fn simple_post_request(topic: &str, tier: PostTier) -> CompletionRequest {
    let prompt = format!(
        "Generate a natural, human-like tweet based on: \"{}\".\n\
         The tweet should sound like it's written by a real person, not AI.\n\
         Avoid hashtags, emojis, and robotic phrasing.\n\
         Keep it short and engaging.\n\
         {}",
        topic, SAFETY_CLAUSE
    );

    post_messages(prompt, tier)
}

fn post_messages(prompt: String, tier: PostTier) -> CompletionRequest {
    CompletionRequest {
        messages: vec![ChatMessage::system(POST_PERSONA), ChatMessage::user(prompt)],
        max_tokens: Some(tier.max_tokens()),
        temperature: TEMPERATURE,
    }
}
