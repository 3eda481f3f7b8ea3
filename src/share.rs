//! Share-intent links
//!
//! The UI opens these after a post or image is generated; nothing is posted
//! on the visitor's behalf.

use crate::error::GatewayError;
use crate::Result;
use reqwest::Url;

const INTENT_BASE: &str = "https://twitter.com/intent/tweet";

pub const DEFAULT_IMAGE_SHARE_TEXT: &str = "Check out this AI-generated image!";

/// Build `https://twitter.com/intent/tweet?text=..[&url=..]`.
/// Text falls back to the image caption when only a URL is given.
pub fn share_intent_url(text: Option<&str>, url: Option<&str>) -> Result<String> {
    let text = text.map(str::trim).filter(|t| !t.is_empty());
    let url = url.map(str::trim).filter(|u| !u.is_empty());

    let text = match (text, url) {
        (Some(t), _) => t,
        (None, Some(_)) => DEFAULT_IMAGE_SHARE_TEXT,
        (None, None) => {
            return Err(GatewayError::InvalidInput(
                "Missing text or url to share".to_string(),
            ))
        }
    };

    let mut params = vec![("text", text)];
    if let Some(u) = url {
        params.push(("url", u));
    }

    let link = Url::parse_with_params(INTENT_BASE, &params)
        .map_err(|e| GatewayError::InvalidInput(format!("Invalid share link: {}", e)))?;

    Ok(link.to_string())
}
