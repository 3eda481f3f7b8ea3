//! SnapyX Gateway
//!
//! Backend for the SnapyX demo UI:
//! - Chat with a hosted language model, grounded with live token prices
//! - Generate short social posts (standard or premium length)
//! - Generate an image from a screened prompt
//! - Build share-intent links for the generated content
//!
//! REQUEST FLOW:
//! HANDLER → CONFIG CHECK → SYMBOL → QUOTE → PROMPT → PROVIDER → JSON ENVELOPE

pub mod api;
pub mod completion;
pub mod config;
pub mod error;
pub mod gateway;
pub mod image;
pub mod models;
pub mod prompt;
pub mod quotes;
pub mod share;
pub mod symbols;

pub use error::Result;

// Re-export common types
pub use config::{GatewayConfig, Provider};
pub use gateway::Gateway;
pub use models::*;
