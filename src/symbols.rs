//! Token table and symbol extraction
//!
//! Maps free-form user text to one of the configured asset symbols.
//! Substring containment is tried first, then a small ordered set of
//! "price of X" style patterns.

use crate::models::TokenMapping;
use lazy_static::lazy_static;
use regex::Regex;

/// Default symbols, in lookup order
const DEFAULT_TOKENS: &[TokenMapping] = &[
    TokenMapping {
        symbol: "sol",
        primary_id: "solana",
        secondary_address: Some("So11111111111111111111111111111111111111112"),
    },
    TokenMapping {
        symbol: "btc",
        primary_id: "bitcoin",
        secondary_address: None,
    },
    TokenMapping {
        symbol: "eth",
        primary_id: "ethereum",
        secondary_address: None,
    },
];

lazy_static! {
    static ref PRICE_PATTERNS: Vec<Regex> = [
        r"(?i)\$?(\w+)\s*price",
        r"(?i)price\s*of\s*\$?(\w+)",
        r"(?i)how\s*much\s*is\s*\$?(\w+)",
        r"(?i)what\s*is\s*\$?(\w+)\s*trading\s*at",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("price pattern is valid"))
    .collect();
}

/// Immutable symbol → provider mapping, built once at startup
#[derive(Debug, Clone)]
pub struct TokenTable {
    entries: Vec<TokenMapping>,
}

impl TokenTable {
    pub fn new(entries: Vec<TokenMapping>) -> Self {
        Self { entries }
    }

    pub fn get(&self, symbol: &str) -> Option<&TokenMapping> {
        let symbol = symbol.to_lowercase();
        self.entries.iter().find(|e| e.symbol == symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenMapping> {
        self.entries.iter()
    }
}

impl Default for TokenTable {
    fn default() -> Self {
        Self::new(DEFAULT_TOKENS.to_vec())
    }
}

/// Return the symbol referenced by `text`, if any.
///
/// Substring matching is not word-boundary aware: "solution" resolves to
/// `sol`.
pub fn extract_symbol<'t>(text: &str, table: &'t TokenTable) -> Option<&'t str> {
    let lowered = text.to_lowercase();

    if let Some(entry) = table.iter().find(|e| lowered.contains(e.symbol)) {
        return Some(entry.symbol);
    }

    match_price_pattern(&lowered, table)
}

/// Pattern pass: first capture group that names a configured symbol
fn match_price_pattern<'t>(text: &str, table: &'t TokenTable) -> Option<&'t str> {
    PRICE_PATTERNS.iter().find_map(|pattern| {
        let candidate = pattern.captures(text)?.get(1)?.as_str();
        table.get(candidate).map(|e| e.symbol)
    })
}
