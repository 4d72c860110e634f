use thiserror::Error;

use crate::models::transaction::TransactionId;

/// Unified error type for the entire stock-ledger-core library.
/// Every public fallible function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── User input ──────────────────────────────────────────────────
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ── Business rules ──────────────────────────────────────────────
    #[error("Cannot sell {requested} {ticker}: you cannot sell more than you currently hold ({held} shares)")]
    InsufficientHoldings {
        ticker: String,
        held: f64,
        requested: f64,
    },

    #[error("Transaction not found: {0}")]
    NotFound(TransactionId),

    // ── Storage ─────────────────────────────────────────────────────
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Held quantity carried by an `InsufficientHoldings` error.
    pub fn held_quantity(&self) -> Option<f64> {
        match self {
            CoreError::InsufficientHoldings { held, .. } => Some(*held),
            _ => None,
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<rusqlite::Error> for CoreError {
    fn from(e: rusqlite::Error) -> Self {
        CoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL, and the quote token travels in the query string.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
