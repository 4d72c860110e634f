use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::user::UserId;
use crate::errors::CoreError;

/// Storage key of a transaction row, assigned by the ledger store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(pub i64);

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Buying shares
    Buy,
    /// Selling shares
    Sell,
}

impl TransactionKind {
    /// The value stored in the `type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Buy => "buy",
            TransactionKind::Sell => "sell",
        }
    }

    /// +1 for buys, -1 for sells.
    pub fn sign(&self) -> f64 {
        match self {
            TransactionKind::Buy => 1.0,
            TransactionKind::Sell => -1.0,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(TransactionKind::Buy),
            "sell" => Ok(TransactionKind::Sell),
            other => Err(CoreError::InvalidInput(format!(
                "Unknown transaction type '{other}' (expected 'buy' or 'sell')"
            ))),
        }
    }
}

/// A single recorded buy/sell trade.
///
/// Immutable once stored; the only lifecycle change is deletion by its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier, assigned by the store
    pub id: TransactionId,

    /// Owner of the trade
    pub user_id: UserId,

    /// Ticker symbol, trimmed and uppercased (e.g., "AAPL")
    pub ticker: String,

    /// Number of shares (always positive)
    pub quantity: f64,

    /// Price per share at transaction time
    pub price: f64,

    /// Trade date (no time component)
    pub date: NaiveDate,

    /// Buy or Sell
    pub kind: TransactionKind,
}

impl Transaction {
    /// Quantity with the sign of the trade direction.
    pub fn signed_quantity(&self) -> f64 {
        self.kind.sign() * self.quantity
    }

    /// Amount paid for a buy; sells contribute nothing to cost basis.
    pub fn cost(&self) -> f64 {
        match self.kind {
            TransactionKind::Buy => self.quantity * self.price,
            TransactionKind::Sell => 0.0,
        }
    }
}

/// Unvalidated user input for a new trade.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRequest {
    pub ticker: String,
    pub quantity: f64,
    pub price: f64,
    /// Free-form date text; `None` or blank means today.
    pub date: Option<String>,
    pub kind: TransactionKind,
}

impl TradeRequest {
    pub fn buy(ticker: impl Into<String>, quantity: f64, price: f64) -> Self {
        Self {
            ticker: ticker.into(),
            quantity,
            price,
            date: None,
            kind: TransactionKind::Buy,
        }
    }

    pub fn sell(ticker: impl Into<String>, quantity: f64, price: f64) -> Self {
        Self {
            ticker: ticker.into(),
            quantity,
            price,
            date: None,
            kind: TransactionKind::Sell,
        }
    }

    /// Attach an explicit trade date.
    pub fn on(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

/// Relative slack when comparing share quantities built from sums of trades.
const QUANTITY_TOLERANCE: f64 = 1e-9;

/// Largest gap between two share quantities of about `magnitude` that is
/// still treated as float residue rather than a real difference.
pub fn quantity_tolerance(magnitude: f64) -> f64 {
    QUANTITY_TOLERANCE * magnitude.abs().max(1.0)
}

/// Canonical form of a ticker symbol: surrounding whitespace removed, uppercased.
pub fn normalize_ticker(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// A validated trade, ready to be appended to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub ticker: String,
    pub quantity: f64,
    pub price: f64,
    pub date: NaiveDate,
    pub kind: TransactionKind,
}
