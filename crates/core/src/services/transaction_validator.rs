use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::transaction::{
    normalize_ticker, quantity_tolerance, NewTransaction, TradeRequest, TransactionKind,
};

/// Date spellings accepted for a trade date. The first one is the storage format.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Gatekeeper for everything that enters the ledger.
///
/// Rules:
/// - Ticker must not be blank
/// - Quantity must be finite and positive
/// - Price must be finite and non-negative
/// - Date must parse (blank means today)
/// - A sell can't exceed the quantity currently held
///
/// Pure business logic, no I/O. The store calls [`TransactionValidator::check_holdings`]
/// inside the same database transaction that appends the trade.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionValidator;

impl TransactionValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate the shape of a trade request and normalize it.
    /// Does not look at holdings.
    pub fn validate_request(
        &self,
        request: &TradeRequest,
        today: NaiveDate,
    ) -> Result<NewTransaction, CoreError> {
        let ticker = self.validate_ticker(&request.ticker)?;
        self.validate_amounts(request.quantity, request.price)?;
        let date = self.parse_date(request.date.as_deref(), today)?;

        Ok(NewTransaction {
            ticker,
            quantity: request.quantity,
            price: request.price,
            date,
            kind: request.kind,
        })
    }

    pub fn validate_ticker(&self, raw: &str) -> Result<String, CoreError> {
        let ticker = normalize_ticker(raw);
        if ticker.is_empty() {
            return Err(CoreError::InvalidInput("Ticker is required".into()));
        }
        if ticker.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidInput(format!(
                "Ticker '{ticker}' must not contain spaces"
            )));
        }
        Ok(ticker)
    }

    pub fn validate_amounts(&self, quantity: f64, price: f64) -> Result<(), CoreError> {
        if !quantity.is_finite() {
            return Err(CoreError::InvalidInput(format!(
                "Quantity must be a finite number, got {quantity}"
            )));
        }
        if quantity <= 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "Quantity must be positive, got {quantity}"
            )));
        }
        if !price.is_finite() {
            return Err(CoreError::InvalidInput(format!(
                "Price must be a finite number, got {price}"
            )));
        }
        if price < 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "Price cannot be negative, got {price}"
            )));
        }
        Ok(())
    }

    /// Parse an optional trade date. Missing or blank input means `today`.
    pub fn parse_date(&self, input: Option<&str>, today: NaiveDate) -> Result<NaiveDate, CoreError> {
        let raw = match input.map(str::trim) {
            None | Some("") => return Ok(today),
            Some(raw) => raw,
        };

        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
            .ok_or_else(|| {
                CoreError::InvalidInput(format!(
                    "Invalid date '{raw}' (expected YYYY-MM-DD, YYYYMMDD, YYYY/MM/DD or MM/DD/YYYY)"
                ))
            })
    }

    /// Parse a quantity or price typed by the user.
    pub fn parse_number(&self, field: &str, raw: &str) -> Result<f64, CoreError> {
        raw.trim()
            .replace(',', "")
            .parse::<f64>()
            .map_err(|_| CoreError::InvalidInput(format!("Invalid {field}: '{}'", raw.trim())))
    }

    /// Enforce the no-oversell rule. Buys always pass.
    pub fn check_holdings(
        &self,
        kind: TransactionKind,
        ticker: &str,
        requested: f64,
        held: f64,
    ) -> Result<(), CoreError> {
        if kind == TransactionKind::Sell && requested > held + quantity_tolerance(requested.max(held)) {
            return Err(CoreError::InsufficientHoldings {
                ticker: ticker.to_string(),
                held,
                requested,
            });
        }
        Ok(())
    }

    /// A username must contain something other than whitespace.
    pub fn validate_username(&self, raw: &str) -> Result<String, CoreError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidInput("Username is required".into()));
        }
        Ok(name.to_string())
    }
}
