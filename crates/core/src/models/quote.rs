use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of asking the price oracle for a ticker's current price.
///
/// `Unavailable` covers every provider failure (transport, parse, API
/// error, timeout). It is shown to users as a price of 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Quote {
    Available(f64),
    Unavailable,
}

impl Quote {
    /// The price to use in value arithmetic: the quoted price, or 0 when unknown.
    pub fn value_or_zero(&self) -> f64 {
        match self {
            Quote::Available(price) => *price,
            Quote::Unavailable => 0.0,
        }
    }

    pub fn price(&self) -> Option<f64> {
        match self {
            Quote::Available(price) => Some(*price),
            Quote::Unavailable => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Quote::Unavailable)
    }

    /// True when the row displays as a 0 price and should be reviewed by the user.
    pub fn reads_as_zero(&self) -> bool {
        self.value_or_zero() == 0.0
    }
}

/// Quotes gathered for one render pass, keyed by normalized ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteBook {
    quotes: HashMap<String, Quote>,
}

impl QuoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ticker: &str, quote: Quote) {
        self.quotes.insert(ticker.to_uppercase(), quote);
    }

    /// Quote for `ticker`; tickers never fetched read as `Unavailable`.
    pub fn get(&self, ticker: &str) -> Quote {
        self.quotes
            .get(&ticker.to_uppercase())
            .copied()
            .unwrap_or(Quote::Unavailable)
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.quotes.contains_key(&ticker.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Tickers whose quote could not be fetched.
    pub fn unavailable_tickers(&self) -> Vec<&str> {
        let mut tickers: Vec<&str> = self
            .quotes
            .iter()
            .filter(|(_, q)| q.is_unavailable())
            .map(|(t, _)| t.as_str())
            .collect();
        tickers.sort_unstable();
        tickers
    }
}

impl FromIterator<(String, Quote)> for QuoteBook {
    fn from_iter<I: IntoIterator<Item = (String, Quote)>>(iter: I) -> Self {
        let mut book = QuoteBook::new();
        for (ticker, quote) in iter {
            book.insert(&ticker, quote);
        }
        book
    }
}
