use futures::future::join_all;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::quote::{Quote, QuoteBook};
use crate::models::transaction::normalize_ticker;
use crate::providers::registry::PriceProviderRegistry;

/// Default upper bound for one provider request.
pub const DEFAULT_QUOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// The price oracle: current prices for tickers, never failing.
///
/// Providers are tried in registration order. A provider error, a timeout,
/// or a non-finite/negative price moves on to the next provider. When none
/// succeeds the result is [`Quote::Unavailable`] and the condition is logged.
/// Nothing here ever aborts the caller.
pub struct PriceService {
    registry: PriceProviderRegistry,
    timeout: Duration,
}

impl PriceService {
    pub fn new(registry: PriceProviderRegistry) -> Self {
        Self {
            registry,
            timeout: DEFAULT_QUOTE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Names of the configured providers, in priority order.
    pub fn provider_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Current price for one ticker.
    pub async fn quote(&self, ticker: &str) -> Quote {
        let ticker = normalize_ticker(ticker);
        match self.fetch_price(&ticker).await {
            Ok(price) => {
                debug!(ticker = %ticker, price, "quote fetched");
                Quote::Available(price)
            }
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "price unavailable");
                Quote::Unavailable
            }
        }
    }

    /// Quotes for every distinct ticker in `tickers`, fetched concurrently.
    /// Each ticker is requested exactly once.
    pub async fn quote_all<I, S>(&self, tickers: I) -> QuoteBook
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = tickers
            .into_iter()
            .map(|t| normalize_ticker(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();

        let quotes = join_all(distinct.iter().map(|t| self.quote(t))).await;
        distinct.into_iter().zip(quotes).collect()
    }

    /// Internal: fetch from providers with automatic fallback.
    async fn fetch_price(&self, ticker: &str) -> Result<f64, CoreError> {
        let mut last_error = None;

        for provider in self.registry.providers() {
            let result =
                match tokio::time::timeout(self.timeout, provider.get_current_price(ticker)).await {
                    Ok(result) => result,
                    Err(_) => Err(CoreError::Network(format!(
                        "{} timed out after {:?}",
                        provider.name(),
                        self.timeout
                    ))),
                };

            match result {
                Ok(price) if price.is_finite() && price >= 0.0 => return Ok(price),
                Ok(price) => {
                    last_error = Some(CoreError::Api {
                        provider: provider.name().to_string(),
                        message: format!(
                            "Invalid price returned for {ticker}: {price} (must be finite and non-negative)"
                        ),
                    });
                }
                Err(e) => {
                    debug!(provider = provider.name(), ticker, error = %e, "provider failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::Api {
            provider: "none".into(),
            message: "No quote provider configured".into(),
        }))
    }
}
