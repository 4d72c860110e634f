use async_trait::async_trait;

use crate::errors::CoreError;

/// Trait abstraction for quote sources.
///
/// Each provider (Finnhub, Yahoo Finance) implements this trait. If an API
/// stops working or changes, only that one implementation is replaced.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Get the current (latest) price of a ticker in its trading currency.
    async fn get_current_price(&self, symbol: &str) -> Result<f64, CoreError>;
}
