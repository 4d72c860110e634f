use tracing::warn;

use super::finnhub::FinnhubProvider;
use super::traits::PriceProvider;
use super::yahoo_finance::YahooFinanceProvider;
use crate::models::settings::Settings;

/// Ordered list of quote providers.
///
/// Earlier registrations have priority; later ones are fallbacks.
pub struct PriceProviderRegistry {
    providers: Vec<Box<dyn PriceProvider>>,
}

impl PriceProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with the default providers for `settings`.
    pub fn new_with_defaults(settings: &Settings) -> Self {
        let mut registry = Self::new();

        // Finnhub: primary, requires a token
        if let Some(key) = settings.api_keys.get("finnhub") {
            registry.register(Box::new(FinnhubProvider::new(key.clone())));
        }

        // Yahoo Finance: no token needed (fallback)
        if settings.yahoo_fallback {
            match YahooFinanceProvider::new() {
                Ok(yahoo) => registry.register(Box::new(yahoo)),
                Err(e) => warn!(error = %e, "Yahoo Finance provider unavailable"),
            }
        }

        if registry.is_empty() {
            warn!("no quote providers configured; all prices will read as unavailable");
        }

        registry
    }

    /// Register a new price provider at the lowest priority.
    pub fn register(&mut self, provider: Box<dyn PriceProvider>) {
        self.providers.push(provider);
    }

    /// All providers in priority order.
    pub fn providers(&self) -> impl Iterator<Item = &dyn PriceProvider> + '_ {
        self.providers.iter().map(|p| p.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.providers().map(|p| p.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for PriceProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
