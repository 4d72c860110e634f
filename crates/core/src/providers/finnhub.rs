use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::traits::PriceProvider;
use crate::errors::CoreError;

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER: &str = "Finnhub";

/// Finnhub quote API provider for stock prices.
///
/// - **Free tier**: 60 requests/minute.
/// - **Requires**: API token (set via `FINNHUB_API_KEY`).
/// - **Endpoint**: `GET /quote?symbol=SYM&token=KEY`, current price in field `c`.
///
/// Finnhub answers unknown symbols with HTTP 200 and `c = 0`; that is
/// reported as an error so the caller sees the price as unavailable.
pub struct FinnhubProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl FinnhubProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    /// Point the provider at a different host (used by tests).
    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

// ── Finnhub API response types ──────────────────────────────────────

#[derive(Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    error: Option<String>,
}

/// Extract the current price from a `/quote` response body.
pub fn parse_quote(symbol: &str, body: &str) -> Result<f64, CoreError> {
    let resp: QuoteResponse = serde_json::from_str(body).map_err(|e| CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("Failed to parse quote for {symbol}: {e}"),
    })?;

    if let Some(error) = resp.error {
        return Err(CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("{symbol}: {error}"),
        });
    }

    match resp.c {
        Some(price) if price > 0.0 => Ok(price),
        Some(_) => Err(CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("No quote data for {symbol}. Symbol may be unknown."),
        }),
        None => Err(CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Quote for {symbol} has no current price"),
        }),
    }
}

#[async_trait]
impl PriceProvider for FinnhubProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_current_price(&self, symbol: &str) -> Result<f64, CoreError> {
        let symbol = symbol.to_uppercase();
        let resp = self
            .client
            .get(format!("{}/quote", self.base_url))
            .query(&[("symbol", symbol.as_str()), ("token", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("HTTP {status} for {symbol}"),
            });
        }

        let body = resp.text().await?;
        parse_quote(&symbol, &body)
    }
}
