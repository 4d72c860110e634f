// ═══════════════════════════════════════════════════════════════════
// Provider Tests — Finnhub quote parsing and HTTP behaviour,
// PriceProviderRegistry ordering
// ═══════════════════════════════════════════════════════════════════

use httpmock::prelude::*;

use stock_ledger_core::errors::CoreError;
use stock_ledger_core::models::settings::Settings;
use stock_ledger_core::providers::finnhub::{parse_quote, FinnhubProvider};
use stock_ledger_core::providers::registry::PriceProviderRegistry;
use stock_ledger_core::providers::traits::PriceProvider;

// ── Finnhub response parsing ────────────────────────────────────────

mod finnhub_parse {
    use super::*;

    #[test]
    fn current_price_from_c() {
        let body = r#"{"c":190.5,"d":1.2,"dp":0.63,"h":191,"l":188,"o":189,"pc":189.3,"t":1700000000}"#;
        assert_eq!(parse_quote("AAPL", body).unwrap(), 190.5);
    }

    #[test]
    fn zero_price_means_unknown_symbol() {
        let body = r#"{"c":0,"d":null,"dp":null,"h":0,"l":0,"o":0,"pc":0,"t":0}"#;
        let err = parse_quote("ZZZ", body).unwrap_err();
        assert!(matches!(err, CoreError::Api { .. }));
        assert!(err.to_string().contains("ZZZ"));
    }

    #[test]
    fn error_field_is_reported() {
        let err = parse_quote("AAPL", r#"{"error":"Invalid API key."}"#).unwrap_err();
        assert_eq!(err.to_string(), "API error (Finnhub): AAPL: Invalid API key.");
    }

    #[test]
    fn missing_price_field() {
        assert!(parse_quote("AAPL", "{}").is_err());
    }

    #[test]
    fn malformed_body() {
        let err = parse_quote("AAPL", "<html>oops</html>").unwrap_err();
        assert!(err.to_string().contains("Failed to parse quote for AAPL"));
    }
}

// ── Finnhub over HTTP ───────────────────────────────────────────────

mod finnhub_http {
    use super::*;

    #[tokio::test]
    async fn sends_symbol_and_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/quote")
                    .query_param("symbol", "AAPL")
                    .query_param("token", "test-key");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"c":187.25}"#);
            })
            .await;

        let provider = FinnhubProvider::with_base_url("test-key".into(), server.base_url());
        let price = provider.get_current_price("aapl").await.unwrap();

        assert_eq!(price, 187.25);
        assert_eq!(provider.name(), "Finnhub");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unknown_symbol_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/quote");
                then.status(200).body(r#"{"c":0,"h":0,"l":0}"#);
            })
            .await;

        let provider = FinnhubProvider::with_base_url("k".into(), server.base_url());
        assert!(provider.get_current_price("ZZZ").await.is_err());
    }

    #[tokio::test]
    async fn http_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/quote");
                then.status(401).body(r#"{"error":"Invalid API key."}"#);
            })
            .await;

        let provider = FinnhubProvider::with_base_url("bad".into(), format!("{}/", server.base_url()));
        let err = provider.get_current_price("AAPL").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("401"), "{msg}");
        assert!(!msg.contains("bad"), "token leaked: {msg}");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let provider = FinnhubProvider::with_base_url("secret".into(), "http://127.0.0.1:9");
        let err = provider.get_current_price("AAPL").await.unwrap_err();
        assert!(matches!(err, CoreError::Network(_)));
        assert!(!err.to_string().contains("secret"));
    }
}

// ── Registry ────────────────────────────────────────────────────────

mod registry {
    use super::*;

    #[test]
    fn empty_by_default() {
        let registry = PriceProviderRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.names().is_empty());
    }

    #[test]
    fn finnhub_first_then_yahoo() {
        let settings = Settings::default().with_api_key("finnhub", "k");
        let registry = PriceProviderRegistry::new_with_defaults(&settings);
        let names = registry.names();
        assert_eq!(names.first().map(String::as_str), Some("Finnhub"));
        assert!(names.len() <= 2);
    }

    #[test]
    fn no_key_and_no_fallback_is_empty() {
        let settings = Settings {
            yahoo_fallback: false,
            ..Settings::default()
        };
        assert!(PriceProviderRegistry::new_with_defaults(&settings).is_empty());
    }

    #[test]
    fn finnhub_only_without_fallback() {
        let settings = Settings {
            yahoo_fallback: false,
            ..Settings::default()
        }
        .with_api_key("finnhub", "k");
        assert_eq!(
            PriceProviderRegistry::new_with_defaults(&settings).names(),
            vec!["Finnhub"]
        );
    }

    #[test]
    fn register_appends_at_lowest_priority() {
        let mut registry = PriceProviderRegistry::new();
        registry.register(Box::new(FinnhubProvider::new("a".into())));
        registry.register(Box::new(FinnhubProvider::with_base_url("b".into(), "http://localhost")));
        assert_eq!(registry.providers().count(), 2);
    }
}
