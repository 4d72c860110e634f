// ═══════════════════════════════════════════════════════════════════
// Integration Tests — StockLedger facade end to end, transaction
// table sorting, report formatting
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

use stock_ledger_core::errors::CoreError;
use stock_ledger_core::models::holding::{AllocationSlice, PortfolioSummary};
use stock_ledger_core::models::quote::{Quote, QuoteBook};
use stock_ledger_core::models::settings::Settings;
use stock_ledger_core::models::transaction::{TradeRequest, TransactionId, TransactionKind};
use stock_ledger_core::presentation::report::{
    distribution_title, format_money, slice_label, summary_rows, SUMMARY_HEADERS,
};
use stock_ledger_core::presentation::table::{Column, SortDirection, TransactionRow, TransactionTable};
use stock_ledger_core::providers::registry::PriceProviderRegistry;
use stock_ledger_core::providers::traits::PriceProvider;
use stock_ledger_core::services::price_service::PriceService;
use stock_ledger_core::storage::ledger_store::LedgerStore;
use stock_ledger_core::StockLedger;

// ═══════════════════════════════════════════════════════════════════
// Mock Price Provider (for testing without real API calls)
// ═══════════════════════════════════════════════════════════════════

struct MockPriceProvider {
    prices: HashMap<String, f64>,
}

impl MockPriceProvider {
    fn new() -> Self {
        let mut prices = HashMap::new();
        prices.insert("AAPL".to_string(), 25.0);
        prices.insert("MSFT".to_string(), 400.0);
        prices.insert("TSLA".to_string(), 1234.5);
        Self { prices }
    }
}

#[async_trait]
impl PriceProvider for MockPriceProvider {
    fn name(&self) -> &str {
        "MockProvider"
    }

    async fn get_current_price(&self, symbol: &str) -> Result<f64, CoreError> {
        self.prices.get(symbol).copied().ok_or_else(|| CoreError::Api {
            provider: "MockProvider".into(),
            message: format!("No price for {symbol}"),
        })
    }
}

fn ledger() -> StockLedger {
    let mut registry = PriceProviderRegistry::new();
    registry.register(Box::new(MockPriceProvider::new()));
    StockLedger::new(LedgerStore::open_in_memory().unwrap(), PriceService::new(registry))
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

// ═══════════════════════════════════════════════════════════════════
// StockLedger facade
// ═══════════════════════════════════════════════════════════════════

mod facade {
    use super::*;

    #[test]
    fn login_reuses_user() {
        let ledger = ledger();
        let a = ledger.login("alice").unwrap();
        let again = ledger.login(" alice ").unwrap();
        assert_eq!(a.user_id(), again.user_id());
        assert_eq!(again.username(), "alice");
        assert!(matches!(ledger.login(""), Err(CoreError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn buy_buy_sell_summary() {
        let mut ledger = ledger();
        let s = ledger.login("alice").unwrap();

        ledger.buy(&s, "aapl", 10.0, 10.0, Some("2024-01-02")).unwrap();
        ledger.buy(&s, "AAPL", 5.0, 20.0, Some("2024-01-03")).unwrap();
        ledger.sell(&s, "AAPL", 12.0, 30.0, Some("2024-01-04")).unwrap();

        let summary = ledger.portfolio_summary(&s).await.unwrap();
        let h = summary.holding("AAPL").unwrap();
        assert_close(h.quantity, 3.0);
        assert_close(h.cost_basis, 200.0);
        assert_close(h.market_value, 75.0);
        assert_eq!(h.current_price, Quote::Available(25.0));
    }

    #[tokio::test]
    async fn oversell_is_rejected_and_ledger_unchanged() {
        let mut ledger = ledger();
        let s = ledger.login("alice").unwrap();
        ledger.buy(&s, "AAPL", 10.0, 10.0, None).unwrap();
        ledger.buy(&s, "AAPL", 5.0, 20.0, None).unwrap();

        let err = ledger.sell(&s, "AAPL", 20.0, 30.0, None).unwrap_err();
        assert_eq!(err.held_quantity(), Some(15.0));
        assert_eq!(ledger.transaction_count(&s).unwrap(), 2);
        assert_close(ledger.held_quantity(&s, "AAPL").unwrap(), 15.0);
    }

    #[tokio::test]
    async fn unknown_ticker_still_listed_with_zero_price() {
        let mut ledger = ledger();
        let s = ledger.login("alice").unwrap();
        ledger.buy(&s, "ZZZ", 2.0, 5.0, None).unwrap();

        let summary = ledger.portfolio_summary(&s).await.unwrap();
        let h = summary.holding("ZZZ").unwrap();
        assert!(h.current_price.is_unavailable());
        assert_close(h.market_value, 0.0);
        assert_eq!(summary.zero_priced().len(), 1);

        let table = ledger.transaction_table(&s).await.unwrap();
        assert_eq!(table.zero_priced_rows().len(), 1);
        assert_eq!(table.rows()[0].cell(Column::CurrentPrice), "0.00");
    }

    #[tokio::test]
    async fn fully_sold_positions_disappear_from_views() {
        let mut ledger = ledger();
        let s = ledger.login("alice").unwrap();
        ledger.buy(&s, "AAPL", 5.0, 10.0, None).unwrap();
        ledger.sell(&s, "AAPL", 5.0, 12.0, None).unwrap();

        assert!(ledger.portfolio_summary(&s).await.unwrap().is_empty());
        assert!(ledger.distribution(&s).await.unwrap().is_empty());
        // History still shows both trades.
        assert_eq!(ledger.transaction_rows(&s).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_then_views_reflect_it() {
        let mut ledger = ledger();
        let s = ledger.login("alice").unwrap();
        let t = ledger.buy(&s, "MSFT", 1.0, 300.0, None).unwrap();
        ledger.delete_transaction(&s, t.id).unwrap();

        assert!(ledger.transactions(&s).unwrap().is_empty());
        assert!(ledger.transaction_rows(&s).await.unwrap().is_empty());
        assert!(matches!(
            ledger.delete_transaction(&s, t.id),
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let mut ledger = ledger();
        let alice = ledger.login("alice").unwrap();
        let bob = ledger.login("bob").unwrap();
        let t = ledger.buy(&alice, "AAPL", 1.0, 1.0, None).unwrap();

        assert!(ledger.portfolio_summary(&bob).await.unwrap().is_empty());
        assert!(ledger.delete_transaction(&bob, t.id).is_err());
        assert!(ledger.sell(&bob, "AAPL", 1.0, 1.0, None).is_err());
    }

    #[tokio::test]
    async fn distribution_matches_summary() {
        let mut ledger = ledger();
        let s = ledger.login("alice").unwrap();
        ledger.buy(&s, "AAPL", 4.0, 20.0, None).unwrap();
        ledger.buy(&s, "MSFT", 1.0, 300.0, None).unwrap();

        let summary = ledger.portfolio_summary(&s).await.unwrap();
        let slices = ledger.distribution(&s).await.unwrap();
        assert_eq!(slices, ledger.distribution_of(&summary));
        assert_close(slices.iter().map(|s| s.share_pct).sum(), 100.0);
        assert_close(slices[0].market_value, 100.0);
        assert_close(slices[1].market_value, 400.0);
    }

    #[test]
    fn summarize_with_given_quotes() {
        let mut ledger = ledger();
        let s = ledger.login("alice").unwrap();
        ledger.buy(&s, "AAPL", 2.0, 10.0, None).unwrap();

        let mut quotes = QuoteBook::new();
        quotes.insert("AAPL", Quote::Available(15.0));
        let summary = ledger.summarize_with(&s, &quotes).unwrap();
        assert_close(summary.totals.total_value, 30.0);
        assert_close(summary.totals.total_return_pct, 50.0);
    }

    #[test]
    fn record_trade_with_request() {
        let mut ledger = ledger();
        let s = ledger.login("alice").unwrap();
        let t = ledger
            .record_trade(&s, &TradeRequest::buy("nvda", 3.0, 100.0).on("20240215"))
            .unwrap();
        assert_eq!(t.ticker, "NVDA");
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        assert_eq!(t.kind, TransactionKind::Buy);
    }

    #[test]
    fn export_json_lists_every_transaction() {
        let mut ledger = ledger();
        let s = ledger.login("alice").unwrap();
        ledger.buy(&s, "AAPL", 2.0, 10.0, Some("2024-01-02")).unwrap();
        ledger.sell(&s, "AAPL", 1.0, 12.0, Some("2024-01-03")).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&ledger.export_transactions_json(&s).unwrap()).unwrap();
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["kind"], "sell");
        assert_eq!(items[1]["date"], "2024-01-03");
    }

    #[test]
    fn open_with_settings_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let settings = Settings {
            yahoo_fallback: false,
            ..Settings::default()
        }
        .with_database_path(path.to_string_lossy());

        {
            let mut ledger = StockLedger::open(&settings).unwrap();
            assert!(ledger.provider_names().is_empty());
            let s = ledger.login("alice").unwrap();
            ledger.buy(&s, "AAPL", 1.0, 1.0, None).unwrap();
        }

        let ledger = StockLedger::open(&settings).unwrap();
        let s = ledger.login("alice").unwrap();
        assert_eq!(ledger.transaction_count(&s).unwrap(), 1);
    }

    #[tokio::test]
    async fn no_providers_everything_reads_zero() {
        let mut ledger = StockLedger::new(
            LedgerStore::open_in_memory().unwrap(),
            PriceService::new(PriceProviderRegistry::new()),
        );
        let s = ledger.login("alice").unwrap();
        ledger.buy(&s, "AAPL", 1.0, 10.0, None).unwrap();

        let summary = ledger.portfolio_summary(&s).await.unwrap();
        assert_close(summary.totals.total_value, 0.0);
        assert_close(summary.totals.total_return_pct, -100.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Transaction table sorting
// ═══════════════════════════════════════════════════════════════════

mod table_sorting {
    use super::*;
    use stock_ledger_core::models::transaction::Transaction;
    use stock_ledger_core::models::user::UserId;

    fn row(id: i64, date: (i32, u32, u32), ticker: &str, qty: f64, price: f64, quote: Quote) -> TransactionRow {
        let t = Transaction {
            id: TransactionId(id),
            user_id: UserId(1),
            ticker: ticker.into(),
            quantity: qty,
            price,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            kind: TransactionKind::Buy,
        };
        TransactionRow::new(&t, quote)
    }

    fn table() -> TransactionTable {
        TransactionTable::new(vec![
            row(1, (2024, 3, 1), "MSFT", 9.0, 300.0, Quote::Available(410.0)),
            row(2, (2024, 1, 15), "AAPL", 10.0, 1500.0, Quote::Unavailable),
            row(3, (2023, 12, 31), "TSLA", 100.0, 20.0, Quote::Available(1234.5)),
        ])
    }

    fn ids(t: &TransactionTable) -> Vec<i64> {
        t.rows().iter().map(|r| r.id.0).collect()
    }

    #[test]
    fn numeric_columns_sort_numerically() {
        let mut t = table();
        // As text "100" < "9"; numerically 9 < 10 < 100.
        assert_eq!(t.sort_by(Column::Quantity), SortDirection::Ascending);
        assert_eq!(ids(&t), vec![1, 2, 3]);

        t.sort_by(Column::Price);
        assert_eq!(ids(&t), vec![3, 1, 2]);
    }

    #[test]
    fn repeated_sort_reverses() {
        let mut t = table();
        t.sort_by(Column::Ticker);
        assert_eq!(ids(&t), vec![2, 1, 3]);
        assert_eq!(t.sort_by(Column::Ticker), SortDirection::Descending);
        assert_eq!(ids(&t), vec![3, 1, 2]);
        assert_eq!(t.sort_by(Column::Ticker), SortDirection::Ascending);
    }

    #[test]
    fn switching_column_starts_ascending() {
        let mut t = table();
        t.sort_by(Column::Ticker);
        t.sort_by(Column::Ticker);
        assert_eq!(t.sort_by(Column::Date), SortDirection::Ascending);
        assert_eq!(ids(&t), vec![3, 2, 1]);
        assert_eq!(t.sort_state(), Some((Column::Date, SortDirection::Ascending)));
    }

    #[test]
    fn current_price_treats_unavailable_as_zero() {
        let mut t = table();
        t.sort_by(Column::CurrentPrice);
        assert_eq!(ids(&t), vec![2, 1, 3]);
        assert_eq!(t.zero_priced_rows().len(), 1);
    }

    #[test]
    fn new_rows_keep_the_active_sort() {
        let mut t = table();
        t.sort_by(Column::Ticker);
        t.sort_by(Column::Ticker);
        t.set_rows(vec![
            row(4, (2024, 1, 1), "AMZN", 1.0, 1.0, Quote::Unavailable),
            row(5, (2024, 1, 1), "NVDA", 1.0, 1.0, Quote::Unavailable),
        ]);
        assert_eq!(ids(&t), vec![5, 4]);
    }

    #[test]
    fn cells_are_formatted() {
        let r = row(1, (2024, 3, 1), "MSFT", 2.5, 300.0, Quote::Available(410.126));
        assert_eq!(
            r.cells(),
            vec!["2024-03-01", "MSFT", "2.5", "300.00", "buy", "410.13"]
        );
    }

    #[test]
    fn column_names_parse() {
        assert_eq!("date".parse::<Column>().unwrap(), Column::Date);
        assert_eq!("Current Price".parse::<Column>().unwrap(), Column::CurrentPrice);
        assert_eq!("qty".parse::<Column>().unwrap(), Column::Quantity);
        assert_eq!("TYPE".parse::<Column>().unwrap(), Column::Kind);
        assert!("volume".parse::<Column>().is_err());
    }

    #[test]
    fn empty_table() {
        let mut t = TransactionTable::default();
        assert!(t.is_empty());
        t.sort_by(Column::Date);
        assert!(t.rows().is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Report formatting
// ═══════════════════════════════════════════════════════════════════

mod report {
    use super::*;
    use stock_ledger_core::models::holding::{Holding, PortfolioTotals};

    #[test]
    fn money_has_thousands_separators() {
        assert_eq!(format_money(0.0), "0.00");
        assert_eq!(format_money(999.999), "1,000.00");
        assert_eq!(format_money(1234567.891), "1,234,567.89");
        assert_eq!(format_money(-1234.5), "-1,234.50");
        assert_eq!(format_money(-0.001), "0.00");
    }

    #[test]
    fn summary_rows_end_with_blank_and_total() {
        let summary = PortfolioSummary {
            holdings: vec![Holding {
                ticker: "AAPL".into(),
                quantity: 3.0,
                average_price: 200.0 / 3.0,
                current_price: Quote::Available(25.0),
                cost_basis: 200.0,
                market_value: 75.0,
                gain_loss: -125.0,
                return_pct: -62.5,
            }],
            totals: PortfolioTotals {
                total_cost: 2000.0,
                total_value: 1500.0,
                total_gain_loss: -500.0,
                total_return_pct: -25.0,
            },
        };

        let rows = summary_rows(&summary);
        assert_eq!(SUMMARY_HEADERS.len(), 8);
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            ["AAPL", "3", "66.67", "25.00", "200.00", "75.00", "-125.00", "-62.50%"].map(String::from)
        );
        assert!(rows[1].iter().all(String::is_empty));
        assert_eq!(
            rows[2],
            ["TOTAL", "", "", "", "2,000.00", "1,500.00", "-500.00", "-25.00%"].map(String::from)
        );
    }

    #[test]
    fn slice_label_and_title() {
        let slice = AllocationSlice {
            ticker: "AAPL".into(),
            market_value: 1875.0,
            share_pct: 50.0,
        };
        assert_eq!(slice_label(&slice), "AAPL ($1,875.00)");
        assert_eq!(
            distribution_title(3750.0),
            "Portfolio Distribution by Market Value\nTotal: $3,750.00"
        );
    }
}
