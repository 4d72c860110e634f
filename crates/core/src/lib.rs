pub mod errors;
pub mod models;
pub mod presentation;
pub mod providers;
pub mod services;
pub mod storage;

use models::{
    holding::{AllocationSlice, PortfolioSummary},
    quote::QuoteBook,
    settings::Settings,
    transaction::{TradeRequest, Transaction, TransactionId, TransactionKind},
    user::{Session, User},
};
use presentation::table::{TransactionRow, TransactionTable};
use providers::registry::PriceProviderRegistry;
use services::{portfolio_service::PortfolioService, price_service::PriceService};
use storage::ledger_store::LedgerStore;
use tracing::info;

use errors::CoreError;

/// Main entry point for the stock-ledger-core library.
///
/// Holds the ledger store and the services that operate on it. Every call
/// that touches a user's data takes the caller's [`Session`]; there is no
/// hidden "current user".
#[must_use]
pub struct StockLedger {
    store: LedgerStore,
    price_service: PriceService,
    portfolio_service: PortfolioService,
}

impl std::fmt::Debug for StockLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockLedger")
            .field("store", &self.store)
            .field("providers", &self.price_service.provider_names())
            .finish()
    }
}

impl StockLedger {
    /// Open the database named in `settings` with the default quote providers.
    pub fn open(settings: &Settings) -> Result<Self, CoreError> {
        let store = LedgerStore::open(&settings.database_path)?;
        let registry = PriceProviderRegistry::new_with_defaults(settings);
        let price_service = PriceService::new(registry).with_timeout(settings.quote_timeout());
        Ok(Self::new(store, price_service))
    }

    /// Assemble a ledger from an already opened store and price service.
    pub fn new(store: LedgerStore, price_service: PriceService) -> Self {
        Self {
            store,
            price_service,
            portfolio_service: PortfolioService::new(),
        }
    }

    // ── Session ─────────────────────────────────────────────────────

    /// Log in by display name, creating the user on first use.
    pub fn login(&self, username: &str) -> Result<Session, CoreError> {
        let id = self.store.resolve_or_create_user(username)?;
        let user = User {
            id,
            username: username.trim().to_string(),
        };
        info!(user = %user.username, id = %id, "session started");
        Ok(Session::new(user))
    }

    // ── Transaction Management ──────────────────────────────────────

    /// Record a trade. Sells are checked against the quantity held,
    /// atomically with the append.
    pub fn record_trade(
        &mut self,
        session: &Session,
        request: &TradeRequest,
    ) -> Result<Transaction, CoreError> {
        self.store.record_trade(session.user_id(), request)
    }

    pub fn buy(
        &mut self,
        session: &Session,
        ticker: &str,
        quantity: f64,
        price: f64,
        date: Option<&str>,
    ) -> Result<Transaction, CoreError> {
        self.trade(session, TransactionKind::Buy, ticker, quantity, price, date)
    }

    /// Fails with `InsufficientHoldings` when `quantity` exceeds what is held.
    pub fn sell(
        &mut self,
        session: &Session,
        ticker: &str,
        quantity: f64,
        price: f64,
        date: Option<&str>,
    ) -> Result<Transaction, CoreError> {
        self.trade(session, TransactionKind::Sell, ticker, quantity, price, date)
    }

    /// Delete one of the session user's transactions.
    pub fn delete_transaction(
        &self,
        session: &Session,
        transaction_id: TransactionId,
    ) -> Result<(), CoreError> {
        self.store.delete_transaction(session.user_id(), transaction_id)
    }

    /// All of the user's transactions, in the order they were entered.
    pub fn transactions(&self, session: &Session) -> Result<Vec<Transaction>, CoreError> {
        self.store.list_transactions(session.user_id())
    }

    pub fn held_quantity(&self, session: &Session, ticker: &str) -> Result<f64, CoreError> {
        self.store.held_quantity(session.user_id(), ticker)
    }

    pub fn transaction_count(&self, session: &Session) -> Result<usize, CoreError> {
        self.store.transaction_count(session.user_id())
    }

    // ── Views ───────────────────────────────────────────────────────

    /// Transaction history rows, each with its ticker's current quote.
    /// One quote request per distinct ticker.
    pub async fn transaction_rows(&self, session: &Session) -> Result<Vec<TransactionRow>, CoreError> {
        let transactions = self.transactions(session)?;
        if transactions.is_empty() {
            return Ok(Vec::new());
        }

        let quotes = self
            .price_service
            .quote_all(transactions.iter().map(|t| t.ticker.as_str()))
            .await;

        Ok(transactions
            .iter()
            .map(|t| TransactionRow::new(t, quotes.get(&t.ticker)))
            .collect())
    }

    /// The transaction history as a sortable table.
    pub async fn transaction_table(&self, session: &Session) -> Result<TransactionTable, CoreError> {
        Ok(TransactionTable::new(self.transaction_rows(session).await?))
    }

    /// Holdings table and totals, priced with fresh quotes for open positions.
    pub async fn portfolio_summary(&self, session: &Session) -> Result<PortfolioSummary, CoreError> {
        let transactions = self.transactions(session)?;
        let tickers = self.portfolio_service.open_tickers(&transactions);
        let quotes = self.price_service.quote_all(&tickers).await;
        Ok(self.portfolio_service.summarize(&transactions, &quotes))
    }

    /// Holdings table and totals, priced with quotes the caller already has.
    pub fn summarize_with(
        &self,
        session: &Session,
        quotes: &QuoteBook,
    ) -> Result<PortfolioSummary, CoreError> {
        let transactions = self.transactions(session)?;
        Ok(self.portfolio_service.summarize(&transactions, quotes))
    }

    /// Market-value distribution over open positions.
    pub async fn distribution(&self, session: &Session) -> Result<Vec<AllocationSlice>, CoreError> {
        let summary = self.portfolio_summary(session).await?;
        Ok(self.distribution_of(&summary))
    }

    /// Distribution over a summary the caller already priced.
    pub fn distribution_of(&self, summary: &PortfolioSummary) -> Vec<AllocationSlice> {
        self.portfolio_service.distribution(summary)
    }

    // ── Export ──────────────────────────────────────────────────────

    /// Export the user's transactions as a JSON array.
    pub fn export_transactions_json(&self, session: &Session) -> Result<String, CoreError> {
        let transactions = self.transactions(session)?;
        serde_json::to_string_pretty(&transactions).map_err(|e| {
            CoreError::Serialization(format!("Failed to serialize transactions to JSON: {e}"))
        })
    }

    // ── Provider Availability ───────────────────────────────────────

    /// Names of the configured quote providers, in priority order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<String> {
        self.price_service.provider_names()
    }

    // ── Internal ────────────────────────────────────────────────────

    fn trade(
        &mut self,
        session: &Session,
        kind: TransactionKind,
        ticker: &str,
        quantity: f64,
        price: f64,
        date: Option<&str>,
    ) -> Result<Transaction, CoreError> {
        let request = TradeRequest {
            ticker: ticker.to_string(),
            quantity,
            price,
            date: date.map(str::to_string),
            kind,
        };
        self.record_trade(session, &request)
    }
}
