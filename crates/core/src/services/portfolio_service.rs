use std::collections::BTreeMap;

use crate::models::holding::{AllocationSlice, Holding, PortfolioSummary, PortfolioTotals, Position};
use crate::models::quote::{Quote, QuoteBook};
use crate::models::transaction::{normalize_ticker, Transaction};

/// Turns a user's transactions into holdings, cost basis and gain/loss.
///
/// Pure business logic, no I/O, no API calls. Prices come in through a
/// [`QuoteBook`] that the caller filled beforehand.
///
/// Accounting model: cost basis is the sum of every buy (quantity × price)
/// and is never reduced by sells. The average price is that cost spread over
/// the shares still held. This is an approximation, not FIFO/LIFO lot
/// accounting.
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    /// Net quantity and cost basis for every ticker that appears in
    /// `transactions`, closed positions included. Ordered by ticker.
    pub fn positions(&self, transactions: &[Transaction]) -> Vec<Position> {
        let mut by_ticker: BTreeMap<&str, Position> = BTreeMap::new();

        for txn in transactions {
            let position = by_ticker
                .entry(txn.ticker.as_str())
                .or_insert_with(|| Position {
                    ticker: txn.ticker.clone(),
                    quantity: 0.0,
                    cost_basis: 0.0,
                    traded: 0.0,
                });
            position.quantity += txn.signed_quantity();
            position.traded += txn.quantity.abs();
            position.cost_basis += txn.cost();
        }

        by_ticker.into_values().collect()
    }

    /// Positions with a positive net quantity. Fully sold (or oversold)
    /// tickers are treated as closed and left out.
    pub fn open_positions(&self, transactions: &[Transaction]) -> Vec<Position> {
        self.positions(transactions)
            .into_iter()
            .filter(Position::is_open)
            .collect()
    }

    /// Tickers of the open positions; the set that needs quotes for a summary.
    pub fn open_tickers(&self, transactions: &[Transaction]) -> Vec<String> {
        self.open_positions(transactions)
            .into_iter()
            .map(|p| p.ticker)
            .collect()
    }

    /// Σ buys − Σ sells of `ticker`; 0 if it never traded.
    pub fn held_quantity(&self, transactions: &[Transaction], ticker: &str) -> f64 {
        let ticker = normalize_ticker(ticker);
        transactions
            .iter()
            .filter(|t| t.ticker == ticker)
            .map(Transaction::signed_quantity)
            .sum()
    }

    /// Price one open position.
    pub fn price_position(&self, position: &Position, quote: Quote) -> Holding {
        let market_value = position.quantity * quote.value_or_zero();
        let gain_loss = market_value - position.cost_basis;

        Holding {
            ticker: position.ticker.clone(),
            quantity: position.quantity,
            average_price: ratio(position.cost_basis, position.quantity),
            current_price: quote,
            cost_basis: position.cost_basis,
            market_value,
            gain_loss,
            return_pct: ratio(gain_loss, position.cost_basis) * 100.0,
        }
    }

    /// Holdings table plus totals, over open positions only.
    ///
    /// Tickers missing from `quotes` are valued as unavailable (price 0);
    /// a failed quote never removes a ticker from the table.
    pub fn summarize(&self, transactions: &[Transaction], quotes: &QuoteBook) -> PortfolioSummary {
        let holdings: Vec<Holding> = self
            .open_positions(transactions)
            .iter()
            .map(|p| self.price_position(p, quotes.get(&p.ticker)))
            .collect();

        let totals = self.totals(&holdings);
        PortfolioSummary { holdings, totals }
    }

    /// Sum the holdings rows into the totals row.
    pub fn totals(&self, holdings: &[Holding]) -> PortfolioTotals {
        let total_cost: f64 = holdings.iter().map(|h| h.cost_basis).sum();
        let total_value: f64 = holdings.iter().map(|h| h.market_value).sum();
        let total_gain_loss: f64 = holdings.iter().map(|h| h.gain_loss).sum();

        PortfolioTotals {
            total_cost,
            total_value,
            total_gain_loss,
            total_return_pct: ratio(total_gain_loss, total_cost) * 100.0,
        }
    }

    /// Market-value distribution over the same holdings as the summary.
    pub fn distribution(&self, summary: &PortfolioSummary) -> Vec<AllocationSlice> {
        let total = summary.totals.total_value;
        summary
            .holdings
            .iter()
            .map(|h| AllocationSlice {
                ticker: h.ticker.clone(),
                market_value: h.market_value,
                share_pct: ratio(h.market_value, total) * 100.0,
            })
            .collect()
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}

/// `numerator / denominator`, or 0 when the denominator is 0.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
