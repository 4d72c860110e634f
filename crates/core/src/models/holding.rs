use serde::{Deserialize, Serialize};

use super::quote::Quote;
use super::transaction::quantity_tolerance;

/// Net position in one ticker before pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,

    /// Σ buys − Σ sells
    pub quantity: f64,

    /// Σ (buy quantity × buy price). Sells never reduce it.
    pub cost_basis: f64,

    /// Σ |quantity| over every trade; the scale of any rounding residue in `quantity`.
    #[serde(default)]
    pub traded: f64,
}

impl Position {
    /// A position with nothing (or less than nothing) left is closed.
    pub fn is_open(&self) -> bool {
        self.quantity > quantity_tolerance(self.traded)
    }
}

/// One priced row of the holdings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,

    /// Signed quantity held (always > 0 for rows in a summary)
    pub quantity: f64,

    /// Average price: cost_basis / quantity
    pub average_price: f64,

    /// Quote used for valuation
    pub current_price: Quote,

    /// Σ (buy quantity × buy price)
    pub cost_basis: f64,

    /// quantity × current price (0 when the quote is unavailable)
    pub market_value: f64,

    /// market_value − cost_basis
    pub gain_loss: f64,

    /// gain_loss / cost_basis × 100, or 0 when cost_basis is 0
    pub return_pct: f64,
}

/// Totals row of the holdings table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub total_cost: f64,
    pub total_value: f64,
    pub total_gain_loss: f64,
    /// total_gain_loss / total_cost × 100, or 0 when total_cost is 0
    pub total_return_pct: f64,
}

/// Per-ticker holdings plus totals, over open positions only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub holdings: Vec<Holding>,
    pub totals: PortfolioTotals,
}

impl PortfolioSummary {
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn holding(&self, ticker: &str) -> Option<&Holding> {
        let upper = ticker.to_uppercase();
        self.holdings.iter().find(|h| h.ticker == upper)
    }

    /// Holdings whose current price displays as 0.
    pub fn zero_priced(&self) -> Vec<&Holding> {
        self.holdings
            .iter()
            .filter(|h| h.current_price.reads_as_zero())
            .collect()
    }
}

/// One slice of the market-value distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub ticker: String,
    pub market_value: f64,
    /// Share of the total market value, 0–100 (0 when the total is 0)
    pub share_pct: f64,
}
