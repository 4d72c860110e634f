use std::cmp::Ordering;

use crate::errors::CoreError;
use crate::models::quote::Quote;
use crate::models::transaction::{Transaction, TransactionId, TransactionKind};
use crate::storage::schema::DATE_FORMAT;

/// Columns of the transaction history table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Date,
    Ticker,
    Quantity,
    Price,
    Kind,
    CurrentPrice,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Date,
        Column::Ticker,
        Column::Quantity,
        Column::Price,
        Column::Kind,
        Column::CurrentPrice,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Column::Date => "Date",
            Column::Ticker => "Ticker",
            Column::Quantity => "Quantity",
            Column::Price => "Avg Price",
            Column::Kind => "Type",
            Column::CurrentPrice => "Current Price",
        }
    }
}

impl std::str::FromStr for Column {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "date" => Ok(Column::Date),
            "ticker" | "symbol" => Ok(Column::Ticker),
            "quantity" | "qty" => Ok(Column::Quantity),
            "price" | "avgprice" => Ok(Column::Price),
            "type" | "kind" => Ok(Column::Kind),
            "current" | "currentprice" => Ok(Column::CurrentPrice),
            _ => Err(CoreError::InvalidInput(format!("Unknown column '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// One displayed transaction, joined with its ticker's current quote.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub id: TransactionId,
    pub date: chrono::NaiveDate,
    pub ticker: String,
    pub quantity: f64,
    pub price: f64,
    pub kind: TransactionKind,
    pub current_price: Quote,
}

impl TransactionRow {
    pub fn new(transaction: &Transaction, current_price: Quote) -> Self {
        Self {
            id: transaction.id,
            date: transaction.date,
            ticker: transaction.ticker.clone(),
            quantity: transaction.quantity,
            price: transaction.price,
            kind: transaction.kind,
            current_price,
        }
    }

    /// Text shown in `column`.
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::Date => self.date.format(DATE_FORMAT).to_string(),
            Column::Ticker => self.ticker.clone(),
            Column::Quantity => self.quantity.to_string(),
            Column::Price => format!("{:.2}", self.price),
            Column::Kind => self.kind.to_string(),
            Column::CurrentPrice => format!("{:.2}", self.current_price.value_or_zero()),
        }
    }

    pub fn cells(&self) -> Vec<String> {
        Column::ALL.iter().map(|c| self.cell(*c)).collect()
    }
}

/// The transaction history as currently displayed, with click-to-sort state.
#[derive(Debug, Clone, Default)]
pub struct TransactionTable {
    rows: Vec<TransactionRow>,
    sort: Option<(Column, SortDirection)>,
}

impl TransactionTable {
    pub fn new(rows: Vec<TransactionRow>) -> Self {
        Self { rows, sort: None }
    }

    pub fn rows(&self) -> &[TransactionRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The active sort, if any.
    pub fn sort_state(&self) -> Option<(Column, SortDirection)> {
        self.sort
    }

    /// Replace the rows after a re-render. An active sort is re-applied.
    pub fn set_rows(&mut self, rows: Vec<TransactionRow>) {
        self.rows = rows;
        if let Some((column, direction)) = self.sort {
            self.apply(column, direction);
        }
    }

    /// Sort by `column`. Repeating the request on the same column flips the
    /// direction; a different column starts ascending.
    pub fn sort_by(&mut self, column: Column) -> SortDirection {
        let direction = match self.sort {
            Some((current, direction)) if current == column => direction.toggled(),
            _ => SortDirection::Ascending,
        };
        self.sort = Some((column, direction));
        self.apply(column, direction);
        direction
    }

    /// Rows whose current price reads as 0 and should be reviewed.
    pub fn zero_priced_rows(&self) -> Vec<&TransactionRow> {
        self.rows
            .iter()
            .filter(|r| r.current_price.reads_as_zero())
            .collect()
    }

    /// Numeric ordering when every cell of the column parses as a number
    /// (thousands separators ignored), otherwise plain string ordering.
    fn apply(&mut self, column: Column, direction: SortDirection) {
        let mut keyed: Vec<(String, TransactionRow)> = self
            .rows
            .drain(..)
            .map(|row| (row.cell(column), row))
            .collect();

        let numbers: Option<Vec<f64>> = keyed.iter().map(|(cell, _)| parse_numeric(cell)).collect();

        match numbers {
            Some(numbers) => {
                let mut indexed: Vec<(f64, (String, TransactionRow))> =
                    numbers.into_iter().zip(keyed).collect();
                indexed.sort_by(|a, b| order(a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal), direction));
                self.rows = indexed.into_iter().map(|(_, (_, row))| row).collect();
            }
            None => {
                keyed.sort_by(|a, b| order(a.0.cmp(&b.0), direction));
                self.rows = keyed.into_iter().map(|(_, row)| row).collect();
            }
        }
    }
}

fn parse_numeric(cell: &str) -> Option<f64> {
    cell.replace(',', "")
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn order(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}
