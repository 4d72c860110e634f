use crate::models::holding::{AllocationSlice, Holding, PortfolioSummary, PortfolioTotals};

pub const NO_TRANSACTIONS: &str = "No transactions found.";
pub const ALL_POSITIONS_SOLD: &str = "All positions have been sold.";
pub const ZERO_PRICE_HINT: &str = "If Current Price is 0, delete it";

pub const SUMMARY_HEADERS: [&str; 8] = [
    "Ticker",
    "Quantity",
    "Avg Buy",
    "Current",
    "Cost",
    "Value",
    "Gain/Loss",
    "Return %",
];

/// `1234567.891` → `"1,234,567.89"`. Negative values keep their sign.
pub fn format_money(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

fn holding_row(h: &Holding) -> [String; 8] {
    [
        h.ticker.clone(),
        h.quantity.to_string(),
        format!("{:.2}", h.average_price),
        format!("{:.2}", h.current_price.value_or_zero()),
        format!("{:.2}", h.cost_basis),
        format!("{:.2}", h.market_value),
        format!("{:.2}", h.gain_loss),
        format!("{:.2}%", h.return_pct),
    ]
}

fn totals_row(t: &PortfolioTotals) -> [String; 8] {
    [
        "TOTAL".to_string(),
        String::new(),
        String::new(),
        String::new(),
        format_money(t.total_cost),
        format_money(t.total_value),
        format_money(t.total_gain_loss),
        format!("{:.2}%", t.total_return_pct),
    ]
}

/// Body of the stock summary table: one row per holding, a blank
/// separator row, then the `TOTAL` row.
pub fn summary_rows(summary: &PortfolioSummary) -> Vec<[String; 8]> {
    let mut rows: Vec<[String; 8]> = summary.holdings.iter().map(holding_row).collect();
    rows.push(Default::default());
    rows.push(totals_row(&summary.totals));
    rows
}

/// Pie slice label, e.g. `"AAPL ($1,875.00)"`.
pub fn slice_label(slice: &AllocationSlice) -> String {
    format!("{} (${})", slice.ticker, format_money(slice.market_value))
}

pub fn distribution_title(total_value: f64) -> String {
    format!(
        "Portfolio Distribution by Market Value\nTotal: ${}",
        format_money(total_value)
    )
}
