use comfy_table::{presets::UTF8_FULL, Attribute, Cell, CellAlignment, Color as TColor, ContentArrangement, Table};
use piechart::{Chart, Color, Data};

use stock_ledger_core::models::holding::{AllocationSlice, PortfolioSummary};
use stock_ledger_core::presentation::report::{
    distribution_title, slice_label, summary_rows, SUMMARY_HEADERS, ZERO_PRICE_HINT,
};
use stock_ledger_core::presentation::table::{Column, SortDirection, TransactionTable};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn right(text: impl Into<String>) -> Cell {
    Cell::new(text.into()).set_alignment(CellAlignment::Right)
}

fn signed(text: String, value: f64) -> Cell {
    let color = if value >= 0.0 { TColor::Green } else { TColor::Red };
    right(text).fg(color)
}

/// Transaction history, with the id users need for `delete`.
pub fn transaction_table(view: &TransactionTable) -> Table {
    let mut table = new_table();

    let sort = view.sort_state();
    let mut header = vec![Cell::new("ID").add_attribute(Attribute::Bold)];
    header.extend(Column::ALL.iter().map(|column| {
        let marker = match sort {
            Some((active, SortDirection::Ascending)) if active == *column => " ▲",
            Some((active, SortDirection::Descending)) if active == *column => " ▼",
            _ => "",
        };
        Cell::new(format!("{}{marker}", column.header())).add_attribute(Attribute::Bold)
    }));
    table.set_header(header);

    for row in view.rows() {
        let mut cells = vec![right(row.id.to_string())];
        for column in Column::ALL {
            let text = row.cell(column);
            let cell = match column {
                Column::Date | Column::Ticker | Column::Kind => Cell::new(text),
                Column::CurrentPrice if row.current_price.reads_as_zero() => {
                    right(text).fg(TColor::Yellow)
                }
                _ => right(text),
            };
            cells.push(cell);
        }
        table.add_row(cells);
    }

    table
}

/// Holdings table followed by the blank separator and the TOTAL row.
pub fn summary_table(summary: &PortfolioSummary) -> Table {
    let mut table = new_table();
    table.set_header(
        SUMMARY_HEADERS
            .iter()
            .map(|h| Cell::new(*h).add_attribute(Attribute::Bold)),
    );

    let rows = summary_rows(summary);
    let total_index = rows.len() - 1;
    for (i, row) in rows.into_iter().enumerate() {
        let [ticker, quantity, avg, current, cost, value, gain, ret] = row;
        let gain_value = if i == total_index {
            summary.totals.total_gain_loss
        } else {
            summary.holdings.get(i).map_or(0.0, |h| h.gain_loss)
        };

        let mut cells = vec![
            Cell::new(ticker),
            right(quantity),
            right(avg),
            right(current),
            right(cost),
            right(value),
        ];
        if gain.is_empty() {
            cells.push(right(gain));
            cells.push(right(ret));
        } else {
            cells.push(signed(gain, gain_value));
            cells.push(signed(ret, gain_value));
        }
        if i == total_index {
            cells = cells
                .into_iter()
                .map(|c| c.add_attribute(Attribute::Bold))
                .collect();
        }
        table.add_row(cells);
    }

    table
}

/// Draw the market-value distribution as a terminal pie chart.
pub fn draw_distribution(slices: &[AllocationSlice], total_value: f64) {
    let colors = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Cyan,
        Color::White,
        Color::Purple,
    ];

    let data: Vec<Data> = slices
        .iter()
        .enumerate()
        .map(|(i, slice)| Data {
            label: format!("{} {:.1}%", slice_label(slice), slice.share_pct),
            value: slice.market_value as f32,
            color: Some(colors[i % colors.len()].into()),
            fill: '•',
        })
        .collect();

    println!("{}", distribution_title(total_value));
    if total_value <= 0.0 {
        // Nothing to draw when every quote came back unavailable.
        for line in data.iter().map(|d| &d.label) {
            println!("  {line}");
        }
        return;
    }

    Chart::new()
        .legend(true)
        .radius(9)
        .aspect_ratio(3)
        .draw(&data);
}

pub fn print_zero_price_hint() {
    println!("{ZERO_PRICE_HINT}");
}
