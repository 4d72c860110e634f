use std::io::{self, Write};

use clap::error::ErrorKind;
use tracing::{debug, warn};

use stock_ledger_core::errors::CoreError;
use stock_ledger_core::models::transaction::{TradeRequest, TransactionId, TransactionKind};
use stock_ledger_core::models::user::Session;
use stock_ledger_core::presentation::report::{ALL_POSITIONS_SOLD, NO_TRANSACTIONS};
use stock_ledger_core::presentation::table::{Column, TransactionTable};
use stock_ledger_core::services::transaction_validator::TransactionValidator;
use stock_ledger_core::StockLedger;

use crate::render;
use crate::repl::{self, Command, TradeArgs};

/// What the loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn prompt(text: &str) -> io::Result<()> {
    print!("{text}");
    io::stdout().flush()
}

/// Read and run commands until `quit` or end of input.
///
/// A failing command is reported and the next line is read; ledger errors,
/// including database errors, never end the session. Only reading stdin or
/// writing the prompt can fail this function.
pub async fn run_loop<I>(
    ledger: &mut StockLedger,
    session: &Session,
    view: &mut TransactionTable,
    mut lines: I,
) -> io::Result<()>
where
    I: Iterator<Item = io::Result<String>>,
{
    loop {
        prompt("> ")?;
        let Some(line) = lines.next().transpose()? else {
            break;
        };

        let command = match repl::parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) =>
            {
                println!("{e}");
                continue;
            }
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        debug!(?command, "command");

        match execute(ledger, session, view, command).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e @ CoreError::NotFound(_)) => eprintln!("Warning: {e}"),
            Err(e) => {
                warn!(error = %e, "command failed");
                eprintln!("Error: {e}");
            }
        }
    }
    Ok(())
}

/// Run one parsed command.
pub async fn execute(
    ledger: &mut StockLedger,
    session: &Session,
    view: &mut TransactionTable,
    command: Command,
) -> Result<Flow, CoreError> {
    match command {
        Command::Buy(args) => trade(ledger, session, view, TransactionKind::Buy, args).await?,
        Command::Sell(args) => trade(ledger, session, view, TransactionKind::Sell, args).await?,
        Command::Delete { id } => {
            ledger.delete_transaction(session, TransactionId(id))?;
            println!("Transaction {id} deleted.");
            refresh(ledger, session, view).await?;
        }
        Command::List => refresh(ledger, session, view).await?,
        Command::Sort { column } => {
            view.sort_by(column.parse::<Column>()?);
            show_history(view);
        }
        Command::Summary => show_summary(ledger, session).await?,
        Command::Chart => show_chart(ledger, session).await?,
        Command::Export => println!("{}", ledger.export_transactions_json(session)?),
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Re-read the ledger and re-render the history, keeping the active sort.
pub async fn refresh(
    ledger: &StockLedger,
    session: &Session,
    view: &mut TransactionTable,
) -> Result<(), CoreError> {
    let rows = ledger.transaction_rows(session).await?;
    view.set_rows(rows);
    show_history(view);
    Ok(())
}

fn show_history(view: &TransactionTable) {
    if view.is_empty() {
        println!("{NO_TRANSACTIONS}");
        return;
    }
    println!("{}", render::transaction_table(view));
    if !view.zero_priced_rows().is_empty() {
        render::print_zero_price_hint();
    }
}

async fn trade(
    ledger: &mut StockLedger,
    session: &Session,
    view: &mut TransactionTable,
    kind: TransactionKind,
    args: TradeArgs,
) -> Result<(), CoreError> {
    let validator = TransactionValidator::new();
    let request = TradeRequest {
        quantity: validator.parse_number("quantity", &args.quantity)?,
        price: validator.parse_number("price", &args.price)?,
        ticker: args.ticker,
        date: args.date,
        kind,
    };

    let txn = ledger.record_trade(session, &request)?;
    println!(
        "Recorded {} {} {} @ {:.2} on {} (id {}).",
        txn.kind, txn.quantity, txn.ticker, txn.price, txn.date, txn.id
    );
    refresh(ledger, session, view).await
}

async fn show_summary(ledger: &StockLedger, session: &Session) -> Result<(), CoreError> {
    if ledger.transaction_count(session)? == 0 {
        println!("{NO_TRANSACTIONS}");
        return Ok(());
    }

    let summary = ledger.portfolio_summary(session).await?;
    if summary.is_empty() {
        println!("{ALL_POSITIONS_SOLD}");
        return Ok(());
    }

    println!("{}", render::summary_table(&summary));
    if !summary.zero_priced().is_empty() {
        render::print_zero_price_hint();
    }
    Ok(())
}

async fn show_chart(ledger: &StockLedger, session: &Session) -> Result<(), CoreError> {
    if ledger.transaction_count(session)? == 0 {
        println!("{NO_TRANSACTIONS}");
        return Ok(());
    }

    let summary = ledger.portfolio_summary(session).await?;
    if summary.is_empty() {
        println!("{ALL_POSITIONS_SOLD}");
        return Ok(());
    }

    let slices = ledger.distribution_of(&summary);
    render::draw_distribution(&slices, summary.totals.total_value);
    Ok(())
}
