mod commands;
mod render;
mod repl;

use std::io::{self, BufRead};
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{info, warn};

use stock_ledger_core::errors::CoreError;
use stock_ledger_core::models::settings::Settings;
use stock_ledger_core::presentation::table::TransactionTable;
use stock_ledger_core::StockLedger;

use commands::prompt;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so they never interleave with tables on stdout.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();
}

async fn run() -> Result<ExitCode> {
    let settings = Settings::from_env().context("invalid configuration")?;
    let mut ledger = StockLedger::open(&settings)
        .with_context(|| format!("cannot open ledger database '{}'", settings.database_path))?;
    info!(providers = ?ledger.provider_names(), "ledger ready");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    prompt("Enter your username: ")?;
    let username = lines.next().transpose()?.unwrap_or_default();
    let session = match ledger.login(&username) {
        Ok(session) => session,
        Err(CoreError::InvalidInput(_)) => {
            eprintln!("Username is required.");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e).context("login failed"),
    };
    println!("Welcome, {}! Type 'help' for commands.", session.username());

    let mut view = TransactionTable::default();
    if let Err(e) = commands::refresh(&ledger, &session, &mut view).await {
        warn!(error = %e, "initial history render failed");
        eprintln!("Error: {e}");
    }

    commands::run_loop(&mut ledger, &session, &mut view, lines).await?;

    println!("Goodbye.");
    Ok(ExitCode::SUCCESS)
}

