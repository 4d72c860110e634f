use clap::{Args, Parser, Subcommand};

/// One line typed at the ledger prompt.
#[derive(Debug, Parser)]
#[command(
    name = "stock-ledger",
    no_binary_name = true,
    disable_version_flag = true,
    about = "Record trades and review your stock portfolio"
)]
struct CommandLine {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Record a purchase
    Buy(TradeArgs),

    /// Record a sale (cannot exceed the quantity held)
    Sell(TradeArgs),

    /// Delete a transaction by its id
    Delete { id: i64 },

    /// Show the transaction history with current prices
    #[command(alias = "ls")]
    List,

    /// Sort the history by a column; repeat to reverse the order
    Sort {
        /// date, ticker, quantity, price, type or current
        column: String,
    },

    /// Show holdings, cost basis and gain/loss
    Summary,

    /// Show the market-value distribution of open positions
    Chart,

    /// Print every transaction as JSON
    Export,

    /// Leave the ledger
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct TradeArgs {
    pub ticker: String,

    /// Number of shares
    #[arg(allow_hyphen_values = true)]
    pub quantity: String,

    /// Price per share
    #[arg(allow_hyphen_values = true)]
    pub price: String,

    /// Trade date: YYYY-MM-DD, YYYYMMDD, YYYY/MM/DD or MM/DD/YYYY (default: today)
    pub date: Option<String>,
}

/// Parse one prompt line. Blank lines yield `Ok(None)`.
///
/// `help` and `--help` come back as a clap error of kind `DisplayHelp`;
/// printing it shows the help text.
pub fn parse_line(line: &str) -> Result<Option<Command>, clap::Error> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }
    CommandLine::try_parse_from(words).map(|cli| Some(cli.command))
}
