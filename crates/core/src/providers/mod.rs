pub mod registry;
pub mod traits;

// API provider implementations
pub mod finnhub;
pub mod yahoo_finance;
