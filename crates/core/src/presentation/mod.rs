//! Formatting of ledger data for tables and charts.
//!
//! Everything here is display glue: the aggregator's numbers go in, strings
//! and ordered rows come out. No business rules live in this module.

pub mod report;
pub mod table;
