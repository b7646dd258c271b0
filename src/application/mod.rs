// Application layer: coordination over the domain types.
// The Ledger is the single entry point for every caller (CLI, tests, embedders).

pub mod error;
pub mod ledger;

pub use error::*;
pub use ledger::*;
