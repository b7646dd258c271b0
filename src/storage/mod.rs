mod transaction_log;

pub use transaction_log::*;
