pub mod accounts;
pub mod migrations;

pub use accounts::{AccountRepository, LinkedAccountRow, LinkedAccountSummaryRow};
pub use migrations::MIGRATOR;
