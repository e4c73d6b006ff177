//! Postyt Database Layer
//!
//! Postgres persistence of linked platform accounts and the store traits the upload engine
//! and HTTP layer are written against.

pub mod credential_store;
pub mod db;

pub use credential_store::{empty_linked_accounts, AccountStore, CredentialStore, LinkedAccounts};
pub use db::{AccountRepository, LinkedAccountRow, LinkedAccountSummaryRow, MIGRATOR};
