//! Test helpers for upload engine tests
//!
//! In-memory adapters and account stores, so orchestration can be exercised without
//! provider APIs or a database.

pub mod fixtures;
pub mod mock_adapter;
pub mod mock_store;

pub use fixtures::*;
pub use mock_adapter::MockAdapter;
pub use mock_store::InMemoryAccountStore;
