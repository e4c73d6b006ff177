//! Postyt upload engine
//!
//! Token lifecycle, multi-account upload orchestration and scoped cleanup of the uploaded
//! video.

pub mod cleanup;
pub mod orchestrator;
pub mod token;

pub use cleanup::TempVideoFile;
pub use orchestrator::{parse_selection, OrchestratorError, UploadOrchestrator, UploadOutcome};
pub use token::{ensure_valid, ensure_valid_at, ValidCredential};

// Test helpers (unit tests, or dependents enabling `test-helpers`)
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
