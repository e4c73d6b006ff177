//! Postyt Core Library
//!
//! Domain models, error types, configuration and token encryption shared by every Postyt crate.

pub mod config;
pub mod constants;
pub mod encryption;
pub mod error;
pub mod models;

pub use config::{BaseConfig, Config, OAuthClientConfig, PostytConfig};
pub use encryption::EncryptionService;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::*;
