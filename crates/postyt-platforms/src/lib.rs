//! Postyt Platforms
//!
//! The uniform platform adapter contract, the shared OAuth2 client, the static adapter
//! registry and the concrete adapters for each social platform.

pub mod adapter;
pub mod adapters;
pub mod error;
pub mod oauth;
pub mod registry;
pub mod video;

pub use adapter::{PlatformAdapter, UploadRequest, UploadedVideo};
pub use error::PlatformError;
pub use oauth::{AdapterSettings, ClientAuth, OAuthClient, TokenResponse};
pub use registry::{http_client, AdapterLookup, AdapterRegistry, AdapterSlot};
