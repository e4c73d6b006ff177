pub mod account;
pub mod platform;
pub mod upload;

pub use account::{AccountCredential, AccountSummary, TokenGrant, TokenUpdate};
pub use platform::{PlatformId, UnknownPlatform};
pub use upload::{
    AccountUploadResult, OverallStatus, OverallUploadReport, PlatformUploadReport,
    SelectionError, UploadSelection, VideoMetadata,
};
