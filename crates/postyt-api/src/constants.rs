//! API route paths and multipart field names

/// API base path prefix
pub const API_PREFIX: &str = "/api";

pub const OPENAPI_JSON_PATH: &str = "/api/openapi.json";
pub const DOCS_PATH: &str = "/docs";

/// Multipart field carrying the video file
pub const VIDEO_FIELD: &str = "video";
pub const TITLE_FIELD: &str = "title";
pub const DESCRIPTION_FIELD: &str = "description";
pub const TAGS_FIELD: &str = "tags";
/// JSON object `{platform: [accountId, ...]}`
pub const SELECTED_ACCOUNTS_FIELD: &str = "selectedAccounts";

/// Room for the text fields on top of the video size limit
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;
