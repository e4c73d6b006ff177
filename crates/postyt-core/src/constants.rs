//! Application-wide constants.

/// Title used when the client sends none
pub const UNTITLED_VIDEO_TITLE: &str = "Untitled video";

/// Platform-level report error for keys outside the known platform set
pub const UNSUPPORTED_PLATFORM_MESSAGE: &str = "unsupported platform";

/// Platform-level report error for platforms registered without an adapter
pub const NOT_IMPLEMENTED_MESSAGE: &str = "not yet implemented";

/// Account-level report error when the selected account is not linked to the user
pub const ACCOUNT_NOT_FOUND_MESSAGE: &str = "account not found";
