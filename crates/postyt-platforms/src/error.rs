//! Errors raised by platform adapters
//!
//! The `Display` text of these errors ends up verbatim in per-account upload results, so
//! messages stay short and never include tokens or request URLs.

use postyt_core::{AppError, PlatformId};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// OAuth client id/secret missing for the platform
    #[error("{0}")]
    Configuration(String),

    /// Authorization code could not be exchanged for tokens
    #[error("authorization code exchange failed: {0}")]
    OAuthExchange(String),

    /// The provider rejected an API call other than the upload itself
    #[error("provider API error{}: {message}", status_suffix(.status))]
    ProviderApi { status: Option<u16>, message: String },

    /// Refresh grant failed. `revoked` marks an invalid or revoked refresh token.
    #[error("token refresh failed: {message}")]
    Refresh { revoked: bool, message: String },

    #[error("upload failed{}: {message}", status_suffix(.status))]
    Upload { status: Option<u16>, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to read video file: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} is not yet implemented")]
    NotImplemented(PlatformId),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl PlatformError {
    pub fn missing_client(platform: PlatformId) -> Self {
        let prefix = platform.env_prefix();
        PlatformError::Configuration(format!(
            "{}_CLIENT_ID and {}_CLIENT_SECRET must be set to link {} accounts",
            prefix, prefix, platform
        ))
    }

    pub fn upload(status: Option<u16>, message: impl Into<String>) -> Self {
        PlatformError::Upload {
            status,
            message: message.into(),
        }
    }

    pub fn provider(status: Option<u16>, message: impl Into<String>) -> Self {
        PlatformError::ProviderApi {
            status,
            message: message.into(),
        }
    }

    /// Whether retrying the same call later can succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            PlatformError::Network(_) => true,
            PlatformError::Refresh { revoked, .. } => !revoked,
            PlatformError::ProviderApi { status, .. } | PlatformError::Upload { status, .. } => {
                matches!(status, Some(429) | Some(500..=599))
            }
            PlatformError::Configuration(_)
            | PlatformError::OAuthExchange(_)
            | PlatformError::Io(_)
            | PlatformError::NotImplemented(_) => false,
        }
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(err: reqwest::Error) -> Self {
        // Facebook and Instagram carry tokens in query strings; never echo the URL.
        PlatformError::Network(err.without_url().to_string())
    }
}

impl From<PlatformError> for AppError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Configuration(msg) => AppError::Configuration(msg),
            PlatformError::OAuthExchange(msg) => AppError::OAuthExchange(msg),
            PlatformError::NotImplemented(platform) => {
                AppError::PlatformNotImplemented(platform.to_string())
            }
            PlatformError::Io(e) => AppError::from(e),
            other => AppError::ProviderApi(other.to_string()),
        }
    }
}

/// Read a failed response into `(status, message)`.
///
/// Understands the error shapes of the providers we talk to: Google and Graph API
/// (`error.message`), OAuth (`error_description` / `error`), Twitter (`detail`, `errors[]`)
/// and Reddit (`message`, `json.errors`).
pub(crate) async fn read_error(response: reqwest::Response) -> (u16, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        } else {
            trimmed.chars().take(300).collect()
        }
    });
    (status.as_u16(), message)
}

pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    let candidates = [
        value.pointer("/error/message"),
        value.get("error_description"),
        value.get("detail"),
        value.pointer("/errors/0/message"),
        value.pointer("/json/errors/0/1"),
        value.get("message"),
        value.get("error").filter(|v| v.is_string()),
    ];

    let message = candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(str::to_string))
        .filter(|m| !m.is_empty());
    message
}

/// OAuth error code (`error` field) of a token endpoint response, if any
pub(crate) fn oauth_error_code(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
