use chrono::{DateTime, Duration, Utc};
use std::io::Write;
use tempfile::NamedTempFile;

use postyt_core::AccountCredential;

/// Credential whose tokens are derived from `account_id`
pub fn credential_expiring_at(account_id: &str, expiry_date: Option<DateTime<Utc>>) -> AccountCredential {
    AccountCredential {
        account_id: account_id.to_string(),
        account_name: format!("{} name", account_id),
        access_token: format!("access-{}", account_id),
        refresh_token: Some(format!("refresh-{}", account_id)),
        expiry_date,
    }
}

pub fn valid_credential(account_id: &str) -> AccountCredential {
    credential_expiring_at(account_id, Some(Utc::now() + Duration::hours(1)))
}

pub fn expired_credential(account_id: &str) -> AccountCredential {
    credential_expiring_at(account_id, Some(Utc::now() - Duration::hours(1)))
}

/// Small file standing in for an uploaded video
pub fn video_file() -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("postyt-test-")
        .suffix(".mp4")
        .tempfile()
        .expect("failed to create temp video");
    file.write_all(b"\x00\x00\x00\x18ftypmp42 test video")
        .expect("failed to write temp video");
    file
}
