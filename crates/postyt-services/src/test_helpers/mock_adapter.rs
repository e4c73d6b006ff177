use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use postyt_core::{AccountCredential, PlatformId, TokenGrant};
use postyt_platforms::{PlatformAdapter, PlatformError, UploadRequest, UploadedVideo};

/// Scriptable in-memory adapter
///
/// Refreshing `refresh-<id>` yields the access token `fresh-<id>`. Uploads record the access
/// token they were called with and return `vid-<account>`.
#[derive(Debug)]
pub struct MockAdapter {
    platform: PlatformId,
    failing_refresh: HashSet<String>,
    failing_upload: HashSet<String>,
    upload_delays: HashMap<String, Duration>,
    refresh_calls: AtomicUsize,
    uploads: Mutex<Vec<(String, String)>>,
}

impl MockAdapter {
    pub fn new(platform: PlatformId) -> Self {
        Self {
            platform,
            failing_refresh: HashSet::new(),
            failing_upload: HashSet::new(),
            upload_delays: HashMap::new(),
            refresh_calls: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// Refreshing this account's token fails as revoked
    pub fn failing_refresh_for(mut self, account_id: &str) -> Self {
        self.failing_refresh.insert(format!("refresh-{}", account_id));
        self
    }

    pub fn failing_upload_for(mut self, account_id: &str) -> Self {
        self.failing_upload.insert(account_id.to_string());
        self
    }

    /// Hold this account's upload for `delay` so it completes out of order
    pub fn delaying_upload_for(mut self, account_id: &str, delay: Duration) -> Self {
        self.upload_delays.insert(account_id.to_string(), delay);
        self
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// `(account_id, access_token)` for every upload attempt, in completion order
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformAdapter for MockAdapter {
    fn platform(&self) -> PlatformId {
        self.platform
    }

    fn auth_url(&self, user_id: &str) -> Result<String, PlatformError> {
        Ok(format!(
            "https://auth.example.com/{}?state={}",
            self.platform, user_id
        ))
    }

    async fn handle_callback(&self, code: &str) -> Result<AccountCredential, PlatformError> {
        if code == "bad-code" {
            return Err(PlatformError::OAuthExchange("invalid_grant".to_string()));
        }
        Ok(AccountCredential {
            account_id: format!("acct-{}", code),
            account_name: format!("Account {}", code),
            access_token: format!("access-{}", code),
            refresh_token: Some(format!("refresh-{}", code)),
            expiry_date: Some(Utc::now() + ChronoDuration::hours(1)),
        })
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, PlatformError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_refresh.contains(refresh_token) {
            return Err(PlatformError::Refresh {
                revoked: true,
                message: "invalid_grant: Token has been expired or revoked.".to_string(),
            });
        }
        let account = refresh_token.trim_start_matches("refresh-");
        Ok(TokenGrant {
            access_token: format!("fresh-{}", account),
            expiry_date: Some(Utc::now() + ChronoDuration::hours(1)),
            refresh_token: None,
        })
    }

    async fn upload_video(&self, request: UploadRequest) -> Result<UploadedVideo, PlatformError> {
        if let Some(delay) = self.upload_delays.get(&request.account_id) {
            tokio::time::sleep(*delay).await;
        }

        self.uploads
            .lock()
            .unwrap()
            .push((request.account_id.clone(), request.access_token.clone()));

        tokio::fs::metadata(&request.video_path).await?;

        if self.failing_upload.contains(&request.account_id) {
            return Err(PlatformError::upload(Some(403), "quota exceeded"));
        }

        Ok(UploadedVideo {
            video_id: format!("vid-{}", request.account_id),
            video_url: format!(
                "https://{}.example.com/v/vid-{}",
                self.platform, request.account_id
            ),
        })
    }
}
