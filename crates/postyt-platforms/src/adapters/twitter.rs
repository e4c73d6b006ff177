// Twitter/X adapter (API v2, OAuth 2.0 with PKCE)

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;
use tokio::time::sleep;

use postyt_core::{AccountCredential, PlatformId, TokenGrant};

use crate::adapter::{PlatformAdapter, UploadRequest, UploadedVideo};
use crate::error::{read_error, PlatformError};
use crate::oauth::{AdapterSettings, ClientAuth, OAuthClient};
use crate::video::VideoSource;

const AUTHORIZE_URL: &str = "https://x.com/i/oauth2/authorize";
const API_BASE_URL: &str = "https://api.x.com";
const SCOPES: &str = "tweet.read tweet.write users.read media.write offline.access";
const CHUNK_SIZE: usize = 4 * 1024 * 1024;
const MAX_TWEET_CHARS: usize = 280;
const MAX_STATUS_WAIT: Duration = Duration::from_secs(10);
const STATUS_POLL_ATTEMPTS: u32 = 60;

pub struct TwitterAdapter {
    http: Client,
    oauth: OAuthClient,
    api_base_url: String,
    max_status_wait: Duration,
}

impl Debug for TwitterAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("TwitterAdapter").finish()
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct Media {
    id: String,
    #[serde(default)]
    processing_info: Option<ProcessingInfo>,
}

#[derive(Debug, Deserialize)]
struct MediaStatus {
    #[serde(default)]
    processing_info: Option<ProcessingInfo>,
}

#[derive(Debug, Deserialize)]
struct ProcessingInfo {
    state: String,
    #[serde(default)]
    check_after_secs: Option<u64>,
    #[serde(default)]
    error: Option<ProcessingError>,
}

#[derive(Debug, Deserialize)]
struct ProcessingError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
}

/// PKCE verifier derived from the client secret, so the callback can be handled without
/// server-side session state.
fn pkce_verifier(client_secret: &str) -> String {
    let digest = Sha256::digest(format!("postyt-pkce:{}", client_secret).as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

fn pkce_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

fn tweet_text(request: &UploadRequest) -> String {
    let metadata = &request.metadata;
    let mut text = metadata.title.clone();
    if !metadata.description.is_empty() {
        text.push_str("\n\n");
        text.push_str(&metadata.description);
    }
    text.chars().take(MAX_TWEET_CHARS).collect()
}

impl TwitterAdapter {
    pub fn new(http: Client, settings: AdapterSettings) -> Self {
        let oauth = OAuthClient::new(
            PlatformId::Twitter,
            http.clone(),
            settings,
            AUTHORIZE_URL,
            format!("{}/2/oauth2/token", API_BASE_URL),
            ClientAuth::BasicHeader,
        );
        Self {
            http,
            oauth,
            api_base_url: API_BASE_URL.to_string(),
            max_status_wait: MAX_STATUS_WAIT,
        }
    }

    /// Point the adapter at another host (used by tests)
    pub fn with_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self.oauth = self
            .oauth
            .with_token_url(format!("{}/2/oauth2/token", self.api_base_url));
        self
    }

    pub fn with_max_status_wait(mut self, max_status_wait: Duration) -> Self {
        self.max_status_wait = max_status_wait;
        self
    }

    fn api(&self, path: &str) -> String {
        format!("{}/2/{}", self.api_base_url, path)
    }

    async fn me(&self, access_token: &str) -> Result<User, PlatformError> {
        let response = self
            .http
            .get(self.api("users/me"))
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(PlatformError::provider(Some(status), message));
        }

        let user: Envelope<User> = response.json().await?;
        Ok(user.data)
    }

    /// INITIALIZE / APPEND / FINALIZE; returns the media id once processing is done
    async fn upload_media(
        &self,
        mut video: VideoSource,
        access_token: &str,
    ) -> Result<String, PlatformError> {
        let response = self
            .http
            .post(self.api("media/upload/initialize"))
            .bearer_auth(access_token)
            .json(&json!({
                "media_type": video.content_type,
                "total_bytes": video.len,
                "media_category": "amplify_video",
            }))
            .send()
            .await?;
        let media: Envelope<Media> = self.parse_upload_step(response).await?;
        let media_id = media.data.id;

        let mut segment_index = 0u32;
        loop {
            let chunk = video.read_chunk(CHUNK_SIZE).await?;
            if chunk.is_empty() {
                break;
            }
            let form = Form::new()
                .text("segment_index", segment_index.to_string())
                .part("media", Part::bytes(chunk).file_name("chunk"));
            let response = self
                .http
                .post(self.api(&format!("media/upload/{}/append", media_id)))
                .bearer_auth(access_token)
                .multipart(form)
                .send()
                .await?;
            if !response.status().is_success() {
                let (status, message) = read_error(response).await;
                return Err(PlatformError::upload(Some(status), message));
            }
            segment_index += 1;
        }

        let response = self
            .http
            .post(self.api(&format!("media/upload/{}/finalize", media_id)))
            .bearer_auth(access_token)
            .send()
            .await?;
        let finalized: Envelope<Media> = self.parse_upload_step(response).await?;

        self.wait_for_processing(&media_id, finalized.data.processing_info, access_token)
            .await?;
        Ok(media_id)
    }

    async fn parse_upload_step<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, PlatformError> {
        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(PlatformError::upload(Some(status), message));
        }
        response
            .json()
            .await
            .map_err(|e| PlatformError::upload(None, format!("unexpected response: {}", e)))
    }

    async fn wait_for_processing(
        &self,
        media_id: &str,
        mut info: Option<ProcessingInfo>,
        access_token: &str,
    ) -> Result<(), PlatformError> {
        for _ in 0..STATUS_POLL_ATTEMPTS {
            let current = match info {
                None => return Ok(()),
                Some(current) => current,
            };
            match current.state.as_str() {
                "succeeded" => return Ok(()),
                "failed" => {
                    let message = current
                        .error
                        .and_then(|e| e.message)
                        .unwrap_or_else(|| "media processing failed".to_string());
                    return Err(PlatformError::upload(None, message));
                }
                _ => {
                    let wait = Duration::from_secs(current.check_after_secs.unwrap_or(1))
                        .min(self.max_status_wait);
                    sleep(wait).await;
                }
            }

            let response = self
                .http
                .get(self.api("media/upload"))
                .bearer_auth(access_token)
                .query(&[("command", "STATUS"), ("media_id", media_id)])
                .send()
                .await?;
            let status: Envelope<MediaStatus> = self.parse_upload_step(response).await?;
            info = status.data.processing_info;
        }

        Err(PlatformError::upload(
            None,
            "timed out waiting for media processing",
        ))
    }
}

#[async_trait]
impl PlatformAdapter for TwitterAdapter {
    fn platform(&self) -> PlatformId {
        PlatformId::Twitter
    }

    fn auth_url(&self, user_id: &str) -> Result<String, PlatformError> {
        let credentials = self.oauth.credentials()?;
        let challenge = pkce_challenge(&pkce_verifier(&credentials.client_secret));
        self.oauth.authorization_url(
            user_id,
            SCOPES,
            &[
                ("code_challenge", challenge.as_str()),
                ("code_challenge_method", "S256"),
            ],
        )
    }

    async fn handle_callback(&self, code: &str) -> Result<AccountCredential, PlatformError> {
        let now = Utc::now();
        let verifier = pkce_verifier(&self.oauth.credentials()?.client_secret);
        let token = self
            .oauth
            .exchange_code(code, &[("code_verifier", verifier.as_str())])
            .await?;
        let user = self.me(&token.access_token).await?;

        tracing::info!(twitter_user_id = %user.id, "Linked Twitter account");

        Ok(AccountCredential {
            account_id: user.id,
            account_name: user.username,
            expiry_date: token.expiry_from(now),
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        })
    }

    /// Twitter rotates refresh tokens; the returned grant carries the new one.
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, PlatformError> {
        self.oauth.refresh(refresh_token).await
    }

    async fn upload_video(&self, request: UploadRequest) -> Result<UploadedVideo, PlatformError> {
        let video = VideoSource::open(&request.video_path).await?;
        let media_id = self.upload_media(video, &request.access_token).await?;

        let response = self
            .http
            .post(self.api("tweets"))
            .bearer_auth(&request.access_token)
            .json(&json!({
                "text": tweet_text(&request),
                "media": {"media_ids": [media_id]},
            }))
            .send()
            .await?;
        let tweet: Envelope<Tweet> = self.parse_upload_step(response).await?;

        tracing::info!(
            account_id = %request.account_id,
            tweet_id = %tweet.data.id,
            "Video posted to Twitter"
        );

        let video_url = if request.account_name.is_empty() {
            format!("https://x.com/i/web/status/{}", tweet.data.id)
        } else {
            format!("https://x.com/{}/status/{}", request.account_name, tweet.data.id)
        };

        Ok(UploadedVideo {
            video_id: tweet.data.id,
            video_url,
        })
    }
}
