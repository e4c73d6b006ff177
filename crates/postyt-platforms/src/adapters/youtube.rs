// YouTube Data API v3 adapter

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use postyt_core::{AccountCredential, PlatformId, TokenGrant};

use crate::adapter::{PlatformAdapter, UploadRequest, UploadedVideo};
use crate::error::{read_error, PlatformError};
use crate::oauth::{AdapterSettings, ClientAuth, OAuthClient};
use crate::video::VideoSource;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/youtube/v3";
const SCOPES: &str =
    "https://www.googleapis.com/auth/youtube.upload https://www.googleapis.com/auth/youtube";
// 22 = People & Blogs
const DEFAULT_CATEGORY_ID: &str = "22";
const PRIVACY_STATUS: &str = "unlisted";

pub struct YoutubeAdapter {
    http: Client,
    oauth: OAuthClient,
    api_base_url: String,
    upload_base_url: String,
}

impl Debug for YoutubeAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("YoutubeAdapter").finish()
    }
}

#[derive(Debug, Deserialize)]
struct ChannelList {
    #[serde(default)]
    items: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    id: String,
    snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct InsertedVideo {
    id: String,
}

impl YoutubeAdapter {
    pub fn new(http: Client, settings: AdapterSettings) -> Self {
        let oauth = OAuthClient::new(
            PlatformId::Youtube,
            http.clone(),
            settings,
            AUTHORIZE_URL,
            TOKEN_URL,
            ClientAuth::RequestBody,
        );
        Self {
            http,
            oauth,
            api_base_url: API_BASE_URL.to_string(),
            upload_base_url: UPLOAD_BASE_URL.to_string(),
        }
    }

    /// Point the adapter at other hosts (used by tests)
    pub fn with_base_urls(
        mut self,
        api_base_url: impl Into<String>,
        upload_base_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.api_base_url = api_base_url.into();
        self.upload_base_url = upload_base_url.into();
        self.oauth = self.oauth.with_token_url(token_url);
        self
    }

    /// Channel owned by the token (`channels.list?mine=true`)
    async fn own_channel(&self, access_token: &str) -> Result<Channel, PlatformError> {
        let response = self
            .http
            .get(format!("{}/channels", self.api_base_url))
            .bearer_auth(access_token)
            .query(&[("part", "snippet"), ("mine", "true")])
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(PlatformError::provider(Some(status), message));
        }

        let channels: ChannelList = response.json().await?;
        channels
            .items
            .into_iter()
            .next()
            .ok_or_else(|| PlatformError::provider(None, "no YouTube channel for this account"))
    }

    /// Open a resumable upload session and return its URL
    async fn start_session(
        &self,
        request: &UploadRequest,
        video: &VideoSource,
    ) -> Result<String, PlatformError> {
        let body = json!({
            "snippet": {
                "title": request.metadata.title,
                "description": request.metadata.description,
                "tags": request.metadata.tags,
                "categoryId": DEFAULT_CATEGORY_ID,
            },
            "status": {
                "privacyStatus": PRIVACY_STATUS,
                "selfDeclaredMadeForKids": false,
            }
        });

        let response = self
            .http
            .post(format!("{}/videos", self.upload_base_url))
            .bearer_auth(&request.access_token)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .header("X-Upload-Content-Type", video.content_type)
            .header("X-Upload-Content-Length", video.len.to_string())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(PlatformError::upload(Some(status), message));
        }

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| PlatformError::upload(None, "missing upload URL in response"))
    }
}

#[async_trait]
impl PlatformAdapter for YoutubeAdapter {
    fn platform(&self) -> PlatformId {
        PlatformId::Youtube
    }

    fn auth_url(&self, user_id: &str) -> Result<String, PlatformError> {
        self.oauth.authorization_url(
            user_id,
            SCOPES,
            &[
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("include_granted_scopes", "true"),
            ],
        )
    }

    async fn handle_callback(&self, code: &str) -> Result<AccountCredential, PlatformError> {
        let now = Utc::now();
        let token = self.oauth.exchange_code(code, &[]).await?;
        let channel = self.own_channel(&token.access_token).await?;

        tracing::info!(channel_id = %channel.id, "Linked YouTube channel");

        Ok(AccountCredential {
            account_id: channel.id,
            account_name: channel.snippet.title,
            expiry_date: token.expiry_from(now),
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        })
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, PlatformError> {
        self.oauth.refresh(refresh_token).await
    }

    async fn upload_video(&self, request: UploadRequest) -> Result<UploadedVideo, PlatformError> {
        let video = VideoSource::open(&request.video_path).await?;
        let session_url = self.start_session(&request, &video).await?;

        let content_type = video.content_type;
        let len = video.len;
        let response = self
            .http
            .put(&session_url)
            .bearer_auth(&request.access_token)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, len)
            .body(video.into_body())
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(PlatformError::upload(Some(status), message));
        }

        let inserted: InsertedVideo = response
            .json()
            .await
            .map_err(|e| PlatformError::upload(None, format!("unexpected response: {}", e)))?;

        tracing::info!(
            account_id = %request.account_id,
            video_id = %inserted.id,
            "Video uploaded to YouTube"
        );

        Ok(UploadedVideo {
            video_url: format!("https://www.youtube.com/watch?v={}", inserted.id),
            video_id: inserted.id,
        })
    }
}
