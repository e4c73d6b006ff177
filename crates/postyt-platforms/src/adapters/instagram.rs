// Instagram adapter (Instagram API with Instagram Login)
//
// Videos are published as Reels through a container: create it, push the bytes to the
// upload URI it returns, wait for processing, then publish.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH};
use reqwest::Client;
use serde::Deserialize;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;
use tokio::time::sleep;

use postyt_core::{AccountCredential, PlatformId, TokenGrant};

use crate::adapter::{PlatformAdapter, UploadRequest, UploadedVideo};
use crate::error::{read_error, PlatformError};
use crate::oauth::{parse_refresh_response, AdapterSettings, ClientAuth, OAuthClient, TokenResponse};
use crate::video::VideoSource;

const GRAPH_VERSION: &str = "v21.0";
const AUTHORIZE_URL: &str = "https://www.instagram.com/oauth/authorize";
const API_BASE_URL: &str = "https://api.instagram.com";
const GRAPH_BASE_URL: &str = "https://graph.instagram.com";
const SCOPES: &str = "instagram_business_basic,instagram_business_content_publish";
const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(5);
const STATUS_POLL_ATTEMPTS: u32 = 120;

pub struct InstagramAdapter {
    http: Client,
    oauth: OAuthClient,
    graph_base_url: String,
    poll_interval: Duration,
}

impl Debug for InstagramAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("InstagramAdapter").finish()
    }
}

#[derive(Debug, Deserialize)]
struct Profile {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    username: String,
}

#[derive(Debug, Deserialize)]
struct Container {
    id: String,
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContainerStatus {
    status_code: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Permalink {
    permalink: Option<String>,
}

/// Instagram has no title field; title, description and tags are folded into the caption.
fn build_caption(request: &UploadRequest) -> String {
    let metadata = &request.metadata;
    let mut parts = vec![metadata.title.clone()];
    if !metadata.description.is_empty() {
        parts.push(metadata.description.clone());
    }
    if !metadata.tags.is_empty() {
        let hashtags: Vec<String> = metadata
            .tags
            .iter()
            .map(|t| format!("#{}", t.replace(' ', "")))
            .collect();
        parts.push(hashtags.join(" "));
    }
    parts.join("\n\n")
}

impl InstagramAdapter {
    pub fn new(http: Client, settings: AdapterSettings) -> Self {
        let oauth = OAuthClient::new(
            PlatformId::Instagram,
            http.clone(),
            settings,
            AUTHORIZE_URL,
            format!("{}/oauth/access_token", API_BASE_URL),
            ClientAuth::RequestBody,
        );
        Self {
            http,
            oauth,
            graph_base_url: GRAPH_BASE_URL.to_string(),
            poll_interval: STATUS_POLL_INTERVAL,
        }
    }

    /// Point the adapter at other hosts (used by tests)
    pub fn with_base_urls(
        mut self,
        api_base_url: impl Into<String>,
        graph_base_url: impl Into<String>,
    ) -> Self {
        self.oauth = self
            .oauth
            .with_token_url(format!("{}/oauth/access_token", api_base_url.into()));
        self.graph_base_url = graph_base_url.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn graph(&self, path: &str) -> String {
        format!("{}/{}/{}", self.graph_base_url, GRAPH_VERSION, path)
    }

    async fn long_lived_token(&self, short_lived: &str) -> Result<TokenResponse, PlatformError> {
        let credentials = self.oauth.credentials()?;
        let response = self
            .http
            .get(format!("{}/access_token", self.graph_base_url))
            .query(&[
                ("grant_type", "ig_exchange_token"),
                ("client_secret", credentials.client_secret.as_str()),
                ("access_token", short_lived),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let (_, message) = read_error(response).await;
            return Err(PlatformError::OAuthExchange(message));
        }

        Ok(response.json().await?)
    }

    async fn profile(&self, access_token: &str) -> Result<Profile, PlatformError> {
        let response = self
            .http
            .get(self.graph("me"))
            .query(&[("fields", "user_id,username"), ("access_token", access_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(PlatformError::provider(Some(status), message));
        }

        Ok(response.json().await?)
    }

    async fn create_container(&self, request: &UploadRequest) -> Result<Container, PlatformError> {
        let caption = build_caption(request);
        let response = self
            .http
            .post(self.graph(&format!("{}/media", request.account_id)))
            .form(&[
                ("media_type", "REELS"),
                ("upload_type", "resumable"),
                ("share_to_feed", "false"),
                ("caption", caption.as_str()),
                ("access_token", request.access_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(PlatformError::upload(Some(status), message));
        }

        Ok(response.json().await?)
    }

    async fn wait_until_finished(
        &self,
        container_id: &str,
        access_token: &str,
    ) -> Result<(), PlatformError> {
        for _ in 0..STATUS_POLL_ATTEMPTS {
            let response = self
                .http
                .get(self.graph(container_id))
                .query(&[("fields", "status_code,status"), ("access_token", access_token)])
                .send()
                .await?;

            if !response.status().is_success() {
                let (status, message) = read_error(response).await;
                return Err(PlatformError::upload(Some(status), message));
            }

            let status: ContainerStatus = response.json().await?;
            match status.status_code.as_str() {
                "FINISHED" => return Ok(()),
                "ERROR" | "EXPIRED" => {
                    return Err(PlatformError::upload(
                        None,
                        status
                            .status
                            .unwrap_or_else(|| format!("media container {}", status.status_code)),
                    ));
                }
                // IN_PROGRESS / PUBLISHED keep polling
                _ => sleep(self.poll_interval).await,
            }
        }

        Err(PlatformError::upload(
            None,
            "timed out waiting for Instagram to process the video",
        ))
    }

    async fn publish(&self, request: &UploadRequest, container_id: &str) -> Result<String, PlatformError> {
        let response = self
            .http
            .post(self.graph(&format!("{}/media_publish", request.account_id)))
            .form(&[
                ("creation_id", container_id),
                ("access_token", request.access_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(PlatformError::upload(Some(status), message));
        }

        let media: MediaId = response.json().await?;
        Ok(media.id)
    }

    async fn permalink(&self, media_id: &str, access_token: &str) -> Option<String> {
        let response = self
            .http
            .get(self.graph(media_id))
            .query(&[("fields", "permalink"), ("access_token", access_token)])
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json::<Permalink>().await.ok()?.permalink
    }
}

#[async_trait]
impl PlatformAdapter for InstagramAdapter {
    fn platform(&self) -> PlatformId {
        PlatformId::Instagram
    }

    fn auth_url(&self, user_id: &str) -> Result<String, PlatformError> {
        self.oauth
            .authorization_url(user_id, SCOPES, &[("enable_fb_login", "0")])
    }

    async fn handle_callback(&self, code: &str) -> Result<AccountCredential, PlatformError> {
        let now = Utc::now();
        let short_lived = self.oauth.exchange_code(code, &[]).await?;
        let long_lived = self.long_lived_token(&short_lived.access_token).await?;
        let profile = self.profile(&long_lived.access_token).await?;

        let account_id = profile
            .user_id
            .or(profile.id)
            .ok_or_else(|| PlatformError::provider(None, "Instagram profile has no user id"))?;

        tracing::info!(ig_user_id = %account_id, "Linked Instagram account");

        // Long-lived tokens refresh themselves, so the token doubles as the refresh token.
        Ok(AccountCredential {
            account_id,
            account_name: profile.username,
            expiry_date: long_lived.expiry_from(now),
            refresh_token: Some(long_lived.access_token.clone()),
            access_token: long_lived.access_token,
        })
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, PlatformError> {
        let response = self
            .http
            .get(format!("{}/refresh_access_token", self.graph_base_url))
            .query(&[
                ("grant_type", "ig_refresh_token"),
                ("access_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| PlatformError::Refresh {
                revoked: false,
                message: e.without_url().to_string(),
            })?;

        let mut grant = parse_refresh_response(response).await?;
        grant.refresh_token = Some(grant.access_token.clone());
        Ok(grant)
    }

    async fn upload_video(&self, request: UploadRequest) -> Result<UploadedVideo, PlatformError> {
        let video = VideoSource::open(&request.video_path).await?;
        let container = self.create_container(&request).await?;
        let upload_uri = container
            .uri
            .clone()
            .ok_or_else(|| PlatformError::upload(None, "missing upload URI for media container"))?;

        let len = video.len;
        let response = self
            .http
            .post(&upload_uri)
            .header(AUTHORIZATION, format!("OAuth {}", request.access_token))
            .header("offset", "0")
            .header("file_size", len.to_string())
            .header(CONTENT_LENGTH, len)
            .body(video.into_body())
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(PlatformError::upload(Some(status), message));
        }

        self.wait_until_finished(&container.id, &request.access_token)
            .await?;
        let media_id = self.publish(&request, &container.id).await?;

        let video_url = self
            .permalink(&media_id, &request.access_token)
            .await
            .unwrap_or_else(|| format!("https://www.instagram.com/{}/", request.account_name));

        tracing::info!(
            ig_user_id = %request.account_id,
            media_id = %media_id,
            "Reel published to Instagram"
        );

        Ok(UploadedVideo {
            video_id: media_id,
            video_url,
        })
    }
}
