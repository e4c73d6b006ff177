// Facebook Pages adapter (Graph API)
//
// The linked "account" is a Page. Page tokens derived from a long-lived user token do not
// expire, so linked pages carry no expiry and no refresh token.

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use postyt_core::{AccountCredential, PlatformId, TokenGrant};

use crate::adapter::{PlatformAdapter, UploadRequest, UploadedVideo};
use crate::error::{read_error, PlatformError};
use crate::oauth::{AdapterSettings, ClientAuth, OAuthClient, TokenResponse};
use crate::video::VideoSource;

const GRAPH_VERSION: &str = "v19.0";
const DIALOG_BASE_URL: &str = "https://www.facebook.com";
const GRAPH_BASE_URL: &str = "https://graph.facebook.com";
const VIDEO_BASE_URL: &str = "https://graph-video.facebook.com";
const SCOPES: &str = "pages_show_list,pages_read_engagement,pages_manage_posts,publish_video";

pub struct FacebookAdapter {
    http: Client,
    oauth: OAuthClient,
    graph_base_url: String,
    video_base_url: String,
}

impl Debug for FacebookAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FacebookAdapter").finish()
    }
}

#[derive(Debug, Deserialize)]
struct PageList {
    #[serde(default)]
    data: Vec<Page>,
}

#[derive(Deserialize)]
struct Page {
    id: String,
    name: String,
    access_token: String,
}

impl Debug for Page {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Page")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct PublishedVideo {
    id: String,
}

fn graph_url(base: &str, path: &str) -> String {
    format!("{}/{}/{}", base, GRAPH_VERSION, path)
}

impl FacebookAdapter {
    pub fn new(http: Client, settings: AdapterSettings) -> Self {
        let oauth = OAuthClient::new(
            PlatformId::Facebook,
            http.clone(),
            settings,
            graph_url(DIALOG_BASE_URL, "dialog/oauth"),
            graph_url(GRAPH_BASE_URL, "oauth/access_token"),
            ClientAuth::RequestBody,
        );
        Self {
            http,
            oauth,
            graph_base_url: GRAPH_BASE_URL.to_string(),
            video_base_url: VIDEO_BASE_URL.to_string(),
        }
    }

    /// Point the adapter at other hosts (used by tests)
    pub fn with_base_urls(
        mut self,
        graph_base_url: impl Into<String>,
        video_base_url: impl Into<String>,
    ) -> Self {
        self.graph_base_url = graph_base_url.into();
        self.video_base_url = video_base_url.into();
        self.oauth = self
            .oauth
            .with_token_url(graph_url(&self.graph_base_url, "oauth/access_token"));
        self
    }

    /// Swap a short-lived user token for a long-lived one
    async fn long_lived_user_token(&self, short_lived: &str) -> Result<String, PlatformError> {
        let credentials = self.oauth.credentials()?;
        let response = self
            .http
            .get(graph_url(&self.graph_base_url, "oauth/access_token"))
            .query(&[
                ("grant_type", "fb_exchange_token"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("fb_exchange_token", short_lived),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let (_, message) = read_error(response).await;
            return Err(PlatformError::OAuthExchange(message));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    async fn managed_pages(&self, user_token: &str) -> Result<Vec<Page>, PlatformError> {
        let response = self
            .http
            .get(graph_url(&self.graph_base_url, "me/accounts"))
            .query(&[("fields", "id,name,access_token"), ("access_token", user_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(PlatformError::provider(Some(status), message));
        }

        let pages: PageList = response.json().await?;
        Ok(pages.data)
    }
}

#[async_trait]
impl PlatformAdapter for FacebookAdapter {
    fn platform(&self) -> PlatformId {
        PlatformId::Facebook
    }

    fn auth_url(&self, user_id: &str) -> Result<String, PlatformError> {
        self.oauth
            .authorization_url(user_id, SCOPES, &[("auth_type", "rerequest")])
    }

    async fn handle_callback(&self, code: &str) -> Result<AccountCredential, PlatformError> {
        let token = self.oauth.exchange_code(code, &[]).await?;
        let user_token = self.long_lived_user_token(&token.access_token).await?;

        // First managed page is the one linked
        let page = self
            .managed_pages(&user_token)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PlatformError::provider(None, "no Facebook page managed by this user"))?;

        tracing::info!(page_id = %page.id, "Linked Facebook page");

        Ok(AccountCredential {
            account_id: page.id,
            account_name: page.name,
            access_token: page.access_token,
            refresh_token: None,
            expiry_date: None,
        })
    }

    async fn refresh_token(&self, _refresh_token: &str) -> Result<TokenGrant, PlatformError> {
        Err(PlatformError::Refresh {
            revoked: true,
            message: "Facebook page tokens cannot be refreshed; link the page again".to_string(),
        })
    }

    async fn upload_video(&self, request: UploadRequest) -> Result<UploadedVideo, PlatformError> {
        let video = VideoSource::open(&request.video_path).await?;

        let form = Form::new()
            .text("access_token", request.access_token.clone())
            .text("title", request.metadata.title.clone())
            .text("description", request.metadata.description.clone())
            .text("published", "true")
            .text("no_story", "true")
            .part("source", video.into_part()?);

        let response = self
            .http
            .post(graph_url(
                &self.video_base_url,
                &format!("{}/videos", request.account_id),
            ))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(PlatformError::upload(Some(status), message));
        }

        let published: PublishedVideo = response
            .json()
            .await
            .map_err(|e| PlatformError::upload(None, format!("unexpected response: {}", e)))?;

        tracing::info!(
            page_id = %request.account_id,
            video_id = %published.id,
            "Video uploaded to Facebook page"
        );

        Ok(UploadedVideo {
            video_url: format!(
                "https://www.facebook.com/{}/videos/{}",
                request.account_id, published.id
            ),
            video_id: published.id,
        })
    }
}
