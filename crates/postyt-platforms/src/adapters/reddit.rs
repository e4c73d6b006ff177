// Reddit adapter
//
// Videos are posted to the account's own profile (`u_<name>`). The file goes to Reddit's
// media storage first through a presigned form, then a `kind=video` submission references it.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::Form;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use postyt_core::{AccountCredential, PlatformId, TokenGrant};

use crate::adapter::{PlatformAdapter, UploadRequest, UploadedVideo};
use crate::error::{extract_error_message, read_error, PlatformError};
use crate::oauth::{AdapterSettings, ClientAuth, OAuthClient};
use crate::video::VideoSource;

const AUTHORIZE_URL: &str = "https://www.reddit.com/api/v1/authorize";
const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE_URL: &str = "https://oauth.reddit.com";
const SCOPES: &str = "identity submit";
const MAX_TITLE_CHARS: usize = 300;

pub struct RedditAdapter {
    http: Client,
    oauth: OAuthClient,
    api_base_url: String,
}

impl Debug for RedditAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RedditAdapter").finish()
    }
}

#[derive(Debug, Deserialize)]
struct Identity {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct MediaLease {
    args: LeaseArgs,
    asset: LeaseAsset,
}

#[derive(Debug, Deserialize)]
struct LeaseArgs {
    action: String,
    fields: Vec<LeaseField>,
}

#[derive(Debug, Deserialize)]
struct LeaseField {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct LeaseAsset {
    asset_id: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    json: SubmitJson,
}

#[derive(Debug, Deserialize)]
struct SubmitJson {
    #[serde(default)]
    errors: Vec<serde_json::Value>,
    #[serde(default)]
    data: Option<SubmitData>,
}

#[derive(Debug, Default, Deserialize)]
struct SubmitData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    user_submitted_page: Option<String>,
}

fn absolute_action(action: &str) -> String {
    if action.starts_with("//") {
        format!("https:{}", action)
    } else {
        action.to_string()
    }
}

impl RedditAdapter {
    pub fn new(http: Client, settings: AdapterSettings) -> Self {
        let oauth = OAuthClient::new(
            PlatformId::Reddit,
            http.clone(),
            settings,
            AUTHORIZE_URL,
            TOKEN_URL,
            ClientAuth::BasicHeader,
        );
        Self {
            http,
            oauth,
            api_base_url: API_BASE_URL.to_string(),
        }
    }

    /// Point the adapter at other hosts (used by tests)
    pub fn with_base_urls(
        mut self,
        api_base_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.api_base_url = api_base_url.into();
        self.oauth = self.oauth.with_token_url(token_url);
        self
    }

    async fn identity(&self, access_token: &str) -> Result<Identity, PlatformError> {
        let response = self
            .http
            .get(format!("{}/api/v1/me", self.api_base_url))
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(PlatformError::provider(Some(status), message));
        }

        Ok(response.json().await?)
    }

    /// Upload the file to Reddit's media storage; returns (asset id, hosted URL)
    async fn upload_asset(
        &self,
        video: VideoSource,
        access_token: &str,
    ) -> Result<(String, String), PlatformError> {
        let response = self
            .http
            .post(format!("{}/api/media/asset.json", self.api_base_url))
            .bearer_auth(access_token)
            .form(&[
                ("filepath", video.file_name.as_str()),
                ("mimetype", video.content_type),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(PlatformError::upload(Some(status), message));
        }

        let lease: MediaLease = response
            .json()
            .await
            .map_err(|e| PlatformError::upload(None, format!("unexpected media lease: {}", e)))?;

        let action = absolute_action(&lease.args.action);
        let key = lease
            .args
            .fields
            .iter()
            .find(|f| f.name == "key")
            .map(|f| f.value.clone())
            .ok_or_else(|| PlatformError::upload(None, "media lease has no key"))?;

        // Storage expects the presigned fields first and the file last
        let mut form = Form::new();
        for field in lease.args.fields {
            form = form.text(field.name, field.value);
        }
        form = form.part("file", video.into_part()?);

        let response = self.http.post(&action).multipart(form).send().await?;
        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(PlatformError::upload(Some(status), message));
        }

        Ok((lease.asset.asset_id, format!("{}/{}", action, key)))
    }
}

#[async_trait]
impl PlatformAdapter for RedditAdapter {
    fn platform(&self) -> PlatformId {
        PlatformId::Reddit
    }

    fn auth_url(&self, user_id: &str) -> Result<String, PlatformError> {
        self.oauth
            .authorization_url(user_id, SCOPES, &[("duration", "permanent")])
    }

    async fn handle_callback(&self, code: &str) -> Result<AccountCredential, PlatformError> {
        let now = Utc::now();
        let token = self.oauth.exchange_code(code, &[]).await?;
        let identity = self.identity(&token.access_token).await?;

        tracing::info!(reddit_user_id = %identity.id, "Linked Reddit account");

        Ok(AccountCredential {
            account_id: identity.id,
            account_name: identity.name,
            expiry_date: token.expiry_from(now),
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        })
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, PlatformError> {
        self.oauth.refresh(refresh_token).await
    }

    async fn upload_video(&self, request: UploadRequest) -> Result<UploadedVideo, PlatformError> {
        if request.account_name.is_empty() {
            return Err(PlatformError::upload(None, "Reddit account has no username"));
        }

        let video = VideoSource::open(&request.video_path).await?;
        let (asset_id, asset_url) = self.upload_asset(video, &request.access_token).await?;

        let subreddit = format!("u_{}", request.account_name);
        let title: String = request.metadata.title.chars().take(MAX_TITLE_CHARS).collect();
        let response = self
            .http
            .post(format!("{}/api/submit", self.api_base_url))
            .bearer_auth(&request.access_token)
            .form(&[
                ("api_type", "json"),
                ("kind", "video"),
                ("sr", subreddit.as_str()),
                ("title", title.as_str()),
                ("url", asset_url.as_str()),
                ("resubmit", "true"),
                ("sendreplies", "true"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = extract_error_message(&body).unwrap_or_else(|| body.clone());
            return Err(PlatformError::upload(Some(status.as_u16()), message));
        }

        let submitted: SubmitResponse = serde_json::from_str(&body)
            .map_err(|e| PlatformError::upload(None, format!("unexpected response: {}", e)))?;
        if !submitted.json.errors.is_empty() {
            let message = extract_error_message(&body)
                .unwrap_or_else(|| "submission rejected".to_string());
            return Err(PlatformError::upload(None, message));
        }

        let data = submitted.json.data.unwrap_or_default();
        let video_url = data
            .url
            .or(data.user_submitted_page)
            .unwrap_or_else(|| {
                format!("https://www.reddit.com/user/{}/submitted/", request.account_name)
            });

        tracing::info!(
            account_id = %request.account_id,
            asset_id = %asset_id,
            "Video submitted to Reddit"
        );

        Ok(UploadedVideo {
            video_id: asset_id,
            video_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use postyt_core::{OAuthClientConfig, VideoMetadata};
    use std::io::Write;

    fn adapter(server_url: &str) -> RedditAdapter {
        RedditAdapter::new(
            Client::new(),
            AdapterSettings {
                client: Some(OAuthClientConfig {
                    client_id: "rd-client".to_string(),
                    client_secret: "rd-secret".to_string(),
                }),
                redirect_uri: "http://localhost:3000/oauth/reddit/callback".to_string(),
            },
        )
        .with_base_urls(server_url, format!("{}/api/v1/access_token", server_url))
    }

    fn request(path: &std::path::Path) -> UploadRequest {
        UploadRequest {
            video_path: path.to_path_buf(),
            account_id: "t2_abc".to_string(),
            account_name: "spez".to_string(),
            metadata: VideoMetadata::from_form(Some("Launch day".into()), None, None),
            access_token: "rd-token".to_string(),
        }
    }

    #[test]
    fn test_auth_url_requests_permanent_token() {
        let url = adapter("http://localhost").auth_url("user-9").unwrap();
        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("duration=permanent"));
        assert!(url.contains("state=user-9"));
    }

    #[test]
    fn test_absolute_action() {
        assert_eq!(
            absolute_action("//reddit-uploaded-video.s3-accelerate.amazonaws.com"),
            "https://reddit-uploaded-video.s3-accelerate.amazonaws.com"
        );
        assert_eq!(absolute_action("http://127.0.0.1/s3"), "http://127.0.0.1/s3");
    }

    #[tokio::test]
    async fn test_handle_callback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/access_token")
            .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
            .with_status(200)
            .with_body(r#"{"access_token":"at","refresh_token":"rt","expires_in":86400,"scope":"identity submit"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v1/me")
            .with_status(200)
            .with_body(r#"{"id":"abc","name":"spez"}"#)
            .create_async()
            .await;

        let credential = adapter(&server.url()).handle_callback("code").await.unwrap();
        assert_eq!(credential.account_id, "abc");
        assert_eq!(credential.account_name, "spez");
        assert_eq!(credential.refresh_token.as_deref(), Some("rt"));
    }

    #[tokio::test]
    async fn test_upload_video_submits_to_profile() {
        let mut server = mockito::Server::new_async().await;
        let action = format!("{}/s3", server.url());
        server
            .mock("POST", "/api/media/asset.json")
            .with_status(200)
            .with_body(format!(
                r#"{{"args":{{"action":"{}","fields":[{{"name":"key","value":"rte_videos/xyz"}},{{"name":"policy","value":"p"}}]}},"asset":{{"asset_id":"xyz","websocket_url":"wss://example"}}}}"#,
                action
            ))
            .create_async()
            .await;
        let storage = server
            .mock("POST", "/s3")
            .match_body(Matcher::Regex("rte_videos/xyz".to_string()))
            .with_status(201)
            .create_async()
            .await;
        let submit = server
            .mock("POST", "/api/submit")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("sr".into(), "u_spez".into()),
                Matcher::UrlEncoded("kind".into(), "video".into()),
                Matcher::UrlEncoded("url".into(), format!("{}/rte_videos/xyz", action)),
            ]))
            .with_status(200)
            .with_body(r#"{"json":{"errors":[],"data":{"user_submitted_page":"https://www.reddit.com/user/spez/submitted/"}}}"#)
            .create_async()
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"clip").unwrap();

        let uploaded = adapter(&server.url())
            .upload_video(request(file.path()))
            .await
            .unwrap();

        storage.assert_async().await;
        submit.assert_async().await;
        assert_eq!(uploaded.video_id, "xyz");
        assert_eq!(
            uploaded.video_url,
            "https://www.reddit.com/user/spez/submitted/"
        );
    }

    #[tokio::test]
    async fn test_upload_video_submission_rejected() {
        let mut server = mockito::Server::new_async().await;
        let action = format!("{}/s3", server.url());
        server
            .mock("POST", "/api/media/asset.json")
            .with_status(200)
            .with_body(format!(
                r#"{{"args":{{"action":"{}","fields":[{{"name":"key","value":"k"}}]}},"asset":{{"asset_id":"a1"}}}}"#,
                action
            ))
            .create_async()
            .await;
        server
            .mock("POST", "/s3")
            .with_status(201)
            .create_async()
            .await;
        server
            .mock("POST", "/api/submit")
            .with_status(200)
            .with_body(r#"{"json":{"errors":[["RATELIMIT","you are doing that too much","ratelimit"]]}}"#)
            .create_async()
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"clip").unwrap();

        let err = adapter(&server.url())
            .upload_video(request(file.path()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "upload failed: you are doing that too much");
    }
}
