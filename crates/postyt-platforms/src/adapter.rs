//! Platform adapter contract
//!
//! Every platform exposes the same four operations so the orchestrator can dispatch to any
//! of them without knowing which provider it is talking to.

use async_trait::async_trait;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;

use postyt_core::{AccountCredential, PlatformId, TokenGrant, VideoMetadata};

use crate::error::PlatformError;

/// Everything an adapter needs to publish the video for one account
#[derive(Clone)]
pub struct UploadRequest {
    pub video_path: PathBuf,
    /// Provider-side id of the target account (page id, IG user id, ...)
    pub account_id: String,
    pub account_name: String,
    pub metadata: VideoMetadata,
    pub access_token: String,
}

impl Debug for UploadRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("UploadRequest")
            .field("video_path", &self.video_path)
            .field("account_id", &self.account_id)
            .field("account_name", &self.account_name)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Identifier and public URL of a published video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedVideo {
    pub video_id: String,
    pub video_url: String,
}

/// Trait that all platform adapters must implement
#[async_trait]
pub trait PlatformAdapter: Send + Sync + Debug {
    fn platform(&self) -> PlatformId;

    /// Provider authorization URL carrying `user_id` as opaque state.
    /// Requests offline access and forces the consent screen where the provider allows it.
    fn auth_url(&self, user_id: &str) -> Result<String, PlatformError>;

    /// Exchange an authorization code and look up the account it belongs to
    async fn handle_callback(&self, code: &str) -> Result<AccountCredential, PlatformError>;

    /// Exchange a refresh token for a new access token
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, PlatformError>;

    /// Publish the video. Either a video id is returned or an error; never a partial result.
    async fn upload_video(&self, request: UploadRequest) -> Result<UploadedVideo, PlatformError>;
}
