use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

/// Social platform a video can be published to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    Youtube,
    Tiktok,
    Facebook,
    Instagram,
    Twitter,
    Reddit,
    Snapchat,
}

impl PlatformId {
    /// Every supported platform, in display order
    pub const ALL: [PlatformId; 7] = [
        PlatformId::Youtube,
        PlatformId::Tiktok,
        PlatformId::Facebook,
        PlatformId::Instagram,
        PlatformId::Twitter,
        PlatformId::Reddit,
        PlatformId::Snapchat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::Youtube => "youtube",
            PlatformId::Tiktok => "tiktok",
            PlatformId::Facebook => "facebook",
            PlatformId::Instagram => "instagram",
            PlatformId::Twitter => "twitter",
            PlatformId::Reddit => "reddit",
            PlatformId::Snapchat => "snapchat",
        }
    }

    /// Prefix of the environment variables holding this platform's OAuth client settings
    pub fn env_prefix(&self) -> &'static str {
        match self {
            PlatformId::Youtube => "YOUTUBE",
            PlatformId::Tiktok => "TIKTOK",
            PlatformId::Facebook => "FACEBOOK",
            PlatformId::Instagram => "INSTAGRAM",
            PlatformId::Twitter => "TWITTER",
            PlatformId::Reddit => "REDDIT",
            PlatformId::Snapchat => "SNAPCHAT",
        }
    }
}

impl Display for PlatformId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known platform
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform '{0}'")]
pub struct UnknownPlatform(pub String);

impl FromStr for PlatformId {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Exact match only: selection keys must use the canonical lowercase names.
        PlatformId::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}
