//! Upload request and report models
//!
//! `UploadSelection` and `OverallUploadReport` keep the platform order given by the client,
//! so both use ordered vectors instead of hash maps and (de)serialize through custom map code.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt::{Formatter, Result as FmtResult};
use utoipa::ToSchema;

use crate::constants::UNTITLED_VIDEO_TITLE;

/// Title, description and tags shared by every account of one upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl VideoMetadata {
    /// Build metadata from the raw form fields.
    ///
    /// An empty or missing title becomes a placeholder, a missing description becomes empty,
    /// and tags are split on commas with blank entries dropped.
    pub fn from_form(
        title: Option<String>,
        description: Option<String>,
        tags: Option<&str>,
    ) -> Self {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED_VIDEO_TITLE.to_string());

        let tags = tags
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            title,
            description: description.unwrap_or_default(),
            tags,
        }
    }
}

impl Default for VideoMetadata {
    fn default() -> Self {
        Self::from_form(None, None, None)
    }
}

/// Error returned when `selectedAccounts` is not a `{platform: [accountId, ...]}` object
#[derive(Debug, thiserror::Error)]
#[error("selectedAccounts must be a JSON object mapping platforms to account id arrays: {0}")]
pub struct SelectionError(#[from] serde_json::Error);

/// Platforms and accounts chosen for one upload, in client order
///
/// Keys are kept as raw strings so unknown platforms can be reported per platform rather
/// than failing the whole request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSelection {
    entries: Vec<(String, Vec<String>)>,
}

impl UploadSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `selectedAccounts` JSON string sent by the client
    pub fn from_json(raw: &str) -> Result<Self, SelectionError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Append accounts for a platform. A repeated key extends the existing entry.
    pub fn insert(&mut self, platform: impl Into<String>, accounts: Vec<String>) {
        let platform = platform.into();
        match self.entries.iter_mut().find(|(key, _)| *key == platform) {
            Some((_, existing)) => existing.extend(accounts),
            None => self.entries.push((platform, accounts)),
        }
    }

    /// Builder-style variant of [`insert`](Self::insert)
    pub fn with(mut self, platform: impl Into<String>, accounts: &[&str]) -> Self {
        self.insert(platform, accounts.iter().map(|a| a.to_string()).collect());
        self
    }

    /// Entries with at least one account, in client order
    pub fn non_empty(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .filter(|(_, accounts)| !accounts.is_empty())
            .map(|(platform, accounts)| (platform.as_str(), accounts.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.non_empty().next().is_none()
    }

    pub fn total_accounts(&self) -> usize {
        self.non_empty().map(|(_, accounts)| accounts.len()).sum()
    }
}

impl<'de> Deserialize<'de> for UploadSelection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SelectionVisitor;

        impl<'de> Visitor<'de> for SelectionVisitor {
            type Value = UploadSelection;

            fn expecting(&self, formatter: &mut Formatter) -> FmtResult {
                formatter.write_str("a map of platform names to arrays of account ids")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut selection = UploadSelection::new();
                // null means "nothing selected" for that platform
                while let Some((platform, accounts)) =
                    map.next_entry::<String, Option<Vec<String>>>()?
                {
                    selection.insert(platform, accounts.unwrap_or_default());
                }
                Ok(selection)
            }
        }

        deserializer.deserialize_map(SelectionVisitor)
    }
}

/// Outcome of one account's upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountUploadResult {
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AccountUploadResult {
    pub fn succeeded(
        account_id: impl Into<String>,
        account_name: impl Into<String>,
        video_id: impl Into<String>,
        video_url: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            account_name: Some(account_name.into()),
            success: true,
            video_id: Some(video_id.into()),
            video_url: Some(video_url.into()),
            error: None,
        }
    }

    pub fn failed(
        account_id: impl Into<String>,
        account_name: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            account_name,
            success: false,
            video_id: None,
            video_url: None,
            error: Some(error.into()),
        }
    }
}

/// Per-platform section of the report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformUploadReport {
    pub account_results: Vec<AccountUploadResult>,
    /// Set only when the platform is unsupported or not implemented
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlatformUploadReport {
    pub fn platform_error(message: impl Into<String>) -> Self {
        Self {
            account_results: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn from_results(account_results: Vec<AccountUploadResult>) -> Self {
        Self {
            account_results,
            error: None,
        }
    }

    /// True when at least one account was attempted and none succeeded
    pub fn all_failed(&self) -> bool {
        !self.account_results.is_empty() && self.account_results.iter().all(|r| !r.success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct OverallStatus {
    pub success: bool,
}

/// Aggregate result of one upload request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct OverallUploadReport {
    pub overall: OverallStatus,
    #[serde(serialize_with = "serialize_platforms")]
    #[schema(value_type = std::collections::HashMap<String, PlatformUploadReport>)]
    pub platforms: Vec<(String, PlatformUploadReport)>,
}

impl OverallUploadReport {
    /// Assemble the report; overall success flips to false only when some platform had
    /// results and every one of them failed.
    pub fn from_platforms(platforms: Vec<(String, PlatformUploadReport)>) -> Self {
        let success = !platforms.iter().any(|(_, report)| report.all_failed());
        Self {
            overall: OverallStatus { success },
            platforms,
        }
    }

    pub fn platform(&self, key: &str) -> Option<&PlatformUploadReport> {
        self.platforms
            .iter()
            .find(|(platform, _)| platform == key)
            .map(|(_, report)| report)
    }
}

fn serialize_platforms<S>(
    platforms: &[(String, PlatformUploadReport)],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(platforms.len()))?;
    for (platform, report) in platforms {
        map.serialize_entry(platform, report)?;
    }
    map.end()
}
