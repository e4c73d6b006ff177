use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use utoipa::ToSchema;

use super::platform::PlatformId;

/// OAuth credential of one linked platform account
///
/// Tokens are redacted from the `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCredential {
    pub account_id: String,
    pub account_name: String,
    pub access_token: String,
    /// Absent for providers that issue long-lived tokens without a refresh grant
    pub refresh_token: Option<String>,
    /// `None` means the access token does not expire
    pub expiry_date: Option<DateTime<Utc>>,
}

impl AccountCredential {
    /// Strictly-after comparison, no grace window: a token is still usable at its exact expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.is_some_and(|expiry| now > expiry)
    }

    /// Replace the access token (and optionally the refresh token) with a refreshed grant
    ///
    /// A grant without `expires_in` keeps the previous expiry, so the token is refreshed
    /// again on the next run rather than treated as non-expiring.
    pub fn apply_grant(&mut self, grant: &TokenGrant) {
        self.access_token = grant.access_token.clone();
        if grant.expiry_date.is_some() {
            self.expiry_date = grant.expiry_date;
        }
        if let Some(ref rotated) = grant.refresh_token {
            self.refresh_token = Some(rotated.clone());
        }
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            account_id: self.account_id.clone(),
            account_name: self.account_name.clone(),
        }
    }
}

impl Debug for AccountCredential {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AccountCredential")
            .field("account_id", &self.account_id)
            .field("account_name", &self.account_name)
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expiry_date", &self.expiry_date)
            .finish()
    }
}

/// Result of a refresh-token grant
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub expiry_date: Option<DateTime<Utc>>,
    /// Set when the provider rotates refresh tokens (e.g. Twitter/X)
    pub refresh_token: Option<String>,
}

impl Debug for TokenGrant {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("TokenGrant")
            .field("expiry_date", &self.expiry_date)
            .field("refresh_token_rotated", &self.refresh_token.is_some())
            .finish()
    }
}

/// Token change produced by a refresh during one upload, handed back for persistence
#[derive(Clone, PartialEq, Eq)]
pub struct TokenUpdate {
    pub platform: PlatformId,
    pub account_id: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
}

impl Debug for TokenUpdate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("TokenUpdate")
            .field("platform", &self.platform)
            .field("account_id", &self.account_id)
            .field("expiry_date", &self.expiry_date)
            .finish()
    }
}

/// Public view of a linked account (no tokens)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub account_id: String,
    pub account_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn credential(expiry_date: Option<DateTime<Utc>>) -> AccountCredential {
        AccountCredential {
            account_id: "UC123".to_string(),
            account_name: "Channel".to_string(),
            access_token: "access-secret".to_string(),
            refresh_token: Some("refresh-secret".to_string()),
            expiry_date,
        }
    }

    #[test]
    fn test_expiry_is_strictly_after() {
        let now = Utc::now();
        assert!(!credential(Some(now)).is_expired_at(now));
        assert!(credential(Some(now - Duration::seconds(1))).is_expired_at(now));
        assert!(!credential(Some(now + Duration::seconds(1))).is_expired_at(now));
    }

    #[test]
    fn test_missing_expiry_never_expires() {
        assert!(!credential(None).is_expired_at(Utc::now()));
    }

    #[test]
    fn test_apply_grant_keeps_refresh_token_unless_rotated() {
        let mut cred = credential(None);
        let expiry = Utc::now() + Duration::hours(1);
        cred.apply_grant(&TokenGrant {
            access_token: "new-access".to_string(),
            expiry_date: Some(expiry),
            refresh_token: None,
        });
        assert_eq!(cred.access_token, "new-access");
        assert_eq!(cred.expiry_date, Some(expiry));
        assert_eq!(cred.refresh_token.as_deref(), Some("refresh-secret"));

        cred.apply_grant(&TokenGrant {
            access_token: "newer-access".to_string(),
            expiry_date: None,
            refresh_token: Some("rotated".to_string()),
        });
        assert_eq!(cred.refresh_token.as_deref(), Some("rotated"));
    }

    #[test]
    fn test_apply_grant_without_expiry_keeps_previous_expiry() {
        let expired = Utc::now() - Duration::minutes(5);
        let mut cred = credential(Some(expired));
        cred.apply_grant(&TokenGrant {
            access_token: "new-access".to_string(),
            expiry_date: None,
            refresh_token: None,
        });
        assert_eq!(cred.access_token, "new-access");
        assert_eq!(cred.expiry_date, Some(expired));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", credential(None));
        assert!(!rendered.contains("access-secret"));
        assert!(!rendered.contains("refresh-secret"));
        assert!(rendered.contains("UC123"));
    }
}
