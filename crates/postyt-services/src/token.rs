//! Token lifecycle
//!
//! A credential is refreshed only when it is already expired: `now > expiry_date`, with no
//! grace window. A valid credential never triggers a provider call.

use chrono::{DateTime, Utc};

use postyt_core::{AccountCredential, PlatformId, TokenUpdate};
use postyt_platforms::{PlatformAdapter, PlatformError};

/// Credential ready for use, plus whether it was refreshed on the way
#[derive(Debug, Clone)]
pub struct ValidCredential {
    pub credential: AccountCredential,
    pub refreshed: bool,
}

impl ValidCredential {
    /// Persistence event for a refreshed credential
    pub fn token_update(&self, platform: PlatformId) -> Option<TokenUpdate> {
        self.refreshed.then(|| TokenUpdate {
            platform,
            account_id: self.credential.account_id.clone(),
            access_token: self.credential.access_token.clone(),
            refresh_token: self.credential.refresh_token.clone(),
            expiry_date: self.credential.expiry_date,
        })
    }
}

pub async fn ensure_valid(
    credential: AccountCredential,
    adapter: &dyn PlatformAdapter,
) -> Result<ValidCredential, PlatformError> {
    ensure_valid_at(credential, adapter, Utc::now()).await
}

/// Refresh `credential` through `adapter` if it is expired at `now`
pub async fn ensure_valid_at(
    mut credential: AccountCredential,
    adapter: &dyn PlatformAdapter,
    now: DateTime<Utc>,
) -> Result<ValidCredential, PlatformError> {
    if !credential.is_expired_at(now) {
        return Ok(ValidCredential {
            credential,
            refreshed: false,
        });
    }

    let refresh_token = credential
        .refresh_token
        .as_deref()
        .ok_or_else(|| PlatformError::Refresh {
            revoked: true,
            message: "access token expired and no refresh token is stored; link the account again"
                .to_string(),
        })?;

    tracing::debug!(
        platform = %adapter.platform(),
        account_id = %credential.account_id,
        "Access token expired, refreshing"
    );

    let grant = adapter.refresh_token(refresh_token).await?;
    credential.apply_grant(&grant);

    tracing::info!(
        platform = %adapter.platform(),
        account_id = %credential.account_id,
        "Access token refreshed"
    );

    Ok(ValidCredential {
        credential,
        refreshed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{credential_expiring_at, MockAdapter};
    use chrono::Duration;

    #[tokio::test]
    async fn test_valid_credential_is_not_refreshed() {
        let adapter = MockAdapter::new(PlatformId::Youtube);
        let now = Utc::now();
        let credential = credential_expiring_at("A1", Some(now + Duration::hours(1)));

        let first = ensure_valid_at(credential, &adapter, now).await.unwrap();
        let second = ensure_valid_at(first.credential.clone(), &adapter, now)
            .await
            .unwrap();

        assert!(!first.refreshed);
        assert!(!second.refreshed);
        assert_eq!(adapter.refresh_count(), 0);
        assert!(second.token_update(PlatformId::Youtube).is_none());
    }

    #[tokio::test]
    async fn test_exact_expiry_instant_is_still_valid() {
        let adapter = MockAdapter::new(PlatformId::Youtube);
        let now = Utc::now();
        let credential = credential_expiring_at("A1", Some(now));

        let valid = ensure_valid_at(credential, &adapter, now).await.unwrap();
        assert!(!valid.refreshed);
        assert_eq!(adapter.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_credential_without_expiry_is_never_refreshed() {
        let adapter = MockAdapter::new(PlatformId::Facebook);
        let credential = credential_expiring_at("F1", None);

        let valid = ensure_valid(credential, &adapter).await.unwrap();
        assert!(!valid.refreshed);
        assert_eq!(adapter.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_expired_credential_is_refreshed_once() {
        let adapter = MockAdapter::new(PlatformId::Youtube);
        let now = Utc::now();
        let credential = credential_expiring_at("A1", Some(now - Duration::seconds(1)));

        let valid = ensure_valid_at(credential, &adapter, now).await.unwrap();

        assert!(valid.refreshed);
        assert_eq!(adapter.refresh_count(), 1);
        assert_eq!(valid.credential.access_token, "fresh-A1");
        assert!(valid.credential.expiry_date.unwrap() > now);

        let update = valid.token_update(PlatformId::Youtube).unwrap();
        assert_eq!(update.account_id, "A1");
        assert_eq!(update.access_token, "fresh-A1");
        // refresh token kept when the provider does not rotate it
        assert_eq!(update.refresh_token.as_deref(), Some("refresh-A1"));
    }

    #[tokio::test]
    async fn test_refresh_failure_propagates() {
        let adapter = MockAdapter::new(PlatformId::Youtube).failing_refresh_for("A2");
        let credential = credential_expiring_at("A2", Some(Utc::now() - Duration::hours(1)));

        let err = ensure_valid(credential, &adapter).await.unwrap_err();
        assert!(matches!(err, PlatformError::Refresh { revoked: true, .. }));
        assert_eq!(adapter.refresh_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_without_refresh_token() {
        let adapter = MockAdapter::new(PlatformId::Youtube);
        let mut credential = credential_expiring_at("A1", Some(Utc::now() - Duration::hours(1)));
        credential.refresh_token = None;

        let err = ensure_valid(credential, &adapter).await.unwrap_err();
        assert!(matches!(err, PlatformError::Refresh { revoked: true, .. }));
        assert_eq!(adapter.refresh_count(), 0);
    }
}
