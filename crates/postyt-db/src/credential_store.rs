//! Store abstractions over linked-account persistence
//!
//! The upload engine only reads credentials through `CredentialStore` and hands refreshed
//! tokens back through `apply_token_update`. The HTTP layer additionally needs `AccountStore`
//! to list and link accounts. Both are implemented for the Postgres repository and can be
//! replaced by in-memory stores in tests.

use async_trait::async_trait;
use std::collections::BTreeMap;

use postyt_core::{AccountCredential, AccountSummary, AppError, PlatformId, TokenUpdate};

use crate::db::AccountRepository;

/// Linked accounts grouped by platform; every platform is present, possibly empty
pub type LinkedAccounts = BTreeMap<PlatformId, Vec<AccountSummary>>;

pub fn empty_linked_accounts() -> LinkedAccounts {
    PlatformId::ALL
        .into_iter()
        .map(|platform| (platform, Vec::new()))
        .collect()
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_account(
        &self,
        user_id: &str,
        platform: PlatformId,
        account_id: &str,
    ) -> Result<Option<AccountCredential>, AppError>;

    /// Persist a refreshed token; an account unlinked in the meantime is `NotFound`
    async fn apply_token_update(&self, user_id: &str, update: &TokenUpdate) -> Result<(), AppError>;
}

#[async_trait]
pub trait AccountStore: CredentialStore {
    async fn list_accounts(&self, user_id: &str) -> Result<LinkedAccounts, AppError>;

    async fn upsert_account(
        &self,
        user_id: &str,
        platform: PlatformId,
        credential: &AccountCredential,
    ) -> Result<(), AppError>;
}

#[async_trait]
impl CredentialStore for AccountRepository {
    async fn find_account(
        &self,
        user_id: &str,
        platform: PlatformId,
        account_id: &str,
    ) -> Result<Option<AccountCredential>, AppError> {
        AccountRepository::find_account(self, user_id, platform, account_id).await
    }

    async fn apply_token_update(&self, user_id: &str, update: &TokenUpdate) -> Result<(), AppError> {
        let updated = self
            .update_tokens(
                user_id,
                update.platform,
                &update.account_id,
                &update.access_token,
                update.refresh_token.as_deref(),
                update.expiry_date,
            )
            .await?;

        if updated {
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "{} account {} is no longer linked",
                update.platform, update.account_id
            )))
        }
    }
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn list_accounts(&self, user_id: &str) -> Result<LinkedAccounts, AppError> {
        let mut accounts = empty_linked_accounts();
        for row in self.list_by_user(user_id).await? {
            match row.platform() {
                Some(platform) => accounts.entry(platform).or_default().push(row.into_summary()),
                None => tracing::warn!(platform = %row.platform, "Skipping account with unknown platform"),
            }
        }
        Ok(accounts)
    }

    async fn upsert_account(
        &self,
        user_id: &str,
        platform: PlatformId,
        credential: &AccountCredential,
    ) -> Result<(), AppError> {
        self.upsert(user_id, platform, credential).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_linked_accounts_has_every_platform() {
        let accounts = empty_linked_accounts();
        assert_eq!(accounts.len(), PlatformId::ALL.len());
        assert!(accounts.values().all(Vec::is_empty));
        assert_eq!(accounts.keys().next(), Some(&PlatformId::Youtube));
    }

    #[test]
    fn test_linked_accounts_serialize_with_platform_keys() {
        let mut accounts = empty_linked_accounts();
        accounts.get_mut(&PlatformId::Reddit).unwrap().push(AccountSummary {
            account_id: "t2_abc".to_string(),
            account_name: "someone".to_string(),
        });

        let value = serde_json::to_value(&accounts).unwrap();
        assert_eq!(value["reddit"][0]["accountId"], "t2_abc");
        assert_eq!(value["tiktok"], serde_json::json!([]));
    }
}
